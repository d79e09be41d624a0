use std::fmt;

use smallvec::SmallVec;

/// A column type as written in the DDL, keyword lowercased, e.g. `varchar(255)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    pub name: String,
    pub params: SmallVec<[String; 2]>,
}

impl ColumnType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            params: SmallVec::new(),
        }
    }

    pub fn with_params<I, S>(name: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ty = Self::new(name);
        ty.params.extend(params.into_iter().map(Into::into));
        ty
    }

    /// Display width or length, when the first parameter is numeric.
    pub fn length(&self) -> Option<u64> {
        self.params.first().and_then(|p| p.parse().ok())
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.params.is_empty() {
            write!(f, "({})", self.params.join(","))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub data_type: ColumnType,
    pub unsigned: bool,
    pub nullable: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub unique: bool,
    /// Raw default expression, string literals keep their quotes.
    pub default: Option<String>,
    pub comment: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            data_type,
            unsigned: false,
            nullable: true,
            primary_key: false,
            auto_increment: false,
            unique: false,
            default: None,
            comment: None,
        }
    }

    /// The type as MySQL's information schema spells it, e.g. `int(10) unsigned`.
    pub fn full_type(&self) -> String {
        if self.unsigned {
            format!("{} unsigned", self.data_type)
        } else {
            self.data_type.to_string()
        }
    }
}

pub type ColumnList = SmallVec<[Column; 16]>;

/// Storage options trailing the column list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableOptions {
    pub engine: Option<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub auto_increment: Option<u64>,
    /// Any other `NAME=value` option, name uppercased, in source order.
    pub other: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub columns: ColumnList,
    pub comment: Option<String>,
    pub options: TableOptions,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_keys(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.primary_key)
    }
}
