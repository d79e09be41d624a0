//! Generation options, validated once and read-only afterwards.

use std::str::FromStr;

use crate::error::{GeneratorError, Result};

pub const DEFAULT_PACKAGE: &str = "model";

/// How a nullable column is represented in the generated struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullStyle {
    /// `database/sql` wrappers such as `sql.NullString`.
    #[default]
    Sql,
    /// A pointer to the base type.
    Ptr,
}

impl FromStr for NullStyle {
    type Err = GeneratorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sql" => Ok(NullStyle::Sql),
            "ptr" => Ok(NullStyle::Ptr),
            other => Err(GeneratorError::InputResolution(format!(
                "invalid null style '{other}', expected 'sql' or 'ptr'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    charset: Option<String>,
    collation: Option<String>,
    json_tag: bool,
    table_prefix: String,
    column_prefix: String,
    no_null_type: bool,
    null_style: NullStyle,
    package: String,
    gorm_type: bool,
    force_table_name: bool,
    all_int64: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            charset: None,
            collation: None,
            json_tag: false,
            table_prefix: String::new(),
            column_prefix: String::new(),
            no_null_type: false,
            null_style: NullStyle::Sql,
            package: DEFAULT_PACKAGE.to_owned(),
            gorm_type: false,
            force_table_name: false,
            all_int64: false,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    pub fn collation(&self) -> Option<&str> {
        self.collation.as_deref()
    }

    pub fn json_tag(&self) -> bool {
        self.json_tag
    }

    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    pub fn column_prefix(&self) -> &str {
        &self.column_prefix
    }

    /// Nullable columns are rendered with their bare base type.
    pub fn no_null_type(&self) -> bool {
        self.no_null_type
    }

    pub fn null_style(&self) -> NullStyle {
        self.null_style
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn gorm_type(&self) -> bool {
        self.gorm_type
    }

    pub fn force_table_name(&self) -> bool {
        self.force_table_name
    }

    pub fn all_int64(&self) -> bool {
        self.all_int64
    }
}

/// Collects raw option values; [`ConfigBuilder::build`] rejects invalid ones.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    charset: Option<String>,
    collation: Option<String>,
    json_tag: bool,
    table_prefix: Option<String>,
    column_prefix: Option<String>,
    no_null_type: bool,
    null_style: Option<String>,
    package: Option<String>,
    gorm_type: bool,
    force_table_name: bool,
    all_int64: bool,
}

impl ConfigBuilder {
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    pub fn collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    pub fn json_tag(mut self, enabled: bool) -> Self {
        self.json_tag = enabled;
        self
    }

    pub fn table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = Some(prefix.into());
        self
    }

    pub fn column_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.column_prefix = Some(prefix.into());
        self
    }

    pub fn no_null_type(mut self, enabled: bool) -> Self {
        self.no_null_type = enabled;
        self
    }

    pub fn null_style(mut self, style: impl Into<String>) -> Self {
        self.null_style = Some(style.into());
        self
    }

    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn gorm_type(mut self, enabled: bool) -> Self {
        self.gorm_type = enabled;
        self
    }

    pub fn force_table_name(mut self, enabled: bool) -> Self {
        self.force_table_name = enabled;
        self
    }

    pub fn all_int64(mut self, enabled: bool) -> Self {
        self.all_int64 = enabled;
        self
    }

    pub fn build(self) -> Result<Config> {
        // empty strings behave like unset flags
        let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());

        let null_style = match non_empty(self.null_style) {
            Some(style) => {
                let style = style.parse::<NullStyle>()?;
                if self.no_null_type {
                    return Err(GeneratorError::InputResolution(
                        "--no-null cannot be combined with --null-style".to_owned(),
                    ));
                }
                style
            }
            None => NullStyle::default(),
        };

        let package = non_empty(self.package).unwrap_or_else(|| DEFAULT_PACKAGE.to_owned());
        if !is_go_identifier(&package) {
            return Err(GeneratorError::InputResolution(format!(
                "invalid package name '{package}'"
            )));
        }

        Ok(Config {
            charset: non_empty(self.charset),
            collation: non_empty(self.collation),
            json_tag: self.json_tag,
            table_prefix: non_empty(self.table_prefix).unwrap_or_default(),
            column_prefix: non_empty(self.column_prefix).unwrap_or_default(),
            no_null_type: self.no_null_type,
            null_style,
            package,
            gorm_type: self.gorm_type,
            force_table_name: self.force_table_name,
            all_int64: self.all_int64,
        })
    }
}

fn is_go_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::builder().build().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.package(), "model");
        assert_eq!(config.null_style(), NullStyle::Sql);
        assert!(!config.no_null_type());
    }

    #[test]
    fn parses_null_style() {
        let config = Config::builder().null_style("ptr").build().unwrap();
        assert_eq!(config.null_style(), NullStyle::Ptr);
    }

    #[test]
    fn rejects_unknown_null_style() {
        let err = Config::builder().null_style("pointer").build().unwrap_err();
        assert!(matches!(err, GeneratorError::InputResolution(_)));
        assert!(err.to_string().contains("pointer"));
    }

    #[test]
    fn rejects_conflicting_null_options() {
        let err = Config::builder()
            .no_null_type(true)
            .null_style("ptr")
            .build()
            .unwrap_err();
        assert!(matches!(err, GeneratorError::InputResolution(_)));
    }

    #[test]
    fn empty_values_fall_back_to_defaults() {
        let config = Config::builder()
            .package("")
            .null_style("")
            .table_prefix("")
            .build()
            .unwrap();
        assert_eq!(config.package(), "model");
        assert_eq!(config.table_prefix(), "");
    }

    #[test]
    fn rejects_bad_package_name() {
        assert!(Config::builder().package("my-models").build().is_err());
        assert!(Config::builder().package("1model").build().is_err());
        assert!(Config::builder().package("entity").build().is_ok());
    }
}
