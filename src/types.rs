//! MySQL column types to Go field types.

use std::fmt;

use crate::config::{Config, NullStyle};
use crate::error::{GeneratorError, Result};
use crate::schema::{Column, ColumnType};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GoType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    String,
    Bytes,
    Time,
}

impl GoType {
    pub fn as_str(self) -> &'static str {
        match self {
            GoType::Bool => "bool",
            GoType::Int8 => "int8",
            GoType::Int16 => "int16",
            GoType::Int32 => "int32",
            GoType::Int64 => "int64",
            GoType::Uint8 => "uint8",
            GoType::Uint16 => "uint16",
            GoType::Uint32 => "uint32",
            GoType::Uint64 => "uint64",
            GoType::Float32 => "float32",
            GoType::Float64 => "float64",
            GoType::String => "string",
            GoType::Bytes => "[]byte",
            GoType::Time => "time.Time",
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            GoType::Int8
                | GoType::Int16
                | GoType::Int32
                | GoType::Int64
                | GoType::Uint8
                | GoType::Uint16
                | GoType::Uint32
                | GoType::Uint64
        )
    }

    /// The `database/sql` wrapper able to hold this type, if one is needed.
    ///
    /// A byte slice is nil for NULL and needs no wrapper. No wrapper holds a
    /// `uint64` above `math.MaxInt64`.
    fn sql_wrapper(self) -> Option<&'static str> {
        let wrapper = match self {
            GoType::Bool => "sql.NullBool",
            GoType::Uint8 => "sql.NullByte",
            GoType::Int8 | GoType::Int16 => "sql.NullInt16",
            GoType::Int32 | GoType::Uint16 => "sql.NullInt32",
            GoType::Int64 | GoType::Uint32 => "sql.NullInt64",
            GoType::Float32 | GoType::Float64 => "sql.NullFloat64",
            GoType::String => "sql.NullString",
            GoType::Time => "sql.NullTime",
            GoType::Bytes | GoType::Uint64 => return None,
        };
        Some(wrapper)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Nullable {
    /// Plain base type.
    No,
    /// A `database/sql` wrapper such as `sql.NullString`.
    Wrapper(&'static str),
    /// A pointer to the base type.
    Pointer,
}

/// The Go type of one generated field.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FieldType {
    pub base: GoType,
    pub nullable: Nullable,
}

impl FieldType {
    /// Go packages this field's type needs imported.
    pub fn imports(&self) -> impl Iterator<Item = &'static str> {
        let time = match (self.base, self.nullable) {
            (GoType::Time, Nullable::No | Nullable::Pointer) => Some("time"),
            _ => None,
        };
        let sql = match self.nullable {
            Nullable::Wrapper(_) => Some("database/sql"),
            _ => None,
        };
        sql.into_iter().chain(time)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.nullable {
            Nullable::No => f.write_str(self.base.as_str()),
            Nullable::Wrapper(wrapper) => f.write_str(wrapper),
            Nullable::Pointer => write!(f, "*{}", self.base.as_str()),
        }
    }
}

/// Base Go type for a MySQL type, or `None` when the type is not supported.
pub fn base_type(data_type: &ColumnType, unsigned: bool, all_int64: bool) -> Option<GoType> {
    let int = |signed: GoType, unsigned_ty: GoType| match (all_int64, unsigned) {
        (true, false) => GoType::Int64,
        (true, true) => GoType::Uint64,
        (false, false) => signed,
        (false, true) => unsigned_ty,
    };

    let ty = match data_type.name.as_str() {
        "tinyint" if data_type.length() == Some(1) => GoType::Bool,
        "bool" | "boolean" => GoType::Bool,
        "tinyint" => int(GoType::Int8, GoType::Uint8),
        "smallint" => int(GoType::Int16, GoType::Uint16),
        "mediumint" | "int" | "integer" => int(GoType::Int32, GoType::Uint32),
        "bigint" => int(GoType::Int64, GoType::Uint64),
        "year" => int(GoType::Int16, GoType::Uint16),
        "float" => GoType::Float32,
        "double" | "real" => GoType::Float64,
        "decimal" | "numeric" | "dec" | "fixed" => GoType::String,
        "char" | "varchar" | "tinytext" | "text" | "mediumtext" | "longtext" | "enum" | "set"
        | "json" => GoType::String,
        "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" => GoType::Bytes,
        "date" | "datetime" | "timestamp" | "time" => GoType::Time,
        _ => return None,
    };
    Some(ty)
}

/// Maps `column` to its Go field type under `config`.
pub fn map_column(column: &Column, config: &Config) -> Result<FieldType> {
    let base = base_type(&column.data_type, column.unsigned, config.all_int64()).ok_or_else(
        || GeneratorError::UnsupportedType {
            column: column.name.clone(),
            data_type: column.full_type(),
        },
    )?;

    let nullable = if !column.nullable || config.no_null_type() {
        Nullable::No
    } else {
        match config.null_style() {
            _ if base == GoType::Bytes => Nullable::No,
            NullStyle::Sql => base.sql_wrapper().map_or(Nullable::Pointer, Nullable::Wrapper),
            NullStyle::Ptr => Nullable::Pointer,
        }
    };

    Ok(FieldType { base, nullable })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(ty: ColumnType, unsigned: bool, nullable: bool) -> Column {
        let mut column = Column::new("c", ty);
        column.unsigned = unsigned;
        column.nullable = nullable;
        column
    }

    fn render(ty: &str, unsigned: bool, nullable: bool, config: &Config) -> String {
        map_column(&column(ColumnType::new(ty), unsigned, nullable), config)
            .unwrap()
            .to_string()
    }

    #[test]
    fn integer_widths() {
        let config = Config::default();
        assert_eq!(render("tinyint", false, false, &config), "int8");
        assert_eq!(render("tinyint", true, false, &config), "uint8");
        assert_eq!(render("smallint", false, false, &config), "int16");
        assert_eq!(render("mediumint", true, false, &config), "uint32");
        assert_eq!(render("int", false, false, &config), "int32");
        assert_eq!(render("bigint", true, false, &config), "uint64");
    }

    #[test]
    fn tinyint_one_is_bool() {
        let ty = ColumnType::with_params("tinyint", ["1"]);
        for unsigned in [false, true] {
            let field = map_column(&column(ty.clone(), unsigned, false), &Config::default());
            assert_eq!(field.unwrap().base, GoType::Bool);
        }
        let ty = ColumnType::with_params("tinyint", ["4"]);
        let field = map_column(&column(ty, false, false), &Config::default()).unwrap();
        assert_eq!(field.base, GoType::Int8);
    }

    #[test]
    fn all_int64_collapses_every_integer() {
        let config = Config::builder().all_int64(true).build().unwrap();
        for ty in ["tinyint", "smallint", "mediumint", "int", "integer", "bigint"] {
            assert_eq!(render(ty, false, false, &config), "int64", "{ty}");
            assert_eq!(render(ty, true, false, &config), "uint64", "{ty}");
        }
        // tinyint(1) stays a flag
        let ty = ColumnType::with_params("tinyint", ["1"]);
        let field = map_column(&column(ty, false, false), &config).unwrap();
        assert_eq!(field.base, GoType::Bool);
    }

    #[test]
    fn exact_and_textual_types() {
        let config = Config::default();
        assert_eq!(render("decimal", false, false, &config), "string");
        assert_eq!(render("numeric", false, false, &config), "string");
        assert_eq!(render("float", false, false, &config), "float32");
        assert_eq!(render("double", false, false, &config), "float64");
        assert_eq!(render("enum", false, false, &config), "string");
        assert_eq!(render("json", false, false, &config), "string");
        assert_eq!(render("varbinary", false, false, &config), "[]byte");
        assert_eq!(render("datetime", false, false, &config), "time.Time");
    }

    #[test]
    fn nullable_styles() {
        let sql = Config::default();
        let ptr = Config::builder().null_style("ptr").build().unwrap();
        let none = Config::builder().no_null_type(true).build().unwrap();

        assert_eq!(render("varchar", false, true, &sql), "sql.NullString");
        assert_eq!(render("varchar", false, true, &ptr), "*string");
        assert_eq!(render("varchar", false, true, &none), "string");
        assert_eq!(render("varchar", false, false, &ptr), "string");

        assert_eq!(render("timestamp", false, true, &sql), "sql.NullTime");
        assert_eq!(render("timestamp", false, true, &ptr), "*time.Time");
        assert_eq!(render("tinyint", true, true, &sql), "sql.NullByte");
        assert_eq!(render("blob", false, true, &sql), "[]byte");
        assert_eq!(render("blob", false, true, &ptr), "[]byte");
    }

    #[test]
    fn wide_unsigned_falls_back_to_pointer() {
        let sql = Config::default();
        assert_eq!(render("bigint", true, true, &sql), "*uint64");
        assert_eq!(render("bigint", false, true, &sql), "sql.NullInt64");
        assert_eq!(render("int", true, true, &sql), "sql.NullInt64");

        let wide = Config::builder().all_int64(true).build().unwrap();
        let field = map_column(&column(ColumnType::new("int"), true, true), &wide).unwrap();
        assert_eq!(field.to_string(), "*uint64");
        assert_eq!(field.imports().count(), 0);
    }

    #[test]
    fn year_is_an_integer_family() {
        let config = Config::default();
        assert_eq!(render("year", false, false, &config), "int16");
        assert_eq!(render("year", true, false, &config), "uint16");
        assert_eq!(render("year", false, true, &config), "sql.NullInt16");

        let wide = Config::builder().all_int64(true).build().unwrap();
        assert_eq!(render("year", false, false, &wide), "int64");
    }

    #[test]
    fn imports_follow_representation() {
        let sql = Config::default();
        let ptr = Config::builder().null_style("ptr").build().unwrap();
        let time = |nullable: bool, config: &Config| {
            map_column(&column(ColumnType::new("date"), false, nullable), config)
                .unwrap()
                .imports()
                .collect::<Vec<_>>()
        };
        assert_eq!(time(false, &sql), ["time"]);
        assert_eq!(time(true, &sql), ["database/sql"]);
        assert_eq!(time(true, &ptr), ["time"]);
    }

    #[test]
    fn mapping_is_total_over_known_families() {
        let families = [
            "tinyint", "smallint", "mediumint", "int", "bigint", "year", "float", "double",
            "decimal", "numeric", "char", "varchar", "text", "enum", "set", "blob", "binary",
            "varbinary", "date", "datetime", "timestamp", "time", "json",
        ];
        let configs = [
            Config::builder().null_style("sql").build().unwrap(),
            Config::builder().null_style("ptr").build().unwrap(),
            Config::builder().null_style("sql").all_int64(true).build().unwrap(),
            Config::builder().null_style("ptr").all_int64(true).build().unwrap(),
        ];
        for family in families {
            for config in &configs {
                for unsigned in [false, true] {
                    for nullable in [false, true] {
                        let col = column(ColumnType::new(family), unsigned, nullable);
                        let field = map_column(&col, config).unwrap();
                        if config.all_int64() && field.base.is_integer() {
                            assert!(matches!(field.base, GoType::Int64 | GoType::Uint64));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn unknown_type_is_an_error() {
        let col = Column::new("area", ColumnType::new("geometry"));
        let err = map_column(&col, &Config::default()).unwrap_err();
        match err {
            GeneratorError::UnsupportedType { column, data_type } => {
                assert_eq!(column, "area");
                assert_eq!(data_type, "geometry");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
