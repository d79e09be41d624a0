//! Renders a parsed table as a Go source file with a GORM model struct.

use std::collections::BTreeSet;
use std::fmt;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{GeneratorError, Result};
use crate::naming;
use crate::schema::{Column, Table};
use crate::types::{self, FieldType};

const TABLE_NAME_METHOD: &str = "TableName";

#[derive(Debug)]
struct Field {
    name: String,
    ty: FieldType,
    tag: String,
    comment: Option<String>,
}

/// Everything needed to print one Go file.
#[derive(Debug)]
struct Model<'a> {
    package: &'a str,
    imports: BTreeSet<&'static str>,
    struct_name: String,
    comment: Option<String>,
    fields: Vec<Field>,
    /// Emitted through a `TableName()` method when set.
    table_name: Option<&'a str>,
}

/// Renders `table` as Go source under `config`.
pub fn render(table: &Table, config: &Config) -> Result<String> {
    let model = Model::new(table, config)?;
    debug!(
        table = %table.name,
        struct_name = %model.struct_name,
        fields = model.fields.len(),
        "rendering model"
    );
    Ok(model.to_string())
}

impl<'a> Model<'a> {
    fn new(table: &'a Table, config: &'a Config) -> Result<Self> {
        let struct_name = naming::exported_name(&table.name, config.table_prefix());
        let table_name = (config.force_table_name()
            || naming::gorm_table_name(&struct_name) != table.name)
            .then_some(table.name.as_str());

        let mut imports = BTreeSet::new();
        let mut fields = Vec::with_capacity(table.columns.len());
        let mut owners: FxHashMap<String, &str> = FxHashMap::default();
        for column in &table.columns {
            let ty = types::map_column(column, config)?;
            imports.extend(ty.imports());

            let mut name = naming::exported_name(&column.name, config.column_prefix());
            // a field may not share its name with the accessor method
            if table_name.is_some() && name == TABLE_NAME_METHOD {
                name.push('_');
            }
            if let Some(first) = owners.insert(name.clone(), &column.name) {
                return Err(GeneratorError::FieldCollision {
                    field: name,
                    first: first.to_owned(),
                    second: column.name.clone(),
                });
            }

            fields.push(Field {
                name,
                ty,
                tag: field_tag(column, config),
                comment: column.comment.as_deref().map(single_line),
            });
        }

        Ok(Self {
            package: config.package(),
            imports,
            comment: table.comment.as_deref().map(single_line),
            struct_name,
            fields,
            table_name,
        })
    }
}

impl fmt::Display for Model<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "package {}", self.package)?;
        writeln!(f)?;

        if !self.imports.is_empty() {
            writeln!(f, "import (")?;
            for import in &self.imports {
                writeln!(f, "\t\"{import}\"")?;
            }
            writeln!(f, ")")?;
            writeln!(f)?;
        }

        if let Some(comment) = &self.comment {
            writeln!(f, "// {} {}", self.struct_name, comment)?;
        }
        writeln!(f, "type {} struct {{", self.struct_name)?;
        self.write_fields(f)?;
        writeln!(f, "}}")?;

        if let Some(table_name) = self.table_name {
            writeln!(f)?;
            writeln!(
                f,
                "func (m *{}) {TABLE_NAME_METHOD}() string {{",
                self.struct_name
            )?;
            writeln!(f, "\treturn {}", go_string(table_name))?;
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}

impl Model<'_> {
    /// Field lines with names, types, tags and trailing comments aligned the
    /// way gofmt aligns them.
    fn write_fields(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types: Vec<String> = self.fields.iter().map(|field| field.ty.to_string()).collect();
        let tags: Vec<String> = self
            .fields
            .iter()
            .map(|field| format!("`{}`", field.tag))
            .collect();
        let name_width = self.fields.iter().map(|field| field.name.len()).max().unwrap_or(0);
        let type_width = types.iter().map(String::len).max().unwrap_or(0);

        // trailing comments align within runs of consecutive commented fields
        let mut tag_widths = vec![0; self.fields.len()];
        let mut start = 0;
        while start < self.fields.len() {
            if self.fields[start].comment.is_none() {
                start += 1;
                continue;
            }
            let end = self.fields[start..]
                .iter()
                .position(|field| field.comment.is_none())
                .map_or(self.fields.len(), |offset| start + offset);
            let width = tags[start..end]
                .iter()
                .map(|tag| tag.chars().count())
                .max()
                .unwrap_or(0);
            tag_widths[start..end].fill(width);
            start = end;
        }

        for (i, field) in self.fields.iter().enumerate() {
            write!(
                f,
                "\t{:<name_width$} {:<type_width$} ",
                field.name, types[i]
            )?;
            match &field.comment {
                Some(comment) => {
                    writeln!(f, "{:<width$} // {comment}", tags[i], width = tag_widths[i])?
                }
                None => writeln!(f, "{}", tags[i])?,
            }
        }
        Ok(())
    }
}

/// `gorm:"..."` plus `json:"..."` when enabled. Tags always carry the
/// column name as written in the DDL.
fn field_tag(column: &Column, config: &Config) -> String {
    let mut gorm = vec![format!("column:{}", column.name)];
    if config.gorm_type() {
        gorm.push(format!("type:{}", column.full_type()));
    }
    if column.primary_key {
        gorm.push("primary_key".to_owned());
    }
    if column.auto_increment {
        gorm.push("AUTO_INCREMENT".to_owned());
    }
    if let Some(default) = default_value(column) {
        gorm.push(format!("default:{default}"));
    }
    if column.unique && !column.primary_key {
        gorm.push("unique".to_owned());
    }
    if !column.nullable && !column.primary_key {
        gorm.push("NOT NULL".to_owned());
    }

    let mut tag = format!("gorm:{}", go_string(&gorm.join(";")));
    if config.json_tag() {
        tag.push_str(&format!(" json:{}", go_string(&column.name)));
    }
    tag
}

/// The default as GORM expects it: unquoted strings, no explicit NULL.
fn default_value(column: &Column) -> Option<String> {
    let raw = column.default.as_deref()?;
    if raw.eq_ignore_ascii_case("NULL") {
        return None;
    }
    let value = match raw.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')) {
        Some(inner) if !inner.is_empty() => inner.replace("''", "'"),
        _ => raw.to_owned(),
    };
    if value.contains(['`', ';']) {
        warn!(
            column = %column.name,
            default = %raw,
            "default value cannot be expressed in a gorm tag, skipped"
        );
        return None;
    }
    Some(value)
}

/// Double-quoted Go string literal.
fn go_string(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

fn single_line(comment: &str) -> String {
    comment.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_create_table;
    use pretty_assertions::assert_eq;

    fn generate(sql: &str, config: &Config) -> String {
        render(&parse_create_table(sql).unwrap(), config).unwrap()
    }

    #[test]
    fn renders_prefixed_table_with_json_and_pointers() {
        let config = Config::builder()
            .table_prefix("zy_")
            .package("model")
            .null_style("ptr")
            .json_tag(true)
            .build()
            .unwrap();
        let code = generate(
            "CREATE TABLE zy_user (id bigint unsigned NOT NULL AUTO_INCREMENT, \
             name varchar(64) NOT NULL, age tinyint unsigned NULL, PRIMARY KEY (id))",
            &config,
        );
        assert_eq!(
            code,
            r#"package model

type User struct {
	Id   uint64 `gorm:"column:id;primary_key;AUTO_INCREMENT" json:"id"`
	Name string `gorm:"column:name;NOT NULL" json:"name"`
	Age  *uint8 `gorm:"column:age" json:"age"`
}

func (m *User) TableName() string {
	return "zy_user"
}
"#
        );
    }

    #[test]
    fn imports_only_what_fields_use() {
        let config = Config::default();
        let code = generate(
            "CREATE TABLE users (id int NOT NULL, nick varchar(10), born date NOT NULL)",
            &config,
        );
        assert_eq!(
            code,
            r#"package model

import (
	"database/sql"
	"time"
)

type Users struct {
	Id   int32          `gorm:"column:id;NOT NULL"`
	Nick sql.NullString `gorm:"column:nick"`
	Born time.Time      `gorm:"column:born;NOT NULL"`
}
"#
        );

        let code = generate("CREATE TABLE users (id int NOT NULL)", &config);
        assert!(!code.contains("import"));
    }

    #[test]
    fn comments_type_tags_and_defaults() {
        let config = Config::builder()
            .gorm_type(true)
            .package("entity")
            .build()
            .unwrap();
        let code = generate(
            "CREATE TABLE `orders` (
               `id` int(10) unsigned NOT NULL AUTO_INCREMENT COMMENT 'order id',
               `state` varchar(8) NOT NULL DEFAULT 'new' COMMENT 'lifecycle\nstate',
               `code` char(6) NOT NULL UNIQUE,
               `paid` tinyint(1) NOT NULL DEFAULT 0,
               PRIMARY KEY (`id`)
             ) ENGINE=InnoDB COMMENT='customer orders'",
            &config,
        );
        assert_eq!(
            code,
            r#"package entity

// Orders customer orders
type Orders struct {
	Id    uint32 `gorm:"column:id;type:int(10) unsigned;primary_key;AUTO_INCREMENT"` // order id
	State string `gorm:"column:state;type:varchar(8);default:new;NOT NULL"`          // lifecycle state
	Code  string `gorm:"column:code;type:char(6);unique;NOT NULL"`
	Paid  bool   `gorm:"column:paid;type:tinyint(1);default:0;NOT NULL"`
}
"#
        );
    }

    #[test]
    fn table_name_accessor_rules() {
        let plain = Config::default();
        let forced = Config::builder().force_table_name(true).build().unwrap();

        // GORM already maps Orders -> orders
        let code = generate("CREATE TABLE orders (id int)", &plain);
        assert!(!code.contains("TableName"));

        let code = generate("CREATE TABLE orders (id int)", &forced);
        assert!(code.contains("func (m *Orders) TableName() string {\n\treturn \"orders\"\n}"));

        // singular table names do not match the pluralized default
        let code = generate("CREATE TABLE order_item (id int)", &plain);
        assert!(code.contains("return \"order_item\""));
    }

    #[test]
    fn field_named_like_accessor_is_renamed() {
        let config = Config::builder().table_prefix("zy_").build().unwrap();
        let code = generate(
            "CREATE TABLE zy_audit (id int NOT NULL, table_name varchar(64) NOT NULL)",
            &config,
        );
        assert!(code.contains("\tTableName_ string `gorm:\"column:table_name;NOT NULL\"`"));
        assert!(code.contains("func (m *Audit) TableName() string {"));
        assert!(!code.contains("\tTableName "));

        // no accessor, nothing to rename
        let code = generate(
            "CREATE TABLE audits (table_name varchar(64) NOT NULL)",
            &Config::default(),
        );
        assert!(code.contains("\tTableName string `gorm:\"column:table_name;NOT NULL\"`"));
        assert!(!code.contains("func (m *Audits)"));
    }

    #[test]
    fn column_prefix_keeps_original_name_in_tags() {
        let config = Config::builder()
            .column_prefix("f_")
            .json_tag(true)
            .build()
            .unwrap();
        let code = generate("CREATE TABLE items (f_title text NOT NULL)", &config);
        assert!(code.contains(
            "\tTitle string `gorm:\"column:f_title;NOT NULL\" json:\"f_title\"`"
        ));
    }

    #[test]
    fn null_style_changes_only_the_type() {
        let sql = "CREATE TABLE notes (body varchar(255))";
        let wrapped = generate(sql, &Config::default());
        let pointer = generate(sql, &Config::builder().null_style("ptr").build().unwrap());

        assert!(wrapped.contains("Body sql.NullString `gorm:\"column:body\"`"));
        assert!(pointer.contains("Body *string `gorm:\"column:body\"`"));
        let unwrapped = wrapped
            .replace("import (\n\t\"database/sql\"\n)\n\n", "")
            .replace("sql.NullString", "*string");
        assert_eq!(unwrapped, pointer);
    }

    #[test]
    fn json_tag_only_when_enabled() {
        let sql = "CREATE TABLE notes (id int NOT NULL, user_id int NOT NULL)";
        let without = generate(sql, &Config::default());
        assert!(!without.contains("json:"));

        let with = generate(sql, &Config::builder().json_tag(true).build().unwrap());
        assert!(with.contains("json:\"id\""));
        assert!(with.contains("json:\"user_id\""));
        assert!(!with.contains("json:\"UserId\""));
    }

    #[test]
    fn null_defaults_are_omitted() {
        let code = generate(
            "CREATE TABLE notes (seen datetime DEFAULT NULL, note varchar(4) DEFAULT '')",
            &Config::default(),
        );
        assert!(code.contains("`gorm:\"column:seen\"`"));
        assert!(code.contains("`gorm:\"column:note;default:''\"`"));
    }

    #[test]
    fn unsupported_type_fails_render() {
        let table = parse_create_table("CREATE TABLE shapes (area geometry NOT NULL)").unwrap();
        let err = render(&table, &Config::default()).unwrap_err();
        assert!(matches!(err, GeneratorError::UnsupportedType { ref column, .. } if column == "area"));
    }

    #[test]
    fn colliding_field_names_fail() {
        let table = parse_create_table("CREATE TABLE t (user_id int, userId int)").unwrap();
        let err = render(&table, &Config::default()).unwrap_err();
        assert!(matches!(err, GeneratorError::FieldCollision { .. }));
    }
}
