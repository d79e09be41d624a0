//! Generates GORM model structs from MySQL `CREATE TABLE` statements.
//!
//! ```
//! use sql2gorm::{generate, Config};
//!
//! let config = Config::builder().json_tag(true).build().unwrap();
//! let code = generate("CREATE TABLE users (id bigint NOT NULL)", &config).unwrap();
//! assert!(code.contains("Id int64 `gorm:\"column:id;NOT NULL\" json:\"id\"`"));
//! ```

use std::path::Path;

pub mod config;
pub mod db;
pub mod error;
pub mod generator;
pub mod naming;
pub mod parser;
pub mod schema;
pub mod source;
pub mod types;

pub use config::{Config, ConfigBuilder, NullStyle};
pub use error::{GeneratorError, Result};
pub use source::{OutputSink, SqlSource};

/// Parses one `CREATE TABLE` statement and renders it as Go source.
pub fn generate(sql: &str, config: &Config) -> Result<String> {
    let mut table = parser::parse_create_table(sql)?;
    if table.options.charset.is_none() {
        table.options.charset = config.charset().map(str::to_owned);
    }
    if table.options.collation.is_none() {
        table.options.collation = config.collation().map(str::to_owned);
    }
    generator::render(&table, config)
}

/// Loads the SQL, renders it and writes the result.
///
/// The code is rendered completely before the sink is touched, so a failure
/// leaves no output behind.
pub fn run(
    source: &SqlSource,
    output: Option<&Path>,
    to_stdout: bool,
    config: &Config,
) -> Result<OutputSink> {
    let sql = source.load(config)?;
    let sink = OutputSink::choose(output, to_stdout, &sql, config.table_prefix());
    let code = generate(&sql, config)?;
    sink.write(&code)?;
    Ok(sink)
}
