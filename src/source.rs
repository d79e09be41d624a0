//! Picks the SQL input and the sink for the generated code.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::Config;
use crate::db::{self, SessionOptions};
use crate::error::{GeneratorError, Result};
use crate::parser;

pub const DEFAULT_OUTPUT_DIR: &str = "model";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlSource {
    Literal(String),
    File(PathBuf),
    Database { dsn: String, table: String },
}

impl SqlSource {
    /// The first available of literal SQL, file path and DSN wins; empty
    /// values count as absent.
    pub fn resolve(
        sql: Option<String>,
        file: Option<PathBuf>,
        dsn: Option<String>,
        table: Option<String>,
    ) -> Result<Self> {
        let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        if let Some(sql) = present(sql) {
            return Ok(SqlSource::Literal(sql));
        }
        if let Some(file) = file.filter(|path| !path.as_os_str().is_empty()) {
            return Ok(SqlSource::File(file));
        }
        if let Some(dsn) = present(dsn) {
            let table = present(table).ok_or_else(|| {
                GeneratorError::InputResolution("--db-dsn requires --db-table".to_owned())
            })?;
            return Ok(SqlSource::Database { dsn, table });
        }
        Err(GeneratorError::InputResolution(
            "no SQL input (--sql | --file | --db-dsn)".to_owned(),
        ))
    }

    pub fn load(&self, config: &Config) -> Result<String> {
        match self {
            SqlSource::Literal(sql) => Ok(sql.clone()),
            SqlSource::File(path) => {
                info!(path = %path.display(), "reading sql file");
                fs::read_to_string(path).map_err(|err| GeneratorError::io(path, err))
            }
            SqlSource::Database { dsn, table } => {
                info!(%table, "fetching create table statement");
                let session = SessionOptions {
                    charset: config.charset(),
                    collation: config.collation(),
                };
                db::fetch_create_table(dsn, table, session)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSink {
    File(PathBuf),
    Stdout,
}

impl OutputSink {
    /// An explicit path wins, then stdout when requested, then
    /// `model/<table>.go` derived from the SQL text, then stdout.
    pub fn choose(explicit: Option<&Path>, to_stdout: bool, sql: &str, table_prefix: &str) -> Self {
        if let Some(path) = explicit.filter(|path| !path.as_os_str().is_empty()) {
            return OutputSink::File(path.to_path_buf());
        }
        if to_stdout {
            return OutputSink::Stdout;
        }
        match default_output_path(sql, table_prefix) {
            Some(path) => OutputSink::File(path),
            None => {
                warn!("no table name found in the SQL, writing to stdout");
                OutputSink::Stdout
            }
        }
    }

    /// Writes the fully rendered `code`, creating parent directories.
    pub fn write(&self, code: &str) -> Result<()> {
        match self {
            OutputSink::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).map_err(|err| GeneratorError::io(parent, err))?;
                }
                fs::write(path, code).map_err(|err| GeneratorError::io(path, err))?;
                info!(path = %path.display(), "wrote model");
                Ok(())
            }
            OutputSink::Stdout => {
                let mut stdout = io::stdout().lock();
                stdout
                    .write_all(code.as_bytes())
                    .and_then(|()| stdout.flush())
                    .map_err(|err| GeneratorError::io("<stdout>", err))
            }
        }
    }
}

/// `model/<table>.go`, or `None` when the SQL names no table.
///
/// The table prefix is cut literally, with no word boundary, as long as
/// something is left of the name.
pub fn default_output_path(sql: &str, table_prefix: &str) -> Option<PathBuf> {
    let table = parser::extract_table_name(sql)?;
    let stem = match table.strip_prefix(table_prefix) {
        Some(rest) if !table_prefix.is_empty() && !rest.is_empty() => rest,
        _ => table.as_str(),
    };
    Some(Path::new(DEFAULT_OUTPUT_DIR).join(format!("{stem}.go")))
}
