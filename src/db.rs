//! Fetches `CREATE TABLE` text from a live MySQL server.

use sqlx::mysql::MySqlConnection;
use sqlx::{Connection, Row};
use tracing::debug;
use url::{form_urlencoded, Url};

use crate::error::{GeneratorError, Result};

/// Session settings applied to the introspection connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions<'a> {
    pub charset: Option<&'a str>,
    pub collation: Option<&'a str>,
}

/// Returns the DDL the server reports for `table` through `SHOW CREATE TABLE`.
///
/// Runs to completion on a single-threaded runtime; no timeout is applied.
pub fn fetch_create_table(dsn: &str, table: &str, session: SessionOptions<'_>) -> Result<String> {
    let url = connection_url(dsn, session)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| GeneratorError::Connection(err.to_string()))?;
    runtime.block_on(show_create_table(&url, table))
}

async fn show_create_table(url: &str, table: &str) -> Result<String> {
    let mut conn = MySqlConnection::connect(url).await.map_err(connection_error)?;

    let query = format!("SHOW CREATE TABLE {}", quote_identifier(table));
    debug!(%query, "introspecting table");
    let row = sqlx::query(&query)
        .fetch_one(&mut conn)
        .await
        .map_err(connection_error)?;
    // the second column may come back with a binary collation
    let ddl: String = row.try_get_unchecked(1).map_err(connection_error)?;

    conn.close().await.map_err(connection_error)?;
    Ok(ddl)
}

fn connection_error(err: sqlx::Error) -> GeneratorError {
    GeneratorError::Connection(err.to_string())
}

/// Backtick-quotes each part of a possibly schema-qualified table name.
fn quote_identifier(name: &str) -> String {
    name.split('.')
        .map(|part| format!("`{}`", part.replace('`', "``")))
        .collect::<Vec<_>>()
        .join(".")
}

/// Accepts a `mysql://` URL or a Go driver style DSN
/// (`[user[:pass]]@[tcp(host:port)]/database[?charset=...]`).
pub fn connection_url(dsn: &str, session: SessionOptions<'_>) -> Result<String> {
    let (base, params) = if dsn.starts_with("mysql://") || dsn.starts_with("mariadb://") {
        match dsn.split_once('?') {
            Some((base, params)) => (base.to_owned(), params.to_owned()),
            None => (dsn.to_owned(), String::new()),
        }
    } else {
        driver_dsn_url(dsn)?
    };

    let mut params: Vec<String> = params
        .split('&')
        .filter(|param| !param.is_empty())
        .map(str::to_owned)
        .collect();
    let has = |params: &[String], key: &str| {
        params
            .iter()
            .any(|param| param.split('=').next() == Some(key))
    };
    if let Some(charset) = session.charset {
        if !has(&params, "charset") {
            params.push(format!("charset={charset}"));
        }
    }
    if let Some(collation) = session.collation {
        if !has(&params, "collation") {
            params.push(format!("collation={collation}"));
        }
    }

    if params.is_empty() {
        Ok(base)
    } else {
        Ok(format!("{base}?{}", params.join("&")))
    }
}

fn driver_dsn_url(dsn: &str) -> Result<(String, String)> {
    let invalid = || {
        GeneratorError::Connection(
            "invalid dsn, expected [user[:pass]]@[tcp(host:port)]/database".to_owned(),
        )
    };

    let (credentials, rest) = dsn.rsplit_once('@').unwrap_or(("", dsn));
    let (address, path) = rest.split_once('/').ok_or_else(invalid)?;
    let host = match address {
        "" => "localhost:3306",
        _ => address
            .strip_prefix("tcp(")
            .and_then(|a| a.strip_suffix(')'))
            .filter(|a| !a.is_empty())
            .ok_or_else(invalid)?,
    };
    let (database, params) = path.split_once('?').unwrap_or((path, ""));

    // keep only parameters the sqlx driver understands
    let params = params
        .split('&')
        .filter(|param| param.starts_with("charset=") || param.starts_with("collation="))
        .collect::<Vec<_>>()
        .join("&");

    let url = if credentials.is_empty() {
        format!("mysql://{host}/{database}")
    } else {
        let userinfo = match credentials.split_once(':') {
            Some((user, password)) => {
                format!("{}:{}", encode_userinfo(user), encode_userinfo(password))
            }
            None => encode_userinfo(credentials),
        };
        format!("mysql://{userinfo}@{host}/{database}")
    };
    Url::parse(&url)
        .map_err(|err| GeneratorError::Connection(format!("invalid dsn: {err}")))?;
    Ok((url, params))
}

/// Go driver DSNs carry credentials raw; URLs need them percent-encoded.
fn encode_userinfo(part: &str) -> String {
    // form encoding turns spaces into '+', a literal '+' is already %2B
    form_urlencoded::byte_serialize(part.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
