use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use sql2gorm::{Config, GeneratorError, SqlSource};

/// MySQL CREATE TABLE statements to GORM model structs.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// SQL file to read from
    #[arg(short = 'f', long = "file")]
    sql_file: Option<PathBuf>,

    /// Output file, default: model/<table>.go
    #[arg(short, long, conflicts_with = "stdout")]
    output: Option<PathBuf>,

    /// Write the generated code to standard output
    #[arg(long)]
    stdout: bool,

    /// Input SQL
    #[arg(long)]
    sql: Option<String>,

    /// Generate json tags
    #[arg(long)]
    json: bool,

    /// Table name prefix, removed from the struct name
    #[arg(long, default_value = "")]
    table_prefix: String,

    /// Column name prefix, removed from field names
    #[arg(long = "col-prefix", default_value = "")]
    column_prefix: String,

    /// Do not use null types
    #[arg(long)]
    no_null: bool,

    /// Null type: sql.NullXXX (use 'sql') or *xxx (use 'ptr')
    #[arg(long)]
    null_style: Option<String>,

    /// Package name, default: model
    #[arg(long)]
    pkg: Option<String>,

    /// Write the column type in the gorm tag
    #[arg(long)]
    with_type: bool,

    /// Always generate the TableName method
    #[arg(long = "with-tablename")]
    with_table_name: bool,

    /// MySQL dsn ([user]:[pass]@/[database][?charset=xxx&...])
    #[arg(long, env = "SQL2GORM_DB_DSN", hide_env_values = true)]
    db_dsn: Option<String>,

    /// MySQL table name
    #[arg(long)]
    db_table: Option<String>,

    /// Convert all int/uint types to int64/uint64
    #[arg(long)]
    all_int64: bool,

    /// Connection charset, default for tables that declare none
    #[arg(long)]
    charset: Option<String>,

    /// Connection collation, default for tables that declare none
    #[arg(long)]
    collation: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            match err.downcast_ref::<GeneratorError>() {
                Some(GeneratorError::InputResolution(_)) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut builder = Config::builder()
        .json_tag(args.json)
        .table_prefix(args.table_prefix)
        .column_prefix(args.column_prefix)
        .no_null_type(args.no_null)
        .gorm_type(args.with_type)
        .force_table_name(args.with_table_name)
        .all_int64(args.all_int64);
    if let Some(style) = args.null_style {
        builder = builder.null_style(style);
    }
    if let Some(package) = args.pkg {
        builder = builder.package(package);
    }
    if let Some(charset) = args.charset {
        builder = builder.charset(charset);
    }
    if let Some(collation) = args.collation {
        builder = builder.collation(collation);
    }
    let config = builder.build()?;

    let source = SqlSource::resolve(args.sql, args.sql_file, args.db_dsn, args.db_table)?;
    sql2gorm::run(&source, args.output.as_deref(), args.stdout, &config)
        .context("generating model")?;
    Ok(())
}

/// Logs go to stderr so generated code on stdout stays clean. `RUST_LOG`
/// overrides the level picked from `--verbose`.
fn setup_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .init();
}
