use super::args::*;
use anyhow::Context;
use sqlgym_core::config::{apply_env_overrides, load_config, validate};
use sqlgym_core::model::{GymConfig, SchemaId};
use sqlgym_core::report::Format;
use std::path::Path;
use tokio::io::AsyncReadExt;

pub mod check;
pub mod run;
pub mod schemas;
pub mod solutions;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const CHALLENGE_FAILED: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Init(args) => cmd_init(args),
        Command::Run(args) => run::cmd_run(args).await,
        Command::Check(args) => check::cmd_check(args).await,
        Command::Solutions(args) => solutions::cmd_solutions(args).await,
        Command::Schemas(args) => schemas::cmd_schemas(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

fn cmd_init(args: InitArgs) -> anyhow::Result<i32> {
    write_sample_config_if_missing(&args.config)?;
    Ok(exit_codes::OK)
}

fn write_sample_config_if_missing(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        sqlgym_core::config::write_sample_config(path)?;
        eprintln!("created {}", path.display());
    } else {
        eprintln!("note: {} already exists", path.display());
    }
    Ok(())
}

/// Config error rendered for the user; the caller exits with `CONFIG_ERROR`.
pub(crate) struct UserError(pub String);

impl From<sqlgym_core::ConfigError> for UserError {
    fn from(e: sqlgym_core::ConfigError) -> Self {
        UserError(format!("config error: {}", e))
    }
}

impl UserError {
    pub(crate) fn report(self) -> i32 {
        eprintln!("{}", self.0);
        exit_codes::CONFIG_ERROR
    }
}

pub(crate) fn parse_schema(raw: &str) -> Result<SchemaId, UserError> {
    raw.parse().map_err(|e: sqlgym_core::GymError| UserError(e.to_string()))
}

pub(crate) fn parse_format(raw: &str, allowed: &[Format]) -> Result<Format, UserError> {
    let format: Format = raw.parse().map_err(|e: String| UserError(format!("config error: {}", e)))?;
    if !allowed.contains(&format) {
        return Err(UserError(format!(
            "config error: --format {} is not supported here",
            raw
        )));
    }
    Ok(format)
}

/// Load a config file, or defaults plus environment overrides when none is given.
pub(crate) fn load_or_default(path: Option<&Path>, strict: bool) -> Result<GymConfig, UserError> {
    match path {
        Some(p) => Ok(load_config(p, strict)?),
        None => {
            let mut cfg = GymConfig::default();
            apply_env_overrides(&mut cfg);
            validate(&cfg)?;
            Ok(cfg)
        }
    }
}

pub(crate) async fn read_sql(source: &SqlSource) -> anyhow::Result<String> {
    if let Some(sql) = &source.sql {
        return Ok(sql.clone());
    }
    let Some(file) = &source.file else {
        anyhow::bail!("either --sql or --file is required");
    };

    if file.as_os_str() == "-" {
        let mut sql = String::new();
        tokio::io::stdin()
            .read_to_string(&mut sql)
            .await
            .context("failed to read SQL from stdin")?;
        return Ok(sql);
    }

    tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read SQL file {}", file.display()))
}
