use super::{exit_codes, load_or_default, parse_format, parse_schema, read_sql};
use crate::cli::args::RunArgs;
use sqlgym_core::model::PlaygroundResult;
use sqlgym_core::report::{self, Format};
use sqlgym_core::Runner;

pub async fn cmd_run(args: RunArgs) -> anyhow::Result<i32> {
    let schema = match parse_schema(&args.schema) {
        Ok(s) => s,
        Err(e) => return Ok(e.report()),
    };
    let format = match parse_format(&args.format, &[Format::Text, Format::Json, Format::Csv]) {
        Ok(f) => f,
        Err(e) => return Ok(e.report()),
    };
    let cfg = match load_or_default(args.config.as_deref(), false) {
        Ok(c) => c,
        Err(e) => return Ok(e.report()),
    };
    let sql = read_sql(&args.source).await?;

    let runner = Runner::from_settings(&cfg.settings);
    let played = runner.run_freeform(schema, &sql).await;
    runner.pool.drain_all();

    if format == Format::Json {
        println!("{}", serde_json::to_string_pretty(&played)?);
        return Ok(if played.error.is_some() {
            exit_codes::CHALLENGE_FAILED
        } else {
            exit_codes::OK
        });
    }

    let PlaygroundResult {
        result,
        error,
        duration_ms,
        ..
    } = played;
    let Some(table) = result else {
        eprintln!("error: {}", error.unwrap_or_default());
        return Ok(exit_codes::CHALLENGE_FAILED);
    };

    match report::render(&table, format) {
        Ok(out) => {
            print!("{}", out);
            if let Some(ms) = duration_ms {
                eprintln!("completed in {}ms", ms);
            }
            Ok(exit_codes::OK)
        }
        Err(e) => {
            eprintln!("error: {}", e);
            Ok(exit_codes::CHALLENGE_FAILED)
        }
    }
}
