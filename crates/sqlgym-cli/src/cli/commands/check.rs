use super::{exit_codes, load_or_default, parse_format, read_sql};
use crate::cli::args::CheckArgs;
use sqlgym_core::report::console::{print_outcome, ChallengeReport};
use sqlgym_core::report::Format;
use sqlgym_core::Runner;

pub async fn cmd_check(args: CheckArgs) -> anyhow::Result<i32> {
    let format = match parse_format(&args.format, &[Format::Text, Format::Json]) {
        Ok(f) => f,
        Err(e) => return Ok(e.report()),
    };
    let cfg = match load_or_default(Some(args.config.as_path()), args.strict) {
        Ok(c) => c,
        Err(e) => return Ok(e.report()),
    };
    let Some(challenge) = cfg.challenge(&args.challenge) else {
        eprintln!(
            "config error: no challenge '{}' in {}",
            args.challenge,
            args.config.display()
        );
        return Ok(exit_codes::CONFIG_ERROR);
    };
    let sql = read_sql(&args.source).await?;

    let runner = Runner::from_settings(&cfg.settings);
    let outcome = runner
        .run_validated(challenge.database, &challenge.solution_sql, &sql)
        .await;
    runner.pool.drain_all();

    let passed = outcome.is_match();
    if format == Format::Json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(
            &ChallengeReport {
                challenge_id: challenge.id.clone(),
                outcome,
            },
            true,
        );
        if passed {
            eprintln!("+{} points: {}", challenge.points, challenge.title);
        }
    }

    Ok(if passed {
        exit_codes::OK
    } else {
        exit_codes::CHALLENGE_FAILED
    })
}
