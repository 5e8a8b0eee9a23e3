use super::{exit_codes, load_or_default};
use crate::cli::args::SolutionsArgs;
use sqlgym_core::model::{Difficulty, RunOutcome, SchemaId};
use sqlgym_core::report::console::{print_summary, ChallengeReport};
use sqlgym_core::Runner;
use std::sync::Arc;
use tokio::sync::Semaphore;

pub async fn cmd_solutions(args: SolutionsArgs) -> anyhow::Result<i32> {
    let difficulty = match args.difficulty.as_deref().map(str::parse::<Difficulty>) {
        Some(Err(e)) => {
            eprintln!("config error: {}", e);
            return Ok(exit_codes::CONFIG_ERROR);
        }
        Some(Ok(d)) => Some(d),
        None => None,
    };
    let cfg = match load_or_default(Some(args.config.as_path()), args.strict) {
        Ok(c) => c,
        Err(e) => return Ok(e.report()),
    };

    let selected = cfg.filter(args.concept.as_deref(), difficulty);
    if selected.is_empty() {
        eprintln!("no challenges selected");
        return Ok(exit_codes::OK);
    }

    let runner = Runner::from_settings(&cfg.settings);
    // each validated run holds two instances
    let lanes = (cfg.settings.pool.max_total_instances / 2).max(1);
    let permits = Arc::new(Semaphore::new(lanes));

    let mut outcomes: Vec<Option<RunOutcome>> = vec![None; selected.len()];
    // one schema at a time, so idle instances of another schema never hold slots
    for schema in SchemaId::ALL {
        let mut handles = Vec::new();
        for (idx, c) in selected.iter().enumerate().filter(|(_, c)| c.database == schema) {
            let permit = permits.clone().acquire_owned().await?;
            let runner = runner.clone();
            let sql = c.solution_sql.clone();
            let h = tokio::spawn(async move {
                let _permit = permit;
                runner.run_validated(schema, &sql, &sql).await
            });
            handles.push((idx, h));
        }

        for (idx, h) in handles {
            outcomes[idx] = Some(match h.await {
                Ok(outcome) => outcome,
                Err(e) => RunOutcome::Failed {
                    error: format!("task failed: {}", e),
                },
            });
        }
        runner.pool.drain_all();
    }

    let reports: Vec<ChallengeReport> = selected
        .iter()
        .zip(outcomes)
        .map(|(c, outcome)| ChallengeReport {
            challenge_id: c.id.clone(),
            outcome: outcome.unwrap_or_else(|| RunOutcome::Failed {
                error: "not run".into(),
            }),
        })
        .collect();

    let tally = print_summary(&reports, true);
    tracing::info!(
        event = "solutions.completed",
        passed = tally.pass,
        failed = tally.fail,
        errors = tally.error,
        lanes = lanes
    );

    Ok(if tally.all_passed() {
        exit_codes::OK
    } else {
        exit_codes::CHALLENGE_FAILED
    })
}
