use sqlgym_core::config::{load_config, write_sample_config};
use sqlgym_core::model::Difficulty;
use sqlgym_core::Runner;

#[tokio::test(flavor = "multi_thread")]
async fn sample_solutions_grade_against_themselves() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("sqlgym.yaml");
    write_sample_config(&path)?;
    let cfg = load_config(&path, true)?;

    let runner = Runner::from_settings(&cfg.settings);
    for c in &cfg.challenges {
        let out = runner
            .run_validated(c.database, &c.solution_sql, &c.solution_sql)
            .await;
        assert!(out.is_match(), "{}: {:?}", c.id, out.error());

        let played = runner.run_freeform(c.database, &c.solution_sql).await;
        let table = played.result.expect("solution runs");
        assert!(!table.rows.is_empty(), "{} returned no rows", c.id);
    }

    assert_eq!(runner.pool.drain_all(), 0);
    Ok(())
}

#[test]
fn sample_challenges_filter_by_difficulty() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("sqlgym.yaml");
    write_sample_config(&path)?;
    let cfg = load_config(&path, true)?;

    let advanced = cfg.filter(None, Some(Difficulty::Advanced));
    assert!(advanced.iter().all(|c| c.difficulty == Difficulty::Advanced));
    assert_eq!(advanced.len(), 8);
    assert!(cfg.filter(Some("window"), Some(Difficulty::Beginner)).is_empty());
    Ok(())
}
