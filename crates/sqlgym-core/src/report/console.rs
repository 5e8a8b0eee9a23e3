use crate::model::{RunOutcome, TableResult};
use crate::normalize::{diff_tables, RowDiff};

/// Rows shown per side of a mismatch diff before truncating.
const DIFF_PREVIEW_ROWS: usize = 10;

/// Aligned plain-text table with a header rule and a row count footer.
pub fn render_table(table: &TableResult) -> String {
    if table.fields.is_empty() {
        return "(no result set)\n".to_string();
    }

    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|r| r.iter().map(|v| v.to_string()).collect())
        .collect();

    let mut widths: Vec<usize> = table.fields.iter().map(|f| f.chars().count()).collect();
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &table.fields, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("-+-"));
    out.push('\n');
    for row in &cells {
        push_line(&mut out, row, &widths);
    }

    let n = table.rows.len();
    out.push_str(&format!("({} row{})\n", n, if n == 1 { "" } else { "s" }));
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(c, w)| format!("{:<width$}", c, width = w))
        .collect();
    out.push_str(padded.join(" | ").trim_end());
    out.push('\n');
}

pub fn render_diff(diff: &RowDiff) -> String {
    let mut out = String::new();
    for (label, rows) in [
        ("only in your result", &diff.unexpected),
        ("missing from your result", &diff.missing),
    ] {
        if rows.is_empty() {
            continue;
        }
        out.push_str(&format!("  {} ({}):\n", label, rows.len()));
        for row in rows.iter().take(DIFF_PREVIEW_ROWS) {
            let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            out.push_str(&format!("    ({})\n", cells.join(", ")));
        }
        if rows.len() > DIFF_PREVIEW_ROWS {
            out.push_str(&format!("    ... {} more\n", rows.len() - DIFF_PREVIEW_ROWS));
        }
    }
    out
}

/// Outcome of one challenge, as printed by the checker and the self-test.
#[derive(Debug, Clone)]
pub struct ChallengeReport {
    pub challenge_id: String,
    pub outcome: RunOutcome,
}

pub fn print_outcome(report: &ChallengeReport, verbose: bool) {
    match &report.outcome {
        RunOutcome::Completed {
            matches: true,
            actual,
            duration_ms,
            ..
        } => {
            eprintln!(
                "✅ {:<28} {} rows  ({}ms)",
                report.challenge_id,
                actual.rows.len(),
                duration_ms
            );
        }
        RunOutcome::Completed {
            matches: false,
            actual,
            expected,
            duration_ms,
        } => {
            eprintln!(
                "❌ {:<28} got {} rows, expected {}  ({}ms)",
                report.challenge_id,
                actual.rows.len(),
                expected.rows.len(),
                duration_ms
            );
            if verbose {
                eprint!("{}", render_diff(&diff_tables(actual, expected)));
            }
        }
        RunOutcome::Failed { error } => {
            eprintln!("💥 {:<28} {}", report.challenge_id, error);
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub pass: usize,
    pub fail: usize,
    pub error: usize,
}

impl Tally {
    pub fn of(reports: &[ChallengeReport]) -> Self {
        let mut t = Tally::default();
        for r in reports {
            match &r.outcome {
                RunOutcome::Completed { matches: true, .. } => t.pass += 1,
                RunOutcome::Completed { matches: false, .. } => t.fail += 1,
                RunOutcome::Failed { .. } => t.error += 1,
            }
        }
        t
    }

    pub fn all_passed(&self) -> bool {
        self.fail == 0 && self.error == 0
    }
}

pub fn print_summary(reports: &[ChallengeReport], verbose: bool) -> Tally {
    eprintln!("\nChecking {} challenges...", reports.len());
    for r in reports {
        print_outcome(r, verbose);
    }
    let t = Tally::of(reports);
    eprintln!(
        "\nSummary: {} passed, {} failed, {} errors",
        t.pass, t.fail, t.error
    );
    t
}
