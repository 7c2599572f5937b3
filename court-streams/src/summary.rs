//! Operator-facing text printed around a run.

use crate::artifacts::WriteReport;
use crate::orchestrator::RunOutcome;
use jiff::civil::DateTime;
use std::fmt::Write;

const RULE_WIDTH: usize = 60;

/// Header printed when the run starts.
pub fn banner(started_at: DateTime) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!(
        "{rule}\nYouTube Live Stream Creator\nDate: {}\n{rule}",
        started_at.strftime("%Y-%m-%d %H:%M:%S")
    )
}

/// Hides all but the last four characters of a stream key.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let visible = chars.len().saturating_sub(4);
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| if i < visible { '*' } else { *c })
        .collect()
}

/// The closing summary: what was created, what failed, and what was left behind.
pub fn render(outcome: &RunOutcome, report: &WriteReport) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = format!("{rule}\nSUMMARY\n{rule}\n");

    // writing to a String cannot fail
    for result in &outcome.results {
        let _ = writeln!(out, "\n{}:", result.venue_name);
        let _ = writeln!(out, "  Title: {}", result.title);
        let _ = writeln!(out, "  Watch URL: {}", result.watch_url);
        let key = result.stream_key.as_deref().map_or_else(|| "not provisioned".to_string(), mask_key);
        let _ = writeln!(out, "  Stream Key: {key}");
    }

    for failure in &outcome.failures {
        let _ = writeln!(
            out,
            "\n✗ {}: failed to {}: {}",
            failure.venue.name, failure.step, failure.error
        );
        if let Some(id) = &failure.orphaned_broadcast {
            let _ = writeln!(out, "  Orphaned broadcast: {id}");
        }
        if let Some(id) = &failure.orphaned_ingest {
            let _ = writeln!(out, "  Orphaned stream: {id}");
        }
    }

    for skip in &report.relay_skipped {
        let _ = writeln!(out, "\n✗ Relay not configured for {skip}");
    }

    let _ = write!(
        out,
        "\n✓ Successfully created {}/{} streams",
        outcome.results.len(),
        outcome.attempted()
    );
    out
}
