use std::path::Path;

use anyhow::{Context, Result, bail};
use eventboard_core::{EventError, EventInput, EventStore};
use owo_colors::OwoColorize;
use tracing::{debug, info, warn};

/// Outcome of importing a batch of events
#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: usize,
    /// (position in the input, reason)
    pub failures: Vec<(usize, String)>,
}

/// Validate and store each input. Invalid or duplicate records are reported
/// and skipped; any other store failure aborts the import.
pub async fn import_events(store: &EventStore, inputs: Vec<EventInput>) -> Result<ImportReport> {
    let mut report = ImportReport::default();

    for (index, input) in inputs.into_iter().enumerate() {
        let event = match input.validate() {
            Ok(event) => event,
            Err(errors) => {
                warn!(index, %errors, "Skipping invalid event");
                report.failures.push((index, errors.to_string()));
                continue;
            }
        };

        match store.insert(&event).await {
            Ok(stored) => {
                debug!(index, id = stored.id, "Imported event");
                report.imported += 1;
            }
            Err(err @ EventError::DuplicateTitle(_)) => {
                warn!(index, error = %err, "Skipping duplicate event");
                report.failures.push((index, err.to_string()));
            }
            Err(err) => return Err(err.into()),
        }
    }

    info!(
        imported = report.imported,
        failed = report.failures.len(),
        "Import finished"
    );
    Ok(report)
}

pub async fn run(store: &EventStore, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    let inputs: Vec<EventInput> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of events", path.display()))?;
    let total = inputs.len();

    let report = import_events(store, inputs).await?;

    for (index, reason) in &report.failures {
        eprintln!("  {} {}", format!("#{index}").red(), reason);
    }
    println!(
        "{} {} of {} events",
        "Imported".green(),
        report.imported,
        total
    );

    if !report.failures.is_empty() {
        bail!("{} of {} events failed to import", report.failures.len(), total);
    }
    Ok(())
}
