use anyhow::{Result, bail};
use eventboard_core::{EventInput, EventStore};
use owo_colors::OwoColorize;
use serde_json::{Value, json};

/// Build raw input from command-line flags. Nothing is checked here;
/// `run` validates like any other ingester.
pub fn input_from_args(
    title: String,
    dates: Vec<String>,
    location: String,
    source_url: String,
    description: Option<String>,
    time: Option<String>,
) -> EventInput {
    // ISO times never contain '-', so "19:00-22:30" is unambiguous
    let time = time.map(|raw| match raw.split_once('-') {
        Some((start, end)) => json!({ "start": start.trim(), "end": end.trim() }),
        None => Value::String(raw),
    });

    EventInput {
        title: Some(title),
        description,
        date: Some(Value::Array(dates.into_iter().map(Value::String).collect())),
        time,
        location: Some(location),
        source_url: Some(source_url),
    }
}

pub async fn run(store: &EventStore, input: EventInput) -> Result<()> {
    let event = match input.validate() {
        Ok(event) => event,
        Err(errors) => {
            for error in errors.fields() {
                eprintln!("  {} {}", error.field.red(), error.message);
            }
            bail!("Event was not added");
        }
    };

    let stored = store.insert(&event).await?;
    println!("{} {}", "Added".green(), stored.title.bold());
    Ok(())
}
