use anyhow::Result;
use eventboard_core::EventStore;
use owo_colors::OwoColorize;

pub async fn run(store: &EventStore) -> Result<()> {
    let changed = store.canonicalize_dates().await?;
    if changed == 0 {
        println!("{}", "All event dates are already in array form".dimmed());
    } else {
        println!("{} {} event dates", "Migrated".green(), changed);
    }
    Ok(())
}
