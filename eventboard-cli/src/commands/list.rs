use anyhow::Result;
use eventboard_core::EventStore;
use owo_colors::OwoColorize;

use crate::render;

pub async fn run(store: &EventStore, page: i64, page_size: u32) -> Result<()> {
    let events = store.list_paged(page, page_size).await?;

    if events.is_empty() {
        println!("{}", "No events found".dimmed());
        return Ok(());
    }

    for event in &events {
        println!("{}", render::format_dates(&event.date).bold());
        println!("{}", render::event_line(event));
    }

    Ok(())
}
