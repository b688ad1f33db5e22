use anyhow::Result;
use chrono::NaiveDate;
use eventboard_core::EventStore;
use eventboard_core::day_window::offset_for_page;
use owo_colors::OwoColorize;

use crate::render;

pub async fn run(store: &EventStore, day: NaiveDate, page: i64, page_size: u32) -> Result<()> {
    let offset = offset_for_page(page, page_size);
    let result = store.events_by_day(day, offset, page_size).await?;

    println!("{}", render::date_label(day).bold());

    if result.events.is_empty() {
        println!("  {}", "No events found".dimmed());
    }
    for event in &result.events {
        println!("{}", render::event_line(event));
    }

    if result.has_more {
        let hint = format!("More events: eventboard day --date {day} --page {}", page.max(1).saturating_add(1));
        println!("\n{}", hint.dimmed());
    }

    Ok(())
}
