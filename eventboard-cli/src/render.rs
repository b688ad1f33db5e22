//! Terminal formatting for events.

use chrono::NaiveDate;
use eventboard_core::{Event, EventDate};
use owo_colors::OwoColorize;

const DATE_FORMAT: &str = "%a %b %-d %Y";

/// Format a day as a label (e.g. "Today", "Tomorrow", "Wed Feb 25")
pub fn date_label(day: NaiveDate) -> String {
    let today = chrono::Utc::now().date_naive();
    match (day - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => day.format(DATE_FORMAT).to_string(),
    }
}

/// A single day, or "first - last" when the event spans several
pub fn format_dates(date: &EventDate) -> String {
    date.span_label(DATE_FORMAT)
        .unwrap_or_else(|| "Date unknown".to_string())
}

/// Right-aligned time column (e.g. "        19:00" or "      all-day")
pub fn time_column(event: &Event) -> String {
    match &event.time {
        Some(time) => format!("{:>13}", time.to_string()),
        None => format!("{:>13}", "all-day"),
    }
}

pub fn event_line(event: &Event) -> String {
    let source = format!("[{}]", event.source_host().unwrap_or("unknown source"));
    format!(
        "{} {} {}\n{:>13} {}",
        time_column(event),
        event.title,
        source.dimmed(),
        "",
        event.location.dimmed()
    )
}
