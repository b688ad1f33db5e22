//! Server-side HTML for the day view.

use chrono::NaiveDate;
use eventboard_core::{Event, EventDate};

use crate::routes::events::DayPage;

const DATE_FORMAT: &str = "%a %b %-d, %Y";

pub fn day_page(page: &DayPage) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>Events on {}</title>\n",
        page.date.format(DATE_FORMAT)
    ));
    html.push_str("</head>\n<body>\n<main>\n");

    html.push_str(&date_picker(page.date));

    if page.events.is_empty() {
        html.push_str("<p class=\"empty\">No events on this day.</p>\n");
    } else {
        html.push_str("<ul class=\"events\">\n");
        for event in &page.events {
            html.push_str(&event_item(event));
        }
        html.push_str("</ul>\n");
    }

    html.push_str(&pagination(page));
    html.push_str("</main>\n</body>\n</html>\n");
    html
}

/// Date input with Today / Tomorrow shortcuts
fn date_picker(selected: NaiveDate) -> String {
    let today = chrono::Utc::now().date_naive();
    let tomorrow = today.succ_opt().unwrap_or(today);
    format!(
        "<form class=\"date-picker\" method=\"get\" action=\"/events\">\n\
         <a class=\"btn\" href=\"{}\">Today</a>\n\
         <a class=\"btn\" href=\"{}\">Tomorrow</a>\n\
         <input type=\"date\" name=\"date\" value=\"{}\">\n\
         <button type=\"submit\">Show</button>\n\
         </form>\n",
        day_link(today, 1),
        day_link(tomorrow, 1),
        selected.format("%Y-%m-%d"),
    )
}

fn event_item(event: &Event) -> String {
    let mut item = String::from("<li class=\"event\">\n");
    item.push_str(&format!(
        "<a href=\"{}\"><h2>{}</h2></a>\n",
        escape(event.source_url.as_str()),
        escape(&event.title)
    ));
    item.push_str(&format!(
        "<div class=\"date\">{}</div>\n",
        escape(&format_dates(&event.date))
    ));
    item.push_str(&format!(
        "<div class=\"location\">{}</div>\n",
        escape(&event.location)
    ));
    if let Some(time) = &event.time {
        item.push_str(&format!(
            "<div class=\"time\">{}</div>\n",
            escape(&time.to_string())
        ));
    }
    if let Some(description) = &event.description {
        item.push_str(&format!("<p>{}</p>\n", escape(description)));
    }
    if let Some(host) = event.source_host() {
        let host = escape(host);
        item.push_str(&format!(
            "<span class=\"badge\"><img src=\"https://{host}/favicon.ico\" alt=\"\">{host}</span>\n"
        ));
    }
    item.push_str("</li>\n");
    item
}

fn pagination(page: &DayPage) -> String {
    let mut nav = String::from("<nav class=\"pagination\">\n");
    if let Some(previous) = page.previous_page {
        nav.push_str(&format!(
            "<a rel=\"prev\" href=\"{}\">Previous</a>\n",
            day_link(page.date, previous)
        ));
    }
    if let Some(next) = page.next_page {
        nav.push_str(&format!(
            "<a rel=\"next\" href=\"{}\">More events</a>\n",
            day_link(page.date, next)
        ));
    } else if let Some(next_day) = page.next_day {
        nav.push_str(&format!(
            "<a href=\"{}\">Next day</a>\n",
            day_link(next_day, 1)
        ));
    }
    nav.push_str("</nav>\n");
    nav
}

fn day_link(day: NaiveDate, page: i64) -> String {
    if page > 1 {
        format!("/events?date={}&amp;page={}", day.format("%Y-%m-%d"), page)
    } else {
        format!("/events?date={}", day.format("%Y-%m-%d"))
    }
}

/// A single day, or "first - last" when the event spans several.
pub fn format_dates(date: &EventDate) -> String {
    date.span_label(DATE_FORMAT)
        .unwrap_or_else(|| "Date unknown".to_string())
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
