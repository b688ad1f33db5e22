//! EventStore - SQLite persistence and the day-paginated query.
//!
//! Each event is one row; its `date` and `time` are stored as JSON in the shape
//! they were written. Queries normalize every stored timestamp with `strftime`
//! into the fixed-width form from `event::timestamp` before comparing, so rows
//! written by other ingesters (other RFC 3339 spellings, invalid JSON) neither
//! fall out of their day nor fail the query.

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::AppConfig;
use crate::day_window::{DayWindow, offset_for_page};
use crate::error::{EventError, EventResult};
use crate::event::{Event, EventDate, NewEvent, timestamp};

const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

/// One page of a day's events
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
    pub events: Vec<Event>,
    pub has_more: bool,
}

/// Handle to the event database.
///
/// Cheap to clone; all clones share one connection pool. Construct it once at
/// startup and call `close` on shutdown.
#[derive(Clone)]
pub struct EventStore {
    pool: SqlitePool,
    query_timeout: Duration,
}

impl EventStore {
    /// Open the pool described by `config` and run migrations.
    pub async fn connect(config: &AppConfig) -> EventResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);

        // Every connection to `:memory:` is its own database
        let max_connections = if config.database_url.contains(":memory:") {
            1
        } else {
            config.max_connections
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(config.connect_timeout())
            .connect_with(options)
            .await?;

        info!(max_connections, "Connected to event database");
        Self::new(pool, config.query_timeout()).await
    }

    /// Wrap an existing pool. Runs migrations.
    pub async fn new(pool: SqlitePool, query_timeout: Duration) -> EventResult<Self> {
        let store = Self {
            pool,
            query_timeout,
        };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> EventResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL UNIQUE,
                description TEXT,
                date_json TEXT NOT NULL,
                time_json TEXT,
                location TEXT NOT NULL,
                source_url TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("Events table migration complete");
        Ok(())
    }

    /// Close every pooled connection. Further queries fail.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Disconnected from event database");
    }

    /// Ping the database. False once closed or unreachable.
    pub async fn is_healthy(&self) -> bool {
        if self.pool.is_closed() {
            return false;
        }
        match timeout(HEALTH_TIMEOUT, sqlx::query("SELECT 1").execute(&self.pool)).await {
            Ok(Ok(_)) => true,
            Ok(Err(err)) => {
                warn!(error = %err, "Database health check failed");
                false
            }
            Err(_) => {
                warn!("Database health check timed out");
                false
            }
        }
    }

    /// Run a store operation under the query timeout.
    async fn bounded<T, F>(&self, operation: F) -> EventResult<T>
    where
        F: Future<Output = EventResult<T>>,
    {
        timeout(self.query_timeout, operation).await.map_err(|_| {
            warn!(timeout_secs = self.query_timeout.as_secs(), "Query timed out");
            EventError::QueryTimeout(self.query_timeout.as_secs())
        })?
    }

    // =========================================================================
    // Write Operations
    // =========================================================================

    /// Store a validated event. Titles are unique.
    pub async fn insert(&self, event: &NewEvent) -> EventResult<Event> {
        let now = timestamp::now();
        let date_json = serde_json::to_string(&event.date)?;
        let time_json = event.time.as_ref().map(serde_json::to_string).transpose()?;

        let result = self
            .bounded(async {
                sqlx::query(
                    r#"
                    INSERT INTO events (
                        title, description, date_json, time_json,
                        location, source_url, created_at, updated_at
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&event.title)
                .bind(&event.description)
                .bind(&date_json)
                .bind(&time_json)
                .bind(&event.location)
                .bind(event.source_url.as_str())
                .bind(timestamp::format(&now))
                .bind(timestamp::format(&now))
                .execute(&self.pool)
                .await
                .map_err(|err| insert_error(err, &event.title))
            })
            .await?;

        let id = result.last_insert_rowid();
        info!(id, title = %event.title, "Event stored");

        Ok(Event {
            id,
            title: event.title.clone(),
            description: event.description.clone(),
            date: event.date.clone(),
            time: event.time.clone(),
            location: event.location.clone(),
            source_url: event.source_url.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Rewrite every non-array `date` into the canonical array shape.
    /// Returns the number of events changed.
    pub async fn canonicalize_dates(&self) -> EventResult<u64> {
        self.bounded(async {
            let mut tx = self.pool.begin().await?;
            let rows = sqlx::query("SELECT id, date_json FROM events")
                .fetch_all(&mut *tx)
                .await?;

            let now = timestamp::format(&timestamp::now());
            let mut changed: u64 = 0;
            for row in rows {
                let id: i64 = row.try_get("id")?;
                let raw: String = row.try_get("date_json")?;
                let Ok(date) = serde_json::from_str::<EventDate>(&raw) else {
                    warn!(id, "Skipping event with unreadable date");
                    continue;
                };
                if date.is_canonical() {
                    continue;
                }
                let canonical = serde_json::to_string(&date.into_canonical())?;
                sqlx::query("UPDATE events SET date_json = ?, updated_at = ? WHERE id = ?")
                    .bind(&canonical)
                    .bind(&now)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                changed += 1;
            }

            tx.commit().await?;
            info!(changed, "Canonicalized event dates");
            Ok::<_, EventError>(changed)
        })
        .await
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    /// Events with at least one timestamp on `day` (UTC), earliest first.
    ///
    /// Fetches `limit + 1` rows; the extra row only sets `has_more` and is
    /// dropped before returning. A negative `offset` is treated as 0.
    pub async fn events_by_day(
        &self,
        day: NaiveDate,
        offset: i64,
        limit: u32,
    ) -> EventResult<EventPage> {
        let window = DayWindow::for_day(day);
        let offset = offset.max(0);
        let fetch = i64::from(limit) + 1;

        let rows = self
            .bounded(async {
                sqlx::query(
                    r#"
                    SELECT id, title, description, date_json, time_json,
                           location, source_url, created_at, updated_at
                    FROM events
                    WHERE EXISTS (
                        SELECT 1
                        FROM json_each(
                            CASE WHEN json_valid(events.date_json) THEN events.date_json ELSE '[]' END
                        ) AS d
                        WHERE strftime('%Y-%m-%dT%H:%M:%fZ', d.value) BETWEEN ? AND ?
                    )
                    ORDER BY (
                        SELECT MIN(strftime('%Y-%m-%dT%H:%M:%fZ', d.value))
                        FROM json_each(
                            CASE WHEN json_valid(events.date_json) THEN events.date_json ELSE '[]' END
                        ) AS d
                    ) ASC,
                    title ASC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(timestamp::format(&window.start))
                .bind(timestamp::format(&window.end))
                .bind(fetch)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
                .map_err(EventError::from)
            })
            .await?;

        let mut events = rows
            .iter()
            .map(row_to_event)
            .collect::<EventResult<Vec<_>>>()?;

        let has_more = events.len() > limit as usize;
        events.truncate(limit as usize);

        debug!(%day, offset, limit, returned = events.len(), has_more, "Day query");
        Ok(EventPage { events, has_more })
    }

    /// All events regardless of day, ordered by their sort key, one page at a time.
    /// Pages start at 1; there is no "more" signal.
    ///
    /// Dates with no readable timestamp sort to the epoch.
    pub async fn list_paged(&self, page: i64, page_size: u32) -> EventResult<Vec<Event>> {
        let offset = offset_for_page(page, page_size);
        let epoch = timestamp::format(&DateTime::<Utc>::UNIX_EPOCH);

        let rows = self
            .bounded(async {
                sqlx::query(
                    r#"
                    SELECT id, title, description, date_json, time_json,
                           location, source_url, created_at, updated_at
                    FROM events
                    ORDER BY COALESCE((
                        SELECT MIN(strftime('%Y-%m-%dT%H:%M:%fZ', d.value))
                        FROM json_each(
                            CASE WHEN json_valid(events.date_json) THEN events.date_json ELSE '[]' END
                        ) AS d
                    ), ?) ASC,
                    title ASC
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(&epoch)
                .bind(i64::from(page_size))
                .bind(offset)
                .fetch_all(&self.pool)
                .await
                .map_err(EventError::from)
            })
            .await?;

        rows.iter().map(row_to_event).collect()
    }

    pub async fn find_by_title(&self, title: &str) -> EventResult<Option<Event>> {
        let row = self
            .bounded(async {
                sqlx::query(
                    r#"
                    SELECT id, title, description, date_json, time_json,
                           location, source_url, created_at, updated_at
                    FROM events
                    WHERE title = ?
                    "#,
                )
                .bind(title)
                .fetch_optional(&self.pool)
                .await
                .map_err(EventError::from)
            })
            .await?;

        row.as_ref().map(row_to_event).transpose()
    }
}

fn insert_error(err: sqlx::Error, title: &str) -> EventError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            EventError::DuplicateTitle(title.to_string())
        }
        _ => EventError::Database(err),
    }
}

fn row_to_event(row: &SqliteRow) -> EventResult<Event> {
    let id: i64 = row.try_get("id")?;
    let title: String = row.try_get("title")?;
    let description: Option<String> = row.try_get("description")?;
    let date_json: String = row.try_get("date_json")?;
    let time_json: Option<String> = row.try_get("time_json")?;
    let location: String = row.try_get("location")?;
    let source_url_str: String = row.try_get("source_url")?;
    let created_at_str: String = row.try_get("created_at")?;
    let updated_at_str: String = row.try_get("updated_at")?;

    // Rows written by other ingesters may carry dates we cannot read; they
    // still list, sorted to the epoch.
    let date = serde_json::from_str(&date_json).unwrap_or_else(|err| {
        warn!(id, error = %err, "Unreadable event date");
        EventDate::Many(Vec::new())
    });
    let time = time_json
        .map(|raw| serde_json::from_str(&raw))
        .transpose()?;
    let source_url = Url::parse(&source_url_str)
        .map_err(|e| EventError::Corrupt(format!("event {id} has an invalid source url: {e}")))?;
    let created_at = timestamp::parse(&created_at_str)
        .ok_or_else(|| EventError::Corrupt(format!("event {id} has an invalid created_at")))?;
    let updated_at = timestamp::parse(&updated_at_str)
        .ok_or_else(|| EventError::Corrupt(format!("event {id} has an invalid updated_at")))?;

    Ok(Event {
        id,
        title,
        description,
        date,
        time,
        location,
        source_url,
        created_at,
        updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventTime;
    use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
    use std::collections::HashSet;

    async fn create_test_store() -> EventStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        EventStore::new(pool, Duration::from_secs(10)).await.unwrap()
    }

    fn jan15() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn new_event(title: &str, date: EventDate) -> NewEvent {
        NewEvent {
            title: title.to_string(),
            description: None,
            date,
            time: None,
            location: "Town Hall".to_string(),
            source_url: Url::parse("https://example.com/events").unwrap(),
        }
    }

    fn on_jan15(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, h, m, s).unwrap()
    }

    async fn insert_raw(store: &EventStore, title: &str, date_json: &str) {
        sqlx::query(
            r#"
            INSERT INTO events (title, date_json, location, source_url, created_at, updated_at)
            VALUES (?, ?, 'Somewhere', 'https://example.com', '2024-01-01T00:00:00.000Z',
                    '2024-01-01T00:00:00.000Z')
            "#,
        )
        .bind(title)
        .bind(date_json)
        .execute(&store.pool)
        .await
        .unwrap();
    }

    fn titles(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_day_window_edges() {
        let store = create_test_store().await;
        let start = on_jan15(0, 0, 0);
        let end = start + ChronoDuration::days(1) - ChronoDuration::milliseconds(1);

        store.insert(&new_event("First moment", EventDate::One(start))).await.unwrap();
        store.insert(&new_event("Last moment", EventDate::One(end))).await.unwrap();
        store
            .insert(&new_event(
                "Day before",
                EventDate::One(start - ChronoDuration::milliseconds(1)),
            ))
            .await
            .unwrap();
        store
            .insert(&new_event(
                "Day after",
                EventDate::One(end + ChronoDuration::milliseconds(1)),
            ))
            .await
            .unwrap();

        let page = store.events_by_day(jan15(), 0, 20).await.unwrap();
        assert_eq!(titles(&page.events), vec!["First moment", "Last moment"]);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_day_query_normalizes_foreign_timestamps() {
        let store = create_test_store().await;
        insert_raw(&store, "Late", r#"["2024-01-15T23:59:59Z"]"#).await;
        insert_raw(&store, "Offset", r#""2024-01-16T00:30:00+01:00""#).await;
        insert_raw(&store, "Early", r#"{"start": "2024-01-15T06:00:00.5Z", "end": "2024-01-15T07:00:00Z"}"#).await;
        insert_raw(&store, "Next day", r#"["2024-01-16T00:00:00Z"]"#).await;

        let page = store.events_by_day(jan15(), 0, 20).await.unwrap();
        assert_eq!(titles(&page.events), vec!["Early", "Offset", "Late"]);
    }

    #[tokio::test]
    async fn test_day_query_skips_unreadable_dates() {
        let store = create_test_store().await;
        insert_raw(&store, "Garbage", "not json").await;
        insert_raw(&store, "Words", r#"["next tuesday"]"#).await;
        store
            .insert(&new_event("Readable", EventDate::One(on_jan15(12, 0, 0))))
            .await
            .unwrap();

        let page = store.events_by_day(jan15(), 0, 20).await.unwrap();
        assert_eq!(titles(&page.events), vec!["Readable"]);

        let all = store.list_paged(1, 20).await.unwrap();
        assert_eq!(titles(&all), vec!["Garbage", "Words", "Readable"]);
    }

    #[tokio::test]
    async fn test_multi_day_event_matches_each_listed_day() {
        let store = create_test_store().await;
        store
            .insert(&new_event(
                "Festival",
                EventDate::Many(vec![
                    on_jan15(18, 0, 0) - ChronoDuration::days(1),
                    on_jan15(18, 0, 0) + ChronoDuration::days(1),
                ]),
            ))
            .await
            .unwrap();

        let jan14 = store.events_by_day(jan15().pred_opt().unwrap(), 0, 20).await.unwrap();
        let jan15_page = store.events_by_day(jan15(), 0, 20).await.unwrap();
        let jan16 = store.events_by_day(jan15().succ_opt().unwrap(), 0, 20).await.unwrap();
        assert_eq!(jan14.events.len(), 1);
        assert!(jan15_page.events.is_empty());
        assert_eq!(jan16.events.len(), 1);
    }

    #[tokio::test]
    async fn test_range_matches_its_endpoints() {
        let store = create_test_store().await;
        store
            .insert(&new_event(
                "Night market",
                EventDate::Range {
                    start: on_jan15(20, 0, 0),
                    end: on_jan15(20, 0, 0) + ChronoDuration::hours(8),
                },
            ))
            .await
            .unwrap();

        assert_eq!(store.events_by_day(jan15(), 0, 20).await.unwrap().events.len(), 1);
        let next = store.events_by_day(jan15().succ_opt().unwrap(), 0, 20).await.unwrap();
        assert_eq!(next.events.len(), 1);
    }

    #[tokio::test]
    async fn test_twenty_five_events_two_pages() {
        let store = create_test_store().await;
        for i in 0..25 {
            let date = EventDate::Many(vec![on_jan15(0, i, 0)]);
            store.insert(&new_event(&format!("Event {i:02}"), date)).await.unwrap();
        }

        let first = store.events_by_day(jan15(), 0, 20).await.unwrap();
        assert_eq!(first.events.len(), 20);
        assert!(first.has_more);

        let second = store.events_by_day(jan15(), 20, 20).await.unwrap();
        assert_eq!(second.events.len(), 5);
        assert!(!second.has_more);
    }

    #[tokio::test]
    async fn test_pages_partition_the_day() {
        let store = create_test_store().await;
        let n = 7;
        for i in 0..n {
            // Shared timestamps make the title tie-break matter
            let date = EventDate::One(on_jan15(10 + i % 3, 0, 0));
            store.insert(&new_event(&format!("Show {i}"), date)).await.unwrap();
        }

        let limit = 3;
        let mut seen = Vec::new();
        let mut offset = 0;
        loop {
            let page = store.events_by_day(jan15(), offset, limit).await.unwrap();
            assert_eq!(page.has_more, offset + i64::from(limit) < i64::from(n));
            seen.extend(page.events.into_iter().map(|e| e.title));
            if !page.has_more {
                break;
            }
            offset += i64::from(limit);
        }

        assert_eq!(seen.len(), n as usize);
        assert_eq!(seen.iter().collect::<HashSet<_>>().len(), n as usize);
    }

    #[tokio::test]
    async fn test_has_more_false_on_exact_fit() {
        let store = create_test_store().await;
        for i in 0..4 {
            store
                .insert(&new_event(&format!("Talk {i}"), EventDate::One(on_jan15(9, i, 0))))
                .await
                .unwrap();
        }
        let page = store.events_by_day(jan15(), 0, 4).await.unwrap();
        assert_eq!(page.events.len(), 4);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_negative_offset_is_clamped() {
        let store = create_test_store().await;
        store
            .insert(&new_event("Only one", EventDate::One(on_jan15(12, 0, 0))))
            .await
            .unwrap();
        let page = store.events_by_day(jan15(), -40, 20).await.unwrap();
        assert_eq!(titles(&page.events), vec!["Only one"]);
    }

    #[tokio::test]
    async fn test_sorted_by_earliest_timestamp() {
        let store = create_test_store().await;
        store
            .insert(&new_event("Evening", EventDate::One(on_jan15(19, 0, 0))))
            .await
            .unwrap();
        store
            .insert(&new_event(
                "Morning and night",
                EventDate::Many(vec![on_jan15(22, 0, 0), on_jan15(8, 0, 0)]),
            ))
            .await
            .unwrap();
        store
            .insert(&new_event(
                "Lunch",
                EventDate::Range {
                    start: on_jan15(12, 0, 0),
                    end: on_jan15(13, 0, 0),
                },
            ))
            .await
            .unwrap();

        let page = store.events_by_day(jan15(), 0, 20).await.unwrap();
        assert_eq!(titles(&page.events), vec!["Morning and night", "Lunch", "Evening"]);
    }

    #[tokio::test]
    async fn test_round_trip() {
        let store = create_test_store().await;
        let mut event = new_event(
            "Poetry slam",
            EventDate::Many(vec![on_jan15(20, 15, 0) + ChronoDuration::milliseconds(250)]),
        );
        event.description = Some("Open mic".to_string());
        event.time = Some(EventTime::Span {
            start: "20:15".to_string(),
            end: "23:00".to_string(),
        });

        let stored = store.insert(&event).await.unwrap();
        let page = store.events_by_day(jan15(), 0, 20).await.unwrap();
        assert_eq!(page.events, vec![stored.clone()]);

        let read = &page.events[0];
        assert_eq!(read.title, event.title);
        assert_eq!(read.date, event.date);
        assert_eq!(read.time, event.time);
        assert_eq!(read.location, event.location);
        assert_eq!(read.source_url, event.source_url);
        assert_eq!(read.created_at, read.updated_at);
    }

    #[tokio::test]
    async fn test_duplicate_title_rejected() {
        let store = create_test_store().await;
        let event = new_event("Book fair", EventDate::One(on_jan15(10, 0, 0)));
        store.insert(&event).await.unwrap();

        let err = store.insert(&event).await.unwrap_err();
        assert!(matches!(err, EventError::DuplicateTitle(ref t) if t == "Book fair"));
    }

    #[tokio::test]
    async fn test_find_by_title() {
        let store = create_test_store().await;
        store
            .insert(&new_event("Choir", EventDate::One(on_jan15(18, 0, 0))))
            .await
            .unwrap();

        assert!(store.find_by_title("Choir").await.unwrap().is_some());
        assert!(store.find_by_title("Orchestra").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_paged_orders_by_sort_key() {
        let store = create_test_store().await;
        store
            .insert(&new_event("March", EventDate::One(on_jan15(9, 0, 0) + ChronoDuration::days(50))))
            .await
            .unwrap();
        store
            .insert(&new_event(
                "January range",
                EventDate::Range {
                    start: on_jan15(9, 0, 0),
                    end: on_jan15(9, 0, 0) + ChronoDuration::days(90),
                },
            ))
            .await
            .unwrap();
        insert_raw(&store, "Broken date", r#""next tuesday""#).await;
        insert_raw(&store, "No dates", "[]").await;

        let first = store.list_paged(1, 3).await.unwrap();
        assert_eq!(titles(&first), vec!["Broken date", "No dates", "January range"]);

        let second = store.list_paged(2, 3).await.unwrap();
        assert_eq!(titles(&second), vec!["March"]);

        let clamped = store.list_paged(0, 3).await.unwrap();
        assert_eq!(titles(&clamped), titles(&first));
    }

    #[tokio::test]
    async fn test_canonicalize_dates() {
        let store = create_test_store().await;
        store
            .insert(&new_event("Single", EventDate::One(on_jan15(9, 0, 0))))
            .await
            .unwrap();
        store
            .insert(&new_event("Already", EventDate::Many(vec![on_jan15(10, 0, 0)])))
            .await
            .unwrap();

        assert_eq!(store.canonicalize_dates().await.unwrap(), 1);
        let single = store.find_by_title("Single").await.unwrap().unwrap();
        assert_eq!(single.date, EventDate::Many(vec![on_jan15(9, 0, 0)]));
        assert_eq!(store.canonicalize_dates().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_slow_query_times_out() {
        let store = EventStore {
            query_timeout: Duration::from_millis(20),
            ..create_test_store().await
        };
        let err = store
            .bounded(std::future::pending::<EventResult<()>>())
            .await
            .unwrap_err();
        assert!(matches!(err, EventError::QueryTimeout(_)));
    }

    #[tokio::test]
    async fn test_health_follows_lifecycle() {
        let store = create_test_store().await;
        assert!(store.is_healthy().await);
        store.close().await;
        assert!(!store.is_healthy().await);
        assert!(store.events_by_day(jan15(), 0, 20).await.is_err());
    }
}
