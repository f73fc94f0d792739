//! Column codecs shared by the SQLite repositories.

use chrono::{DateTime, NaiveDate, Utc};
use questlog_domain::{QuestlogError, Result, Task};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};

pub(crate) const TASK_COLUMNS: &str = "id, user_id, title, description, category, \
     duration_minutes, priority, start_time, end_time, completed, completed_at, xp_value, \
     google_event_id, created_at, updated_at";

const UPSERT_TASK_SQL: &str = "INSERT INTO tasks (
        id, user_id, title, description, category,
        duration_minutes, priority, start_time, end_time, completed, completed_at, xp_value,
        google_event_id, created_at, updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
    ON CONFLICT (id) DO UPDATE SET
        user_id = excluded.user_id,
        title = excluded.title,
        description = excluded.description,
        category = excluded.category,
        duration_minutes = excluded.duration_minutes,
        priority = excluded.priority,
        start_time = excluded.start_time,
        end_time = excluded.end_time,
        completed = excluded.completed,
        completed_at = excluded.completed_at,
        xp_value = excluded.xp_value,
        google_event_id = excluded.google_event_id,
        updated_at = excluded.updated_at";

pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn from_millis(idx: usize, millis: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp {millis} out of range").into(),
        )
    })
}

pub(crate) fn opt_from_millis(
    idx: usize,
    millis: Option<i64>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    millis.map(|m| from_millis(idx, m)).transpose()
}

/// Store an unsigned counter in an INTEGER column.
pub(crate) fn to_sql_int(field: &str, value: u64) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| QuestlogError::Validation(format!("{field} {value} exceeds storage range")))
}

pub(crate) fn from_sql_int<T: TryFrom<i64>>(idx: usize, value: i64) -> rusqlite::Result<T> {
    T::try_from(value).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("value {value} out of range").into(),
        )
    })
}

pub(crate) fn parse_text<T>(idx: usize, value: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.to_string().into())
    })
}

pub(crate) fn parse_date(idx: usize, value: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    value.map(|text| parse_text::<NaiveDate>(idx, &text)).transpose()
}

pub(crate) fn map_task_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let category: String = row.get(4)?;
    let priority: String = row.get(6)?;

    Ok(Task {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        category: parse_text(4, &category)?,
        duration_minutes: from_sql_int(5, row.get(5)?)?,
        priority: parse_text(6, &priority)?,
        start_time: opt_from_millis(7, row.get(7)?)?,
        end_time: opt_from_millis(8, row.get(8)?)?,
        completed: row.get::<_, i64>(9)? != 0,
        completed_at: opt_from_millis(10, row.get(10)?)?,
        xp_value: from_sql_int(11, row.get(11)?)?,
        google_event_id: row.get(12)?,
        created_at: from_millis(13, row.get(13)?)?,
        updated_at: from_millis(14, row.get(14)?)?,
    })
}

/// Insert or replace `task`.
pub(crate) fn upsert_task(conn: &Connection, task: &Task) -> Result<()> {
    let xp_value = to_sql_int("xp_value", task.xp_value)?;
    conn.execute(
        UPSERT_TASK_SQL,
        params![
            task.id,
            task.user_id,
            task.title,
            task.description,
            task.category.to_string(),
            task.duration_minutes,
            task.priority.to_string(),
            task.start_time.map(to_millis),
            task.end_time.map(to_millis),
            task.completed,
            task.completed_at.map(to_millis),
            xp_value,
            task.google_event_id,
            to_millis(task.created_at),
            to_millis(task.updated_at),
        ],
    )
    .map_err(crate::errors::to_domain)?;
    Ok(())
}
