use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;

use crate::error::CoreError;
use crate::model::{Event, State, Thought};

pub const THOUGHT_COLUMNS: &str = "id, content, current_state, tend_counter, created_at, updated_at, \
     last_tended_at, eligibility_at, valence, energy";

pub const EVENT_COLUMNS: &str = "id, thought_id, kind, at, previous_state, next_state, note";

/// Canonical stored form: UTC, nine fractional digits, `Z` suffix.
/// Fixed width keeps lexical and chronological order identical.
pub fn format_ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn parse_ts(
    raw: &str,
    table: &'static str,
    column: &'static str,
) -> Result<DateTime<Utc>, CoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CoreError::CorruptRow {
            table,
            column,
            detail: format!("invalid timestamp '{raw}': {e}"),
        })
}

/// Get a column value, reporting decode failures as a corrupt row.
pub fn get<T: rusqlite::types::FromSql>(
    row: &Row<'_>,
    idx: usize,
    table: &'static str,
    column: &'static str,
) -> Result<T, CoreError> {
    row.get(idx).map_err(|e| CoreError::CorruptRow {
        table,
        column,
        detail: e.to_string(),
    })
}

pub fn parse_state(raw: &str, table: &'static str, column: &'static str) -> Result<State, CoreError> {
    raw.parse().map_err(|_| CoreError::CorruptRow {
        table,
        column,
        detail: format!("unknown state: {raw}"),
    })
}

/// Decode a row selected with [`THOUGHT_COLUMNS`].
pub fn thought_from_row(row: &Row<'_>) -> Result<Thought, CoreError> {
    const T: &str = "thoughts";

    let state: String = get(row, 2, T, "current_state")?;
    let created_at: String = get(row, 4, T, "created_at")?;
    let updated_at: String = get(row, 5, T, "updated_at")?;
    let last_tended_at: Option<String> = get(row, 6, T, "last_tended_at")?;
    let eligibility_at: Option<String> = get(row, 7, T, "eligibility_at")?;

    Ok(Thought {
        id: get(row, 0, T, "id")?,
        content: get(row, 1, T, "content")?,
        current_state: parse_state(&state, T, "current_state")?,
        tend_counter: get(row, 3, T, "tend_counter")?,
        created_at: parse_ts(&created_at, T, "created_at")?,
        updated_at: parse_ts(&updated_at, T, "updated_at")?,
        last_tended_at: last_tended_at
            .map(|raw| parse_ts(&raw, T, "last_tended_at"))
            .transpose()?,
        eligibility_at: eligibility_at
            .map(|raw| parse_ts(&raw, T, "eligibility_at"))
            .transpose()?,
        valence: get(row, 8, T, "valence")?,
        energy: get(row, 9, T, "energy")?,
    })
}

/// Decode a row selected with [`EVENT_COLUMNS`].
pub fn event_from_row(row: &Row<'_>) -> Result<Event, CoreError> {
    const T: &str = "events";

    let at: String = get(row, 3, T, "at")?;
    let previous_state: Option<String> = get(row, 4, T, "previous_state")?;
    let next_state: Option<String> = get(row, 5, T, "next_state")?;

    Ok(Event {
        id: get(row, 0, T, "id")?,
        thought_id: get(row, 1, T, "thought_id")?,
        kind: get(row, 2, T, "kind")?,
        at: parse_ts(&at, T, "at")?,
        previous_state: previous_state
            .map(|raw| parse_state(&raw, T, "previous_state"))
            .transpose()?,
        next_state: next_state
            .map(|raw| parse_state(&raw, T, "next_state"))
            .transpose()?,
        note: get(row, 6, T, "note")?,
    })
}
