use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Params, TransactionBehavior};
use tracing::{debug, info};

use super::database;
use super::rows::{self, format_ts, EVENT_COLUMNS, THOUGHT_COLUMNS};
use super::schema;
use crate::clock::{Clock, SystemClock};
use crate::config::SettleDuration;
use crate::error::{CoreError, StorageContext};
use crate::model::{Event, State, Thought, KIND_CAPTURED, KIND_STATE_CHANGE};
use crate::temporal::next_rest_boundary;

/// Construction-time settings for a [`Store`].
#[derive(Clone)]
pub struct StoreOptions {
    pub settle_duration: SettleDuration,
    pub clock: Arc<dyn Clock>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            settle_duration: SettleDuration::default(),
            clock: Arc::new(SystemClock),
        }
    }
}

impl StoreOptions {
    pub fn with_settle_duration(mut self, settle: SettleDuration) -> Self {
        self.settle_duration = settle;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Durable record of thoughts and their audit trail.
///
/// Every state transition updates the thought row and appends exactly one
/// event inside the same transaction, so either both land or neither does.
pub struct Store {
    conn: Mutex<Connection>,
    settle: SettleDuration,
    clock: Arc<dyn Clock>,
}

/// Values for one `events` row.
struct NewEvent<'a> {
    thought_id: i64,
    kind: &'a str,
    at: DateTime<Utc>,
    previous_state: Option<State>,
    next_state: Option<State>,
    note: Option<&'a str>,
}

impl Store {
    /// Open (or create) the database at `path` and migrate it.
    pub fn open(path: &Path, options: StoreOptions) -> Result<Self, CoreError> {
        let conn = database::open_connection(path)?;
        Ok(Self::with_connection(conn, options))
    }

    /// A private in-memory store, for tests and dry runs.
    pub fn in_memory(options: StoreOptions) -> Result<Self, CoreError> {
        let conn = database::open_in_memory()?;
        Ok(Self::with_connection(conn, options))
    }

    /// Wrap an existing connection, migrating it first.
    pub fn from_connection(mut conn: Connection, options: StoreOptions) -> Result<Self, CoreError> {
        conn.execute_batch(schema::PRAGMAS).during("open")?;
        schema::migrate(&mut conn)?;
        Ok(Self::with_connection(conn, options))
    }

    fn with_connection(conn: Connection, options: StoreOptions) -> Self {
        Self {
            conn: Mutex::new(conn),
            settle: options.settle_duration,
            clock: options.clock,
        }
    }

    pub fn settle_duration(&self) -> SettleDuration {
        self.settle
    }

    /// Current instant according to the store's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn schema_version(&self) -> Result<u32, CoreError> {
        self.with_conn(|conn| schema::current_version(conn))
    }

    /// Run `f` with exclusive access to the connection.
    pub(crate) fn with_conn<F, T>(&self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, CoreError>,
    {
        let mut conn = self.conn.lock();
        f(&mut conn)
    }

    /// Insert a new thought in the captured state. Does not log an event;
    /// see [`Store::capture`] for the atomic variant.
    pub fn create(&self, content: &str) -> Result<i64, CoreError> {
        const OP: &str = "create";
        validate_content(OP, content)?;

        let now = self.clock.now();
        let eligibility_at = next_rest_boundary(now, self.settle);
        let id = self.with_conn(|conn| insert_thought(conn, OP, content, now, eligibility_at))?;

        info!(thought_id = id, eligibility_at = %eligibility_at, "thought created");
        Ok(id)
    }

    /// Insert a new thought and its `captured` event in one transaction.
    pub fn capture(&self, content: &str) -> Result<i64, CoreError> {
        const OP: &str = "capture";
        validate_content(OP, content)?;

        let now = self.clock.now();
        let eligibility_at = next_rest_boundary(now, self.settle);
        let id = self.with_conn(|conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .during(OP)?;
            let id = insert_thought(&tx, OP, content, now, eligibility_at)?;
            insert_event(
                &tx,
                OP,
                &NewEvent {
                    thought_id: id,
                    kind: KIND_CAPTURED,
                    at: now,
                    previous_state: None,
                    next_state: Some(State::Captured),
                    note: None,
                },
            )?;
            tx.commit().during(OP)?;
            Ok(id)
        })?;

        info!(thought_id = id, eligibility_at = %eligibility_at, "thought captured");
        Ok(id)
    }

    /// Append one audit row. Referential integrity is left to the database.
    pub fn append_event(
        &self,
        thought_id: i64,
        kind: &str,
        previous_state: Option<State>,
        next_state: Option<State>,
        note: Option<&str>,
    ) -> Result<i64, CoreError> {
        const OP: &str = "append_event";
        validate_id(OP, thought_id)?;
        if kind.trim().is_empty() {
            return Err(CoreError::validation(OP, "kind is empty"));
        }

        let at = self.clock.now();
        let event_id = self.with_conn(|conn| {
            insert_event(
                conn,
                OP,
                &NewEvent {
                    thought_id,
                    kind,
                    at,
                    previous_state,
                    next_state,
                    note,
                },
            )
        })?;

        debug!(thought_id, event_id, kind, "event appended");
        Ok(event_id)
    }

    /// The thought snapshot with its full history, oldest event first.
    pub fn get(&self, id: i64) -> Result<(Thought, Vec<Event>), CoreError> {
        const OP: &str = "get";
        validate_id(OP, id)?;

        let sql = format!("SELECT {THOUGHT_COLUMNS} FROM thoughts WHERE id = ?1");
        let found = self.with_conn(|conn| {
            let tx = conn.transaction().during(OP)?;
            let thought = query_thoughts(&tx, OP, &sql, params![id])?.into_iter().next();
            let found = match thought {
                Some(thought) => Some((thought, load_events(&tx, OP, id)?)),
                None => None,
            };
            tx.commit().during(OP)?;
            Ok(found)
        })?;

        let (thought, events) = found.ok_or_else(|| CoreError::thought_not_found(OP, id))?;
        debug!(thought_id = id, events = events.len(), "thought loaded");
        Ok((thought, events))
    }

    /// Like [`Store::get`], but only while the thought may be tended right now.
    pub fn get_eligible(&self, id: i64) -> Result<(Thought, Vec<Event>), CoreError> {
        const OP: &str = "get_eligible";
        validate_id(OP, id)?;

        let now = format_ts(self.clock.now());
        let sql = format!(
            "SELECT {THOUGHT_COLUMNS} FROM thoughts
             WHERE id = ?1 AND current_state IN (?2, ?3) AND eligibility_at <= ?4"
        );
        let found = self.with_conn(|conn| {
            let tx = conn.transaction().during(OP)?;
            let thought = query_thoughts(
                &tx,
                OP,
                &sql,
                params![id, State::Captured.as_str(), State::Resting.as_str(), now],
            )?
            .into_iter()
            .next();
            let found = match thought {
                Some(thought) => Some((thought, load_events(&tx, OP, id)?)),
                None => None,
            };
            tx.commit().during(OP)?;
            Ok(found)
        })?;

        found.ok_or_else(|| CoreError::NotFound {
            op: OP,
            what: format!("eligible thought {id}"),
        })
    }

    /// A page of all thoughts, least recently updated first.
    pub fn list(&self, limit: i64, offset: i64) -> Result<Vec<Thought>, CoreError> {
        const OP: &str = "list";
        validate_page(OP, limit, offset)?;

        let sql = format!(
            "SELECT {THOUGHT_COLUMNS} FROM thoughts
             ORDER BY updated_at ASC, id ASC
             LIMIT ?1 OFFSET ?2"
        );
        self.with_conn(|conn| query_thoughts(conn, OP, &sql, params![limit, offset]))
    }

    /// A page of thoughts eligible at `now`, soonest-eligible first.
    pub fn list_eligible(
        &self,
        limit: i64,
        offset: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Thought>, CoreError> {
        const OP: &str = "list_eligible";
        validate_page(OP, limit, offset)?;

        let sql = format!(
            "SELECT {THOUGHT_COLUMNS} FROM thoughts
             WHERE current_state IN (?1, ?2) AND eligibility_at <= ?3
             ORDER BY eligibility_at ASC, id ASC
             LIMIT ?4 OFFSET ?5"
        );
        self.with_conn(|conn| {
            query_thoughts(
                conn,
                OP,
                &sql,
                params![
                    State::Captured.as_str(),
                    State::Resting.as_str(),
                    format_ts(now),
                    limit,
                    offset
                ],
            )
        })
    }

    /// A page of thoughts currently in `state`, by id.
    pub fn list_by_state(
        &self,
        limit: i64,
        offset: i64,
        state: State,
    ) -> Result<Vec<Thought>, CoreError> {
        const OP: &str = "list_by_state";
        validate_page(OP, limit, offset)?;

        let sql = format!(
            "SELECT {THOUGHT_COLUMNS} FROM thoughts
             WHERE current_state = ?1
             ORDER BY id ASC
             LIMIT ?2 OFFSET ?3"
        );
        self.with_conn(|conn| query_thoughts(conn, OP, &sql, params![state.as_str(), limit, offset]))
    }

    /// Number of thoughts per state; every state is present.
    pub fn state_counts(&self) -> Result<BTreeMap<State, u64>, CoreError> {
        const OP: &str = "state_counts";
        let mut counts: BTreeMap<State, u64> = State::ALL.into_iter().map(|s| (s, 0)).collect();

        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT current_state, COUNT(*) FROM thoughts GROUP BY current_state")
                .during(OP)?;
            let mut rows = stmt.query([]).during(OP)?;
            while let Some(row) = rows.next().during(OP)? {
                let raw: String = rows::get(row, 0, "thoughts", "current_state")?;
                let count: u64 = rows::get(row, 1, "thoughts", "current_state")?;
                let state = rows::parse_state(&raw, "thoughts", "current_state")?;
                counts.insert(state, count);
            }
            Ok(())
        })?;

        Ok(counts)
    }

    /// Replace the content of a non-terminal thought.
    pub fn update_content(&self, id: i64, content: &str) -> Result<(), CoreError> {
        const OP: &str = "update_content";
        validate_id(OP, id)?;
        validate_content(OP, content)?;

        let now = format_ts(self.clock.now());
        self.with_conn(|conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .during(OP)?;
            let state = read_state(&tx, OP, id)?;
            if state.is_terminal() {
                return Err(CoreError::InvalidTransition {
                    op: OP,
                    id,
                    reason: format!("content of a {state} thought can no longer change"),
                });
            }
            tx.execute(
                "UPDATE thoughts SET content = ?1, updated_at = ?2 WHERE id = ?3",
                params![content, now, id],
            )
            .during(OP)?;
            tx.commit().during(OP)
        })?;

        info!(thought_id = id, "thought content updated");
        Ok(())
    }

    /// Move a thought into `tended`, bump its counter, and log the transition.
    pub fn mark_tended(&self, id: i64, note: Option<&str>) -> Result<(), CoreError> {
        const OP: &str = "mark_tended";
        validate_id(OP, id)?;

        let note = clean_note(note);
        let now = self.clock.now();
        let (previous, tend_counter) = self.with_conn(|conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .during(OP)?;
            let previous = read_state(&tx, OP, id)?;
            if previous.is_terminal() {
                return Err(CoreError::InvalidTransition {
                    op: OP,
                    id,
                    reason: format!("thought is in terminal state ({previous})"),
                });
            }

            let ts = format_ts(now);
            tx.execute(
                "UPDATE thoughts
                 SET current_state = ?1,
                     tend_counter = tend_counter + 1,
                     last_tended_at = ?2,
                     updated_at = ?2
                 WHERE id = ?3",
                params![State::Tended.as_str(), ts, id],
            )
            .during(OP)?;
            insert_event(
                &tx,
                OP,
                &NewEvent {
                    thought_id: id,
                    kind: KIND_STATE_CHANGE,
                    at: now,
                    previous_state: Some(previous),
                    next_state: Some(State::Tended),
                    note,
                },
            )?;
            let tend_counter: u32 = tx
                .query_row(
                    "SELECT tend_counter FROM thoughts WHERE id = ?1",
                    [id],
                    |row| row.get(0),
                )
                .during(OP)?;
            tx.commit().during(OP)?;
            Ok((previous, tend_counter))
        })?;

        info!(
            thought_id = id,
            from = %previous,
            to = %State::Tended,
            tend_counter,
            "thought tended"
        );
        Ok(())
    }

    /// Resolve a tended thought into rest or one of the terminal states.
    pub fn resolve_post_tend(
        &self,
        id: i64,
        next: State,
        note: Option<&str>,
    ) -> Result<(), CoreError> {
        const OP: &str = "resolve_post_tend";
        validate_id(OP, id)?;
        if !next.is_post_tend_target() {
            return Err(CoreError::InvalidTransition {
                op: OP,
                id,
                reason: format!(
                    "{next} is not a resolution (expected resting, evolved, released or archived)"
                ),
            });
        }

        let note = clean_note(note);
        let now = self.clock.now();
        self.with_conn(|conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .during(OP)?;
            let previous = read_state(&tx, OP, id)?;
            if previous != State::Tended {
                return Err(CoreError::InvalidTransition {
                    op: OP,
                    id,
                    reason: format!("thought must be tended to resolve, currently {previous}"),
                });
            }

            let ts = format_ts(now);
            if next == State::Resting {
                let eligibility_at = format_ts(next_rest_boundary(now, self.settle));
                tx.execute(
                    "UPDATE thoughts
                     SET current_state = ?1, updated_at = ?2, eligibility_at = ?3
                     WHERE id = ?4",
                    params![next.as_str(), ts, eligibility_at, id],
                )
                .during(OP)?;
            } else {
                tx.execute(
                    "UPDATE thoughts SET current_state = ?1, updated_at = ?2 WHERE id = ?3",
                    params![next.as_str(), ts, id],
                )
                .during(OP)?;
            }
            insert_event(
                &tx,
                OP,
                &NewEvent {
                    thought_id: id,
                    kind: KIND_STATE_CHANGE,
                    at: now,
                    previous_state: Some(previous),
                    next_state: Some(next),
                    note,
                },
            )?;
            tx.commit().during(OP)
        })?;

        info!(thought_id = id, from = %State::Tended, to = %next, "thought resolved");
        Ok(())
    }
}

fn validate_id(op: &'static str, id: i64) -> Result<(), CoreError> {
    if id <= 0 {
        return Err(CoreError::validation(op, format!("invalid thought id {id}")));
    }
    Ok(())
}

fn validate_content(op: &'static str, content: &str) -> Result<(), CoreError> {
    if content.trim().is_empty() {
        return Err(CoreError::validation(op, "content is empty"));
    }
    Ok(())
}

fn validate_page(op: &'static str, limit: i64, offset: i64) -> Result<(), CoreError> {
    if limit <= 0 {
        return Err(CoreError::validation(op, "limit must be > 0"));
    }
    if offset < 0 {
        return Err(CoreError::validation(op, "offset must be >= 0"));
    }
    Ok(())
}

/// Blank notes are not worth keeping. Anything else is stored as given.
fn clean_note(note: Option<&str>) -> Option<&str> {
    note.filter(|n| !n.trim().is_empty())
}

fn read_state(conn: &Connection, op: &'static str, id: i64) -> Result<State, CoreError> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT current_state FROM thoughts WHERE id = ?1",
            [id],
            |row| row.get(0),
        )
        .optional()
        .during(op)?;
    let raw = raw.ok_or_else(|| CoreError::thought_not_found(op, id))?;
    rows::parse_state(&raw, "thoughts", "current_state")
}

fn insert_thought(
    conn: &Connection,
    op: &'static str,
    content: &str,
    now: DateTime<Utc>,
    eligibility_at: DateTime<Utc>,
) -> Result<i64, CoreError> {
    conn.execute(
        "INSERT INTO thoughts (content, current_state, tend_counter, created_at, updated_at,
                               last_tended_at, eligibility_at, valence, energy)
         VALUES (?1, ?2, 0, ?3, ?3, NULL, ?4, NULL, NULL)",
        params![
            content,
            State::Captured.as_str(),
            format_ts(now),
            format_ts(eligibility_at)
        ],
    )
    .during(op)?;
    Ok(conn.last_insert_rowid())
}

fn insert_event(conn: &Connection, op: &'static str, event: &NewEvent<'_>) -> Result<i64, CoreError> {
    conn.execute(
        "INSERT INTO events (thought_id, kind, at, previous_state, next_state, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            event.thought_id,
            event.kind,
            format_ts(event.at),
            event.previous_state.map(|s| s.as_str()),
            event.next_state.map(|s| s.as_str()),
            event.note,
        ],
    )
    .during(op)?;
    Ok(conn.last_insert_rowid())
}

fn query_thoughts<P: Params>(
    conn: &Connection,
    op: &'static str,
    sql: &str,
    params: P,
) -> Result<Vec<Thought>, CoreError> {
    let mut stmt = conn.prepare(sql).during(op)?;
    let mut rows = stmt.query(params).during(op)?;
    let mut thoughts = Vec::new();
    while let Some(row) = rows.next().during(op)? {
        thoughts.push(rows::thought_from_row(row)?);
    }
    Ok(thoughts)
}

fn load_events(conn: &Connection, op: &'static str, thought_id: i64) -> Result<Vec<Event>, CoreError> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE thought_id = ?1 ORDER BY at ASC, id ASC"
    );
    let mut stmt = conn.prepare(&sql).during(op)?;
    let mut rows = stmt.query([thought_id]).during(op)?;
    let mut events = Vec::new();
    while let Some(row) = rows.next().during(op)? {
        events.push(rows::event_from_row(row)?);
    }
    Ok(events)
}
