use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use peony_core::{eligible_to_surface, Event, State, Thought};

use super::OutputFormat;

/// Overview width for the full list; the tend list is narrower.
pub const LIST_OVERVIEW: usize = 80;
pub const TEND_OVERVIEW: usize = 60;

pub fn format_thought_list(
    thoughts: &[Thought],
    page: i64,
    overview: usize,
    empty: &str,
    fmt: OutputFormat,
) -> String {
    match fmt {
        OutputFormat::Json => serde_json::to_string_pretty(thoughts).unwrap_or_default(),
        OutputFormat::Text => format_thought_list_text(thoughts, page, overview, empty),
    }
}

fn format_thought_list_text(thoughts: &[Thought], page: i64, overview: usize, empty: &str) -> String {
    if thoughts.is_empty() {
        return empty.to_string();
    }

    let mut out = format!("Page {page}\n");
    out.push_str(&format!(
        "{:<6} {:<10} {:<5} {:<20} {}\n",
        "ID", "STATE", "TEND", "UPDATED", "OVERVIEW"
    ));
    for th in thoughts {
        out.push_str(&format!(
            "{:<6} {:<10} {:<5} {:<20} {}\n",
            th.id,
            th.current_state.as_str(),
            th.tend_counter,
            th.updated_at.format("%Y-%m-%d %H:%M").to_string(),
            th.overview(overview)
        ));
    }
    out
}

pub fn format_thought_full(
    thought: &Thought,
    events: &[Event],
    now: DateTime<Utc>,
    fmt: OutputFormat,
) -> String {
    match fmt {
        OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
            "thought": thought,
            "eligible": eligible_to_surface(thought, now),
            "events": events,
        }))
        .unwrap_or_default(),
        OutputFormat::Text => format_thought_full_text(thought, events, now),
    }
}

fn format_thought_full_text(th: &Thought, events: &[Event], now: DateTime<Utc>) -> String {
    let mut out = format!(
        "#{}  {}  (tends: {})\n",
        th.id, th.current_state, th.tend_counter
    );

    match th.current_state {
        State::Captured | State::Resting => match th.eligibility_at {
            _ if eligible_to_surface(th, now) => out.push_str("Eligible: yes\n"),
            Some(at) => out.push_str(&format!(
                "Eligible: {} (at {})\n",
                format_relative(at, now),
                format_short_utc(at)
            )),
            None => out.push_str("Eligible: never\n"),
        },
        State::Tended => out.push_str("Needs resolution: rest/evolve/release/archive\n"),
        State::Evolved | State::Released | State::Archived => {
            out.push_str(&format!("Terminal: {}\n", th.current_state))
        }
    }

    out.push_str("\nCONTENT\n");
    out.push_str(&th.content);
    out.push('\n');

    out.push_str("\nMETA\n");
    out.push_str(&meta_line("Created:", th.created_at, now));
    out.push_str(&meta_line("Updated:", th.updated_at, now));
    if let Some(at) = th.eligibility_at {
        out.push_str(&meta_line("Eligible:", at, now));
    }
    if let Some(at) = th.last_tended_at {
        out.push_str(&meta_line("Last tended:", at, now));
    }
    if let Some(v) = th.valence {
        out.push_str(&format!("Valence: {v}\n"));
    }
    if let Some(e) = th.energy {
        out.push_str(&format!("Energy: {e}\n"));
    }

    if !events.is_empty() {
        out.push_str("\nEVENTS\n");
        for ev in events {
            let label = ev.transition_label();
            let sep = if label.is_empty() { "" } else { " " };
            out.push_str(&format!(
                "- {}  {}{sep}{label}\n",
                format_short_utc(ev.at),
                ev.kind
            ));
            if let Some(note) = ev.note.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
                out.push_str(&format!("  note: {note}\n"));
            }
        }
    }

    out
}

fn meta_line(label: &str, at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    format!(
        "{label:<9} {} ({})\n",
        format_short_utc(at),
        format_relative(at, now)
    )
}

pub fn format_short_utc(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%MZ").to_string()
}

/// `"3h ago"`, `"in 2d"`, `"just now"`.
pub fn format_relative(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = at - now;
    if delta < Duration::zero() {
        let ago = -delta;
        if ago < Duration::minutes(1) {
            "just now".to_string()
        } else if ago < Duration::hours(1) {
            format!("{}m ago", ago.num_minutes())
        } else if ago < Duration::days(1) {
            format!("{}h ago", ago.num_hours())
        } else {
            format!("{}d ago", ago.num_days())
        }
    } else if delta < Duration::minutes(1) {
        "in <1m".to_string()
    } else if delta < Duration::hours(1) {
        format!("in {}m", delta.num_minutes())
    } else if delta < Duration::days(1) {
        format!("in {}h", delta.num_hours())
    } else {
        format!("in {}d", delta.num_days())
    }
}

pub fn format_state_counts(
    counts: &BTreeMap<State, u64>,
    schema_version: u32,
    fmt: OutputFormat,
) -> String {
    let total: u64 = counts.values().sum();
    match fmt {
        OutputFormat::Json => {
            let by_state: BTreeMap<&str, u64> =
                counts.iter().map(|(s, n)| (s.as_str(), *n)).collect();
            serde_json::to_string_pretty(&serde_json::json!({
                "total": total,
                "by_state": by_state,
                "schema_version": schema_version,
            }))
            .unwrap_or_default()
        }
        OutputFormat::Text => {
            let mut out = String::from("Peony Statistics\n================\n");
            out.push_str(&format!("Total thoughts: {total}\n\n"));
            out.push_str("By State:\n");
            for (state, count) in counts {
                out.push_str(&format!("  {:<10} {count}\n", state.as_str()));
            }
            out.push_str(&format!("\nSchema version: {schema_version}\n"));
            out
        }
    }
}
