use std::fmt;
use std::str::FromStr;

use chrono::Duration;

use crate::error::CoreError;

const DEFAULT_SETTLE_HOURS: i64 = 18;

/// Upper bound on a settle duration, roughly 100 years.
const MAX_SETTLE_DAYS: i64 = 36_500;

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Accepted unit suffixes in nanoseconds.
const UNITS: [(&str, i128); 10] = [
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("μs", 1_000),
    ("ms", 1_000_000),
    ("s", NANOS_PER_SEC),
    ("m", 60 * NANOS_PER_SEC),
    ("h", 3_600 * NANOS_PER_SEC),
    ("d", 86_400 * NANOS_PER_SEC),
    ("w", 604_800 * NANOS_PER_SEC),
];

/// Units used when rendering, largest first.
const DISPLAY_UNITS: [(&str, i128); 7] = [
    ("d", 86_400 * NANOS_PER_SEC),
    ("h", 3_600 * NANOS_PER_SEC),
    ("m", 60 * NANOS_PER_SEC),
    ("s", NANOS_PER_SEC),
    ("ms", 1_000_000),
    ("us", 1_000),
    ("ns", 1),
];

const UNIT_HELP: &str = "Use w, d, h, m, s, ms, us or ns.";

/// How long a captured or rested thought must lie dormant before it may be
/// tended again. Never negative, never more than 100 years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SettleDuration(Duration);

impl SettleDuration {
    pub fn new(duration: Duration) -> Result<Self, CoreError> {
        if duration < Duration::zero() {
            return Err(CoreError::Config(format!(
                "settle duration must not be negative, got {}s",
                duration.num_seconds()
            )));
        }
        if duration > Self::max().0 {
            return Err(CoreError::Config(format!(
                "settle duration must be at most {MAX_SETTLE_DAYS}d, got {}d",
                duration.num_days()
            )));
        }
        Ok(Self(duration))
    }

    pub fn hours(hours: i64) -> Result<Self, CoreError> {
        Duration::try_hours(hours)
            .ok_or_else(|| CoreError::Config(format!("{hours}h is out of range")))
            .and_then(Self::new)
    }

    /// The longest settle duration accepted.
    pub fn max() -> Self {
        Self(Duration::days(MAX_SETTLE_DAYS))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    /// Parse `value`, falling back to the default for empty or malformed input.
    pub fn parse_or_default(value: &str) -> Self {
        match value.trim() {
            "" => Self::default(),
            raw => match raw.parse() {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!("Ignoring settle duration '{raw}': {e}");
                    Self::default()
                }
            },
        }
    }

    fn total_nanos(&self) -> i128 {
        i128::from(self.0.num_seconds()) * NANOS_PER_SEC + i128::from(self.0.subsec_nanos())
    }
}

impl Default for SettleDuration {
    fn default() -> Self {
        Self(Duration::hours(DEFAULT_SETTLE_HOURS))
    }
}

impl From<SettleDuration> for Duration {
    fn from(value: SettleDuration) -> Self {
        value.0
    }
}

/// Accepts `0` or one or more `<number><unit>` groups, where the number may
/// carry a decimal fraction: `18h`, `1h30m`, `1.5h`, `2d`, `500ms`, `300ns`.
impl FromStr for SettleDuration {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CoreError::Config("Empty duration string".into()));
        }
        if s == "0" {
            return Ok(Self(Duration::zero()));
        }

        let out_of_range = || CoreError::Config(format!("Duration '{s}' is out of range"));
        let limit = Self::max().total_nanos();
        let mut total: i128 = 0;
        let mut rest = s;
        while !rest.is_empty() {
            let whole_len = rest.chars().take_while(char::is_ascii_digit).count();
            let (whole, tail) = rest.split_at(whole_len);
            let (frac, tail) = match tail.strip_prefix('.') {
                Some(after) => {
                    let frac_len = after.chars().take_while(char::is_ascii_digit).count();
                    after.split_at(frac_len)
                }
                None => ("", tail),
            };
            if whole.is_empty() && frac.is_empty() {
                return Err(CoreError::Config(format!(
                    "Invalid duration '{s}': expected a number before '{rest}'"
                )));
            }

            let unit_len = tail.chars().take_while(|c| c.is_alphabetic()).count();
            let unit_end = tail
                .char_indices()
                .nth(unit_len)
                .map_or(tail.len(), |(i, _)| i);
            let (unit, tail) = tail.split_at(unit_end);
            let size = match UNITS.iter().find(|(suffix, _)| *suffix == unit) {
                Some((_, size)) => *size,
                None if unit.is_empty() => {
                    return Err(CoreError::Config(format!(
                        "Missing unit in duration '{s}'. {UNIT_HELP}"
                    )))
                }
                None => {
                    return Err(CoreError::Config(format!(
                        "Unknown duration unit '{unit}'. {UNIT_HELP}"
                    )))
                }
            };

            let whole: i128 = if whole.is_empty() {
                0
            } else {
                whole.parse::<u64>().map_err(|_| out_of_range())?.into()
            };
            // Past 18 digits the fraction is below one nanosecond for every unit.
            let frac = &frac[..frac.len().min(18)];
            let frac_part = if frac.is_empty() {
                0
            } else {
                let digits: i128 = frac.parse::<u64>().map_err(|_| out_of_range())?.into();
                digits * size / 10_i128.pow(frac.len() as u32)
            };

            total += whole
                .checked_mul(size)
                .and_then(|n| n.checked_add(frac_part))
                .ok_or_else(out_of_range)?;
            if total > limit {
                return Err(CoreError::Config(format!(
                    "Duration '{s}' exceeds the maximum of {MAX_SETTLE_DAYS}d"
                )));
            }
            rest = tail;
        }

        let nanos = i64::try_from(total).map_err(|_| out_of_range())?;
        Self::new(Duration::nanoseconds(nanos))
    }
}

/// Compact canonical form: `18h`, `1h30m`, `2d4h`, `1s500ms`, `0s`.
impl fmt::Display for SettleDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut remaining = self.total_nanos();
        if remaining == 0 {
            return f.write_str("0s");
        }

        for (suffix, size) in DISPLAY_UNITS {
            let count = remaining / size;
            if count > 0 {
                write!(f, "{count}{suffix}")?;
                remaining -= count * size;
            }
        }
        Ok(())
    }
}
