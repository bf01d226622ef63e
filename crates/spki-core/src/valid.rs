//! Validity intervals.
//!
//! ```text
//! (valid (not-before "2014-01-01_00:00:00") (not-after "2014-12-31_00:00:00"))
//! ```
//!
//! Timestamps use the SPKI v0 layout, not RFC 3339. A missing bound is
//! unbounded in that direction.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use spki_sexp::Sexp;

use crate::error::{Result, SpkiError};
use crate::expr::{named_atom, tagged};

/// `YYYY-MM-DD_HH:MM:SS`, always UTC.
pub const V0_DATE_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Valid {
    pub not_before: Option<DateTime<Utc>>,
    pub not_after: Option<DateTime<Utc>>,
}

impl Valid {
    pub fn new(not_before: Option<DateTime<Utc>>, not_after: Option<DateTime<Utc>>) -> Self {
        Self {
            not_before,
            not_after,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.not_before.is_none() && self.not_after.is_none()
    }

    /// The overlap of two intervals.
    ///
    /// Returns `(false, Valid::default())` when the overlap is empty, i.e.
    /// when both resulting bounds exist and the lower one is strictly later.
    /// Touching intervals overlap in a single instant.
    pub fn intersect(&self, other: &Valid) -> (bool, Valid) {
        let lower = match (self.not_before, other.not_before) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        let upper = match (self.not_after, other.not_after) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        if let (Some(lower), Some(upper)) = (lower, upper) {
            if lower > upper {
                return (false, Valid::default());
            }
        }
        (true, Valid::new(lower, upper))
    }

    /// True if `instant` lies within the bounds, inclusive.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.not_before.map_or(true, |nb| nb <= instant)
            && self.not_after.map_or(true, |na| instant <= na)
    }

    /// `None` when both bounds are absent.
    pub fn encode(&self) -> Option<Sexp> {
        if self.is_unbounded() {
            return None;
        }
        let mut items = vec![Sexp::atom("valid")];
        if let Some(not_before) = self.not_before {
            items.push(bound("not-before", not_before));
        }
        if let Some(not_after) = self.not_after {
            items.push(bound("not-after", not_after));
        }
        Some(Sexp::list(items))
    }

    /// Decode `(valid [(not-before T)] [(not-after T)])`.
    pub fn decode(sexp: &Sexp) -> Result<Self> {
        let items = tagged(sexp, "valid")
            .filter(|items| (2..=3).contains(&items.len()))
            .ok_or_else(|| malformed("expected (valid [(not-before T)] [(not-after T)])"))?;

        let mut valid = Valid::default();
        let mut terms = items[1..].iter().peekable();
        if let Some(term) = terms.next_if(|term| term.is_list_of("not-before")) {
            valid.not_before = Some(decode_bound("not-before", term)?);
        }
        if let Some(term) = terms.next_if(|term| term.is_list_of("not-after")) {
            valid.not_after = Some(decode_bound("not-after", term)?);
        }
        if let Some(extra) = terms.next() {
            return Err(malformed(format!("unexpected term {}", extra)));
        }
        Ok(valid)
    }
}

pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.format(V0_DATE_FORMAT).to_string()
}

pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text, V0_DATE_FORMAT)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| malformed(format!("bad timestamp {:?}: {}", text, e)))
}

fn bound(name: &str, instant: DateTime<Utc>) -> Sexp {
    Sexp::list(vec![Sexp::atom(name), Sexp::atom(format_timestamp(instant))])
}

fn decode_bound(name: &str, sexp: &Sexp) -> Result<DateTime<Utc>> {
    let value = named_atom(name, sexp).map_err(malformed)?;
    let text = std::str::from_utf8(value).map_err(|_| malformed("timestamp must be text"))?;
    parse_timestamp(text)
}

fn malformed(reason: impl Into<String>) -> SpkiError {
    SpkiError::MalformedExpression(reason.into())
}
