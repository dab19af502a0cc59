//! Unicode code point intervals
//!
//! Fonts carry their glyphs as a list of inclusive code point intervals. The
//! driver walks the list looking for the interval that contains a code point,
//! so every list handed to it is sorted, non-overlapping and maximally
//! coalesced: `(a, b), (b + 1, c)` never appears, only `(a, c)`.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use thiserror::Error;

/// Errors raised while building or parsing intervals
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntervalError {
    #[error("interval {low:#X}..={high:#X} is descending")]
    Descending { low: u32, high: u32 },

    #[error("invalid interval '{0}': expected MIN,MAX")]
    Malformed(String),

    #[error("invalid code point '{0}'")]
    InvalidNumber(String),
}

/// Inclusive range of unicode code points, `low <= high`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CodePointInterval {
    pub low: u32,
    pub high: u32,
}

impl CodePointInterval {
    /// Create an interval, rejecting descending bounds
    pub fn new(low: u32, high: u32) -> Result<Self, IntervalError> {
        if low > high {
            return Err(IntervalError::Descending { low, high });
        }
        Ok(Self { low, high })
    }

    /// Interval holding a single code point
    pub const fn single(code_point: u32) -> Self {
        Self {
            low: code_point,
            high: code_point,
        }
    }

    /// Number of code points covered
    pub fn len(&self) -> u32 {
        self.high - self.low + 1
    }

    /// Intervals are never empty, `low <= high` always holds
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, code_point: u32) -> bool {
        (self.low..=self.high).contains(&code_point)
    }

    /// Iterate over every code point in the interval
    pub fn code_points(&self) -> RangeInclusive<u32> {
        self.low..=self.high
    }
}

impl fmt::Display for CodePointInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#X}..={:#X}", self.low, self.high)
    }
}

/// Parse `MIN,MAX`, each side decimal or `0x`/`0o`/`0b` prefixed
impl FromStr for CodePointInterval {
    type Err = IntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (low, high) = s
            .split_once(',')
            .ok_or_else(|| IntervalError::Malformed(s.to_string()))?;
        Self::new(parse_code_point(low)?, parse_code_point(high)?)
    }
}

fn parse_code_point(text: &str) -> Result<u32, IntervalError> {
    let text = text.trim();
    let lower = text.to_ascii_lowercase();
    let parsed = if let Some(hex) = lower.strip_prefix("0x") {
        u32::from_str_radix(hex, 16)
    } else if let Some(oct) = lower.strip_prefix("0o") {
        u32::from_str_radix(oct, 8)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        u32::from_str_radix(bin, 2)
    } else {
        lower.parse()
    };
    parsed.map_err(|_| IntervalError::InvalidNumber(text.to_string()))
}

/// Sort intervals and merge every overlapping or adjacent pair
pub fn coalesce<I>(intervals: I) -> Vec<CodePointInterval>
where
    I: IntoIterator<Item = CodePointInterval>,
{
    let mut sorted: Vec<CodePointInterval> = intervals.into_iter().collect();
    sorted.sort_unstable();

    let mut merged: Vec<CodePointInterval> = Vec::with_capacity(sorted.len());
    for interval in sorted {
        match merged.last_mut() {
            Some(last) if interval.low <= last.high.saturating_add(1) => {
                last.high = last.high.max(interval.high);
            }
            _ => merged.push(interval),
        }
    }
    merged
}

/// Build maximal runs from a list of code points
///
/// Input order and duplicates do not matter. A lone code point becomes a
/// degenerate interval `(a, a)`.
pub fn from_code_points<I>(code_points: I) -> Vec<CodePointInterval>
where
    I: IntoIterator<Item = u32>,
{
    coalesce(code_points.into_iter().map(CodePointInterval::single))
}

/// Check that a list is sorted, non-overlapping and has no mergeable neighbours
pub fn is_coalesced(intervals: &[CodePointInterval]) -> bool {
    intervals.iter().all(|i| i.low <= i.high)
        && intervals
            .windows(2)
            .all(|pair| pair[0].high.saturating_add(1) < pair[1].low)
}
