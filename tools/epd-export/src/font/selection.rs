//! Choosing which code points go into a font
//!
//! Either explicit intervals or a string of required characters. Both can be
//! extended with additional intervals. Whatever the input, the result is a
//! sorted, non-overlapping, maximally coalesced interval list.

use epd_common::{CodePointInterval, coalesce, from_code_points, is_coalesced};
use std::collections::BTreeSet;

use super::source::{FontStack, describe};
use crate::error::ExportError;

/// Intervals exported when nothing else is requested
pub const DEFAULT_INTERVALS: [CodePointInterval; 8] = [
    CodePointInterval { low: 32, high: 126 },
    CodePointInterval { low: 160, high: 255 },
    // punctuation
    CodePointInterval { low: 0x2010, high: 0x205F },
    // arrows
    CodePointInterval { low: 0x2190, high: 0x21FF },
    // technical symbols
    CodePointInterval { low: 0x2300, high: 0x23FF },
    // geometric shapes
    CodePointInterval { low: 0x25A0, high: 0x25FF },
    // misc symbols
    CodePointInterval { low: 0x2600, high: 0x26F0 },
    // dingbats
    CodePointInterval { low: 0x2700, high: 0x27BF },
];

/// Which fonts a string-mode character must be present in to be kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Validation {
    /// Only the first font of the stack is consulted
    #[default]
    Primary,
    /// Any font of the stack will do
    AnySource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionMode {
    /// Ascending, non-overlapping intervals
    Intervals(Vec<CodePointInterval>),
    /// Every character of the string, plus space
    Text {
        text: String,
        validation: Validation,
    },
}

/// The requested character set of a font
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub mode: SelectionMode,
    pub additional: Vec<CodePointInterval>,
}

impl Default for Selection {
    fn default() -> Self {
        Self::intervals(DEFAULT_INTERVALS.to_vec())
    }
}

impl Selection {
    pub fn intervals(intervals: Vec<CodePointInterval>) -> Self {
        Self {
            mode: SelectionMode::Intervals(intervals),
            additional: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>, validation: Validation) -> Self {
        Self {
            mode: SelectionMode::Text {
                text: text.into(),
                validation,
            },
            additional: Vec::new(),
        }
    }

    pub fn with_additional<I>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = CodePointInterval>,
    {
        self.additional.extend(extra);
        self
    }

    /// Turn the selection into the interval list to resolve
    ///
    /// String mode drops characters the stack cannot provide (per
    /// [`Validation`]) with a diagnostic.
    pub fn resolve(&self, stack: &FontStack) -> Result<Vec<CodePointInterval>, ExportError> {
        for interval in &self.additional {
            check_ascending(interval)?;
        }

        let base = match &self.mode {
            SelectionMode::Intervals(intervals) => {
                for interval in intervals {
                    check_ascending(interval)?;
                }
                if intervals.windows(2).any(|pair| pair[0].high >= pair[1].low) {
                    return Err(ExportError::invalid(
                        "intervals must be in ascending order and must not overlap",
                    ));
                }
                intervals.clone()
            }
            SelectionMode::Text { text, validation } => {
                from_code_points(validated_code_points(text, *validation, stack))
            }
        };

        let intervals = coalesce(base.into_iter().chain(self.additional.iter().copied()));
        debug_assert!(is_coalesced(&intervals));
        Ok(intervals)
    }
}

fn check_ascending(interval: &CodePointInterval) -> Result<(), ExportError> {
    CodePointInterval::new(interval.low, interval.high)?;
    Ok(())
}

/// Deduplicated, sorted code points of `text` (plus space) present in the stack
fn validated_code_points(text: &str, validation: Validation, stack: &FontStack) -> Vec<u32> {
    // space is easily forgotten, always include it
    let requested: BTreeSet<u32> = std::iter::once(' ')
        .chain(text.chars())
        .map(u32::from)
        .collect();

    requested
        .into_iter()
        .filter(|&code_point| {
            let available = match validation {
                Validation::Primary => stack.primary().has_glyph(code_point),
                Validation::AnySource => stack.contains(code_point),
            };
            if !available {
                let location = match validation {
                    Validation::Primary => stack.primary().name().to_string(),
                    Validation::AnySource => "any font of the stack".to_string(),
                };
                tracing::warn!("{} is not available in {}", describe(code_point), location);
            }
            available
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::testing::{MapSource, stack};

    fn iv(low: u32, high: u32) -> CodePointInterval {
        CodePointInterval::new(low, high).unwrap()
    }

    #[test]
    fn test_default_intervals_are_coalesced() {
        assert!(is_coalesced(&DEFAULT_INTERVALS));
    }

    #[test]
    fn test_text_mode_merges_adjacent() {
        let stack = stack(vec![MapSource::new("primary", &[' ', 'A', 'B'], 10)]);
        let selection = Selection::text("BA", Validation::Primary);
        assert_eq!(
            selection.resolve(&stack).unwrap(),
            vec![iv(32, 32), iv(65, 66)]
        );
    }

    #[test]
    fn test_text_mode_drops_space_absent_from_primary() {
        let stack = stack(vec![MapSource::new("primary", &['A', 'B'], 10)]);
        let selection = Selection::text(" AB", Validation::Primary);
        assert_eq!(selection.resolve(&stack).unwrap(), vec![iv(65, 66)]);
    }

    #[test]
    fn test_text_mode_validates_primary_only() {
        let stack = stack(vec![
            MapSource::new("primary", &[' ', 'A'], 10),
            MapSource::new("fallback", &['B'], 10),
        ]);
        let selection = Selection::text("AB", Validation::Primary);
        assert_eq!(
            selection.resolve(&stack).unwrap(),
            vec![iv(32, 32), iv(65, 65)]
        );
    }

    #[test]
    fn test_text_mode_validates_any_source() {
        let stack = stack(vec![
            MapSource::new("primary", &[' ', 'A'], 10),
            MapSource::new("fallback", &['B'], 10),
        ]);
        let selection = Selection::text("AB", Validation::AnySource);
        assert_eq!(
            selection.resolve(&stack).unwrap(),
            vec![iv(32, 32), iv(65, 66)]
        );
    }

    #[test]
    fn test_text_mode_dedups_and_sorts() {
        let stack = stack(vec![MapSource::new("primary", &[' ', 'a', 'b', 'c', 'x'], 10)]);
        let selection = Selection::text("xcbaabcx", Validation::Primary);
        assert_eq!(
            selection.resolve(&stack).unwrap(),
            vec![iv(32, 32), iv(0x61, 0x63), iv(0x78, 0x78)]
        );
    }

    #[test]
    fn test_additional_intervals_are_merged() {
        let stack = stack(vec![MapSource::new("primary", &['A'], 10)]);
        let selection =
            Selection::intervals(vec![iv(32, 126)]).with_additional([iv(127, 130), iv(100, 200)]);
        assert_eq!(selection.resolve(&stack).unwrap(), vec![iv(32, 200)]);
    }

    #[test]
    fn test_explicit_adjacent_intervals_are_merged() {
        let stack = stack(vec![MapSource::new("primary", &['A'], 10)]);
        let selection = Selection::intervals(vec![iv(32, 64), iv(65, 90)]);
        assert_eq!(selection.resolve(&stack).unwrap(), vec![iv(32, 90)]);
    }

    #[test]
    fn test_overlapping_explicit_intervals_rejected() {
        let stack = stack(vec![MapSource::new("primary", &['A'], 10)]);
        let selection = Selection::intervals(vec![iv(32, 100), iv(90, 120)]);
        assert!(matches!(
            selection.resolve(&stack),
            Err(ExportError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_descending_explicit_intervals_rejected() {
        let stack = stack(vec![MapSource::new("primary", &['A'], 10)]);
        let selection = Selection::intervals(vec![iv(200, 300), iv(32, 100)]);
        assert!(matches!(
            selection.resolve(&stack),
            Err(ExportError::InvalidArgument(_))
        ));

        let backwards = Selection::intervals(vec![CodePointInterval { low: 90, high: 65 }]);
        assert!(matches!(
            backwards.resolve(&stack),
            Err(ExportError::InvalidArgument(_))
        ));
    }
}
