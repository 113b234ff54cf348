//! Rendering of second counts into compact unit breakdowns like `1d 5h`.

/// Recognized unit letters with their spans in seconds. A day is the 8 hour
/// workday, not 24 hours.
const UNIT_SPANS: &[(char, u64)] = &[('d', 8 * 3600), ('h', 3600), ('m', 60), ('s', 1)];

/// Formats a number of seconds using a configured subset of units.
///
/// The configuration string both selects the units and fixes the order they are
/// printed in. `"hd"` prints hours before days even though a day is larger; the
/// decomposition itself always happens largest unit first.
pub struct DurationFormat {
    /// Configured units sorted by span, largest first.
    units: Vec<ConfiguredUnit>,
    trim_zeros: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ConfiguredUnit {
    letter: char,
    span: u64,
    /// Position of the letter in the configuration string, used to restore the
    /// requested print order after splitting.
    config_index: usize,
}

impl DurationFormat {
    /// Builds a format from a string of unit letters. Letters outside of
    /// `d`, `h`, `m`, `s` are ignored.
    pub fn new(spec: &str, trim_zeros: bool) -> Self {
        let mut units: Vec<ConfiguredUnit> = spec
            .chars()
            .enumerate()
            .filter_map(|(config_index, letter)| {
                UNIT_SPANS
                    .iter()
                    .find(|(known, _)| *known == letter)
                    .map(|&(letter, span)| ConfiguredUnit {
                        letter,
                        span,
                        config_index,
                    })
            })
            .collect();
        units.sort_by(|a, b| b.span.cmp(&a.span));
        Self { units, trim_zeros }
    }

    /// Rounds up to the next multiple of the smallest configured unit. Exact
    /// multiples are left unchanged.
    fn round(&self, seconds: f64) -> u64 {
        let smallest = self.units.last().map(|unit| unit.span).unwrap_or(1);
        (seconds / smallest as f64).ceil() as u64 * smallest
    }

    /// Greedy decomposition into the configured units, largest first, remainder
    /// carried down. Values line up with `self.units`.
    fn split(&self, total: u64) -> Vec<u64> {
        let mut rest = total;
        self.units
            .iter()
            .map(|unit| {
                let value = rest / unit.span;
                rest %= unit.span;
                value
            })
            .collect()
    }

    /// Range of unit values that survive trimming: leading zeros go, and the
    /// last non-zero value truncates the tail.
    fn trimmed_range(&self, values: &[u64]) -> (usize, usize) {
        if !self.trim_zeros {
            return (0, values.len());
        }
        match values.iter().position(|v| *v != 0) {
            None => (0, 0),
            Some(first) => {
                let last = values.iter().rposition(|v| *v != 0).unwrap();
                (first, last + 1)
            }
        }
    }

    pub fn format(&self, seconds: f64) -> String {
        let values = self.split(self.round(seconds));
        let (start, end) = self.trimmed_range(&values);

        let mut parts: Vec<(&ConfiguredUnit, u64)> = self.units[start..end]
            .iter()
            .zip(values[start..end].iter().copied())
            .collect();
        parts.sort_by_key(|(unit, _)| unit.config_index);

        parts
            .iter()
            .map(|(unit, value)| format!("{value}{}", unit.letter))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
