//! Append-only per-iteration value histories.
//!
//! Purpose
//! -------
//! Provide the sequence type backing every iteration-indexed quantity in
//! the stack: per-station drift coefficients (a, b), per-correlation
//! instrumental-shift estimates, and measured apparent shifts. The type
//! distinguishes "never attempted" (the series is empty, or an index is
//! absent) from "attempted and unresolved" (a stored NaN), so the two
//! no-value meanings are never conflated.
//!
//! Key behaviors
//! -------------
//! - Values are appended once per completed stage and never removed.
//! - [`IterationSeries::latest`] is the explicit most-recent accessor.
//! - [`IterationSeries::value_at`] resolves an optional iteration index
//!   (`None` selects the latest entry).
//! - [`IterationSeries::overwrite`] replaces an existing entry in place;
//!   only outlier rejection uses it, to stamp a measurement as NaN.
//!
//! Conventions
//! -----------
//! - Indexing is 0-based; index `i` corresponds to iteration `i` of the
//!   owning run. Histories of different stations and correlations stay
//!   length-aligned through zero backfills in the solve stage.

/// Append-only history of one `f64` quantity across inversion iterations.
///
/// NaN entries are legal and mean "attempted, no value resolved"; an
/// empty series means the quantity was never computed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IterationSeries {
    values: Vec<f64>,
}

impl IterationSeries {
    /// An empty series (nothing attempted yet).
    pub fn new() -> Self {
        IterationSeries { values: Vec::new() }
    }

    /// Append the value for the next iteration.
    pub fn push(&mut self, value: f64) {
        self.values.push(value);
    }

    /// The most recent value, `None` while the series is empty.
    pub fn latest(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// The value at `iteration`, or the latest value when `iteration`
    /// is `None`. Out-of-range indices yield `None`.
    pub fn value_at(&self, iteration: Option<usize>) -> Option<f64> {
        match iteration {
            Some(i) => self.values.get(i).copied(),
            None => self.latest(),
        }
    }

    /// Replace the entry at `index` in place.
    ///
    /// Returns
    /// -------
    /// `true` when the index existed and was overwritten, `false` when
    /// the index is out of range (the series is left untouched).
    pub fn overwrite(&mut self, index: usize, value: f64) -> bool {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Number of completed iterations recorded.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over the recorded values, oldest first.
    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.values.iter()
    }

    /// The full trajectory as a slice, oldest first.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

impl From<Vec<f64>> for IterationSeries {
    fn from(values: Vec<f64>) -> Self {
        IterationSeries { values }
    }
}
