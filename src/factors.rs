use crate::error::EditError;
use crate::loader::RecordSet;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Half-open interval `[low, high)` factors are drawn from
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FactorRange {
    pub low: f64,
    pub high: f64,
}

impl FactorRange {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Draw one factor; a degenerate range always yields `low`
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        if self.high > self.low {
            rng.gen_range(self.low..self.high)
        } else {
            self.low
        }
    }
}

/// Bounds and step of an editable number column
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NumberDomain {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for NumberDomain {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 2.0,
            step: 0.01,
        }
    }
}

impl NumberDomain {
    /// Clamp into `[min, max]` and round to the nearest step
    pub fn snap(&self, value: f64) -> f64 {
        let clamped = value.clamp(self.min, self.max);
        if self.step > 0.0 {
            let steps = ((clamped - self.min) / self.step).round();
            (self.min + steps * self.step).clamp(self.min, self.max)
        } else {
            clamped
        }
    }

    /// Whether two values show up as the same number in the grid
    pub fn same_step(&self, a: f64, b: f64) -> bool {
        (self.snap(a) - self.snap(b)).abs() < self.step.abs() / 2.0
    }
}

/// Lifecycle of a session table
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableState {
    /// Freshly generated from the seed
    Seeded,
    /// At least one cell was changed by the user
    Edited,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FactorEntry {
    pub object: String,
    pub factor: f64,
}

/// A single cell edit in the factor grid
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FactorEdit {
    pub row: usize,
    pub factor: f64,
}

/// Per-object multipliers of one dashboard section
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FactorTable {
    entries: Vec<FactorEntry>,
    state: TableState,
}

impl FactorTable {
    /// Draw one factor per record, in record order
    ///
    /// The same seed and records always give the same table, across
    /// platforms and releases of `rand`.
    pub fn seeded(records: &RecordSet, seed: u64, range: FactorRange) -> Self {
        let mut rng = ChaCha12Rng::seed_from_u64(seed);
        let entries = records
            .iter()
            .map(|record| FactorEntry {
                object: record.object.clone(),
                factor: range.sample(&mut rng),
            })
            .collect();

        Self {
            entries,
            state: TableState::Seeded,
        }
    }

    pub fn entries(&self) -> &[FactorEntry] {
        &self.entries
    }

    pub fn state(&self) -> TableState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Factor per object; for duplicated objects the last entry wins
    pub fn lookup(&self) -> HashMap<&str, f64> {
        self.entries
            .iter()
            .map(|e| (e.object.as_str(), e.factor))
            .collect()
    }

    /// Apply a batch of grid edits
    ///
    /// Values are clamped and snapped to `domain`. An edit that matches what
    /// the grid already shows keeps the stored value. The whole batch is
    /// rejected if any edit is invalid.
    ///
    /// Returns the number of changed cells.
    pub fn apply_edits(
        &mut self,
        edits: &[FactorEdit],
        domain: &NumberDomain,
    ) -> Result<usize, EditError> {
        for edit in edits {
            if edit.row >= self.entries.len() {
                return Err(EditError::RowOutOfRange {
                    row: edit.row,
                    len: self.entries.len(),
                });
            }
            if !edit.factor.is_finite() {
                return Err(EditError::NotANumber(edit.row));
            }
        }

        let mut changed = 0;
        for edit in edits {
            let entry = &mut self.entries[edit.row];
            if domain.same_step(entry.factor, edit.factor) {
                continue;
            }
            entry.factor = domain.snap(edit.factor);
            changed += 1;
        }

        if changed > 0 {
            self.state = TableState::Edited;
        }
        Ok(changed)
    }
}
