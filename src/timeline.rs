use crate::error::{EditError, TimelineError};
use crate::factors::TableState;
use crate::format::{format_euro, format_period};
use crate::loader::RecordSet;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};

/// Inclusive range of depreciation years
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub min: u32,
    pub max: u32,
}

impl Default for YearRange {
    fn default() -> Self {
        Self { min: 10, max: 50 }
    }
}

impl YearRange {
    pub fn sample<R: Rng>(&self, rng: &mut R) -> u32 {
        if self.max > self.min {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        }
    }

    pub fn clamp(&self, jaren: i64) -> u32 {
        jaren.clamp(self.min as i64, self.max as i64) as u32
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub seed: u64,
    pub years: YearRange,
    /// Right end of the x-axis in years
    pub axis_max: u32,
    /// Distance between x-axis ticks in years
    pub tick_step: u32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            seed: 44,
            years: YearRange::default(),
            axis_max: 55,
            tick_step: 5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub object: String,
    pub jaren: u32,
}

/// A single cell edit in the timeline grid
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineEdit {
    pub row: usize,
    pub jaren: i64,
}

/// Depreciation horizon per object, kept for the session
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimelineTable {
    entries: Vec<TimelineEntry>,
    state: TableState,
}

impl TimelineTable {
    pub fn seeded(records: &RecordSet, seed: u64, years: YearRange) -> Self {
        let mut rng = ChaCha12Rng::seed_from_u64(seed);
        let entries = records
            .iter()
            .map(|record| TimelineEntry {
                object: record.object.clone(),
                jaren: years.sample(&mut rng),
            })
            .collect();

        Self {
            entries,
            state: TableState::Seeded,
        }
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn state(&self) -> TableState {
        self.state
    }

    /// Apply a batch of grid edits, clamping each value into `years`
    ///
    /// The whole batch is rejected if any row is out of range.
    pub fn apply_edits(
        &mut self,
        edits: &[TimelineEdit],
        years: &YearRange,
    ) -> Result<usize, EditError> {
        if let Some(bad) = edits.iter().find(|e| e.row >= self.entries.len()) {
            return Err(EditError::RowOutOfRange {
                row: bad.row,
                len: self.entries.len(),
            });
        }

        let mut changed = 0;
        for edit in edits {
            let jaren = years.clamp(edit.jaren);
            let entry = &mut self.entries[edit.row];
            if entry.jaren != jaren {
                entry.jaren = jaren;
                changed += 1;
            }
        }

        if changed > 0 {
            self.state = TableState::Edited;
        }
        Ok(changed)
    }
}

/// One horizontal bar of the timeline chart
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimelineBar {
    pub object: String,
    pub jaren: u32,
    /// Text shown on the bar
    pub label: String,
    /// Text shown on hover
    pub hover: String,
    /// Bar length relative to the axis
    pub width_percent: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimelineAxis {
    pub min: u32,
    pub max: u32,
    pub ticks: Vec<TimelineTick>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimelineTick {
    pub value: u32,
    pub offset_percent: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimelineDetail {
    pub object: String,
    pub waarde: String,
    pub periode: String,
    pub start_jaar: i32,
    pub eind_jaar: i32,
}

/// Everything the page shows for the depreciation timeline
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimelineView {
    pub entries: Vec<TimelineEntry>,
    pub bars: Vec<TimelineBar>,
    pub axis: TimelineAxis,
    pub details: Vec<TimelineDetail>,
    pub state: TableState,
}

/// Project the timeline onto calendar years starting at `start_year`
///
/// # Errors
/// * `UnknownObject` when an entry names an object that has no record
pub fn project(
    table: &TimelineTable,
    records: &RecordSet,
    config: &TimelineConfig,
    start_year: i32,
) -> Result<TimelineView, TimelineError> {
    let axis_max = config.axis_max.max(1);

    let bars = table
        .entries()
        .iter()
        .map(|entry| TimelineBar {
            object: entry.object.clone(),
            jaren: entry.jaren,
            label: format_period(entry.jaren),
            hover: format!(
                "Object: {}\nAfwaardering: {} jaar\nVan: {}\nTot: {}",
                entry.object,
                entry.jaren,
                start_year,
                start_year + entry.jaren as i32
            ),
            width_percent: (entry.jaren as f64 / axis_max as f64 * 100.0).min(100.0),
        })
        .collect();

    let details = table
        .entries()
        .iter()
        .map(|entry| -> Result<TimelineDetail, TimelineError> {
            let record = records
                .find(&entry.object)
                .ok_or_else(|| TimelineError::UnknownObject(entry.object.clone()))?;
            Ok(TimelineDetail {
                object: entry.object.clone(),
                waarde: format_euro(record.waarde),
                periode: format_period(entry.jaren),
                start_jaar: start_year,
                eind_jaar: start_year + entry.jaren as i32,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let ticks = (0..=axis_max)
        .step_by(config.tick_step.max(1) as usize)
        .map(|value| TimelineTick {
            value,
            offset_percent: value as f64 / axis_max as f64 * 100.0,
        })
        .collect();

    Ok(TimelineView {
        entries: table.entries().to_vec(),
        bars,
        axis: TimelineAxis {
            min: 0,
            max: axis_max,
            ticks,
        },
        details,
        state: table.state(),
    })
}
