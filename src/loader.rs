use crate::cell::{CellValue, column_index};
use crate::error::LoadError;
use crate::normalize::clean_number;
use crate::notice::Notices;
use calamine::{Data, Range, Reader, Xlsx, open_workbook};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One data row of the intermediate spreadsheet
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Record {
    /// Row label, whitespace-trimmed
    pub object: String,

    /// Base value in euros
    pub waarde: f64,
}

impl Record {
    pub fn new(object: impl Into<String>, waarde: f64) -> Self {
        Self {
            object: object.into(),
            waarde,
        }
    }
}

/// Ordered set of records loaded from the workbook
///
/// Objects are expected to be unique but this is not enforced.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RecordSet {
    records: Vec<Record>,
}

impl RecordSet {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[Record] {
        &self.records
    }

    /// Sum of all values
    pub fn total(&self) -> f64 {
        self.records.iter().map(|r| r.waarde).sum()
    }

    /// First record with this object label
    pub fn find(&self, object: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.object == object)
    }
}

impl FromIterator<Record> for RecordSet {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Where the records live in the workbook
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Sheet to read; the first sheet when not set
    pub sheet: Option<String>,

    /// Column holding the object label
    pub object_column: String,

    /// Column holding the value
    pub value_column: String,

    /// Rows to skip at the top of the sheet
    pub header_rows: u32,

    /// Rows to drop at the bottom (the totals row)
    pub trailing_rows: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            sheet: None,
            object_column: "A".to_string(),
            value_column: "B".to_string(),
            header_rows: 0,
            trailing_rows: 1,
        }
    }
}

/// Records together with the notices produced while loading them
///
/// This is what the server caches: the notices are shown again on every
/// render.
#[derive(Clone, Debug, Default)]
pub struct LoadedRecords {
    pub records: RecordSet,
    pub notices: Notices,
}

/// Build records from an in-memory sheet range
///
/// Positions are absolute, so a range that does not start at `A1` is read
/// correctly. Value cells go through [`clean_number`]; conversion problems are
/// written to `notices` and do not fail the load.
///
/// # Errors
/// * `InvalidColumn` if a configured column is not a column name
/// * `MissingColumn` if a configured column lies beyond the used range
pub fn records_from_range(
    range: &Range<Data>,
    config: &LoaderConfig,
    notices: &mut Notices,
) -> Result<RecordSet, LoadError> {
    let object_col = column_index(&config.object_column)
        .ok_or_else(|| LoadError::InvalidColumn(config.object_column.clone()))?;
    let value_col = column_index(&config.value_column)
        .ok_or_else(|| LoadError::InvalidColumn(config.value_column.clone()))?;

    let (row_end, available) = match range.end() {
        Some((row, col)) => (row + 1, col + 1),
        None => (0, 0),
    };

    for (name, col) in [
        (&config.object_column, object_col),
        (&config.value_column, value_col),
    ] {
        if col as u32 >= available {
            return Err(LoadError::MissingColumn {
                column: name.to_uppercase(),
                available,
            });
        }
    }

    let data_rows = row_end.saturating_sub(config.header_rows) as usize;
    let keep = data_rows.saturating_sub(config.trailing_rows);

    let records = (0..keep)
        .map(|offset| {
            let row = config.header_rows + offset as u32;
            let object = CellValue::from(range.get_value((row, object_col as u32)))
                .label()
                .trim()
                .to_string();
            let value = CellValue::from(range.get_value((row, value_col as u32)));
            Record {
                object,
                waarde: clean_number(&value, notices),
            }
        })
        .collect();

    Ok(records)
}

/// Load records from a workbook on disk
///
/// # Errors
/// * `NotFound` if the file does not exist
/// * `Open` if the file is not a readable xlsx workbook
/// * `NoSheets` / `MissingSheet` if the sheet cannot be found
/// * any error of [`records_from_range`]
pub fn try_load_records(
    path: impl AsRef<Path>,
    config: &LoaderConfig,
    notices: &mut Notices,
) -> Result<RecordSet, LoadError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let sheet_names = workbook.sheet_names();

    let sheet = match &config.sheet {
        Some(name) if sheet_names.iter().any(|s| s == name) => name.clone(),
        Some(name) => return Err(LoadError::MissingSheet(name.clone())),
        None => sheet_names.first().cloned().ok_or(LoadError::NoSheets)?,
    };

    let range = workbook.worksheet_range(&sheet)?;
    let records = records_from_range(&range, config, notices)?;

    log::info!(
        "Loaded {} records from sheet '{}' of {}",
        records.len(),
        sheet,
        path.display()
    );
    Ok(records)
}

/// Load records, degrading to an empty set on failure
///
/// The dashboard must stay renderable, so every failure becomes a notice.
pub fn load_records(path: impl AsRef<Path>, config: &LoaderConfig) -> LoadedRecords {
    let mut notices = Notices::new();

    let records = match try_load_records(path, config, &mut notices) {
        Ok(records) => records,
        Err(e @ LoadError::NotFound(_)) => {
            notices.error(e.to_string());
            RecordSet::default()
        }
        Err(e) => {
            notices.error(format!("Error loading data: {}", e));
            RecordSet::default()
        }
    };

    LoadedRecords { records, notices }
}
