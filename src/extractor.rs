use crate::cell::{CellValue, column_index};
use crate::error::ExtractError;
use calamine::{Data, Range, Reader, Xlsx, open_workbook};
use rust_xlsxwriter::Workbook;
use std::path::Path;

/// Which cells to copy and where to put them
#[derive(Clone, Debug)]
pub struct ExtractConfig {
    /// Sheet in the source workbook
    pub sheet: String,

    /// Column holding the labels in the source sheet
    pub label_column: String,

    /// Column holding the values in the source sheet
    pub value_column: String,

    /// First row to copy (1-based, inclusive)
    pub first_row: u32,

    /// Last row to copy (1-based, inclusive)
    pub last_row: u32,

    /// Name of the sheet in the output workbook
    pub output_sheet: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            sheet: "Onderhoud".to_string(),
            label_column: "D".to_string(),
            value_column: "E".to_string(),
            first_row: 4,
            last_row: 28,
            output_sheet: "Copied Data".to_string(),
        }
    }
}

impl ExtractConfig {
    fn columns(&self) -> Result<(u16, u16), ExtractError> {
        let label = column_index(&self.label_column)
            .ok_or_else(|| ExtractError::InvalidColumn(self.label_column.clone()))?;
        let value = column_index(&self.value_column)
            .ok_or_else(|| ExtractError::InvalidColumn(self.value_column.clone()))?;
        Ok((label, value))
    }

    fn check_window(&self) -> Result<(), ExtractError> {
        if self.first_row == 0 || self.first_row > self.last_row {
            return Err(ExtractError::InvalidWindow {
                first: self.first_row,
                last: self.last_row,
            });
        }
        Ok(())
    }
}

/// One copied row: the source row number and its two cells
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractedRow {
    pub source_row: u32,
    pub label: CellValue,
    pub value: CellValue,
}

/// Outcome of a successful extraction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractSummary {
    pub rows: usize,
}

/// Copy the configured window out of an in-memory sheet range
///
/// Cells are copied as they are; empty or missing cells stay empty.
pub fn extract_rows(
    range: &Range<Data>,
    config: &ExtractConfig,
) -> Result<Vec<ExtractedRow>, ExtractError> {
    config.check_window()?;
    let (label_col, value_col) = config.columns()?;

    let rows = (config.first_row..=config.last_row)
        .map(|row| {
            let label = CellValue::from(range.get_value((row - 1, label_col as u32)));
            let value = CellValue::from(range.get_value((row - 1, value_col as u32)));
            log::info!("Reading row {}: {} - {}", row, label, value);
            ExtractedRow {
                source_row: row,
                label,
                value,
            }
        })
        .collect();

    Ok(rows)
}

/// Build the output workbook: labels in column A, values in column B
pub fn write_rows(rows: &[ExtractedRow], sheet_name: &str) -> Result<Workbook, ExtractError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (r, row) in rows.iter().enumerate() {
        for (col, cell) in [(0u16, &row.label), (1u16, &row.value)] {
            let r = r as u32;
            match cell {
                CellValue::Empty => {}
                CellValue::Int(i) => {
                    worksheet.write_number(r, col, *i as f64)?;
                }
                CellValue::Float(v) => {
                    worksheet.write_number(r, col, *v)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(r, col, *b)?;
                }
                CellValue::Text(s) | CellValue::Other(s) => {
                    worksheet.write_string(r, col, s)?;
                }
            }
        }
    }

    Ok(workbook)
}

/// Copy the label/value window of `source` into a fresh workbook at `destination`
///
/// Any existing file at `destination` is overwritten.
///
/// # Examples
/// ```no_run
/// use asset_dashboard::extractor::{ExtractConfig, extract};
///
/// let summary = extract(
///     "Integrale kosten Wegen v04.0 LIVE.xlsx",
///     "copied_values.xlsx",
///     &ExtractConfig::default(),
/// )?;
/// println!("copied {} rows", summary.rows);
/// # Ok::<(), asset_dashboard::error::ExtractError>(())
/// ```
pub fn extract(
    source: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    config: &ExtractConfig,
) -> Result<ExtractSummary, ExtractError> {
    let source = source.as_ref();
    let destination = destination.as_ref();

    let mut workbook: Xlsx<_> = open_workbook(source).map_err(|e| ExtractError::Open {
        path: source.to_path_buf(),
        source: e,
    })?;

    if !workbook.sheet_names().iter().any(|s| s == &config.sheet) {
        return Err(ExtractError::MissingSheet(config.sheet.clone()));
    }

    let range = workbook
        .worksheet_range(&config.sheet)
        .map_err(|e| ExtractError::Read {
            sheet: config.sheet.clone(),
            source: e,
        })?;

    let rows = extract_rows(&range, config)?;
    let mut output = write_rows(&rows, &config.output_sheet)?;
    output.save(destination)?;

    log::info!(
        "Data has been successfully copied to '{}'",
        destination.display()
    );

    Ok(ExtractSummary { rows: rows.len() })
}
