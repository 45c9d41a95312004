use calamine::Data;
use std::fmt;

/// Typed content of a single spreadsheet cell
///
/// This is the value as read from a workbook, before any normalization.
/// Dates, durations and Excel error values are kept as their text rendering
/// in `Other`, since nothing downstream interprets them.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum CellValue {
    /// Blank cell or a cell outside the used range
    #[default]
    Empty,

    /// Integer stored in the workbook
    Int(i64),

    /// Floating point number (Excel's native number type)
    Float(f64),

    /// Text
    Text(String),

    /// Boolean
    Bool(bool),

    /// Any other value, rendered as text
    Other(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Short name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            CellValue::Empty => "empty",
            CellValue::Int(_) => "int",
            CellValue::Float(_) => "float",
            CellValue::Text(_) => "text",
            CellValue::Bool(_) => "bool",
            CellValue::Other(_) => "other",
        }
    }

    /// Render the cell as a row label
    ///
    /// Empty cells become an empty label. Whole floats drop their fraction
    /// (`12.0` renders as `12`).
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Text(s) | CellValue::Other(s) => f.write_str(s),
            CellValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::Int(i) => CellValue::Int(*i),
            Data::Float(v) => CellValue::Float(*v),
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Bool(b) => CellValue::Bool(*b),
            other => CellValue::Other(other.to_string()),
        }
    }
}

impl From<Option<&Data>> for CellValue {
    fn from(data: Option<&Data>) -> Self {
        data.map(CellValue::from).unwrap_or_default()
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

/// Convert a column number to letters (0 = A, 25 = Z, 26 = AA)
pub fn column_letter(index: u16) -> String {
    let mut name = String::new();
    let mut n = index as u32 + 1;

    while n > 0 {
        n -= 1;
        name.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }

    name
}

/// Convert column letters to a zero-based column number
///
/// Lowercase letters are accepted. Returns `None` for anything that is not a
/// run of ASCII letters or that overflows Excel's column range.
pub fn column_index(letters: &str) -> Option<u16> {
    let letters = letters.trim();
    if letters.is_empty() {
        return None;
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        if col > 16_384 {
            return None;
        }
    }

    Some((col - 1) as u16)
}
