//! The host application's native cell operand.
//!
//! This mirrors the shape of the operands a spreadsheet host passes to and
//! accepts from add-in functions. Glue code on the host side builds these
//! from (and turns them back into) the host's own structures.

/// #NULL!
pub const XLERR_NULL: u16 = 0;
/// #DIV/0!
pub const XLERR_DIV0: u16 = 7;
/// #VALUE!
pub const XLERR_VALUE: u16 = 15;
/// #REF!
pub const XLERR_REF: u16 = 23;
/// #NAME?
pub const XLERR_NAME: u16 = 29;
/// #NUM!
pub const XLERR_NUM: u16 = 36;
/// #N/A
pub const XLERR_NA: u16 = 42;

/// Cell text returned when the compute server cannot be reached.
pub const CONNECT_FAILED: &str = " #Could not connect to server  ";

/// A host operand.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    /// Floating point number
    Num(f64),
    /// Integer (hosts use these for small whole numbers)
    Int(i32),
    /// String
    Str(String),
    /// Boolean
    Bool(bool),
    /// Error with the host's numeric error code
    Err(u16),
    /// Argument omitted by the caller
    Missing,
    /// Blank cell
    Nil,
    /// Range of values
    Multi(HostRange),
    /// Unresolved reference to a sheet area
    Ref(String),
}

impl HostValue {
    /// The host error value returned for connectivity failures.
    pub fn connect_failed() -> Self {
        HostValue::Str(CONNECT_FAILED.to_string())
    }

    pub fn is_connect_failed(&self) -> bool {
        matches!(self, HostValue::Str(s) if s == CONNECT_FAILED)
    }
}

/// A row-major block of host operands, as the host hands it over.
///
/// Nothing guarantees `cells.len() == rows * cols`; the converter checks.
#[derive(Debug, Clone, PartialEq)]
pub struct HostRange {
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<HostValue>,
}

impl HostRange {
    pub fn new(rows: usize, cols: usize, cells: Vec<HostValue>) -> Self {
        Self { rows, cols, cells }
    }

    /// Build a range from rows; the column count is taken from the first row.
    pub fn from_rows(rows: Vec<Vec<HostValue>>) -> Self {
        let cols = rows.first().map_or(0, Vec::len);
        let row_count = rows.len();
        Self {
            rows: row_count,
            cols,
            cells: rows.into_iter().flatten().collect(),
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&HostValue> {
        if row < self.rows && col < self.cols {
            self.cells.get(row * self.cols + col)
        } else {
            None
        }
    }
}
