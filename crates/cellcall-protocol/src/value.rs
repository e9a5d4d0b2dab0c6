//! Spreadsheet values exchanged with the compute server.

use std::fmt;

use crate::error::ValueError;

/// A single spreadsheet datum, or a rectangular grid of them.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Numeric value (all numbers are f64, including dates)
    Number(f64),

    /// Text value
    Text(String),

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// Error value (#VALUE!, #REF!, etc.)
    Error(CellError),

    /// Missing argument or blank cell
    #[default]
    Empty,

    /// Rectangular grid of scalar values
    Array(Array),
}

impl Value {
    /// Create a new text value
    pub fn text<S: Into<String>>(s: S) -> Self {
        Value::Text(s.into())
    }

    /// Build an array value from rows of scalars.
    pub fn array(rows: Vec<Vec<Value>>) -> Result<Self, ValueError> {
        Array::new(rows).map(Value::Array)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<CellError> {
        match self {
            Value::Error(e) => Some(*e),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get the type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Boolean(_) => "boolean",
            Value::Error(_) => "error",
            Value::Empty => "empty",
            Value::Array(_) => "array",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            // NaN is a legitimate payload and must survive a round trip under ==.
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Empty, Value::Empty) => true,
            (Value::Array(a), Value::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Value::Error(e) => write!(f, "{}", e),
            Value::Empty => write!(f, ""),
            Value::Array(a) => write!(f, "{}", a),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<CellError> for Value {
    fn from(e: CellError) -> Self {
        Value::Error(e)
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}

/// Spreadsheet error values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellError {
    /// #NULL! - Incorrect range operator
    Null,
    /// #DIV/0! - Division by zero
    Div0,
    /// #VALUE! - Wrong type of argument or operand
    Value,
    /// #REF! - Invalid cell reference
    Ref,
    /// #NAME? - Unrecognized formula name
    Name,
    /// #NUM! - Invalid numeric value
    Num,
    /// #N/A - Value not available
    Na,
    /// Any error the other side could not classify
    Unknown,
}

impl CellError {
    pub const ALL: [CellError; 8] = [
        CellError::Null,
        CellError::Div0,
        CellError::Value,
        CellError::Ref,
        CellError::Name,
        CellError::Num,
        CellError::Na,
        CellError::Unknown,
    ];

    /// Get the display string for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            CellError::Null => "#NULL!",
            CellError::Div0 => "#DIV/0!",
            CellError::Value => "#VALUE!",
            CellError::Ref => "#REF!",
            CellError::Name => "#NAME?",
            CellError::Num => "#NUM!",
            CellError::Na => "#N/A",
            CellError::Unknown => "#UNKNOWN!",
        }
    }

    /// Parse an error string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "#NULL!" => Some(CellError::Null),
            "#DIV/0!" => Some(CellError::Div0),
            "#VALUE!" => Some(CellError::Value),
            "#REF!" => Some(CellError::Ref),
            "#NAME?" => Some(CellError::Name),
            "#NUM!" => Some(CellError::Num),
            "#N/A" => Some(CellError::Na),
            "#UNKNOWN!" => Some(CellError::Unknown),
            _ => None,
        }
    }

    /// Get the one-byte error code used on the wire.
    ///
    /// Known kinds share the spreadsheet's native error numbering.
    pub fn code(&self) -> u8 {
        match self {
            CellError::Null => 0x00,
            CellError::Div0 => 0x07,
            CellError::Value => 0x0F,
            CellError::Ref => 0x17,
            CellError::Name => 0x1D,
            CellError::Num => 0x24,
            CellError::Na => 0x2A,
            CellError::Unknown => 0xFF,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        CellError::ALL.into_iter().find(|e| e.code() == code)
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A rectangular, row-major grid of scalar values.
///
/// Fields are private so that every `Array` in existence is rectangular and
/// one level deep.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    rows: usize,
    cols: usize,
    cells: Vec<Value>,
}

impl Array {
    /// Build an array from rows. Every row must have the same length and no
    /// element may itself be an array.
    pub fn new(rows: Vec<Vec<Value>>) -> Result<Self, ValueError> {
        let row_count = rows.len();
        let col_count = rows.first().map_or(0, Vec::len);
        let mut cells = Vec::with_capacity(row_count * col_count);

        for (r, row) in rows.into_iter().enumerate() {
            if row.len() != col_count {
                return Err(ValueError::Ragged {
                    row: r,
                    expected: col_count,
                    found: row.len(),
                });
            }
            cells.extend(row);
        }

        Self::from_cells(row_count, col_count, cells)
    }

    /// Build an array from row-major cells.
    pub fn from_cells(rows: usize, cols: usize, cells: Vec<Value>) -> Result<Self, ValueError> {
        for dim in [rows, cols] {
            if u32::try_from(dim).is_err() {
                return Err(ValueError::TooLarge(dim));
            }
        }
        if rows.checked_mul(cols) != Some(cells.len()) {
            return Err(ValueError::DimensionMismatch {
                rows,
                cols,
                cells: cells.len(),
            });
        }
        if let Some(i) = cells.iter().position(Value::is_array) {
            return Err(ValueError::NestedArray {
                row: i / cols,
                col: i % cols,
            });
        }

        Ok(Self { rows, cols, cells })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row-major view of all cells
    pub fn cells(&self) -> &[Value] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<Value> {
        self.cells
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        if row < self.rows && col < self.cols {
            self.cells.get(row * self.cols + col)
        } else {
            None
        }
    }

    /// Iterate over rows as slices
    pub fn iter_rows(&self) -> impl Iterator<Item = &[Value]> {
        // chunks(0) panics; an array with zero columns has no cells to yield
        self.cells.chunks(self.cols.max(1))
    }

    /// The only element of a 1x1 array.
    pub fn single(&self) -> Option<&Value> {
        if self.rows == 1 && self.cols == 1 {
            self.cells.first()
        } else {
            None
        }
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (r, row) in self.iter_rows().enumerate() {
            if r > 0 {
                write!(f, ";")?;
            }
            for (c, cell) in row.iter().enumerate() {
                if c > 0 {
                    write!(f, ",")?;
                }
                match cell {
                    Value::Text(s) => write!(f, "\"{}\"", s)?,
                    other => write!(f, "{}", other)?,
                }
            }
        }
        write!(f, "}}")
    }
}

/// Ordered positional arguments of a remote call.
///
/// The list is count-prefixed on the wire, so its length is bounded only by
/// the 16-bit count. Host-side arity limits live with the host glue.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentList(Vec<Value>);

impl ArgumentList {
    pub const MAX_LEN: usize = u16::MAX as usize;

    pub fn new(values: Vec<Value>) -> Result<Self, ValueError> {
        if values.len() > Self::MAX_LEN {
            return Err(ValueError::TooManyArguments(values.len()));
        }
        Ok(Self(values))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a ArgumentList {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
