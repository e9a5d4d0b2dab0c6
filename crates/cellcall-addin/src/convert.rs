//! Conversion between host operands and wire [`Value`]s.
//!
//! Conversion never fails. Anything the value model cannot represent becomes
//! `#VALUE!`.

use cellcall_protocol::{Array, CellError, Value};
use serde::Deserialize;

use crate::host::{HostRange, HostValue, XLERR_NUM, XLERR_VALUE};

/// How arrays coming back from the server are handed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArrayPolicy {
    /// Always return a range, even for a single cell.
    KeepShape,
    /// Return a 1x1 array as its only element.
    #[default]
    FlattenSingleCell,
}

/// Bidirectional mapping between [`HostValue`] and [`Value`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Converter {
    array_policy: ArrayPolicy,
}

impl Converter {
    pub fn new(array_policy: ArrayPolicy) -> Self {
        Self { array_policy }
    }

    pub fn array_policy(&self) -> ArrayPolicy {
        self.array_policy
    }

    /// Convert a host operand into a value.
    pub fn to_value(&self, host: &HostValue) -> Value {
        match host {
            HostValue::Multi(range) => range_to_value(range),
            scalar => scalar_to_value(scalar),
        }
    }

    /// Convert a value into a host operand.
    pub fn to_host(&self, value: &Value) -> HostValue {
        match value {
            Value::Array(arr) => match (self.array_policy, arr.single()) {
                (ArrayPolicy::FlattenSingleCell, Some(only)) => scalar_to_host(only),
                _ => HostValue::Multi(HostRange::new(
                    arr.rows(),
                    arr.cols(),
                    arr.cells().iter().map(scalar_to_host).collect(),
                )),
            },
            scalar => scalar_to_host(scalar),
        }
    }
}

fn scalar_to_value(host: &HostValue) -> Value {
    match host {
        HostValue::Num(n) => Value::Number(*n),
        HostValue::Int(n) => Value::Number(*n as f64),
        HostValue::Str(s) => Value::Text(s.clone()),
        HostValue::Bool(b) => Value::Boolean(*b),
        HostValue::Err(code) => Value::Error(error_kind(*code)),
        HostValue::Missing | HostValue::Nil => Value::Empty,
        HostValue::Multi(_) | HostValue::Ref(_) => Value::Error(CellError::Value),
    }
}

fn range_to_value(range: &HostRange) -> Value {
    if range.rows.checked_mul(range.cols) != Some(range.cells.len()) {
        tracing::warn!(
            "Host range claims {}x{} but holds {} cells",
            range.rows,
            range.cols,
            range.cells.len()
        );
        return Value::Error(CellError::Value);
    }

    let cells = range.cells.iter().map(scalar_to_value).collect();
    match Array::from_cells(range.rows, range.cols, cells) {
        Ok(arr) => Value::Array(arr),
        Err(e) => {
            tracing::warn!("Host range not representable: {e}");
            Value::Error(CellError::Value)
        }
    }
}

fn scalar_to_host(value: &Value) -> HostValue {
    match value {
        Value::Number(n) if n.is_finite() => HostValue::Num(*n),
        // Hosts have no representation for NaN or infinities.
        Value::Number(_) => HostValue::Err(XLERR_NUM),
        Value::Text(s) => HostValue::Str(s.clone()),
        Value::Boolean(b) => HostValue::Bool(*b),
        Value::Error(e) => HostValue::Err(host_error_code(*e)),
        Value::Empty => HostValue::Nil,
        // Arrays never nest, so this arm only sees a top-level array
        // reached through a caller bug.
        Value::Array(_) => HostValue::Err(XLERR_VALUE),
    }
}

/// Map a host error code onto an error kind.
pub fn error_kind(code: u16) -> CellError {
    u8::try_from(code)
        .ok()
        .and_then(CellError::from_code)
        .filter(|kind| *kind != CellError::Unknown)
        .unwrap_or(CellError::Unknown)
}

/// Map an error kind onto a host error code.
pub fn host_error_code(kind: CellError) -> u16 {
    match kind {
        CellError::Unknown => XLERR_VALUE,
        known => u16::from(known.code()),
    }
}
