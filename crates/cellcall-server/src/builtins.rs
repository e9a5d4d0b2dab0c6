//! Built-in functions.
//!
//! Empty operands are skipped, since the add-in pads every call to a fixed
//! number of operands. Booleans count as 1 and 0. Text and arrays in a
//! scalar position are `#VALUE!`, and an error operand propagates.

use cellcall_protocol::{Array, CellError, Value};

use crate::registry::FunctionRegistry;

pub fn register_builtins(registry: &mut FunctionRegistry) {
    registry.register("ADD", sum);
    registry.register("SUM", sum);
    registry.register("SUB", sub);
    registry.register("MUL", mul);
    registry.register("DIV", div);
    registry.register("CONCAT", concat);
    registry.register("ECHO", echo);
    registry.register("TRANSPOSE", transpose);
    registry.register("ARGC", argc);
}

/// Every scalar operand, with arrays flattened row by row.
fn flatten(args: &[Value]) -> impl Iterator<Item = &Value> {
    args.iter().flat_map(|arg| match arg {
        Value::Array(arr) => arr.cells().iter(),
        scalar => std::slice::from_ref(scalar).iter(),
    })
}

/// Numeric reading of a scalar; `None` for empty.
fn number(value: &Value) -> Result<Option<f64>, CellError> {
    match value {
        Value::Number(n) => Ok(Some(*n)),
        Value::Boolean(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        Value::Empty => Ok(None),
        Value::Error(e) => Err(*e),
        Value::Text(_) | Value::Array(_) => Err(CellError::Value),
    }
}

fn operand(args: &[Value], index: usize) -> Result<f64, CellError> {
    let value = args.get(index).unwrap_or(&Value::Empty);
    Ok(number(value)?.unwrap_or(0.0))
}

fn finite(n: f64) -> Result<Value, CellError> {
    if n.is_finite() {
        Ok(Value::Number(n))
    } else {
        Err(CellError::Num)
    }
}

fn sum(args: &[Value]) -> Result<Value, CellError> {
    let mut total = 0.0;
    for value in flatten(args) {
        total += number(value)?.unwrap_or(0.0);
    }
    finite(total)
}

fn sub(args: &[Value]) -> Result<Value, CellError> {
    finite(operand(args, 0)? - operand(args, 1)?)
}

fn mul(args: &[Value]) -> Result<Value, CellError> {
    let mut product: Option<f64> = None;
    for value in flatten(args) {
        if let Some(n) = number(value)? {
            product = Some(product.unwrap_or(1.0) * n);
        }
    }
    finite(product.unwrap_or(0.0))
}

fn div(args: &[Value]) -> Result<Value, CellError> {
    let numerator = operand(args, 0)?;
    let divisor = operand(args, 1)?;
    if divisor == 0.0 {
        return Err(CellError::Div0);
    }
    finite(numerator / divisor)
}

fn concat(args: &[Value]) -> Result<Value, CellError> {
    let mut out = String::new();
    for value in flatten(args) {
        match value {
            Value::Text(s) => out.push_str(s),
            Value::Number(n) => out.push_str(&n.to_string()),
            Value::Boolean(true) => out.push_str("TRUE"),
            Value::Boolean(false) => out.push_str("FALSE"),
            Value::Empty => {}
            Value::Error(e) => return Err(*e),
            Value::Array(_) => return Err(CellError::Value),
        }
    }
    Ok(Value::Text(out))
}

fn echo(args: &[Value]) -> Result<Value, CellError> {
    Ok(args.first().cloned().unwrap_or_default())
}

fn transpose(args: &[Value]) -> Result<Value, CellError> {
    let arr = match args.first() {
        Some(Value::Array(arr)) => arr,
        Some(scalar) => return Ok(scalar.clone()),
        None => return Ok(Value::Empty),
    };

    let (rows, cols) = (arr.rows(), arr.cols());
    let mut cells = Vec::with_capacity(rows * cols);
    for c in 0..cols {
        for r in 0..rows {
            cells.push(arr.get(r, c).cloned().unwrap_or_default());
        }
    }
    Array::from_cells(cols, rows, cells)
        .map(Value::Array)
        .map_err(|_| CellError::Value)
}

fn argc(args: &[Value]) -> Result<Value, CellError> {
    let count = args.iter().filter(|v| !v.is_empty()).count();
    Ok(Value::Number(count as f64))
}
