use std::sync::Arc;

use bitvec::prelude::*;

use crate::column::{Column, ColumnData};
use crate::error::{Error, Result};
use crate::plan::{CmpOp, Scalar};

/// A boolean array of table-row length indicating which rows pass a filter.
pub type SelectionVector = BitVec;

/// Compares every cell of `col` against a literal, producing a selection
/// vector. NULL cells never select their row, whatever the operator.
///
/// Type rules: an Int column accepts Int (dedicated integer loop) and Double
/// (element-wise promotion to double) literals; a Double column accepts both
/// numeric literal kinds (Int promoted); a Text column accepts only Text.
/// Everything else, including Bool columns, is a runtime error. Numeric
/// promotion here mirrors the scalar interpreter exactly, so both filter
/// paths select the same rows.
///
/// # Errors
/// Returns a runtime error for a column/literal type combination with no
/// kernel.
pub fn compare_column(col: &Column, op: CmpOp, value: &Scalar) -> Result<SelectionVector> {
    match (&col.data, value) {
        (ColumnData::Int(values), Scalar::Int(target)) => {
            Ok(select_int(values, &col.null_bitmap, op, *target))
        }
        (ColumnData::Int(values), Scalar::Double(target)) => {
            Ok(select_int_as_double(values, &col.null_bitmap, op, *target))
        }
        (ColumnData::Double(values), Scalar::Double(target)) => {
            Ok(select_double(values, &col.null_bitmap, op, *target))
        }
        (ColumnData::Double(values), Scalar::Int(target)) => {
            Ok(select_double(values, &col.null_bitmap, op, *target as f64))
        }
        (ColumnData::Text(values), Scalar::Text(target)) => {
            Ok(select_text(values, &col.null_bitmap, op, target))
        }
        (ColumnData::Int(_) | ColumnData::Double(_), Scalar::Text(_)) => Err(Error::runtime(
            format!("Type mismatch: column {} requires a numeric value", col.name),
        )),
        (ColumnData::Text(_), _) => Err(Error::runtime(format!(
            "Type mismatch: column {} is text but value is not",
            col.name
        ))),
        (ColumnData::Bool(_), _) => Err(Error::runtime(format!(
            "Unsupported column type for vectorized filter: {}",
            col.name
        ))),
    }
}

/// Runs `pred` over every element, masking NULLs to `false`.
/// Monomorphized per call site so each kernel stays a tight loop.
fn select_by<T, F>(values: &[T], nulls: &BitSlice, pred: F) -> SelectionVector
where
    F: Fn(&T) -> bool,
{
    let mut selection = BitVec::with_capacity(values.len());
    for (idx, value) in values.iter().enumerate() {
        selection.push(!nulls[idx] && pred(value));
    }
    selection
}

fn select_int(values: &[i64], nulls: &BitSlice, op: CmpOp, target: i64) -> SelectionVector {
    match op {
        CmpOp::Eq => select_by(values, nulls, |v| *v == target),
        CmpOp::Neq => select_by(values, nulls, |v| *v != target),
        CmpOp::Lt => select_by(values, nulls, |v| *v < target),
        CmpOp::Gt => select_by(values, nulls, |v| *v > target),
        CmpOp::Lte => select_by(values, nulls, |v| *v <= target),
        CmpOp::Gte => select_by(values, nulls, |v| *v >= target),
    }
}

fn select_int_as_double(
    values: &[i64],
    nulls: &BitSlice,
    op: CmpOp,
    target: f64,
) -> SelectionVector {
    match op {
        CmpOp::Eq => select_by(values, nulls, |v| *v as f64 == target),
        CmpOp::Neq => select_by(values, nulls, |v| *v as f64 != target),
        CmpOp::Lt => select_by(values, nulls, |v| (*v as f64) < target),
        CmpOp::Gt => select_by(values, nulls, |v| *v as f64 > target),
        CmpOp::Lte => select_by(values, nulls, |v| *v as f64 <= target),
        CmpOp::Gte => select_by(values, nulls, |v| *v as f64 >= target),
    }
}

fn select_double(values: &[f64], nulls: &BitSlice, op: CmpOp, target: f64) -> SelectionVector {
    match op {
        CmpOp::Eq => select_by(values, nulls, |v| *v == target),
        CmpOp::Neq => select_by(values, nulls, |v| *v != target),
        CmpOp::Lt => select_by(values, nulls, |v| *v < target),
        CmpOp::Gt => select_by(values, nulls, |v| *v > target),
        CmpOp::Lte => select_by(values, nulls, |v| *v <= target),
        CmpOp::Gte => select_by(values, nulls, |v| *v >= target),
    }
}

fn select_text(values: &[Arc<str>], nulls: &BitSlice, op: CmpOp, target: &str) -> SelectionVector {
    // &str ordering is lexicographic byte order, same as the interpreter's
    match op {
        CmpOp::Eq => select_by(values, nulls, |v| v.as_ref() == target),
        CmpOp::Neq => select_by(values, nulls, |v| v.as_ref() != target),
        CmpOp::Lt => select_by(values, nulls, |v| v.as_ref() < target),
        CmpOp::Gt => select_by(values, nulls, |v| v.as_ref() > target),
        CmpOp::Lte => select_by(values, nulls, |v| v.as_ref() <= target),
        CmpOp::Gte => select_by(values, nulls, |v| v.as_ref() >= target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_type::DataType;
    use crate::value::Value;

    fn int_column(cells: &[Option<i64>]) -> Column {
        let mut col = Column::new("x".into(), DataType::Int);
        for cell in cells {
            let value = cell.map(Value::Int).unwrap_or(Value::Null);
            col.push(value).unwrap();
        }
        col
    }

    fn text_column(cells: &[&str]) -> Column {
        let mut col = Column::new("s".into(), DataType::Text);
        for cell in cells {
            col.push(Value::Text((*cell).into())).unwrap();
        }
        col
    }

    #[test]
    fn test_int_gt() {
        let col = int_column(&[Some(20), Some(35), Some(40)]);
        let sel = compare_column(&col, CmpOp::Gt, &Scalar::Int(30)).unwrap();

        assert_eq!(sel, bitvec![0, 1, 1]);
    }

    #[test]
    fn test_null_is_never_selected() {
        let col = int_column(&[None, Some(35)]);

        // even Neq must not select a NULL row
        let sel = compare_column(&col, CmpOp::Neq, &Scalar::Int(0)).unwrap();
        assert_eq!(sel, bitvec![0, 1]);

        let sel = compare_column(&col, CmpOp::Gt, &Scalar::Int(10)).unwrap();
        assert_eq!(sel, bitvec![0, 1]);
    }

    #[test]
    fn test_int_column_double_literal_promotes() {
        let col = int_column(&[Some(1), Some(2), Some(3)]);

        let sel = compare_column(&col, CmpOp::Gte, &Scalar::Double(2.0)).unwrap();
        assert_eq!(sel, bitvec![0, 1, 1]);

        let sel = compare_column(&col, CmpOp::Gt, &Scalar::Double(1.5)).unwrap();
        assert_eq!(sel, bitvec![0, 1, 1]);

        let sel = compare_column(&col, CmpOp::Eq, &Scalar::Double(2.0)).unwrap();
        assert_eq!(sel, bitvec![0, 1, 0]);
    }

    #[test]
    fn test_double_column_int_literal_promotes() {
        let mut col = Column::new("d".into(), DataType::Double);
        for v in [0.5, 2.0, 3.5] {
            col.push(Value::Double(v)).unwrap();
        }

        let sel = compare_column(&col, CmpOp::Lt, &Scalar::Int(2)).unwrap();
        assert_eq!(sel, bitvec![1, 0, 0]);

        let sel = compare_column(&col, CmpOp::Eq, &Scalar::Int(2)).unwrap();
        assert_eq!(sel, bitvec![0, 1, 0]);
    }

    #[test]
    fn test_text_lexicographic() {
        let col = text_column(&["apple", "banana", "cherry"]);

        let sel = compare_column(&col, CmpOp::Lt, &Scalar::Text("c".into())).unwrap();
        assert_eq!(sel, bitvec![1, 1, 0]);

        let sel = compare_column(&col, CmpOp::Eq, &Scalar::Text("banana".into())).unwrap();
        assert_eq!(sel, bitvec![0, 1, 0]);
    }

    #[test]
    fn test_type_mismatch_errors() {
        let ints = int_column(&[Some(1)]);
        assert!(compare_column(&ints, CmpOp::Eq, &Scalar::Text("1".into())).is_err());

        let texts = text_column(&["a"]);
        assert!(compare_column(&texts, CmpOp::Eq, &Scalar::Int(1)).is_err());
        assert!(compare_column(&texts, CmpOp::Eq, &Scalar::Double(1.0)).is_err());
    }

    #[test]
    fn test_bool_column_not_vectorizable() {
        let mut col = Column::new("flag".into(), DataType::Bool);
        col.push(Value::Bool(true)).unwrap();

        assert!(compare_column(&col, CmpOp::Eq, &Scalar::Int(1)).is_err());
    }

    #[test]
    fn test_empty_column_empty_selection() {
        let col = int_column(&[]);
        let sel = compare_column(&col, CmpOp::Gt, &Scalar::Int(0)).unwrap();

        assert!(sel.is_empty());
    }
}
