use std::fs;

use log::debug;

use crate::column::Column;
use crate::data_type::DataType;
use crate::error::{Error, Result};
use crate::table::Table;
use crate::value::Value;

/// Reads a CSV file into a typed [Table].
///
/// The first line is the header (names trimmed). Every non-empty following
/// line is a data row and must have the same number of fields as the header.
/// Empty cells are NULL. There is no quoting and no escaping.
///
/// Column types are inferred from the data: the first non-empty trimmed cell
/// of a column decides — a complete `i64` parse means Int, otherwise a
/// complete `f64` parse means Double, otherwise Text. A column with no
/// non-empty cell is Text. Bool columns are never inferred from text.
///
/// # Errors
/// Returns [Error::Io] for an unreadable file, a missing header, a row with
/// the wrong field count, or a cell that does not parse under the column's
/// inferred type.
pub fn read_csv(path: &str) -> Result<Table> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::io(format!("Cannot open file {path}: {e}")))?;

    let mut lines = content.lines();
    let header = lines
        .next()
        .ok_or_else(|| Error::io(format!("Empty CSV file: {path}")))?;
    let headers: Vec<String> = header.split(',').map(|h| h.trim().to_string()).collect();

    // Materialize all data rows before inference: a column's type may be
    // decided by a cell far below rows of NULLs.
    let mut rows: Vec<Vec<&str>> = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let cells: Vec<&str> = line.split(',').collect();
        if cells.len() != headers.len() {
            return Err(Error::io(format!(
                "Column count mismatch in {path} at row {}",
                rows.len() + 1
            )));
        }
        rows.push(cells);
    }

    let mut columns = Vec::with_capacity(headers.len());
    for (idx, name) in headers.iter().enumerate() {
        let sample = rows.iter().map(|row| row[idx].trim()).find(|c| !c.is_empty());
        let data_type = sample.map(infer_type).unwrap_or(DataType::Text);
        columns.push(Column::new(name.clone(), data_type));
    }

    let mut table = Table {
        columns,
        row_count: 0,
    };
    for (row_no, cells) in rows.iter().enumerate() {
        for (column, cell) in table.columns.iter_mut().zip(cells.iter().copied()) {
            let value = parse_cell(cell, column.data_type).ok_or_else(|| {
                Error::io(format!(
                    "Failed to parse value '{}' for column {} at row {}",
                    cell.trim(),
                    column.name,
                    row_no + 1
                ))
            })?;
            column.push(value)?;
        }
        table.row_count += 1;
    }

    debug!(
        "read {path:?}: {} columns, {} rows",
        table.columns.len(),
        table.row_count
    );
    Ok(table)
}

/// Writes a table to a CSV file: a header row of column names, then one
/// line per row. NULL cells are written as empty fields, booleans as
/// `true`/`false`, numbers in their natural decimal form.
///
/// # Errors
/// Returns [Error::Io] if the file cannot be written.
pub fn write_csv(path: &str, table: &Table) -> Result<()> {
    let mut out = String::new();

    let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
    out.push_str(&names.join(","));
    out.push('\n');

    for row_idx in 0..table.row_count {
        for (i, col) in table.columns.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            match col.get(row_idx).unwrap_or(Value::Null) {
                Value::Null => {}
                Value::Int(v) => out.push_str(&v.to_string()),
                Value::Double(v) => out.push_str(&v.to_string()),
                Value::Text(v) => out.push_str(&v),
                Value::Bool(v) => out.push_str(if v { "true" } else { "false" }),
            }
        }
        out.push('\n');
    }

    fs::write(path, out).map_err(|e| Error::io(format!("Cannot write file {path}: {e}")))
}

/// Decides a column type from its first non-empty cell.
fn infer_type(cell: &str) -> DataType {
    if cell.parse::<i64>().is_ok() {
        DataType::Int
    } else if cell.parse::<f64>().is_ok() {
        DataType::Double
    } else {
        DataType::Text
    }
}

/// Parses one trimmed cell under the column's type; an empty cell is NULL.
/// Returns `None` when the cell does not parse.
fn parse_cell(cell: &str, data_type: DataType) -> Option<Value> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Some(Value::Null);
    }
    match data_type {
        DataType::Int => trimmed.parse::<i64>().ok().map(Value::Int),
        DataType::Double => trimmed.parse::<f64>().ok().map(Value::Double),
        DataType::Text => Some(Value::Text(trimmed.into())),
        DataType::Bool => Some(Value::Bool(trimmed == "true" || trimmed == "1")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_str(content: &str) -> Result<Table> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(&path, content).unwrap();
        read_csv(&path.display().to_string())
    }

    #[test]
    fn test_type_inference() {
        let table = read_str("id,score,name\n1,2.5,Alice\n2,3.0,Bob\n").unwrap();

        assert_eq!(table.columns[0].data_type, DataType::Int);
        assert_eq!(table.columns[1].data_type, DataType::Double);
        assert_eq!(table.columns[2].data_type, DataType::Text);
        assert_eq!(table.row_count, 2);
        assert_eq!(table.columns[0].get(1), Some(Value::Int(2)));
        assert_eq!(table.columns[1].get(0), Some(Value::Double(2.5)));
        assert_eq!(table.columns[2].get(1), Some(Value::Text("Bob".into())));
    }

    #[test]
    fn test_empty_cells_are_null() {
        let table = read_str("name,age\nA,\nB,35\n").unwrap();

        assert_eq!(table.columns[1].data_type, DataType::Int);
        assert_eq!(table.columns[1].get(0), Some(Value::Null));
        assert_eq!(table.columns[1].get(1), Some(Value::Int(35)));
    }

    #[test]
    fn test_inference_skips_leading_nulls() {
        // the first non-empty cell is on the second data row
        let table = read_str("a,b\n,x\n5,y\n").unwrap();

        assert_eq!(table.columns[0].data_type, DataType::Int);
        assert_eq!(table.columns[0].get(0), Some(Value::Null));
        assert_eq!(table.columns[0].get(1), Some(Value::Int(5)));
    }

    #[test]
    fn test_all_empty_column_is_text() {
        let table = read_str("a,b\n,1\n,2\n").unwrap();

        assert_eq!(table.columns[0].data_type, DataType::Text);
        assert!(table.columns[0].get(0).unwrap().is_null());
    }

    #[test]
    fn test_header_only_file() {
        let table = read_str("a,b\n").unwrap();

        assert_eq!(table.row_count, 0);
        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.columns[0].data_type, DataType::Text);
    }

    #[test]
    fn test_header_names_are_trimmed() {
        let table = read_str(" a , b \n1,2\n").unwrap();

        assert_eq!(table.columns[0].name, "a");
        assert_eq!(table.columns[1].name, "b");
    }

    #[test]
    fn test_empty_lines_are_skipped() {
        let table = read_str("x\n1\n\n2\n\n").unwrap();

        assert_eq!(table.row_count, 2);
    }

    #[test]
    fn test_column_count_mismatch() {
        let err = read_str("a,b\n1,2\n3\n").unwrap_err();

        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("mismatch"));
    }

    #[test]
    fn test_unparseable_cell_under_inferred_type() {
        let err = read_str("x\n5\nabc\n").unwrap_err();

        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_missing_file() {
        let err = read_csv("definitely_not_here.csv").unwrap_err();

        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_empty_file() {
        let err = read_str("").unwrap_err();

        assert!(err.to_string().contains("Empty CSV"));
    }

    #[test]
    fn test_write_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let table = read_str("name,age\nA,\nB,35\n").unwrap();
        write_csv(&path.display().to_string(), &table).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "name,age\nA,\nB,35\n");
    }

    #[test]
    fn test_write_bool_column() {
        use crate::column::Column;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut flag = Column::new("flag".into(), DataType::Bool);
        flag.push(Value::Bool(true)).unwrap();
        flag.push(Value::Bool(false)).unwrap();
        flag.push(Value::Null).unwrap();
        write_csv(&path.display().to_string(), &Table::new(vec![flag])).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "flag\ntrue\nfalse\n\n");
    }

    #[test]
    fn test_write_double_natural_form() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let table = read_str("score\n2.5\n3.25\n").unwrap();
        write_csv(&path.display().to_string(), &table).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "score\n2.5\n3.25\n");
    }
}
