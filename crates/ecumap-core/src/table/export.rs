//! Row/column text dump of a table
//!
//! The first row holds the X-axis values and the first column the Y-axis
//! values; every data cell comes from [`Table::get_cell`]. Delimiting and
//! quoting are left to [`to_delimited`] or the caller.

use super::model::{Axis, Coords, Table};
use crate::error::Result;
use crate::memory::AddressSpace;

fn format_value(value: f64, precision: usize) -> String {
    format!("{value:.precision$}")
}

/// Render a table as rows of formatted cells
///
/// - single cell: `[[cell]]`
/// - one axis: X values, then one row of data
/// - two axes: `["", x0, x1, ..]`, then `[y_j, cells of row j..]`
pub fn export_rows(space: &AddressSpace, table: &Table, precision: usize) -> Result<Vec<Vec<String>>> {
    let fmt = |v: f64| format_value(v, precision);
    let x_values = table.axis_values(space, Axis::X)?;
    let y_values = table.axis_values(space, Axis::Y)?;

    let rows = match table.arity() {
        0 => vec![vec![fmt(table.get_cell(space, Coords::None)?)]],
        1 => {
            let header = x_values.iter().copied().map(fmt).collect();
            let cells = (0..table.width())
                .map(|x| table.get_cell(space, Coords::X(x)).map(fmt))
                .collect::<Result<Vec<_>>>()?;
            vec![header, cells]
        }
        _ => {
            let mut rows = Vec::with_capacity(table.height() + 1);
            let mut header = vec![String::new()];
            header.extend(x_values.iter().copied().map(fmt));
            rows.push(header);

            for (y, y_value) in y_values.iter().enumerate() {
                let mut row = vec![fmt(*y_value)];
                for x in 0..table.width() {
                    row.push(fmt(table.get_cell(space, Coords::XY(x, y))?));
                }
                rows.push(row);
            }
            rows
        }
    };
    Ok(rows)
}

/// Join exported rows with a delimiter, one line per row
pub fn to_delimited(rows: &[Vec<String>], delimiter: &str) -> String {
    let mut out = String::new();
    for row in rows {
        out.push_str(&row.join(delimiter));
        out.push('\n');
    }
    out
}
