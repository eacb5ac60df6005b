//! Table structure and flattened indexing

use crate::error::{CodecError, Result};
use crate::memory::AddressSpace;
use crate::scale::ScaleRegistry;
use crate::series::Series;
use serde::{Deserialize, Serialize};

/// Which axis of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Columns
    X,
    /// Rows
    Y,
}

/// Cell coordinates, matching the table's number of axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Coords {
    /// Single-cell table
    None,
    /// Column of a 1-axis table
    X(usize),
    /// Column and row of a 2-axis table
    XY(usize, usize),
}

/// A 0, 1 or 2 axis grid of scaled values
///
/// `data.length` always equals the product of the present axis lengths (1
/// with no axes). A Y axis is only allowed alongside an X axis. Data is
/// stored row-major by X: `index(x, y) = x + y * len(X)`. The cell count
/// must fit in a `u32`.
///
/// Tables are only built through [`TableBuilder`]; there is no
/// `Deserialize` impl.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    name: String,
    data: Series,
    x: Option<Series>,
    y: Option<Series>,
}

/// Validating constructor for [`Table`]
#[derive(Debug, Clone)]
pub struct TableBuilder {
    name: String,
    data: Series,
    x: Option<Series>,
    y: Option<Series>,
}

impl TableBuilder {
    /// Attach an X axis
    pub fn x_axis(mut self, series: Series) -> Self {
        self.x = Some(series);
        self
    }

    /// Attach a Y axis; the build fails without an X axis
    pub fn y_axis(mut self, series: Series) -> Self {
        self.y = Some(series);
        self
    }

    /// Build the table, checking axis structure and scale registration
    pub fn build(self, registry: &ScaleRegistry) -> Result<Table> {
        let mut table = Table {
            name: self.name,
            data: self.data,
            x: None,
            y: None,
        };
        if let Some(x) = self.x {
            table.set_x_axis(x)?;
        }
        if let Some(y) = self.y {
            table.set_y_axis(y)?;
        }
        let cells = table.cell_count(axis_len(&table.x), axis_len(&table.y))?;
        table.set_data_length(cells);
        table.validate(registry)?;
        Ok(table)
    }
}

impl Table {
    /// Start building a table around its data series
    pub fn builder(name: impl Into<String>, data: Series) -> TableBuilder {
        TableBuilder {
            name: name.into(),
            data,
            x: None,
            y: None,
        }
    }

    /// Table name, unique within a project
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the table
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Data series holding the cells
    pub fn data(&self) -> &Series {
        &self.data
    }

    /// Column axis, if any
    pub fn x_axis(&self) -> Option<&Series> {
        self.x.as_ref()
    }

    /// Row axis, if any
    pub fn y_axis(&self) -> Option<&Series> {
        self.y.as_ref()
    }

    /// Axis series by [`Axis`]
    pub fn axis(&self, axis: Axis) -> Option<&Series> {
        match axis {
            Axis::X => self.x.as_ref(),
            Axis::Y => self.y.as_ref(),
        }
    }

    /// Number of present axes (0, 1 or 2)
    pub fn arity(&self) -> usize {
        self.x.is_some() as usize + self.y.is_some() as usize
    }

    /// Columns (X length, 1 without an X axis)
    pub fn width(&self) -> usize {
        self.x.as_ref().map_or(1, |s| s.length() as usize)
    }

    /// Rows (Y length, 1 without a Y axis)
    pub fn height(&self) -> usize {
        self.y.as_ref().map_or(1, |s| s.length() as usize)
    }

    /// Data length for a `width` x `height` grid
    fn cell_count(&self, width: u32, height: u32) -> Result<u32> {
        width.checked_mul(height).ok_or_else(|| {
            CodecError::out_of_range(format!(
                "table '{}' with {width}x{height} cells exceeds {} cells",
                self.name,
                u32::MAX
            ))
        })
    }

    fn set_data_length(&mut self, cells: u32) {
        if self.data.length() != cells {
            tracing::debug!(
                "Table '{}' data length {} -> {}",
                self.name,
                self.data.length(),
                cells
            );
        }
        self.data.set_length(cells);
    }

    fn check_axis(series: &Series) -> Result<()> {
        if series.length() == 0 {
            return Err(CodecError::invalid(format!(
                "axis '{}' must have at least one element",
                series.name()
            )));
        }
        Ok(())
    }

    /// Add or replace the X axis
    pub fn set_x_axis(&mut self, series: Series) -> Result<()> {
        Self::check_axis(&series)?;
        let cells = self.cell_count(series.length(), axis_len(&self.y))?;
        self.x = Some(series);
        self.set_data_length(cells);
        Ok(())
    }

    /// Add or replace the Y axis; requires an X axis
    pub fn set_y_axis(&mut self, series: Series) -> Result<()> {
        if self.x.is_none() {
            return Err(CodecError::invalid(format!(
                "table '{}' cannot have a Y axis without an X axis",
                self.name
            )));
        }
        Self::check_axis(&series)?;
        let cells = self.cell_count(axis_len(&self.x), series.length())?;
        self.y = Some(series);
        self.set_data_length(cells);
        Ok(())
    }

    /// Remove the X axis; fails while a Y axis is present
    pub fn remove_x_axis(&mut self) -> Result<Option<Series>> {
        if self.y.is_some() {
            return Err(CodecError::invalid(format!(
                "remove the Y axis of table '{}' before its X axis",
                self.name
            )));
        }
        let removed = self.x.take();
        self.set_data_length(1);
        Ok(removed)
    }

    /// Remove the Y axis, leaving a 1-axis table
    pub fn remove_y_axis(&mut self) -> Option<Series> {
        let removed = self.y.take();
        self.set_data_length(axis_len(&self.x));
        removed
    }

    /// Change the length of an existing axis
    pub fn resize_axis(&mut self, axis: Axis, length: u32) -> Result<()> {
        if length == 0 {
            return Err(CodecError::invalid("axis length must be at least 1"));
        }
        if self.axis(axis).is_none() {
            return Err(CodecError::invalid(format!(
                "table '{}' has no {axis:?} axis",
                self.name
            )));
        }
        let (cells, series) = match axis {
            Axis::X => (self.cell_count(length, axis_len(&self.y))?, &mut self.x),
            Axis::Y => (self.cell_count(axis_len(&self.x), length)?, &mut self.y),
        };
        if let Some(series) = series {
            series.set_length(length);
        }
        self.set_data_length(cells);
        Ok(())
    }

    /// Check the axis structure and that every scale is registered
    pub fn validate(&self, registry: &ScaleRegistry) -> Result<()> {
        if self.y.is_some() && self.x.is_none() {
            return Err(CodecError::invalid(format!(
                "table '{}' has a Y axis without an X axis",
                self.name
            )));
        }
        for series in self.series() {
            registry.ensure_registered(series.scale())?;
        }
        Ok(())
    }

    /// Data series followed by the present axes
    pub fn series(&self) -> impl Iterator<Item = &Series> {
        std::iter::once(&self.data)
            .chain(self.x.as_ref())
            .chain(self.y.as_ref())
    }

    pub(crate) fn series_mut(&mut self) -> impl Iterator<Item = &mut Series> {
        std::iter::once(&mut self.data)
            .chain(self.x.as_mut())
            .chain(self.y.as_mut())
    }

    /// Flattened data index of a cell
    pub fn index(&self, coords: Coords) -> Result<usize> {
        let (x, y) = match (coords, self.arity()) {
            (Coords::None, 0) => return Ok(0),
            (Coords::X(x), 1) => (x, 0),
            (Coords::XY(x, y), 2) => (x, y),
            _ => {
                return Err(CodecError::out_of_range(format!(
                    "coordinates {coords:?} do not fit {}-axis table '{}'",
                    self.arity(),
                    self.name
                )))
            }
        };
        if x >= self.width() || y >= self.height() {
            return Err(CodecError::out_of_range(format!(
                "cell {coords:?} outside table '{}' ({}x{})",
                self.name,
                self.width(),
                self.height()
            )));
        }
        Ok(x + y * self.width())
    }

    /// Read one cell
    pub fn get_cell(&self, space: &AddressSpace, coords: Coords) -> Result<f64> {
        self.data.get(space, self.index(coords)?)
    }

    /// Write a cell and return the value actually stored
    pub fn set_cell(&self, space: &AddressSpace, coords: Coords, value: f64) -> Result<f64> {
        self.data.set(space, self.index(coords)?, value)
    }

    /// Values of one axis
    pub fn axis_values(&self, space: &AddressSpace, axis: Axis) -> Result<Vec<f64>> {
        match self.axis(axis) {
            Some(series) => series.get_all(space),
            None => Ok(Vec::new()),
        }
    }

    /// Data values of row `y` (the whole table for fewer than two axes)
    pub fn row(&self, space: &AddressSpace, y: usize) -> Result<Vec<f64>> {
        if y >= self.height() {
            return Err(CodecError::out_of_range(format!(
                "row {y} outside table '{}' with {} rows",
                self.name,
                self.height()
            )));
        }
        self.data.get_range(space, y * self.width(), self.width())
    }

    /// Data values of column `x`
    pub fn column(&self, space: &AddressSpace, x: usize) -> Result<Vec<f64>> {
        if x >= self.width() {
            return Err(CodecError::out_of_range(format!(
                "column {x} outside table '{}' with {} columns",
                self.name,
                self.width()
            )));
        }
        (0..self.height())
            .map(|y| self.data.get(space, x + y * self.width()))
            .collect()
    }

    /// Commit a working copy into this table
    pub fn apply(&mut self, working: &Table) {
        self.clone_from(working);
    }
}

fn axis_len(series: &Option<Series>) -> u32 {
    series.as_ref().map_or(1, Series::length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{Endianness, NumericFormat};
    use crate::memory::{MemorySection, MemoryStore};
    use crate::scale::{Scale, Unit};

    fn fixture() -> (AddressSpace, ScaleRegistry, Scale) {
        let mut space = AddressSpace::new("test");
        space
            .add_section(
                MemorySection::new("cal", 0, 256, Endianness::Big, MemoryStore::new(256)).unwrap(),
            )
            .unwrap();
        let mut registry = ScaleRegistry::new();
        let scale = Scale::new(NumericFormat::UBYTE, Unit::Percent);
        registry.register(scale.clone()).unwrap();
        (space, registry, scale)
    }

    fn series(space: &AddressSpace, name: &str, offset: u64, length: u32, scale: &Scale) -> Series {
        Series::new(name, space.address("cal", offset).unwrap(), length, scale.clone())
    }

    #[test]
    fn test_indexing() {
        let (space, registry, scale) = fixture();

        let table = Table::builder("ve", series(&space, "ve", 0x40, 0, &scale))
            .x_axis(series(&space, "rpm", 0x00, 3, &scale))
            .y_axis(series(&space, "load", 0x10, 4, &scale))
            .build(&registry)
            .unwrap();
        assert_eq!(table.data().length(), 12);
        assert_eq!(table.index(Coords::XY(2, 3)).unwrap(), 11);
        assert!(table.index(Coords::XY(3, 0)).is_err());
        assert!(table.index(Coords::X(1)).is_err());

        let curve = Table::builder("warmup", series(&space, "wue", 0x80, 0, &scale))
            .x_axis(series(&space, "clt", 0x20, 5, &scale))
            .build(&registry)
            .unwrap();
        assert_eq!(curve.index(Coords::X(3)).unwrap(), 3);

        let scalar = Table::builder("req_fuel", series(&space, "req", 0x90, 0, &scale))
            .build(&registry)
            .unwrap();
        assert_eq!(scalar.index(Coords::None).unwrap(), 0);
        assert_eq!(scalar.data().length(), 1);
    }

    #[test]
    fn test_y_requires_x() {
        let (space, registry, scale) = fixture();
        let result = Table::builder("bad", series(&space, "d", 0x40, 0, &scale))
            .y_axis(series(&space, "load", 0x10, 4, &scale))
            .build(&registry);
        assert!(matches!(result, Err(CodecError::InvalidPipeline(_))));

        let mut table = Table::builder("t", series(&space, "d", 0x40, 0, &scale))
            .build(&registry)
            .unwrap();
        assert!(table.set_y_axis(series(&space, "load", 0x10, 4, &scale)).is_err());

        table.set_x_axis(series(&space, "rpm", 0x00, 3, &scale)).unwrap();
        assert_eq!(table.data().length(), 3);
        table.set_y_axis(series(&space, "load", 0x10, 4, &scale)).unwrap();
        assert_eq!(table.data().length(), 12);

        assert!(table.remove_x_axis().is_err());
        table.remove_y_axis();
        assert_eq!(table.data().length(), 3);
        table.resize_axis(Axis::X, 8).unwrap();
        assert_eq!(table.data().length(), 8);
        assert!(table.resize_axis(Axis::Y, 2).is_err());
    }

    #[test]
    fn test_cell_count_limit() {
        let (space, registry, scale) = fixture();
        let mut table = Table::builder("big", series(&space, "d", 0x40, 0, &scale))
            .x_axis(series(&space, "rpm", 0x00, 3, &scale))
            .y_axis(series(&space, "load", 0x10, 2, &scale))
            .build(&registry)
            .unwrap();

        table.resize_axis(Axis::X, 65536).unwrap();
        assert_eq!(table.data().length(), 131072);

        let before = table.clone();
        assert!(matches!(
            table.resize_axis(Axis::Y, 65536),
            Err(CodecError::OutOfRange(_))
        ));
        assert_eq!(table, before);

        assert!(matches!(
            table.set_y_axis(series(&space, "wide", 0x10, 65536, &scale)),
            Err(CodecError::OutOfRange(_))
        ));
        assert_eq!(table, before);
        assert_eq!(table.height(), 2);

        // Fits exactly: 65536 x 65535 < 2^32
        table.resize_axis(Axis::Y, 65535).unwrap();
        assert_eq!(table.data().length(), 65536 * 65535);
    }

    #[test]
    fn test_serializes_structure() {
        let (space, registry, scale) = fixture();
        let table = Table::builder("warmup", series(&space, "wue", 0x80, 0, &scale))
            .x_axis(series(&space, "clt", 0x20, 5, &scale))
            .build(&registry)
            .unwrap();
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["name"], "warmup");
        assert_eq!(json["data"]["length"], 5);
        assert!(json["y"].is_null());
    }

    #[test]
    fn test_unregistered_scale_rejected() {
        let (space, registry, scale) = fixture();
        let stranger = scale.duplicate();
        let result = Table::builder("t", series(&space, "d", 0x40, 0, &scale))
            .x_axis(series(&space, "rpm", 0x00, 3, &stranger))
            .build(&registry);
        assert!(matches!(result, Err(CodecError::InvalidPipeline(_))));
    }

    #[test]
    fn test_cells_rows_columns() {
        let (space, registry, scale) = fixture();
        let table = Table::builder("ve", series(&space, "ve", 0x40, 0, &scale))
            .x_axis(series(&space, "rpm", 0x00, 3, &scale))
            .y_axis(series(&space, "load", 0x10, 2, &scale))
            .build(&registry)
            .unwrap();

        for y in 0..2 {
            for x in 0..3 {
                let v = (10 * y + x) as f64;
                assert_eq!(table.set_cell(&space, Coords::XY(x, y), v).unwrap(), v);
            }
        }

        assert_eq!(table.row(&space, 1).unwrap(), vec![10.0, 11.0, 12.0]);
        assert_eq!(table.column(&space, 2).unwrap(), vec![2.0, 12.0]);
        assert_eq!(table.get_cell(&space, Coords::XY(1, 1)).unwrap(), 11.0);
        // Row-major by X: cell (1, 1) is data element 4
        assert_eq!(table.data().get(&space, 4).unwrap(), 11.0);
    }
}
