//! Project container
//!
//! A [`Project`] owns one calibration ([`AddressSpace`]), the registry of
//! scales it knows about and its tables. Edits are staged on working copies
//! ([`Project::working_table`], a cloned [`Scale`]) and committed with the
//! `apply_*` methods.

use crate::error::{CodecError, Result};
use crate::memory::AddressSpace;
use crate::scale::{Scale, ScaleId, ScaleRegistry};
use crate::series::Series;
use crate::table::{export_rows, Coords, Table};
use std::collections::BTreeMap;

/// A calibration together with its scales and tables
#[derive(Debug)]
pub struct Project {
    name: String,
    space: AddressSpace,
    scales: ScaleRegistry,
    tables: BTreeMap<String, Table>,
}

impl Project {
    /// Project over `space` with no scales or tables
    pub fn new(name: impl Into<String>, space: AddressSpace) -> Self {
        Self {
            name: name.into(),
            space,
            scales: ScaleRegistry::new(),
            tables: BTreeMap::new(),
        }
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Underlying memory
    pub fn space(&self) -> &AddressSpace {
        &self.space
    }

    /// Mutable underlying memory
    pub fn space_mut(&mut self) -> &mut AddressSpace {
        &mut self.space
    }

    /// Registered scales
    pub fn scales(&self) -> &ScaleRegistry {
        &self.scales
    }

    /// Register a scale for use by tables
    pub fn register_scale(&mut self, scale: Scale) -> Result<ScaleId> {
        self.scales.register(scale)
    }

    /// Check that a series' full byte range lies inside its section
    fn check_placement(&self, series: &Series) -> Result<()> {
        let address = series.address();
        self.space
            .section(address.section)?
            .check_range(address.offset, series.byte_len())
            .map(|_| ())
    }

    fn validate_table(&self, table: &Table) -> Result<()> {
        table.validate(&self.scales)?;
        for series in table.series() {
            self.check_placement(series)?;
        }
        Ok(())
    }

    /// Add a table after checking its scales and memory placement
    pub fn add_table(&mut self, table: Table) -> Result<()> {
        if self.tables.contains_key(table.name()) {
            return Err(CodecError::DuplicateName(format!("table '{}'", table.name())));
        }
        self.validate_table(&table)?;
        tracing::debug!(
            "Added {}-axis table '{}' to project '{}'",
            table.arity(),
            table.name(),
            self.name
        );
        self.tables.insert(table.name().to_string(), table);
        Ok(())
    }

    /// Table by name
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| CodecError::invalid(format!("unknown table '{name}'")))
    }

    /// Table names in sorted order
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Drop a table; its memory is untouched
    pub fn remove_table(&mut self, name: &str) -> Option<Table> {
        self.tables.remove(name)
    }

    /// Independent copy of a table for editing
    pub fn working_table(&self, name: &str) -> Result<Table> {
        self.table(name).cloned()
    }

    /// Commit an edited working copy over the table of the same name
    pub fn apply_table(&mut self, working: &Table) -> Result<()> {
        self.validate_table(working)?;
        let target = self
            .tables
            .get_mut(working.name())
            .ok_or_else(|| CodecError::invalid(format!("unknown table '{}'", working.name())))?;
        target.apply(working);
        tracing::debug!("Applied edit to table '{}'", working.name());
        Ok(())
    }

    /// Commit a scale edit to the registry and every series using that scale
    pub fn apply_scale(&mut self, working: &Scale) -> Result<()> {
        self.scales.apply(working)?;
        let mut updated = 0usize;
        for table in self.tables.values_mut() {
            for series in table.series_mut() {
                if series.scale().id() == working.id() {
                    series.scale_mut().apply(working);
                    updated += 1;
                }
            }
        }
        tracing::debug!("Scale {} now used by {} series", working.id(), updated);
        Ok(())
    }

    /// Read one cell of a named table
    pub fn get_cell(&self, table: &str, coords: Coords) -> Result<f64> {
        self.table(table)?.get_cell(&self.space, coords)
    }

    /// Write one cell of a named table and return the value stored
    pub fn set_cell(&self, table: &str, coords: Coords, value: f64) -> Result<f64> {
        self.table(table)?.set_cell(&self.space, coords, value)
    }

    /// Text rows of a table, see [`export_rows`]
    pub fn export_table(&self, name: &str, precision: usize) -> Result<Vec<Vec<String>>> {
        export_rows(&self.space, self.table(name)?, precision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{Endianness, NumericFormat};
    use crate::memory::{MemorySection, MemoryStore};
    use crate::scale::{Operation, Transform, Unit};

    fn project() -> (Project, Scale) {
        let mut space = AddressSpace::new("cal");
        space
            .add_section(
                MemorySection::new("flash", 0, 64, Endianness::Big, MemoryStore::new(64)).unwrap(),
            )
            .unwrap();
        let mut project = Project::new("test", space);
        let scale = Scale::new(NumericFormat::UBYTE, Unit::Celsius)
            .with_name("clt")
            .with(Transform::new(Operation::Subtract, 40.0).unwrap());
        project.register_scale(scale.clone()).unwrap();
        (project, scale)
    }

    fn curve(project: &Project, scale: &Scale, data_offset: u64) -> Table {
        let space = project.space();
        Table::builder(
            "warmup",
            Series::new("wue", space.address("flash", data_offset).unwrap(), 0, Scale::none()),
        )
        .x_axis(Series::new("clt", space.address("flash", 0).unwrap(), 4, scale.clone()))
        .build(project.scales())
        .unwrap()
    }

    #[test]
    fn test_add_and_edit_table() {
        let (mut project, scale) = project();
        let table = curve(&project, &scale, 0x10);
        project.add_table(table).unwrap();

        assert_eq!(project.set_cell("warmup", Coords::X(2), 120.0).unwrap(), 120.0);
        assert_eq!(project.get_cell("warmup", Coords::X(2)).unwrap(), 120.0);

        let mut working = project.working_table("warmup").unwrap();
        working.resize_axis(crate::table::Axis::X, 6).unwrap();
        assert_eq!(project.table("warmup").unwrap().data().length(), 4);

        project.apply_table(&working).unwrap();
        assert_eq!(project.table("warmup").unwrap().data().length(), 6);
    }

    #[test]
    fn test_table_outside_section_rejected() {
        let (mut project, scale) = project();
        // 4 data bytes starting at 62 would run past the 64 byte section
        let table = curve(&project, &scale, 62);
        assert!(matches!(
            project.add_table(table),
            Err(CodecError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_apply_scale_updates_series() {
        let (mut project, scale) = project();
        project.add_table(curve(&project, &scale, 0x10)).unwrap();
        project
            .space()
            .write(&project.space().address("flash", 0).unwrap(), &[100])
            .unwrap();
        let axis = project.table("warmup").unwrap().x_axis().unwrap().clone();
        assert_eq!(axis.get(project.space(), 0).unwrap(), 60.0);

        let mut working = scale.clone();
        working.clear();
        working.push(Transform::new(Operation::Subtract, 50.0).unwrap());
        project.apply_scale(&working).unwrap();

        let axis = project.table("warmup").unwrap().x_axis().unwrap();
        assert_eq!(axis.get(project.space(), 0).unwrap(), 50.0);
    }

    #[test]
    fn test_duplicate_table() {
        let (mut project, scale) = project();
        project.add_table(curve(&project, &scale, 0x10)).unwrap();
        let again = curve(&project, &scale, 0x20);
        assert!(matches!(
            project.add_table(again),
            Err(CodecError::DuplicateName(_))
        ));
    }
}
