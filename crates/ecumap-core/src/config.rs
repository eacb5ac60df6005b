//! Project configuration
//!
//! A JSON description of a calibration's sections, scales and tables, and
//! the code that turns it into a validated [`Project`].
//!
//! ```json
//! {
//!   "name": "stock",
//!   "sections": [
//!     { "name": "flash", "base_address": 32768, "length": 256,
//!       "endianness": "little", "image": "flash.bin",
//!       "cipher": { "kind": "xor_chain", "block_size": 16, "key": [1, 2] } }
//!   ],
//!   "scales": [
//!     { "name": "rpm", "format": "UWORD", "unit": "rpm",
//!       "transforms": [{ "op": "multiply", "coefficient": 0.1953125 }] }
//!   ],
//!   "tables": [
//!     { "name": "idle", "data": { "section": "flash", "offset": 32768, "scale": "rpm" } }
//!   ]
//! }
//! ```

use crate::crypto::CipherConfig;
use crate::format::{Endianness, NumericFormat};
use crate::memory::{AddressSpace, MemorySection, MemoryStore};
use crate::project::Project;
use crate::scale::{Scale, Transform, Unit};
use crate::series::Series;
use crate::table::Table;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Config version for migrations
    #[serde(default = "default_version")]
    pub version: String,

    /// Project display name
    pub name: String,

    /// Reject every write to the calibration
    #[serde(default)]
    pub read_only: bool,

    /// Memory sections, none overlapping
    #[serde(default)]
    pub sections: Vec<SectionConfig>,

    /// Named scales referenced by table series
    #[serde(default)]
    pub scales: Vec<ScaleConfig>,

    /// Tables over the sections above
    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// One memory section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionConfig {
    /// Unique section name
    pub name: String,

    /// First address of the section
    pub base_address: u64,

    /// Size in bytes
    pub length: u32,

    /// Defaults to big-endian
    #[serde(default)]
    pub endianness: Endianness,

    /// Reject writes to this section
    #[serde(default)]
    pub read_only: bool,

    /// Image file, relative to the config file; zero-filled when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<PathBuf>,

    /// Byte offset of this section's contents within the image file
    #[serde(default)]
    pub image_offset: u64,

    /// Encryption applied to the image contents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cipher: Option<CipherConfig>,
}

/// One named scale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaleConfig {
    /// Name tables refer to
    pub name: String,

    /// Raw encoding, `UBYTE`, `SBYTE`, `UWORD` or `SWORD`
    pub format: NumericFormat,

    /// Engineering unit
    #[serde(default)]
    pub unit: Unit,

    /// Forward pipeline, raw to engineering
    #[serde(default)]
    pub transforms: Vec<Transform>,
}

/// Placement of one series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesConfig {
    /// Defaults to the table name (data) or `<table>.x` / `<table>.y`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Name of the section holding the series
    pub section: String,

    /// Absolute address of element 0
    pub offset: u64,

    /// Element count; ignored for table data, which is derived from the axes
    #[serde(default)]
    pub length: u32,

    /// Scale name; the identity scale when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<String>,
}

/// One table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Unique table name
    pub name: String,

    /// Cell values
    pub data: SeriesConfig,

    /// Column axis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<SeriesConfig>,

    /// Row axis, only with an X axis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<SeriesConfig>,
}

impl ProjectConfig {
    /// Parse a configuration from JSON text
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        serde_json::from_str(content).context("Failed to parse project configuration")
    }

    /// Load a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Save the configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }
}

impl SectionConfig {
    fn build(&self, base_dir: &Path) -> anyhow::Result<MemorySection> {
        let store = match &self.image {
            Some(image) => {
                let path = base_dir.join(image);
                let bytes = fs::read(&path)
                    .with_context(|| format!("Failed to read image {}", path.display()))?;
                let range = usize::try_from(self.image_offset)
                    .ok()
                    .and_then(|start| Some(start..start.checked_add(self.length as usize)?));
                let Some(range) = range.filter(|r| r.end <= bytes.len()) else {
                    bail!(
                        "Image {} holds {} bytes, section '{}' needs {} bytes at offset {}",
                        path.display(),
                        bytes.len(),
                        self.name,
                        self.length,
                        self.image_offset
                    );
                };
                MemoryStore::from_bytes(bytes[range].to_vec())
            }
            None => MemoryStore::new(self.length as usize),
        };

        let section = match &self.cipher {
            Some(cipher) => MemorySection::encrypted(
                &self.name,
                self.base_address,
                self.length,
                self.endianness,
                store,
                cipher.build()?,
            )?,
            None => MemorySection::new(
                &self.name,
                self.base_address,
                self.length,
                self.endianness,
                store,
            )?,
        };
        Ok(section.read_only(self.read_only))
    }
}

impl ScaleConfig {
    fn build(&self) -> Scale {
        let mut scale = Scale::new(self.format, self.unit.clone()).with_name(&self.name);
        for transform in &self.transforms {
            scale.push(*transform);
        }
        scale
    }
}

impl SeriesConfig {
    fn build(
        &self,
        default_name: &str,
        space: &AddressSpace,
        scales: &HashMap<String, Scale>,
    ) -> anyhow::Result<Series> {
        let address = space.address(&self.section, self.offset)?;
        let scale = match &self.scale {
            Some(name) => scales
                .get(name)
                .cloned()
                .with_context(|| format!("Unknown scale '{name}'"))?,
            None => Scale::none(),
        };
        let name = self.name.clone().unwrap_or_else(|| default_name.to_string());
        Ok(Series::new(name, address, self.length, scale))
    }
}

impl Project {
    /// Build a project from a configuration
    ///
    /// Relative image paths are resolved against `base_dir`.
    pub fn from_config(config: &ProjectConfig, base_dir: &Path) -> anyhow::Result<Project> {
        let mut space = AddressSpace::new(&config.name);
        for section in &config.sections {
            let built = section
                .build(base_dir)
                .with_context(|| format!("Section '{}'", section.name))?;
            space.add_section(built)?;
        }
        space.set_read_only(config.read_only);

        let mut project = Project::new(&config.name, space);
        let mut scales = HashMap::new();
        for scale in &config.scales {
            if scales.contains_key(&scale.name) {
                bail!("Duplicate scale '{}'", scale.name);
            }
            let built = scale.build();
            project.register_scale(built.clone())?;
            scales.insert(scale.name.clone(), built);
        }

        for table in &config.tables {
            let built = build_table(table, &project, &scales)
                .with_context(|| format!("Table '{}'", table.name))?;
            project.add_table(built)?;
        }

        tracing::info!(
            "Loaded project '{}': {} sections, {} scales, {} tables",
            config.name,
            config.sections.len(),
            config.scales.len(),
            config.tables.len()
        );
        Ok(project)
    }

    /// Load a configuration file and build its project
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Project> {
        let path = path.as_ref();
        let config = ProjectConfig::load(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_config(&config, base_dir)
    }
}

fn build_table(
    config: &TableConfig,
    project: &Project,
    scales: &HashMap<String, Scale>,
) -> anyhow::Result<Table> {
    let space = project.space();
    let data = config.data.build(&config.name, space, scales)?;
    let mut builder = Table::builder(&config.name, data);
    if let Some(x) = &config.x {
        builder = builder.x_axis(x.build(&format!("{}.x", config.name), space, scales)?);
    }
    if let Some(y) = &config.y {
        builder = builder.y_axis(y.build(&format!("{}.y", config.name), space, scales)?);
    }
    Ok(builder.build(project.scales())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config() {
        let config = ProjectConfig::from_json(
            r#"{
                "name": "blank",
                "sections": [{ "name": "ram", "base_address": 0, "length": 16 }]
            }"#,
        )
        .unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.sections[0].endianness, Endianness::Big);

        let project = Project::from_config(&config, Path::new(".")).unwrap();
        assert_eq!(project.space().sections().count(), 1);
        assert_eq!(project.table_names().count(), 0);
    }

    #[test]
    fn test_bad_transform_rejected_at_load() {
        let result = ProjectConfig::from_json(
            r#"{
                "name": "bad",
                "scales": [{ "name": "s", "format": "UBYTE",
                             "transforms": [{ "op": "divide", "coefficient": 0 }] }]
            }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_image_offset_past_addressable_range() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("flash.bin"), vec![0u8; 64]).unwrap();
        let config = ProjectConfig::from_json(
            r#"{
                "name": "far",
                "sections": [{ "name": "flash", "base_address": 0, "length": 16,
                               "image": "flash.bin", "image_offset": 18446744073709551615 }]
            }"#,
        )
        .unwrap();
        let err = Project::from_config(&config, dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("flash"));
    }

    #[test]
    fn test_unknown_scale_reference() {
        let config = ProjectConfig::from_json(
            r#"{
                "name": "bad",
                "sections": [{ "name": "ram", "base_address": 0, "length": 16 }],
                "tables": [{ "name": "t", "data": { "section": "ram", "offset": 0, "scale": "nope" } }]
            }"#,
        )
        .unwrap();
        let err = Project::from_config(&config, Path::new(".")).unwrap_err();
        assert!(format!("{err:#}").contains("nope"));
    }
}
