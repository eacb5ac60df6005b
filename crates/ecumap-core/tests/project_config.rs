//! Tests for loading projects from configuration files

use ecumap_core::config::ProjectConfig;
use ecumap_core::crypto::{Cipher, CipherConfig, XorChainCipher};
use ecumap_core::error::CodecError;
use ecumap_core::project::Project;
use ecumap_core::scale::{Operation, Transform};
use ecumap_core::table::Coords;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const KEY: [u8; 3] = [0x11, 0x22, 0x33];

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Plaintext calibration: coolant bins, idle targets and a rev limit
fn calibration() -> Vec<u8> {
    let mut plain = vec![0u8; 64];
    plain[0..4].copy_from_slice(&[80, 100, 120, 140]);
    plain[16..20].copy_from_slice(&[12, 10, 9, 8]);
    plain[32] = 65;
    plain
}

/// Write an encrypted image behind a 16 byte header
fn write_image(dir: &TempDir, name: &str) -> PathBuf {
    let mut body = calibration();
    XorChainCipher::new(16, KEY.to_vec())
        .unwrap()
        .encrypt(&mut body, 0, 64)
        .unwrap();
    let mut image = b"ECUMAP-IMAGE-V1\0".to_vec();
    image.extend(body);

    let path = dir.path().join(name);
    fs::write(&path, image).unwrap();
    path
}

fn config_json(read_only: bool) -> String {
    format!(
        r#"{{
            "name": "stock",
            "read_only": {read_only},
            "sections": [
                {{ "name": "flash", "base_address": 32768, "length": 64,
                   "endianness": "little", "image": "flash.bin", "image_offset": 16,
                   "cipher": {{ "kind": "xor_chain", "block_size": 16, "key": [17, 34, 51] }} }},
                {{ "name": "ram", "base_address": 65536, "length": 32 }}
            ],
            "scales": [
                {{ "name": "rpm", "format": "UBYTE", "unit": "rpm",
                   "transforms": [{{ "op": "multiply", "coefficient": 100 }}] }},
                {{ "name": "clt", "format": "UBYTE", "unit": "celsius",
                   "transforms": [{{ "op": "subtract", "coefficient": 40 }}] }}
            ],
            "tables": [
                {{ "name": "idle",
                   "data": {{ "section": "flash", "offset": 32784, "scale": "rpm" }},
                   "x": {{ "section": "flash", "offset": 32768, "length": 4, "scale": "clt" }} }},
                {{ "name": "rev_limit",
                   "data": {{ "section": "flash", "offset": 32800, "scale": "rpm" }} }}
            ]
        }}"#
    )
}

fn open_project(read_only: bool) -> (TempDir, Project) {
    init_logging();
    let dir = TempDir::new().unwrap();
    write_image(&dir, "flash.bin");
    let path = dir.path().join("project.json");
    fs::write(&path, config_json(read_only)).unwrap();
    let project = Project::open(&path).unwrap();
    (dir, project)
}

#[test]
fn test_open_encrypted_project() {
    let (_dir, project) = open_project(false);

    assert_eq!(project.name(), "stock");
    assert_eq!(project.space().sections().count(), 2);
    assert_eq!(project.table_names().collect::<Vec<_>>(), vec!["idle", "rev_limit"]);

    let idle = project.table("idle").unwrap();
    assert_eq!(idle.data().name(), "idle");
    assert_eq!(idle.x_axis().unwrap().name(), "idle.x");
    assert_eq!(idle.data().length(), 4);

    assert_eq!(project.get_cell("idle", Coords::X(0)).unwrap(), 1200.0);
    assert_eq!(project.get_cell("rev_limit", Coords::None).unwrap(), 6500.0);
}

#[test]
fn test_export_from_project() {
    let (_dir, project) = open_project(false);
    let rows = project.export_table("idle", 0).unwrap();
    assert_eq!(
        rows,
        vec![
            vec!["40", "60", "80", "100"],
            vec!["1200", "1000", "900", "800"],
        ]
    );
}

#[test]
fn test_edit_marks_dirty_and_keeps_neighbours() {
    let (_dir, project) = open_project(false);
    let flash = project.space().section_id("flash").unwrap();
    let before = project.space().checksum(flash).unwrap();

    assert_eq!(project.set_cell("idle", Coords::X(1), 1100.0).unwrap(), 1100.0);
    assert_eq!(
        project.export_table("idle", 0).unwrap()[1],
        vec!["1200", "1100", "900", "800"]
    );
    assert_eq!(project.get_cell("rev_limit", Coords::None).unwrap(), 6500.0);

    assert!(project.space().has_changes());
    assert_eq!(project.space().dirty_ranges(flash), vec![32785..32786]);
    assert_ne!(project.space().checksum(flash).unwrap(), before);
}

#[test]
fn test_read_only_project_rejects_writes() {
    let (_dir, project) = open_project(true);
    assert!(matches!(
        project.set_cell("idle", Coords::X(1), 1100.0),
        Err(CodecError::ReadOnlyViolation(_))
    ));
    assert_eq!(project.get_cell("idle", Coords::X(1)).unwrap(), 1000.0);
    assert!(!project.space().has_changes());
}

#[test]
fn test_scale_edit_from_config() {
    let (_dir, mut project) = open_project(false);
    let mut working = project.scales().get_by_name("clt").unwrap().clone();
    working.clear();
    working.push(Transform::new(Operation::Subtract, 50.0).unwrap());
    working.push(Transform::new(Operation::Multiply, 2.0).unwrap());
    project.apply_scale(&working).unwrap();

    let rows = project.export_table("idle", 0).unwrap();
    assert_eq!(rows[0], vec!["60", "100", "140", "180"]);
}

#[test]
fn test_short_image_rejected() {
    init_logging();
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("flash.bin"), vec![0u8; 40]).unwrap();
    let path = dir.path().join("project.json");
    fs::write(&path, config_json(false)).unwrap();

    let err = Project::open(&path).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("flash"), "{message}");
}

#[test]
fn test_config_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let config = ProjectConfig::from_json(&config_json(false)).unwrap();
    let path = dir.path().join("saved.json");
    config.save(&path).unwrap();

    let reloaded = ProjectConfig::load(&path).unwrap();
    assert_eq!(reloaded.name, "stock");
    assert_eq!(reloaded.sections.len(), 2);
    assert_eq!(
        reloaded.sections[0].cipher,
        Some(CipherConfig::XorChain {
            block_size: 16,
            key: KEY.to_vec()
        })
    );
    assert_eq!(reloaded.sections[1].image, None);
    assert_eq!(reloaded.scales[1].transforms, config.scales[1].transforms);
    assert_eq!(reloaded.tables[0].x.as_ref().unwrap().length, 4);
}

#[test]
fn test_overlapping_sections_rejected() {
    let config = ProjectConfig::from_json(
        r#"{
            "name": "overlap",
            "sections": [
                { "name": "a", "base_address": 0, "length": 32 },
                { "name": "b", "base_address": 16, "length": 32 }
            ]
        }"#,
    )
    .unwrap();
    let dir = TempDir::new().unwrap();
    assert!(Project::from_config(&config, dir.path()).is_err());
}
