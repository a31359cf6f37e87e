//! Integration tests for the snapvault CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn snapvault(base: &Path) -> Command {
    let mut cmd = Command::cargo_bin("snapvault").unwrap();
    cmd.env("SNAPVAULT_DATA_DIR", base).env_remove("RUST_LOG");
    cmd
}

fn write_collection(base: &Path, name: &str, contents: &str) {
    let data_dir = base.join("data");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(data_dir.join(format!("{}.json", name)), contents).unwrap();
}

fn read_collection(base: &Path, name: &str) -> serde_json::Value {
    let contents = fs::read_to_string(base.join("data").join(format!("{}.json", name))).unwrap();
    serde_json::from_str(&contents).unwrap()
}

/// Pull the `snap-xxxxxxxx` id out of "Backup created: snap-xxxxxxxx"
fn created_id(stdout: &[u8], label: &str) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    stdout
        .lines()
        .find_map(|line| line.strip_prefix(label))
        .map(|id| id.trim().to_string())
        .unwrap()
}

#[test]
fn test_cli_help() {
    let temp_dir = TempDir::new().unwrap();
    snapvault(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Snapshot and version management"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_list_empty() {
    let temp_dir = TempDir::new().unwrap();
    snapvault(temp_dir.path())
        .args(["backup", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No backups found."));
}

#[test]
fn test_create_and_list() {
    let temp_dir = TempDir::new().unwrap();
    write_collection(temp_dir.path(), "students", r#"[{"name":"Ada"}]"#);

    snapvault(temp_dir.path())
        .args(["backup", "create", "--description", "End of term", "--tag", "term-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Backup created: snap-"));

    snapvault(temp_dir.path())
        .args(["backup", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("manual"))
        .stdout(predicate::str::contains("End of term"))
        .stdout(predicate::str::contains("Total: 1 backup(s)"));

    assert!(temp_dir.path().join("store").join("backups.json").exists());
}

#[test]
fn test_restore_requires_force() {
    let temp_dir = TempDir::new().unwrap();
    write_collection(temp_dir.path(), "students", r#"[{"name":"Ada"}]"#);

    snapvault(temp_dir.path())
        .args(["backup", "create"])
        .assert()
        .success();
    write_collection(temp_dir.path(), "students", r#"[{"name":"Grace"}]"#);

    snapvault(temp_dir.path())
        .args(["backup", "restore", "latest"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--force"));

    assert_eq!(
        read_collection(temp_dir.path(), "students"),
        serde_json::json!([{"name": "Grace"}])
    );
}

#[test]
fn test_restore_takes_checkpoint() {
    let temp_dir = TempDir::new().unwrap();
    write_collection(temp_dir.path(), "students", r#"[{"name":"Ada"}]"#);

    let output = snapvault(temp_dir.path())
        .args(["backup", "create"])
        .output()
        .unwrap();
    let id = created_id(&output.stdout, "Backup created:");

    write_collection(temp_dir.path(), "students", r#"[{"name":"Grace"}]"#);

    snapvault(temp_dir.path())
        .args(["backup", "restore", &id, "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Restore complete!"))
        .stdout(predicate::str::contains("Pre-restore checkpoint: snap-"));

    assert_eq!(
        read_collection(temp_dir.path(), "students"),
        serde_json::json!([{"name": "Ada"}])
    );

    snapvault(temp_dir.path())
        .args(["backup", "list", "--kind", "checkpoint"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pre-restore"));
}

#[test]
fn test_restore_unknown_backup_fails() {
    let temp_dir = TempDir::new().unwrap();

    snapvault(temp_dir.path())
        .args(["backup", "restore", "snap-00000000", "--force"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));

    snapvault(temp_dir.path())
        .args(["backup", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No backups found."));
}

#[test]
fn test_export_and_import() {
    let temp_dir = TempDir::new().unwrap();
    write_collection(temp_dir.path(), "subjects", r#"["Maths"]"#);
    let export_file = temp_dir.path().join("export.json");

    snapvault(temp_dir.path())
        .args(["backup", "create"])
        .assert()
        .success();

    snapvault(temp_dir.path())
        .args(["backup", "export", "latest", "--output"])
        .arg(&export_file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported"));

    snapvault(temp_dir.path())
        .args(["backup", "import"])
        .arg(&export_file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported backup: snap-"));

    snapvault(temp_dir.path())
        .args(["backup", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Backups: 2 (0 auto, 2 manual, 0 checkpoint)"));
}

#[test]
fn test_version_lifecycle() {
    let temp_dir = TempDir::new().unwrap();
    write_collection(temp_dir.path(), "homeworks", r#"[{"title":"Essay"}]"#);

    snapvault(temp_dir.path())
        .args(["version", "create", "spring", "--change", "Added essays"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Version created: spring"));

    snapvault(temp_dir.path())
        .args(["version", "current"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No current version."));

    snapvault(temp_dir.path())
        .args(["version", "stable", "spring"])
        .assert()
        .success();

    snapvault(temp_dir.path())
        .args(["version", "current"])
        .assert()
        .success()
        .stdout(predicate::str::contains("spring"));

    write_collection(temp_dir.path(), "homeworks", "[]");
    snapvault(temp_dir.path())
        .args(["version", "restore", "spring", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored version spring"));

    assert_eq!(
        read_collection(temp_dir.path(), "homeworks"),
        serde_json::json!([{"title": "Essay"}])
    );
}

#[test]
fn test_config_rejects_zero_interval() {
    let temp_dir = TempDir::new().unwrap();

    snapvault(temp_dir.path())
        .args(["config", "--interval", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Scheduler misconfigured"));

    snapvault(temp_dir.path())
        .args(["log"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SchedulerMisconfigured"));
}

#[test]
fn test_config_saves_settings() {
    let temp_dir = TempDir::new().unwrap();

    snapvault(temp_dir.path())
        .args(["config", "--interval", "10", "--max-backups", "20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Settings saved."));

    snapvault(temp_dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Auto-save interval:   10 min"))
        .stdout(predicate::str::contains("Max backups:          20"));
}

#[test]
fn test_prune_preview() {
    let temp_dir = TempDir::new().unwrap();

    snapvault(temp_dir.path())
        .args(["backup", "create"])
        .assert()
        .success();

    snapvault(temp_dir.path())
        .args(["backup", "prune-preview", "--max", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No backups would be pruned."));
}
