#![cfg(target_os = "linux")]

//! First run without any config writes a template and exits cleanly.

use std::fs;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn first_run_writes_template_and_exits_zero() {
    let home = tempdir().unwrap();
    let xdg = home.path().join("xdg");

    let me = assert_cmd::cargo::cargo_bin!("preview_migrate");
    let out = Command::new(me)
        .env_remove("PREVIEW_MIGRATE_CONFIG")
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", &xdg)
        .env("XDG_DATA_HOME", home.path().join("data"))
        .output()
        .expect("run binary");

    eprintln!("STDOUT:\n{}", String::from_utf8_lossy(&out.stdout));
    eprintln!("STDERR:\n{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(out.status.code(), Some(0));

    let cfg = xdg.join("preview_migrate").join("config.xml");
    let text = fs::read_to_string(&cfg).expect("template written");
    assert!(text.contains("<storage_root></storage_root>"));

    // A second run still has no storage_root and must say so.
    let me = assert_cmd::cargo::cargo_bin!("preview_migrate");
    let out = Command::new(me)
        .env_remove("PREVIEW_MIGRATE_CONFIG")
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", &xdg)
        .env("XDG_DATA_HOME", home.path().join("data"))
        .output()
        .expect("run binary");
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("storage_root is not set"));
}

#[test]
fn template_run_with_storage_root_flag_proceeds() {
    let home = tempdir().unwrap();
    let xdg = home.path().join("xdg");
    let bucket = home.path().join("bucket");
    fs::create_dir_all(bucket.join("preview/old-multibucket/7")).unwrap();
    fs::write(bucket.join("preview/old-multibucket/7/x.png"), "x").unwrap();

    let me = assert_cmd::cargo::cargo_bin!("preview_migrate");
    let out = Command::new(me)
        .env_remove("PREVIEW_MIGRATE_CONFIG")
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", &xdg)
        .env("XDG_DATA_HOME", home.path().join("data"))
        .arg("--storage-root")
        .arg(&bucket)
        .args(["-y", "--no-progress"])
        .output()
        .expect("run binary");
    assert_eq!(out.status.code(), Some(0));
    assert!(bucket.join("preview/7/x.png").exists());
}
