//! CLI integration tests against the built `estate` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn estate() -> Command {
    Command::new(env!("CARGO_BIN_EXE_estate"))
}

fn create_keep(path: &Path) {
    estate()
        .args([
            "new",
            "--country",
            "Orde",
            "--region",
            "Ordenholm",
            "--trait",
            "Riverside",
            "--size",
            "5x5",
            "--name",
            "Riverside Keep",
            "--out",
        ])
        .arg(path)
        .assert()
        .success();
}

#[test]
fn test_cli_help() {
    estate().arg("--help").assert().success().stdout(contains("price"));
}

#[test]
fn test_cli_version() {
    estate()
        .arg("--version")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_catalog_lists_reference_data() {
    estate()
        .arg("catalog")
        .assert()
        .success()
        .stdout(contains("Orde"))
        .stdout(contains("Ordenholm"))
        .stdout(contains("Riverside"))
        .stdout(contains("Very Expensive"))
        .stdout(contains("Grid sizes: 5x5"));
}

#[test]
fn test_new_writes_document_and_prices_land() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keep.json");
    estate()
        .args([
            "new", "--country", "Orde", "--region", "Ordenholm", "--trait", "Riverside", "--size",
            "5x5", "--out",
        ])
        .arg(&path)
        .assert()
        .success()
        .stdout(contains("Land Cost 4500 gp"))
        .stdout(contains("Land Cost 180%"));

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"countryName\": \"Orde\""));
    assert!(text.contains("\"regionTraitsSelected\""));
}

#[test]
fn test_new_rejects_trait_not_offered() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keep.json");
    estate()
        .args([
            "new", "--country", "Orde", "--region", "Ordenholm", "--trait", "Coastal", "--size",
            "5x5", "--out",
        ])
        .arg(&path)
        .assert()
        .failure()
        .stderr(contains("Coastal"));
    assert!(!path.exists());
}

#[test]
fn test_new_rejects_unknown_size() {
    let dir = tempdir().unwrap();
    estate()
        .args([
            "new", "--country", "Orde", "--region", "Ordenholm", "--size", "7x7", "--out",
        ])
        .arg(dir.path().join("keep.json"))
        .assert()
        .failure()
        .stderr(contains("7x7"));
}

#[test]
fn test_place_updates_totals() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keep.json");
    create_keep(&path);

    estate()
        .args(["place", "--x", "0", "--y", "0", "--tile", "Generic", "--quality", "Ornate"])
        .arg(&path)
        .assert()
        .success()
        .stdout(contains("Build Cost 36 gp"))
        .stdout(contains("TP Value 10 tp"));

    estate()
        .arg("price")
        .arg(&path)
        .assert()
        .success()
        .stdout(contains("Riverside Keep - Orde - Ordenholm"))
        .stdout(contains("Build Cost 36 gp"));
}

#[test]
fn test_place_on_new_level_adds_land_cost() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keep.json");
    create_keep(&path);

    estate()
        .args(["place", "--x", "1", "--y", "1", "--level", "1", "--tile", "Cheap"])
        .arg(&path)
        .assert()
        .success()
        .stdout(contains("Land Cost 4680 gp"));
}

#[test]
fn test_place_rejects_disallowed_quality() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keep.json");
    create_keep(&path);
    let before = fs::read_to_string(&path).unwrap();

    estate()
        .args(["place", "--x", "0", "--y", "0", "--tile", "Field", "--quality", "Gilded"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(contains("Gilded"));
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_price_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keep.json");
    create_keep(&path);

    let out = estate().args(["price", "--json"]).arg(&path).output().unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["rounded"]["totalLandCost"], 4500);
    assert_eq!(value["rounded"]["landCostPct"], 180);
}

#[test]
fn test_check_reports_unknown_tile() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(
        &path,
        r#"{
            "propertyName": "Shack",
            "playerName": "Bo",
            "lastDateModified": "",
            "versionCreatedWith": "",
            "countryName": "",
            "regionName": "",
            "regionTraitsSelected": [],
            "mapMatrix": [[[{"name": "Marble Floor", "trait": ""}]]]
        }"#,
    )
    .unwrap();

    estate()
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stderr(contains("Marble Floor"));
}

#[test]
fn test_check_rejects_malformed_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, "{ not json").unwrap();

    estate()
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stderr(contains("malformed document"));
}

#[test]
fn test_check_accepts_valid_document() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keep.json");
    create_keep(&path);

    estate()
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stdout(contains("OK: Riverside Keep | 5x5 grid | 25 tiles"));
}

#[test]
fn test_export_writes_fixed_file_name() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keep.json");
    create_keep(&path);
    let out_dir = dir.path().join("downloads");

    estate()
        .arg("export")
        .arg(&path)
        .arg("--dir")
        .arg(&out_dir)
        .assert()
        .success()
        .stdout(contains("application/json"));

    let body = fs::read_to_string(out_dir.join("property.json")).unwrap();
    assert!(body.contains(r#""propertyName":"Riverside Keep""#));
    assert!(!body.contains('\n'));
}

#[test]
fn test_custom_catalog_flag() {
    let dir = tempdir().unwrap();
    let catalog = dir.path().join("catalog.yaml");
    fs::write(&catalog, "consts: [").unwrap();

    estate()
        .arg("--catalog")
        .arg(&catalog)
        .arg("catalog")
        .assert()
        .failure()
        .stderr(contains("loading catalog"));
}

#[test]
fn test_rust_log_controls_verbosity() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keep.json");
    create_keep(&path);

    estate()
        .env("RUST_LOG", "debug")
        .arg("price")
        .arg(&path)
        .assert()
        .success()
        .stderr(contains("aggregated property"));

    estate()
        .env("RUST_LOG", "error")
        .arg("price")
        .arg(&path)
        .assert()
        .success()
        .stderr(contains("catalog ready").not());
}

#[test]
fn test_price_rejects_repeated_and_unoffered_traits() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keep.json");
    create_keep(&path);
    let text = fs::read_to_string(&path).unwrap();
    let edited = text.replace("\"Riverside\"", "\"Riverside\", \"Riverside\", \"Coastal\"");
    assert_ne!(edited, text);
    fs::write(&path, edited).unwrap();

    estate()
        .args(["price", "--json"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(contains("selected more than once"));

    let text = fs::read_to_string(&path).unwrap();
    fs::write(&path, text.replacen("\"Riverside\", ", "", 1)).unwrap();
    estate()
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stderr(contains("not offered"));
}
