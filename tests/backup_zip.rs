#[path = "../src/backup.rs"]
mod backup;

use serde_json::json;
use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn sample_snapshot() -> serde_json::Value {
    json!({
        "users": [],
        "students": [{
            "id": "student-1",
            "name": "Alex Brown",
            "rollNumber": "TCK2024001",
            "grade": "10-A",
            "parentId": "parent-1",
            "dateOfBirth": "2010-05-15"
        }],
        "attendance": [{ "studentId": "student-1", "date": "2024-02-09", "status": "present" }],
        "examResults": [],
        "notifications": [],
        "staffProfiles": [],
        "leaveRequests": []
    })
}

#[test]
fn zip_export_and_import_roundtrip() {
    let out_dir = temp_dir("schoold-backup-out");
    let bundle_path = out_dir.join("nested").join("store.zip");
    let snapshot = sample_snapshot();

    let export = backup::export_store_bundle(&snapshot, &bundle_path).expect("export bundle");
    assert_eq!(export.bundle_format, backup::BUNDLE_FORMAT_V1);
    assert_eq!(export.entry_count, 2);
    assert_eq!(export.sha256.len(), 64);

    let f = File::open(&bundle_path).expect("open bundle");
    let mut archive = zip::ZipArchive::new(f).expect("open zip archive");
    let mut manifest = String::new();
    archive
        .by_name("manifest.json")
        .expect("manifest entry")
        .read_to_string(&mut manifest)
        .expect("read manifest");
    assert!(manifest.contains(backup::BUNDLE_FORMAT_V1));
    assert!(manifest.contains(&export.sha256));
    archive
        .by_name("store/store.json")
        .expect("store entry in bundle");

    let import = backup::import_store_bundle(&bundle_path).expect("import bundle");
    assert_eq!(import.bundle_format_detected, backup::BUNDLE_FORMAT_V1);
    assert_eq!(import.snapshot, snapshot);
}

#[test]
fn tampered_store_entry_is_rejected() {
    let out_dir = temp_dir("schoold-backup-tamper");
    let bundle_path = out_dir.join("tampered.zip");

    let f = File::create(&bundle_path).expect("create bundle");
    let mut zip = zip::ZipWriter::new(f);
    let opts = zip::write::FileOptions::default();
    let manifest = json!({
        "format": backup::BUNDLE_FORMAT_V1,
        "version": 1,
        "storeSha256": "0000000000000000000000000000000000000000000000000000000000000000",
    });
    zip.start_file("manifest.json", opts).expect("start manifest");
    zip.write_all(manifest.to_string().as_bytes())
        .expect("write manifest");
    zip.start_file("store/store.json", opts).expect("start store");
    zip.write_all(sample_snapshot().to_string().as_bytes())
        .expect("write store");
    zip.finish().expect("finish zip");

    let err = backup::import_store_bundle(&bundle_path).expect_err("digest mismatch");
    assert!(err.to_string().contains("digest mismatch"), "{err:#}");
}

#[test]
fn unknown_format_and_non_zip_inputs_are_rejected() {
    let out_dir = temp_dir("schoold-backup-bad");

    let plain = out_dir.join("store.json");
    std::fs::write(&plain, sample_snapshot().to_string()).expect("write plain json");
    let err = backup::import_store_bundle(&plain).expect_err("plain json is not a bundle");
    assert!(err.to_string().contains("not a zip bundle"), "{err:#}");

    let other = out_dir.join("other.zip");
    let f = File::create(&other).expect("create bundle");
    let mut zip = zip::ZipWriter::new(f);
    zip.start_file("manifest.json", zip::write::FileOptions::default())
        .expect("start manifest");
    zip.write_all(br#"{"format":"gradebook-export-v3"}"#)
        .expect("write manifest");
    zip.finish().expect("finish zip");
    let err = backup::import_store_bundle(&other).expect_err("foreign format");
    assert!(err.to_string().contains("unsupported bundle format"), "{err:#}");

    let missing = out_dir.join("missing.zip");
    assert!(backup::import_store_bundle(&missing).is_err());
}
