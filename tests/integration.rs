use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn trackback_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("trackback");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let photos_dir = root.join("photos");
    fs::create_dir_all(&photos_dir).unwrap();
    fs::write(photos_dir.join("wallet.jpg"), [0xFF, 0xD8, 0xFF, 0xE0, 0x00]).unwrap();
    fs::write(photos_dir.join("bottle.png"), [0x89, b'P', b'N', b'G']).unwrap();

    let config_content = format!(
        r#"[db]
path = "{root}/data/trackback.sqlite"

[storage]
backend = "local"
bucket = "item-images"
key_prefix = "public/"
root = "{root}/bucket"
public_base_url = "https://cdn.test"

[table]
backend = "sqlite"
name = "items"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("trackback.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_trackback(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = trackback_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("TRACKBACK_USER_ID")
        .env_remove("TRACKBACK_USER_EMAIL")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run trackback binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn photo(tmp: &TempDir, name: &str) -> String {
    tmp.path().join("photos").join(name).display().to_string()
}

fn submit_wallet(config_path: &Path, image: &str, extra: &[&str]) -> (String, String, bool) {
    let mut args = vec![
        "submit",
        "--name",
        "Wallet",
        "--category",
        "Accessories",
        "--description",
        "Brown leather, student ID inside",
        "--phone",
        "9876543210",
        "--date",
        "08/10/2025",
        "--time",
        "03:00 PM",
        "--location",
        "Central Library",
        "--image",
        image,
    ];
    args.extend_from_slice(extra);
    run_trackback(config_path, &args)
}

fn uploaded_files(tmp: &TempDir) -> Vec<PathBuf> {
    let dir = tmp.path().join("bucket").join("item-images").join("public");
    match fs::read_dir(dir) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_trackback(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data").join("trackback.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_trackback(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_trackback(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_submit_stores_record_and_photo() {
    let (tmp, config_path) = setup_test_env();
    run_trackback(&config_path, &["init"]);

    let image = photo(&tmp, "wallet.jpg");
    let (stdout, stderr, success) = submit_wallet(&config_path, &image, &["--user-id", "u-42"]);
    assert!(success, "submit failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Item uploaded successfully!"));
    assert!(stdout.contains("name: Wallet (Found on 08/10/2025)"));
    assert!(stdout.contains("image: https://cdn.test/item-images/public/"));

    let files = uploaded_files(&tmp);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].extension().unwrap(), "jpg");
    assert_eq!(fs::read(&files[0]).unwrap(), vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00]);
}

#[test]
fn test_list_shows_submitted_items() {
    let (tmp, config_path) = setup_test_env();
    run_trackback(&config_path, &["init"]);

    let (stdout, _, success) = run_trackback(&config_path, &["list"]);
    assert!(success);
    assert!(stdout.contains("No listings."));

    let image = photo(&tmp, "wallet.jpg");
    let (_, stderr, success) = submit_wallet(&config_path, &image, &["--user-id", "u-42"]);
    assert!(success, "submit failed: {}", stderr);

    let (stdout, _, success) = run_trackback(&config_path, &["list"]);
    assert!(success);
    assert!(stdout.contains("1. [FOUND] Wallet (Found on 08/10/2025)"));
    assert!(stdout.contains("category: Accessories"));
    assert!(stdout.contains("location: Central Library"));
    assert!(stdout.contains("contact: 9876543210"));
    assert!(stdout.contains("image: https://cdn.test/item-images/public/"));
}

#[test]
fn test_list_with_limit() {
    let (tmp, config_path) = setup_test_env();
    run_trackback(&config_path, &["init"]);

    let image = photo(&tmp, "wallet.jpg");
    submit_wallet(&config_path, &image, &["--user-id", "u-1"]);
    submit_wallet(&config_path, &image, &["--user-id", "u-2"]);

    let (stdout, _, success) = run_trackback(&config_path, &["list", "--limit", "1"]);
    assert!(success);
    assert!(stdout.contains("1. [FOUND]"));
    assert!(!stdout.contains("2. [FOUND]"));

    let (_, stderr, success) = run_trackback(&config_path, &["list", "--limit", "0"]);
    assert!(!success);
    assert!(stderr.contains("limit must be >= 1"));
}

#[test]
fn test_submit_uses_image_extension() {
    let (tmp, config_path) = setup_test_env();
    run_trackback(&config_path, &["init"]);

    let image = photo(&tmp, "bottle.png");
    let (_, stderr, success) = submit_wallet(&config_path, &image, &["--user-id", "u-42"]);
    assert!(success, "submit failed: {}", stderr);

    let files = uploaded_files(&tmp);
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].extension().unwrap(), "png");
}

#[test]
fn test_submit_coordinates_without_geocoder() {
    let (tmp, config_path) = setup_test_env();
    run_trackback(&config_path, &["init"]);

    let image = photo(&tmp, "wallet.jpg");
    let (stdout, stderr, success) = run_trackback(
        &config_path,
        &[
            "submit",
            "--name",
            "Umbrella",
            "--description",
            "Black, folding",
            "--phone",
            "9876543210",
            "--date",
            "09/10/2025",
            "--time",
            "10:15 AM",
            "--lat",
            "20.221495",
            "--lon",
            "85.735871",
            "--image",
            &image,
            "--user-id",
            "u-42",
        ],
    );
    assert!(success, "submit failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("location: Lat: 20.221495, Lon: 85.735871"));
}

#[test]
fn test_submit_blank_fields_fail() {
    let (tmp, config_path) = setup_test_env();
    run_trackback(&config_path, &["init"]);

    let image = photo(&tmp, "wallet.jpg");
    let (_, stderr, success) = run_trackback(
        &config_path,
        &["submit", "--name", "Wallet", "--image", &image, "--user-id", "u-42"],
    );
    assert!(!success, "blank fields should fail");
    assert!(stderr.contains("Description cannot be empty"));
    assert!(stderr.contains("Phone number cannot be empty"));
    assert!(stderr.contains("Location cannot be empty"));
    assert!(!stderr.contains("Category cannot be empty"));
    assert!(uploaded_files(&tmp).is_empty());
}

#[test]
fn test_submit_missing_image_fails() {
    let (_tmp, config_path) = setup_test_env();
    run_trackback(&config_path, &["init"]);

    let (_, stderr, success) = run_trackback(
        &config_path,
        &[
            "submit",
            "--name",
            "Wallet",
            "--description",
            "Brown leather",
            "--phone",
            "9876543210",
            "--date",
            "08/10/2025",
            "--time",
            "03:00 PM",
            "--location",
            "Central Library",
            "--user-id",
            "u-42",
        ],
    );
    assert!(!success);
    assert!(
        stderr.contains("Please select an image."),
        "Should ask for an image, got: {}",
        stderr
    );
}

#[test]
fn test_submit_without_user_fails() {
    let (tmp, config_path) = setup_test_env();
    run_trackback(&config_path, &["init"]);

    let image = photo(&tmp, "wallet.jpg");
    let (_, stderr, success) = submit_wallet(&config_path, &image, &[]);
    assert!(!success);
    assert!(
        stderr.contains("User not logged in."),
        "Should report missing user, got: {}",
        stderr
    );
    assert!(uploaded_files(&tmp).is_empty());
}

#[test]
fn test_submit_unreadable_image_fails() {
    let (tmp, config_path) = setup_test_env();
    run_trackback(&config_path, &["init"]);

    let image = photo(&tmp, "missing.jpg");
    let (_, stderr, success) = submit_wallet(&config_path, &image, &["--user-id", "u-42"]);
    assert!(!success);
    assert!(stderr.contains("Cannot read image"), "got: {}", stderr);
    assert!(uploaded_files(&tmp).is_empty());
}

#[test]
fn test_submit_before_init_orphans_photo() {
    let (tmp, config_path) = setup_test_env();

    // No `init`: the upload succeeds, then the insert fails on the missing table.
    let image = photo(&tmp, "wallet.jpg");
    let (_, stderr, success) = submit_wallet(&config_path, &image, &["--user-id", "u-42"]);
    assert!(!success);
    assert!(stderr.contains("no such table"), "got: {}", stderr);
    assert_eq!(uploaded_files(&tmp).len(), 1);
}

#[test]
fn test_invalid_config_rejected() {
    let (tmp, config_path) = setup_test_env();
    fs::write(
        &config_path,
        format!(
            "[db]\npath = \"{}/data/trackback.sqlite\"\n\n[storage]\nbackend = \"ftp\"\n",
            tmp.path().display()
        ),
    )
    .unwrap();

    let (_, stderr, success) = run_trackback(&config_path, &["init"]);
    assert!(!success);
    assert!(stderr.contains("Unknown storage backend"));
}
