use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

const BASE: &str = "# Test hosts file
127.0.0.1 localhost
";

fn qh(hosts_path: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_qh"))
        .args(args)
        .env("QH_HOSTS_FILE", hosts_path)
        .env("QH_LOG_LEVEL", "debug")
        .output()
        .unwrap()
}

#[test]
fn test_cli_add_move_remove() {
    let temp_dir = tempdir().unwrap();
    let hosts_path = temp_dir.path().join("hosts");
    fs::write(&hosts_path, BASE).unwrap();

    // Add a new entry
    let output = qh(&hosts_path, &["add", "test.example.com", "192.168.1.10"]);
    assert!(output.status.success());

    let content = fs::read_to_string(&hosts_path).unwrap();
    assert_eq!(
        content,
        "# Test hosts file\n127.0.0.1 localhost\n\n# qh start\n192.168.1.10 test.example.com\n# qh end\n"
    );

    // Listing shows only the managed block
    let output = qh(&hosts_path, &["list"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout, "192.168.1.10 test.example.com\n");

    // Adding the same domain again moves it
    let output = qh(&hosts_path, &["add", "TEST.example.com", "10.10.10.10"]);
    assert!(output.status.success());

    let content = fs::read_to_string(&hosts_path).unwrap();
    assert!(!content.contains("192.168.1.10"));
    assert!(content.contains("10.10.10.10 TEST.example.com"));

    // Removing the last entry drops the block entirely
    let output = qh(&hosts_path, &["remove", "test.example.com"]);
    assert!(output.status.success());

    let content = fs::read_to_string(&hosts_path).unwrap();
    assert_eq!(content, BASE);
}

#[test]
fn test_cli_list_and_lookup() {
    let temp_dir = tempdir().unwrap();
    let hosts_path = temp_dir.path().join("hosts");
    fs::write(
        &hosts_path,
        format!("{BASE}\n# qh start\n10.0.0.1 api.test web.test\n10.0.0.2 db.test\n# qh end\n"),
    )
    .unwrap();

    let output = qh(&hosts_path, &["ls", "-f", "db"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "10.0.0.2 db.test\n");

    let output = qh(&hosts_path, &["list", "--json"]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            { "address": "10.0.0.1", "names": ["api.test", "web.test"] },
            { "address": "10.0.0.2", "names": ["db.test"] },
        ])
    );

    let output = qh(&hosts_path, &["lookup", "WEB.test"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "10.0.0.1\n");

    let output = qh(&hosts_path, &["lookup", "10.0.0.1"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "api.test\nweb.test\n");

    // Read-only commands leave the file alone
    let content = fs::read_to_string(&hosts_path).unwrap();
    assert!(content.contains("# qh start\n10.0.0.1 api.test web.test\n"));
}

#[test]
fn test_cli_error_handling() {
    let temp_dir = tempdir().unwrap();
    let hosts_path = temp_dir.path().join("hosts");
    fs::write(&hosts_path, BASE).unwrap();

    // Target that cannot be a hostname fails before any lookup
    let output = qh(&hosts_path, &["add", "test.example.com", "not a host"]);
    assert!(!output.status.success());

    // Name that would corrupt the block
    let output = qh(&hosts_path, &["add", "#bad", "127.0.0.1"]);
    assert!(!output.status.success());

    // Missing hostname is not an error
    let output = qh(&hosts_path, &["rm", "doesnotexist.example.com"]);
    assert!(output.status.success());

    // Nothing above touched the file
    assert_eq!(fs::read_to_string(&hosts_path).unwrap(), BASE);

    // Missing hosts file
    let output = qh(&temp_dir.path().join("missing"), &["add", "a.test", "127.0.0.1"]);
    assert!(!output.status.success());

    // Bare form needs exactly a domain and an address
    let output = qh(&hosts_path, &["a.test", "127.0.0.1", "extra"]);
    assert!(!output.status.success());
}

#[test]
fn test_cli_no_args_prints_help() {
    let temp_dir = tempdir().unwrap();
    let hosts_path = temp_dir.path().join("hosts");
    fs::write(&hosts_path, BASE).unwrap();

    let output = qh(&hosts_path, &[]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Usage"));
}

#[cfg(unix)]
#[test]
fn test_cli_temporary_entry_removed_on_interrupt() {
    use std::time::{Duration, Instant};

    let temp_dir = tempdir().unwrap();
    let hosts_path = temp_dir.path().join("hosts");

    // Interrupt the moment the entry shows up; no grace period.
    for run in 0..20 {
        fs::write(&hosts_path, BASE).unwrap();

        let mut child = Command::new(env!("CARGO_BIN_EXE_qh"))
            .args(["tmp.test", "10.0.0.7"])
            .env("QH_HOSTS_FILE", &hosts_path)
            .spawn()
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while !fs::read_to_string(&hosts_path).unwrap().contains("10.0.0.7 tmp.test") {
            assert!(Instant::now() < deadline, "run {run}: temporary entry never appeared");
            std::thread::sleep(Duration::from_millis(1));
        }

        let status = Command::new("kill")
            .args(["-INT", &child.id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        let status = child.wait().unwrap();
        assert!(!status.success(), "run {run}: exited successfully");
        assert_eq!(
            fs::read_to_string(&hosts_path).unwrap(),
            BASE,
            "run {run}: temporary entry left on disk"
        );
    }
}
