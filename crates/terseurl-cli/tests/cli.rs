use assert_cmd::Command;
use predicates::str::{contains, starts_with};
use tempfile::TempDir;

fn bare() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("terseurl-authz"));
    cmd.env_remove("TERSEURL_AUTHZ_CONFIG")
        .env_remove("TERSEURL_AUTHZ_BACKEND")
        .env_remove("TERSEURL_AUTHZ_PATH")
        .env_remove("RUST_LOG");
    cmd
}

/// Command against a redb file inside `temp_dir`.
fn authz(temp_dir: &TempDir) -> Command {
    let mut cmd = bare();
    cmd.env("TERSEURL_DIR", temp_dir.path())
        .arg("--backend")
        .arg("redb")
        .arg("--db-path")
        .arg(temp_dir.path().join("authorization.redb"));
    cmd
}

fn json_output(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "{:?}", output);
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_cli_help() {
    bare()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("TerseURL"));
}

#[test]
fn test_cli_version() {
    bare().arg("--version").assert().success();
}

#[test]
fn test_cli_completions() {
    bare()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(starts_with("_terseurl__authz"))
        .stdout(contains("complete -F _terseurl__authz"));
}

#[test]
fn test_grant_and_read_back() {
    let temp_dir = tempfile::tempdir().unwrap();

    authz(&temp_dir)
        .args(["grant", "alice", "abc", "--owner"])
        .assert()
        .success()
        .stdout(contains("Granted alice on abc: owner"));
    authz(&temp_dir)
        .args(["grant", "bob", "abc", "--read-visits"])
        .assert()
        .success();

    let users = json_output(authz(&temp_dir).args(["users", "alice", "--format", "json"]));
    assert_eq!(users["alice"]["abc"]["owner"], true);

    let shortened = json_output(authz(&temp_dir).args(["shortened", "abc", "--format", "json"]));
    let holders = shortened["abc"].as_object().unwrap();
    assert_eq!(holders.len(), 2);
    assert_eq!(shortened["abc"]["bob"]["read_visits"], true);
    assert_eq!(shortened["abc"]["bob"]["owner"], false);

    authz(&temp_dir)
        .args(["users"])
        .assert()
        .success()
        .stdout(contains("alice"))
        .stdout(contains("read_visits"));
}

#[test]
fn test_check_exit_status() {
    let temp_dir = tempfile::tempdir().unwrap();

    authz(&temp_dir)
        .args(["grant", "bob", "abc", "--read-visits"])
        .assert()
        .success();

    authz(&temp_dir)
        .args(["check", "bob", "abc", "--read-visits"])
        .assert()
        .success()
        .stdout(contains("allowed"));
    authz(&temp_dir)
        .args(["check", "bob", "abc", "--owner"])
        .assert()
        .code(1)
        .stdout(contains("denied"));
    authz(&temp_dir)
        .args(["check", "carol", "abc"])
        .assert()
        .code(1);
}

#[test]
fn test_revoke_requires_keys_or_all() {
    let temp_dir = tempfile::tempdir().unwrap();

    authz(&temp_dir)
        .args(["revoke-users"])
        .assert()
        .failure()
        .stderr(contains("Nothing to revoke"));
    authz(&temp_dir)
        .args(["revoke-shortened", "abc", "--all"])
        .assert()
        .failure();
}

#[test]
fn test_revoke_users_and_shortened() {
    let temp_dir = tempfile::tempdir().unwrap();

    authz(&temp_dir)
        .args(["grant", "alice", "abc", "--owner"])
        .assert()
        .success();
    authz(&temp_dir)
        .args(["grant", "bob", "abc", "--read-visits"])
        .assert()
        .success();

    authz(&temp_dir)
        .args(["revoke-users", "alice"])
        .assert()
        .success();
    let shortened = json_output(authz(&temp_dir).args(["shortened", "abc", "--format", "json"]));
    assert_eq!(shortened["abc"].as_object().unwrap().len(), 1);
    assert!(shortened["abc"].get("alice").is_none());

    authz(&temp_dir)
        .args(["revoke-shortened", "abc"])
        .assert()
        .success();
    authz(&temp_dir)
        .args(["shortened", "abc"])
        .assert()
        .failure()
        .stderr(contains("shortened URL not found: abc"));
}

#[test]
fn test_revoke_all() {
    let temp_dir = tempfile::tempdir().unwrap();

    authz(&temp_dir)
        .args(["grant", "alice", "abc", "--owner"])
        .assert()
        .success();
    authz(&temp_dir)
        .args(["revoke-shortened", "--all"])
        .assert()
        .success()
        .stdout(contains("Removed all authorization data"));
    authz(&temp_dir)
        .args(["users"])
        .assert()
        .success()
        .stdout(contains("No authorization data"));
}

#[test]
fn test_replace_drops_old_grants() {
    let temp_dir = tempfile::tempdir().unwrap();

    authz(&temp_dir)
        .args(["grant", "alice", "abc", "--owner"])
        .assert()
        .success();
    authz(&temp_dir)
        .args(["replace", "alice", r#"{"xyz":{"read_visits":true}}"#])
        .assert()
        .success()
        .stdout(contains("1 shortened URLs"));

    authz(&temp_dir)
        .args(["shortened", "abc"])
        .assert()
        .failure()
        .stderr(contains("not found"));
    let users = json_output(authz(&temp_dir).args(["users", "alice", "--format", "json"]));
    assert_eq!(users["alice"]["xyz"]["read_visits"], true);
    assert!(users["alice"].get("abc").is_none());

    authz(&temp_dir)
        .args(["replace", "alice", "not json"])
        .assert()
        .failure()
        .stderr(contains("JSON object"));
}

#[test]
fn test_verify_rebuild_and_stats() {
    let temp_dir = tempfile::tempdir().unwrap();

    authz(&temp_dir)
        .args(["grant", "alice", "abc", "--owner"])
        .assert()
        .success();
    authz(&temp_dir)
        .args(["grant", "alice", "xyz", "--write-terse"])
        .assert()
        .success();
    authz(&temp_dir)
        .args(["grant", "bob", "abc"])
        .assert()
        .success();

    authz(&temp_dir)
        .args(["verify"])
        .assert()
        .success()
        .stdout(contains("consistent"));
    authz(&temp_dir)
        .args(["rebuild"])
        .assert()
        .success()
        .stdout(contains("2 shortened URLs"));

    let stats = json_output(authz(&temp_dir).args(["stats", "--format", "json"]));
    assert_eq!(stats["backend"], "redb");
    assert_eq!(stats["users"], 2);
    assert_eq!(stats["shortened_urls"], 2);
    assert_eq!(stats["grants"], 3);
}

#[test]
fn test_config_file_selects_backend() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("authorization.toml");
    let db_path = temp_dir.path().join("from-config.redb");
    std::fs::write(
        &config_path,
        format!("backend = \"redb\"\npath = {:?}\n", db_path.display().to_string()),
    )
    .unwrap();

    bare()
        .env("TERSEURL_DIR", temp_dir.path())
        .arg("--config")
        .arg(&config_path)
        .args(["grant", "alice", "abc", "--owner"])
        .assert()
        .success();

    assert!(db_path.exists());
    let stats = json_output(
        bare()
            .env("TERSEURL_DIR", temp_dir.path())
            .arg("--config")
            .arg(&config_path)
            .args(["stats", "--format", "json"]),
    );
    assert_eq!(stats["users"], 1);
}

#[test]
fn test_default_config_file_is_used() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("default-location.redb");
    std::fs::write(
        temp_dir.path().join("authorization.toml"),
        format!("backend = \"redb\"\npath = {:?}\n", db_path.display().to_string()),
    )
    .unwrap();

    bare()
        .env("TERSEURL_DIR", temp_dir.path())
        .args(["grant", "alice", "abc", "--owner"])
        .assert()
        .success();
    assert!(db_path.exists());

    let stats = json_output(
        bare()
            .env("TERSEURL_DIR", temp_dir.path())
            .args(["stats", "--format", "json"]),
    );
    assert_eq!(stats["backend"], "redb");
    assert_eq!(stats["users"], 1);
}

#[test]
fn test_unknown_backend_is_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();

    bare()
        .env("TERSEURL_DIR", temp_dir.path())
        .args(["--backend", "sqlite", "stats"])
        .assert()
        .failure()
        .stderr(contains("invalid configuration"));
}
