use assert_cmd::Command;

fn booknest(config_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("booknest").unwrap();
    cmd.env("BOOKNEST_CONFIG_DIR", config_dir)
        .env_remove("BOOKNEST_ENV")
        .env_remove("BOOKNEST_DATABASE__URI")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    let output = booknest(dir.path()).arg("--help").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    for subcommand in ["serve", "ping", "config"] {
        assert!(stdout.contains(subcommand), "missing {subcommand}");
    }
}

#[test]
fn config_prints_layered_settings() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("base.toml"), "[server]\nport = 9000\n").unwrap();
    std::fs::write(
        dir.path().join("staging.toml"),
        "[database]\ncollection = \"staging_books\"\n",
    )
    .unwrap();

    let output = booknest(dir.path())
        .args(["config", "--env", "staging"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let settings: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(settings["environment"], "staging");
    assert_eq!(settings["server"]["port"], 9000);
    assert_eq!(settings["database"]["collection"], "staging_books");
}

#[test]
fn config_rejects_unknown_environment() {
    let dir = tempfile::tempdir().unwrap();
    let output = booknest(dir.path())
        .args(["config", "--env", "qa"])
        .output()
        .unwrap();

    assert!(!output.status.success());
}

#[test]
fn ping_succeeds_against_in_memory_store() {
    let dir = tempfile::tempdir().unwrap();
    let output = booknest(dir.path())
        .arg("ping")
        .env("BOOKNEST_DATABASE__URI", "memory://")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout)
        .unwrap()
        .contains("store reachable"));
}
