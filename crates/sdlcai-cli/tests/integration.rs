#![allow(deprecated)]
use assert_cmd::Command;
use mockito::{Matcher, Mock, ServerGuard};
use predicates::prelude::*;
use tempfile::TempDir;

fn sdlcai(dir: &TempDir, server: Option<&ServerGuard>) -> Command {
    let mut cmd = Command::cargo_bin("sdlcai").unwrap();
    cmd.current_dir(dir.path())
        .env("SDLCAI_HOME", dir.path())
        .env_remove("SDLCAI_TOKEN")
        .env_remove("SDLCAI_API_KEY")
        .env_remove("RUST_LOG");
    match server {
        Some(server) => cmd.env("SDLCAI_BASE_URL", format!("{}/api/v1", server.url())),
        // Nothing listens here; commands that never touch the network still work.
        None => cmd.env("SDLCAI_BASE_URL", "http://127.0.0.1:9/api/v1"),
    };
    cmd
}

fn mock_projects(server: &mut ServerGuard, body: &str) -> Mock {
    server
        .mock("GET", "/api/v1/projects/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create()
}

fn mock_empty_histories(server: &mut ServerGuard) -> Mock {
    server
        .mock(
            "GET",
            Matcher::Regex(r"^/api/v1/projects/[^/]+/history$".into()),
        )
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"activity_log":[]}"#)
        .create()
}

const TWO_PROJECTS: &str = r#"{"projects":[
    {"id":1,"name":"Payments","created_at":"2024-05-01T10:00:00Z"},
    {"id":2,"name":"Search","description":"full-text","created_at":"2024-05-02T10:00:00Z"}
]}"#;

// ---------------------------------------------------------------------------
// sdlcai tool list / config
// ---------------------------------------------------------------------------

#[test]
fn tool_list_shows_every_tool() {
    let dir = TempDir::new().unwrap();
    sdlcai(&dir, None)
        .args(["tool", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Architecture Generator"))
        .stdout(predicate::str::contains("testcases"))
        .stdout(predicate::str::contains("/debug/"));
}

#[test]
fn tool_list_json_has_nine_entries() {
    let dir = TempDir::new().unwrap();
    let output = sdlcai(&dir, None)
        .args(["--json", "tool", "list"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let items: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(items.as_array().unwrap().len(), 9);
}

#[test]
fn config_validate_rejects_non_http_url() {
    let dir = TempDir::new().unwrap();
    sdlcai(&dir, None)
        .args(["--base-url", "ftp://example.com", "config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error]"));
}

#[test]
fn config_validate_warns_without_api_key() {
    let dir = TempDir::new().unwrap();
    sdlcai(&dir, None)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[warning]"));
}

#[test]
fn config_show_masks_api_key() {
    let dir = TempDir::new().unwrap();
    sdlcai(&dir, None)
        .args(["--api-key", "secret-key-9876", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("****9876"))
        .stdout(predicate::str::contains("secret-key").not());
}

#[test]
fn config_file_is_read_from_state_dir() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.yaml"),
        "log_store:\n  strategy: memory\n",
    )
    .unwrap();
    sdlcai(&dir, None)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("memory"));
}

#[test]
fn config_init_writes_effective_config() {
    let dir = TempDir::new().unwrap();
    sdlcai(&dir, None)
        .args(["--base-url", "https://api.example.com/v2", "config", "init"])
        .assert()
        .success();
    let written = std::fs::read_to_string(dir.path().join("config.yaml")).unwrap();
    assert!(written.contains("https://api.example.com/v2"));

    sdlcai(&dir, None)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    sdlcai(&dir, None)
        .env_remove("SDLCAI_BASE_URL")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://api.example.com/v2"));
}

// ---------------------------------------------------------------------------
// sdlcai project
// ---------------------------------------------------------------------------

#[test]
fn project_create_rejects_blank_name() {
    let dir = TempDir::new().unwrap();
    sdlcai(&dir, None)
        .args(["project", "create", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("project name is required"));
}

#[test]
fn project_create_posts_trimmed_fields() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let create = server
        .mock("POST", "/api/v1/projects/")
        .match_body(Matcher::PartialJson(serde_json::json!({"name": "Payments"})))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":9,"name":"Payments"}"#)
        .create();

    sdlcai(&dir, Some(&server))
        .args(["project", "create", "  Payments  "])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created project Payments (9)"));
    create.assert();
}

#[test]
fn project_list_shows_stats() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    mock_projects(&mut server, TWO_PROJECTS);
    server
        .mock("GET", "/api/v1/projects/1/history")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"activity_log":[
                {"id":"a","tool":"Risk Scanner","tool_id":"risk","created_at":"2024-06-01T09:00:00Z"},
                {"id":"b","tool":"Risk Scanner","tool_id":"risk","created_at":"2024-06-02T09:00:00Z"}
            ]}"#,
        )
        .create();
    server
        .mock("GET", "/api/v1/projects/2/history")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"activity_log":[]}"#)
        .create();

    let output = sdlcai(&dir, Some(&server))
        .args(["--json", "project", "list"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let items: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 2);
    // Newest (highest id) first.
    assert_eq!(items[0]["project"]["name"], "Search");
    assert_eq!(items[1]["stats"]["activity_count"], 2);
    assert_eq!(items[1]["stats"]["unique_tools"], 1);
}

#[test]
fn project_list_survives_failed_history() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    mock_projects(&mut server, TWO_PROJECTS);
    server
        .mock("GET", "/api/v1/projects/1/history")
        .with_status(500)
        .with_body(r#"{"detail":"boom"}"#)
        .create();
    server
        .mock("GET", "/api/v1/projects/2/history")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"activity_log":[]}"#)
        .create();

    sdlcai(&dir, Some(&server))
        .args(["project", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Payments"))
        .stdout(predicate::str::contains("Search"));
}

#[test]
fn project_list_reports_server_error() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/api/v1/projects/")
        .with_status(503)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail":"maintenance"}"#)
        .create();

    sdlcai(&dir, Some(&server))
        .args(["project", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load projects"))
        .stderr(predicate::str::contains("maintenance"));
}

#[test]
fn project_search_filters_by_name() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    mock_projects(&mut server, TWO_PROJECTS);
    mock_empty_histories(&mut server);

    sdlcai(&dir, Some(&server))
        .args(["project", "list", "--search", "pay"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Payments"))
        .stdout(predicate::str::contains("Search").not());
}

#[test]
fn project_delete_requires_yes() {
    let dir = TempDir::new().unwrap();
    sdlcai(&dir, None)
        .args(["project", "delete", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
}

#[test]
fn project_delete_purges_local_logs_and_selection() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("logs")).unwrap();
    std::fs::write(dir.path().join("logs/i-1.json"), "[]").unwrap();
    std::fs::write(dir.path().join("selected_project"), "1").unwrap();

    let mut server = mockito::Server::new();
    let delete = server
        .mock("DELETE", "/api/v1/projects/1")
        .with_status(204)
        .create();

    sdlcai(&dir, Some(&server))
        .args(["project", "delete", "1", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted project 1"));
    delete.assert();
    assert!(!dir.path().join("logs/i-1.json").exists());
    assert!(!dir.path().join("selected_project").exists());
}

#[test]
fn project_delete_failure_keeps_local_logs() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("logs")).unwrap();
    std::fs::write(dir.path().join("logs/i-1.json"), "[]").unwrap();

    let mut server = mockito::Server::new();
    server
        .mock("DELETE", "/api/v1/projects/1")
        .with_status(403)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail":"not allowed"}"#)
        .create();

    sdlcai(&dir, Some(&server))
        .args(["project", "delete", "1", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not allowed"));
    assert!(dir.path().join("logs/i-1.json").exists());
}

#[test]
fn project_select_persists_pointer() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    mock_projects(&mut server, TWO_PROJECTS);
    mock_empty_histories(&mut server);

    sdlcai(&dir, Some(&server))
        .args(["project", "select", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Selected project Search"));
    let pointer = std::fs::read_to_string(dir.path().join("selected_project")).unwrap();
    assert_eq!(pointer.trim(), "2");
}

#[test]
fn numeric_string_id_round_trips_through_selection() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    mock_projects(
        &mut server,
        r#"{"projects":[{"id":"7","name":"Seven"},{"id":1,"name":"Payments"}]}"#,
    );
    mock_empty_histories(&mut server);

    sdlcai(&dir, Some(&server))
        .args(["project", "select", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Selected project Seven"));
    let pointer = std::fs::read_to_string(dir.path().join("selected_project")).unwrap();
    assert_eq!(pointer.trim(), r#""7""#);

    sdlcai(&dir, Some(&server))
        .args(["project", "show", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Project: Seven (7)"))
        .stdout(predicate::str::contains("Selected: yes"));
    assert!(dir.path().join("selected_project").exists());
}

#[test]
fn project_select_unknown_id_fails() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    mock_projects(&mut server, TWO_PROJECTS);
    mock_empty_histories(&mut server);

    sdlcai(&dir, Some(&server))
        .args(["project", "select", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("project not found: 42"));
    assert!(!dir.path().join("selected_project").exists());
}

#[test]
fn stale_pointer_is_cleared_on_load() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("selected_project"), "77").unwrap();
    let mut server = mockito::Server::new();
    mock_projects(&mut server, TWO_PROJECTS);
    mock_empty_histories(&mut server);

    sdlcai(&dir, Some(&server))
        .args(["project", "list"])
        .assert()
        .success();
    assert!(!dir.path().join("selected_project").exists());
}

#[test]
fn project_deselect_clears_pointer() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("selected_project"), "1").unwrap();
    sdlcai(&dir, None)
        .args(["project", "deselect"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sandbox mode"));
    assert!(!dir.path().join("selected_project").exists());
}

#[test]
fn project_show_lists_logs() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    mock_projects(&mut server, TWO_PROJECTS);
    server
        .mock("GET", "/api/v1/projects/1/history")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"activity_log":[{"id":"a","tool":"Smart Debugger","tool_id":"debug",
                "input":"stack trace here","created_at":"2024-06-01T09:00:00Z"}]}"#,
        )
        .create();
    server
        .mock("GET", "/api/v1/projects/2/history")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"activity_log":[]}"#)
        .create();

    sdlcai(&dir, Some(&server))
        .args(["project", "show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Project: Payments (1)"))
        .stdout(predicate::str::contains("Smart Debugger"))
        .stdout(predicate::str::contains("stack trace here"));
}

// ---------------------------------------------------------------------------
// sdlcai feed
// ---------------------------------------------------------------------------

#[test]
fn feed_is_newest_first_and_limited() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    mock_projects(&mut server, TWO_PROJECTS);
    server
        .mock("GET", "/api/v1/projects/1/history")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"activity_log":[{"id":"old","tool_id":"risk","created_at":"2024-06-01T09:00:00Z"}]}"#,
        )
        .create();
    server
        .mock("GET", "/api/v1/projects/2/history")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"activity_log":[{"id":"new","tool_id":"design","created_at":"2024-06-03T09:00:00Z"}]}"#,
        )
        .create();

    let output = sdlcai(&dir, Some(&server))
        .args(["--json", "feed", "--limit", "1"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], "new");
    assert_eq!(entries[0]["project_name"], "Search");
}

// ---------------------------------------------------------------------------
// sdlcai tool run
// ---------------------------------------------------------------------------

fn mock_design_tool(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", "/api/v1/design/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"architecture":"three tiers"}"#)
        .create()
}

#[test]
fn tool_run_in_sandbox_is_not_recorded() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.json");
    std::fs::write(&input, r#"{"requirements":"a shop"}"#).unwrap();
    let mut server = mockito::Server::new();
    mock_projects(&mut server, TWO_PROJECTS);
    mock_empty_histories(&mut server);
    mock_design_tool(&mut server);

    sdlcai(&dir, Some(&server))
        .args(["tool", "run", "design", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("three tiers"))
        .stderr(predicate::str::contains("Sandbox mode"));
    assert!(!dir.path().join("logs").exists());
}

#[test]
fn tool_run_records_under_selected_project() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("selected_project"), "1").unwrap();
    let mut server = mockito::Server::new();
    mock_projects(&mut server, TWO_PROJECTS);
    mock_empty_histories(&mut server);
    mock_design_tool(&mut server);

    sdlcai(&dir, Some(&server))
        .args(["tool", "run", "design", "--input", "-"])
        .write_stdin(r#"{"requirements":"a shop"}"#)
        .assert()
        .success()
        .stderr(predicate::str::contains("Recorded under project Payments"));

    let raw = std::fs::read_to_string(dir.path().join("logs/i-1.json")).unwrap();
    let logs: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let logs = logs.as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["tool_id"], "design");
    assert_eq!(logs[0]["tool"], "Architecture Generator");
    assert_eq!(logs[0]["input"]["requirements"], "a shop");
    assert_eq!(logs[0]["output"]["architecture"], "three tiers");
}

#[test]
fn tool_run_rejects_unknown_tool() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.json");
    std::fs::write(&input, "{}").unwrap();
    sdlcai(&dir, None)
        .args(["tool", "run", "astrology", "--input"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown tool 'astrology'"));
}

#[test]
fn tool_run_rejects_invalid_json_input() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.json");
    std::fs::write(&input, "not json").unwrap();
    sdlcai(&dir, None)
        .args(["tool", "run", "design", "--input"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not valid JSON"));
}
