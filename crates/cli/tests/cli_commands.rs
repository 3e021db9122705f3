use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const SNAPSHOTS: &str = r#"{
  "teams": [
    {"id": "team-sqt", "createdAt": "2024-01-01T00:00:00Z", "key": "SQT", "name": "Squad"}
  ],
  "users": [
    {"id": "user-grace", "createdAt": "2024-02-01T00:00:00Z", "name": "Grace Hopper",
     "email": "grace@example.com", "role": "member"},
    {"id": "user-ada", "createdAt": "2024-01-01T00:00:00Z", "name": "Ada Lovelace",
     "displayName": "ada", "email": "ada@example.com", "role": "admin"}
  ],
  "states": [
    {"id": "state-todo", "createdAt": "2024-01-01T00:00:00Z", "name": "Todo",
     "type": "unstarted", "teamId": "team-sqt"}
  ],
  "projects": [
    {"id": "proj-1", "createdAt": "2024-01-03T00:00:00Z", "name": "Mobile App",
     "slug": "mobile-app-3f2a9c1b7d4e", "leadId": "user-ada", "state": "started"}
  ]
}"#;

fn setup() -> (TempDir, PathBuf) {
    let temp = tempdir().unwrap();
    let snapshots = temp.path().join("snapshots.json");
    fs::write(&snapshots, SNAPSHOTS).unwrap();
    fs::write(
        temp.path().join("compact-tracker.toml"),
        "workspace_key = \"acme\"\nworkspace_id = \"ws-1\"\n",
    )
    .unwrap();
    (temp, snapshots)
}

#[allow(deprecated)]
fn cli(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("compact-tracker").expect("binary");
    cmd.current_dir(workdir).arg("--quiet");
    cmd
}

#[test]
fn keys_prints_lookup_tables() {
    let (temp, snapshots) = setup();
    let expected = "\
_meta{workspace,ttl}:acme,1800
_users[2]{key,name,displayName,email,role}:
  u0,Ada Lovelace,ada,ada@example.com,admin
  u1,Grace Hopper,,grace@example.com,member
_states[1]{key,name,type}:
  s0,Todo,unstarted
_projects[1]{key,name,state,lead}:
  pr0,Mobile App,started,u0
_teams[1]{key,teamKey,name}:
  t0,SQT,Squad
";
    cli(temp.path())
        .arg("keys")
        .arg("--snapshots")
        .arg(&snapshots)
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn resolve_reports_partial_failures() {
    let (temp, snapshots) = setup();
    cli(temp.path())
        .args(["resolve", "--kind", "user", "--snapshots"])
        .arg(&snapshots)
        .args(["U1", "u7"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("U1 user-grace\n"))
        .stdout(predicate::str::contains(
            "failures[1]{index,kind,key,error,suggestions}:\n  1,user,u7,unknown key,u1 u0",
        ));
}

#[test]
fn resolve_fails_when_nothing_resolves() {
    let (temp, snapshots) = setup();
    cli(temp.path())
        .args(["resolve", "--kind", "teams", "--snapshots"])
        .arg(&snapshots)
        .arg("t4")
        .assert()
        .failure()
        .stdout(predicate::str::contains("0,team,t4,unknown key,t0"));
}

#[test]
fn resolve_accepts_team_key_alias() {
    let (temp, snapshots) = setup();
    cli(temp.path())
        .args(["resolve", "--kind", "team", "--snapshots"])
        .arg(&snapshots)
        .arg("sqt")
        .assert()
        .success()
        .stdout("sqt team-sqt\n");
}

#[test]
fn unknown_kind_is_a_usage_error() {
    let (temp, snapshots) = setup();
    cli(temp.path())
        .args(["resolve", "--kind", "cycle", "--snapshots"])
        .arg(&snapshots)
        .arg("c1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cycle"));
}

#[test]
fn encode_renders_document() {
    let temp = tempdir().unwrap();
    let document = temp.path().join("doc.json");
    fs::write(
        &document,
        r#"{
          "meta": {"fields": ["tool", "count"], "values": {"tool": "list_cycles", "count": 1}},
          "data": [{"schema": "cycles", "rows": [
            {"num": 4, "name": "Sprint, four", "start": "2024-05-01T00:00:00Z",
             "end": "2024-05-14T00:00:00Z", "progress": 0.5}
          ]}]
        }"#,
    )
    .unwrap();

    cli(temp.path())
        .arg("encode")
        .arg("--document")
        .arg(&document)
        .assert()
        .success()
        .stdout(
            "_meta{tool,count}:list_cycles,1\n\
             cycles[1]{num,name,start,end,progress}:\n  \
             c4,\"Sprint, four\",2024-05-01,2024-05-14,50%\n",
        );
}

#[test]
fn encode_rejects_rows_with_extra_fields() {
    let temp = tempdir().unwrap();
    let document = temp.path().join("doc.json");
    fs::write(
        &document,
        r#"{"lookups": [{"schema": "_teams", "rows": [{"key": "t0", "teamKey": "SQT", "name": "Squad", "color": "red"}]}]}"#,
    )
    .unwrap();

    cli(temp.path())
        .arg("encode")
        .arg("--document")
        .arg(&document)
        .assert()
        .failure()
        .stderr(predicate::str::contains("color"));
}

#[test]
fn link_and_strip_round_trip_through_files() {
    let (temp, snapshots) = setup();
    let input = temp.path().join("note.md");
    fs::write(&input, "See SQT-297 in pr0, not `SQT-1`.\n").unwrap();

    let linked = cli(temp.path())
        .arg("link")
        .arg("--snapshots")
        .arg(&snapshots)
        .arg("--text")
        .arg(&input)
        .assert()
        .success()
        .stdout(
            "See https://linear.app/acme/issue/SQT-297 in \
             https://linear.app/acme/project/mobile-app-3f2a9c1b7d4e, not `SQT-1`.\n",
        )
        .get_output()
        .stdout
        .clone();

    cli(temp.path())
        .arg("strip")
        .arg("--snapshots")
        .arg(&snapshots)
        .write_stdin(linked)
        .assert()
        .success()
        .stdout("See SQT-297 in pr0, not `SQT-1`.\n");
}

#[test]
fn host_flag_overrides_config() {
    let (temp, snapshots) = setup();
    cli(temp.path())
        .args(["--host", "tracker.example.com", "--workspace", "beta", "link"])
        .arg("--snapshots")
        .arg(&snapshots)
        .write_stdin("SQT-5")
        .assert()
        .success()
        .stdout("https://tracker.example.com/beta/issue/SQT-5\n");
}

#[test]
fn invalid_config_is_reported_with_path() {
    let (temp, snapshots) = setup();
    let config = temp.path().join("broken.toml");
    fs::write(&config, "url_host = 5\n").unwrap();

    cli(temp.path())
        .arg("--config")
        .arg(&config)
        .arg("keys")
        .arg("--snapshots")
        .arg(&snapshots)
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken.toml"));
}

#[test]
fn malformed_snapshots_name_the_entry() {
    let temp = tempdir().unwrap();
    let snapshots = temp.path().join("snapshots.json");
    fs::write(&snapshots, r#"{"users": [{"id": "u", "name": "No date"}]}"#).unwrap();

    cli(temp.path())
        .arg("keys")
        .arg("--snapshots")
        .arg(&snapshots)
        .assert()
        .failure()
        .stderr(predicate::str::contains("user snapshot at index 0"));
}
