//! Runs the `peony` binary against a throwaway database and config directory.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("peony").unwrap();
        cmd.env("PEONY_DB_PATH", self.dir.path().join("data").join("peony.db"))
            .env("XDG_CONFIG_HOME", self.dir.path().join("config"))
            .env("HOME", self.dir.path())
            .env_remove("VISUAL")
            .env_remove("EDITOR")
            .env_remove("RUST_LOG");
        cmd
    }

    fn peony(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.cmd().args(args).assert()
    }

    /// Thoughts become eligible the moment they are captured.
    fn without_settling(self) -> Self {
        self.peony(&["config", "set-settle", "0s"]).success();
        self
    }
}

#[test]
fn add_then_list() {
    let sb = Sandbox::new();
    sb.peony(&["add", "buy", "milk"])
        .success()
        .stdout("Saved as #1\n");
    sb.peony(&["a", "call mum"]).success().stdout("Saved as #2\n");

    sb.peony(&["view"])
        .success()
        .stdout(predicate::str::contains("Page 1"))
        .stdout(predicate::str::contains("buy milk"))
        .stdout(predicate::str::contains("call mum"));
}

#[test]
fn add_reads_stdin_when_no_content() {
    let sb = Sandbox::new();
    sb.cmd()
        .arg("add")
        .write_stdin("from stdin\n")
        .assert()
        .success()
        .stdout("Saved as #1\n");
    sb.peony(&["view", "1"])
        .success()
        .stdout(predicate::str::contains("CONTENT\nfrom stdin"));
}

#[test]
fn add_empty_is_a_validation_error() {
    let sb = Sandbox::new();
    sb.cmd()
        .arg("add")
        .write_stdin("   \n")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("content is empty"));
}

#[test]
fn view_one_thought_shows_history() {
    let sb = Sandbox::new();
    sb.peony(&["add", "buy milk"]).success();
    sb.peony(&["view", "1"])
        .success()
        .stdout(predicate::str::starts_with("#1  captured  (tends: 0)"))
        .stdout(predicate::str::contains("Eligible: in 17h"))
        .stdout(predicate::str::contains("EVENTS"))
        .stdout(predicate::str::contains("captured captured"));
}

#[test]
fn view_errors_map_to_exit_codes() {
    let sb = Sandbox::new();
    sb.peony(&["view", "99"])
        .code(3)
        .stderr(predicate::str::contains("thought 99 not found"));
    sb.peony(&["view", "--state", "dozing"]).code(2);
    sb.peony(&["view", "--page", "0"]).code(2);
}

#[test]
fn view_filters_by_state() {
    let sb = Sandbox::new();
    sb.peony(&["add", "one"]).success();
    sb.peony(&["view", "--state", "captured", "--format", "json"])
        .success()
        .stdout(predicate::str::contains("\"content\": \"one\""));
    sb.peony(&["view", "--state", "archived"])
        .success()
        .stdout("No thoughts yet.\n");
}

#[test]
fn fresh_thought_is_not_ready_to_tend() {
    let sb = Sandbox::new();
    sb.peony(&["add", "too soon"]).success();
    sb.peony(&["tend"])
        .success()
        .stdout("Nothing is ready to tend.\n");
    sb.peony(&["tend", "1", "--no-edit", "--yes", "--resolve", "rest"])
        .code(3)
        .stderr(predicate::str::contains("not ready to tend"));
}

#[test]
fn tend_non_interactively() {
    let sb = Sandbox::new().without_settling();
    sb.peony(&["add", "ship it"]).success();
    sb.peony(&["tend"])
        .success()
        .stdout(predicate::str::contains("ship it"));

    sb.peony(&[
        "tend", "1", "--no-edit", "--yes", "--resolve", "archive", "--note", "done",
    ])
    .success()
    .stdout(predicate::str::contains("now archived"));

    sb.peony(&["view", "1", "--format", "json"])
        .success()
        .stdout(predicate::str::contains("\"current_state\": \"archived\""))
        .stdout(predicate::str::contains("\"tend_counter\": 1"))
        .stdout(predicate::str::contains("\"note\": \"done\""));

    // archived thoughts never come back
    sb.peony(&["tend", "1", "--no-edit", "--yes", "--resolve", "rest"])
        .code(3);
}

#[test]
fn tend_with_prompts() {
    let sb = Sandbox::new().without_settling();
    sb.peony(&["add", "let it rest"]).success();

    sb.cmd()
        .args(["tend", "1", "--no-edit"])
        .write_stdin("y\ny\nrest\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("now resting"));

    sb.peony(&["view", "1"])
        .success()
        .stdout(predicate::str::contains("#1  resting  (tends: 1)"))
        .stdout(predicate::str::contains("state_change tended \u{2192} resting"));
}

#[test]
fn declining_changes_saves_nothing() {
    let sb = Sandbox::new().without_settling();
    sb.peony(&["add", "maybe later"]).success();

    sb.cmd()
        .args(["tend", "1", "--no-edit"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Nothing saved."));

    sb.peony(&["view", "1"])
        .success()
        .stdout(predicate::str::contains("#1  captured  (tends: 0)"));
}

#[test]
fn stats_counts_states() {
    let sb = Sandbox::new().without_settling();
    sb.peony(&["add", "a"]).success();
    sb.peony(&["add", "b"]).success();
    sb.peony(&["tend", "2", "--no-edit", "--yes", "--resolve", "release"])
        .success();

    sb.peony(&["stats", "--format", "json"])
        .success()
        .stdout(predicate::str::contains("\"total\": 2"))
        .stdout(predicate::str::contains("\"released\": 1"))
        .stdout(predicate::str::contains("\"captured\": 1"));
}

#[test]
fn config_round_trip() {
    let sb = Sandbox::new();
    sb.peony(&["config", "show"])
        .success()
        .stdout(predicate::str::contains("Settle duration: 18h"));

    sb.peony(&["config", "set-settle", "1h30m"])
        .success()
        .stdout("Settle duration set to 1h30m.\n");
    sb.peony(&["config", "set-editor", "nvim"]).success();

    sb.peony(&["config", "show", "--format", "json"])
        .success()
        .stdout(predicate::str::contains("\"settleDuration\": \"1h30m\""))
        .stdout(predicate::str::contains("\"editor\": \"nvim\""));

    sb.peony(&["config", "set-settle", "soon"]).code(2);
    sb.peony(&["config", "set-settle", "-5h"]).failure();
    sb.peony(&["config", "set-settle", "20000000w"]).code(2);

    sb.peony(&["config", "set-settle", "2.5h"])
        .success()
        .stdout("Settle duration set to 2h30m.\n");
    sb.peony(&["add", "still works"]).success();
}

#[test]
fn purge_and_reindex_need_confirmation() {
    let sb = Sandbox::new();
    for text in ["a", "b", "c"] {
        sb.peony(&["add", text]).success();
    }

    sb.peony(&["purge", "2"])
        .success()
        .stderr(predicate::str::contains("Use --yes"));
    sb.peony(&["view", "2"]).success();

    sb.peony(&["purge", "2", "--yes"])
        .success()
        .stdout(predicate::str::contains("Purged #2 and 1 event(s)."));
    sb.peony(&["view", "2"]).code(3);

    sb.peony(&["reindex"])
        .success()
        .stderr(predicate::str::contains("Use --yes"));
    sb.peony(&["view", "3"]).success();

    sb.peony(&["reindex", "--yes"])
        .success()
        .stderr(predicate::str::contains("Renumbered 1 of 2"));
    sb.peony(&["view", "2"])
        .success()
        .stdout(predicate::str::contains("CONTENT\nc"));
    sb.peony(&["add", "d"]).success().stdout("Saved as #3\n");
}

#[test]
fn version_prints_crate_version() {
    let sb = Sandbox::new();
    sb.peony(&["version"])
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
