mod common;

use assert_cmd::Command;
use common::{page_labels, write_pdf};
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A project laid out as `<root>/resources/config.yaml`.
struct Project {
    root: TempDir,
}

impl Project {
    fn new(config: &str) -> Self {
        let root = tempfile::tempdir().expect("temp project");
        fs::create_dir_all(root.path().join("resources")).unwrap();
        fs::write(root.path().join("resources").join("config.yaml"), config).unwrap();
        Self { root }
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.root.path().join(relative)
    }

    fn config(&self) -> PathBuf {
        self.path("resources/config.yaml")
    }

    fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("pdf-extractor").expect("binary exists");
        cmd.current_dir(self.root.path())
            .env_remove("RUST_LOG")
            .arg("--yaml")
            .arg(self.config());
        cmd
    }
}

#[test]
fn missing_input_is_reported_and_exits_cleanly() {
    let project = Project::new("file: input/absent.pdf\noutput: plan.pdf\npages:\n  - pageIndex: 1\n");

    project
        .command()
        .assert()
        .success()
        .stderr(predicate::str::contains("not found").and(predicate::str::contains("absent.pdf")));

    assert!(!project.path("plan_rust.pdf").exists());
}

#[test]
fn malformed_config_exits_with_error() {
    let project = Project::new("pages: [\n  - pageIndex: 1\n");

    project
        .command()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse config file"))
        .stderr(predicate::str::contains("Run failed"));
}

#[test]
fn missing_config_exits_with_error() {
    let project = Project::new("");

    Command::cargo_bin("pdf-extractor")
        .unwrap()
        .arg("-y")
        .arg(project.path("resources/nope.yaml"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn unknown_flag_exits_with_one() {
    Command::cargo_bin("pdf-extractor")
        .unwrap()
        .arg("--no-such-flag")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_exits_with_zero() {
    Command::cargo_bin("pdf-extractor")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--markdown"));
}

/// With no pages and no markdown the run succeeds without writing a file.
#[test]
fn nothing_selected_writes_no_output() {
    let project = Project::new("file: plan.pdf\noutput: plan.pdf\npages:\n  - name: empty entry\n");
    write_pdf(&project.path("plan.pdf"), &["Page 1"]);

    project
        .command()
        .arg("--pdftk")
        .arg("/nonexistent/pdftk")
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved to:"));

    assert!(!project.path("plan_rust.pdf").exists());
}

#[test]
fn selected_pages_are_written_to_tagged_output() {
    let project = Project::new(
        r#"
file: input/plan.pdf
output: plan.pdf
pages:
  - name: Tuesday
    pageIndex: 3
  - name: Monday
    page: 1
  - name: Tuesday again
    pageNumber: 3
"#,
    );
    fs::create_dir_all(project.path("input")).unwrap();
    write_pdf(&project.path("input/plan.pdf"), &["Page 1", "Page 2", "Page 3"]);

    project
        .command()
        .args(["--toolkit", "native"])
        .assert()
        .success()
        .stdout(predicate::str::contains("plan_rust.pdf"));

    assert_eq!(page_labels(&project.path("plan_rust.pdf")), vec!["Page 3", "Page 1"]);
}

#[test]
fn input_next_to_config_is_found() {
    let project = Project::new("file: plan.pdf\noutput: plan.pdf\npages:\n  - pageIndex: 2\n");
    write_pdf(&project.path("resources/plan.pdf"), &["Page 1", "Page 2"]);

    project
        .command()
        .args(["--toolkit", "native"])
        .assert()
        .success();

    assert_eq!(page_labels(&project.path("plan_rust.pdf")), vec!["Page 2"]);
}

#[test]
fn cli_output_override_is_used_verbatim() {
    let project = Project::new("file: plan.pdf\noutput: plan.pdf\npages:\n  - pageIndex: 1\n");
    write_pdf(&project.path("plan.pdf"), &["Page 1", "Page 2"]);
    let output = project.path("custom.pdf");

    project
        .command()
        .args(["--toolkit", "native", "-o"])
        .arg(&output)
        .assert()
        .success();

    assert_eq!(page_labels(&output), vec!["Page 1"]);
    assert!(!project.path("plan_rust.pdf").exists());
}

#[test]
fn missing_pdftk_is_a_fatal_error() {
    let project = Project::new("file: plan.pdf\noutput: plan.pdf\npages:\n  - pageIndex: 1\n");
    write_pdf(&project.path("plan.pdf"), &["Page 1"]);

    project
        .command()
        .arg("--pdftk")
        .arg("/nonexistent/pdftk")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("/nonexistent/pdftk"));

    assert!(!project.path("plan_rust.pdf").exists());
}

#[cfg(unix)]
#[test]
fn failing_render_script_is_a_fatal_error() {
    let project = Project::new(
        "file: plan.pdf\noutput: plan.pdf\nappendFirstPage: intro.md\npages:\n  - pageIndex: 1\n",
    );
    write_pdf(&project.path("plan.pdf"), &["Page 1"]);
    fs::write(project.path("resources/intro.md"), "# Intro\n").unwrap();

    project
        .command()
        .args(["--node", "false", "--toolkit", "native"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Markdown rendering failed"));

    assert!(!project.path("plan_rust.pdf").exists());
}

#[cfg(unix)]
#[test]
fn empty_paths_count_as_not_given() {
    let project = Project::new(
        "file: plan.pdf\noutput: plan.pdf\nappendFirstPage: \"\"\npages:\n  - pageIndex: 2\n",
    );
    write_pdf(&project.path("plan.pdf"), &["Page 1", "Page 2"]);

    // `false` as the interpreter fails any render attempt
    project
        .command()
        .args(["--node", "false", "--toolkit", "native", "-i", "", "-m", ""])
        .assert()
        .success()
        .stdout(predicate::str::contains("plan_rust.pdf"));

    assert_eq!(page_labels(&project.path("plan_rust.pdf")), vec!["Page 2"]);
}
