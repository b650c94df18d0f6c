//! Builder scenarios against real processes
#![cfg(unix)]

use kiln_build::{select_builder, Builder, CodeBuilder, CommandToolchain, Platform, Toolchain};
use kiln_core::{KilnError, TemplateEngine};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_secs(20);

fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("kiln_build_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn shell_builder(dir: &Path, script: &str) -> CodeBuilder {
    let toolchain = CommandToolchain::new("sh")
        .with_version_args(["-c", "echo sh 1.0"])
        .with_build_args(["-c", script]);
    CodeBuilder::new("Hero Quest", Platform::Desktop, dir.join("project"), Arc::new(toolchain))
}

#[test]
fn exit_code_is_delivered_once() {
    let dir = temp_dir();
    let builder = shell_builder(&dir, "exit 3");
    let rx = builder.subscribe();

    assert!(builder.build_project());
    let result = rx.recv_timeout(WAIT).unwrap();
    assert_eq!(result.exit_code, 3);
    assert_eq!(result.artifact, builder.artifact());
    assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());
    assert!(!builder.is_building());
    assert!(builder.is_outdated());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn second_build_while_running_is_rejected() {
    let dir = temp_dir();
    let builder = shell_builder(&dir, "sleep 1");
    let rx = builder.subscribe();

    assert!(builder.build_project());
    assert!(builder.is_building());
    assert!(!builder.build_project());

    let result = rx.recv_timeout(WAIT).unwrap();
    assert!(result.success());
    assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());

    // Once finished the instance accepts a new build
    assert!(builder.build_project());
    assert!(rx.recv_timeout(WAIT).unwrap().success());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn unstartable_toolchain_reports_through_event() {
    let dir = temp_dir();
    let toolchain = CommandToolchain::new("kiln-no-such-toolchain");
    let builder = CodeBuilder::new("hero", Platform::Web, dir.join("project"), Arc::new(toolchain));
    let rx = builder.subscribe();

    assert_eq!(builder.builder_version(), "");
    assert!(builder.build_project());
    assert_eq!(rx.recv_timeout(WAIT).unwrap().exit_code, -1);
    assert!(!builder.is_building());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn templates_and_values_reach_the_build() {
    let dir = temp_dir();
    let template = dir.join("project.tpl");
    fs::write(&template, "name=${projectName}\nid=${idName}\n").unwrap();

    let mut builder = shell_builder(&dir, "grep -q 'id=heroquest' project.cfg && echo ${idName} > built.txt");
    builder.add_template(&template, "project.cfg");
    let rx = builder.subscribe();

    assert!(builder.build_project());
    let result = rx.recv_timeout(WAIT).unwrap();
    assert_eq!(result.exit_code, 0);
    assert!(!builder.is_outdated());

    assert_eq!(
        fs::read_to_string(dir.join("project/project.cfg")).unwrap(),
        "name=Hero Quest\nid=heroquest\n"
    );
    assert_eq!(
        fs::read_to_string(dir.join("project/built.txt")).unwrap().trim(),
        "heroquest"
    );

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn rescan_after_success_marks_outdated_again() {
    let dir = temp_dir();
    let src = dir.join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("a.cpp"), "").unwrap();

    let mut builder = shell_builder(&dir, "exit 0");
    builder.rescan_sources(&src);
    let rx = builder.subscribe();
    assert!(builder.build_project());
    assert!(rx.recv_timeout(WAIT).unwrap().success());
    assert!(!builder.is_outdated());

    builder.rescan_sources(&src);
    assert!(!builder.is_outdated());

    fs::write(src.join("b.cpp"), "").unwrap();
    assert_eq!(builder.rescan_sources(&src).len(), 2);
    assert!(builder.is_outdated());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn builder_init_runs_setup_once() {
    let dir = temp_dir();
    let log = dir.join("setup.log");
    let toolchain = CommandToolchain::new("sh")
        .with_setup_args(["-c".to_string(), format!("echo setup >> '{}'", log.display())])
        .with_build_args(["-c", "exit 0"]);
    let builder = CodeBuilder::new("hero", Platform::Desktop, dir.join("project"), Arc::new(toolchain));

    builder.builder_init().unwrap();
    builder.builder_init().unwrap();
    let rx = builder.subscribe();
    assert!(builder.build_project());
    rx.recv_timeout(WAIT).unwrap();

    assert_eq!(fs::read_to_string(&log).unwrap(), "setup\n");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn select_builder_skips_unavailable_toolchains() {
    let dir = temp_dir();
    let missing = CodeBuilder::new(
        "hero",
        Platform::Desktop,
        dir.join("a"),
        Arc::new(CommandToolchain::new("kiln-no-such-toolchain")),
    );
    let available = shell_builder(&dir, "exit 0");

    let chosen = select_builder(vec![Box::new(missing), Box::new(available)]).unwrap();
    assert_eq!(chosen.builder_version(), "sh 1.0");
    assert_eq!(chosen.project(), dir.join("project"));

    fs::remove_dir_all(&dir).ok();
}

/// Starts a short real build the first time, then refuses to start
struct OneShotToolchain {
    spawned: AtomicUsize,
}

impl Toolchain for OneShotToolchain {
    fn name(&self) -> &str {
        "one-shot"
    }

    fn version(&self) -> Option<String> {
        Some("one-shot 1".to_string())
    }

    fn setup(&self) -> kiln_core::Result<()> {
        Ok(())
    }

    fn spawn_build(&self, project_dir: &Path, _values: &TemplateEngine) -> kiln_core::Result<Child> {
        if self.spawned.fetch_add(1, Ordering::SeqCst) > 0 {
            return Err(KilnError::ToolchainUnavailable("one-shot already used".to_string()));
        }
        Command::new("sh")
            .args(["-c", "sleep 0.2; exit 0"])
            .current_dir(project_dir)
            .spawn()
            .map_err(KilnError::from)
    }
}

#[test]
fn back_to_back_builds_deliver_events_in_order() {
    let dir = temp_dir();
    let toolchain = OneShotToolchain {
        spawned: AtomicUsize::new(0),
    };
    let builder = CodeBuilder::new("hero", Platform::Desktop, dir.join("project"), Arc::new(toolchain));
    let rx = builder.subscribe();

    assert!(builder.build_project());
    // Start the next build the moment the first one lets go
    let deadline = Instant::now() + WAIT;
    while !builder.build_project() {
        assert!(Instant::now() < deadline, "first build never finished");
        std::hint::spin_loop();
    }

    assert_eq!(rx.recv_timeout(WAIT).unwrap().exit_code, 0);
    assert_eq!(rx.recv_timeout(WAIT).unwrap().exit_code, -1);
    assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());

    fs::remove_dir_all(&dir).ok();
}
