// tests/build_adapters.rs

use std::error::Error;
use std::fs;

use chrono::{Local, TimeZone};
use tempfile::tempdir;

use buildwatch::build::{build_dir_name, CMakeBuild, MakeBuild, Project, COMMIT_MARKER};
use buildwatch::errors::BuildwatchError;
use buildwatch::types::BuildType;
use buildwatch_test_utils::builders::{
    ConfigFileBuilder, DaemonConfigBuilder, ProjectConfigBuilder,
};
use buildwatch_test_utils::{init_tracing, ScriptedRunner};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn build_dir_name_is_timestamped() {
    let at = Local.with_ymd_and_hms(2024, 5, 1, 13, 7, 42).unwrap();
    assert_eq!(build_dir_name(&at), "build2024-05-01-13:07:42");

    let next = Local.with_ymd_and_hms(2024, 5, 1, 13, 8, 42).unwrap();
    assert_ne!(build_dir_name(&at), build_dir_name(&next));
}

#[test]
fn prepare_writes_exact_commit_marker_and_is_idempotent() -> TestResult {
    let ws = tempdir()?;
    let build_dir = ws.path().join("build-1");
    let runner = ScriptedRunner::new();

    let build = CMakeBuild::new(&build_dir, ws.path(), runner.as_runner()).commit("abc123");
    build.prepare()?;
    assert_eq!(fs::read_to_string(build_dir.join(COMMIT_MARKER))?, "abc123");

    // Reusing an existing directory is fine.
    build.prepare()?;
    assert_eq!(fs::read_to_string(build_dir.join(COMMIT_MARKER))?, "abc123");
    Ok(())
}

#[test]
fn empty_commit_writes_no_marker() -> TestResult {
    let ws = tempdir()?;
    let build_dir = ws.path().join("build-1");
    let runner = ScriptedRunner::new();

    CMakeBuild::new(&build_dir, ws.path(), runner.as_runner()).prepare()?;
    assert!(build_dir.is_dir());
    assert!(!build_dir.join(COMMIT_MARKER).exists());
    Ok(())
}

#[tokio::test]
async fn cmake_commands_and_directories() -> TestResult {
    init_tracing();
    let ws = tempdir()?;
    let build_dir = ws.path().join("build-1");
    let runner = ScriptedRunner::new();

    let build = CMakeBuild::new(&build_dir, ws.path(), runner.as_runner())
        .build_type(BuildType::Debug)
        .flags(&["-DUSE_NEP=OFF".to_string()])
        .jobs(8)
        .privilege_prefix(&["sudo".to_string()]);
    build.prepare()?;
    build.configure().await?;
    build.compile().await?;
    build.install().await?;

    assert_eq!(
        runner.commands(),
        vec![
            format!("cmake -DUSE_NEP=OFF -DCMAKE_BUILD_TYPE=Debug {}", ws.path().display()),
            "make -j 8".to_string(),
            "sudo make install".to_string(),
        ]
    );
    assert!(runner.recorded().iter().all(|r| r.dir == build_dir));
    Ok(())
}

#[tokio::test]
async fn failed_install_surfaces_command_failed() -> TestResult {
    init_tracing();
    let ws = tempdir()?;
    let runner = ScriptedRunner::new();
    runner.fail("sudo make install", 1);

    let build = MakeBuild::new(ws.path(), 2, runner.as_runner())
        .privilege_prefix(&["sudo".to_string()]);
    build.compile().await?;
    let err = build.install().await.expect_err("install fails");
    assert!(
        matches!(err, BuildwatchError::CommandFailed { ref command, code: 1, .. } if command == "sudo make install"),
        "got {err:?}"
    );
    Ok(())
}

#[tokio::test]
async fn recipe_builds_dependencies_then_vendored_then_project() -> TestResult {
    init_tracing();
    let ws = tempdir()?;
    let cfg = ConfigFileBuilder::new(ws.path())
        .with_project(
            "common",
            ProjectConfigBuilder::new("HycStorCommon").jobs(7).install().build(),
        )
        .with_project(
            "tgt",
            ProjectConfigBuilder::new("tgt")
                .make()
                .vendored("thirdparty/ha-lib")
                .after("common")
                .build(),
        )
        .with_daemon("tgtd", DaemonConfigBuilder::new("tgt", "usr/tgtd").build())
        .build();

    let runner = ScriptedRunner::new();
    runner.respond("git rev-parse master", &["c0ffee"]);
    let project = Project::resolve(&cfg, "tgt", runner.as_runner())?;
    assert_eq!(project.deps().len(), 1);

    let output = project.build("build-x").await?;

    let tgt_dir = ws.path().join("tgt");
    let common_dir = ws.path().join("HycStorCommon");
    let halib_dir = tgt_dir.join("thirdparty/ha-lib");
    assert_eq!(output, tgt_dir);

    let recorded = runner.recorded();
    let steps: Vec<(String, std::path::PathBuf)> = recorded
        .into_iter()
        .map(|r| (r.command, r.dir))
        .collect();
    assert_eq!(
        steps,
        vec![
            ("git rev-parse master".to_string(), common_dir.clone()),
            (
                format!("cmake -DCMAKE_BUILD_TYPE=Release {}", common_dir.display()),
                common_dir.join("build-x"),
            ),
            ("make -j 7".to_string(), common_dir.join("build-x")),
            ("make install".to_string(), common_dir.join("build-x")),
            ("git rev-parse master".to_string(), tgt_dir.clone()),
            ("make -j 1".to_string(), halib_dir.join("third-party")),
            (
                format!("cmake -DCMAKE_BUILD_TYPE=Release {}", halib_dir.display()),
                halib_dir.join("build-x"),
            ),
            ("make -j 1".to_string(), halib_dir.join("build-x")),
            ("make install".to_string(), halib_dir.join("build-x")),
            ("make -j 1".to_string(), tgt_dir.clone()),
        ]
    );

    assert_eq!(
        fs::read_to_string(common_dir.join("build-x").join("commit"))?,
        "c0ffee"
    );
    Ok(())
}

#[tokio::test]
async fn recipe_change_detection_covers_dependencies() -> TestResult {
    init_tracing();
    let ws = tempdir()?;
    let cfg = ConfigFileBuilder::new(ws.path())
        .with_project("common", ProjectConfigBuilder::new("HycStorCommon").build())
        .with_project(
            "tgt",
            ProjectConfigBuilder::new("tgt").make().after("common").build(),
        )
        .with_daemon("tgtd", DaemonConfigBuilder::new("tgt", "usr/tgtd").build())
        .build();

    let runner = ScriptedRunner::new();
    // Both repositories answer the same scripted commands: first call is
    // tgt (up to date), second is common (behind).
    runner
        .respond_seq("git rev-parse master", &[&["aaa"], &["111"]])
        .respond_seq("git rev-parse origin/master", &[&["aaa"], &["222"]])
        .respond_seq("git merge-base", &[&["aaa"], &["111"]]);

    let project = Project::resolve(&cfg, "tgt", runner.as_runner())?;
    assert!(project.has_upstream_change().await?);

    let dirs: Vec<_> = runner
        .recorded()
        .into_iter()
        .filter(|r| r.command == "git remote update")
        .map(|r| r.dir)
        .collect();
    assert_eq!(dirs, vec![ws.path().join("tgt"), ws.path().join("HycStorCommon")]);
    Ok(())
}

#[tokio::test]
async fn clone_sources_visits_dependencies_first() -> TestResult {
    init_tracing();
    let ws = tempdir()?;
    let cfg = ConfigFileBuilder::new(ws.path())
        .with_project("common", ProjectConfigBuilder::new("HycStorCommon").build())
        .with_project(
            "tgt",
            ProjectConfigBuilder::new("tgt").make().after("common").build(),
        )
        .with_daemon("tgtd", DaemonConfigBuilder::new("tgt", "usr/tgtd").build())
        .build();

    let runner = ScriptedRunner::new();
    let project = Project::resolve(&cfg, "tgt", runner.as_runner())?;
    project.clone_sources().await?;

    let clones: Vec<_> = runner
        .commands()
        .into_iter()
        .filter(|c| c.starts_with("git clone") || c.starts_with("git checkout"))
        .collect();
    assert_eq!(
        clones,
        vec![
            "git clone git@github.com:acme/HycStorCommon.git",
            "git checkout master",
            "git clone git@github.com:acme/tgt.git",
            "git checkout master",
        ]
    );
    Ok(())
}
