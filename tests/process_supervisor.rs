// tests/process_supervisor.rs

use std::error::Error;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::Duration;

use nix::unistd::{geteuid, getpgid, Pid};
use tempfile::tempdir;

use buildwatch::errors::BuildwatchError;
use buildwatch::exec::{ensure_executable, ManagedProcess, StopPolicy, NOT_RUNNING_PID};
use buildwatch_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn fast_stop() -> StopPolicy {
    StopPolicy {
        poll_interval: Duration::from_millis(100),
        max_checks: 5,
    }
}

fn sleep_args() -> Vec<String> {
    vec!["30".to_string()]
}

#[tokio::test]
async fn pid_before_start_is_sentinel() {
    init_tracing();
    let mut process = ManagedProcess::new("idle");
    assert!(!process.is_running());
    assert_eq!(process.pid(), NOT_RUNNING_PID);
    assert_eq!(process.pid(), -1);
}

#[tokio::test]
async fn start_then_stop_within_bound() -> TestResult {
    init_tracing();
    let mut process = ManagedProcess::new("sleeper").with_stop_policy(fast_stop());

    process.start(Path::new("/bin/sleep"), &sleep_args())?;
    assert!(process.is_running());
    assert!(process.pid() > 0);

    with_timeout(process.stop()).await?;
    assert!(!process.is_running());
    assert_eq!(process.pid(), NOT_RUNNING_PID);
    Ok(())
}

#[tokio::test]
async fn second_start_while_running_is_already_running() -> TestResult {
    init_tracing();
    let mut process = ManagedProcess::new("sleeper").with_stop_policy(fast_stop());
    process.start(Path::new("/bin/sleep"), &sleep_args())?;
    let pid = process.pid();

    let err = process
        .start(Path::new("/bin/sleep"), &sleep_args())
        .expect_err("second start must fail");
    match err {
        BuildwatchError::AlreadyRunning { label, pid: reported } => {
            assert_eq!(label, "sleeper");
            assert_eq!(reported, pid);
        }
        other => panic!("expected AlreadyRunning, got {other:?}"),
    }

    // The first child is untouched.
    assert_eq!(process.pid(), pid);
    with_timeout(process.stop()).await?;
    Ok(())
}

#[tokio::test]
async fn restart_after_stop_is_allowed() -> TestResult {
    init_tracing();
    let mut process = ManagedProcess::new("sleeper").with_stop_policy(fast_stop());

    process.start(Path::new("/bin/sleep"), &sleep_args())?;
    with_timeout(process.stop()).await?;

    process.start(Path::new("/bin/sleep"), &sleep_args())?;
    assert!(process.is_running());
    with_timeout(process.stop()).await?;
    Ok(())
}

#[tokio::test]
async fn non_executable_file_is_rejected_without_spawning() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let path = dir.path().join("not-exec.sh");
    fs::write(&path, "#!/bin/sh\nsleep 30\n")?;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644))?;

    let mut process = ManagedProcess::new("plain");
    let err = process.start(&path, &[]).expect_err("must not start");
    assert!(matches!(err, BuildwatchError::NotExecutable(ref p) if p == &path), "got {err:?}");
    assert!(!process.is_running());
    assert_eq!(process.pid(), NOT_RUNNING_PID);
    Ok(())
}

#[tokio::test]
async fn missing_path_and_directory_are_not_executable() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let mut process = ManagedProcess::new("nothing");

    let missing = dir.path().join("missing");
    assert!(matches!(
        process.start(&missing, &[]),
        Err(BuildwatchError::NotExecutable(_))
    ));
    assert!(matches!(
        process.start(dir.path(), &[]),
        Err(BuildwatchError::NotExecutable(_))
    ));
    Ok(())
}

#[tokio::test]
async fn stop_when_not_running_is_a_noop() -> TestResult {
    init_tracing();
    let mut process = ManagedProcess::new("never-started");
    process.stop().await?;
    Ok(())
}

#[tokio::test]
async fn process_ignoring_sigterm_times_out() -> TestResult {
    init_tracing();
    let mut process = ManagedProcess::new("stubborn").with_stop_policy(fast_stop());
    let args = vec![
        "-c".to_string(),
        "trap '' TERM; while true; do sleep 1; done".to_string(),
    ];
    process.start(Path::new("/bin/sh"), &args)?;
    // Let the shell install its trap.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let err = with_timeout(process.stop())
        .await
        .expect_err("SIGTERM is ignored");
    match err {
        BuildwatchError::StopTimeout { label, checks, .. } => {
            assert_eq!(label, "stubborn");
            assert_eq!(checks, 5);
        }
        other => panic!("expected StopTimeout, got {other:?}"),
    }
    assert!(process.is_running(), "no escalation after StopTimeout");

    process.kill().await?;
    assert!(!process.is_running());
    Ok(())
}

#[tokio::test]
async fn crashed_process_is_reported_not_running() -> TestResult {
    init_tracing();
    let mut process = ManagedProcess::new("short");
    process.start(Path::new("/bin/sh"), &["-c".to_string(), "exit 7".to_string()])?;

    with_timeout(async {
        while process.is_running() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert_eq!(process.pid(), NOT_RUNNING_PID);
    Ok(())
}

#[tokio::test]
async fn daemon_leads_its_own_process_group() -> TestResult {
    init_tracing();
    let mut process = ManagedProcess::new("grouped").with_stop_policy(fast_stop());
    process.start(Path::new("/bin/sleep"), &sleep_args())?;

    let pid = Pid::from_raw(process.pid());
    assert_eq!(getpgid(Some(pid))?, pid);
    assert_ne!(getpgid(None)?, pid, "not in the supervisor's group");

    with_timeout(process.stop()).await?;
    Ok(())
}

#[tokio::test]
async fn execute_bit_for_other_users_only_is_not_executable() -> TestResult {
    init_tracing();
    // Root may execute any file with some execute bit, so the owner-only
    // check is only observable for ordinary users.
    if geteuid().is_root() {
        return Ok(());
    }

    let dir = tempdir()?;
    let path = dir.path().join("others-only");
    fs::write(&path, "#!/bin/sh\nexit 0\n")?;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o001))?;

    assert!(matches!(
        ensure_executable(&path),
        Err(BuildwatchError::NotExecutable(_))
    ));
    let mut process = ManagedProcess::new("others-only");
    assert!(matches!(
        process.start(&path, &[]),
        Err(BuildwatchError::NotExecutable(_))
    ));
    Ok(())
}

#[test]
fn owner_executable_file_passes() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("mine");
    fs::write(&path, "#!/bin/sh\nexit 0\n")?;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o700))?;

    ensure_executable(&path)?;
    Ok(())
}
