// tests/logging_filter.rs

use buildwatch::cli::LogLevel;
use buildwatch::logging::filter_directive;
use tracing_subscriber::EnvFilter;

#[test]
fn cli_level_overrides_environment() {
    assert_eq!(
        filter_directive(Some(LogLevel::Debug), Some("buildwatch::vcs=trace")),
        "debug"
    );
}

#[test]
fn environment_accepts_per_target_directives() {
    let directive = filter_directive(None, Some("  buildwatch::vcs=debug,warn "));
    assert_eq!(directive, "buildwatch::vcs=debug,warn");
    assert!(EnvFilter::try_new(&directive).is_ok());
}

#[test]
fn missing_or_blank_environment_defaults_to_info() {
    assert_eq!(filter_directive(None, None), "info");
    assert_eq!(filter_directive(None, Some("   ")), "info");
}
