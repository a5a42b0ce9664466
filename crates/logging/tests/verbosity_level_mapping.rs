//! Integration tests for the `-v` count to filter mapping.

use logging::{TARGET_PREFIX, VerbosityConfig};
use tracing::level_filters::LevelFilter;

#[test]
fn quiet_mode_only_shows_warnings() {
    let config = VerbosityConfig::from_verbose_level(0);
    assert_eq!(config.level_filter(), LevelFilter::WARN);
    assert_eq!(config.verbose_level(), 0);
}

#[test]
fn each_flag_raises_detail() {
    let filters: Vec<_> = (0..4)
        .map(|level| VerbosityConfig::from_verbose_level(level).level_filter())
        .collect();
    assert!(filters.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn directive_targets_workspace_prefix() {
    let directive = VerbosityConfig::from_verbose_level(1).directive();
    assert!(directive.contains(&format!("{TARGET_PREFIX}=info")));
    assert!(directive.starts_with("warn,"));
}

#[test]
fn macros_expand_outside_the_crate() {
    // No subscriber is installed; the macros must still compile and be no-ops.
    logging::trace_diff!(changes = 3usize, "diff");
    logging::trace_patch!("patch");
    logging::trace_container!(entries = 2, "container");
    logging::trace_store!(index = 1u64, "store");
    logging::warn_store!("warning");
}
