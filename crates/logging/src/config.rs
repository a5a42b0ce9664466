//! Verbosity configuration derived from `-v` counts.

use tracing::level_filters::LevelFilter;

/// Verbosity selected on the command line.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VerbosityConfig {
    level: u8,
}

impl VerbosityConfig {
    /// Creates a configuration from a verbose level (number of `-v` flags).
    ///
    /// Levels above 3 saturate at `trace`.
    #[must_use]
    pub const fn from_verbose_level(level: u8) -> Self {
        Self { level }
    }

    /// Returns the raw verbose level.
    #[must_use]
    pub const fn verbose_level(self) -> u8 {
        self.level
    }

    /// Returns the level applied to workspace targets.
    #[must_use]
    pub const fn level_filter(self) -> LevelFilter {
        match self.level {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Renders the `EnvFilter` directive equivalent to this configuration.
    ///
    /// Third-party crates stay at `warn` regardless of the verbose level.
    #[must_use]
    pub fn directive(self) -> String {
        let level = self.level_filter().to_string().to_lowercase();
        format!("warn,{}={level}", crate::TARGET_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_map_to_filters() {
        assert_eq!(VerbosityConfig::default().level_filter(), LevelFilter::WARN);
        assert_eq!(VerbosityConfig::from_verbose_level(1).level_filter(), LevelFilter::INFO);
        assert_eq!(VerbosityConfig::from_verbose_level(2).level_filter(), LevelFilter::DEBUG);
        assert_eq!(VerbosityConfig::from_verbose_level(3).level_filter(), LevelFilter::TRACE);
        assert_eq!(VerbosityConfig::from_verbose_level(9).level_filter(), LevelFilter::TRACE);
    }

    #[test]
    fn directive_scopes_level_to_workspace_targets() {
        assert_eq!(VerbosityConfig::default().directive(), "warn,backtrack=warn");
        assert_eq!(
            VerbosityConfig::from_verbose_level(3).directive(),
            "warn,backtrack=trace"
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip() {
        let config = VerbosityConfig::from_verbose_level(2);
        let json = serde_json::to_string(&config).unwrap();
        let decoded: VerbosityConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, config);
    }
}
