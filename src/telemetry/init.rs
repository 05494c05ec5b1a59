// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Telemetry initialization and configuration.
//!
//! Logs go to stderr so command output on stdout stays pipeable.

use std::io;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Target of this crate's log events.
const CRATE_TARGET: &str = "giga_workflow";

/// Level applied to dependencies (HTTP, WebSocket) unless RUST_LOG says otherwise.
const DEPENDENCY_LEVEL: Level = Level::WARN;

/// Configuration for telemetry initialization.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Level for this crate if RUST_LOG is not set.
    pub default_level: Level,

    /// Whether to include span events (enter/exit).
    pub include_span_events: bool,

    /// Whether to include file/line information.
    pub include_file_line: bool,

    /// Whether to include target module path.
    pub include_target: bool,

    /// Whether to use ANSI colors in output.
    pub ansi_colors: bool,

    /// Whether to use compact log format.
    pub compact: bool,

    /// Custom filter directive (overrides default_level and RUST_LOG).
    pub filter_directive: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_level: Level::INFO,
            include_span_events: false,
            include_file_line: false,
            include_target: false,
            ansi_colors: true,
            compact: true,
            filter_directive: None,
        }
    }
}

impl TelemetryConfig {
    /// Verbose output with source locations.
    pub fn development() -> Self {
        Self {
            default_level: Level::DEBUG,
            include_span_events: true,
            include_file_line: true,
            include_target: true,
            compact: false,
            ..Self::default()
        }
    }

    /// Warnings and errors only, no colors.
    pub fn production() -> Self {
        Self {
            default_level: Level::WARN,
            ansi_colors: false,
            ..Self::default()
        }
    }

    /// Trace-level output for tests.
    pub fn testing() -> Self {
        Self {
            default_level: Level::TRACE,
            include_file_line: true,
            include_target: true,
            ansi_colors: false,
            compact: false,
            filter_directive: Some(format!("{CRATE_TARGET}=trace")),
            ..Self::default()
        }
    }

    /// Pick a preset from the CLI's `--verbose/--debug/--trace` flags.
    pub fn from_flags(verbose: bool, debug: bool, trace: bool) -> Self {
        if trace {
            Self::development().with_level(Level::TRACE)
        } else if debug {
            Self::development()
        } else if verbose {
            Self::default()
        } else {
            Self::default().with_level(Level::WARN)
        }
    }

    /// Set the default log level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    /// Set a custom filter directive.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter_directive = Some(filter.into());
        self
    }

    /// Enable or disable ANSI colors.
    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi_colors = ansi;
        self
    }

    /// Filter used when neither a directive nor RUST_LOG is given.
    pub fn default_directive(&self) -> String {
        format!(
            "{},{CRATE_TARGET}={},giga={}",
            DEPENDENCY_LEVEL, self.default_level, self.default_level
        )
    }

    fn build_filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.default_directive());
        match &self.filter_directive {
            Some(directive) => EnvFilter::try_new(directive).unwrap_or_else(|_| fallback()),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback()),
        }
    }
}

/// Guard returned by [`init_telemetry`].
///
/// Keep this guard alive for the duration of your program.
pub struct TelemetryGuard {
    _private: (),
}

/// Initialize telemetry with the given configuration.
///
/// Call once at startup. A second call fails because a global subscriber is
/// already installed.
///
/// # Example
///
/// ```rust,ignore
/// use giga_workflow::telemetry::{init_telemetry, TelemetryConfig};
///
/// let _guard = init_telemetry(&TelemetryConfig::from_flags(true, false, false))?;
/// ```
pub fn init_telemetry(config: &TelemetryConfig) -> io::Result<TelemetryGuard> {
    let filter = config.build_filter();

    let span_events = if config.include_span_events {
        FmtSpan::ENTER | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let fmt_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(config.ansi_colors)
        .with_target(config.include_target)
        .with_file(config.include_file_line)
        .with_line_number(config.include_file_line)
        .with_span_events(span_events);

    let result = if config.compact {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.compact())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
    };
    result.map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    Ok(TelemetryGuard { _private: () })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_config_default() {
        let config = TelemetryConfig::default();
        assert_eq!(config.default_level, Level::INFO);
        assert!(config.ansi_colors);
        assert!(config.compact);
    }

    #[test]
    fn test_from_flags() {
        assert_eq!(TelemetryConfig::from_flags(false, false, false).default_level, Level::WARN);
        assert_eq!(TelemetryConfig::from_flags(true, false, false).default_level, Level::INFO);
        assert_eq!(TelemetryConfig::from_flags(true, true, false).default_level, Level::DEBUG);
        assert_eq!(TelemetryConfig::from_flags(false, false, true).default_level, Level::TRACE);
    }

    #[test]
    fn test_default_directive_scopes_crate() {
        let directive = TelemetryConfig::development().default_directive();
        assert_eq!(directive, "WARN,giga_workflow=DEBUG,giga=DEBUG");
        assert!(EnvFilter::try_new(&directive).is_ok());
    }

    #[test]
    fn test_telemetry_config_builder() {
        let config = TelemetryConfig::production()
            .with_level(Level::DEBUG)
            .with_filter("giga_workflow::events=trace")
            .with_ansi(true);

        assert_eq!(config.default_level, Level::DEBUG);
        assert_eq!(
            config.filter_directive.as_deref(),
            Some("giga_workflow::events=trace")
        );
        assert!(config.ansi_colors);
    }
}
