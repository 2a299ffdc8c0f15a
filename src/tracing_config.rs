//! Tracing configuration for structured logging
//!
//! The application configures the subscriber; library modules only emit
//! trace events.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Tracing subscriber configuration
#[derive(Debug, Default)]
pub struct TracingConfig {
    /// Verbosity level (maps to log levels)
    pub verbosity: u8,
    /// Environment filter string (overrides verbosity if set)
    pub env_filter: Option<String>,
}

impl TracingConfig {
    /// Create a new tracing configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity level (0-2+)
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set custom environment filter
    #[must_use]
    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Convert verbosity level to tracing filter string
    #[must_use]
    pub fn verbosity_to_filter(&self) -> &'static str {
        match self.verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Initialize the global subscriber with compact console output
    pub fn init(self) -> anyhow::Result<()> {
        let filter = if let Some(env_filter) = &self.env_filter {
            EnvFilter::try_new(env_filter)?
        } else {
            EnvFilter::try_new(self.verbosity_to_filter())?
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_file(false)
            .with_line_number(false)
            .with_level(true)
            .compact();

        Registry::default().with(filter).with(fmt_layer).init();
        Ok(())
    }
}
