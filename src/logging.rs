//! Tracing subscriber setup for binaries embedding the index.

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{IndexError, Result};

/// Default filter directive when neither the caller nor the environment sets one.
pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Installs a global `fmt` subscriber filtered by `directive`.
///
/// `directive` uses `EnvFilter` syntax (`"info"`, `"scenedex=debug"`). Fails if
/// the directive does not parse or a global subscriber is already installed.
pub fn init_logging(directive: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(directive)
                .map_err(|e| IndexError::InvalidArgument(format!("invalid log level: {e}")))?,
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|_| IndexError::InvalidArgument("logging already initialized".into()))
}
