//! Observability (logging and tracing)
//!
//! Structured logging with environment-based filtering. Invalid-token
//! rejections log at `warn` and store outages at `error` (see
//! [`crate::error::AuthFlowError::log`]) so operators can distinguish replay
//! noise from infrastructure failure without external callers gaining the
//! same power.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialize the tracing stack.
///
/// Pretty formatting in development, JSON in release builds.
///
/// # Errors
///
/// Currently infallible; returns `anyhow::Result` so callers are insulated
/// from future subscriber setup failures.
pub fn init() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            EnvFilter::new("debug,guildboard=trace")
        } else {
            EnvFilter::new("info")
        }
    });

    #[cfg(debug_assertions)]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    }

    Ok(())
}
