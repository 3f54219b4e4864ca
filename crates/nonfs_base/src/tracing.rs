use crate::error::{NonfsError, NonfsResult};
pub use tracing::instrument;
pub use tracing::{debug, error, info, trace, warn};
use tracing_error::ErrorLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs the global subscriber: fmt output filtered by `RUST_LOG` (default `info`),
/// plus the ErrorLayer so errors capture span traces.
pub fn init_tracing() -> NonfsResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| Box::new(NonfsError::message(format!("Failed to initialize tracing: {}", e))))
}
