//! Tracing subscriber setup.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "retrofs=info";

/// Builds the stderr subscriber used by the binary.
///
/// `RUST_LOG` takes precedence over `DEFAULT_FILTER`. `verbose` forces
/// debug output for this crate.
pub fn build_subscriber(verbose: bool) -> impl tracing::Subscriber + Send + Sync {
    let env_filter = if verbose {
        EnvFilter::new("retrofs=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    let fmt_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    tracing_subscriber::registry().with(env_filter).with(fmt_layer)
}

/// Installs the global subscriber. Later calls are ignored.
pub fn init(verbose: bool) {
    // Tests and embedders may have installed their own subscriber already.
    let _ = build_subscriber(verbose).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init(false);
        init(true);
        tracing::info!("still logging");
    }

    #[test]
    fn scoped_subscriber_captures_events() {
        let subscriber = build_subscriber(true);
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(target: "retrofs", "scoped");
        });
    }
}
