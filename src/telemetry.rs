//! Tracing subscriber setup.
//!
//! The crate instruments its hot paths with `tracing`; embedding
//! applications usually install their own subscriber. These helpers cover
//! the common case of a binary that just wants readable logs, honoring
//! `RUST_LOG` with an `info` default.

use tracing_error::ErrorLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the default subscriber. Panics if one is already set; prefer
/// [`try_init`] in tests.
pub fn init() {
    registry().init();
}

/// Like [`init`], but returns `false` instead of panicking when a
/// subscriber is already installed.
pub fn try_init() -> bool {
    registry().try_init().is_ok()
}

fn registry() -> impl SubscriberInitExt {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(ErrorLayer::default())
}
