//! Process-wide log subscriber for C hosts.

use amrlink_engine::Verbosity;
use tracing::debug;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::prelude::*;

/// Install a stderr subscriber filtered at `verbosity`.
///
/// A host that already installed its own global subscriber keeps it.
pub(crate) fn install(verbosity: Verbosity) {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(verbosity.level_filter())
        .with_filter(filter_fn(move |meta| verbosity.allows(*meta.level())));
    let subscriber = tracing_subscriber::registry().with(layer);
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        debug!("global subscriber already set, keeping it");
    }
}
