//! Log subscriber setup.
//!
//! The engine logs through `tracing`. Hosts that do not install their own
//! subscriber can use [`init`] for compact, uncoloured output.

use tracing::Level;
use tracing_subscriber::fmt;

use crate::error::{Error, Result};

/// Install a compact stderr subscriber at `level`.
pub fn try_init(level: Level) -> Result<()> {
    let format = fmt::format()
        .with_level(true)
        .with_line_number(true)
        .with_ansi(false)
        .without_time()
        .compact();

    tracing_subscriber::fmt()
        .with_max_level(level)
        .event_format(format)
        .try_init()
        .map_err(|e| Error::Internal(format!("log subscriber: {e}")))
}

/// Install a compact subscriber, ignoring an already-installed one.
pub fn init(level: Level) {
    if let Err(e) = try_init(level) {
        tracing::debug!("{e}");
    }
}

/// Install a subscriber that writes through the test harness capture.
pub fn init_for_tests() {
    let format = fmt::format()
        .with_level(true)
        .with_line_number(true)
        .with_ansi(false)
        .without_time()
        .compact();

    // A second call in the same process finds the subscriber already set.
    let _ignored = tracing_subscriber::fmt()
        .with_max_level(Level::TRACE)
        .event_format(format)
        .with_test_writer()
        .try_init();
}
