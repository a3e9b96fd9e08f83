//! Logging for everything that loads, lowers or evaluates an lnn program.
//!
//! Nothing is logged unless `LNN_LOG` holds an [EnvFilter] directive, e.g. `LNN_LOG=lnn_mono=debug`
//! or `LNN_LOG=lnn_solve=trace,lnn_eval=info`. Output goes to stderr, or to the file named by
//! `LNN_LOGTO`, which is truncated first.
//!
//! The compiler crates depend on this crate instead of `tracing`, and use the re-exported
//! `debug!`, `info!` and `trace!` macros.
//!
//! [EnvFilter]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html#directives

/// Turns logging on for a test binary or a driver of the loader. Keep the result alive for as long
/// as log lines may still be written; a file log is flushed when it drops.
///
/// Release builds never install a subscriber.
#[macro_export]
macro_rules! setup_tracing {
    () => {
        if cfg!(debug_assertions) {
            $crate::setup_tracing()
        } else {
            $crate::TracingGuards::NONE
        }
    };
}

pub use tracing::debug;
pub use tracing::info;
pub use tracing::trace;

const FILTER_VAR: &str = "LNN_LOG";
const FILE_VAR: &str = "LNN_LOGTO";

use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

/// Holds the background writer of a file log.
pub struct TracingGuards {
    file_writer: Option<tracing_appender::non_blocking::WorkerGuard>,
}

impl TracingGuards {
    pub const NONE: TracingGuards = TracingGuards {
        file_writer: None,
    };

    pub fn writes_to_file(&self) -> bool {
        self.file_writer.is_some()
    }
}

/// Installs the global subscriber. The first call wins; later calls install nothing and return
/// [TracingGuards::NONE], so every test may call it.
#[must_use]
pub fn setup_tracing() -> TracingGuards {
    match std::env::var(FILE_VAR) {
        Ok(file) => {
            let _ = std::fs::remove_file(&file);
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(".", file));
            let layer = fmt::Layer::default()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(EnvFilter::from_env(FILTER_VAR));

            match Registry::default().with(layer).try_init() {
                Ok(()) => TracingGuards {
                    file_writer: Some(guard),
                },
                Err(_) => TracingGuards::NONE,
            }
        }
        Err(_) => {
            let layer = fmt::Layer::default()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::from_env(FILTER_VAR));

            let _ = Registry::default().with(layer).try_init();

            TracingGuards::NONE
        }
    }
}
