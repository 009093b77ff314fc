//! Process-wide logging setup.
//!
//! Replaces the teacher's hand-rolled `RedisServer::log`/`LogLevel`
//! (`examples/yijun-tang-rudis/src/redis/log.rs`) with `tracing` plus a
//! `tracing-subscriber` `fmt` layer, the idiom the rest of the retrieval
//! pack uses for structured logging.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber. `default_level` is the
/// floor used when `RUST_LOG` is unset; `RUST_LOG` always wins when
/// present, matching `tracing_subscriber`'s usual precedence.
pub fn init(default_level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
