//! Stage-tagged stderr logging.
//!
//! The detection flow logs per-stage progress (remote attempts,
//! strategy yields, fallbacks) through the `log` facade. This backend
//! prefixes each line with the uptime and the stage name, the last
//! segment of the module path, so a run reads as a timeline:
//!
//! ```text
//!    0.012s WARN  orchestrator: remote attempt (original) failed: ...
//!    0.581s INFO  detector: local detector kept 1 region(s) after dedup
//! ```
//!
//! Install it once at startup, or bring your own `log` backend.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

/// Environment variable consulted by [`init_from_env`].
pub const LOG_LEVEL_ENV: &str = "BETONEIRA_LOG";

struct StageLogger {
    level: LevelFilter,
    started: Instant,
}

/// Last path segment of a log target, the stage name in this workspace.
fn stage_of(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}

fn parse_level(value: &str) -> Option<LevelFilter> {
    match value.trim().to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

impl Log for StageLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "{:8.3}s {:<5} {}: {}",
            self.started.elapsed().as_secs_f64(),
            record.level(),
            stage_of(record.target()),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StageLogger> = OnceLock::new();

/// Install the stage logger at the given level.
///
/// Only the first successful installation takes effect; later calls are
/// no-ops.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| StageLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Install the stage logger at the level named by `BETONEIRA_LOG`
/// (`off`/`error`/`warn`/`info`/`debug`/`trace`), defaulting to `warn`
/// when the variable is unset or unrecognized.
pub fn init_from_env() -> Result<(), log::SetLoggerError> {
    let level = std::env::var(LOG_LEVEL_ENV)
        .ok()
        .as_deref()
        .and_then(parse_level)
        .unwrap_or(LevelFilter::Warn);
    init_with_level(level)
}

/// Install a `tracing` subscriber shaped like the stage logger: uptime
/// timer, compact single-line events, `RUST_LOG`-style filtering.
#[cfg(feature = "tracing")]
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_timer(fmt::time::uptime())
        .with_target(true)
        .compact()
        .try_init();
}
