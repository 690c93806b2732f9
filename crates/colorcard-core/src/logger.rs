//! Stderr logging for the colorcard binaries.
//!
//! Lines look like `[  0.412s DEBUG grid] cell (2, 5) center collapsed`: the
//! target is cut down to the colorcard stage that emitted it. Records from
//! other crates (`image`, `rayon`, ...) are held at `warn` whatever the
//! requested level, so `-vvv` stays readable.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

const OWN_PREFIX: &str = "colorcard";

struct StageLogger {
    level: LevelFilter,
    started: Instant,
}

/// Stage name for a record target: `colorcard_grid::sampler` -> `grid`.
fn stage(target: &str) -> &str {
    let krate = target.split("::").next().unwrap_or(target);
    krate
        .strip_prefix("colorcard_")
        .filter(|s| !s.is_empty())
        .unwrap_or(krate)
}

fn passes(level: LevelFilter, target: &str, record_level: Level) -> bool {
    let cap = if target.starts_with(OWN_PREFIX) {
        level
    } else {
        level.min(LevelFilter::Warn)
    };
    record_level <= cap
}

impl Log for StageLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        passes(self.level, metadata.target(), metadata.level())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "[{:7.3}s {:>5} {}] {}",
            self.started.elapsed().as_secs_f64(),
            record.level(),
            stage(record.target()),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StageLogger> = OnceLock::new();

/// Route `log` records to stderr at `level`.
///
/// Only the first call installs anything; the level of later calls is
/// ignored.
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

/// Map a `-v` count to a level: 0 = warn, 1 = info, 2 = debug, 3+ = trace.
pub fn level_from_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install a `tracing` subscriber filtered by `RUST_LOG` (default `info`).
///
/// `log` records from the library crates are bridged by the subscriber.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .json()
            .flatten_event(true)
            .finish()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init();
    }
}
