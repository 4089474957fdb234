use std::time::{Duration, Instant};

use log::LevelFilter;
use tracing::Level;

#[derive(Clone, Debug)]
#[non_exhaustive]
/// Logging configuration for statements executed on a connection.
pub struct LogSettings {
    /// Log level for statements.
    pub statements_level: LevelFilter,
    /// Log level for slow statements.
    pub slow_statements_level: LevelFilter,
    /// Threshold for slow statements.
    pub slow_statements_duration: Duration,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            statements_level: LevelFilter::Debug,
            slow_statements_level: LevelFilter::Warn,
            slow_statements_duration: Duration::from_secs(1),
        }
    }
}

impl LogSettings {
    /// Configure statement logging level.
    pub fn log_statements(&mut self, level: LevelFilter) {
        self.statements_level = level;
    }

    /// Configure slow statement logging level and threshold.
    pub fn log_slow_statements(&mut self, level: LevelFilter, duration: Duration) {
        self.slow_statements_level = level;
        self.slow_statements_duration = duration;
    }

    /// Returns `true` if any logging level is enabled.
    pub fn is_enabled(&self) -> bool {
        self.statements_level != LevelFilter::Off || self.slow_statements_level != LevelFilter::Off
    }
}

fn level_filter_to_levels(filter: LevelFilter) -> Option<(Level, log::Level)> {
    let tracing_level = match filter {
        LevelFilter::Error => Some(Level::ERROR),
        LevelFilter::Warn => Some(Level::WARN),
        LevelFilter::Info => Some(Level::INFO),
        LevelFilter::Debug => Some(Level::DEBUG),
        LevelFilter::Trace => Some(Level::TRACE),
        LevelFilter::Off => None,
    };

    tracing_level.zip(filter.to_level())
}

// `tracing::event!` needs the level as a constant, so dispatch once per level.
macro_rules! dispatch_level {
    ($level:expr, $inner:ident!($($args:tt)*)) => {
        match $level {
            Level::ERROR => $inner!(Level::ERROR, $($args)*),
            Level::WARN => $inner!(Level::WARN, $($args)*),
            Level::INFO => $inner!(Level::INFO, $($args)*),
            Level::DEBUG => $inner!(Level::DEBUG, $($args)*),
            Level::TRACE => $inner!(Level::TRACE, $($args)*),
        }
    };
}

macro_rules! query_enabled {
    ($level:expr,) => {
        tracing::enabled!(target: "query", $level)
    };
}

macro_rules! query_event {
    ($level:expr, $summary:expr, $sql:expr, $rows_affected:expr, $rows_returned:expr, $elapsed:expr) => {
        tracing::event!(
            target: "query",
            $level,
            summary = $summary,
            db.statement = $sql,
            rows_affected = $rows_affected,
            rows_returned = $rows_returned,
            elapsed = ?$elapsed,
        )
    };
}

/// Times one statement execution and emits a `query` event when it completes.
///
/// The event is emitted on drop, so a logger that is dropped by an early `?` still records the
/// failed attempt.
pub(crate) struct QueryLogger<'q> {
    sql: &'q str,
    rows_returned: u64,
    rows_affected: u64,
    start: Instant,
    settings: &'q LogSettings,
}

impl<'q> QueryLogger<'q> {
    pub(crate) fn new(sql: &'q str, settings: &'q LogSettings) -> Self {
        Self::started_at(sql, settings, Instant::now())
    }

    /// A logger for a statement that started running at `start`.
    pub(crate) fn started_at(sql: &'q str, settings: &'q LogSettings, start: Instant) -> Self {
        Self {
            sql,
            rows_returned: 0,
            rows_affected: 0,
            start,
            settings,
        }
    }

    pub(crate) fn increment_rows_returned(&mut self) {
        self.rows_returned += 1;
    }

    pub(crate) fn add_rows_returned(&mut self, n: u64) {
        self.rows_returned += n;
    }

    pub(crate) fn increase_rows_affected(&mut self, n: u64) {
        self.rows_affected += n;
    }

    fn finish(&self) {
        let elapsed = self.start.elapsed();
        let lvl = if elapsed >= self.settings.slow_statements_duration {
            self.settings.slow_statements_level
        } else {
            self.settings.statements_level
        };

        let Some((tracing_level, log_level)) = level_filter_to_levels(lvl) else {
            return;
        };

        // The enabled level could be set from either the tracing or the log world, so check both.
        let enabled = log::log_enabled!(target: "query", log_level)
            || dispatch_level!(tracing_level, query_enabled!());
        if !enabled {
            return;
        }

        let (summary, sql) = build_log_payload(self.sql);
        let (summary, sql) = (summary.as_str(), sql.as_str());
        let (rows_affected, rows_returned) = (self.rows_affected, self.rows_returned);
        dispatch_level!(
            tracing_level,
            query_event!(summary, sql, rows_affected, rows_returned, elapsed)
        );
    }
}

impl Drop for QueryLogger<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}

/// The summary line, plus the pretty-printed statement when the summary had to be shortened.
fn build_log_payload(sql: &str) -> (String, String) {
    let mut summary = parse_query_summary(sql);
    if summary != sql {
        summary.push_str(" …");
        let formatted = sqlformat::format(
            sql,
            &sqlformat::QueryParams::None,
            &sqlformat::FormatOptions::default(),
        );
        (summary, format!("\n\n{formatted}\n"))
    } else {
        (summary, String::new())
    }
}

/// The first four words of a statement.
fn parse_query_summary(sql: &str) -> String {
    sql.split_whitespace()
        .take(4)
        .collect::<Vec<&str>>()
        .join(" ")
}
