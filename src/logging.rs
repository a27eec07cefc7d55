//! Logging hook for outcomes
//!
//! `log` is a side effect on either track: it never changes the outcome it is
//! called on, and a missing logger is a no-op.

use crate::{Error, Outcome, PagedOutcome};
use tracing::Level;

/// Structured fields attached to every outcome log line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogFields {
    /// Track the outcome is on
    pub is_success: bool,
    /// Number of errors carried
    pub error_count: usize,
    /// Number of messages carried
    pub message_count: usize,
}

/// Sink for outcome log lines
pub trait OutcomeLogger: Send + Sync {
    /// Emit one rendered line at `level`
    fn log(&self, level: Level, message: &str, fields: &LogFields);
}

/// Discards everything
pub struct NoOpLogger;

impl OutcomeLogger for NoOpLogger {
    fn log(&self, _level: Level, _message: &str, _fields: &LogFields) {}
}

/// Emits through `tracing`
pub struct TracingLogger;

impl OutcomeLogger for TracingLogger {
    fn log(&self, level: Level, message: &str, fields: &LogFields) {
        let LogFields {
            is_success,
            error_count,
            message_count,
        } = *fields;
        // The tracing macros need the level at compile time.
        match level {
            Level::ERROR => tracing::error!(is_success, error_count, message_count, "{message}"),
            Level::WARN => tracing::warn!(is_success, error_count, message_count, "{message}"),
            Level::INFO => tracing::info!(is_success, error_count, message_count, "{message}"),
            Level::DEBUG => tracing::debug!(is_success, error_count, message_count, "{message}"),
            _ => tracing::trace!(is_success, error_count, message_count, "{message}"),
        }
    }
}

/// Severity used for each track
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogLevels {
    /// Level for successful outcomes
    pub success: Level,
    /// Level for failed outcomes
    pub failure: Level,
}

impl Default for LogLevels {
    fn default() -> Self {
        Self {
            success: Level::DEBUG,
            failure: Level::WARN,
        }
    }
}

/// Expand `{status}`, `{errors}` and `{messages}` in `template`
pub(crate) fn render(
    template: &str,
    is_success: bool,
    messages: &[String],
    errors: &[Error],
) -> String {
    let status = if is_success { "success" } else { "failure" };
    let mut rendered = template.replace("{status}", status);
    if rendered.contains("{errors}") {
        let joined = errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
        rendered = rendered.replace("{errors}", &joined);
    }
    if rendered.contains("{messages}") {
        rendered = rendered.replace("{messages}", &messages.join("; "));
    }
    rendered
}

fn emit(
    logger: Option<&dyn OutcomeLogger>,
    template: &str,
    levels: LogLevels,
    messages: &[String],
    errors: &[Error],
) {
    let Some(logger) = logger else {
        return;
    };
    let fields = LogFields {
        is_success: errors.is_empty(),
        error_count: errors.len(),
        message_count: messages.len(),
    };
    let level = if fields.is_success {
        levels.success
    } else {
        levels.failure
    };
    logger.log(level, &render(template, fields.is_success, messages, errors), &fields);
}

impl<T> Outcome<T> {
    /// Report this outcome to `logger` and pass it through unchanged
    pub fn log(
        self,
        logger: Option<&dyn OutcomeLogger>,
        template: &str,
        levels: LogLevels,
    ) -> Self {
        emit(logger, template, levels, self.messages(), self.errors());
        self
    }
}

impl<T> PagedOutcome<T> {
    /// Report this page to `logger` and pass it through unchanged
    pub fn log(
        self,
        logger: Option<&dyn OutcomeLogger>,
        template: &str,
        levels: LogLevels,
    ) -> Self {
        emit(logger, template, levels, self.messages(), self.errors());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture(Mutex<Vec<(Level, String, LogFields)>>);

    impl OutcomeLogger for Capture {
        fn log(&self, level: Level, message: &str, fields: &LogFields) {
            self.0
                .lock()
                .unwrap()
                .push((level, message.to_string(), *fields));
        }
    }

    #[test]
    fn test_levels_follow_track() {
        let capture = Capture::default();
        let ok = Outcome::success(1).with_message("loaded");
        let ok = ok.log(Some(&capture), "load {status}: {messages}", LogLevels::default());
        assert_eq!(ok.value(), Some(&1));

        let failed: Outcome<u8> = Outcome::failure(Error::generic("missing"));
        let failed = failed.log(Some(&capture), "load {status}: {errors}", LogLevels::default());
        assert!(failed.is_failure());

        let lines = capture.0.lock().unwrap();
        assert_eq!(lines[0].0, Level::DEBUG);
        assert_eq!(lines[0].1, "load success: loaded");
        assert_eq!(lines[1].0, Level::WARN);
        assert_eq!(lines[1].1, "load failure: missing");
        assert_eq!(
            lines[1].2,
            LogFields {
                is_success: false,
                error_count: 1,
                message_count: 0
            }
        );
    }

    #[test]
    fn test_missing_logger_is_noop() {
        let outcome = Outcome::ok().log(None, "{status}", LogLevels::default());
        assert!(outcome.is_success());
        let outcome = outcome.log(Some(&NoOpLogger), "{status}", LogLevels::default());
        assert!(outcome.is_success());
    }

    #[test]
    fn test_tracing_logger_accepts_every_level() {
        let fields = LogFields {
            is_success: true,
            error_count: 0,
            message_count: 0,
        };
        for level in [Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG, Level::TRACE] {
            TracingLogger.log(level, "every level", &fields);
        }
    }

    #[test]
    fn test_paged_log_passes_through() {
        let capture = Capture::default();
        let page = PagedOutcome::success(vec![1, 2], 2, 1, 10).log(
            Some(&capture),
            "{status}",
            LogLevels {
                success: Level::INFO,
                failure: Level::ERROR,
            },
        );
        assert_eq!(page.items(), [1, 2]);
        assert_eq!(capture.0.lock().unwrap()[0].0, Level::INFO);
    }
}
