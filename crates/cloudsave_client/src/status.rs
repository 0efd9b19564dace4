//! Human-readable status lines for the UI layer.
//!
//! The stores return typed errors; this module turns outcomes into one line
//! of text per operation and forwards it to a caller-supplied sink, logging
//! it at the same time.

use crate::error::{StoreError, StoreResult};
use std::fmt;
use tracing::{error, info, warn};

/// Severity of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Success or an expected outcome such as a missing record.
    Info,
    /// The operation failed.
    Error,
}

/// One line of status text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Severity.
    pub severity: Severity,
    /// Text to show.
    pub text: String,
}

impl StatusLine {
    /// Creates an informational line.
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            text: text.into(),
        }
    }

    /// Creates an error line.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }

    /// Returns true for error lines.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Builds the line shown when `action` fails with `err`.
    ///
    /// A missing key is informational. Unknown errors are shown generically.
    pub fn for_error(action: &str, err: &StoreError) -> Self {
        match err {
            StoreError::NotInitialized => {
                Self::error(format!("{}: cloud services are not initialized", action))
            }
            StoreError::NotAuthenticated => {
                Self::error(format!("{}: please sign in first", action))
            }
            StoreError::Validation(message) => {
                Self::error(format!("{}: invalid input ({})", action, message))
            }
            StoreError::NotFound { key } if key.is_empty() => {
                Self::info(format!("{}: nothing found", action))
            }
            StoreError::NotFound { key } => Self::info(format!("{}: '{}' not found", action, key)),
            StoreError::Transport {
                message,
                reason: Some(reason),
            } => Self::error(format!("{}: service error [{}] {}", action, reason, message)),
            StoreError::Transport {
                message,
                reason: None,
            } => Self::error(format!("{}: network error {}", action, message)),
            StoreError::Unknown(_) => {
                Self::error(format!("{}: something went wrong, please try again", action))
            }
        }
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

type Sink = Box<dyn Fn(&StatusLine) + Send + Sync>;

/// Forwards status lines to a sink and to `tracing`.
pub struct StatusReporter {
    context: String,
    sink: Sink,
}

impl StatusReporter {
    /// Creates a reporter. `context` tags every log event.
    pub fn new(
        context: impl Into<String>,
        sink: impl Fn(&StatusLine) + Send + Sync + 'static,
    ) -> Self {
        Self {
            context: context.into(),
            sink: Box::new(sink),
        }
    }

    /// Creates a reporter that only logs.
    pub fn silent(context: impl Into<String>) -> Self {
        Self::new(context, |_| {})
    }

    /// Returns the context tag.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Emits an informational line.
    pub fn info(&self, text: impl Into<String>) -> StatusLine {
        let line = StatusLine::info(text);
        self.emit(&line);
        line
    }

    /// Emits the line for a failed operation.
    pub fn failure(&self, action: &str, err: &StoreError) -> StatusLine {
        if let StoreError::Unknown(detail) = err {
            error!(context = %self.context, action, detail = %detail, "unexpected failure");
        }
        let line = StatusLine::for_error(action, err);
        self.emit(&line);
        line
    }

    /// Emits the line for an operation outcome.
    ///
    /// On success `describe` builds the text from the returned value.
    pub fn report<T>(
        &self,
        action: &str,
        result: &StoreResult<T>,
        describe: impl FnOnce(&T) -> String,
    ) -> StatusLine {
        match result {
            Ok(value) => self.info(describe(value)),
            Err(err) => self.failure(action, err),
        }
    }

    fn emit(&self, line: &StatusLine) {
        match line.severity {
            Severity::Info => info!(context = %self.context, "{}", line.text),
            Severity::Error => warn!(context = %self.context, "{}", line.text),
        }
        (self.sink)(line);
    }
}

impl fmt::Debug for StatusReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusReporter")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
