use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use tracing_error::{SpanTrace, SpanTraceStatus};

use crate::FileType;

/* 📖 # Why a custom error type and not use anyhow/eyre/thiserror etc?

- Better control over error handling
- No dependencies to compile and integrate
- More transparency into error handling logic
- Callers need to branch on the failure category (not found vs. read-only vs. conflict),
  which an opaque error type would hide
 */

/// Error variants that can occur in nonfs operations.
/// Each variant carries the logical path and file type that caused it.
#[derive(Debug)]
pub enum ErrorKind {
    /// Read or resolve failure, including a missed packaged resource lookup
    NotFound { path: String, file_type: FileType },

    /// Write-family operation on a read-only type, or listing a classpath directory
    UnsupportedOperation {
        operation: &'static str,
        path: String,
        file_type: FileType,
    },

    /// Stream opened against a directory
    IsADirectory { path: String, file_type: FileType },

    /// Operation that makes no sense for the given handle, e.g. the sibling of the root
    InvalidOperation { message: String },

    /// Directory copy onto an existing non-directory
    DestinationConflict { from: String, to: String },

    /// Underlying I/O primitive failed
    IoFailure {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Catch-all for other errors with a message
    Message { message: String },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::NotFound { path, file_type } => {
                write!(f, "File not found: {} ({})", path, file_type)
            }
            ErrorKind::UnsupportedOperation {
                operation,
                path,
                file_type,
            } => {
                let type_name = file_type.to_string().to_lowercase();
                let article = if type_name.starts_with(['a', 'e', 'i', 'o', 'u']) {
                    "an"
                } else {
                    "a"
                };
                write!(
                    f,
                    "Cannot {} {} {} file: {} ({})",
                    operation, article, type_name, path, file_type
                )
            }
            ErrorKind::IsADirectory { path, file_type } => {
                write!(f, "Cannot open a stream to a directory: {} ({})", path, file_type)
            }
            ErrorKind::InvalidOperation { message } => write!(f, "{}", message),
            ErrorKind::DestinationConflict { from, to } => write!(
                f,
                "Destination exists but is not a directory: {} (copying {})",
                to, from
            ),
            ErrorKind::IoFailure { path, source } => {
                write!(f, "File error at {}: {}", path.display(), source)
            }
            ErrorKind::Message { message } => write!(f, "{}", message),
        }
    }
}

/* 📖 # Why separate ErrorKind and NonfsError?
This two-layer design provides a clear separation of concerns:
- ErrorKind: structural variants with specific contexts (logical path, file type, io source)
- NonfsError: wraps ErrorKind with runtime context strings, an optional cause and a span trace

Users can pattern match on ErrorKind for specific handling, while NonfsError
provides ergonomic context attachment during propagation.
*/

/// Error type wrapping ErrorKind with context, an optional cause and the span trace
/// captured at construction.
pub struct NonfsError {
    kind: ErrorKind,
    context: Vec<String>,
    cause: Option<Box<NonfsError>>,
    span_trace: SpanTrace,
}

impl NonfsError {
    /// Creates a new error from an ErrorKind, capturing the current span trace.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: vec![],
            cause: None,
            span_trace: SpanTrace::capture(),
        }
    }

    /// Creates a `Message` error.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Message {
            message: message.into(),
        })
    }

    /// Creates an `IoFailure` error for the given physical path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::new(ErrorKind::IoFailure {
            path: path.into(),
            source,
        })
    }

    /// Attaches context to an error.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Attaches context using lazy evaluation.
    pub fn with_context<F>(mut self, f: F) -> Self
    where
        F: FnOnce() -> String,
    {
        self.context.push(f());
        self
    }

    /// Records the error that caused this one.
    pub fn caused_by(mut self, cause: impl Into<Box<NonfsError>>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Returns a reference to the underlying ErrorKind.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn get_context(&self) -> &[String] {
        &self.context
    }

    pub fn cause(&self) -> Option<&NonfsError> {
        self.cause.as_deref()
    }

    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// Returns the innermost error in the chain.
    pub fn root_cause(&self) -> &(dyn StdError + 'static) {
        let mut current: &(dyn StdError + 'static) = self;
        while let Some(next) = current.source() {
            current = next;
        }
        current
    }

    fn fmt_details(&self, f: &mut fmt::Formatter<'_>, indent: &str) -> fmt::Result {
        let count = self.context.len();
        for (i, ctx) in self.context.iter().enumerate() {
            let last = i + 1 == count && self.cause.is_none();
            let branch = if last { "└─ " } else { "├─ " };
            writeln!(f, "{}{}{}", indent, branch, ctx)?;
        }
        if let Some(cause) = &self.cause {
            writeln!(f, "{}└─ cause: {}", indent, cause.kind)?;
            cause.fmt_details(f, &format!("{}   ", indent))?;
        }
        Ok(())
    }
}

impl From<ErrorKind> for NonfsError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl StdError for NonfsError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            ErrorKind::IoFailure { source, .. } => Some(source),
            _ => self
                .cause
                .as_deref()
                .map(|cause| cause as &(dyn StdError + 'static)),
        }
    }
}

impl fmt::Display for NonfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ctx in &self.context {
            write!(f, "{}: ", ctx)?;
        }
        write!(f, "{}", self.kind)
    }
}

/* 📖 # Why a hand-written Debug impl?

Errors end up in logs and test failures via `{:?}`. The derived output would dump the
raw SpanTrace structure, so instead the error renders as a tree: the message, its
contexts, the cause chain and finally the span trace if one was captured.
*/

impl fmt::Debug for NonfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.kind)?;
        self.fmt_details(f, "")?;
        if self.span_trace.status() == SpanTraceStatus::CAPTURED {
            writeln!(f, "Trace: {}", self.span_trace)?;
        }
        Ok(())
    }
}

/// Standard result type for nonfs operations. Boxed to keep the Ok path small.
pub type NonfsResult<T> = std::result::Result<T, Box<NonfsError>>;

/// Extension trait for attaching context to Results during propagation.
pub trait ResultExt<T> {
    /// Attaches context to an error. Eager evaluation.
    fn context(self, context: impl Into<String>) -> NonfsResult<T>;

    /// Attaches context using lazy evaluation.
    /// Context is only evaluated if the result is an error.
    fn with_context<F>(self, f: F) -> NonfsResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for NonfsResult<T> {
    fn context(self, context: impl Into<String>) -> NonfsResult<T> {
        self.map_err(|err| Box::new(err.context(context)))
    }

    fn with_context<F>(self, f: F) -> NonfsResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|err| Box::new(err.with_context(f)))
    }
}

/// Creates a boxed `Message` error from a format string.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        ::std::boxed::Box::new($crate::NonfsError::message(format!($($arg)*)))
    };
}

/// Returns early with a boxed `Message` error.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::err!($($arg)*))
    };
}
