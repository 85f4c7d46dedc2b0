use std::fmt;
use std::io;
use std::path::Path;

use crate::TandemError;

#[derive(Debug)]
pub struct CliError {
    pub msg: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl CliError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into(), source: None }
    }

    pub fn with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self { msg: msg.into(), source: Some(Box::new(source)) }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.msg.fmt(f)
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Format a user friendly I/O error message with suggestions.
pub fn format_io_error(operation: &str, path: &Path, err: &io::Error) -> String {
    use io::ErrorKind::*;
    let suggestion = match err.kind() {
        NotFound => "Check that the file exists and the path is correct.",
        PermissionDenied => "Check permissions or run as a different user.",
        InvalidData => "The input must be valid UTF-8 text.",
        WriteZero => "Disk may be full. Free up space and try again.",
        _ => "Check permissions or free up disk space.",
    };
    format!(
        "Error {} '{}': {}. {}",
        operation,
        path.display(),
        err,
        suggestion
    )
}

/// Convert an I/O error into a CLI error with context.
pub fn io_cli_error(operation: &str, path: &Path, err: io::Error) -> CliError {
    CliError::with_source(format_io_error(operation, path, &err), err)
}

/// Simple CLI error from string.
pub fn simple_cli_error(msg: &str) -> CliError {
    CliError::new(msg)
}

/// Convert a library error into a CLI error with a hint.
pub fn tandem_cli_error(context: &str, err: TandemError) -> CliError {
    CliError::with_source(format!("{}: {}", context, cli_hint(&err)), err)
}

/// Return an actionable hint for a library error variant.
pub fn cli_hint(err: &TandemError) -> String {
    use TandemError::*;
    match err {
        Analysis(msg) => format!("{msg}. The input may be too irregular to analyse."),
        ReservedToken { class } => {
            format!("input uses bytes in {class}. Pick another strategy for this input.")
        }
        NoFreeTokens => "every usable byte occurs in the input; it cannot be packed".to_string(),
        Allocation(msg) => format!("{msg}. Token allocation failed."),
        Verification(msg) => format!("{msg}. This is a bug."),
        Worker(msg) => format!("{msg}. The background search failed."),
        Config(msg) => format!("{msg}. Invalid configuration."),
        Io(io) => format!("{io}"),
        Internal(msg) => format!("{msg}. This is a bug."),
    }
}
