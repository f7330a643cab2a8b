//! Error kinds and diagnostic reporting
//!
//! Library code never terminates the process. Every failure is a [SceneError]
//! whose [Severity] tells the caller whether to log and continue or to exit,
//! and with which status.

use thiserror::Error;

/// How bad an error is, and what the process should do about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational, only shown when not running quietly.
    Advisory,
    /// Always shown, execution continues.
    Warning,
    /// A structurally invalid request. The process exits with status 1.
    Abort,
    /// A corrupted graph or a hard limit breach. The process exits with status 2.
    Panic,
}

impl Severity {
    /// The label printed in front of a message of this severity.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Advisory | Severity::Warning => "Warning",
            Severity::Abort => "Error",
            Severity::Panic => "Fatal error",
        }
    }

    /// The exit status for fatal severities, `None` for the ones that continue.
    pub fn exit_code(self) -> Option<i32> {
        match self {
            Severity::Advisory | Severity::Warning => None,
            Severity::Abort => Some(1),
            Severity::Panic => Some(2),
        }
    }
}

/// Errors raised while building or evaluating a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Expression with {0} args? At most 5 are supported")]
    TooManyParams(usize),

    #[error("Function expression needs at least one argument")]
    NoParams,

    #[error("A {kind} transform takes {expected} parameters, got {found}")]
    ParamCount {
        kind: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Association slot {slot} is out of range for a {kind} transform")]
    BadSlot { kind: &'static str, slot: usize },

    #[error("Degenerate scale ({0}, {1}, {2})")]
    DegenerateScale(f32, f32, f32),

    #[error("Degenerate rotation axis")]
    DegenerateAxis,

    #[error("Singular transformation matrix")]
    SingularMatrix,

    #[error("Can't compute bounds of \"{0}\"")]
    NoBounds(String),

    #[error("A {0} has no normal routine")]
    NoNormal(String),

    #[error("A {0} isn't an aggregate")]
    NotAggregate(String),

    #[error("Failed to load texture image {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

impl SceneError {
    pub fn severity(&self) -> Severity {
        match self {
            SceneError::TooManyParams(_) | SceneError::NoParams | SceneError::BadSlot { .. } => {
                Severity::Panic
            }
            _ => Severity::Abort,
        }
    }
}

pub type SceneResult<T> = Result<T, SceneError>;

/// Where in the scene description the current construct came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

/// Formats and emits messages the way every part of the renderer reports them.
///
/// The front-end updates [Diagnostics::location] while it reads input, so
/// messages raised during construction name the offending line.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    progname: String,
    quiet: bool,
    pub location: Option<SourceLocation>,
}

impl Diagnostics {
    pub fn new(progname: impl Into<String>, quiet: bool) -> Self {
        Self {
            progname: progname.into(),
            quiet,
            location: None,
        }
    }

    /// Builds the full message text for the given severity.
    pub fn format(&self, severity: Severity, message: &str) -> String {
        match &self.location {
            Some(SourceLocation { file, line }) => format!(
                "{}: {}: {}, line {}: {}",
                self.progname,
                severity.label(),
                file,
                line,
                message
            ),
            None => format!("{}: {}: {}", self.progname, severity.label(), message),
        }
    }

    /// Emits `message` at the given severity.
    ///
    /// Returns the exit status the caller must terminate with, if any.
    pub fn report(&self, severity: Severity, message: &str) -> Option<i32> {
        match severity {
            Severity::Advisory if self.quiet => {}
            Severity::Advisory => log::info!("{}", self.format(severity, message)),
            Severity::Warning => log::warn!("{}", self.format(severity, message)),
            Severity::Abort | Severity::Panic => log::error!("{}", self.format(severity, message)),
        }
        severity.exit_code()
    }

    pub fn advise(&self, message: &str) {
        self.report(Severity::Advisory, message);
    }

    pub fn warn(&self, message: &str) {
        self.report(Severity::Warning, message);
    }

    /// Reports a [SceneError] and returns its exit status, if it is fatal.
    pub fn report_error(&self, err: &SceneError) -> Option<i32> {
        self.report(err.severity(), &err.to_string())
    }
}
