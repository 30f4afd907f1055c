use std::path::PathBuf;
use thiserror::Error;

/// Why a class could not be loaded through a [`TypeLoader`](crate::reflect::TypeLoader).
///
/// Mirrors the three failure shapes a classpath scan routinely runs into:
/// the name resolves to nothing, the type exists but something it references
/// does not, or the loader is not allowed to touch it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadFailure {
    NotFound,
    LinkError,
    AccessError,
}

impl std::fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "type not found"),
            Self::LinkError => write!(f, "link error"),
            Self::AccessError => write!(f, "access error"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ScanError {
    // Configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unsupported root type '{}'", path.display())]
    UnsupportedRoot { path: PathBuf },

    #[error("invalid relative path '{path}'")]
    InvalidPath { path: String },

    #[error("invalid glob pattern '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },

    // I/O
    #[error("IO error at '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error opening archive '{}'", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("archive '{}' has no entry '{entry}'", path.display())]
    EntryNotFound { path: PathBuf, entry: String },

    #[error("root '{}' does not support writing", path.display())]
    ReadOnly { path: PathBuf },

    #[error("invalid utf-8 in '{path}'")]
    Encoding { path: String },

    // Class loading
    #[error("couldn't load class '{name}': {failure}")]
    ClassLoad { name: String, failure: LoadFailure },

    // Results
    #[error("no such element")]
    NoSuchElement,

    // Listener
    #[error("error processing '{context}'")]
    Fatal {
        context: String,
        #[source]
        source: Box<ScanError>,
    },
}

impl ScanError {
    /// The path this error occurred at, if applicable.
    /// Callers use this to present "Skipped: <path>" without pattern matching on variants.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::UnsupportedRoot { path }
            | Self::Io { path, .. }
            | Self::Archive { path, .. }
            | Self::EntryNotFound { path, .. }
            | Self::ReadOnly { path } => Some(path),
            _ => None,
        }
    }

    /// Whether a discovery run can continue after this error.
    ///
    /// Class-load failures are the one tolerated partial failure: classpath
    /// scans routinely hit unloadable generated or test-only artifacts, so the
    /// run reports them and moves on. Everything else halts under the strict
    /// default policy.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ClassLoad { .. })
    }

    /// Wrap as the fatal "error processing" variant the default listener raises.
    pub(crate) fn fatal(context: impl Into<String>, source: ScanError) -> ScanError {
        ScanError::Fatal {
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> ScanError {
        ScanError::Io {
            path: path.into(),
            source,
        }
    }
}
