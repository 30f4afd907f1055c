use std::fmt;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::archive::ArchiveRoot;
use crate::directory::DirectoryRoot;
use crate::error::ScanError;
use crate::resource::Resource;

// ---------------------------------------------------------------------------
// Categorisation
// ---------------------------------------------------------------------------

/// Coarse categorisation of a root so tooling can decide where newly generated
/// resources go, or whether a root takes part in a given kind of processing.
///
/// Also drives deduplication: a root with a known category replaces an
/// [`Unknown`](RootCategory::Unknown) one recorded for the same location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootCategory {
    Main,
    Test,
    Dependency,
    Generated,
    System,
    Unknown,
}

/// What a root's entries contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Source,
    Binary,
    Mixed,
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Cooperative cancellation flag checked between resource visits during a
/// traversal.
///
/// Cancel from any thread; the walking thread observes the flag before each
/// visit and stops promptly without emitting a partial item. This is the only
/// concurrency-adjacent behaviour in the engine; it does not make roots
/// themselves safe for concurrent traversal.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Visitor
// ---------------------------------------------------------------------------

/// Depth-first traversal callbacks for [`Root::accept`].
///
/// Enter/leave notifications are always paired: `end_visit_root` is delivered
/// even when `visit_root` declined descent, the walk errored, or cancellation
/// stopped it early.
pub trait RootVisitor {
    /// Offered the root before any of its resources. Return `false` to skip
    /// the root's children entirely.
    fn visit_root(&mut self, _root: &Root) -> bool {
        true
    }

    fn end_visit_root(&mut self, _root: &Root) {}

    fn visit_resource(&mut self, _resource: &Resource) {}

    fn end_visit_resource(&mut self, _resource: &Resource) {}
}

// ---------------------------------------------------------------------------
// Root
// ---------------------------------------------------------------------------

/// Exactly the two backend variants a root can be.
enum Backend {
    Directory(DirectoryRoot),
    Archive(ArchiveRoot),
}

/// The top-level node relative resource paths resolve against: a directory
/// tree or an archive file. Exactly these two variants exist.
///
/// Constructed immutable; cloning is cheap and shares the backend (and an
/// archive root's cached handle). Two roots compare equal iff location,
/// category and content kind all match.
#[derive(Clone)]
pub struct Root {
    backend: Arc<Backend>,
}

impl Root {
    /// A directory-backed root.
    ///
    /// # Errors
    ///
    /// Configuration error if the path exists but is not a directory.
    pub fn directory(
        path: impl Into<std::path::PathBuf>,
        category: RootCategory,
        kind: ContentKind,
    ) -> Result<Root, ScanError> {
        Ok(Root {
            backend: Arc::new(Backend::Directory(DirectoryRoot::new(
                path.into(),
                category,
                kind,
            )?)),
        })
    }

    /// An archive-backed root. Read-only.
    ///
    /// # Errors
    ///
    /// Configuration error if the path exists but is not a file. The archive
    /// itself is opened lazily; open failures surface when a handle is first
    /// needed.
    pub fn archive(
        path: impl Into<std::path::PathBuf>,
        category: RootCategory,
        kind: ContentKind,
    ) -> Result<Root, ScanError> {
        Ok(Root {
            backend: Arc::new(Backend::Archive(ArchiveRoot::new(
                path.into(),
                category,
                kind,
            )?)),
        })
    }

    /// Forward-slashed absolute location of this root.
    pub fn path_name(&self) -> String {
        match &*self.backend {
            Backend::Directory(d) => to_forward_slashes(d.base_dir()),
            Backend::Archive(a) => to_forward_slashes(a.archive_path()),
        }
    }

    pub fn category(&self) -> RootCategory {
        match &*self.backend {
            Backend::Directory(d) => d.category(),
            Backend::Archive(a) => a.category(),
        }
    }

    pub fn content_kind(&self) -> ContentKind {
        match &*self.backend {
            Backend::Directory(d) => d.content_kind(),
            Backend::Archive(a) => a.content_kind(),
        }
    }

    pub fn is_archive(&self) -> bool {
        matches!(&*self.backend, Backend::Archive(_))
    }

    pub fn is_directory(&self) -> bool {
        matches!(&*self.backend, Backend::Directory(_))
    }

    /// Construct a resource handle for `rel_path`. Validates and normalizes
    /// the path but performs no I/O.
    pub fn resource(&self, rel_path: &str) -> Result<Resource, ScanError> {
        validate_rel_path(rel_path)?;
        Ok(Resource::new(self.clone(), rel_path))
    }

    /// A stream over the resource's content.
    pub fn read(&self, rel_path: &str) -> Result<Box<dyn Read>, ScanError> {
        validate_rel_path(rel_path)?;
        match &*self.backend {
            Backend::Directory(d) => d.read(rel_path),
            Backend::Archive(a) => a.read(rel_path),
        }
    }

    /// A stream to write the resource's content. Directory roots create
    /// missing parent directories and the target file; archive roots are
    /// read-only and always fail.
    pub fn write(&self, rel_path: &str) -> Result<Box<dyn Write>, ScanError> {
        validate_rel_path(rel_path)?;
        match &*self.backend {
            Backend::Directory(d) => d.write(rel_path),
            Backend::Archive(a) => a.write(rel_path),
        }
    }

    /// Non-throwing read-capability probe.
    pub fn can_read(&self, rel_path: &str) -> bool {
        if validate_rel_path(rel_path).is_err() {
            return false;
        }
        match &*self.backend {
            Backend::Directory(d) => d.can_read(rel_path),
            Backend::Archive(a) => a.can_read(rel_path),
        }
    }

    /// Non-throwing write-capability probe.
    pub fn can_write(&self, rel_path: &str) -> bool {
        if validate_rel_path(rel_path).is_err() {
            return false;
        }
        match &*self.backend {
            Backend::Directory(d) => d.can_write(rel_path),
            Backend::Archive(_) => false,
        }
    }

    /// Last-modified timestamp of the entry, or `None` when the entry or its
    /// timestamp is unavailable.
    pub fn last_modified(&self, rel_path: &str) -> Option<SystemTime> {
        match &*self.backend {
            Backend::Directory(d) => d.last_modified(rel_path),
            Backend::Archive(a) => a.last_modified(rel_path),
        }
    }

    /// Informative full-path string for debug and error messages. Not machine
    /// readable.
    pub fn full_path_info(&self, rel_path: &str) -> String {
        match &*self.backend {
            Backend::Directory(d) => d.full_path_info(rel_path),
            Backend::Archive(a) => a.full_path_info(rel_path),
        }
    }

    /// Depth-first traversal with cooperative cancellation.
    ///
    /// The visitor is offered the root first; declining skips all children.
    /// The paired `end_visit_root` is delivered regardless of decline, error
    /// or cancellation.
    ///
    /// # Errors
    ///
    /// Archive open failures and unreadable directories abort this root's
    /// traversal. Other roots are unaffected; the caller decides whether to
    /// continue with them.
    pub fn accept(
        &self,
        visitor: &mut dyn RootVisitor,
        cancel: &CancelToken,
    ) -> Result<(), ScanError> {
        let walked = if visitor.visit_root(self) {
            match &*self.backend {
                Backend::Directory(d) => d.visit_resources(self, visitor, cancel),
                Backend::Archive(a) => a.visit_resources(self, visitor, cancel),
            }
        } else {
            Ok(())
        };
        visitor.end_visit_root(self);
        walked
    }
}

impl PartialEq for Root {
    fn eq(&self, other: &Self) -> bool {
        self.is_archive() == other.is_archive()
            && self.path_name() == other.path_name()
            && self.category() == other.category()
            && self.content_kind() == other.content_kind()
    }
}

impl Eq for Root {}

impl std::hash::Hash for Root {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.path_name().hash(state);
        self.category().hash(state);
        self.content_kind().hash(state);
    }
}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Root")
            .field("path", &self.path_name())
            .field("category", &self.category())
            .field("content_kind", &self.content_kind())
            .field("is_archive", &self.is_archive())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Path rules
// ---------------------------------------------------------------------------

/// Convert to forward slashes and force a single leading slash. Idempotent.
pub(crate) fn normalize_rel_path(raw: &str) -> String {
    let slashed = raw.replace('\\', "/");
    format!("/{}", slashed.trim_start_matches('/'))
}

/// Reject traversal sequences and path-separator-confusing characters.
pub(crate) fn validate_rel_path(raw: &str) -> Result<(), ScanError> {
    if raw.contains("..") || raw.contains('|') || raw.contains(';') {
        return Err(ScanError::InvalidPath {
            path: raw.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn to_forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
