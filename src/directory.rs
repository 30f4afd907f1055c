use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::ScanError;
use crate::resource::Resource;
use crate::root::{to_forward_slashes, CancelToken, ContentKind, Root, RootCategory, RootVisitor};

// Version-control metadata directories are skipped entirely, not merely
// hidden from results.
const VCS_DIR: &str = "CVS";
const HIDDEN_PREFIX: char = '.';

// ---------------------------------------------------------------------------
// DirectoryRoot
// ---------------------------------------------------------------------------

/// Classpath root backed by a filesystem directory tree.
///
/// Writable: missing parent directories and the target file are created on
/// first write. Traversal enumerates a directory's files before recursing
/// into its subdirectories, in sorted name order for determinism.
pub struct DirectoryRoot {
    base_dir: PathBuf,
    category: RootCategory,
    content_kind: ContentKind,
}

impl DirectoryRoot {
    pub(crate) fn new(
        base_dir: PathBuf,
        category: RootCategory,
        content_kind: ContentKind,
    ) -> Result<Self, ScanError> {
        if base_dir.exists() && !base_dir.is_dir() {
            return Err(ScanError::Config(format!(
                "expected a directory, got '{}'",
                base_dir.display()
            )));
        }
        Ok(Self {
            base_dir,
            category,
            content_kind,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn category(&self) -> RootCategory {
        self.category
    }

    pub fn content_kind(&self) -> ContentKind {
        self.content_kind
    }

    fn resolve(&self, rel_path: &str) -> PathBuf {
        self.base_dir.join(rel_path.trim_start_matches('/'))
    }

    pub(crate) fn read(&self, rel_path: &str) -> Result<Box<dyn Read>, ScanError> {
        let full = self.resolve(rel_path);
        let file = File::open(&full).map_err(|e| ScanError::io(&full, e))?;
        Ok(Box::new(file))
    }

    pub(crate) fn write(&self, rel_path: &str) -> Result<Box<dyn Write>, ScanError> {
        if !self.base_dir.is_dir() {
            return Err(ScanError::io(
                &self.base_dir,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "base directory does not exist",
                ),
            ));
        }
        let full = self.resolve(rel_path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| ScanError::io(parent, e))?;
        }
        let file = File::create(&full).map_err(|e| ScanError::io(&full, e))?;
        Ok(Box::new(file))
    }

    pub(crate) fn can_read(&self, rel_path: &str) -> bool {
        self.resolve(rel_path).exists()
    }

    pub(crate) fn can_write(&self, _rel_path: &str) -> bool {
        fs::metadata(&self.base_dir)
            .map(|m| !m.permissions().readonly())
            .unwrap_or(false)
    }

    pub(crate) fn last_modified(&self, rel_path: &str) -> Option<SystemTime> {
        fs::metadata(self.resolve(rel_path))
            .and_then(|m| m.modified())
            .ok()
    }

    pub(crate) fn full_path_info(&self, rel_path: &str) -> String {
        to_forward_slashes(&self.resolve(rel_path))
    }

    pub(crate) fn visit_resources(
        &self,
        root: &Root,
        visitor: &mut dyn RootVisitor,
        cancel: &CancelToken,
    ) -> Result<(), ScanError> {
        if !self.base_dir.is_dir() {
            return Ok(());
        }
        visit_dir(root, visitor, cancel, "", &self.base_dir)
    }
}

/// Walk one directory level: files first, then recurse into subdirectories.
/// The cancellation flag is checked before every resource visit.
fn visit_dir(
    root: &Root,
    visitor: &mut dyn RootVisitor,
    cancel: &CancelToken,
    parent_rel: &str,
    dir: &Path,
) -> Result<(), ScanError> {
    let mut files = Vec::new();
    let mut subdirs = Vec::new();

    let entries = fs::read_dir(dir).map_err(|e| ScanError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ScanError::io(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let file_type = entry.file_type().map_err(|e| ScanError::io(entry.path(), e))?;
        if file_type.is_file() {
            files.push(name);
        } else if file_type.is_dir() && !skip_dir(&name) {
            subdirs.push(name);
        }
    }
    files.sort();
    subdirs.sort();

    for name in files {
        if cancel.is_cancelled() {
            return Ok(());
        }
        let rel_path = format!("{parent_rel}/{name}");
        let resource = Resource::new(root.clone(), &rel_path);
        visitor.visit_resource(&resource);
        visitor.end_visit_resource(&resource);
    }

    for name in subdirs {
        if cancel.is_cancelled() {
            return Ok(());
        }
        let child_rel = format!("{parent_rel}/{name}");
        visit_dir(root, visitor, cancel, &child_rel, &dir.join(&name))?;
    }

    Ok(())
}

fn skip_dir(name: &str) -> bool {
    name.starts_with(HIDDEN_PREFIX) || name == VCS_DIR
}
