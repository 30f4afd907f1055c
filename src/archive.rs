use std::fs::{self, File};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::SystemTime;

use zip::ZipArchive;

use crate::error::ScanError;
use crate::resource::Resource;
use crate::root::{to_forward_slashes, CancelToken, ContentKind, Root, RootCategory, RootVisitor};

// ---------------------------------------------------------------------------
// ArchiveRoot
// ---------------------------------------------------------------------------

/// Classpath root backed by a single zip-style archive file. Read-only.
///
/// One open handle to the backing container is cached for the duration of a
/// traversal and released immediately afterwards, success or failure.
/// Concurrent traversals of the same instance are not supported; the internal
/// lock serializes access but the handle lifecycle assumes one traversal at a
/// time.
pub struct ArchiveRoot {
    archive_path: PathBuf,
    category: RootCategory,
    content_kind: ContentKind,
    zip: Mutex<Option<ZipArchive<File>>>,
}

impl ArchiveRoot {
    pub(crate) fn new(
        archive_path: PathBuf,
        category: RootCategory,
        content_kind: ContentKind,
    ) -> Result<Self, ScanError> {
        if archive_path.exists() && !archive_path.is_file() {
            return Err(ScanError::Config(format!(
                "expected an archive file, got '{}'",
                archive_path.display()
            )));
        }
        Ok(Self {
            archive_path,
            category,
            content_kind,
            zip: Mutex::new(None),
        })
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    pub fn category(&self) -> RootCategory {
        self.category
    }

    pub fn content_kind(&self) -> ContentKind {
        self.content_kind
    }

    fn lock(&self) -> MutexGuard<'_, Option<ZipArchive<File>>> {
        match self.zip.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Run `f` against the cached archive handle, opening it on demand.
    ///
    /// Open failures (missing file, unreadable, corrupt container) surface
    /// here, at handle construction, not lazily per entry.
    fn with_zip<R>(
        &self,
        f: impl FnOnce(&mut ZipArchive<File>) -> Result<R, ScanError>,
    ) -> Result<R, ScanError> {
        let mut guard = self.lock();
        let archive = match guard.as_mut() {
            Some(archive) => archive,
            None => {
                let file = File::open(&self.archive_path)
                    .map_err(|e| ScanError::io(&self.archive_path, e))?;
                let opened = ZipArchive::new(file).map_err(|e| ScanError::Archive {
                    path: self.archive_path.clone(),
                    source: e,
                })?;
                guard.insert(opened)
            }
        };
        f(archive)
    }

    fn invalidate(&self) {
        *self.lock() = None;
    }

    pub(crate) fn read(&self, rel_path: &str) -> Result<Box<dyn Read>, ScanError> {
        let entry_name = to_zip_path(rel_path).to_string();
        let bytes = self.with_zip(|zip| {
            let mut entry = match zip.by_name(&entry_name) {
                Ok(entry) => entry,
                Err(zip::result::ZipError::FileNotFound) => {
                    return Err(ScanError::EntryNotFound {
                        path: self.archive_path.clone(),
                        entry: entry_name.clone(),
                    })
                }
                Err(e) => {
                    return Err(ScanError::Archive {
                        path: self.archive_path.clone(),
                        source: e,
                    })
                }
            };
            let mut buf = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut buf)
                .map_err(|e| ScanError::io(&self.archive_path, e))?;
            Ok(buf)
        })?;
        Ok(Box::new(Cursor::new(bytes)))
    }

    pub(crate) fn write(&self, _rel_path: &str) -> Result<Box<dyn Write>, ScanError> {
        Err(ScanError::ReadOnly {
            path: self.archive_path.clone(),
        })
    }

    pub(crate) fn can_read(&self, rel_path: &str) -> bool {
        let entry_name = to_zip_path(rel_path).to_string();
        self.with_zip(|zip| Ok(zip.by_name(&entry_name).is_ok()))
            .unwrap_or(false)
    }

    pub(crate) fn last_modified(&self, rel_path: &str) -> Option<SystemTime> {
        if !self.can_read(rel_path) {
            return None;
        }
        // Entry timestamps are not exposed by the slim zip build; the
        // container's own timestamp bounds every entry in it.
        fs::metadata(&self.archive_path)
            .and_then(|m| m.modified())
            .ok()
    }

    pub(crate) fn full_path_info(&self, rel_path: &str) -> String {
        format!("{}!{}", to_forward_slashes(&self.archive_path), rel_path)
    }

    pub(crate) fn visit_resources(
        &self,
        root: &Root,
        visitor: &mut dyn RootVisitor,
        cancel: &CancelToken,
    ) -> Result<(), ScanError> {
        let walked = self.visit_entries(root, visitor, cancel);
        self.invalidate();
        walked
    }

    fn visit_entries(
        &self,
        root: &Root,
        visitor: &mut dyn RootVisitor,
        cancel: &CancelToken,
    ) -> Result<(), ScanError> {
        // Enumerate first so the handle lock is not held across visitor
        // callbacks; a visitor is free to read entry content mid-walk.
        let names = self.with_zip(|zip| {
            let mut names = Vec::with_capacity(zip.len());
            for i in 0..zip.len() {
                let entry = zip.by_index(i).map_err(|e| ScanError::Archive {
                    path: self.archive_path.clone(),
                    source: e,
                })?;
                // directory-only entries never enumerate
                if entry.name().ends_with('/') {
                    continue;
                }
                names.push(entry.name().to_string());
            }
            Ok(names)
        })?;

        for name in names {
            if cancel.is_cancelled() {
                return Ok(());
            }
            let resource = Resource::new(root.clone(), &name);
            visitor.visit_resource(&resource);
            visitor.end_visit_resource(&resource);
        }
        Ok(())
    }
}

/// Archive entry names are stored without a leading slash; strip it (and any
/// backslashes) before index lookup.
fn to_zip_path(rel_path: &str) -> &str {
    rel_path.trim_start_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use zip::write::FileOptions;

    struct Collector {
        paths: Vec<String>,
        root_left: bool,
        cancel_after: Option<(usize, CancelToken)>,
    }

    impl Collector {
        fn new() -> Self {
            Self {
                paths: Vec::new(),
                root_left: false,
                cancel_after: None,
            }
        }
    }

    impl RootVisitor for Collector {
        fn end_visit_root(&mut self, _root: &Root) {
            self.root_left = true;
        }

        fn visit_resource(&mut self, resource: &Resource) {
            self.paths.push(resource.rel_path().to_string());
            if let Some((limit, token)) = &self.cancel_after {
                if self.paths.len() >= *limit {
                    token.cancel();
                }
            }
        }
    }

    fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, content) in entries {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(content).unwrap();
        }
        zip.finish().unwrap();
    }

    fn new_root(path: &Path) -> Root {
        Root::archive(path, RootCategory::Dependency, ContentKind::Binary).unwrap()
    }

    #[test]
    fn entries_round_trip_with_forced_leading_slash() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("fixture.jar");
        write_archive(&jar, &[("a/b/c/noslash", b""), ("/d/e/f/withslash", b"")]);

        let root = new_root(&jar);
        let mut visitor = Collector::new();
        root.accept(&mut visitor, &CancelToken::new()).unwrap();

        assert_eq!(
            visitor.paths,
            vec!["/a/b/c/noslash", "/d/e/f/withslash"],
            "container iteration order, slash normalized"
        );
        assert!(visitor.root_left);
    }

    #[test]
    fn directory_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("dirs.jar");
        let file = File::create(&jar).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.add_directory("pkg/", FileOptions::default()).unwrap();
        zip.start_file("pkg/A.class", FileOptions::default()).unwrap();
        zip.write_all(b"x").unwrap();
        zip.finish().unwrap();

        let root = new_root(&jar);
        let mut visitor = Collector::new();
        root.accept(&mut visitor, &CancelToken::new()).unwrap();
        assert_eq!(visitor.paths, vec!["/pkg/A.class"]);
    }

    #[test]
    fn entry_content_reads_through_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("content.jar");
        write_archive(&jar, &[("org/example/A.class", b"cafebabe")]);

        let root = new_root(&jar);
        let mut buf = Vec::new();
        root.read("/org/example/A.class")
            .unwrap()
            .read_to_end(&mut buf)
            .unwrap();
        assert_eq!(buf, b"cafebabe");

        assert!(root.can_read("/org/example/A.class"));
        assert!(!root.can_read("/org/example/Missing.class"));
    }

    #[test]
    fn writes_always_fail() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("ro.jar");
        write_archive(&jar, &[("a", b"")]);

        let root = new_root(&jar);
        let err = root.write("/new-entry").map(|_| ()).unwrap_err();
        assert!(matches!(err, ScanError::ReadOnly { .. }), "got {err:?}");
        assert!(!root.can_write("/new-entry"));
    }

    #[test]
    fn missing_archive_fails_at_handle_open() {
        let dir = tempfile::tempdir().unwrap();
        let root = new_root(&dir.path().join("absent.jar"));
        let mut visitor = Collector::new();
        let err = root.accept(&mut visitor, &CancelToken::new()).unwrap_err();
        assert!(matches!(err, ScanError::Io { .. }), "got {err:?}");
        assert!(visitor.root_left, "end visit still paired on failure");
    }

    #[test]
    fn corrupt_archive_fails_at_handle_open() {
        let dir = tempfile::tempdir().unwrap();
        let junk = dir.path().join("junk.jar");
        fs::write(&junk, b"this is not a zip").unwrap();
        let root = new_root(&junk);
        let mut visitor = Collector::new();
        let err = root.accept(&mut visitor, &CancelToken::new()).unwrap_err();
        assert!(matches!(err, ScanError::Archive { .. }), "got {err:?}");
    }

    #[test]
    fn cancellation_between_entry_visits_stops_promptly() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("cancel.jar");
        write_archive(&jar, &[("a", b""), ("b", b""), ("c", b""), ("d", b"")]);

        let root = new_root(&jar);
        let token = CancelToken::new();
        let mut visitor = Collector::new();
        visitor.cancel_after = Some((2, token.clone()));
        root.accept(&mut visitor, &token).unwrap();

        assert_eq!(visitor.paths, vec!["/a", "/b"]);
    }

    #[test]
    fn missing_entry_read_is_entry_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("lookup.jar");
        write_archive(&jar, &[("present", b"")]);

        let root = new_root(&jar);
        let err = root.read("/absent").map(|_| ()).unwrap_err();
        assert!(matches!(err, ScanError::EntryNotFound { .. }), "got {err:?}");
    }
}
