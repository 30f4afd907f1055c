use std::fmt;
use std::io::{Read, Write};
use std::time::SystemTime;

use crate::error::ScanError;
use crate::root::{normalize_rel_path, Root};

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// One entry within a [`Root`], identified by its normalized relative path.
///
/// A lightweight locator: derived properties come from the path alone and
/// content is read through the owning root on every call, never cached here.
/// Cloning shares the root.
#[derive(Clone)]
pub struct Resource {
    root: Root,
    rel_path: String,
    depth: usize,
}

impl Resource {
    pub(crate) fn new(root: Root, rel_path: &str) -> Self {
        let rel_path = normalize_rel_path(rel_path);
        let depth = rel_path.matches('/').count();
        Self {
            root,
            rel_path,
            depth,
        }
    }

    pub fn root(&self) -> &Root {
        &self.root
    }

    /// Forward-slashed relative path, always starting with `/`.
    pub fn rel_path(&self) -> &str {
        &self.rel_path
    }

    /// Separator count of the relative path.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The extension, absent for directory-like paths ending in a separator
    /// and for names without a dot.
    pub fn extension(&self) -> Option<&str> {
        if self.rel_path.ends_with('/') {
            return None;
        }
        let name = self.file_name();
        name.rfind('.').map(|dot| &name[dot + 1..])
    }

    pub fn has_extension(&self, extension: &str) -> bool {
        self.extension() == Some(extension)
    }

    /// File name without its extension.
    pub fn base_name(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(dot) => &name[..dot],
            None => name,
        }
    }

    /// The relative path with the extension (and its dot) removed.
    pub fn path_without_extension(&self) -> &str {
        match self.extension() {
            Some(ext) => &self.rel_path[..self.rel_path.len() - ext.len() - 1],
            None => &self.rel_path,
        }
    }

    /// Dotted package prefix of the path, leading delimiter stripped.
    /// `None` for entries directly under the root.
    pub fn package_part(&self) -> Option<String> {
        let slash = self.rel_path.rfind('/')?;
        let prefix = &self.rel_path[..slash];
        let dotted = prefix.replace('/', ".");
        let trimmed = dotted.trim_start_matches('.');
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn file_name(&self) -> &str {
        match self.rel_path.rfind('/') {
            Some(slash) => &self.rel_path[slash + 1..],
            None => &self.rel_path,
        }
    }

    /// Whether the owning root can currently read this entry.
    pub fn exists(&self) -> bool {
        self.root.can_read(&self.rel_path)
    }

    /// A stream over this resource's content. Re-reading re-invokes the root.
    pub fn read(&self) -> Result<Box<dyn Read>, ScanError> {
        self.root.read(&self.rel_path)
    }

    /// The whole content as bytes. The underlying handle is released before
    /// this returns, whatever the outcome.
    pub fn read_bytes(&self) -> Result<Vec<u8>, ScanError> {
        let mut buf = Vec::new();
        let mut stream = self.read()?;
        stream
            .read_to_end(&mut buf)
            .map_err(|e| ScanError::io(self.full_path_info(), e))?;
        Ok(buf)
    }

    /// The whole content decoded as UTF-8. Callers needing another encoding
    /// decode [`read_bytes`](Self::read_bytes) themselves.
    pub fn read_string(&self) -> Result<String, ScanError> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes).map_err(|_| ScanError::Encoding {
            path: self.full_path_info(),
        })
    }

    /// A stream to replace this resource's content.
    pub fn write(&self) -> Result<Box<dyn Write>, ScanError> {
        self.root.write(&self.rel_path)
    }

    pub fn last_modified(&self) -> Option<SystemTime> {
        self.root.last_modified(&self.rel_path)
    }

    /// Informative full-path string for debug and error messages.
    pub fn full_path_info(&self) -> String {
        self.root.full_path_info(&self.rel_path)
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.rel_path == other.rel_path && self.root == other.root
    }
}

impl Eq for Resource {}

impl std::hash::Hash for Resource {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.rel_path.hash(state);
        self.root.hash(state);
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("root", &self.root.path_name())
            .field("rel_path", &self.rel_path)
            .field("depth", &self.depth)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ClassResource
// ---------------------------------------------------------------------------

/// A resource recognized as a compiled-type artifact, paired with the
/// fully-qualified type name its path derives to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassResource {
    resource: Resource,
    class_name: String,
}

impl ClassResource {
    /// Derive from a resource; `None` unless the path is a `.class` artifact.
    pub fn from_resource(resource: Resource) -> Option<ClassResource> {
        let class_name = class_name_of(resource.rel_path())?;
        Some(ClassResource {
            resource,
            class_name,
        })
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }
}

/// `/a/b/C.class` derives `a.b.C`; anything else derives nothing.
pub(crate) fn class_name_of(rel_path: &str) -> Option<String> {
    let stripped = rel_path.strip_suffix(".class")?;
    let trimmed = stripped.trim_start_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.replace('/', "."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::root::{ContentKind, RootCategory};
    use std::fs;

    fn tmp_root(dir: &std::path::Path) -> Root {
        Root::directory(dir, RootCategory::Unknown, ContentKind::Binary).unwrap()
    }

    fn resource(rel: &str) -> Resource {
        let dir = tempfile::tempdir().unwrap();
        Resource::new(tmp_root(dir.path()), rel)
    }

    #[test]
    fn derived_properties_come_from_the_path() {
        let r = resource("/a/b/Widget.class");
        assert_eq!(r.rel_path(), "/a/b/Widget.class");
        assert_eq!(r.depth(), 3);
        assert_eq!(r.extension(), Some("class"));
        assert!(r.has_extension("class"));
        assert_eq!(r.base_name(), "Widget");
        assert_eq!(r.path_without_extension(), "/a/b/Widget");
        assert_eq!(r.package_part().as_deref(), Some("a.b"));
    }

    #[test]
    fn top_level_entry_has_no_package_part() {
        let r = resource("Widget.class");
        assert_eq!(r.rel_path(), "/Widget.class");
        assert_eq!(r.depth(), 1);
        assert!(r.package_part().is_none());
    }

    #[test]
    fn directory_like_paths_have_no_extension() {
        let r = resource("/a/b/");
        assert!(r.extension().is_none());
        let plain = resource("/a/b/README");
        assert!(plain.extension().is_none());
        assert_eq!(plain.base_name(), "README");
    }

    #[test]
    fn construction_normalizes_the_path() {
        let r = resource("a\\b\\c.txt");
        assert_eq!(r.rel_path(), "/a/b/c.txt");
    }

    #[test]
    fn equality_is_path_and_root_identity() {
        let dir = tempfile::tempdir().unwrap();
        let root = tmp_root(dir.path());
        let a = Resource::new(root.clone(), "/x");
        let b = Resource::new(root.clone(), "x");
        let c = Resource::new(root, "/y");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn content_reads_through_the_owning_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("note.txt"), "hello").unwrap();
        let root = tmp_root(dir.path());
        let r = root.resource("/note.txt").unwrap();
        assert!(r.exists());
        assert_eq!(r.read_string().unwrap(), "hello");

        // re-reading re-invokes the root rather than any cache
        fs::write(dir.path().join("note.txt"), "changed").unwrap();
        assert_eq!(r.read_string().unwrap(), "changed");
    }

    #[test]
    fn invalid_utf8_is_an_encoding_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bin"), [0xff, 0xfe, 0x00]).unwrap();
        let root = tmp_root(dir.path());
        let r = root.resource("/bin").unwrap();
        let err = r.read_string().unwrap_err();
        assert!(matches!(err, ScanError::Encoding { .. }), "got {err:?}");
        assert_eq!(r.read_bytes().unwrap(), vec![0xff, 0xfe, 0x00]);
    }

    #[test]
    fn class_names_derive_only_from_class_artifacts() {
        assert_eq!(class_name_of("/a/b/C.class").as_deref(), Some("a.b.C"));
        assert_eq!(class_name_of("/C.class").as_deref(), Some("C"));
        assert_eq!(
            class_name_of("/a/B$Inner.class").as_deref(),
            Some("a.B$Inner")
        );
        assert!(class_name_of("/a/b/C.java").is_none());
        assert!(class_name_of("/a/b/c.txt").is_none());
        assert!(class_name_of("/.class").is_none());
    }

    #[test]
    fn class_resource_pairs_resource_and_name() {
        let r = resource("/org/demo/Thing.class");
        let cr = ClassResource::from_resource(r.clone()).unwrap();
        assert_eq!(cr.class_name(), "org.demo.Thing");
        assert_eq!(cr.resource(), &r);
        assert!(ClassResource::from_resource(resource("/notes.md")).is_none());
    }
}
