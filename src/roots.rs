use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use crate::error::ScanError;
use crate::root::{ContentKind, Root, RootCategory};

// ---------------------------------------------------------------------------
// ProjectLayout
// ---------------------------------------------------------------------------

/// The project-layout collaborator: supplies the ordered directory lists a
/// default root set is built from.
///
/// Externally owned; the builder invokes exactly the accessors whose
/// inclusion flags are set and nothing else.
pub trait ProjectLayout {
    fn base_dir(&self) -> PathBuf;
    fn main_src_dirs(&self) -> Vec<PathBuf>;
    fn test_src_dirs(&self) -> Vec<PathBuf>;
    fn generated_src_dirs(&self) -> Vec<PathBuf>;
    fn main_output_dirs(&self) -> Vec<PathBuf>;
    fn test_output_dirs(&self) -> Vec<PathBuf>;
}

/// Conventional Maven-style layout rooted at one base directory.
pub struct MavenLayout {
    base: PathBuf,
}

impl MavenLayout {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl ProjectLayout for MavenLayout {
    fn base_dir(&self) -> PathBuf {
        self.base.clone()
    }

    fn main_src_dirs(&self) -> Vec<PathBuf> {
        vec![self.base.join("src/main/java")]
    }

    fn test_src_dirs(&self) -> Vec<PathBuf> {
        vec![self.base.join("src/test/java")]
    }

    fn generated_src_dirs(&self) -> Vec<PathBuf> {
        vec![self.base.join("target/generated-sources")]
    }

    fn main_output_dirs(&self) -> Vec<PathBuf> {
        vec![self.base.join("target/classes")]
    }

    fn test_output_dirs(&self) -> Vec<PathBuf> {
        vec![self.base.join("target/test-classes")]
    }
}

// ---------------------------------------------------------------------------
// RootsBuilder
// ---------------------------------------------------------------------------

const DEFAULT_ARCHIVE_EXTENSIONS: [&str; 5] = ["jar", "zip", "war", "ear", "nar"];

/// Assembles the ordered, deduplicated root list a scan runs over.
///
/// Roots are keyed by location. First-seen wins, except that a root with a
/// known category always replaces a previously recorded unknown-category root
/// for the same key; load order is significant.
///
/// # Example
///
/// ```rust,no_run
/// use cpscan::roots::{MavenLayout, RootsBuilder};
///
/// let roots = RootsBuilder::new()
///     .layout(MavenLayout::new("/work/project"))
///     .main_output(true)
///     .test_output(true)
///     .root_path("/work/libs/util.jar")?
///     .build()?;
/// # Ok::<(), cpscan::ScanError>(())
/// ```
pub struct RootsBuilder {
    roots: Vec<Root>,
    index: HashMap<String, usize>,
    layout: Option<Box<dyn ProjectLayout>>,
    include_main_src: bool,
    include_test_src: bool,
    include_generated_src: bool,
    include_main_output: bool,
    include_test_output: bool,
    archive_extensions: BTreeSet<String>,
    ignore_unknown: bool,
}

impl Default for RootsBuilder {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            index: HashMap::new(),
            layout: None,
            include_main_src: true,
            include_test_src: false,
            include_generated_src: false,
            include_main_output: false,
            include_test_output: false,
            archive_extensions: DEFAULT_ARCHIVE_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ignore_unknown: false,
        }
    }
}

impl RootsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The project-layout collaborator the inclusion flags draw from. Flags
    /// are inert until a layout is configured.
    pub fn layout(mut self, layout: impl ProjectLayout + 'static) -> Self {
        self.layout = Some(Box::new(layout));
        self
    }

    pub fn main_src(mut self, include: bool) -> Self {
        self.include_main_src = include;
        self
    }

    pub fn test_src(mut self, include: bool) -> Self {
        self.include_test_src = include;
        self
    }

    pub fn generated_src(mut self, include: bool) -> Self {
        self.include_generated_src = include;
        self
    }

    pub fn main_output(mut self, include: bool) -> Self {
        self.include_main_output = include;
        self
    }

    pub fn test_output(mut self, include: bool) -> Self {
        self.include_test_output = include;
        self
    }

    pub fn all_src(self) -> Self {
        self.main_src(true).test_src(true).generated_src(true)
    }

    pub fn all_output(self) -> Self {
        self.main_output(true).test_output(true)
    }

    /// Add a file extension denoting an archive root, e.g. `"apk"`.
    /// Defaults cover jar, zip, war, ear and nar.
    pub fn archive_extension(mut self, extension: impl Into<String>) -> Self {
        self.archive_extensions.insert(extension.into().to_lowercase());
        self
    }

    /// Silently skip file roots whose extension is not a recognized archive
    /// type instead of failing the build.
    pub fn ignore_unknown_root_types(mut self, ignore: bool) -> Self {
        self.ignore_unknown = ignore;
        self
    }

    /// Add an explicit root.
    pub fn root(mut self, root: Root) -> Self {
        self.insert(root);
        self
    }

    /// Add a root by path: directories become directory roots, files with a
    /// recognized archive extension become archive roots.
    ///
    /// # Errors
    ///
    /// Configuration error for a file with an unrecognized extension, unless
    /// [`ignore_unknown_root_types`](Self::ignore_unknown_root_types) is set.
    pub fn root_path(mut self, path: impl AsRef<Path>) -> Result<Self, ScanError> {
        let path = path.as_ref();
        if path.is_file() {
            let extension = path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            if self.archive_extensions.contains(&extension) {
                let root = Root::archive(path, RootCategory::Dependency, ContentKind::Binary)?;
                self.insert(root);
            } else if self.ignore_unknown {
                log::debug!("skipping unknown root type '{}'", path.display());
            } else {
                return Err(ScanError::UnsupportedRoot {
                    path: path.to_path_buf(),
                });
            }
        } else {
            let root = Root::directory(path, RootCategory::Dependency, ContentKind::Binary)?;
            self.insert(root);
        }
        Ok(self)
    }

    pub fn root_paths<P: AsRef<Path>>(
        mut self,
        paths: impl IntoIterator<Item = P>,
    ) -> Result<Self, ScanError> {
        for path in paths {
            self = self.root_path(path)?;
        }
        Ok(self)
    }

    fn insert(&mut self, root: Root) {
        let key = root.path_name();
        match self.index.get(&key) {
            Some(&at) => {
                if root.category() != RootCategory::Unknown {
                    self.roots[at] = root;
                }
            }
            None => {
                self.index.insert(key, self.roots.len());
                self.roots.push(root);
            }
        }
    }

    fn insert_dirs(
        &mut self,
        dirs: Vec<PathBuf>,
        category: RootCategory,
        kind: ContentKind,
    ) -> Result<(), ScanError> {
        for dir in dirs {
            let root = Root::directory(dir, category, kind)?;
            self.insert(root);
        }
        Ok(())
    }

    /// Build the root list: explicit roots first, then the layout directories
    /// whose inclusion flags are set, in a fixed order.
    pub fn build(mut self) -> Result<Vec<Root>, ScanError> {
        if let Some(layout) = self.layout.take() {
            if self.include_main_src {
                self.insert_dirs(layout.main_src_dirs(), RootCategory::Main, ContentKind::Source)?;
            }
            if self.include_test_src {
                self.insert_dirs(layout.test_src_dirs(), RootCategory::Test, ContentKind::Source)?;
            }
            if self.include_generated_src {
                self.insert_dirs(
                    layout.generated_src_dirs(),
                    RootCategory::Generated,
                    ContentKind::Source,
                )?;
            }
            if self.include_main_output {
                self.insert_dirs(
                    layout.main_output_dirs(),
                    RootCategory::Main,
                    ContentKind::Binary,
                )?;
            }
            if self.include_test_output {
                self.insert_dirs(
                    layout.test_output_dirs(),
                    RootCategory::Test,
                    ContentKind::Binary,
                )?;
            }
        }
        Ok(self.roots)
    }
}
