use std::sync::Arc;

use crate::error::ScanError;
use crate::listener::{BaseListener, ScanListener, SwallowErrors};
use crate::matcher::{any_if_none, Matcher};
use crate::reflect::{ReflectedClass, TypeLoader};
use crate::resource::{ClassResource, Resource};
use crate::results::FindResult;
use crate::root::{CancelToken, Root, RootCategory, RootVisitor};
use crate::roots::RootsBuilder;
use crate::rules::RuleSet;

// ---------------------------------------------------------------------------
// ScanFilter
// ---------------------------------------------------------------------------

/// Per-stage inclusion decisions for a discovery run. Everything is included
/// by default; override the stages that matter.
pub trait ScanFilter {
    /// Whether to descend into this root at all.
    fn is_include_root(&self, _root: &Root) -> bool {
        true
    }

    fn is_include_resource(&self, _resource: &Resource) -> bool {
        true
    }

    /// Runs on derived names before any class loading is attempted.
    fn is_include_class_resource(&self, _candidate: &ClassResource) -> bool {
        true
    }

    fn is_include_class(&self, _class: &ReflectedClass) -> bool {
        true
    }
}

/// The default filter: includes everything.
pub struct AcceptAll;

impl ScanFilter for AcceptAll {}

// ---------------------------------------------------------------------------
// FilterSet
// ---------------------------------------------------------------------------

/// A [`ScanFilter`] assembled from matchers: an optional root matcher plus
/// include/exclude rule sets for resources, derived class names, and loaded
/// classes. Omitted refinements include everything.
///
/// # Example
///
/// ```rust
/// use cpscan::matcher::text;
/// use cpscan::matchers::{ClassMatcher, ResourceMatcher};
/// use cpscan::scanner::FilterSet;
///
/// let filter = FilterSet::with()
///     .include_resource(ResourceMatcher::with().extension("class"))
///     .exclude_class_name(text::containing("$"))
///     .include_class(ClassMatcher::that().is_not_interface())
///     .build();
/// ```
pub struct FilterSet {
    root_matcher: Box<dyn Matcher<Root>>,
    resource_matcher: Box<dyn Matcher<Resource>>,
    class_name_matcher: Box<dyn Matcher<String>>,
    class_matcher: Box<dyn Matcher<ReflectedClass>>,
}

impl FilterSet {
    pub fn with() -> FilterSetBuilder {
        FilterSetBuilder::default()
    }
}

impl ScanFilter for FilterSet {
    fn is_include_root(&self, root: &Root) -> bool {
        self.root_matcher.matches(root)
    }

    fn is_include_resource(&self, resource: &Resource) -> bool {
        self.resource_matcher.matches(resource)
    }

    fn is_include_class_resource(&self, candidate: &ClassResource) -> bool {
        self.class_name_matcher
            .matches(&candidate.class_name().to_string())
    }

    fn is_include_class(&self, class: &ReflectedClass) -> bool {
        self.class_matcher.matches(class)
    }
}

#[derive(Default)]
pub struct FilterSetBuilder {
    root_matcher: Option<Box<dyn Matcher<Root>>>,
    resources: RuleSet<Resource>,
    class_names: RuleSet<String>,
    classes: RuleSet<ReflectedClass>,
}

impl FilterSetBuilder {
    pub fn root_matches(mut self, matcher: impl Matcher<Root> + 'static) -> Self {
        self.root_matcher = Some(Box::new(matcher));
        self
    }

    pub fn include_resource(mut self, matcher: impl Matcher<Resource> + 'static) -> Self {
        self.resources = self.resources.include(matcher);
        self
    }

    pub fn exclude_resource(mut self, matcher: impl Matcher<Resource> + 'static) -> Self {
        self.resources = self.resources.exclude(matcher);
        self
    }

    pub fn include_class_name(mut self, matcher: impl Matcher<String> + 'static) -> Self {
        self.class_names = self.class_names.include(matcher);
        self
    }

    pub fn exclude_class_name(mut self, matcher: impl Matcher<String> + 'static) -> Self {
        self.class_names = self.class_names.exclude(matcher);
        self
    }

    pub fn include_class(mut self, matcher: impl Matcher<ReflectedClass> + 'static) -> Self {
        self.classes = self.classes.include(matcher);
        self
    }

    pub fn exclude_class(mut self, matcher: impl Matcher<ReflectedClass> + 'static) -> Self {
        self.classes = self.classes.exclude(matcher);
        self
    }

    pub fn build(self) -> FilterSet {
        FilterSet {
            root_matcher: any_if_none(self.root_matcher),
            resource_matcher: self.resources.build(),
            class_name_matcher: self.class_names.build(),
            class_matcher: self.classes.build(),
        }
    }
}

// ---------------------------------------------------------------------------
// ClassScanner
// ---------------------------------------------------------------------------

/// The discovery orchestrator: walks the configured roots, derives candidate
/// class names, loads them through the type loader and applies class-level
/// filtering, reporting matched/ignored/error at every stage.
///
/// Each stage returns a lazy [`FindResult`]; consuming an earlier stage never
/// forces a later, more expensive one to run. Execution is single-threaded,
/// synchronous and pull-based.
///
/// # Example
///
/// ```rust,no_run
/// use cpscan::reflect::MapTypeLoader;
/// use cpscan::roots::RootsBuilder;
///
/// let scanner = cpscan::scan()
///     .roots_from(RootsBuilder::new().root_path("target/classes")?)?
///     .type_loader(MapTypeLoader::new())
///     .build()?;
///
/// for class in scanner.find_classes()?.iter() {
///     println!("{}", class.name());
/// }
/// # Ok::<(), cpscan::ScanError>(())
/// ```
pub struct ClassScanner {
    roots: Vec<Root>,
    filter: Box<dyn ScanFilter>,
    listener: Box<dyn ScanListener>,
    loader: Option<Box<dyn TypeLoader>>,
    cancel: CancelToken,
}

impl ClassScanner {
    pub fn with() -> ClassScannerBuilder {
        ClassScannerBuilder::default()
    }

    /// Stage 1+2: walk every included root and collect the resources the
    /// filter accepts, in traversal order.
    ///
    /// # Errors
    ///
    /// Root traversal failures are routed through the listener's
    /// `on_root_error`; the strict default stops the run, a swallowing
    /// listener continues with the remaining roots.
    pub fn find_resources(&self) -> Result<FindResult<Resource>, ScanError> {
        let mut visitor = CollectingVisitor {
            filter: self.filter.as_ref(),
            listener: self.listener.as_ref(),
            found: Vec::new(),
        };
        for root in &self.roots {
            if let Err(error) = root.accept(&mut visitor, &self.cancel) {
                self.listener.on_root_error(root, error)?;
            }
        }
        Ok(FindResult::from_vec(visitor.found))
    }

    /// Stage 3: derive fully-qualified names from compiled-type artifacts,
    /// filtered before any loading is attempted.
    pub fn find_class_resources(&self) -> Result<FindResult<ClassResource>, ScanError> {
        let resources = self.find_resources()?;
        let mut found = Vec::new();
        for resource in resources.iter() {
            if !resource.has_extension("class") {
                continue;
            }
            let Some(candidate) = ClassResource::from_resource(resource) else {
                continue;
            };
            if self.filter.is_include_class_resource(&candidate) {
                self.listener.on_class_name_matched(&candidate);
                found.push(candidate);
            } else {
                self.listener.on_class_name_ignored(&candidate);
            }
        }
        Ok(FindResult::from_vec(found))
    }

    /// The derived names alone, as a convenience view over
    /// [`find_class_resources`](Self::find_class_resources).
    pub fn find_class_names(&self) -> Result<FindResult<String>, ScanError> {
        Ok(self
            .find_class_resources()?
            .transform(|candidate| Some(candidate.class_name().to_string())))
    }

    /// Stage 4: load every candidate and apply the class-level filter.
    ///
    /// Per-candidate load failures go to the listener's `on_class_error` with
    /// resource and name attached and do not abort the run unless the
    /// listener says so.
    ///
    /// # Errors
    ///
    /// Configuration error if no type loader was provided.
    pub fn find_classes(&self) -> Result<FindResult<Arc<ReflectedClass>>, ScanError> {
        let loader = self
            .loader
            .as_deref()
            .ok_or_else(|| ScanError::Config("no type loader configured".into()))?;

        let candidates = self.find_class_resources()?;
        let mut found = Vec::new();
        for candidate in candidates.iter() {
            match loader.load(candidate.class_name()) {
                Ok(class) => {
                    if self.filter.is_include_class(&class) {
                        self.listener.on_class_matched(&class);
                        found.push(class);
                    } else {
                        self.listener.on_class_ignored(&class);
                    }
                }
                Err(error) => {
                    self.listener
                        .on_class_error(candidate.resource(), candidate.class_name(), error)?;
                }
            }
        }
        Ok(FindResult::from_vec(found))
    }
}

struct CollectingVisitor<'a> {
    filter: &'a dyn ScanFilter,
    listener: &'a dyn ScanListener,
    found: Vec<Resource>,
}

impl RootVisitor for CollectingVisitor<'_> {
    fn visit_root(&mut self, root: &Root) -> bool {
        if self.filter.is_include_root(root) {
            self.listener.on_root_matched(root);
            true
        } else {
            self.listener.on_root_ignored(root);
            false
        }
    }

    fn visit_resource(&mut self, resource: &Resource) {
        if self.filter.is_include_resource(resource) {
            self.listener.on_resource_matched(resource);
            self.found.push(resource.clone());
        } else {
            self.listener.on_resource_ignored(resource);
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct ClassScannerBuilder {
    roots: Vec<Root>,
    filter: Option<Box<dyn ScanFilter>>,
    listener: Option<Box<dyn ScanListener>>,
    loader: Option<Box<dyn TypeLoader>>,
    cancel: CancelToken,
    swallow_errors: bool,
}

impl ClassScannerBuilder {
    /// Add one explicit root.
    pub fn root(mut self, root: Root) -> Self {
        self.roots.push(root);
        self
    }

    /// Add prebuilt roots.
    pub fn roots(mut self, roots: impl IntoIterator<Item = Root>) -> Self {
        self.roots.extend(roots);
        self
    }

    /// Build and add roots from a [`RootsBuilder`].
    ///
    /// # Errors
    ///
    /// Whatever the roots builder raises.
    pub fn roots_from(mut self, builder: RootsBuilder) -> Result<Self, ScanError> {
        self.roots.extend(builder.build()?);
        Ok(self)
    }

    pub fn filter(mut self, filter: impl ScanFilter + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    pub fn listener(mut self, listener: impl ScanListener + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn type_loader(mut self, loader: impl TypeLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    /// Cancellation flag checked between resource visits during traversal.
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Convert class-load and root-traversal failures into logged ignores
    /// instead of the strict fail-fast default.
    pub fn swallow_errors(mut self) -> Self {
        self.swallow_errors = true;
        self
    }

    /// # Errors
    ///
    /// Configuration errors from the assembled parts.
    pub fn build(self) -> Result<ClassScanner, ScanError> {
        let listener: Box<dyn ScanListener> = match (self.listener, self.swallow_errors) {
            (Some(listener), true) => Box::new(SwallowErrors(listener)),
            (Some(listener), false) => listener,
            (None, true) => Box::new(SwallowErrors(BaseListener)),
            (None, false) => Box::new(BaseListener),
        };
        Ok(ClassScanner {
            roots: ensure_unique(self.roots),
            filter: self.filter.unwrap_or_else(|| Box::new(AcceptAll)),
            listener,
            loader: self.loader,
            cancel: self.cancel,
        })
    }
}

/// Dedup by location, preserving first-seen order; a known-category root
/// replaces an unknown-category one recorded for the same key.
fn ensure_unique(roots: Vec<Root>) -> Vec<Root> {
    let mut index = std::collections::HashMap::new();
    let mut unique: Vec<Root> = Vec::with_capacity(roots.len());
    for root in roots {
        let key = root.path_name();
        match index.get(&key) {
            Some(&at) => {
                if root.category() != RootCategory::Unknown {
                    unique[at] = root;
                }
            }
            None => {
                index.insert(key, unique.len());
                unique.push(root);
            }
        }
    }
    unique
}
