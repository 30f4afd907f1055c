//! # cpscan
//!
//! Lazy classpath scanning engine — uniform roots, composable matchers,
//! embeddable, zero opinions.
//!
//! cpscan walks heterogeneous containers of compiled program artifacts
//! (directory trees, jar/zip archives) behind one traversal contract, pulls
//! the resulting items through a lazy, single-pass result pipeline, and
//! filters them with a composable matcher algebra. It underlies tooling that
//! needs to discover candidate types and members; it owns the traversal, the
//! contracts ([`ScanFilter`](scanner::ScanFilter), [`Matcher`](matcher::Matcher),
//! [`TypeLoader`](reflect::TypeLoader)), the error type, and the builder API.
//! It does **not** own reflection itself — embedders map their introspection
//! source onto [`ReflectedClass`](reflect::ReflectedClass).
//!
//! ## Architecture
//!
//! - **matcher**: predicate algebra with combinators and diagnostics
//! - **rules**: include/exclude rule sets with exclude-wins precedence
//! - **root**: the uniform container contract and its two backends
//!   (**directory**, **archive**)
//! - **resource**: path-addressed entry handles and class-name derivation
//! - **results**: the lazy filter/transform/expand result pipeline
//! - **reflect**: reflected-type model and the type-loader collaborator
//! - **matchers**: domain matchers over resources, classes and members
//! - **roots**: root-set assembly from explicit paths and a project layout
//! - **scanner**: the four-stage discovery orchestrator
//! - **listener**: per-stage callbacks and error policies
//!
//! # Quick Start
//!
//! ```rust
//! use std::fs;
//! use cpscan::matchers::ClassMatcher;
//! use cpscan::reflect::{MapTypeLoader, ReflectedClass};
//! use cpscan::root::{ContentKind, Root, RootCategory};
//! use cpscan::scanner::FilterSet;
//!
//! // A compiled-output directory with one class artifact
//! let dir = tempfile::tempdir().unwrap();
//! fs::create_dir_all(dir.path().join("org/demo")).unwrap();
//! fs::write(dir.path().join("org/demo/Widget.class"), b"").unwrap();
//!
//! let scanner = cpscan::scan()
//!     .root(Root::directory(dir.path(), RootCategory::Main, ContentKind::Binary)?)
//!     .filter(
//!         FilterSet::with()
//!             .include_class(ClassMatcher::that().is_not_interface())
//!             .build(),
//!     )
//!     .type_loader(MapTypeLoader::new().class(ReflectedClass::named("org.demo.Widget")))
//!     .build()?;
//!
//! let found = scanner.find_classes()?;
//! assert_eq!(found.first()?.name(), "org.demo.Widget");
//! # Ok::<(), cpscan::ScanError>(())
//! ```
//!
//! # Laziness
//!
//! Every stage hands back a [`FindResult`](results::FindResult): a
//! restartable view that does no work until a terminal operation drives it.
//! Consuming [`find_resources`](scanner::ClassScanner::find_resources) never
//! triggers class loading; composing `filter`/`transform` stages performs
//! zero I/O until `to_vec`, `first` or iteration.
//!
//! # Concurrency
//!
//! Single-threaded, synchronous, pull-based. The one concurrency-adjacent
//! feature is the [`CancelToken`](root::CancelToken) checked between resource
//! visits during traversal, intended to be tripped from another thread.

#![forbid(unsafe_code)]

pub mod archive;
pub mod directory;
pub mod error;
pub mod listener;
pub mod matcher;
pub mod matchers;
pub mod reflect;
pub mod resource;
pub mod results;
pub mod root;
pub mod roots;
pub mod rules;
pub mod scanner;

// ── Public re-exports ─────────────────────────────────────────────────────────

pub use error::{LoadFailure, ScanError};
pub use resource::{ClassResource, Resource};
pub use results::FindResult;
pub use root::{CancelToken, ContentKind, Root, RootCategory};
pub use scanner::{ClassScanner, ClassScannerBuilder};

// ── Entry point ───────────────────────────────────────────────────────────────

/// Create a new [`ClassScannerBuilder`] to configure and run a discovery run.
///
/// # Example
///
/// ```rust
/// use cpscan::root::{ContentKind, Root, RootCategory};
///
/// let dir = tempfile::tempdir().unwrap();
/// let scanner = cpscan::scan()
///     .root(Root::directory(dir.path(), RootCategory::Main, ContentKind::Binary)?)
///     .build()?;
///
/// assert!(scanner.find_resources()?.is_empty());
/// # Ok::<(), cpscan::ScanError>(())
/// ```
pub fn scan() -> ClassScannerBuilder {
    ClassScannerBuilder::default()
}
