use std::rc::Rc;

use crate::error::ScanError;
use crate::reflect::ReflectedClass;
use crate::resource::{ClassResource, Resource};
use crate::root::Root;

// ---------------------------------------------------------------------------
// ScanListener
// ---------------------------------------------------------------------------

/// Matched/ignored/error callbacks for every stage of a discovery run.
///
/// All notification hooks default to no-ops. The error hooks carry the
/// policy: the defaults fail fast (a class-load failure becomes a fatal
/// "error processing" error, a root traversal error stops the run), so no
/// work is ever dropped silently. Wrap a listener in [`SwallowErrors`] to opt
/// into continue-and-report instead.
pub trait ScanListener {
    fn on_root_matched(&self, _root: &Root) {}
    fn on_root_ignored(&self, _root: &Root) {}
    fn on_resource_matched(&self, _resource: &Resource) {}
    fn on_resource_ignored(&self, _resource: &Resource) {}
    fn on_class_name_matched(&self, _candidate: &ClassResource) {}
    fn on_class_name_ignored(&self, _candidate: &ClassResource) {}
    fn on_class_matched(&self, _class: &ReflectedClass) {}
    fn on_class_ignored(&self, _class: &ReflectedClass) {}

    /// A candidate class failed to load. Return `Ok` to continue the run
    /// with the next candidate.
    fn on_class_error(
        &self,
        resource: &Resource,
        _class_name: &str,
        error: ScanError,
    ) -> Result<(), ScanError> {
        Err(ScanError::fatal(resource.full_path_info(), error))
    }

    /// A root's traversal failed. Return `Ok` to continue with the remaining
    /// roots.
    fn on_root_error(&self, _root: &Root, error: ScanError) -> Result<(), ScanError> {
        Err(error)
    }
}

/// The strict default listener: silent on progress, fail-fast on errors.
pub struct BaseListener;

impl ScanListener for BaseListener {}

impl ScanListener for Box<dyn ScanListener> {
    fn on_root_matched(&self, root: &Root) {
        (**self).on_root_matched(root)
    }

    fn on_root_ignored(&self, root: &Root) {
        (**self).on_root_ignored(root)
    }

    fn on_resource_matched(&self, resource: &Resource) {
        (**self).on_resource_matched(resource)
    }

    fn on_resource_ignored(&self, resource: &Resource) {
        (**self).on_resource_ignored(resource)
    }

    fn on_class_name_matched(&self, candidate: &ClassResource) {
        (**self).on_class_name_matched(candidate)
    }

    fn on_class_name_ignored(&self, candidate: &ClassResource) {
        (**self).on_class_name_ignored(candidate)
    }

    fn on_class_matched(&self, class: &ReflectedClass) {
        (**self).on_class_matched(class)
    }

    fn on_class_ignored(&self, class: &ReflectedClass) {
        (**self).on_class_ignored(class)
    }

    fn on_class_error(
        &self,
        resource: &Resource,
        class_name: &str,
        error: ScanError,
    ) -> Result<(), ScanError> {
        (**self).on_class_error(resource, class_name, error)
    }

    fn on_root_error(&self, root: &Root, error: ScanError) -> Result<(), ScanError> {
        (**self).on_root_error(root, error)
    }
}

impl<T: ScanListener + ?Sized> ScanListener for Rc<T> {
    fn on_root_matched(&self, root: &Root) {
        (**self).on_root_matched(root)
    }

    fn on_root_ignored(&self, root: &Root) {
        (**self).on_root_ignored(root)
    }

    fn on_resource_matched(&self, resource: &Resource) {
        (**self).on_resource_matched(resource)
    }

    fn on_resource_ignored(&self, resource: &Resource) {
        (**self).on_resource_ignored(resource)
    }

    fn on_class_name_matched(&self, candidate: &ClassResource) {
        (**self).on_class_name_matched(candidate)
    }

    fn on_class_name_ignored(&self, candidate: &ClassResource) {
        (**self).on_class_name_ignored(candidate)
    }

    fn on_class_matched(&self, class: &ReflectedClass) {
        (**self).on_class_matched(class)
    }

    fn on_class_ignored(&self, class: &ReflectedClass) {
        (**self).on_class_ignored(class)
    }

    fn on_class_error(
        &self,
        resource: &Resource,
        class_name: &str,
        error: ScanError,
    ) -> Result<(), ScanError> {
        (**self).on_class_error(resource, class_name, error)
    }

    fn on_root_error(&self, root: &Root, error: ScanError) -> Result<(), ScanError> {
        (**self).on_root_error(root, error)
    }
}

// ---------------------------------------------------------------------------
// LoggingListener
// ---------------------------------------------------------------------------

/// Logs every matched and ignored element through the `log` facade.
/// Error policy stays at the strict defaults.
pub struct LoggingListener;

impl ScanListener for LoggingListener {
    fn on_root_matched(&self, root: &Root) {
        log::debug!("matched root {}", root.path_name());
    }

    fn on_root_ignored(&self, root: &Root) {
        log::debug!("ignored root {}", root.path_name());
    }

    fn on_resource_matched(&self, resource: &Resource) {
        log::debug!("matched resource {}", resource.rel_path());
    }

    fn on_resource_ignored(&self, resource: &Resource) {
        log::debug!("ignored resource {}", resource.rel_path());
    }

    fn on_class_name_matched(&self, candidate: &ClassResource) {
        log::debug!("matched class name {}", candidate.class_name());
    }

    fn on_class_name_ignored(&self, candidate: &ClassResource) {
        log::debug!("ignored class name {}", candidate.class_name());
    }

    fn on_class_matched(&self, class: &ReflectedClass) {
        log::debug!("matched class {}", class.name());
    }

    fn on_class_ignored(&self, class: &ReflectedClass) {
        log::debug!("ignored class {}", class.name());
    }
}

// ---------------------------------------------------------------------------
// SwallowErrors
// ---------------------------------------------------------------------------

/// Converts class-load and root-traversal failures into logged warnings so
/// the run continues with whatever remains. Notifications still reach the
/// wrapped listener.
pub struct SwallowErrors<L>(pub L);

impl<L: ScanListener> ScanListener for SwallowErrors<L> {
    fn on_root_matched(&self, root: &Root) {
        self.0.on_root_matched(root)
    }

    fn on_root_ignored(&self, root: &Root) {
        self.0.on_root_ignored(root)
    }

    fn on_resource_matched(&self, resource: &Resource) {
        self.0.on_resource_matched(resource)
    }

    fn on_resource_ignored(&self, resource: &Resource) {
        self.0.on_resource_ignored(resource)
    }

    fn on_class_name_matched(&self, candidate: &ClassResource) {
        self.0.on_class_name_matched(candidate)
    }

    fn on_class_name_ignored(&self, candidate: &ClassResource) {
        self.0.on_class_name_ignored(candidate)
    }

    fn on_class_matched(&self, class: &ReflectedClass) {
        self.0.on_class_matched(class)
    }

    fn on_class_ignored(&self, class: &ReflectedClass) {
        self.0.on_class_ignored(class)
    }

    fn on_class_error(
        &self,
        resource: &Resource,
        class_name: &str,
        error: ScanError,
    ) -> Result<(), ScanError> {
        log::warn!(
            "skipping unloadable class '{class_name}' at {}: {error}",
            resource.full_path_info()
        );
        Ok(())
    }

    fn on_root_error(&self, root: &Root, error: ScanError) -> Result<(), ScanError> {
        log::warn!("skipping root {}: {error}", root.path_name());
        Ok(())
    }
}
