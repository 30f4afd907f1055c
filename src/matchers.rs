use std::sync::Arc;

use crate::error::ScanError;
use crate::matcher::{not, property, text, Description, MatchDiagnostics, Matcher};
use crate::reflect::{Modifiers, ReflectedClass, ReflectedField, ReflectedMethod};
use crate::resource::Resource;

// ---------------------------------------------------------------------------
// Building blocks
// ---------------------------------------------------------------------------

/// A described closure predicate, for one-off conditions.
struct Predicate<T: ?Sized> {
    what: String,
    test: Box<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T: ?Sized> Matcher<T> for Predicate<T> {
    fn matches_with(&self, value: &T, _diag: &mut MatchDiagnostics) -> bool {
        (self.test)(value)
    }

    fn describe_to(&self, desc: &mut Description) {
        desc.text(self.what.clone());
    }
}

fn predicate<T: ?Sized + 'static>(
    what: impl Into<String>,
    test: impl Fn(&T) -> bool + Send + Sync + 'static,
) -> Box<dyn Matcher<T>> {
    Box::new(Predicate {
        what: what.into(),
        test: Box::new(test),
    })
}

/// Adapt a `Matcher<T>` to probe `Arc<T>` items flowing through a pipeline.
pub fn behind_arc<T: 'static>(matcher: impl Matcher<T> + 'static) -> Box<dyn Matcher<Arc<T>>> {
    struct ArcAdapter<T>(Box<dyn Matcher<T>>);

    impl<T> Matcher<Arc<T>> for ArcAdapter<T> {
        fn matches_with(&self, value: &Arc<T>, diag: &mut MatchDiagnostics) -> bool {
            self.0.matches_with(value, diag)
        }

        fn describe_to(&self, desc: &mut Description) {
            self.0.describe_to(desc);
        }
    }

    Box::new(ArcAdapter(Box::new(matcher)))
}

macro_rules! all_parts_matcher {
    ($name:ident, $target:ty) => {
        impl Matcher<$target> for $name {
            fn matches_with(&self, value: &$target, diag: &mut MatchDiagnostics) -> bool {
                self.parts.iter().all(|m| diag.try_match(value, m))
            }

            fn describe_to(&self, desc: &mut Description) {
                for m in &self.parts {
                    m.describe_to(desc);
                }
            }
        }
    };
}

// ---------------------------------------------------------------------------
// ResourceMatcher
// ---------------------------------------------------------------------------

/// Fluent matcher over [`Resource`]s. Every added condition must hold.
///
/// # Example
///
/// ```rust,ignore
/// let binary = ResourceMatcher::with().extension("class").path_glob("**/impl/**")?;
/// ```
#[derive(Default)]
pub struct ResourceMatcher {
    parts: Vec<Box<dyn Matcher<Resource>>>,
}

impl ResourceMatcher {
    pub fn with() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.parts.push(property(
            "rel_path",
            |r: &Resource| r.rel_path().to_string(),
            text::equal_to(path),
        ));
        self
    }

    pub fn path_ending_with(mut self, suffix: impl Into<String>) -> Self {
        self.parts.push(property(
            "rel_path",
            |r: &Resource| r.rel_path().to_string(),
            text::ending_with(suffix),
        ));
        self
    }

    /// # Errors
    ///
    /// Configuration error on an invalid glob pattern.
    pub fn path_glob(mut self, pattern: &str) -> Result<Self, ScanError> {
        self.parts.push(property(
            "rel_path",
            |r: &Resource| r.rel_path().to_string(),
            text::glob(pattern)?,
        ));
        Ok(self)
    }

    pub fn path_matching(mut self, matcher: Box<dyn Matcher<String>>) -> Self {
        self.parts.push(property(
            "rel_path",
            |r: &Resource| r.rel_path().to_string(),
            matcher,
        ));
        self
    }

    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.parts.push(property(
            "extension",
            |r: &Resource| r.extension().unwrap_or_default().to_string(),
            text::equal_to(extension),
        ));
        self
    }

    pub fn in_package(mut self, package: impl Into<String>) -> Self {
        self.parts.push(property(
            "package",
            |r: &Resource| r.package_part().unwrap_or_default(),
            text::equal_to(package),
        ));
        self
    }
}

all_parts_matcher!(ResourceMatcher, Resource);

// ---------------------------------------------------------------------------
// ClassMatcher
// ---------------------------------------------------------------------------

/// Fluent matcher over [`ReflectedClass`]es. Every added condition must hold.
#[derive(Default)]
pub struct ClassMatcher {
    parts: Vec<Box<dyn Matcher<ReflectedClass>>>,
}

impl ClassMatcher {
    pub fn with() -> Self {
        Self::default()
    }

    /// Synonym for [`with`](Self::with), reads better in some chains.
    pub fn that() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.parts.push(property(
            "name",
            |c: &ReflectedClass| c.name().to_string(),
            text::equal_to(name),
        ));
        self
    }

    /// # Errors
    ///
    /// Configuration error on an invalid glob pattern.
    pub fn name_glob(mut self, pattern: &str) -> Result<Self, ScanError> {
        self.parts.push(property(
            "name",
            |c: &ReflectedClass| c.name().to_string(),
            text::glob(pattern)?,
        ));
        Ok(self)
    }

    /// The class is, extends, or implements the named type.
    pub fn subclass_of(mut self, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        let what = format!("is subclass of '{type_name}'");
        self.parts
            .push(predicate(what, move |c: &ReflectedClass| {
                c.assignable_to(&type_name)
            }));
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        let annotation = annotation.into();
        let what = format!("has annotation '{annotation}'");
        self.parts
            .push(predicate(what, move |c: &ReflectedClass| {
                c.has_annotation(&annotation)
            }));
        self
    }

    pub fn modifier(mut self, modifiers: Modifiers) -> Self {
        let what = format!("has modifiers {modifiers:?}");
        self.parts.push(predicate(what, move |c: &ReflectedClass| {
            c.modifier_set().contains(modifiers)
        }));
        self
    }

    pub fn is_interface(mut self) -> Self {
        self.parts.push(interface_matcher());
        self
    }

    pub fn is_not_interface(mut self) -> Self {
        self.parts.push(not(interface_matcher()));
        self
    }

    pub fn is_enum(mut self) -> Self {
        self.parts.push(enum_matcher());
        self
    }

    pub fn is_not_enum(mut self) -> Self {
        self.parts.push(not(enum_matcher()));
        self
    }

    pub fn is_anonymous(mut self) -> Self {
        self.parts.push(anonymous_matcher());
        self
    }

    pub fn is_not_anonymous(mut self) -> Self {
        self.parts.push(not(anonymous_matcher()));
        self
    }

    pub fn is_inner(mut self) -> Self {
        self.parts.push(inner_matcher());
        self
    }

    pub fn is_not_inner(mut self) -> Self {
        self.parts.push(not(inner_matcher()));
        self
    }

    /// Not anonymous, not an interface, not an inner class.
    pub fn public_concrete(self) -> Self {
        self.is_not_anonymous().is_not_interface().is_not_inner()
    }
}

all_parts_matcher!(ClassMatcher, ReflectedClass);

fn interface_matcher() -> Box<dyn Matcher<ReflectedClass>> {
    predicate("is interface", |c: &ReflectedClass| c.is_interface())
}

fn enum_matcher() -> Box<dyn Matcher<ReflectedClass>> {
    predicate("is enum", |c: &ReflectedClass| c.is_enum())
}

fn anonymous_matcher() -> Box<dyn Matcher<ReflectedClass>> {
    predicate("is anonymous", |c: &ReflectedClass| c.is_anonymous())
}

fn inner_matcher() -> Box<dyn Matcher<ReflectedClass>> {
    predicate("is inner class", |c: &ReflectedClass| c.is_inner())
}

// ---------------------------------------------------------------------------
// MethodMatcher / FieldMatcher
// ---------------------------------------------------------------------------

/// Fluent matcher over [`ReflectedMethod`]s.
#[derive(Default)]
pub struct MethodMatcher {
    parts: Vec<Box<dyn Matcher<ReflectedMethod>>>,
}

impl MethodMatcher {
    pub fn with() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.parts.push(property(
            "name",
            |m: &ReflectedMethod| m.name().to_string(),
            text::equal_to(name),
        ));
        self
    }

    /// # Errors
    ///
    /// Configuration error on an invalid glob pattern.
    pub fn name_glob(mut self, pattern: &str) -> Result<Self, ScanError> {
        self.parts.push(property(
            "name",
            |m: &ReflectedMethod| m.name().to_string(),
            text::glob(pattern)?,
        ));
        Ok(self)
    }

    pub fn modifier(mut self, modifiers: Modifiers) -> Self {
        let what = format!("has modifiers {modifiers:?}");
        self.parts
            .push(predicate(what, move |m: &ReflectedMethod| {
                m.modifier_set().contains(modifiers)
            }));
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        let annotation = annotation.into();
        let what = format!("has annotation '{annotation}'");
        self.parts
            .push(predicate(what, move |m: &ReflectedMethod| {
                m.has_annotation(&annotation)
            }));
        self
    }

    pub fn param_count(mut self, count: usize) -> Self {
        let what = format!("has {count} params");
        self.parts.push(predicate(what, move |m: &ReflectedMethod| {
            m.param_types().len() == count
        }));
        self
    }
}

all_parts_matcher!(MethodMatcher, ReflectedMethod);

/// Fluent matcher over [`ReflectedField`]s.
#[derive(Default)]
pub struct FieldMatcher {
    parts: Vec<Box<dyn Matcher<ReflectedField>>>,
}

impl FieldMatcher {
    pub fn with() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.parts.push(property(
            "name",
            |f: &ReflectedField| f.name().to_string(),
            text::equal_to(name),
        ));
        self
    }

    pub fn of_type(mut self, type_name: impl Into<String>) -> Self {
        self.parts.push(property(
            "type",
            |f: &ReflectedField| f.type_name().to_string(),
            text::equal_to(type_name),
        ));
        self
    }

    pub fn modifier(mut self, modifiers: Modifiers) -> Self {
        let what = format!("has modifiers {modifiers:?}");
        self.parts.push(predicate(what, move |f: &ReflectedField| {
            f.modifier_set().contains(modifiers)
        }));
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        let annotation = annotation.into();
        let what = format!("has annotation '{annotation}'");
        self.parts.push(predicate(what, move |f: &ReflectedField| {
            f.has_annotation(&annotation)
        }));
        self
    }
}

all_parts_matcher!(FieldMatcher, ReflectedField);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::TypeKind;
    use crate::root::{ContentKind, Root, RootCategory};

    fn resource(rel: &str) -> Resource {
        let dir = tempfile::tempdir().unwrap();
        let root =
            Root::directory(dir.path(), RootCategory::Unknown, ContentKind::Binary).unwrap();
        root.resource(rel).unwrap()
    }

    #[test]
    fn resource_matcher_conditions_all_apply() {
        let r = resource("/a/b/Widget.class");
        assert!(ResourceMatcher::with().path("/a/b/Widget.class").matches(&r));
        assert!(!ResourceMatcher::with().path("/a/b/Widget.clas").matches(&r));
        assert!(ResourceMatcher::with().path_ending_with("b/Widget.class").matches(&r));
        assert!(ResourceMatcher::with()
            .extension("class")
            .in_package("a.b")
            .matches(&r));
        assert!(!ResourceMatcher::with()
            .extension("class")
            .in_package("a.c")
            .matches(&r));
    }

    #[test]
    fn resource_matcher_glob_paths() {
        let r = resource("/org/demo/impl/Widget.class");
        assert!(ResourceMatcher::with()
            .path_glob("**/impl/**")
            .unwrap()
            .matches(&r));
        assert!(!ResourceMatcher::with()
            .path_glob("**/api/**")
            .unwrap()
            .matches(&r));
        assert!(ResourceMatcher::with().path_glob("[bad").is_err());
    }

    #[test]
    fn class_matcher_kind_predicates() {
        let iface = ReflectedClass::named("a.I").kind(TypeKind::Interface);
        let concrete = ReflectedClass::named("a.C").supertype("a.I");

        assert!(ClassMatcher::that().is_interface().matches(&iface));
        assert!(!ClassMatcher::that().is_interface().matches(&concrete));
        assert!(ClassMatcher::that().is_not_interface().matches(&concrete));
        assert!(ClassMatcher::that().subclass_of("a.I").matches(&concrete));
        assert!(ClassMatcher::that().subclass_of("a.I").matches(&iface));
        assert!(!ClassMatcher::that().subclass_of("a.X").matches(&concrete));
    }

    #[test]
    fn class_matcher_annotations_and_modifiers() {
        let c = ReflectedClass::named("a.Service")
            .modifiers(Modifiers::PUBLIC.and(Modifiers::FINAL))
            .annotation("a.Component");

        assert!(ClassMatcher::with().with_annotation("a.Component").matches(&c));
        assert!(!ClassMatcher::with().with_annotation("a.Absent").matches(&c));
        assert!(ClassMatcher::with().modifier(Modifiers::PUBLIC).matches(&c));
        assert!(!ClassMatcher::with().modifier(Modifiers::ABSTRACT).matches(&c));
    }

    #[test]
    fn public_concrete_excludes_special_shapes() {
        let plain = ReflectedClass::named("a.Plain");
        let anon = ReflectedClass::named("a.Plain$1").anonymous(true);
        let inner = ReflectedClass::named("a.Plain$Inner").inner(true);

        let m = ClassMatcher::that().public_concrete();
        assert!(m.matches(&plain));
        assert!(!m.matches(&anon));
        assert!(!m.matches(&inner));
    }

    #[test]
    fn behind_arc_probes_shared_classes() {
        let m = behind_arc(ClassMatcher::that().named("a.C"));
        assert!(m.matches(&Arc::new(ReflectedClass::named("a.C"))));
        assert!(!m.matches(&Arc::new(ReflectedClass::named("a.D"))));
    }

    #[test]
    fn method_and_field_matchers() {
        let m = crate::reflect::ReflectedMethod::named("save")
            .modifiers(Modifiers::PUBLIC)
            .annotation("a.Tx")
            .param("long");
        assert!(MethodMatcher::with()
            .named("save")
            .modifier(Modifiers::PUBLIC)
            .with_annotation("a.Tx")
            .param_count(1)
            .matches(&m));
        assert!(!MethodMatcher::with().param_count(2).matches(&m));
        assert!(MethodMatcher::with().name_glob("sa*").unwrap().matches(&m));

        let f = crate::reflect::ReflectedField::named("id", "long").modifiers(Modifiers::PRIVATE);
        assert!(FieldMatcher::with().named("id").of_type("long").matches(&f));
        assert!(!FieldMatcher::with().modifier(Modifiers::PUBLIC).matches(&f));
    }
}
