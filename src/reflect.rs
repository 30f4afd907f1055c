use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{LoadFailure, ScanError};
use crate::matcher::Matcher;
use crate::results::FindResult;

// ---------------------------------------------------------------------------
// Modifiers
// ---------------------------------------------------------------------------

/// Bit set of member/type modifiers on a reflected element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(u32);

impl Modifiers {
    pub const PUBLIC: Modifiers = Modifiers(1 << 0);
    pub const PRIVATE: Modifiers = Modifiers(1 << 1);
    pub const PROTECTED: Modifiers = Modifiers(1 << 2);
    pub const STATIC: Modifiers = Modifiers(1 << 3);
    pub const FINAL: Modifiers = Modifiers(1 << 4);
    pub const SYNCHRONIZED: Modifiers = Modifiers(1 << 5);
    pub const VOLATILE: Modifiers = Modifiers(1 << 6);
    pub const TRANSIENT: Modifiers = Modifiers(1 << 7);
    pub const NATIVE: Modifiers = Modifiers(1 << 8);
    pub const ABSTRACT: Modifiers = Modifiers(1 << 10);
    pub const STRICT: Modifiers = Modifiers(1 << 11);

    pub fn empty() -> Modifiers {
        Modifiers(0)
    }

    pub fn and(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }

    /// All bits of `other` present in `self`.
    pub fn contains(self, other: Modifiers) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn is_public(self) -> bool {
        self.contains(Self::PUBLIC)
    }

    pub fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    pub fn is_abstract(self) -> bool {
        self.contains(Self::ABSTRACT)
    }

    pub fn is_final(self) -> bool {
        self.contains(Self::FINAL)
    }
}

/// What sort of type a reflected class is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Annotation,
}

// ---------------------------------------------------------------------------
// Reflected members
// ---------------------------------------------------------------------------

/// A method on a reflected class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedMethod {
    name: String,
    modifiers: Modifiers,
    annotations: Vec<String>,
    param_types: Vec<String>,
}

impl ReflectedMethod {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modifiers: Modifiers::empty(),
            annotations: Vec::new(),
            param_types: Vec::new(),
        }
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn annotation(mut self, name: impl Into<String>) -> Self {
        self.annotations.push(name.into());
        self
    }

    pub fn param(mut self, type_name: impl Into<String>) -> Self {
        self.param_types.push(type_name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn modifier_set(&self) -> Modifiers {
        self.modifiers
    }

    pub fn annotations(&self) -> &[String] {
        &self.annotations
    }

    pub fn param_types(&self) -> &[String] {
        &self.param_types
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a == name)
    }
}

/// A field on a reflected class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedField {
    name: String,
    type_name: String,
    modifiers: Modifiers,
    annotations: Vec<String>,
}

impl ReflectedField {
    pub fn named(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            modifiers: Modifiers::empty(),
            annotations: Vec::new(),
        }
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn annotation(mut self, name: impl Into<String>) -> Self {
        self.annotations.push(name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn modifier_set(&self) -> Modifiers {
        self.modifiers
    }

    pub fn annotations(&self) -> &[String] {
        &self.annotations
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a == name)
    }
}

// ---------------------------------------------------------------------------
// ReflectedClass
// ---------------------------------------------------------------------------

/// An opaque reflected element: whatever the host introspection facility
/// exposed about one loaded type, as plain data.
///
/// Assembled by a [`TypeLoader`]; embedders map their own reflection source
/// onto this shape. `supertypes` holds the transitive superclass and
/// interface names so assignability is answerable without a loader round
/// trip.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectedClass {
    name: String,
    kind: TypeKind,
    modifiers: Modifiers,
    annotations: Vec<String>,
    anonymous: bool,
    inner: bool,
    supertypes: Vec<String>,
    methods: Vec<ReflectedMethod>,
    fields: Vec<ReflectedField>,
}

impl ReflectedClass {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Class,
            modifiers: Modifiers::empty(),
            annotations: Vec::new(),
            anonymous: false,
            inner: false,
            supertypes: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn kind(mut self, kind: TypeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn annotation(mut self, name: impl Into<String>) -> Self {
        self.annotations.push(name.into());
        self
    }

    pub fn anonymous(mut self, yes: bool) -> Self {
        self.anonymous = yes;
        self
    }

    pub fn inner(mut self, yes: bool) -> Self {
        self.inner = yes;
        self
    }

    pub fn supertype(mut self, name: impl Into<String>) -> Self {
        self.supertypes.push(name.into());
        self
    }

    pub fn method(mut self, method: ReflectedMethod) -> Self {
        self.methods.push(method);
        self
    }

    pub fn field(mut self, field: ReflectedField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name after the last namespace delimiter.
    pub fn simple_name(&self) -> &str {
        match self.name.rfind('.') {
            Some(dot) => &self.name[dot + 1..],
            None => &self.name,
        }
    }

    /// Dotted package prefix, `None` for the default package.
    pub fn package_name(&self) -> Option<&str> {
        self.name.rfind('.').map(|dot| &self.name[..dot])
    }

    pub fn type_kind(&self) -> TypeKind {
        self.kind
    }

    pub fn modifier_set(&self) -> Modifiers {
        self.modifiers
    }

    pub fn annotations(&self) -> &[String] {
        &self.annotations
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    pub fn is_enum(&self) -> bool {
        self.kind == TypeKind::Enum
    }

    pub fn is_annotation(&self) -> bool {
        self.kind == TypeKind::Annotation
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    pub fn is_inner(&self) -> bool {
        self.inner
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a == name)
    }

    /// Whether this type is the named type or transitively extends or
    /// implements it.
    pub fn assignable_to(&self, type_name: &str) -> bool {
        self.name == type_name || self.supertypes.iter().any(|s| s == type_name)
    }

    pub fn methods(&self) -> &[ReflectedMethod] {
        &self.methods
    }

    pub fn fields(&self) -> &[ReflectedField] {
        &self.fields
    }

    /// Declared methods accepted by `matcher`, as a lazy result view.
    pub fn find_methods(
        &self,
        matcher: impl Matcher<ReflectedMethod> + 'static,
    ) -> FindResult<ReflectedMethod> {
        FindResult::from_vec(self.methods.clone()).filter(matcher)
    }

    pub fn has_method_matching(&self, matcher: &dyn Matcher<ReflectedMethod>) -> bool {
        self.methods.iter().any(|m| matcher.matches(m))
    }

    /// Declared fields accepted by `matcher`, as a lazy result view.
    pub fn find_fields(
        &self,
        matcher: impl Matcher<ReflectedField> + 'static,
    ) -> FindResult<ReflectedField> {
        FindResult::from_vec(self.fields.clone()).filter(matcher)
    }

    pub fn has_field_matching(&self, matcher: &dyn Matcher<ReflectedField>) -> bool {
        self.fields.iter().any(|f| matcher.matches(f))
    }
}

// ---------------------------------------------------------------------------
// TypeLoader
// ---------------------------------------------------------------------------

/// The classloader collaborator: resolves a fully-qualified name to a
/// reflected type.
///
/// Externally owned and read-only from the engine's point of view; the
/// scanner never mutates loader state. There is no ambient default: the
/// loader in use is always passed in explicitly.
pub trait TypeLoader {
    /// # Errors
    ///
    /// [`ScanError::ClassLoad`] describing why the name did not resolve.
    fn load(&self, class_name: &str) -> Result<Arc<ReflectedClass>, ScanError>;
}

/// In-memory name-to-class loader for embedders with a prebuilt type index,
/// and for tests.
#[derive(Default)]
pub struct MapTypeLoader {
    classes: HashMap<String, Arc<ReflectedClass>>,
    failures: HashMap<String, LoadFailure>,
}

impl MapTypeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class(mut self, class: ReflectedClass) -> Self {
        self.classes.insert(class.name().to_string(), Arc::new(class));
        self
    }

    /// Make `class_name` fail with the given failure kind instead of loading.
    pub fn failing(mut self, class_name: impl Into<String>, failure: LoadFailure) -> Self {
        self.failures.insert(class_name.into(), failure);
        self
    }
}

impl TypeLoader for MapTypeLoader {
    fn load(&self, class_name: &str) -> Result<Arc<ReflectedClass>, ScanError> {
        if let Some(failure) = self.failures.get(class_name) {
            return Err(ScanError::ClassLoad {
                name: class_name.to_string(),
                failure: *failure,
            });
        }
        match self.classes.get(class_name) {
            Some(class) => Ok(Arc::clone(class)),
            None => Err(ScanError::ClassLoad {
                name: class_name.to_string(),
                failure: LoadFailure::NotFound,
            }),
        }
    }
}
