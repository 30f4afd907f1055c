use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::ScanError;

// ---------------------------------------------------------------------------
// Description
// ---------------------------------------------------------------------------

/// A sink matchers describe themselves into, for human-readable diagnostics.
///
/// Collected lines render with two spaces of indentation per nesting level.
/// Purely informative: nothing in the engine branches on a description.
#[derive(Default)]
pub struct Description {
    lines: Vec<(usize, String)>,
    depth: usize,
}

impl Description {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plain line of text at the current nesting level.
    pub fn text(&mut self, text: impl Into<String>) -> &mut Self {
        self.lines.push((self.depth, text.into()));
        self
    }

    /// Append a labelled value, e.g. `path: '/a/b/c'`.
    pub fn value(&mut self, label: &str, value: impl fmt::Display) -> &mut Self {
        self.lines.push((self.depth, format!("{label}: '{value}'")));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self)) {
        self.depth += 1;
        f(self);
        self.depth -= 1;
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (depth, line)) in self.lines.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}{line}", "  ".repeat(*depth))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MatchDiagnostics
// ---------------------------------------------------------------------------

/// Records sub-matcher attempts and outcomes during a match, for failure
/// explanation in assertions and reports.
///
/// The disabled form ([`MatchDiagnostics::none`]) costs nothing and is what
/// every hot-path probe uses; a capturing instance is only worth building when
/// a caller intends to show the mismatch to a human.
pub struct MatchDiagnostics {
    capture: bool,
    report: Description,
}

impl MatchDiagnostics {
    /// A disabled sink: sub-matcher outcomes are not recorded.
    pub fn none() -> Self {
        Self {
            capture: false,
            report: Description::new(),
        }
    }

    /// A capturing sink for failure reporting.
    pub fn capturing() -> Self {
        Self {
            capture: true,
            report: Description::new(),
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.capture
    }

    /// Run `matcher` against `value`, recording the attempt and its outcome
    /// when capturing. Returns the match result unchanged.
    pub fn try_match<T: ?Sized>(&mut self, value: &T, matcher: &dyn Matcher<T>) -> bool {
        let matched = matcher.matches_with(value, self);
        if self.capture {
            let mut what = Description::new();
            matcher.describe_to(&mut what);
            let outcome = if matched { "matched" } else { "mismatched" };
            self.report.text(format!("{outcome}: {what}"));
        }
        matched
    }

    /// The collected attempt log. Empty unless capturing.
    pub fn report(&self) -> &Description {
        &self.report
    }
}

// ---------------------------------------------------------------------------
// Matcher
// ---------------------------------------------------------------------------

/// A pure, reusable predicate over `T` with a diagnostics side channel.
///
/// Matchers are stateless: the same instance is shared across thousands of
/// probe calls during a scan, so implementations must not accumulate state
/// between calls.
///
/// # Example
///
/// ```rust
/// use cpscan::matcher::{Description, MatchDiagnostics, Matcher};
///
/// struct LongerThan(usize);
///
/// impl Matcher<String> for LongerThan {
///     fn matches_with(&self, value: &String, _diag: &mut MatchDiagnostics) -> bool {
///         value.len() > self.0
///     }
///     fn describe_to(&self, desc: &mut Description) {
///         desc.value("longer than", self.0);
///     }
/// }
///
/// assert!(LongerThan(2).matches(&"abc".to_string()));
/// ```
pub trait Matcher<T: ?Sized>: Send + Sync {
    /// Returns `true` if `value` satisfies this matcher, recording sub-matcher
    /// outcomes into `diag` when it is a capturing sink.
    fn matches_with(&self, value: &T, diag: &mut MatchDiagnostics) -> bool;

    /// Returns `true` if `value` satisfies this matcher. No diagnostics.
    fn matches(&self, value: &T) -> bool {
        self.matches_with(value, &mut MatchDiagnostics::none())
    }

    /// Describe what this matcher requires, for diagnostics.
    fn describe_to(&self, desc: &mut Description);
}

impl<T: ?Sized> Matcher<T> for Box<dyn Matcher<T>> {
    fn matches_with(&self, value: &T, diag: &mut MatchDiagnostics) -> bool {
        (**self).matches_with(value, diag)
    }

    fn describe_to(&self, desc: &mut Description) {
        (**self).describe_to(desc)
    }
}

impl<T: ?Sized> Matcher<T> for Arc<dyn Matcher<T>> {
    fn matches_with(&self, value: &T, diag: &mut MatchDiagnostics) -> bool {
        (**self).matches_with(value, diag)
    }

    fn describe_to(&self, desc: &mut Description) {
        (**self).describe_to(desc)
    }
}

// ---------------------------------------------------------------------------
// Logical combinators
// ---------------------------------------------------------------------------

struct MatchAll<T: ?Sized>(PhantomData<fn(&T) -> bool>);

impl<T: ?Sized> Matcher<T> for MatchAll<T> {
    fn matches_with(&self, _value: &T, _diag: &mut MatchDiagnostics) -> bool {
        true
    }

    fn describe_to(&self, desc: &mut Description) {
        desc.text("anything");
    }
}

struct MatchNone<T: ?Sized>(PhantomData<fn(&T) -> bool>);

impl<T: ?Sized> Matcher<T> for MatchNone<T> {
    fn matches_with(&self, _value: &T, _diag: &mut MatchDiagnostics) -> bool {
        false
    }

    fn describe_to(&self, desc: &mut Description) {
        desc.text("nothing");
    }
}

struct Any<T: ?Sized> {
    matchers: Vec<Box<dyn Matcher<T>>>,
}

impl<T: ?Sized> Matcher<T> for Any<T> {
    fn matches_with(&self, value: &T, diag: &mut MatchDiagnostics) -> bool {
        if self.matchers.is_empty() {
            return true;
        }
        // short-circuits on the first match
        self.matchers.iter().any(|m| diag.try_match(value, m))
    }

    fn describe_to(&self, desc: &mut Description) {
        desc.text("any of:");
        desc.nested(|d| {
            for m in &self.matchers {
                m.describe_to(d);
            }
        });
    }
}

struct All<T: ?Sized> {
    matchers: Vec<Box<dyn Matcher<T>>>,
}

impl<T: ?Sized> Matcher<T> for All<T> {
    fn matches_with(&self, value: &T, diag: &mut MatchDiagnostics) -> bool {
        // short-circuits on the first mismatch; empty matches everything
        self.matchers.iter().all(|m| diag.try_match(value, m))
    }

    fn describe_to(&self, desc: &mut Description) {
        desc.text("all of:");
        desc.nested(|d| {
            for m in &self.matchers {
                m.describe_to(d);
            }
        });
    }
}

struct Not<T: ?Sized> {
    inner: Box<dyn Matcher<T>>,
}

impl<T: ?Sized> Matcher<T> for Not<T> {
    fn matches_with(&self, value: &T, diag: &mut MatchDiagnostics) -> bool {
        !self.inner.matches_with(value, diag)
    }

    fn describe_to(&self, desc: &mut Description) {
        desc.text("not:");
        desc.nested(|d| self.inner.describe_to(d));
    }
}

/// True iff at least one sub-matcher is true. `any(vec![])` matches everything.
pub fn any<T: ?Sized + 'static>(matchers: Vec<Box<dyn Matcher<T>>>) -> Box<dyn Matcher<T>> {
    Box::new(Any { matchers })
}

/// True iff every sub-matcher is true. `all(vec![])` matches everything.
pub fn all<T: ?Sized + 'static>(matchers: Vec<Box<dyn Matcher<T>>>) -> Box<dyn Matcher<T>> {
    Box::new(All { matchers })
}

/// Boolean negation of `matcher`.
pub fn not<T: ?Sized + 'static>(matcher: impl Matcher<T> + 'static) -> Box<dyn Matcher<T>> {
    Box::new(Not {
        inner: Box::new(matcher),
    })
}

/// The universal matcher.
pub fn always<T: ?Sized + 'static>() -> Box<dyn Matcher<T>> {
    Box::new(MatchAll(PhantomData))
}

/// Matches nothing.
pub fn never<T: ?Sized + 'static>() -> Box<dyn Matcher<T>> {
    Box::new(MatchNone(PhantomData))
}

/// Substitute the universal matcher when an optional refinement was omitted.
pub fn any_if_none<T: ?Sized + 'static>(
    matcher: Option<Box<dyn Matcher<T>>>,
) -> Box<dyn Matcher<T>> {
    matcher.unwrap_or_else(always)
}

// ---------------------------------------------------------------------------
// Property matcher
// ---------------------------------------------------------------------------

struct Property<T: ?Sized, P> {
    name: String,
    get: Box<dyn Fn(&T) -> P + Send + Sync>,
    matcher: Box<dyn Matcher<P>>,
}

impl<T: ?Sized, P: 'static> Matcher<T> for Property<T, P> {
    fn matches_with(&self, value: &T, diag: &mut MatchDiagnostics) -> bool {
        let prop = (self.get)(value);
        diag.try_match(&prop, &self.matcher)
    }

    fn describe_to(&self, desc: &mut Description) {
        let mut inner = Description::new();
        self.matcher.describe_to(&mut inner);
        desc.value(&self.name, inner);
    }
}

/// Bind `matcher` to a named accessor so mismatches name the offending field.
pub fn property<T, P, F>(
    name: impl Into<String>,
    get: F,
    matcher: impl Matcher<P> + 'static,
) -> Box<dyn Matcher<T>>
where
    T: ?Sized + 'static,
    P: 'static,
    F: Fn(&T) -> P + Send + Sync + 'static,
{
    Box::new(Property {
        name: name.into(),
        get: Box::new(get),
        matcher: Box::new(matcher),
    })
}

// ---------------------------------------------------------------------------
// String matchers
// ---------------------------------------------------------------------------

/// Matchers over string values, used by the domain matchers for paths,
/// class names and member names.
pub mod text {
    use super::{Description, MatchDiagnostics, Matcher, ScanError};

    enum TextMatch {
        EqualTo(String),
        StartingWith(String),
        EndingWith(String),
        Containing(String),
        Glob(glob::Pattern),
    }

    impl Matcher<String> for TextMatch {
        fn matches_with(&self, value: &String, _diag: &mut MatchDiagnostics) -> bool {
            match self {
                Self::EqualTo(s) => value == s,
                Self::StartingWith(s) => value.starts_with(s),
                Self::EndingWith(s) => value.ends_with(s),
                Self::Containing(s) => value.contains(s),
                Self::Glob(p) => p.matches(value),
            }
        }

        fn describe_to(&self, desc: &mut Description) {
            match self {
                Self::EqualTo(s) => desc.value("equal to", s),
                Self::StartingWith(s) => desc.value("starting with", s),
                Self::EndingWith(s) => desc.value("ending with", s),
                Self::Containing(s) => desc.value("containing", s),
                Self::Glob(p) => desc.value("matching glob", p.as_str()),
            };
        }
    }

    pub fn equal_to(value: impl Into<String>) -> Box<dyn Matcher<String>> {
        Box::new(TextMatch::EqualTo(value.into()))
    }

    pub fn starting_with(prefix: impl Into<String>) -> Box<dyn Matcher<String>> {
        Box::new(TextMatch::StartingWith(prefix.into()))
    }

    pub fn ending_with(suffix: impl Into<String>) -> Box<dyn Matcher<String>> {
        Box::new(TextMatch::EndingWith(suffix.into()))
    }

    pub fn containing(infix: impl Into<String>) -> Box<dyn Matcher<String>> {
        Box::new(TextMatch::Containing(infix.into()))
    }

    /// A glob pattern over the whole string, e.g. `**/b/**`.
    ///
    /// # Errors
    ///
    /// Invalid patterns are configuration errors, raised here rather than at
    /// first probe.
    pub fn glob(pattern: &str) -> Result<Box<dyn Matcher<String>>, ScanError> {
        let compiled = glob::Pattern::new(pattern).map_err(|e| ScanError::InvalidGlob {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Box::new(TextMatch::Glob(compiled)))
    }
}
