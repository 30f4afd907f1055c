use crate::matcher::{all, always, any, not, Matcher};

// ---------------------------------------------------------------------------
// RuleSet
// ---------------------------------------------------------------------------

/// Accumulates include and exclude matchers for one value type and derives a
/// single matcher from them.
///
/// The derived precedence is fixed:
///
/// - no rules at all: match everything
/// - only excludes: reject anything an exclude matches
/// - only includes: accept anything an include matches
/// - both: exclude wins. An item satisfying both an include and an exclude
///   rule is excluded.
///
/// # Example
///
/// ```rust
/// use cpscan::matcher::{text, Matcher};
/// use cpscan::rules::RuleSet;
///
/// let m = RuleSet::new()
///     .include(text::ending_with(".class"))
///     .exclude(text::containing("Test"))
///     .build();
///
/// assert!(m.matches(&"/a/Foo.class".to_string()));
/// assert!(!m.matches(&"/a/FooTest.class".to_string()));
/// ```
pub struct RuleSet<T: ?Sized> {
    includes: Vec<Box<dyn Matcher<T>>>,
    excludes: Vec<Box<dyn Matcher<T>>>,
}

impl<T: ?Sized> Default for RuleSet<T> {
    fn default() -> Self {
        Self {
            includes: Vec::new(),
            excludes: Vec::new(),
        }
    }
}

impl<T: ?Sized + 'static> RuleSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an include rule. Order is preserved but not significant: includes
    /// combine as "any".
    pub fn include(mut self, matcher: impl Matcher<T> + 'static) -> Self {
        self.includes.push(Box::new(matcher));
        self
    }

    /// Add an exclude rule. Excludes combine as "any" and take precedence over
    /// every include.
    pub fn exclude(mut self, matcher: impl Matcher<T> + 'static) -> Self {
        self.excludes.push(Box::new(matcher));
        self
    }

    pub fn includes(mut self, matchers: impl IntoIterator<Item = Box<dyn Matcher<T>>>) -> Self {
        self.includes.extend(matchers);
        self
    }

    pub fn excludes(mut self, matchers: impl IntoIterator<Item = Box<dyn Matcher<T>>>) -> Self {
        self.excludes.extend(matchers);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty()
    }

    /// Derive the combined matcher.
    pub fn build(self) -> Box<dyn Matcher<T>> {
        match (self.includes.is_empty(), self.excludes.is_empty()) {
            (true, true) => always(),
            (true, false) => not(any(self.excludes)),
            (false, true) => any(self.includes),
            (false, false) => all(vec![not(any(self.excludes)), any(self.includes)]),
        }
    }
}
