use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use crate::error::ScanError;
use crate::matcher::Matcher;

// ---------------------------------------------------------------------------
// MatchListener
// ---------------------------------------------------------------------------

/// Be notified of matches and misses while a filter stage evaluates items.
///
/// Notifications fire for every item the stage evaluates, whether or not a
/// later stage rejects the item again.
pub trait MatchListener<T: ?Sized> {
    fn on_matched(&self, _item: &T) {}
    fn on_ignored(&self, _item: &T) {}
}

struct NullListener;

impl<T: ?Sized> MatchListener<T> for NullListener {}

// ---------------------------------------------------------------------------
// FindResult
// ---------------------------------------------------------------------------

/// Instead of returning lists of things, return this: a lazy, restartable
/// view over a sequence with composable filter/transform/expand stages.
///
/// Every stage produces a new view without consuming the original, and no
/// stage does any work until a terminal operation (or iteration) drives it:
/// building a filter+transform chain performs zero I/O and zero closure
/// invocations. Each obtained iterator is forward-only and single-pass;
/// iterating the view again starts a fresh pass.
///
/// # Example
///
/// ```rust
/// use cpscan::matcher::text;
/// use cpscan::results::FindResult;
///
/// let names = FindResult::from_vec(vec!["a.class".to_string(), "b.txt".to_string()]);
/// let classes = names.filter(text::ending_with(".class"));
/// assert_eq!(classes.to_vec(), vec!["a.class".to_string()]);
/// ```
pub struct FindResult<T> {
    source: Arc<dyn Sequence<T>>,
}

impl<T> Clone for FindResult<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<T: Clone + 'static> FindResult<T> {
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            source: Arc::new(VecSequence(items)),
        }
    }

    pub fn empty() -> Self {
        Self::from_vec(Vec::new())
    }

    /// A fresh, single-pass iterator over this view.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.source.iterate()
    }

    pub fn is_empty(&self) -> bool {
        self.source.iterate().next().is_none()
    }

    /// Retain items the matcher accepts.
    pub fn filter(&self, matcher: impl Matcher<T> + 'static) -> FindResult<T> {
        self.filter_with(matcher, NullListener)
    }

    /// Retain items the matcher accepts, telling `listener` about every
    /// matched and ignored item as it is evaluated.
    pub fn filter_with(
        &self,
        matcher: impl Matcher<T> + 'static,
        listener: impl MatchListener<T> + 'static,
    ) -> FindResult<T> {
        FindResult {
            source: Arc::new(FilterSequence {
                inner: Arc::clone(&self.source),
                matcher: Box::new(matcher),
                listener: Box::new(listener),
            }),
        }
    }

    /// One-to-one partial mapping: items mapping to `None` are silently
    /// dropped.
    pub fn transform<U, F>(&self, f: F) -> FindResult<U>
    where
        U: Clone + 'static,
        F: Fn(&T) -> Option<U> + 'static,
    {
        FindResult {
            source: Arc::new(TransformSequence {
                inner: Arc::clone(&self.source),
                f: Box::new(f),
            }),
        }
    }

    /// One-to-many expansion. Each produced sub-sequence is fully drained
    /// before the next source item is pulled; empty sub-sequences are skipped
    /// transparently.
    pub fn transform_to_many<U, F>(&self, f: F) -> FindResult<U>
    where
        U: Clone + 'static,
        F: Fn(&T) -> Box<dyn Iterator<Item = U>> + 'static,
    {
        FindResult {
            source: Arc::new(ExpandSequence {
                inner: Arc::clone(&self.source),
                f: Box::new(f),
            }),
        }
    }

    /// Force evaluation into a list.
    pub fn to_vec(&self) -> Vec<T> {
        self.source.iterate().collect()
    }

    /// Force evaluation into a map keyed by `key_fn`. Later items win on key
    /// collisions.
    pub fn to_map<K, F>(&self, key_fn: F) -> HashMap<K, T>
    where
        K: Eq + Hash,
        F: Fn(&T) -> K,
    {
        let mut map = HashMap::new();
        for item in self.source.iterate() {
            map.insert(key_fn(&item), item);
        }
        map
    }

    /// The first item.
    ///
    /// # Errors
    ///
    /// [`ScanError::NoSuchElement`] on an empty pipeline.
    pub fn first(&self) -> Result<T, ScanError> {
        self.source.iterate().next().ok_or(ScanError::NoSuchElement)
    }

    /// The first item, or `None` on an empty pipeline.
    pub fn first_or_none(&self) -> Option<T> {
        self.source.iterate().next()
    }
}

// ---------------------------------------------------------------------------
// Sequences
// ---------------------------------------------------------------------------

/// A restartable backing sequence: every `iterate` call starts a fresh pass.
trait Sequence<T> {
    fn iterate(&self) -> Box<dyn Iterator<Item = T> + '_>;
}

struct VecSequence<T>(Vec<T>);

impl<T: Clone> Sequence<T> for VecSequence<T> {
    fn iterate(&self) -> Box<dyn Iterator<Item = T> + '_> {
        Box::new(self.0.iter().cloned())
    }
}

struct FilterSequence<T> {
    inner: Arc<dyn Sequence<T>>,
    matcher: Box<dyn Matcher<T>>,
    listener: Box<dyn MatchListener<T>>,
}

impl<T: 'static> Sequence<T> for FilterSequence<T> {
    fn iterate(&self) -> Box<dyn Iterator<Item = T> + '_> {
        Box::new(FilterIter {
            source: self.inner.iterate(),
            matcher: self.matcher.as_ref(),
            listener: self.listener.as_ref(),
        })
    }
}

struct FilterIter<'a, T> {
    source: Box<dyn Iterator<Item = T> + 'a>,
    matcher: &'a dyn Matcher<T>,
    listener: &'a dyn MatchListener<T>,
}

impl<T> Iterator for FilterIter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        for item in self.source.by_ref() {
            if self.matcher.matches(&item) {
                self.listener.on_matched(&item);
                return Some(item);
            }
            self.listener.on_ignored(&item);
        }
        None
    }
}

struct TransformSequence<A, B> {
    inner: Arc<dyn Sequence<A>>,
    f: Box<dyn Fn(&A) -> Option<B>>,
}

impl<A: 'static, B: 'static> Sequence<B> for TransformSequence<A, B> {
    fn iterate(&self) -> Box<dyn Iterator<Item = B> + '_> {
        let f = &self.f;
        Box::new(self.inner.iterate().filter_map(move |a| f(&a)))
    }
}

struct ExpandSequence<A, B> {
    inner: Arc<dyn Sequence<A>>,
    f: Box<dyn Fn(&A) -> Box<dyn Iterator<Item = B>>>,
}

impl<A: 'static, B: 'static> Sequence<B> for ExpandSequence<A, B> {
    fn iterate(&self) -> Box<dyn Iterator<Item = B> + '_> {
        let f = &self.f;
        // flat_map drains each sub-iterator before pulling the next source item
        Box::new(self.inner.iterate().flat_map(move |a| f(&a)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::text;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Default)]
    struct Counting {
        matched: Rc<Cell<usize>>,
        ignored: Rc<Cell<usize>>,
    }

    impl MatchListener<String> for Counting {
        fn on_matched(&self, _item: &String) {
            self.matched.set(self.matched.get() + 1);
        }

        fn on_ignored(&self, _item: &String) {
            self.ignored.set(self.ignored.get() + 1);
        }
    }

    fn items(names: &[&str]) -> FindResult<String> {
        FindResult::from_vec(names.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn unconsumed_pipeline_does_no_work() {
        let transforms = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&transforms);

        let source = items(&["a.class", "b.txt", "c.class"]);
        let pipeline = source.filter(text::ending_with(".class")).transform(move |s| {
            counter.fetch_add(1, Ordering::Relaxed);
            Some(s.to_uppercase())
        });

        assert_eq!(
            transforms.load(Ordering::Relaxed),
            0,
            "construction alone must evaluate nothing"
        );

        let forced = pipeline.to_vec();
        assert_eq!(forced, vec!["A.CLASS", "C.CLASS"]);
        assert_eq!(transforms.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn filter_notifies_listener_for_every_evaluated_item() {
        let listener = Counting::default();
        let matched = Rc::clone(&listener.matched);
        let ignored = Rc::clone(&listener.ignored);

        let filtered = items(&["a.class", "b.txt", "c.class"])
            .filter_with(text::ending_with(".class"), listener);
        assert_eq!(matched.get(), 0, "no notifications before the pull");

        let found = filtered.to_vec();
        assert_eq!(found.len(), 2);
        assert_eq!(matched.get(), 2);
        assert_eq!(ignored.get(), 1);
    }

    #[test]
    fn transform_drops_absent_results() {
        let result = items(&["1", "x", "3"]).transform(|s| s.parse::<u32>().ok());
        assert_eq!(result.to_vec(), vec![1, 3]);
    }

    #[test]
    fn transform_to_many_drains_each_expansion_in_order() {
        let result = items(&["ab", "", "c"]).transform_to_many(|s| {
            let chars: Vec<char> = s.chars().collect();
            Box::new(chars.into_iter())
        });
        assert_eq!(result.to_vec(), vec!['a', 'b', 'c'], "empty expansions skipped");
    }

    #[test]
    fn views_are_restartable_and_do_not_consume_the_original() {
        let source = items(&["a.class", "b.txt"]);
        let filtered = source.filter(text::ending_with(".class"));

        assert_eq!(filtered.to_vec().len(), 1);
        assert_eq!(filtered.to_vec().len(), 1, "second pass is a fresh run");
        assert_eq!(source.to_vec().len(), 2, "original view untouched");
    }

    #[test]
    fn first_distinguishes_empty_from_present() {
        let empty = FindResult::<String>::empty();
        assert!(matches!(empty.first(), Err(ScanError::NoSuchElement)));
        assert!(empty.first_or_none().is_none());
        assert!(empty.is_empty());

        let some = items(&["one", "two"]);
        assert_eq!(some.first().unwrap(), "one");
        assert_eq!(some.first_or_none().unwrap(), "one");
    }

    #[test]
    fn to_map_keys_by_the_provided_function() {
        let map = items(&["alpha", "beta"]).to_map(|s| s.len());
        assert_eq!(map[&5], "alpha");
        assert_eq!(map[&4], "beta");
    }
}
