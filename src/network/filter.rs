//! Interface filtering for selective observation.
//!
//! # Design
//!
//! - **Pure Matchers**: [`NameRegexFilter`] only answers "does this interface
//!   match?" without include/exclude semantics.
//! - **Filter Chain**: [`FilterChain`] combines matchers with correct semantics:
//!   - Exclude filters: AND logic (must pass ALL excludes)
//!   - Include filters: OR logic (pass ANY include, empty = match all)
//! - **Decorator**: [`FilteredEnumerator`] applies filtering transparently
//!   to any [`InterfaceEnumerator`] implementation.

use regex::Regex;

use super::{EnumerateError, InterfaceEnumerator, RawInterface};

/// Trait for filtering network interfaces.
///
/// Filters must be `Send + Sync` to support concurrent access in async contexts.
pub trait InterfaceFilter: Send + Sync {
    /// Returns `true` if the interface should be observed, `false` to drop it.
    fn matches(&self, interface: &RawInterface) -> bool;
}

/// Matches interfaces whose id matches a regex pattern.
///
/// # Examples
///
/// ```
/// use netif_watch::network::filter::{InterfaceFilter, NameRegexFilter};
/// use netif_watch::network::RawInterface;
///
/// let filter = NameRegexFilter::new(r"^eth").unwrap();
///
/// assert!(filter.matches(&RawInterface::new("eth0", vec![])));
/// assert!(!filter.matches(&RawInterface::new("wlan0", vec![])));
/// ```
#[derive(Debug)]
pub struct NameRegexFilter {
    pattern: Regex,
}

impl NameRegexFilter {
    /// Creates a name filter with the given regex pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the regex pattern is invalid.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// Returns a reference to the regex pattern.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Regex is not a const type
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }
}

impl InterfaceFilter for NameRegexFilter {
    fn matches(&self, interface: &RawInterface) -> bool {
        self.pattern.is_match(&interface.id)
    }
}

/// Filter chain with include/exclude semantics.
///
/// Evaluation order:
/// 1. **Exclude filters (AND)**: Any match → reject.
/// 2. **Include filters (OR)**: Any match → accept. Empty includes = match all.
///
/// # Examples
///
/// ```
/// use netif_watch::network::filter::{FilterChain, InterfaceFilter, NameRegexFilter};
/// use netif_watch::network::RawInterface;
///
/// let chain = FilterChain::new()
///     .exclude(NameRegexFilter::new("^docker").unwrap())
///     .include(NameRegexFilter::new("^(eth|docker)").unwrap());
///
/// assert!(chain.matches(&RawInterface::new("eth0", vec![])));
/// assert!(!chain.matches(&RawInterface::new("docker0", vec![])));
/// assert!(!chain.matches(&RawInterface::new("wlan0", vec![])));
/// ```
#[derive(Default)]
pub struct FilterChain {
    includes: Vec<Box<dyn InterfaceFilter>>,
    excludes: Vec<Box<dyn InterfaceFilter>>,
}

impl FilterChain {
    /// Creates an empty filter chain (matches all interfaces).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an include filter (OR semantics).
    #[must_use]
    pub fn include<F: InterfaceFilter + 'static>(mut self, filter: F) -> Self {
        self.includes.push(Box::new(filter));
        self
    }

    /// Adds an exclude filter (rejects on ANY match).
    #[must_use]
    pub fn exclude<F: InterfaceFilter + 'static>(mut self, filter: F) -> Self {
        self.excludes.push(Box::new(filter));
        self
    }

    /// Returns the number of include filters.
    #[must_use]
    pub fn include_count(&self) -> usize {
        self.includes.len()
    }

    /// Returns the number of exclude filters.
    #[must_use]
    pub fn exclude_count(&self) -> usize {
        self.excludes.len()
    }

    /// Returns true if no filters are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty()
    }

    /// Returns the total number of configured filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.includes.len() + self.excludes.len()
    }
}

impl InterfaceFilter for FilterChain {
    fn matches(&self, interface: &RawInterface) -> bool {
        if self.excludes.iter().any(|f| f.matches(interface)) {
            return false;
        }

        self.includes.is_empty() || self.includes.iter().any(|f| f.matches(interface))
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("include_count", &self.includes.len())
            .field("exclude_count", &self.excludes.len())
            .finish()
    }
}

/// An enumerator decorator that drops interfaces rejected by a filter.
///
/// Interface order of the inner enumerator is preserved.
#[derive(Debug)]
pub struct FilteredEnumerator<E, F> {
    inner: E,
    filter: F,
}

impl<E, F> FilteredEnumerator<E, F> {
    /// Creates a new filtered enumerator.
    #[must_use]
    pub const fn new(inner: E, filter: F) -> Self {
        Self { inner, filter }
    }

    /// Returns a reference to the inner enumerator.
    pub const fn inner(&self) -> &E {
        &self.inner
    }

    /// Returns a reference to the filter.
    pub const fn filter(&self) -> &F {
        &self.filter
    }
}

impl<E: InterfaceEnumerator, F: InterfaceFilter> InterfaceEnumerator for FilteredEnumerator<E, F> {
    fn enumerate(&self) -> Result<Vec<RawInterface>, EnumerateError> {
        let interfaces = self.inner.enumerate()?;
        Ok(interfaces
            .into_iter()
            .filter(|interface| self.filter.matches(interface))
            .collect())
    }
}

impl<T: InterfaceFilter + ?Sized> InterfaceFilter for &T {
    fn matches(&self, interface: &RawInterface) -> bool {
        (*self).matches(interface)
    }
}

impl InterfaceFilter for Box<dyn InterfaceFilter> {
    fn matches(&self, interface: &RawInterface) -> bool {
        self.as_ref().matches(interface)
    }
}
