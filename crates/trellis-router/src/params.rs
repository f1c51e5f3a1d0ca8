//! Parameter storage for path bindings, query strings and form fields.
//!
//! Keys are unique: inserting an existing key replaces its value in place,
//! so the most recent binding always wins. Lookups and inserts are hashed;
//! query strings and form bodies can carry arbitrarily many keys.

use indexmap::IndexMap;

/// An ordered set of unique `name -> value` bindings.
///
/// # Example
///
/// ```rust
/// use trellis_router::Params;
///
/// let mut params = Params::new();
/// params.insert("id", "1");
/// params.insert("id", "2");
///
/// assert_eq!(params.get("id"), Some("2"));
/// assert_eq!(params.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: IndexMap<String, String>,
}

impl Params {
    /// Creates a new empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a params set with the given capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: IndexMap::with_capacity(capacity),
        }
    }

    /// Binds `name` to `value`, overwriting an earlier binding of the same name.
    ///
    /// Returns the previous value if there was one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.inner.insert(name.into(), value.into())
    }

    /// Merges every binding of `other` into `self`; `other` wins on conflict.
    pub fn merge(&mut self, other: Params) {
        for (name, value) in other.inner {
            self.insert(name, value);
        }
    }

    /// Returns the value for a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name).map(String::as_str)
    }

    /// Returns true if a binding exists for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    /// Removes a binding, returning its value. Later bindings keep their order.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.inner.shift_remove(name)
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns an iterator over the parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Clears all parameters, retaining allocated capacity.
    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

type PairRef<'a> = (&'a String, &'a String);

fn as_strs<'a>((name, value): PairRef<'a>) -> (&'a str, &'a str) {
    (name.as_str(), value.as_str())
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a str, &'a str);
    type IntoIter =
        std::iter::Map<indexmap::map::Iter<'a, String, String>, fn(PairRef<'a>) -> (&'a str, &'a str)>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter().map(as_strs as fn(PairRef<'a>) -> (&'a str, &'a str))
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Params {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_new() {
        let params = Params::new();
        assert!(params.is_empty());
        assert_eq!(params.len(), 0);
    }

    #[test]
    fn test_params_insert_and_get() {
        let mut params = Params::new();
        params.insert("id", "123");
        params.insert("name", "alice");

        assert_eq!(params.get("id"), Some("123"));
        assert_eq!(params.get("name"), Some("alice"));
        assert_eq!(params.get("unknown"), None);
    }

    #[test]
    fn test_params_insert_overwrites() {
        let mut params = Params::new();
        assert_eq!(params.insert("id", "1"), None);
        assert_eq!(params.insert("id", "2"), Some("1".to_string()));

        assert_eq!(params.len(), 1);
        assert_eq!(params.get("id"), Some("2"));
    }

    #[test]
    fn test_params_merge_later_wins() {
        let mut params = Params::from([("id", "42"), ("org", "acme")]);
        params.merge(Params::from([("id", "7"), ("team", "core")]));

        assert_eq!(params.get("id"), Some("7"));
        assert_eq!(params.get("org"), Some("acme"));
        assert_eq!(params.get("team"), Some("core"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_params_iter_keeps_insertion_order() {
        let mut params = Params::new();
        params.insert("a", "1");
        params.insert("b", "2");
        params.insert("a", "3");

        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn test_params_remove() {
        let mut params = Params::from([("a", "1"), ("b", "2")]);
        assert_eq!(params.remove("a"), Some("1".to_string()));
        assert_eq!(params.remove("a"), None);
        assert!(!params.contains("a"));
        assert!(params.contains("b"));
    }

    #[test]
    fn test_params_from_iter_dedups() {
        let params: Params = vec![
            ("k".to_string(), "first".to_string()),
            ("k".to_string(), "last".to_string()),
        ]
        .into_iter()
        .collect();

        assert_eq!(params.len(), 1);
        assert_eq!(params.get("k"), Some("last"));
    }

    #[test]
    fn test_params_remove_keeps_order() {
        let mut params = Params::from([("a", "1"), ("b", "2"), ("c", "3")]);
        params.remove("a");
        params.insert("a", "4");

        let pairs: Vec<_> = (&params).into_iter().collect();
        assert_eq!(pairs, vec![("b", "2"), ("c", "3"), ("a", "4")]);
    }

    #[test]
    fn test_params_many_distinct_keys() {
        let start = std::time::Instant::now();
        let mut params = Params::new();
        for i in 0..50_000 {
            params.insert(format!("k{i}"), "v");
        }
        params.insert("k0", "last");

        assert_eq!(params.len(), 50_000);
        assert_eq!(params.get("k0"), Some("last"));
        assert_eq!(params.iter().next(), Some(("k0", "last")));
        assert!(start.elapsed() < std::time::Duration::from_secs(2));
    }

    #[test]
    fn test_params_clear() {
        let mut params = Params::from([("a", "1")]);
        params.clear();
        assert!(params.is_empty());
    }
}
