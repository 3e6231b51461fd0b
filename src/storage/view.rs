//! Prefix scan results.

use bytes::Bytes;

/// A point-in-time snapshot of the live keys under a prefix.
///
/// Pairs are held in ascending key order. The view owns its data (cloned
/// `Bytes` handles), so it stays valid no matter what writers do after the
/// scan returns. Each scan produces a fresh view; there is no way to
/// "rewind" one against the live store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixView {
    pairs: Vec<(Bytes, Bytes)>,
}

impl PrefixView {
    /// Builds a view from pairs already sorted by key.
    pub(crate) fn from_sorted(pairs: Vec<(Bytes, Bytes)>) -> Self {
        debug_assert!(pairs.windows(2).all(|w| w[0].0 < w[1].0));
        Self { pairs }
    }

    /// Number of pairs in the view.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if no key matched.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Looks up a key inside the snapshot.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<&Bytes> {
        let key = key.as_ref();
        self.pairs
            .binary_search_by(|(k, _)| k.as_ref().cmp(key))
            .ok()
            .map(|i| &self.pairs[i].1)
    }

    /// Returns true if the key is part of the snapshot.
    pub fn contains_key(&self, key: impl AsRef<[u8]>) -> bool {
        self.get(key).is_some()
    }

    /// Iterates over `(key, value)` pairs.
    pub fn iter(&self) -> std::slice::Iter<'_, (Bytes, Bytes)> {
        self.pairs.iter()
    }

    /// Iterates over the keys only.
    pub fn keys(&self) -> impl Iterator<Item = &Bytes> {
        self.pairs.iter().map(|(k, _)| k)
    }

    /// Rewrites every key with `f`, keeping order.
    ///
    /// Used by the facade to strip its namespace. `f` must be monotonic
    /// (stripping a common prefix is).
    pub(crate) fn map_keys(self, f: impl Fn(Bytes) -> Bytes) -> Self {
        Self {
            pairs: self.pairs.into_iter().map(|(k, v)| (f(k), v)).collect(),
        }
    }
}

impl IntoIterator for PrefixView {
    type Item = (Bytes, Bytes);
    type IntoIter = std::vec::IntoIter<(Bytes, Bytes)>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}

impl<'a> IntoIterator for &'a PrefixView {
    type Item = &'a (Bytes, Bytes);
    type IntoIter = std::slice::Iter<'a, (Bytes, Bytes)>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> PrefixView {
        PrefixView::from_sorted(vec![
            (Bytes::from("a"), Bytes::from("1")),
            (Bytes::from("b"), Bytes::from("")),
            (Bytes::from("c"), Bytes::from("3")),
        ])
    }

    #[test]
    fn test_lookup() {
        let view = view();
        assert_eq!(view.len(), 3);
        assert_eq!(view.get("a"), Some(&Bytes::from("1")));
        assert_eq!(view.get("b"), Some(&Bytes::new()));
        assert_eq!(view.get("d"), None);
        assert!(view.contains_key("c"));
    }

    #[test]
    fn test_iteration_order() {
        let keys: Vec<_> = view().keys().cloned().collect();
        assert_eq!(keys, vec![Bytes::from("a"), Bytes::from("b"), Bytes::from("c")]);

        let owned: Vec<_> = view().into_iter().map(|(_, v)| v).collect();
        assert_eq!(owned[2], Bytes::from("3"));
    }

    #[test]
    fn test_map_keys() {
        let stripped = view().map_keys(|k| {
            let mut s = b"ns:".to_vec();
            s.extend_from_slice(&k);
            Bytes::from(s)
        });
        assert!(stripped.contains_key("ns:a"));
        assert!(!stripped.contains_key("a"));
    }

    #[test]
    fn test_default_is_empty() {
        assert!(PrefixView::default().is_empty());
    }
}
