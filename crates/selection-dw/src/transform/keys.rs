use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Synthetic warehouse identifier, dense from 1 within one table of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurrogateKey(i64);

impl SurrogateKey {
    pub const FIRST: Self = Self(1);

    /// Key for the zero-based `position` in assignment order.
    pub(crate) fn from_position(position: usize) -> Self {
        Self(position as i64 + 1)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SurrogateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered mapping from natural keys to surrogate keys.
#[derive(Debug, Clone)]
pub struct KeyAssignment<K> {
    ordered: Vec<K>,
    index: HashMap<K, SurrogateKey>,
}

// `index` is derived from `ordered`.
impl<K: PartialEq> PartialEq for KeyAssignment<K> {
    fn eq(&self, other: &Self) -> bool {
        self.ordered == other.ordered
    }
}

impl<K: Eq> Eq for KeyAssignment<K> {}

impl<K> Default for KeyAssignment<K> {
    fn default() -> Self {
        Self {
            ordered: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K> KeyAssignment<K>
where
    K: Eq + Hash + Clone,
{
    /// Assigns the next surrogate to an unseen key and returns the stored
    /// key; a key already present yields `None`.
    pub fn insert(&mut self, natural_key: K) -> Option<&K> {
        match self.index.entry(natural_key) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                self.ordered.push(slot.key().clone());
                slot.insert(SurrogateKey::from_position(self.ordered.len() - 1));
                self.ordered.last()
            }
        }
    }

    pub fn get<Q>(&self, natural_key: &Q) -> Option<SurrogateKey>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.index.get(natural_key).copied()
    }

    pub fn natural_key(&self, key: SurrogateKey) -> Option<&K> {
        let position = usize::try_from(key.get()).ok()?.checked_sub(1)?;
        self.ordered.get(position)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Pairs in ascending surrogate-key order.
    pub fn iter(&self) -> impl Iterator<Item = (SurrogateKey, &K)> + '_ {
        self.ordered
            .iter()
            .enumerate()
            .map(|(position, natural_key)| (SurrogateKey::from_position(position), natural_key))
    }
}

/// Assigns `1..=N` to a sequence of distinct natural keys in the order given.
///
/// A key that repeats keeps the surrogate of its first occurrence; later
/// repeats are ignored, so the output stays dense.
pub fn assign_surrogate_keys<K, I>(natural_keys: I) -> KeyAssignment<K>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
{
    let mut assignment = KeyAssignment::default();
    for natural_key in natural_keys {
        assignment.insert(natural_key);
    }
    assignment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_dense_and_follow_input_order() {
        let assignment = assign_surrogate_keys(["USA", "Brazil", "Ecuador"]);

        let pairs = assignment
            .iter()
            .map(|(key, name)| (key.get(), *name))
            .collect::<Vec<_>>();
        assert_eq!(pairs, vec![(1, "USA"), (2, "Brazil"), (3, "Ecuador")]);
    }

    #[test]
    fn repeated_keys_keep_their_first_surrogate() {
        let assignment = assign_surrogate_keys(vec!["b", "a", "b", "c", "a"]);

        assert_eq!(assignment.len(), 3);
        assert_eq!(assignment.get("b"), Some(SurrogateKey::FIRST));
        assert_eq!(assignment.get("c").map(SurrogateKey::get), Some(3));
    }

    #[test]
    fn lookups_borrow_owned_keys() {
        let assignment = assign_surrogate_keys(vec!["java".to_string(), "rust".to_string()]);
        assert_eq!(assignment.get("rust").map(SurrogateKey::get), Some(2));
        assert_eq!(assignment.get("go"), None);
    }

    #[test]
    fn natural_key_resolves_back_from_surrogate() {
        let assignment = assign_surrogate_keys(["x", "y"]);
        assert_eq!(assignment.natural_key(SurrogateKey::from_position(1)), Some(&"y"));
        assert_eq!(assignment.natural_key(SurrogateKey(0)), None);
        assert_eq!(assignment.natural_key(SurrogateKey(3)), None);
    }

    #[test]
    fn insert_reports_only_new_keys() {
        let mut assignment = KeyAssignment::default();
        assert_eq!(assignment.insert("java"), Some(&"java"));
        assert_eq!(assignment.insert("rust"), Some(&"rust"));
        assert_eq!(assignment.insert("java"), None);
        assert_eq!(assignment.len(), 2);
        assert_eq!(assignment.get("rust").map(SurrogateKey::get), Some(2));
    }

    #[test]
    fn empty_input_yields_empty_assignment() {
        let assignment = assign_surrogate_keys(Vec::<String>::new());
        assert!(assignment.is_empty());
        assert_eq!(assignment.iter().count(), 0);
    }
}
