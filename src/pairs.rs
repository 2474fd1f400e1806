//! Ordered key/value pairs for headers, query params and environment variables
//!
//! Rows are edited by index, the way a table in the UI edits them, so a key
//! rename that lands on an existing key is an explicit collapse rather than a
//! side effect of map semantics.

use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single key/value row
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pair {
    pub key: String,
    pub value: String,
}

/// Insertion-ordered list of unique keys
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyValueList {
    entries: Vec<Pair>,
}

impl KeyValueList {
    pub fn new() -> Self {
        KeyValueList::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|p| p.key == key)
    }

    /// Set `key` to `value`. An existing key keeps its row, a new key is appended.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(i) => self.entries[i].value = value,
            None => self.entries.push(Pair { key, value }),
        }
    }

    /// Add an empty row for the user to fill in.
    ///
    /// If an empty row already exists it is reset instead of duplicated.
    pub fn add_blank(&mut self) {
        self.insert("", "");
    }

    /// Edit the row at `index`, possibly renaming its key.
    ///
    /// Renaming onto a key held by another row removes this row and gives the
    /// other row `value`. Returns `false` when `index` is out of range.
    pub fn edit(&mut self, index: usize, new_key: impl Into<String>, value: impl Into<String>) -> bool {
        let new_key = new_key.into();
        let value = value.into();
        let Some(current) = self.entries.get(index) else {
            return false;
        };

        if current.key == new_key {
            self.entries[index].value = value;
            return true;
        }

        match self.position(&new_key) {
            Some(other) => {
                self.entries[other].value = value;
                self.entries.remove(index);
            }
            None => {
                self.entries[index] = Pair { key: new_key, value };
            }
        }
        true
    }

    /// Remove the row at `index`, returning it if present
    pub fn remove(&mut self, index: usize) -> Option<Pair> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    /// Remove the row holding `key`, returning its value if present
    pub fn remove_key(&mut self, key: &str) -> Option<String> {
        self.position(key).map(|i| self.entries.remove(i).value)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|p| (p.key.as_str(), p.value.as_str()))
    }

    /// Rows with a non-empty key; blank rows are still being edited and never sent.
    pub fn non_empty_keys(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(k, _)| !k.is_empty())
    }

    /// Apply `f` to every value, leaving keys untouched
    pub fn map_values(&self, mut f: impl FnMut(&str) -> String) -> KeyValueList {
        KeyValueList {
            entries: self
                .entries
                .iter()
                .map(|p| Pair {
                    key: p.key.clone(),
                    value: f(&p.value),
                })
                .collect(),
        }
    }

    pub fn to_map(&self) -> HashMap<String, String> {
        self.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KeyValueList {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut list = KeyValueList::new();
        for (k, v) in iter {
            list.insert(k, v);
        }
        list
    }
}

impl Serialize for KeyValueList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for pair in &self.entries {
            map.serialize_entry(&pair.key, &pair.value)?;
        }
        map.end()
    }
}

struct KeyValueListVisitor;

impl<'de> Visitor<'de> for KeyValueListVisitor {
    type Value = KeyValueList;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of string keys to string values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut list = KeyValueList::new();
        while let Some((key, value)) = access.next_entry::<String, String>()? {
            list.insert(key, value);
        }
        Ok(list)
    }
}

impl<'de> Deserialize<'de> for KeyValueList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(KeyValueListVisitor)
    }
}
