use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub trait StringTable {
    fn to_str(&self, id: usize) -> Option<&str>;
    fn to_id(&self, s: &str) -> Option<usize>;
    fn len(&self) -> usize;
}

pub trait TextVectorizer {
    fn find_or_insert(&mut self, key: &str) -> usize;
}

/// Interned vocabulary for a categorical column: names in first-seen
/// order, codes are positions in that order. Serializes as the bare name
/// list; the reverse map is rebuilt on the way in.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Quark {
    v: Vec<String>,
    m: HashMap<String, usize>,
}

impl From<Vec<String>> for Quark {
    fn from(value: Vec<String>) -> Self {
        let m = value.iter().enumerate().map(|(i, s)| (s.to_string(), i)).collect();
        Self { v: value, m }
    }
}

impl From<Quark> for Vec<String> {
    fn from(value: Quark) -> Self {
        value.v
    }
}

impl StringTable for Quark {
    fn to_str(&self, id: usize) -> Option<&str> {
        self.v.get(id).map(|x| x.as_str())
    }

    fn to_id(&self, s: &str) -> Option<usize> {
        self.m.get(s).copied()
    }

    fn len(&self) -> usize {
        self.v.len()
    }
}

impl TextVectorizer for Quark {
    fn find_or_insert(&mut self, key: &str) -> usize {
        if self.m.contains_key(key) {
            return self.m[key];
        }
        let idx = self.v.len();
        self.m.insert(key.to_string(), idx);
        self.v.push(key.to_string());
        idx
    }
}

impl Quark {
    pub fn new(v: &[String]) -> Self {
        Self { v: v.to_vec(), m: v.iter().enumerate().map(|(i, s)| (s.to_string(), i)).collect() }
    }

    pub fn is_empty(&self) -> bool {
        self.v.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_by_str() {
        let mut quark = Quark::default();
        for (s, id) in [("setosa", 0), ("versicolor", 1), ("virginica", 2), ("versicolor", 1), ("setosa", 0)] {
            assert_eq!(id, quark.find_or_insert(s), "{} != {}", s, id);
        }
    }

    #[test]
    fn find_by_id() {
        let mut quark = Quark::default();
        quark.find_or_insert("pos");
        quark.find_or_insert("neg");
        assert_eq!(quark.to_str(0), Some("pos"));
        assert_eq!(quark.to_str(1), Some("neg"));
        assert_eq!(quark.to_str(2), None);
    }

    #[test]
    fn from_names() {
        let quark = Quark::new(&["a".to_string(), "b".to_string()]);
        assert_eq!(quark.len(), 2);
        assert_eq!(quark.to_id("b"), Some(1));
    }
}
