use std::collections::HashSet;
use std::io::{self, BufRead};

use super::Dictionary;

/// A flat set of surface forms.
#[derive(Debug, Default, Clone)]
pub struct WordList {
    values: HashSet<String>,
}

impl WordList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: impl Into<String>) -> bool {
        self.values.insert(value.into())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// One word per line; blank lines and `#` comments are skipped.
    pub fn from_reader(reader: impl BufRead) -> io::Result<Self> {
        let mut list = Self::new();
        for line in reader.lines() {
            let line = line?;
            let word = line.trim();
            if word.is_empty() || word.starts_with('#') {
                continue;
            }
            list.insert(word);
        }
        Ok(list)
    }
}

impl<S: Into<String>> FromIterator<S> for WordList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl Dictionary for WordList {
    fn has_value(&self, value: &str) -> bool {
        self.values.contains(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_reader() {
        let text = "hello\n# comment\n\n  world  \n";
        let list = WordList::from_reader(text.as_bytes()).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.has_value("hello"));
        assert!(list.has_value("world"));
        assert!(!list.has_value("# comment"));
    }

    #[test]
    fn test_from_iter() {
        let list: WordList = ["google", "mozilla"].into_iter().collect();
        assert!(list.has_value("google"));
        assert!(!list.has_value("Google"));
    }
}
