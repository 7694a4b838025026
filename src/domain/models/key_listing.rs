/// All keys found under a prefix, gathered across every page of a listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyListing {
    prefix: String,
    keys: Vec<String>,
    pages: usize,
}

impl KeyListing {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            keys: Vec::new(),
            pages: 0,
        }
    }

    /// Append the keys of one page
    pub fn push_page(&mut self, keys: impl IntoIterator<Item = String>) {
        self.keys.extend(keys);
        self.pages += 1;
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Number of pages the listing was assembled from
    pub fn pages(&self) -> usize {
        self.pages
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn into_keys(self) -> Vec<String> {
        self.keys
    }
}

impl IntoIterator for KeyListing {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.into_iter()
    }
}
