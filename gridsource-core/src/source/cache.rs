//! # Page Cache
//!
//! An opt-in, bounded cache of pages keyed by the encoded remote query. Disabled by default:
//! every grid request goes to the API.
use crate::grid::Page;
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, VecDeque},
    num::NonZeroUsize,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum PageCachePolicy {
    #[default]
    Disabled,
    /// Keep up to `capacity` pages, evicting the oldest insertion first.
    Enabled { capacity: NonZeroUsize },
}

#[derive(Debug)]
pub(crate) struct PageCache {
    capacity: NonZeroUsize,
    pages: HashMap<String, Page>,
    order: VecDeque<String>,
}

impl PageCache {
    pub(crate) fn from_policy(policy: PageCachePolicy) -> Option<Self> {
        match policy {
            PageCachePolicy::Disabled => None,
            PageCachePolicy::Enabled { capacity } => Some(Self {
                capacity,
                pages: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub(crate) fn get(&self, key: &str) -> Option<Page> {
        self.pages.get(key).cloned()
    }

    pub(crate) fn insert(&mut self, key: String, page: Page) {
        if self.pages.insert(key.clone(), page).is_some() {
            return;
        }

        self.order.push_back(key);

        while self.order.len() > self.capacity.get() {
            if let Some(oldest) = self.order.pop_front() {
                self.pages.remove(&oldest);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.pages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(count: u64) -> Page {
        Page {
            rows: vec![],
            row_count: Some(count),
        }
    }

    fn cache(capacity: usize) -> PageCache {
        PageCache::from_policy(PageCachePolicy::Enabled {
            capacity: NonZeroUsize::new(capacity).unwrap(),
        })
        .unwrap()
    }

    #[test]
    fn test_disabled_policy_has_no_cache() {
        assert!(PageCache::from_policy(PageCachePolicy::Disabled).is_none());
    }

    #[test]
    fn test_oldest_entry_is_evicted() {
        let mut cache = cache(2);

        cache.insert("a".to_string(), page(1));
        cache.insert("b".to_string(), page(2));
        cache.insert("c".to_string(), page(3));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(page(2)));
        assert_eq!(cache.get("c"), Some(page(3)));
    }

    #[test]
    fn test_reinsert_replaces_without_growing() {
        let mut cache = cache(2);

        cache.insert("a".to_string(), page(1));
        cache.insert("a".to_string(), page(5));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a"), Some(page(5)));
    }
}
