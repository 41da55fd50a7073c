use serde::{Deserialize, Deserializer, Serialize};

/// One page of a listing.
///
/// Accepts `{items|data, total|totalCount}` objects as well as a bare array,
/// which is taken to be the complete listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Page<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw<T> {
            Bare(Vec<T>),
            Paged {
                #[serde(alias = "data")]
                items: Vec<T>,
                #[serde(default, alias = "totalCount", alias = "total_count")]
                total: Option<u64>,
            },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Bare(items) => Page {
                total_count: items.len() as u64,
                items,
            },
            Raw::Paged { items, total } => Page {
                total_count: total.unwrap_or(items.len() as u64),
                items,
            },
        })
    }
}

/// Client-side accumulation for "load more" listings.
#[derive(Debug, Clone)]
pub struct PageAccumulator<T> {
    items: Vec<T>,
    page_size: u32,
    pages_loaded: u32,
    total_count: Option<u64>,
    exhausted: bool,
}

impl<T> PageAccumulator<T> {
    pub fn new(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            page_size: page_size.max(1),
            pages_loaded: 0,
            total_count: None,
            exhausted: false,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// 1-based number of the page to request next.
    pub fn next_page(&self) -> u32 {
        self.pages_loaded + 1
    }

    pub fn push(&mut self, page: Page<T>) {
        if page.items.is_empty() {
            self.exhausted = true;
        }
        self.pages_loaded += 1;
        self.total_count = Some(page.total_count);
        self.items.extend(page.items);
    }

    pub fn has_more(&self) -> bool {
        if self.exhausted {
            return false;
        }
        match self.total_count {
            Some(total) => (self.items.len() as u64) < total,
            None => true,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    /// Drop items locally; the server total shrinks by the number removed.
    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        let before = self.items.len();
        self.items.retain(keep);
        let removed = (before - self.items.len()) as u64;
        if let Some(total) = self.total_count.as_mut() {
            *total = total.saturating_sub(removed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_shapes() {
        let bare: Page<u32> = serde_json::from_str("[1, 2, 3]").unwrap();
        assert_eq!(bare.total_count, 3);

        let paged: Page<u32> = serde_json::from_str(r#"{"items": [1], "totalCount": 7}"#).unwrap();
        assert_eq!(paged.items, vec![1]);
        assert_eq!(paged.total_count, 7);

        let data: Page<u32> = serde_json::from_str(r#"{"data": [1, 2], "total": 2}"#).unwrap();
        assert_eq!(data.items.len(), 2);
    }

    #[test]
    fn test_accumulates_until_total_reached() {
        let mut acc = PageAccumulator::new(2);
        assert!(acc.has_more());
        assert_eq!(acc.next_page(), 1);

        acc.push(Page {
            items: vec!["a", "b"],
            total_count: 3,
        });
        assert!(acc.has_more());
        assert_eq!(acc.next_page(), 2);

        acc.push(Page {
            items: vec!["c"],
            total_count: 3,
        });
        assert!(!acc.has_more());
        assert_eq!(acc.items(), &["a", "b", "c"]);
    }

    #[test]
    fn test_empty_page_stops_loading() {
        let mut acc: PageAccumulator<u8> = PageAccumulator::new(10);
        acc.push(Page {
            items: vec![],
            total_count: 50,
        });
        assert!(!acc.has_more());
    }

    #[test]
    fn test_retain_adjusts_total() {
        let mut acc = PageAccumulator::new(10);
        acc.push(Page {
            items: vec![1, 2, 3],
            total_count: 3,
        });
        acc.retain(|n| *n != 2);
        assert_eq!(acc.items(), &[1, 3]);
        assert_eq!(acc.total_count(), Some(2));
        assert_eq!(acc.into_items(), vec![1, 3]);
    }
}
