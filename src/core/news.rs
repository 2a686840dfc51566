pub const HEADLINES: [&str; 3] = [
    "Bitcoin hits new highs amid institutional adoption.",
    "Ethereum 2.0 upgrade boosts network efficiency.",
    "Stock market reacts to economic data releases.",
];

/// Headline carousel; both directions wrap.
#[derive(Debug, Clone)]
pub struct NewsRotation {
    items: Vec<String>,
    index: usize,
}

impl Default for NewsRotation {
    fn default() -> Self {
        Self::new(HEADLINES.iter().map(|h| h.to_string()).collect())
    }
}

impl NewsRotation {
    pub fn new(items: Vec<String>) -> Self {
        NewsRotation { items, index: 0 }
    }

    pub fn current(&self) -> Option<&str> {
        self.items.get(self.index).map(String::as_str)
    }

    pub fn next(&mut self) {
        if !self.items.is_empty() {
            self.index = (self.index + 1) % self.items.len();
        }
    }

    pub fn previous(&mut self) {
        if !self.items.is_empty() {
            self.index = (self.index + self.items.len() - 1) % self.items.len();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_wraps_both_ways() {
        let mut news = NewsRotation::default();
        assert_eq!(news.current(), Some(HEADLINES[0]));
        news.previous();
        assert_eq!(news.current(), Some(HEADLINES[2]));
        news.next();
        news.next();
        assert_eq!(news.current(), Some(HEADLINES[1]));
        news.next();
        news.next();
        assert_eq!(news.current(), Some(HEADLINES[0]));
    }

    #[test]
    fn test_empty_rotation() {
        let mut news = NewsRotation::new(vec![]);
        news.next();
        news.previous();
        assert_eq!(news.current(), None);
    }
}
