//! Bounded terminal output log

/// Terminal output, capped at `limit` characters
///
/// When the text grows past the limit, the oldest characters are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Scrollback {
    text: String,
    limit: usize,
}

impl Scrollback {
    pub fn new(limit: usize) -> Self {
        Self {
            text: String::new(),
            limit,
        }
    }

    /// Create a scrollback holding previously saved text
    pub fn with_text(text: impl Into<String>, limit: usize) -> Self {
        let mut scrollback = Self::new(limit);
        scrollback.push(&text.into());
        scrollback
    }

    /// Append text, evicting the oldest characters past the limit
    pub fn push(&mut self, text: &str) {
        self.text.push_str(text);

        let count = self.text.chars().count();
        if count > self.limit {
            let excess = count - self.limit;
            let cut = self
                .text
                .char_indices()
                .nth(excess)
                .map(|(i, _)| i)
                .unwrap_or(self.text.len());
            self.text.drain(..cut);
        }
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_within_limit() {
        let mut sb = Scrollback::new(16);
        sb.push("hello\n");
        sb.push("world\n");
        assert_eq!(sb.as_str(), "hello\nworld\n");
    }

    #[test]
    fn test_evicts_oldest() {
        let mut sb = Scrollback::new(5);
        sb.push("abc");
        sb.push("defg");
        assert_eq!(sb.as_str(), "cdefg");
    }

    #[test]
    fn test_eviction_is_char_safe() {
        let mut sb = Scrollback::new(3);
        sb.push("héllo");
        assert_eq!(sb.as_str(), "llo");

        sb.push("ñ");
        assert_eq!(sb.as_str(), "loñ");
    }

    #[test]
    fn test_with_text_applies_limit() {
        let sb = Scrollback::with_text("0123456789", 4);
        assert_eq!(sb.as_str(), "6789");
    }

    #[test]
    fn test_zero_limit() {
        let mut sb = Scrollback::new(0);
        sb.push("anything");
        assert!(sb.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut sb = Scrollback::new(10);
        sb.push("abc");
        sb.clear();
        assert_eq!(sb.as_str(), "");
        assert_eq!(sb.limit(), 10);
    }
}
