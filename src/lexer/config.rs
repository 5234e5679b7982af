/// Configuration for a lexing session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerConfig {
    /// Abort when one pending match grows past this many characters
    /// (default: unlimited)
    pub max_match_len: Option<usize>,
    /// Number of unconsumed characters quoted in dead-end errors
    /// (default: 16)
    pub error_preview_len: usize,
}

impl Default for LexerConfig {
    fn default() -> Self {
        Self {
            max_match_len: None,
            error_preview_len: 16,
        }
    }
}

impl LexerConfig {
    /// Create a new configuration with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum length of a single match.
    pub fn max_match_len(mut self, limit: usize) -> Self {
        self.max_match_len = Some(limit);
        self
    }

    /// Set how much unconsumed input error messages quote.
    pub fn error_preview_len(mut self, len: usize) -> Self {
        self.error_preview_len = len;
        self
    }
}
