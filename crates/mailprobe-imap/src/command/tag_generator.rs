//! IMAP command tag generator.
//!
//! Tags are used to match commands with their completion responses.

/// Tag generator for IMAP commands.
///
/// Generates sequential tags in the format "P0000", "P0001", etc. A probe
/// session issues a handful of commands, so the counter simply wraps.
#[derive(Debug, Clone)]
pub struct TagGenerator {
    counter: u16,
    prefix: char,
}

impl TagGenerator {
    /// Creates a new tag generator with the given prefix.
    #[must_use]
    pub const fn new(prefix: char) -> Self {
        Self { counter: 0, prefix }
    }

    /// Generates the next tag.
    pub fn next_tag(&mut self) -> String {
        let n = self.counter;
        self.counter = self.counter.wrapping_add(1);
        format!("{}{:04}", self.prefix, n)
    }
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new('P')
    }
}
