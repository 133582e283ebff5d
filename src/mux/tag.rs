//! Fixed-width, color-coded source tags.

use std::collections::HashMap;

use colored::Color;

/// Colors assigned to sources round-robin in sorted-name order.
pub const PALETTE: [Color; 12] = [
    Color::BrightRed,
    Color::BrightGreen,
    Color::BrightYellow,
    Color::BrightBlue,
    Color::BrightMagenta,
    Color::BrightCyan,
    Color::Red,
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
];

/// Wrap bytes in the ANSI foreground sequence for `color`.
///
/// Works on raw bytes so log content never has to be valid UTF-8, and the
/// result does not depend on whether a terminal is attached.
pub fn paint(color: Color, bytes: &[u8]) -> Vec<u8> {
    let mut painted = Vec::with_capacity(bytes.len() + 16);
    painted.extend_from_slice(b"\x1b[");
    painted.extend_from_slice(color.to_fg_str().as_bytes());
    painted.push(b'm');
    painted.extend_from_slice(bytes);
    painted.extend_from_slice(b"\x1b[0m");
    painted
}

/// Immutable mapping from source name to its formatted tag bytes.
///
/// Every tag is padded to the longest name plus the separator, so merged
/// output stays column-aligned. Built once before streaming starts and
/// shared read-only across all framing tasks.
#[derive(Debug)]
pub struct TagTable {
    tags: HashMap<String, Vec<u8>>,
}

impl TagTable {
    /// Build the table for `names`.
    ///
    /// Color assignment depends only on the sorted name set, so reruns over
    /// the same sources color identically regardless of discovery order.
    pub fn build(names: &[String], separator: &str, palette: &[Color]) -> Self {
        assert!(!palette.is_empty(), "palette must not be empty");

        let mut sorted: Vec<&String> = names.iter().collect();
        sorted.sort();
        sorted.dedup();

        let width = sorted.iter().map(|name| name.len()).max().unwrap_or(0);

        let mut tags = HashMap::with_capacity(sorted.len());
        for (i, name) in sorted.iter().enumerate() {
            let mut formatted = String::with_capacity(width + separator.len());
            formatted.push_str(name);
            formatted.push_str(&" ".repeat(width - name.len()));
            formatted.push_str(separator);
            tags.insert(
                (*name).clone(),
                paint(palette[i % palette.len()], formatted.as_bytes()),
            );
        }

        Self { tags }
    }

    /// Look up the formatted tag for `name`.
    ///
    /// Panics if `name` was not in the set the table was built from; that is
    /// a logic bug in the caller, not a runtime condition.
    pub fn tag(&self, name: &str) -> &[u8] {
        self.tags
            .get(name)
            .unwrap_or_else(|| panic!("no tag registered for source {name:?}"))
    }
}
