//! Listing presentation for directory entries.
//!
//! Formatting is split in two: a structured line record derived from the
//! entry, and a render step where the boundary's [`Emphasis`] choice decides
//! how emphasized names appear. The formatter is stateless and makes no
//! assumption about entry order.

use volsh_volume::{DirEntry, EntryTime};

use crate::console::Emphasis;

/// Terminal sequence opening the emphasized-name rendering.
const EMPHASIS_ON: &str = "\x1b[32m";
/// Terminal sequence restoring normal rendering.
const EMPHASIS_OFF: &str = "\x1b[0m";

/// One listing line with presentation still undecided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingLine {
    /// Entry size in bytes.
    pub size: u64,
    /// Entry creation timestamp.
    pub created: EntryTime,
    /// Entry name.
    pub name: String,
    /// Whether the name should stand out (set for directories).
    pub emphasize: bool,
}

impl From<&DirEntry> for ListingLine {
    fn from(entry: &DirEntry) -> Self {
        Self {
            size: entry.size,
            created: entry.created,
            name: entry.name.clone(),
            emphasize: entry.is_directory(),
        }
    }
}

impl ListingLine {
    /// Renders the line: right-justified size (minimum width 8), the literal
    /// `byte`, the `YY/MM/DD - hh:mm` timestamp, then the name.
    pub fn render(&self, emphasis: Emphasis) -> String {
        let t = &self.created;
        let stamp = format!(
            "{:>2}/{:02}/{:02} - {:02}:{:02}",
            t.year, t.month, t.day, t.hour, t.minute
        );
        let name = if self.emphasize && emphasis == Emphasis::Color {
            format!("{}{}{}", EMPHASIS_ON, self.name, EMPHASIS_OFF)
        } else {
            self.name.clone()
        };
        format!("{:>8} byte\t{}  {}", self.size, stamp, name)
    }
}
