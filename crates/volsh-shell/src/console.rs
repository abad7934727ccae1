//! Output boundary shared by the command handlers.

use std::io::Write;

/// How emphasized listing names are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    /// Wrap emphasized names in a terminal color sequence.
    Color,
    /// Print emphasized names bare.
    Plain,
}

/// Output streams and presentation settings for one shell invocation.
///
/// Handlers write listing lines and raw file content to `out` and every
/// diagnostic to `err`; neither stream is buffered here.
pub struct Console<'a> {
    /// Standard output.
    pub out: &'a mut dyn Write,
    /// Standard error, target of all diagnostics.
    pub err: &'a mut dyn Write,
    /// Rendering choice for emphasized listing names.
    pub emphasis: Emphasis,
}
