/// A position within the input (parser) or a logical position used to report
/// writer errors. `byte` is the zero-based offset into the raw input stream;
/// `line` and `column` count decoded characters, treating `LF`, `CR`, and
/// `CR LF` each as a single line break; `depth` is the nesting depth of the
/// container that was open when this location was recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, PartialOrd, Ord, Hash)]
pub struct Location {
    /// Zero-based byte offset into the raw input.
    pub byte: u64,
    /// Zero-based line number.
    pub line: u64,
    /// Zero-based column number (character distance from the last line break).
    pub column: u64,
    /// Current container nesting depth (0 at top level).
    pub depth: u32,
}

impl Location {
    /// The location at the very start of an input/output stream.
    pub const fn start() -> Self {
        Location {
            byte: 0,
            line: 0,
            column: 0,
            depth: 0,
        }
    }
}
