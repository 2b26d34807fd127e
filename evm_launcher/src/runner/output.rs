//!
//! The subprocess output chunk.
//!

///
/// The subprocess output stream.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    /// The standard output.
    Stdout,
    /// The standard error.
    Stderr,
}

///
/// The subprocess output chunk, forwarded as soon as it is read.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// The stream the chunk was read from.
    pub stream: Stream,
    /// The raw bytes.
    pub data: Vec<u8>,
}

impl Chunk {
    ///
    /// A shortcut constructor.
    ///
    pub fn new(stream: Stream, data: Vec<u8>) -> Self {
        Self { stream, data }
    }
}
