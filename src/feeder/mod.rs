mod bufreader;
mod push;
mod slice;

pub use bufreader::BufReaderJsonFeeder;
pub use push::{PushError, PushJsonFeeder};
pub use slice::SliceJsonFeeder;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FillError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// A source of raw input bytes for [`JsonParser`](crate::JsonParser). The
/// parser treats chunk boundaries as invisible: it pulls bytes one at a time
/// from whatever feeder it's given and can resume mid-codepoint, mid-token,
/// or mid-escape across any split of the underlying stream (spec section 8,
/// "Chunk-invariance").
pub trait JsonFeeder {
    /// Determine if the feeder has input data that can be parsed
    fn has_input(&self) -> bool;

    /// `true` if the end of input has been reached: the feeder has been
    /// told there is no more data (spec's "final push") and every buffered
    /// byte has already been consumed.
    fn is_done(&self) -> bool;

    /// Decode and return the next byte to be parsed
    fn next_input(&mut self) -> Option<u8>;
}
