use thiserror::Error;

use crate::Location;

/// The stable, wire-visible error kinds a parse can fail with (spec section 6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ParserErrorKind {
    /// An [`Allocator`](crate::allocator::Allocator) refused to grow a buffer.
    #[error("out of memory")]
    OutOfMemory,

    /// A [`JsonHandler`](crate::handler::JsonHandler) returned
    /// [`HandlerResult::Abort`](crate::handler::HandlerResult::Abort).
    #[error("aborted by handler")]
    AbortedByHandler,

    /// A byte-order mark was present but `allow_bom` is `false`.
    #[error("byte order mark is not allowed")]
    BOMNotAllowed,

    /// The input byte stream does not decode validly in the selected
    /// encoding.
    #[error("invalid encoding sequence")]
    InvalidEncodingSequence,

    /// A run of characters does not form any recognized token (e.g. a
    /// malformed keyword like `nullx`).
    #[error("unknown token")]
    UnknownToken,

    /// A recognized token appeared somewhere the grammar does not allow it.
    #[error("unexpected token")]
    UnexpectedToken,

    /// A token was cut short by the end of input (would have been fine with
    /// more bytes).
    #[error("incomplete token")]
    IncompleteToken,

    /// The input ended before a complete value was seen.
    #[error("expected more tokens")]
    ExpectedMoreTokens,

    /// An unescaped control character appeared inside a string literal.
    #[error("unescaped control character")]
    UnescapedControlCharacter,

    /// A `\` was followed by a character that is not a recognized escape.
    #[error("invalid escape sequence")]
    InvalidEscapeSequence,

    /// A `\uXXXX` surrogate escape was not paired correctly.
    #[error("unpaired surrogate escape sequence")]
    UnpairedSurrogateEscapeSequence,

    /// A decoded string exceeded `max_output_string_length`.
    #[error("string too long")]
    TooLongString,

    /// A number's lexical form is invalid.
    #[error("invalid number")]
    InvalidNumber,

    /// A number's text exceeded `max_number_length`.
    #[error("number too long")]
    TooLongNumber,

    /// `track_object_members` detected (or a handler reported) a repeated
    /// member name within one object.
    #[error("duplicate object member")]
    DuplicateObjectMember,
}

/// A parse error: the kind plus the location of the offending token or byte
/// sequence (spec section 4.6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("{kind} at {location:?}")]
pub struct ParserError {
    pub kind: ParserErrorKind,
    pub location: Location,
}

impl ParserError {
    pub(crate) fn new(kind: ParserErrorKind, location: Location) -> Self {
        ParserError { kind, location }
    }
}

/// Errors that can happen when writing JSON (spec section 4.5 / 4.6's
/// symmetric writer counterpart).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum WriterErrorKind {
    /// An [`Allocator`](crate::allocator::Allocator) refused to grow a buffer.
    #[error("out of memory")]
    OutOfMemory,

    /// The [`OutputHandler`](crate::writer::OutputHandler) returned
    /// [`OutputResult::Abort`](crate::writer::OutputResult::Abort).
    #[error("aborted by handler")]
    AbortedByHandler,

    /// This primitive is not legal in the writer's current grammar state
    /// (e.g. `WriteColon` outside of an object member, or a second top-level
    /// value without a container).
    #[error("unexpected write")]
    UnexpectedWrite,

    /// The number text passed to `WriteNumber` does not parse as a JSON
    /// number.
    #[error("invalid number")]
    InvalidNumber,

    /// The string payload could not be transcoded from its stated source
    /// encoding.
    #[error("invalid encoding sequence")]
    InvalidEncodingSequence,
}

/// A writer error. The writer has no byte-location concept as rich as the
/// parser's (it is never mid-token across calls), so the error is the kind
/// alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct WriterError(pub WriterErrorKind);
