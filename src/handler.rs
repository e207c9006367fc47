use crate::attrs::{NumberAttributes, StringAttributes};
use crate::location::Location;

/// What a handler wants the parser to do next (spec section 4.4).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    /// Keep parsing.
    Continue,
    /// Stop parsing. The parser transitions to finished-with-error with
    /// [`ParserErrorKind::AbortedByHandler`](crate::error::ParserErrorKind::AbortedByHandler).
    Abort,
    /// Only legal as the return value of
    /// [`JsonHandler::object_member`]: behave as if duplicate detection
    /// had already seen this member name.
    TreatAsDuplicate,
}

/// A "kind" tag for the optional special numeric literals (spec section 4.2).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecialNumber {
    NaN,
    Infinity,
    NegativeInfinity,
}

/// The client-implemented capability object the parser dispatches events to
/// (spec section 4.4 / 6). Every method has a default no-op implementation
/// returning [`HandlerResult::Continue`], so a client only overrides the
/// events it cares about.
///
/// Every method is passed `at`, the location of the token that triggered it
/// (spec section 4.4, "the dispatcher sets the 'token location' ... to the
/// start of the triggering token"). Handler methods take `&mut self`, not
/// `&mut JsonParser`, so a handler has no way to call back into the parser
/// that is driving it -- the re-entrancy spec section 4.4 warns about is
/// structurally impossible here rather than merely flagged and checked.
#[allow(unused_variables)]
pub trait JsonHandler {
    /// Fires exactly once, immediately after the input encoding is known
    /// (set explicitly or detected), before the first token event.
    fn encoding_detected(
        &mut self,
        encoding: crate::encoding::Encoding,
        at: Location,
    ) -> HandlerResult {
        HandlerResult::Continue
    }

    fn null(&mut self, at: Location) -> HandlerResult {
        HandlerResult::Continue
    }

    fn boolean(&mut self, value: bool, at: Location) -> HandlerResult {
        HandlerResult::Continue
    }

    fn string(&mut self, bytes: &[u8], attrs: StringAttributes, at: Location) -> HandlerResult {
        HandlerResult::Continue
    }

    fn number(&mut self, ascii: &[u8], attrs: NumberAttributes, at: Location) -> HandlerResult {
        HandlerResult::Continue
    }

    fn special_number(&mut self, kind: SpecialNumber, at: Location) -> HandlerResult {
        HandlerResult::Continue
    }

    fn start_object(&mut self, at: Location) -> HandlerResult {
        HandlerResult::Continue
    }

    fn end_object(&mut self, at: Location) -> HandlerResult {
        HandlerResult::Continue
    }

    /// May return [`HandlerResult::TreatAsDuplicate`] in addition to
    /// `Continue`/`Abort`.
    fn object_member(
        &mut self,
        bytes: &[u8],
        attrs: StringAttributes,
        at: Location,
    ) -> HandlerResult {
        HandlerResult::Continue
    }

    fn start_array(&mut self, at: Location) -> HandlerResult {
        HandlerResult::Continue
    }

    fn end_array(&mut self, at: Location) -> HandlerResult {
        HandlerResult::Continue
    }

    fn array_item(&mut self, first: bool, at: Location) -> HandlerResult {
        HandlerResult::Continue
    }
}

/// A [`JsonHandler`] that does nothing and continues unconditionally. Useful
/// when a caller only wants location/error tracking and doesn't need
/// events, or in tests.
#[derive(Default)]
pub struct NullHandler;

impl JsonHandler for NullHandler {}
