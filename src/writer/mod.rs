//! The writer state machine: the parser's mirror image (spec section 4.5).
//! A [`JsonWriter`] accepts the same vocabulary of primitives the parser's
//! [`JsonHandler`](crate::handler::JsonHandler) receives, validates them
//! against the same grammar the parser enforces on read, and streams bytes
//! to a client-supplied [`OutputHandler`] as each primitive is accepted.

mod options;

pub use options::{WriterOptions, WriterOptionsBuilder};

use crate::allocator::{Allocator, SystemAllocator};
use crate::encoding::{self, DecodeOutcome, Decoder, Encoding};
use crate::error::{WriterError, WriterErrorKind};
use crate::handler::SpecialNumber;
use crate::stack::{ContainerKind, NestingStack, PushError, Substate};

/// What an [`OutputHandler`] wants the writer to do next (spec section 4.5,
/// "its return value is Continue or Abort").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputResult {
    Continue,
    Abort,
}

/// The client-implemented sink a [`JsonWriter`] streams encoded bytes to.
/// Invoked once per primitive that actually produces output (an accepted
/// `WriteSpace(0)` produces none and triggers no call).
pub trait OutputHandler {
    fn write_bytes(&mut self, bytes: &[u8]) -> OutputResult;
}

/// An [`OutputHandler`] that appends everything to an in-memory `Vec<u8>`.
/// Handy for tests and for callers who just want a `Vec<u8>` out the other
/// end rather than streaming to a socket or file.
#[derive(Default)]
pub struct VecOutputHandler(pub Vec<u8>);

impl OutputHandler for VecOutputHandler {
    fn write_bytes(&mut self, bytes: &[u8]) -> OutputResult {
        self.0.extend_from_slice(bytes);
        OutputResult::Continue
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lifecycle {
    Writing,
    Finished,
    FinishedWithError(WriterErrorKind),
}

/// What a write primitive is allowed to be, in terms of the writer's own
/// grammar (spec section 4.5).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WriteKind {
    /// Any of Null/Boolean/String-as-value/Number/SpecialNumber/
    /// StartObject/StartArray.
    Value,
    /// A string used as an object member name (only possible distinction
    /// from a value string is the grammar position it appears in).
    MemberName,
}

/// A streaming, event-driven JSON writer (spec sections 4.5-4.6). Construct
/// one with [`JsonWriter::new`] (or [`JsonWriter::new_with_options`]), then
/// call its `write_*` primitives in the order a valid document requires;
/// each accepted primitive streams its encoded bytes to the configured
/// [`OutputHandler`] before returning.
pub struct JsonWriter<H: OutputHandler> {
    handler: H,
    options: WriterOptions,
    allocator: Box<dyn Allocator>,
    lifecycle: Lifecycle,
    stack: NestingStack,
    top_level_done: bool,
}

impl<H: OutputHandler> JsonWriter<H> {
    pub fn new(handler: H) -> Self {
        Self::new_with_options(handler, WriterOptions::default())
    }

    pub fn new_with_options(handler: H, options: WriterOptions) -> Self {
        JsonWriter {
            handler,
            options,
            allocator: Box::new(SystemAllocator),
            lifecycle: Lifecycle::Writing,
            stack: NestingStack::new(usize::MAX, false),
            top_level_done: false,
        }
    }

    pub fn with_allocator(mut self, allocator: Box<dyn Allocator>) -> Self {
        self.allocator = allocator;
        self
    }

    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Consume the writer and return its output handler, e.g. to pull the
    /// `Vec<u8>` out of a [`VecOutputHandler`] once writing is done.
    pub fn into_output(self) -> H {
        self.handler
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self.lifecycle, Lifecycle::Writing)
    }

    pub fn current_error(&self) -> Option<WriterErrorKind> {
        match self.lifecycle {
            Lifecycle::FinishedWithError(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn write_null(&mut self) -> Result<(), WriterError> {
        self.guard(WriteKind::Value)?;
        self.emit(b"null")?;
        self.on_value_written();
        Ok(())
    }

    pub fn write_boolean(&mut self, value: bool) -> Result<(), WriterError> {
        self.guard(WriteKind::Value)?;
        self.emit(if value { b"true" } else { b"false" })?;
        self.on_value_written();
        Ok(())
    }

    pub fn write_special_number(&mut self, kind: SpecialNumber) -> Result<(), WriterError> {
        self.guard(WriteKind::Value)?;
        let text: &[u8] = match kind {
            SpecialNumber::NaN => b"NaN",
            SpecialNumber::Infinity => b"Infinity",
            SpecialNumber::NegativeInfinity => b"-Infinity",
        };
        self.emit(text)?;
        self.on_value_written();
        Ok(())
    }

    pub fn write_number(&mut self, ascii: &[u8]) -> Result<(), WriterError> {
        if let Lifecycle::FinishedWithError(k) = self.lifecycle {
            return Err(WriterError(k));
        }
        if !validate_number(ascii) {
            return Err(self.fail(WriterErrorKind::InvalidNumber));
        }
        self.guard(WriteKind::Value)?;
        self.emit(ascii)?;
        self.on_value_written();
        Ok(())
    }

    /// Write a string. Whether it is emitted as an object member name or a
    /// value string is inferred from the writer's current grammar position,
    /// the same way the parser infers it from nesting-stack substate rather
    /// than from a separate "are you a key" flag on the token itself.
    pub fn write_string(&mut self, bytes: &[u8], source_encoding: Encoding) -> Result<(), WriterError> {
        let expects_member_name = matches!(
            self.stack.top().map(|f| (f.kind, f.substate)),
            Some((ContainerKind::Object, Substate::Start)) | Some((ContainerKind::Object, Substate::AfterComma))
        );
        let kind = if expects_member_name { WriteKind::MemberName } else { WriteKind::Value };
        self.guard(kind)?;
        self.emit_escaped_string(bytes, source_encoding)?;
        if expects_member_name {
            self.stack.top_mut().unwrap().substate = Substate::AfterMemberName;
        } else {
            self.on_value_written();
        }
        Ok(())
    }

    pub fn write_start_object(&mut self) -> Result<(), WriterError> {
        self.guard(WriteKind::Value)?;
        self.push_frame(ContainerKind::Object)?;
        self.emit(b"{")
    }

    pub fn write_end_object(&mut self) -> Result<(), WriterError> {
        self.close(ContainerKind::Object, b"}")
    }

    pub fn write_start_array(&mut self) -> Result<(), WriterError> {
        self.guard(WriteKind::Value)?;
        self.push_frame(ContainerKind::Array)?;
        self.emit(b"[")
    }

    pub fn write_end_array(&mut self) -> Result<(), WriterError> {
        self.close(ContainerKind::Array, b"]")
    }

    pub fn write_colon(&mut self) -> Result<(), WriterError> {
        if let Lifecycle::FinishedWithError(k) = self.lifecycle {
            return Err(WriterError(k));
        }
        match self.stack.top().map(|f| f.substate) {
            Some(Substate::AfterMemberName) => {
                self.emit(b":")?;
                self.stack.top_mut().unwrap().substate = Substate::AfterColon;
                Ok(())
            }
            _ => Err(self.fail(WriterErrorKind::UnexpectedWrite)),
        }
    }

    pub fn write_comma(&mut self) -> Result<(), WriterError> {
        if let Lifecycle::FinishedWithError(k) = self.lifecycle {
            return Err(WriterError(k));
        }
        match self.stack.top().map(|f| f.substate) {
            Some(Substate::AfterValue) => {
                self.emit(b",")?;
                self.stack.top_mut().unwrap().substate = Substate::AfterComma;
                Ok(())
            }
            _ => Err(self.fail(WriterErrorKind::UnexpectedWrite)),
        }
    }

    /// Always legal (spec section 4.5, "WriteSpace and WriteNewLine are
    /// always legal").
    pub fn write_space(&mut self, n: usize) -> Result<(), WriterError> {
        if n == 0 {
            return Ok(());
        }
        let spaces = [b' '; 64];
        let mut remaining = n;
        while remaining > 0 {
            let chunk = remaining.min(spaces.len());
            self.emit(&spaces[..chunk])?;
            remaining -= chunk;
        }
        Ok(())
    }

    pub fn write_new_line(&mut self) -> Result<(), WriterError> {
        if self.options.use_crlf() {
            self.emit(b"\r\n")
        } else {
            self.emit(b"\n")
        }
    }

    // --- internals -----------------------------------------------------

    fn guard(&mut self, kind: WriteKind) -> Result<(), WriterError> {
        if let Lifecycle::FinishedWithError(k) = self.lifecycle {
            return Err(WriterError(k));
        }
        let legal = match (self.stack.top().map(|f| (f.kind, f.substate)), kind) {
            (None, WriteKind::Value) => !self.top_level_done,
            (None, WriteKind::MemberName) => false,
            (Some((ContainerKind::Object, Substate::AfterColon)), WriteKind::Value) => true,
            (Some((ContainerKind::Object, Substate::Start)), WriteKind::MemberName) => true,
            (Some((ContainerKind::Object, Substate::AfterComma)), WriteKind::MemberName) => true,
            (Some((ContainerKind::Array, Substate::Start)), WriteKind::Value) => true,
            (Some((ContainerKind::Array, Substate::AfterComma)), WriteKind::Value) => true,
            _ => false,
        };
        if legal {
            Ok(())
        } else {
            Err(self.fail(WriterErrorKind::UnexpectedWrite))
        }
    }

    fn push_frame(&mut self, kind: ContainerKind) -> Result<(), WriterError> {
        self.stack.push(kind, &mut *self.allocator).map_err(|e| {
            self.fail(match e {
                PushError::OutOfMemory | PushError::TooDeep => WriterErrorKind::OutOfMemory,
            })
        })
    }

    fn close(&mut self, kind: ContainerKind, token: &[u8]) -> Result<(), WriterError> {
        if let Lifecycle::FinishedWithError(k) = self.lifecycle {
            return Err(WriterError(k));
        }
        let top_ok = matches!(
            self.stack.top().map(|f| (f.kind, f.substate)),
            Some((k, Substate::Start)) if k == kind
        ) || matches!(
            self.stack.top().map(|f| (f.kind, f.substate)),
            Some((k, Substate::AfterValue)) if k == kind
        );
        if !top_ok {
            return Err(self.fail(WriterErrorKind::UnexpectedWrite));
        }
        self.stack.pop(kind);
        self.emit(token)?;
        self.on_value_written();
        Ok(())
    }

    fn on_value_written(&mut self) {
        if let Some(frame) = self.stack.top_mut() {
            frame.substate = Substate::AfterValue;
        } else {
            self.top_level_done = true;
            self.lifecycle = Lifecycle::Finished;
        }
    }

    fn emit(&mut self, bytes: &[u8]) -> Result<(), WriterError> {
        if let Lifecycle::FinishedWithError(k) = self.lifecycle {
            return Err(WriterError(k));
        }
        if bytes.is_empty() {
            return Ok(());
        }
        match self.handler.write_bytes(bytes) {
            OutputResult::Continue => Ok(()),
            OutputResult::Abort => Err(self.fail(WriterErrorKind::AbortedByHandler)),
        }
    }

    fn fail(&mut self, kind: WriterErrorKind) -> WriterError {
        self.lifecycle = Lifecycle::FinishedWithError(kind);
        WriterError(kind)
    }

    fn emit_escaped_string(&mut self, bytes: &[u8], source_encoding: Encoding) -> Result<(), WriterError> {
        self.emit(b"\"")?;
        let mut decoder = Decoder::new(source_encoding);
        let mut out = Vec::new();
        for &b in bytes {
            match decoder.feed(b) {
                DecodeOutcome::Pending => {}
                DecodeOutcome::Codepoint(cp) => self.append_escaped_codepoint(cp, &mut out)?,
                DecodeOutcome::Invalid { .. } => self.append_invalid(&mut out)?,
            }
        }
        if let DecodeOutcome::Invalid { .. } = decoder.finish() {
            self.append_invalid(&mut out)?;
        }
        self.emit(&out)?;
        self.emit(b"\"")
    }

    fn append_invalid(&mut self, out: &mut Vec<u8>) -> Result<(), WriterError> {
        if self.options.replace_invalid_encoding_sequences() {
            out.extend_from_slice(b"\\uFFFD");
            Ok(())
        } else {
            Err(self.fail(WriterErrorKind::InvalidEncodingSequence))
        }
    }

    fn append_escaped_codepoint(&mut self, cp: u32, out: &mut Vec<u8>) -> Result<(), WriterError> {
        match cp {
            0x22 => out.extend_from_slice(b"\\\""),
            0x5C => out.extend_from_slice(b"\\\\"),
            0x08 => out.extend_from_slice(b"\\b"),
            0x0C => out.extend_from_slice(b"\\f"),
            0x0A => out.extend_from_slice(b"\\n"),
            0x0D => out.extend_from_slice(b"\\r"),
            0x09 => out.extend_from_slice(b"\\t"),
            0x00..=0x1F | 0x2028 | 0x2029 => {
                out.extend_from_slice(format!("\\u{cp:04X}").as_bytes());
            }
            _ => encoding::encode_codepoint(cp, self.options.output_encoding(), out),
        }
        Ok(())
    }
}

/// Validate a number's ASCII text against the decimal grammar (spec section
/// 4.2) or the hex grammar (spec section 4.5, "validation accepts
/// `0[xX][0-9a-fA-F]+` as a number literal too, but rejects `-0x...` and
/// mixed hex-with-exponent/fraction").
fn validate_number(ascii: &[u8]) -> bool {
    let n = ascii.len();
    if n == 0 {
        return false;
    }
    let mut i = 0;
    let negative = ascii[0] == b'-';
    if negative {
        i += 1;
    }
    if i >= n {
        return false;
    }

    if ascii[i] == b'0' && i + 1 < n && (ascii[i + 1] == b'x' || ascii[i + 1] == b'X') {
        if negative {
            return false;
        }
        i += 2;
        let start = i;
        while i < n && ascii[i].is_ascii_hexdigit() {
            i += 1;
        }
        return i == n && i > start;
    }

    if ascii[i] == b'0' {
        i += 1;
    } else if ascii[i].is_ascii_digit() {
        while i < n && ascii[i].is_ascii_digit() {
            i += 1;
        }
    } else {
        return false;
    }

    if i < n && ascii[i] == b'.' {
        i += 1;
        let start = i;
        while i < n && ascii[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            return false;
        }
    }

    if i < n && (ascii[i] == b'e' || ascii[i] == b'E') {
        i += 1;
        if i < n && (ascii[i] == b'+' || ascii[i] == b'-') {
            i += 1;
        }
        let start = i;
        while i < n && ascii[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            return false;
        }
    }

    i == n
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_writer() -> JsonWriter<VecOutputHandler> {
        JsonWriter::new(VecOutputHandler::default())
    }

    fn out(writer: &JsonWriter<VecOutputHandler>) -> &str {
        std::str::from_utf8(&writer.handler.0).unwrap()
    }

    #[test]
    fn writes_null() {
        let mut w = new_writer();
        w.write_null().unwrap();
        assert_eq!(out(&w), "null");
    }

    #[test]
    fn writes_simple_object() {
        let mut w = new_writer();
        w.write_start_object().unwrap();
        w.write_string(b"pi", Encoding::Utf8).unwrap();
        w.write_colon().unwrap();
        w.write_number(b"3.14").unwrap();
        w.write_end_object().unwrap();
        assert_eq!(out(&w), r#"{"pi":3.14}"#);
    }

    #[test]
    fn writes_array_with_comma() {
        let mut w = new_writer();
        w.write_start_array().unwrap();
        w.write_number(b"1").unwrap();
        w.write_comma().unwrap();
        w.write_number(b"2").unwrap();
        w.write_end_array().unwrap();
        assert_eq!(out(&w), "[1,2]");
    }

    #[test]
    fn rejects_colon_without_member_name() {
        let mut w = new_writer();
        w.write_start_object().unwrap();
        let err = w.write_colon().unwrap_err();
        assert_eq!(err.0, WriterErrorKind::UnexpectedWrite);
    }

    #[test]
    fn rejects_second_top_level_value() {
        let mut w = new_writer();
        w.write_null().unwrap();
        let err = w.write_null().unwrap_err();
        assert_eq!(err.0, WriterErrorKind::UnexpectedWrite);
    }

    #[test]
    fn rejects_invalid_number() {
        let mut w = new_writer();
        let err = w.write_number(b"01").unwrap_err();
        assert_eq!(err.0, WriterErrorKind::InvalidNumber);
        let err = w.write_number(b"-0x1").unwrap_err();
        assert_eq!(err.0, WriterErrorKind::InvalidNumber);
    }

    #[test]
    fn accepts_hex_number() {
        let mut w = new_writer();
        w.write_number(b"0x1A").unwrap();
        assert_eq!(out(&w), "0x1A");
    }

    #[test]
    fn escapes_control_and_special_characters() {
        let mut w = new_writer();
        w.write_string(b"a\tb\"c\\d\x01e\xe2\x80\xa8", Encoding::Utf8).unwrap();
        assert_eq!(out(&w), "\"a\\tb\\\"c\\\\d\\u0001e\\u2028\"");
    }

    #[test]
    fn replaces_invalid_source_bytes_with_u_fffd_escape() {
        let options = WriterOptionsBuilder::default().with_replace_invalid_encoding_sequences(true).build();
        let mut w = JsonWriter::new_with_options(VecOutputHandler::default(), options);
        w.write_string(&[b'a', 0xFF, b'b'], Encoding::Utf8).unwrap();
        assert_eq!(out(&w), "\"a\\uFFFDb\"");
    }

    #[test]
    fn use_crlf_option_changes_newline() {
        let options = WriterOptionsBuilder::default().with_use_crlf(true).build();
        let mut w = JsonWriter::new_with_options(VecOutputHandler::default(), options);
        w.write_null().unwrap();
        w.write_new_line().unwrap();
        assert_eq!(out(&w), "null\r\n");
    }

    #[test]
    fn round_trips_through_parser() {
        use crate::feeder::SliceJsonFeeder;
        use crate::handler::{HandlerResult, JsonHandler};
        use crate::JsonParser;

        let mut w = new_writer();
        w.write_start_object().unwrap();
        w.write_string(b"items", Encoding::Utf8).unwrap();
        w.write_colon().unwrap();
        w.write_start_array().unwrap();
        w.write_number(b"1").unwrap();
        w.write_comma().unwrap();
        w.write_string(b"two", Encoding::Utf8).unwrap();
        w.write_end_array().unwrap();
        w.write_end_object().unwrap();
        let bytes = w.handler.0;

        #[derive(Default)]
        struct Recorder(Vec<&'static str>);
        impl JsonHandler for Recorder {
            fn start_object(&mut self, _at: crate::Location) -> HandlerResult {
                self.0.push("start_object");
                HandlerResult::Continue
            }
            fn start_array(&mut self, _at: crate::Location) -> HandlerResult {
                self.0.push("start_array");
                HandlerResult::Continue
            }
        }
        let feeder = SliceJsonFeeder::new(&bytes);
        let mut parser = JsonParser::new(feeder, Recorder::default());
        parser.parse().unwrap();
        assert!(parser.is_finished());
        assert_eq!(parser.current_error(), None);
    }

    #[test]
    fn allocator_failure_at_every_point_is_clean() {
        for fail_at in 1..=32 {
            let mut w = JsonWriter::new(VecOutputHandler::default()).with_allocator(Box::new(
                crate::allocator::test_support::FailingAllocator::new(fail_at),
            ));
            let mut failed = false;
            for _ in 0..20 {
                if w.write_start_array().is_err() {
                    failed = true;
                    break;
                }
            }
            if let Some(err) = w.current_error() {
                assert_eq!(err, WriterErrorKind::OutOfMemory, "fail_at={fail_at}");
            } else {
                assert!(!failed, "fail_at={fail_at}");
            }
        }
    }
}
