//! The streaming grammar/lexer engine (spec sections 4.1-4.6). A
//! [`JsonParser`] pulls bytes one at a time from a [`JsonFeeder`], decodes
//! them through an [`encoding::Decoder`], and drives a hand-written
//! character-at-a-time state machine that dispatches to a [`JsonHandler`] --
//! one `step` function, one state enum, fed one character at a time,
//! generalized to the larger grammar (comments, trailing commas, hex and
//! special numbers, multi-encoding input) and event dispatch style
//! (capability object instead of a pulled event) this crate implements.

use crate::allocator::{Allocator, SystemAllocator};
use crate::attrs::{NumberAttributes, StringAttributes};
use crate::encoding::{self, DecodeOutcome, Decoder, Encoding, InputEncoding};
use crate::error::{ParserError, ParserErrorKind};
use crate::feeder::JsonFeeder;
use crate::handler::{HandlerResult, JsonHandler, SpecialNumber};
use crate::lexer::{is_ascii_digit, is_hex_digit, is_token_terminator, is_whitespace};
use crate::location::Location;
use crate::options::JsonParserOptions;
use crate::stack::{self, ContainerKind, NestingStack, Substate};
use crate::buffer::StringBuffer;

/// What number-lexing phase we're in while accumulating a number's ASCII
/// text (spec section 4.2's number grammar, extended with hex states).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NumberPhase {
    /// Just consumed a leading `-`; need a digit next.
    Minus,
    /// The number is exactly `0` so far; `.`, `e`/`E`, or (if enabled)
    /// `x`/`X` may still extend it.
    Zero,
    /// Consuming a non-zero-led run of integer digits.
    IntDigits,
    /// Just consumed `.`; need at least one fraction digit.
    Point,
    /// Consuming fraction digits.
    FracDigits,
    /// Just consumed `e`/`E`; an optional sign or a digit may follow.
    ExpSign,
    /// Just consumed the exponent's sign; need a digit.
    ExpStart,
    /// Consuming exponent digits.
    ExpDigits,
    /// Just consumed `0x`/`0X`; need at least one hex digit.
    HexPrefix,
    /// Consuming hex digits.
    HexDigits,
}

/// Which keyword (or special-number literal) is being matched, and the
/// event it produces once fully matched and correctly terminated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KeywordResult {
    Null,
    True,
    False,
    NaN,
    Infinity,
    NegInfinity,
}

/// The lexer's current "what am I in the middle of" state. `Neutral` means
/// no multi-codepoint token is in progress: the next codepoint either starts
/// one, is whitespace, or is a structural character handled immediately.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LexState {
    Neutral,
    MaybeCommentSlash,
    InLineComment,
    InBlockComment { seen_star: bool },
    InString,
    InStringEscape,
    InUnicodeEscape { digits: u8, value: u16 },
    InNumber(NumberPhase),
    InKeyword { text: &'static [u8], pos: usize, result: KeywordResult },
}

/// Whether a codepoint was consumed by the transition it triggered, or must
/// be re-run against the (now different) lexer state -- lets a single
/// transition encode both "end this value" and "this character is also
/// structural" (e.g. a comma immediately following a number both ends the
/// number and is itself the separator).
enum StepOutcome {
    Consumed,
    Reprocess,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lifecycle {
    Parsing,
    FinishedOk,
    FinishedWithError(ParserError),
}

/// A streaming, event-driven JSON parser (spec sections 3-4). Construct one
/// with [`JsonParser::new`] (or [`JsonParser::new_with_options`]), feed it
/// bytes through its [`JsonFeeder`], and call [`JsonParser::parse`]
/// repeatedly: it consumes everything currently available and returns,
/// dispatching events to the handler as it goes. Once the feeder is marked
/// done and every byte has been consumed, `parse` performs end-of-input
/// finalization and the parser becomes finished (successfully or with an
/// error, queryable via [`JsonParser::current_error`]).
pub struct JsonParser<F: JsonFeeder, H: JsonHandler> {
    feeder: F,
    handler: H,
    options: JsonParserOptions,
    allocator: Box<dyn Allocator>,
    lifecycle: Lifecycle,

    encoding: Option<Encoding>,
    decoder: Option<Decoder>,
    detect_buf: Vec<u8>,

    location: Location,
    after_cr: bool,
    pending_codepoint_start: Option<Location>,

    stack: NestingStack,
    lex_state: LexState,
    buf: StringBuffer,
    token_start: Location,
    escape_start: Location,
    string_attrs: StringAttributes,
    number_attrs: NumberAttributes,
    is_member_name: bool,
    escape_high_surrogate: Option<u16>,
    top_level_done: bool,
}

impl<F: JsonFeeder, H: JsonHandler> JsonParser<F, H> {
    pub fn new(feeder: F, handler: H) -> Self {
        Self::new_with_options(feeder, handler, JsonParserOptions::default())
    }

    pub fn new_with_options(feeder: F, handler: H, options: JsonParserOptions) -> Self {
        JsonParser {
            feeder,
            handler,
            allocator: Box::new(SystemAllocator),
            lifecycle: Lifecycle::Parsing,
            encoding: None,
            decoder: None,
            detect_buf: Vec::new(),
            location: Location::start(),
            after_cr: false,
            pending_codepoint_start: None,
            stack: NestingStack::new(options.max_depth(), options.track_object_members()),
            lex_state: LexState::Neutral,
            buf: StringBuffer::new(),
            token_start: Location::start(),
            escape_start: Location::start(),
            string_attrs: StringAttributes::empty(),
            number_attrs: NumberAttributes::empty(),
            is_member_name: false,
            escape_high_surrogate: None,
            top_level_done: false,
            options,
        }
    }

    /// Use a custom [`Allocator`] instead of the default
    /// [`SystemAllocator`](crate::allocator::SystemAllocator).
    pub fn with_allocator(mut self, allocator: Box<dyn Allocator>) -> Self {
        self.allocator = allocator;
        self
    }

    pub fn feeder_mut(&mut self) -> &mut F {
        &mut self.feeder
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Consume the parser and return its handler, e.g. to pull a built-up
    /// value out of a DOM-building handler once parsing is done.
    pub fn into_handler(self) -> H {
        self.handler
    }

    pub fn options(&self) -> &JsonParserOptions {
        &self.options
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self.lifecycle, Lifecycle::Parsing)
    }

    /// The error the parser finished with, if any.
    pub fn current_error(&self) -> Option<ParserError> {
        match self.lifecycle {
            Lifecycle::FinishedWithError(e) => Some(e),
            _ => None,
        }
    }

    /// Reset the parser's internal parse state (nesting stack, lexer state,
    /// buffers, detected encoding, lifecycle) back to what a freshly
    /// constructed parser would have, preserving the allocator (spec section
    /// 4.6, "reset"). The feeder and handler are left untouched -- replacing
    /// or rewinding those is the caller's responsibility, the same way the
    /// spec's C-heritage reset never reached into the caller-owned feeder.
    pub fn reset(&mut self) {
        self.lifecycle = Lifecycle::Parsing;
        self.encoding = None;
        self.decoder = None;
        self.detect_buf.clear();
        self.location = Location::start();
        self.after_cr = false;
        self.pending_codepoint_start = None;
        self.stack.clear();
        self.lex_state = LexState::Neutral;
        self.buf.clear();
        self.token_start = Location::start();
        self.escape_start = Location::start();
        self.string_attrs = StringAttributes::empty();
        self.number_attrs = NumberAttributes::empty();
        self.is_member_name = false;
        self.escape_high_surrogate = None;
        self.top_level_done = false;
    }

    /// Consume every byte currently available from the feeder, dispatching
    /// events as tokens complete. Returns `Ok(())` when either the parser is
    /// waiting for more input, or the document is fully and successfully
    /// parsed. Returns `Err` (and the parser becomes finished-with-error) the
    /// first time something in the input or a handler can't be reconciled
    /// with the grammar.
    pub fn parse(&mut self) -> Result<(), ParserError> {
        if let Lifecycle::FinishedWithError(e) = self.lifecycle {
            return Err(e);
        }
        if matches!(self.lifecycle, Lifecycle::FinishedOk) {
            return Ok(());
        }
        loop {
            if !self.feeder.has_input() {
                if self.feeder.is_done() {
                    return self.finish_parse();
                }
                return Ok(());
            }
            let byte = self.feeder.next_input().expect("has_input just returned true");
            if let Err(e) = self.consume_byte(byte) {
                self.lifecycle = Lifecycle::FinishedWithError(e);
                return Err(e);
            }
        }
    }

    fn finish_parse(&mut self) -> Result<(), ParserError> {
        match self.try_finish() {
            Ok(()) => {
                self.lifecycle = Lifecycle::FinishedOk;
                Ok(())
            }
            Err(e) => {
                self.lifecycle = Lifecycle::FinishedWithError(e);
                Err(e)
            }
        }
    }

    fn try_finish(&mut self) -> Result<(), ParserError> {
        if self.encoding.is_none() {
            self.resolve_encoding(true)?;
        }
        if let Some(decoder) = self.decoder.as_mut() {
            if let DecodeOutcome::Invalid { .. } = decoder.finish() {
                let loc = self.pending_codepoint_start.take().unwrap_or(self.location);
                return Err(self.err(ParserErrorKind::InvalidEncodingSequence, loc));
            }
        }
        self.finalize_at_eof()
    }

    // --- byte intake & encoding detection -----------------------------

    fn consume_byte(&mut self, byte: u8) -> Result<(), ParserError> {
        let offset = self.location.byte;
        self.location.byte += 1;
        if self.encoding.is_none() {
            self.detect_buf.push(byte);
            let needed = match self.options.input_encoding() {
                InputEncoding::Auto => 4,
                InputEncoding::Fixed(enc) => expected_bom_len(enc),
            };
            if self.detect_buf.len() < needed {
                return Ok(());
            }
            return self.resolve_encoding(false);
        }
        self.feed_decoder_byte(byte, offset)
    }

    fn resolve_encoding(&mut self, is_final: bool) -> Result<(), ParserError> {
        let (encoding, bom_len) = match self.options.input_encoding() {
            InputEncoding::Auto => match encoding::detect_encoding(&self.detect_buf, is_final) {
                encoding::DetectOutcome::Detected { encoding, bom_len } => (encoding, bom_len),
                encoding::DetectOutcome::NeedMoreBytes => return Ok(()),
            },
            InputEncoding::Fixed(enc) => {
                let bom = bom_bytes(enc);
                let matches = self.detect_buf.len() >= bom.len() && &self.detect_buf[..bom.len()] == bom;
                (enc, if matches { bom.len() } else { 0 })
            }
        };
        if bom_len > 0 && !self.options.allow_bom() {
            return Err(self.err(ParserErrorKind::BOMNotAllowed, Location::start()));
        }
        self.encoding = Some(encoding);
        self.decoder = Some(Decoder::new(encoding));
        let r = self.handler.encoding_detected(encoding, Location::start());
        self.handle_plain_result(r, Location::start())?;

        let buffered = std::mem::take(&mut self.detect_buf);
        for (i, b) in buffered.into_iter().enumerate() {
            if i < bom_len {
                continue;
            }
            self.feed_decoder_byte(b, i as u64)?;
        }
        Ok(())
    }

    fn feed_decoder_byte(&mut self, byte: u8, offset: u64) -> Result<(), ParserError> {
        let fresh = self.decoder.as_ref().unwrap().at_fresh_boundary();
        if fresh && self.pending_codepoint_start.is_none() {
            self.pending_codepoint_start = Some(Location {
                byte: offset,
                line: self.location.line,
                column: self.location.column,
                depth: self.stack.depth() as u32,
            });
        }
        let outcome = self.decoder.as_mut().unwrap().feed(byte);
        self.handle_decode_outcome(outcome, offset)
    }

    /// Dispatches a [`DecodeOutcome`], and, when it reports an invalid
    /// sequence whose terminating byte or code unit wasn't actually part of
    /// it, re-submits that byte/unit via [`Decoder::replay`] instead of
    /// dropping it (Unicode section 3.9's maximal-subpart rule).
    fn handle_decode_outcome(&mut self, outcome: DecodeOutcome, offset: u64) -> Result<(), ParserError> {
        match outcome {
            DecodeOutcome::Pending => Ok(()),
            DecodeOutcome::Codepoint(cp) => {
                let loc = self.pending_codepoint_start.take().unwrap();
                self.process_codepoint(cp, loc)
            }
            DecodeOutcome::Invalid { reprocess, .. } => {
                let loc = self.pending_codepoint_start.take().unwrap();
                self.process_invalid(loc)?;
                if reprocess {
                    self.pending_codepoint_start = Some(Location {
                        byte: offset,
                        line: self.location.line,
                        column: self.location.column,
                        depth: self.stack.depth() as u32,
                    });
                    let replayed = self.decoder.as_mut().unwrap().replay();
                    self.handle_decode_outcome(replayed, offset)
                } else {
                    Ok(())
                }
            }
        }
    }

    fn process_invalid(&mut self, loc: Location) -> Result<(), ParserError> {
        if matches!(self.lex_state, LexState::InString) && self.options.replace_invalid_encoding_sequences() {
            self.string_attrs.mark_replaced();
            self.push_string_codepoint(0xFFFD)
        } else {
            Err(self.err(ParserErrorKind::InvalidEncodingSequence, loc))
        }
    }

    fn process_codepoint(&mut self, cp: u32, loc: Location) -> Result<(), ParserError> {
        self.update_line_column(cp);
        loop {
            match self.step(cp, loc)? {
                StepOutcome::Consumed => return Ok(()),
                StepOutcome::Reprocess => continue,
            }
        }
    }

    fn update_line_column(&mut self, cp: u32) {
        if self.after_cr && cp == 0x0A {
            self.after_cr = false;
            return;
        }
        self.after_cr = false;
        if cp == 0x0D {
            self.location.line += 1;
            self.location.column = 0;
            self.after_cr = true;
        } else if cp == 0x0A {
            self.location.line += 1;
            self.location.column = 0;
        } else {
            self.location.column += 1;
        }
    }

    // --- dispatch --------------------------------------------------------

    fn step(&mut self, cp: u32, loc: Location) -> Result<StepOutcome, ParserError> {
        match self.lex_state {
            LexState::Neutral => self.step_neutral(cp, loc),
            LexState::MaybeCommentSlash => self.step_maybe_comment(cp),
            LexState::InLineComment => self.step_line_comment(cp),
            LexState::InBlockComment { seen_star } => self.step_block_comment(cp, seen_star),
            LexState::InString => self.step_in_string(cp, loc),
            LexState::InStringEscape => self.step_in_escape(cp),
            LexState::InUnicodeEscape { digits, value } => self.step_in_unicode_escape(cp, digits, value),
            LexState::InNumber(phase) => self.step_in_number(cp, phase),
            LexState::InKeyword { text, pos, result } => self.step_in_keyword(cp, text, pos, result),
        }
    }

    fn step_neutral(&mut self, cp: u32, loc: Location) -> Result<StepOutcome, ParserError> {
        if is_whitespace(cp) {
            return Ok(StepOutcome::Consumed);
        }
        if cp == b'/' as u32 {
            if !self.options.allow_comments() {
                return Err(self.err(ParserErrorKind::UnknownToken, loc));
            }
            self.token_start = loc;
            self.lex_state = LexState::MaybeCommentSlash;
            return Ok(StepOutcome::Consumed);
        }

        match self.stack.top().map(|f| (f.kind, f.substate)) {
            None => {
                if self.top_level_done {
                    return Err(self.err(ParserErrorKind::UnexpectedToken, loc));
                }
                self.begin_value(cp, loc, None)
            }
            Some((ContainerKind::Object, Substate::Start)) => {
                if cp == b'}' as u32 {
                    self.close_object(loc)
                } else if cp == b'"' as u32 {
                    self.begin_member_name(loc)
                } else {
                    Err(self.err(ParserErrorKind::UnexpectedToken, loc))
                }
            }
            Some((ContainerKind::Object, Substate::AfterMemberName)) => {
                if cp == b':' as u32 {
                    self.stack.top_mut().unwrap().substate = Substate::AfterColon;
                    Ok(StepOutcome::Consumed)
                } else {
                    Err(self.err(ParserErrorKind::UnexpectedToken, loc))
                }
            }
            Some((ContainerKind::Object, Substate::AfterColon)) => self.begin_value(cp, loc, None),
            Some((ContainerKind::Object, Substate::AfterValue)) => {
                if cp == b'}' as u32 {
                    self.close_object(loc)
                } else if cp == b',' as u32 {
                    self.stack.top_mut().unwrap().substate = Substate::AfterComma;
                    Ok(StepOutcome::Consumed)
                } else {
                    Err(self.err(ParserErrorKind::UnexpectedToken, loc))
                }
            }
            Some((ContainerKind::Object, Substate::AfterComma)) => {
                if cp == b'}' as u32 {
                    if self.options.allow_trailing_commas() {
                        self.close_object(loc)
                    } else {
                        Err(self.err(ParserErrorKind::UnexpectedToken, loc))
                    }
                } else if cp == b'"' as u32 {
                    self.begin_member_name(loc)
                } else {
                    Err(self.err(ParserErrorKind::UnexpectedToken, loc))
                }
            }
            Some((ContainerKind::Array, Substate::Start)) => {
                if cp == b']' as u32 {
                    self.close_array(loc)
                } else {
                    self.begin_value(cp, loc, Some(true))
                }
            }
            Some((ContainerKind::Array, Substate::AfterValue)) => {
                if cp == b']' as u32 {
                    self.close_array(loc)
                } else if cp == b',' as u32 {
                    self.stack.top_mut().unwrap().substate = Substate::AfterComma;
                    Ok(StepOutcome::Consumed)
                } else {
                    Err(self.err(ParserErrorKind::UnexpectedToken, loc))
                }
            }
            Some((ContainerKind::Array, Substate::AfterComma)) => {
                if cp == b']' as u32 {
                    if self.options.allow_trailing_commas() {
                        self.close_array(loc)
                    } else {
                        Err(self.err(ParserErrorKind::UnexpectedToken, loc))
                    }
                } else {
                    self.begin_value(cp, loc, Some(false))
                }
            }
            Some((ContainerKind::Array, Substate::AfterMemberName))
            | Some((ContainerKind::Array, Substate::AfterColon)) => {
                unreachable!("arrays never enter the member-name substates")
            }
        }
    }

    fn begin_value(&mut self, cp: u32, loc: Location, array_item_first: Option<bool>) -> Result<StepOutcome, ParserError> {
        if let Some(first) = array_item_first {
            self.dispatch_array_item(first, loc)?;
        }
        match cp {
            x if x == b'{' as u32 => {
                self.stack
                    .push(ContainerKind::Object, &mut *self.allocator)
                    .map_err(|e| self.stack_err(e, loc))?;
                self.dispatch_start_object(loc)?;
                Ok(StepOutcome::Consumed)
            }
            x if x == b'[' as u32 => {
                self.stack
                    .push(ContainerKind::Array, &mut *self.allocator)
                    .map_err(|e| self.stack_err(e, loc))?;
                self.dispatch_start_array(loc)?;
                Ok(StepOutcome::Consumed)
            }
            x if x == b'"' as u32 => {
                self.begin_string_value(loc);
                Ok(StepOutcome::Consumed)
            }
            x if x == b't' as u32 => {
                self.begin_keyword(b"true", loc, KeywordResult::True);
                Ok(StepOutcome::Consumed)
            }
            x if x == b'f' as u32 => {
                self.begin_keyword(b"false", loc, KeywordResult::False);
                Ok(StepOutcome::Consumed)
            }
            x if x == b'n' as u32 => {
                self.begin_keyword(b"null", loc, KeywordResult::Null);
                Ok(StepOutcome::Consumed)
            }
            x if self.options.allow_special_numbers() && x == b'N' as u32 => {
                self.begin_keyword(b"NaN", loc, KeywordResult::NaN);
                Ok(StepOutcome::Consumed)
            }
            x if self.options.allow_special_numbers() && x == b'I' as u32 => {
                self.begin_keyword(b"Infinity", loc, KeywordResult::Infinity);
                Ok(StepOutcome::Consumed)
            }
            x if x == b'-' as u32 => {
                self.begin_number_neg(loc)?;
                Ok(StepOutcome::Consumed)
            }
            x if is_ascii_digit(x) => {
                self.begin_number_digit(x, loc)?;
                Ok(StepOutcome::Consumed)
            }
            _ => Err(self.classify_value_error(cp, loc)),
        }
    }

    fn classify_value_error(&self, cp: u32, loc: Location) -> ParserError {
        let kind = match cp {
            x if x == b'}' as u32 || x == b']' as u32 || x == b',' as u32 || x == b':' as u32 => {
                ParserErrorKind::UnexpectedToken
            }
            _ => ParserErrorKind::UnknownToken,
        };
        self.err(kind, loc)
    }

    // --- comments ----------------------------------------------------

    fn step_maybe_comment(&mut self, cp: u32) -> Result<StepOutcome, ParserError> {
        if cp == b'/' as u32 {
            self.lex_state = LexState::InLineComment;
            Ok(StepOutcome::Consumed)
        } else if cp == b'*' as u32 {
            self.lex_state = LexState::InBlockComment { seen_star: false };
            Ok(StepOutcome::Consumed)
        } else {
            Err(self.err(ParserErrorKind::UnknownToken, self.token_start))
        }
    }

    fn step_line_comment(&mut self, cp: u32) -> Result<StepOutcome, ParserError> {
        if cp == 0x0A || cp == 0x0D {
            self.lex_state = LexState::Neutral;
            Ok(StepOutcome::Reprocess)
        } else {
            Ok(StepOutcome::Consumed)
        }
    }

    fn step_block_comment(&mut self, cp: u32, seen_star: bool) -> Result<StepOutcome, ParserError> {
        if seen_star && cp == b'/' as u32 {
            self.lex_state = LexState::Neutral;
            Ok(StepOutcome::Consumed)
        } else if cp == b'*' as u32 {
            self.lex_state = LexState::InBlockComment { seen_star: true };
            Ok(StepOutcome::Consumed)
        } else {
            self.lex_state = LexState::InBlockComment { seen_star: false };
            Ok(StepOutcome::Consumed)
        }
    }

    // --- strings -------------------------------------------------------

    fn begin_string_value(&mut self, loc: Location) {
        self.token_start = loc;
        self.is_member_name = false;
        self.lex_state = LexState::InString;
        self.buf.clear();
        self.string_attrs = StringAttributes::empty();
        self.escape_high_surrogate = None;
    }

    fn begin_member_name(&mut self, loc: Location) -> Result<StepOutcome, ParserError> {
        self.token_start = loc;
        self.is_member_name = true;
        self.lex_state = LexState::InString;
        self.buf.clear();
        self.string_attrs = StringAttributes::empty();
        self.escape_high_surrogate = None;
        Ok(StepOutcome::Consumed)
    }

    fn step_in_string(&mut self, cp: u32, loc: Location) -> Result<StepOutcome, ParserError> {
        if self.escape_high_surrogate.is_some() && cp != 0x5C {
            return Err(self.err(ParserErrorKind::UnpairedSurrogateEscapeSequence, self.token_start));
        }
        match cp {
            0x22 => self.finalize_string(),
            0x5C => {
                self.escape_start = loc;
                self.lex_state = LexState::InStringEscape;
                Ok(StepOutcome::Consumed)
            }
            0x00..=0x1F => Err(self.err(ParserErrorKind::UnescapedControlCharacter, loc)),
            _ => {
                self.push_string_codepoint(cp)?;
                Ok(StepOutcome::Consumed)
            }
        }
    }

    fn step_in_escape(&mut self, cp: u32) -> Result<StepOutcome, ParserError> {
        let literal = match cp {
            0x22 => Some(0x22u32),
            0x5C => Some(0x5C),
            0x2F => Some(0x2F),
            0x62 => Some(0x08),
            0x66 => Some(0x0C),
            0x6E => Some(0x0A),
            0x72 => Some(0x0D),
            0x74 => Some(0x09),
            _ => None,
        };
        if let Some(l) = literal {
            self.push_string_codepoint(l)?;
            self.lex_state = LexState::InString;
            return Ok(StepOutcome::Consumed);
        }
        if cp == 0x75 {
            self.lex_state = LexState::InUnicodeEscape { digits: 0, value: 0 };
            return Ok(StepOutcome::Consumed);
        }
        Err(self.err(ParserErrorKind::InvalidEscapeSequence, self.escape_start))
    }

    fn step_in_unicode_escape(&mut self, cp: u32, digits: u8, value: u16) -> Result<StepOutcome, ParserError> {
        let d = match hex_digit_value(cp) {
            Some(d) => d,
            None => return Err(self.err(ParserErrorKind::InvalidEscapeSequence, self.escape_start)),
        };
        let new_value = value.wrapping_mul(16).wrapping_add(u16::from(d));
        let new_digits = digits + 1;
        if new_digits < 4 {
            self.lex_state = LexState::InUnicodeEscape { digits: new_digits, value: new_value };
            return Ok(StepOutcome::Consumed);
        }

        self.lex_state = LexState::InString;
        match new_value {
            0xD800..=0xDBFF => {
                if self.escape_high_surrogate.is_some() {
                    return Err(self.err(ParserErrorKind::UnpairedSurrogateEscapeSequence, self.token_start));
                }
                self.escape_high_surrogate = Some(new_value);
            }
            0xDC00..=0xDFFF => match self.escape_high_surrogate.take() {
                Some(high) => {
                    let cp = 0x1_0000 + (u32::from(high) - 0xD800) * 0x400 + (u32::from(new_value) - 0xDC00);
                    self.push_string_codepoint(cp)?;
                }
                None => return Err(self.err(ParserErrorKind::UnpairedSurrogateEscapeSequence, self.token_start)),
            },
            _ => {
                if self.escape_high_surrogate.is_some() {
                    return Err(self.err(ParserErrorKind::UnpairedSurrogateEscapeSequence, self.token_start));
                }
                self.push_string_codepoint(u32::from(new_value))?;
            }
        }
        Ok(StepOutcome::Consumed)
    }

    fn push_string_codepoint(&mut self, cp: u32) -> Result<(), ParserError> {
        self.string_attrs.observe_codepoint(cp);
        let mut scratch = Vec::new();
        encoding::encode_codepoint(cp, self.options.output_encoding(), &mut scratch);
        self.buf
            .extend_from_slice(&scratch, &mut *self.allocator)
            .map_err(|_| self.err(ParserErrorKind::OutOfMemory, self.token_start))?;
        if let Some(max) = self.options.max_output_string_length() {
            if self.buf.len() > max {
                return Err(self.err(ParserErrorKind::TooLongString, self.token_start));
            }
        }
        Ok(())
    }

    fn finalize_string(&mut self) -> Result<StepOutcome, ParserError> {
        let loc = self.token_start;
        let attrs = self.string_attrs;
        let bytes = self.buf.to_vec();
        let result = if self.is_member_name {
            self.handler.object_member(&bytes, attrs, loc)
        } else {
            self.handler.string(&bytes, attrs, loc)
        };
        match result {
            HandlerResult::Abort => return Err(self.err(ParserErrorKind::AbortedByHandler, loc)),
            HandlerResult::TreatAsDuplicate if self.is_member_name => {
                return Err(self.err(ParserErrorKind::DuplicateObjectMember, loc));
            }
            _ => {}
        }
        if self.is_member_name {
            let is_dup = {
                let frame = self.stack.top_mut().expect("member names are only lexed inside an object frame");
                frame.insert_member_name(&bytes)
            };
            if is_dup {
                return Err(self.err(ParserErrorKind::DuplicateObjectMember, loc));
            }
            self.stack.top_mut().unwrap().substate = Substate::AfterMemberName;
        } else {
            self.on_value_complete();
        }
        self.lex_state = LexState::Neutral;
        self.buf.clear();
        self.string_attrs = StringAttributes::empty();
        Ok(StepOutcome::Consumed)
    }

    // --- numbers -------------------------------------------------------

    fn begin_number_neg(&mut self, loc: Location) -> Result<(), ParserError> {
        self.token_start = loc;
        self.buf.clear();
        self.number_attrs = NumberAttributes::empty();
        self.number_attrs.set_negative();
        self.push_number_byte(b'-')?;
        self.lex_state = LexState::InNumber(NumberPhase::Minus);
        Ok(())
    }

    fn begin_number_digit(&mut self, cp: u32, loc: Location) -> Result<(), ParserError> {
        self.token_start = loc;
        self.buf.clear();
        self.number_attrs = NumberAttributes::empty();
        self.push_number_byte(cp as u8)?;
        self.lex_state = LexState::InNumber(if cp == b'0' as u32 { NumberPhase::Zero } else { NumberPhase::IntDigits });
        Ok(())
    }

    fn push_number_byte(&mut self, b: u8) -> Result<(), ParserError> {
        self.buf
            .push_byte(b, &mut *self.allocator)
            .map_err(|_| self.err(ParserErrorKind::OutOfMemory, self.token_start))?;
        if let Some(max) = self.options.max_number_length() {
            if self.buf.len() > max {
                return Err(self.err(ParserErrorKind::TooLongNumber, self.token_start));
            }
        }
        Ok(())
    }

    fn step_in_number(&mut self, cp: u32, phase: NumberPhase) -> Result<StepOutcome, ParserError> {
        use NumberPhase::*;
        match phase {
            Minus => {
                if cp == b'0' as u32 {
                    self.push_number_byte(b'0')?;
                    self.lex_state = LexState::InNumber(Zero);
                    Ok(StepOutcome::Consumed)
                } else if is_ascii_digit(cp) {
                    self.push_number_byte(cp as u8)?;
                    self.lex_state = LexState::InNumber(IntDigits);
                    Ok(StepOutcome::Consumed)
                } else if self.options.allow_special_numbers() && cp == b'I' as u32 {
                    self.lex_state = LexState::InKeyword { text: b"Infinity", pos: 1, result: KeywordResult::NegInfinity };
                    Ok(StepOutcome::Consumed)
                } else {
                    Err(self.err(ParserErrorKind::InvalidNumber, self.token_start))
                }
            }
            Zero => {
                if self.options.allow_hex_numbers() && !self.number_attrs.is_negative() && (cp == b'x' as u32 || cp == b'X' as u32) {
                    self.push_number_byte(cp as u8)?;
                    self.number_attrs.set_hex();
                    self.lex_state = LexState::InNumber(HexPrefix);
                    Ok(StepOutcome::Consumed)
                } else if cp == b'.' as u32 {
                    self.push_number_byte(b'.')?;
                    self.number_attrs.set_decimal_point();
                    self.lex_state = LexState::InNumber(Point);
                    Ok(StepOutcome::Consumed)
                } else if cp == b'e' as u32 || cp == b'E' as u32 {
                    self.push_number_byte(cp as u8)?;
                    self.number_attrs.set_exponent();
                    self.lex_state = LexState::InNumber(ExpSign);
                    Ok(StepOutcome::Consumed)
                } else if is_ascii_digit(cp) {
                    Err(self.err(ParserErrorKind::InvalidNumber, self.token_start))
                } else {
                    self.finalize_number()?;
                    Ok(StepOutcome::Reprocess)
                }
            }
            IntDigits => {
                if is_ascii_digit(cp) {
                    self.push_number_byte(cp as u8)?;
                    Ok(StepOutcome::Consumed)
                } else if cp == b'.' as u32 {
                    self.push_number_byte(b'.')?;
                    self.number_attrs.set_decimal_point();
                    self.lex_state = LexState::InNumber(Point);
                    Ok(StepOutcome::Consumed)
                } else if cp == b'e' as u32 || cp == b'E' as u32 {
                    self.push_number_byte(cp as u8)?;
                    self.number_attrs.set_exponent();
                    self.lex_state = LexState::InNumber(ExpSign);
                    Ok(StepOutcome::Consumed)
                } else {
                    self.finalize_number()?;
                    Ok(StepOutcome::Reprocess)
                }
            }
            Point => {
                if is_ascii_digit(cp) {
                    self.push_number_byte(cp as u8)?;
                    self.lex_state = LexState::InNumber(FracDigits);
                    Ok(StepOutcome::Consumed)
                } else {
                    Err(self.err(ParserErrorKind::InvalidNumber, self.token_start))
                }
            }
            FracDigits => {
                if is_ascii_digit(cp) {
                    self.push_number_byte(cp as u8)?;
                    Ok(StepOutcome::Consumed)
                } else if cp == b'e' as u32 || cp == b'E' as u32 {
                    self.push_number_byte(cp as u8)?;
                    self.number_attrs.set_exponent();
                    self.lex_state = LexState::InNumber(ExpSign);
                    Ok(StepOutcome::Consumed)
                } else {
                    self.finalize_number()?;
                    Ok(StepOutcome::Reprocess)
                }
            }
            ExpSign => {
                if cp == b'+' as u32 {
                    self.push_number_byte(b'+')?;
                    self.lex_state = LexState::InNumber(ExpStart);
                    Ok(StepOutcome::Consumed)
                } else if cp == b'-' as u32 {
                    self.push_number_byte(b'-')?;
                    self.number_attrs.set_negative_exponent();
                    self.lex_state = LexState::InNumber(ExpStart);
                    Ok(StepOutcome::Consumed)
                } else if is_ascii_digit(cp) {
                    self.push_number_byte(cp as u8)?;
                    self.lex_state = LexState::InNumber(ExpDigits);
                    Ok(StepOutcome::Consumed)
                } else {
                    Err(self.err(ParserErrorKind::InvalidNumber, self.token_start))
                }
            }
            ExpStart => {
                if is_ascii_digit(cp) {
                    self.push_number_byte(cp as u8)?;
                    self.lex_state = LexState::InNumber(ExpDigits);
                    Ok(StepOutcome::Consumed)
                } else {
                    Err(self.err(ParserErrorKind::InvalidNumber, self.token_start))
                }
            }
            ExpDigits => {
                if is_ascii_digit(cp) {
                    self.push_number_byte(cp as u8)?;
                    Ok(StepOutcome::Consumed)
                } else {
                    self.finalize_number()?;
                    Ok(StepOutcome::Reprocess)
                }
            }
            HexPrefix => {
                if is_hex_digit(cp) {
                    self.push_number_byte(cp as u8)?;
                    self.lex_state = LexState::InNumber(HexDigits);
                    Ok(StepOutcome::Consumed)
                } else {
                    Err(self.err(ParserErrorKind::InvalidNumber, self.token_start))
                }
            }
            HexDigits => {
                if is_hex_digit(cp) {
                    self.push_number_byte(cp as u8)?;
                    Ok(StepOutcome::Consumed)
                } else {
                    self.finalize_number()?;
                    Ok(StepOutcome::Reprocess)
                }
            }
        }
    }

    fn finalize_number(&mut self) -> Result<(), ParserError> {
        let loc = self.token_start;
        let attrs = self.number_attrs;
        let bytes = self.buf.to_vec();
        let r = self.handler.number(&bytes, attrs, loc);
        self.handle_plain_result(r, loc)?;
        self.on_value_complete();
        self.lex_state = LexState::Neutral;
        self.buf.clear();
        Ok(())
    }

    // --- keywords --------------------------------------------------------

    fn begin_keyword(&mut self, text: &'static [u8], loc: Location, result: KeywordResult) {
        self.token_start = loc;
        self.lex_state = LexState::InKeyword { text, pos: 1, result };
    }

    fn step_in_keyword(
        &mut self,
        cp: u32,
        text: &'static [u8],
        pos: usize,
        result: KeywordResult,
    ) -> Result<StepOutcome, ParserError> {
        if pos < text.len() {
            if cp < 128 && cp as u8 == text[pos] {
                self.lex_state = LexState::InKeyword { text, pos: pos + 1, result };
                Ok(StepOutcome::Consumed)
            } else {
                Err(self.err(ParserErrorKind::UnknownToken, self.token_start))
            }
        } else if is_token_terminator(cp) {
            self.finalize_keyword(result)?;
            Ok(StepOutcome::Reprocess)
        } else {
            Err(self.err(ParserErrorKind::UnknownToken, self.token_start))
        }
    }

    fn finalize_keyword(&mut self, result: KeywordResult) -> Result<(), ParserError> {
        let loc = self.token_start;
        let r = match result {
            KeywordResult::Null => self.handler.null(loc),
            KeywordResult::True => self.handler.boolean(true, loc),
            KeywordResult::False => self.handler.boolean(false, loc),
            KeywordResult::NaN => self.handler.special_number(SpecialNumber::NaN, loc),
            KeywordResult::Infinity => self.handler.special_number(SpecialNumber::Infinity, loc),
            KeywordResult::NegInfinity => self.handler.special_number(SpecialNumber::NegativeInfinity, loc),
        };
        self.handle_plain_result(r, loc)?;
        self.on_value_complete();
        self.lex_state = LexState::Neutral;
        Ok(())
    }

    // --- containers ------------------------------------------------------

    fn dispatch_array_item(&mut self, first: bool, loc: Location) -> Result<(), ParserError> {
        let r = self.handler.array_item(first, loc);
        self.handle_plain_result(r, loc)
    }

    fn dispatch_start_object(&mut self, loc: Location) -> Result<(), ParserError> {
        let r = self.handler.start_object(loc);
        self.handle_plain_result(r, loc)
    }

    fn dispatch_start_array(&mut self, loc: Location) -> Result<(), ParserError> {
        let r = self.handler.start_array(loc);
        self.handle_plain_result(r, loc)
    }

    fn close_object(&mut self, loc: Location) -> Result<StepOutcome, ParserError> {
        if !self.stack.pop(ContainerKind::Object) {
            return Err(self.err(ParserErrorKind::UnexpectedToken, loc));
        }
        let r = self.handler.end_object(loc);
        self.handle_plain_result(r, loc)?;
        self.on_value_complete();
        Ok(StepOutcome::Consumed)
    }

    fn close_array(&mut self, loc: Location) -> Result<StepOutcome, ParserError> {
        if !self.stack.pop(ContainerKind::Array) {
            return Err(self.err(ParserErrorKind::UnexpectedToken, loc));
        }
        let r = self.handler.end_array(loc);
        self.handle_plain_result(r, loc)?;
        self.on_value_complete();
        Ok(StepOutcome::Consumed)
    }

    fn on_value_complete(&mut self) {
        if let Some(frame) = self.stack.top_mut() {
            frame.substate = Substate::AfterValue;
        } else {
            self.top_level_done = true;
        }
    }

    // --- end of input ------------------------------------------------

    fn finalize_at_eof(&mut self) -> Result<(), ParserError> {
        let state = self.lex_state;
        match state {
            LexState::Neutral => {
                if self.stack.is_empty() && self.top_level_done {
                    Ok(())
                } else {
                    Err(self.err(ParserErrorKind::ExpectedMoreTokens, self.location))
                }
            }
            LexState::MaybeCommentSlash => Err(self.err(ParserErrorKind::IncompleteToken, self.token_start)),
            LexState::InLineComment => {
                self.lex_state = LexState::Neutral;
                self.finalize_at_eof()
            }
            LexState::InBlockComment { .. } => Err(self.err(ParserErrorKind::IncompleteToken, self.token_start)),
            LexState::InString | LexState::InStringEscape | LexState::InUnicodeEscape { .. } => {
                Err(self.err(ParserErrorKind::IncompleteToken, self.token_start))
            }
            LexState::InKeyword { text, pos, result } => {
                if pos == text.len() {
                    self.finalize_keyword(result)?;
                    self.finalize_at_eof()
                } else {
                    Err(self.err(ParserErrorKind::IncompleteToken, self.token_start))
                }
            }
            LexState::InNumber(phase) => {
                use NumberPhase::*;
                match phase {
                    Zero | IntDigits | FracDigits | ExpDigits | HexDigits => {
                        self.finalize_number()?;
                        self.finalize_at_eof()
                    }
                    Minus | Point | ExpSign | ExpStart | HexPrefix => {
                        Err(self.err(ParserErrorKind::IncompleteToken, self.token_start))
                    }
                }
            }
        }
    }

    // --- shared helpers ----------------------------------------------

    fn handle_plain_result(&mut self, r: HandlerResult, loc: Location) -> Result<(), ParserError> {
        if r == HandlerResult::Abort {
            return Err(self.err(ParserErrorKind::AbortedByHandler, loc));
        }
        Ok(())
    }

    fn stack_err(&self, e: stack::PushError, loc: Location) -> ParserError {
        match e {
            // Spec section 6's error kind list has no dedicated "too deep"
            // variant; depth, like string/number length, is a bounded
            // resource, so exhausting it is reported the same way
            // exhausting the allocator is. See DESIGN.md.
            stack::PushError::OutOfMemory | stack::PushError::TooDeep => self.err(ParserErrorKind::OutOfMemory, loc),
        }
    }

    fn err(&self, kind: ParserErrorKind, location: Location) -> ParserError {
        ParserError::new(kind, location)
    }
}

fn hex_digit_value(cp: u32) -> Option<u8> {
    match cp {
        0x30..=0x39 => Some((cp - 0x30) as u8),
        0x61..=0x66 => Some((cp - 0x61 + 10) as u8),
        0x41..=0x46 => Some((cp - 0x41 + 10) as u8),
        _ => None,
    }
}

fn expected_bom_len(enc: Encoding) -> usize {
    match enc {
        Encoding::Utf8 => 3,
        Encoding::Utf16Le | Encoding::Utf16Be => 2,
        Encoding::Utf32Le | Encoding::Utf32Be => 4,
    }
}

fn bom_bytes(enc: Encoding) -> &'static [u8] {
    match enc {
        Encoding::Utf8 => &[0xEF, 0xBB, 0xBF],
        Encoding::Utf16Le => &[0xFF, 0xFE],
        Encoding::Utf16Be => &[0xFE, 0xFF],
        Encoding::Utf32Le => &[0xFF, 0xFE, 0x00, 0x00],
        Encoding::Utf32Be => &[0x00, 0x00, 0xFE, 0xFF],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeder::SliceJsonFeeder;
    use crate::handler::NullHandler;
    use crate::options::JsonParserOptionsBuilder;

    #[derive(Default)]
    struct RecordingHandler {
        events: Vec<String>,
    }

    impl JsonHandler for RecordingHandler {
        fn encoding_detected(&mut self, encoding: Encoding, _at: Location) -> HandlerResult {
            self.events.push(format!("encoding({:?})", encoding));
            HandlerResult::Continue
        }
        fn null(&mut self, _at: Location) -> HandlerResult {
            self.events.push("null".into());
            HandlerResult::Continue
        }
        fn boolean(&mut self, value: bool, _at: Location) -> HandlerResult {
            self.events.push(format!("bool({value})"));
            HandlerResult::Continue
        }
        fn string(&mut self, bytes: &[u8], _attrs: StringAttributes, _at: Location) -> HandlerResult {
            self.events.push(format!("string({})", String::from_utf8_lossy(bytes)));
            HandlerResult::Continue
        }
        fn number(&mut self, ascii: &[u8], _attrs: NumberAttributes, _at: Location) -> HandlerResult {
            self.events.push(format!("number({})", String::from_utf8_lossy(ascii)));
            HandlerResult::Continue
        }
        fn special_number(&mut self, kind: SpecialNumber, _at: Location) -> HandlerResult {
            self.events.push(format!("special({kind:?})"));
            HandlerResult::Continue
        }
        fn start_object(&mut self, _at: Location) -> HandlerResult {
            self.events.push("start_object".into());
            HandlerResult::Continue
        }
        fn end_object(&mut self, _at: Location) -> HandlerResult {
            self.events.push("end_object".into());
            HandlerResult::Continue
        }
        fn object_member(&mut self, bytes: &[u8], _attrs: StringAttributes, _at: Location) -> HandlerResult {
            self.events.push(format!("member({})", String::from_utf8_lossy(bytes)));
            HandlerResult::Continue
        }
        fn start_array(&mut self, _at: Location) -> HandlerResult {
            self.events.push("start_array".into());
            HandlerResult::Continue
        }
        fn end_array(&mut self, _at: Location) -> HandlerResult {
            self.events.push("end_array".into());
            HandlerResult::Continue
        }
        fn array_item(&mut self, first: bool, _at: Location) -> HandlerResult {
            self.events.push(format!("item({first})"));
            HandlerResult::Continue
        }
    }

    fn parse_all(input: &[u8], options: JsonParserOptions) -> Result<Vec<String>, ParserError> {
        let feeder = SliceJsonFeeder::new(input);
        let handler = RecordingHandler::default();
        let mut parser = JsonParser::new_with_options(feeder, handler, options);
        parser.parse()?;
        Ok(parser.handler.events)
    }

    #[test]
    fn parses_null() {
        let events = parse_all(b"null", JsonParserOptions::default()).unwrap();
        assert_eq!(events, vec!["encoding(Utf8)", "null"]);
    }

    #[test]
    fn parses_simple_object() {
        let events = parse_all(br#"{"pi":3.14}"#, JsonParserOptions::default()).unwrap();
        assert_eq!(
            events,
            vec!["encoding(Utf8)", "start_object", "member(pi)", "number(3.14)", "end_object"]
        );
    }

    #[test]
    fn rejects_double_comma_in_array() {
        let err = parse_all(b"[1,,2]", JsonParserOptions::default()).unwrap_err();
        assert_eq!(err.kind, ParserErrorKind::UnexpectedToken);
        assert_eq!(err.location.byte, 3);
    }

    #[test]
    fn bom_rejected_by_default() {
        let mut input = vec![0xEF, 0xBB, 0xBF];
        input.extend_from_slice(b"null");
        let err = parse_all(&input, JsonParserOptions::default()).unwrap_err();
        assert_eq!(err.kind, ParserErrorKind::BOMNotAllowed);
    }

    #[test]
    fn bom_allowed_when_enabled() {
        let mut input = vec![0xEF, 0xBB, 0xBF];
        input.extend_from_slice(b"null");
        let options = JsonParserOptionsBuilder::default().with_allow_bom(true).build();
        let events = parse_all(&input, options).unwrap();
        assert_eq!(events, vec!["encoding(Utf8)", "null"]);
    }

    #[test]
    fn duplicate_member_detected_when_tracked() {
        let options = JsonParserOptionsBuilder::default().with_track_object_members(true).build();
        let err = parse_all(br#"{"a":1,"a":2}"#, options).unwrap_err();
        assert_eq!(err.kind, ParserErrorKind::DuplicateObjectMember);
    }

    #[test]
    fn replaces_invalid_sequence_with_u_fffd() {
        // `"abc<C2>"`: 0xC2 is a valid 2-byte lead that the closing quote
        // cannot continue, so the lead byte alone is the invalid subpart
        // and the quote must still close the string afterwards.
        let mut input = b"\"abc".to_vec();
        input.push(0xC2);
        input.push(b'"');
        let options = JsonParserOptionsBuilder::default()
            .with_replace_invalid_encoding_sequences(true)
            .build();
        let feeder = SliceJsonFeeder::new(&input);
        #[derive(Default)]
        struct Cap {
            bytes: Vec<u8>,
            attrs: Option<StringAttributes>,
        }
        impl JsonHandler for Cap {
            fn string(&mut self, bytes: &[u8], attrs: StringAttributes, _at: Location) -> HandlerResult {
                self.bytes = bytes.to_vec();
                self.attrs = Some(attrs);
                HandlerResult::Continue
            }
        }
        let mut parser = JsonParser::new_with_options(feeder, Cap::default(), options);
        parser.parse().unwrap();
        assert_eq!(parser.handler.bytes, b"abc\xEF\xBF\xBD");
        assert!(parser.handler.attrs.unwrap().contains_replaced_sequence());
    }

    #[test]
    fn trailing_comma_rejected_by_default() {
        let err = parse_all(b"[1,]", JsonParserOptions::default()).unwrap_err();
        assert_eq!(err.kind, ParserErrorKind::UnexpectedToken);
    }

    #[test]
    fn trailing_comma_allowed_when_enabled() {
        let options = JsonParserOptionsBuilder::default().with_allow_trailing_commas(true).build();
        let events = parse_all(b"[1,]", options).unwrap();
        assert_eq!(events, vec!["encoding(Utf8)", "start_array", "item(true)", "number(1)", "end_array"]);
    }

    #[test]
    fn special_numbers_require_option() {
        assert_eq!(
            parse_all(b"NaN", JsonParserOptions::default()).unwrap_err().kind,
            ParserErrorKind::UnknownToken
        );
        let options = JsonParserOptionsBuilder::default().with_allow_special_numbers(true).build();
        let events = parse_all(b"[NaN,-Infinity,Infinity]", options).unwrap();
        assert!(events.iter().any(|e| e.contains("NaN")));
        assert!(events.iter().any(|e| e.contains("NegativeInfinity")));
    }

    #[test]
    fn hex_numbers_require_option() {
        let options = JsonParserOptionsBuilder::default().with_allow_hex_numbers(true).build();
        let events = parse_all(b"0x1A", options).unwrap();
        assert_eq!(events, vec!["encoding(Utf8)", "number(0x1A)"]);
    }

    #[test]
    fn comments_require_option() {
        assert_eq!(
            parse_all(b"// hi\nnull", JsonParserOptions::default()).unwrap_err().kind,
            ParserErrorKind::UnknownToken
        );
        let options = JsonParserOptionsBuilder::default().with_allow_comments(true).build();
        let events = parse_all(b"/* hi */ null // trailing", options).unwrap();
        assert_eq!(events, vec!["encoding(Utf8)", "null"]);
    }

    #[test]
    fn incomplete_token_at_eof() {
        let err = parse_all(b"tru", JsonParserOptions::default()).unwrap_err();
        assert_eq!(err.kind, ParserErrorKind::IncompleteToken);
    }

    #[test]
    fn empty_input_is_expected_more_tokens() {
        let err = parse_all(b"", JsonParserOptions::default()).unwrap_err();
        assert_eq!(err.kind, ParserErrorKind::ExpectedMoreTokens);
    }

    #[test]
    fn chunked_input_gives_same_result_as_unchunked() {
        let whole = br#"{"a":[1,2.5,"xé"],"b":null}"#;
        let feeder = SliceJsonFeeder::new(whole);
        let mut whole_parser = JsonParser::new(feeder, RecordingHandler::default());
        whole_parser.parse().unwrap();

        for split in 0..whole.len() {
            let (a, b) = whole.split_at(split);
            let mut push_feeder = crate::feeder::PushJsonFeeder::new();
            let _ = push_feeder.push_bytes(a);
            let handler = RecordingHandler::default();
            let mut parser = JsonParser::new(push_feeder, handler);
            parser.parse().unwrap();
            let _ = parser.feeder_mut().push_bytes(b);
            parser.feeder_mut().done();
            parser.parse().unwrap();
            assert_eq!(parser.handler.events, whole_parser.handler.events, "split at {split}");
        }
    }

    #[test]
    fn handler_abort_stops_parsing() {
        struct Abort;
        impl JsonHandler for Abort {
            fn null(&mut self, _at: Location) -> HandlerResult {
                HandlerResult::Abort
            }
        }
        let feeder = SliceJsonFeeder::new(b"null");
        let mut parser = JsonParser::new(feeder, Abort);
        let err = parser.parse().unwrap_err();
        assert_eq!(err.kind, ParserErrorKind::AbortedByHandler);
    }

    #[test]
    fn allocator_failure_is_reported() {
        let feeder = SliceJsonFeeder::new(b"\"a long enough string to force a grow\"");
        let mut parser = JsonParser::new(feeder, NullHandler)
            .with_allocator(Box::new(crate::allocator::test_support::FailingAllocator::new(1)));
        let err = parser.parse().unwrap_err();
        assert_eq!(err.kind, ParserErrorKind::OutOfMemory);
    }

    /// Spec section 8, "Allocator-failure safety": failing the k-th
    /// allocation, for every k, must terminate with `OutOfMemory` rather than
    /// succeeding differently or panicking.
    #[test]
    fn allocator_failure_at_every_point_is_clean() {
        let json = br#"{"a":[1,2,3],"b":"a string long enough to force a few grows","c":{"d":[true,false,null]}}"#;
        for fail_at in 1..=64 {
            let feeder = SliceJsonFeeder::new(json);
            let mut parser = JsonParser::new(feeder, NullHandler).with_allocator(Box::new(
                crate::allocator::test_support::FailingAllocator::new(fail_at),
            ));
            match parser.parse() {
                Ok(()) => assert!(parser.is_finished()),
                Err(e) => assert_eq!(e.kind, ParserErrorKind::OutOfMemory, "fail_at={fail_at}"),
            }
        }
    }
}
