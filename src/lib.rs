//! # jsonduct
//!
//! A streaming, event-driven JSON parser and writer. Instead of handing back
//! a pulled [`JsonEvent`]-style enum one call at a time, a [`JsonParser`]
//! drives a client-supplied [`JsonHandler`] capability object: feed it bytes
//! through a [`JsonFeeder`](feeder::JsonFeeder), call [`JsonParser::parse`],
//! and the handler's methods fire as tokens complete. The same crate also
//! ships [`writer::JsonWriter`], a symmetric low-level emitter that enforces
//! the same grammar the parser recognizes.
//!
//! ## Examples
//!
//! ### Push-based parsing
//!
//! Push new bytes into a [`PushJsonFeeder`](feeder::PushJsonFeeder) and call
//! [`JsonParser::parse`] whenever more input is available. The parser
//! dispatches events to the handler as it goes; it returns once it has
//! consumed everything currently buffered.
//!
//! ```
//! use jsonduct::{JsonParser, HandlerResult, JsonHandler, Location};
//! use jsonduct::feeder::PushJsonFeeder;
//!
//! #[derive(Default)]
//! struct PrintingHandler;
//!
//! impl JsonHandler for PrintingHandler {
//!     fn string(&mut self, bytes: &[u8], _attrs: jsonduct::StringAttributes, _at: Location) -> HandlerResult {
//!         println!("string: {}", String::from_utf8_lossy(bytes));
//!         HandlerResult::Continue
//!     }
//! }
//!
//! let json = r#"{"name": "Elvis"}"#.as_bytes();
//!
//! let feeder = PushJsonFeeder::new();
//! let mut parser = JsonParser::new(feeder, PrintingHandler::default());
//!
//! let mut i = 0;
//! loop {
//!     i += parser.feeder_mut().push_bytes(&json[i..]);
//!     if i == json.len() {
//!         parser.feeder_mut().done();
//!     }
//!     parser.parse().unwrap();
//!     if parser.is_finished() {
//!         break;
//!     }
//! }
//! assert_eq!(parser.current_error(), None);
//! ```
//!
//! ### Parsing a slice of bytes
//!
//! For convenience, [`SliceJsonFeeder`](feeder::SliceJsonFeeder) feeds the
//! parser from a byte slice that is already known to be complete.
//!
//! ```
//! use jsonduct::{JsonParser, NullHandler};
//! use jsonduct::feeder::SliceJsonFeeder;
//!
//! let json = r#"{"name": "Elvis"}"#.as_bytes();
//!
//! let feeder = SliceJsonFeeder::new(json);
//! let mut parser = JsonParser::new(feeder, NullHandler);
//! parser.parse().unwrap();
//! assert!(parser.is_finished());
//! assert_eq!(parser.current_error(), None);
//! ```
//!
//! ### Writing JSON
//!
//! [`JsonWriter`](writer::JsonWriter) mirrors the parser's grammar in the
//! other direction: each method writes one structural primitive or value and
//! returns an error if it isn't legal at the writer's current position.
//!
//! ```
//! use jsonduct::encoding::Encoding;
//! use jsonduct::writer::{JsonWriter, VecOutputHandler};
//!
//! let mut writer = JsonWriter::new(VecOutputHandler::default());
//! writer.write_start_object().unwrap();
//! writer.write_string(b"name", Encoding::Utf8).unwrap();
//! writer.write_colon().unwrap();
//! writer.write_string(b"Elvis", Encoding::Utf8).unwrap();
//! writer.write_end_object().unwrap();
//!
//! assert_eq!(writer.into_output().0, br#"{"name":"Elvis"}"#);
//! ```

mod allocator;
mod attrs;
mod buffer;
pub mod encoding;
mod error;
pub mod feeder;
mod handler;
mod lexer;
mod location;
mod options;
mod parser;
mod reset;
mod stack;
pub mod writer;

pub use attrs::{NumberAttributes, StringAttributes};
pub use error::{ParserError, ParserErrorKind, WriterError, WriterErrorKind};
pub use handler::{HandlerResult, JsonHandler, NullHandler, SpecialNumber};
pub use location::Location;
pub use options::{JsonParserOptions, JsonParserOptionsBuilder};
pub use parser::JsonParser;
