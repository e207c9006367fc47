use crate::encoding::{Encoding, InputEncoding};

/// Options for [`JsonParser`](crate::JsonParser). Use [`JsonParserOptionsBuilder`]
/// to create instances of this struct. All flags default to `false`, all
/// limits default to unbounded, `input_encoding` defaults to `Auto`, and
/// `output_encoding` defaults to UTF-8 (spec section 6).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JsonParserOptions {
    pub(crate) input_encoding: InputEncoding,
    pub(crate) output_encoding: Encoding,
    pub(crate) max_output_string_length: Option<usize>,
    pub(crate) max_number_length: Option<usize>,
    pub(crate) allow_bom: bool,
    pub(crate) allow_comments: bool,
    pub(crate) allow_trailing_commas: bool,
    pub(crate) allow_special_numbers: bool,
    pub(crate) allow_hex_numbers: bool,
    pub(crate) replace_invalid_encoding_sequences: bool,
    pub(crate) track_object_members: bool,
    pub(crate) max_depth: usize,
}

impl Default for JsonParserOptions {
    fn default() -> Self {
        JsonParserOptions {
            input_encoding: InputEncoding::Auto,
            output_encoding: Encoding::Utf8,
            max_output_string_length: None,
            max_number_length: None,
            allow_bom: false,
            allow_comments: false,
            allow_trailing_commas: false,
            allow_special_numbers: false,
            allow_hex_numbers: false,
            replace_invalid_encoding_sequences: false,
            track_object_members: false,
            max_depth: usize::MAX,
        }
    }
}

impl JsonParserOptions {
    pub fn input_encoding(&self) -> InputEncoding {
        self.input_encoding
    }

    pub fn output_encoding(&self) -> Encoding {
        self.output_encoding
    }

    pub fn max_output_string_length(&self) -> Option<usize> {
        self.max_output_string_length
    }

    pub fn max_number_length(&self) -> Option<usize> {
        self.max_number_length
    }

    pub fn allow_bom(&self) -> bool {
        self.allow_bom
    }

    pub fn allow_comments(&self) -> bool {
        self.allow_comments
    }

    pub fn allow_trailing_commas(&self) -> bool {
        self.allow_trailing_commas
    }

    pub fn allow_special_numbers(&self) -> bool {
        self.allow_special_numbers
    }

    pub fn allow_hex_numbers(&self) -> bool {
        self.allow_hex_numbers
    }

    pub fn replace_invalid_encoding_sequences(&self) -> bool {
        self.replace_invalid_encoding_sequences
    }

    pub fn track_object_members(&self) -> bool {
        self.track_object_members
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

/// A builder for [`JsonParserOptions`].
///
/// ```rust
/// use jsonduct::JsonParserOptionsBuilder;
///
/// let options = JsonParserOptionsBuilder::default()
///     .with_allow_comments(true)
///     .with_max_depth(64)
///     .build();
/// assert!(options.allow_comments());
/// ```
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct JsonParserOptionsBuilder {
    options: JsonParserOptions,
}

impl JsonParserOptionsBuilder {
    pub fn with_input_encoding(mut self, input_encoding: InputEncoding) -> Self {
        self.options.input_encoding = input_encoding;
        self
    }

    pub fn with_output_encoding(mut self, output_encoding: Encoding) -> Self {
        self.options.output_encoding = output_encoding;
        self
    }

    pub fn with_max_output_string_length(mut self, max: Option<usize>) -> Self {
        self.options.max_output_string_length = max;
        self
    }

    pub fn with_max_number_length(mut self, max: Option<usize>) -> Self {
        self.options.max_number_length = max;
        self
    }

    pub fn with_allow_bom(mut self, allow: bool) -> Self {
        self.options.allow_bom = allow;
        self
    }

    pub fn with_allow_comments(mut self, allow: bool) -> Self {
        self.options.allow_comments = allow;
        self
    }

    pub fn with_allow_trailing_commas(mut self, allow: bool) -> Self {
        self.options.allow_trailing_commas = allow;
        self
    }

    pub fn with_allow_special_numbers(mut self, allow: bool) -> Self {
        self.options.allow_special_numbers = allow;
        self
    }

    pub fn with_allow_hex_numbers(mut self, allow: bool) -> Self {
        self.options.allow_hex_numbers = allow;
        self
    }

    pub fn with_replace_invalid_encoding_sequences(mut self, replace: bool) -> Self {
        self.options.replace_invalid_encoding_sequences = replace;
        self
    }

    pub fn with_track_object_members(mut self, track: bool) -> Self {
        self.options.track_object_members = track;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.options.max_depth = max_depth;
        self
    }

    pub fn build(self) -> JsonParserOptions {
        self.options
    }
}
