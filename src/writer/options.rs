use crate::encoding::Encoding;

/// Options for [`JsonWriter`](crate::writer::JsonWriter). Use
/// [`WriterOptionsBuilder`] to create instances, mirroring
/// [`JsonParserOptionsBuilder`](crate::options::JsonParserOptionsBuilder) on
/// the parser side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriterOptions {
    pub(crate) output_encoding: Encoding,
    pub(crate) use_crlf: bool,
    pub(crate) replace_invalid_encoding_sequences: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            output_encoding: Encoding::Utf8,
            use_crlf: false,
            replace_invalid_encoding_sequences: false,
        }
    }
}

impl WriterOptions {
    pub fn output_encoding(&self) -> Encoding {
        self.output_encoding
    }

    pub fn use_crlf(&self) -> bool {
        self.use_crlf
    }

    pub fn replace_invalid_encoding_sequences(&self) -> bool {
        self.replace_invalid_encoding_sequences
    }
}

/// A builder for [`WriterOptions`].
///
/// ```rust
/// use jsonduct::writer::WriterOptionsBuilder;
///
/// let options = WriterOptionsBuilder::default().with_use_crlf(true).build();
/// assert!(options.use_crlf());
/// ```
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriterOptionsBuilder {
    options: WriterOptions,
}

impl WriterOptionsBuilder {
    pub fn with_output_encoding(mut self, output_encoding: Encoding) -> Self {
        self.options.output_encoding = output_encoding;
        self
    }

    pub fn with_use_crlf(mut self, use_crlf: bool) -> Self {
        self.options.use_crlf = use_crlf;
        self
    }

    pub fn with_replace_invalid_encoding_sequences(mut self, replace: bool) -> Self {
        self.options.replace_invalid_encoding_sequences = replace;
        self
    }

    pub fn build(self) -> WriterOptions {
        self.options
    }
}
