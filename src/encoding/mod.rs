//! Transcoding: byte stream <-> Unicode codepoints, in the five encodings
//! spec section 4.1 requires, plus BOM sniffing and heuristic auto-detection.

mod decoder;
mod encoder;

pub use decoder::{DecodeOutcome, Decoder};
pub use encoder::encode_codepoint;

/// A concrete Unicode transfer encoding. Unlike spec section 3's `Encoding`
/// enum, there is no `Unknown` variant here -- `Unknown` only ever made sense
/// as an *input-side request* to auto-detect, which is modeled separately by
/// [`InputEncoding`]. A bare `Encoding` is always a valid thing to decode or
/// encode with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
}

impl Default for Encoding {
    fn default() -> Self {
        Encoding::Utf8
    }
}

/// What encoding the parser should assume for its input: either a fixed
/// encoding, or `Auto`, requesting detection from the leading bytes (spec
/// section 4.1, "Auto-detection").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEncoding {
    Auto,
    Fixed(Encoding),
}

impl Default for InputEncoding {
    fn default() -> Self {
        InputEncoding::Auto
    }
}

/// The outcome of inspecting the leading bytes of a stream to guess its
/// encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectOutcome {
    /// An encoding was determined; `bom_len` is how many of the leading
    /// bytes were a byte-order mark that should be consumed and not handed
    /// to the decoder.
    Detected { encoding: Encoding, bom_len: usize },
    /// Fewer than 4 bytes are available and more might change the answer;
    /// the caller should wait for more input unless this is the final push.
    NeedMoreBytes,
}

/// Inspect up to the first four bytes of a stream and guess its encoding,
/// per the table in spec section 4.1. `is_final` means no more bytes will
/// ever arrive, so whatever prefix we have must be used as-is.
pub fn detect_encoding(prefix: &[u8], is_final: bool) -> DetectOutcome {
    use DetectOutcome::*;
    use Encoding::*;

    if prefix.len() >= 4 {
        match prefix {
            [0x00, 0x00, 0xFE, 0xFF, ..] => return Detected { encoding: Utf32Be, bom_len: 4 },
            [0xFF, 0xFE, 0x00, 0x00, ..] => return Detected { encoding: Utf32Le, bom_len: 4 },
            _ => {}
        }
        if prefix.starts_with(&[0xFE, 0xFF]) {
            return Detected { encoding: Utf16Be, bom_len: 2 };
        }
        if prefix.starts_with(&[0xFF, 0xFE]) {
            return Detected { encoding: Utf16Le, bom_len: 2 };
        }
        if prefix.starts_with(&[0xEF, 0xBB, 0xBF]) {
            return Detected { encoding: Utf8, bom_len: 3 };
        }
        if prefix[0] == 0x00 && prefix[1] == 0x00 && prefix[2] == 0x00 {
            return Detected { encoding: Utf32Be, bom_len: 0 };
        }
        if prefix[1] == 0x00 && prefix[2] == 0x00 && prefix[3] == 0x00 {
            return Detected { encoding: Utf32Le, bom_len: 0 };
        }
        if prefix[0] == 0x00 {
            return Detected { encoding: Utf16Be, bom_len: 0 };
        }
        if prefix[1] == 0x00 {
            return Detected { encoding: Utf16Le, bom_len: 0 };
        }
        return Detected { encoding: Utf8, bom_len: 0 };
    }

    if !is_final {
        return NeedMoreBytes;
    }

    // Apply the same prefix rules to whatever bytes are actually present.
    if prefix.starts_with(&[0xFE, 0xFF]) {
        return Detected { encoding: Utf16Be, bom_len: 2 };
    }
    if prefix.starts_with(&[0xFF, 0xFE]) {
        return Detected { encoding: Utf16Le, bom_len: 2 };
    }
    if prefix.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return Detected { encoding: Utf8, bom_len: 3 };
    }
    if prefix.len() >= 2 && prefix[0] == 0x00 {
        return Detected { encoding: Utf16Be, bom_len: 0 };
    }
    if prefix.len() >= 2 && prefix[1] == 0x00 {
        return Detected { encoding: Utf16Le, bom_len: 0 };
    }
    Detected { encoding: Utf8, bom_len: 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_utf32_be_bom() {
        let r = detect_encoding(&[0x00, 0x00, 0xFE, 0xFF], true);
        assert_eq!(
            r,
            DetectOutcome::Detected {
                encoding: Encoding::Utf32Be,
                bom_len: 4
            }
        );
    }

    #[test]
    fn detects_utf8_bom() {
        let r = detect_encoding(&[0xEF, 0xBB, 0xBF, b'{'], true);
        assert_eq!(
            r,
            DetectOutcome::Detected {
                encoding: Encoding::Utf8,
                bom_len: 3
            }
        );
    }

    #[test]
    fn defaults_to_utf8_without_bom() {
        let r = detect_encoding(b"null", true);
        assert_eq!(
            r,
            DetectOutcome::Detected {
                encoding: Encoding::Utf8,
                bom_len: 0
            }
        );
    }

    #[test]
    fn needs_more_bytes_when_not_final_and_short() {
        let r = detect_encoding(&[0x00], false);
        assert_eq!(r, DetectOutcome::NeedMoreBytes);
    }

    #[test]
    fn utf16_no_bom_heuristic() {
        // `"x"` as UTF-16BE: 00 22 00 78 00 22
        let r = detect_encoding(&[0x00, 0x22, 0x00, 0x78], true);
        assert_eq!(
            r,
            DetectOutcome::Detected {
                encoding: Encoding::Utf16Be,
                bom_len: 0
            }
        );
    }
}
