use super::Encoding;

/// What happened when a byte was fed to a [`Decoder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// More bytes are needed before a codepoint (or an error) can be
    /// determined.
    Pending,
    /// A complete, valid codepoint was decoded.
    Codepoint(u32),
    /// The bytes fed since the last codepoint (or decoder reset) form a
    /// maximal invalid subpart, per Unicode section 3.9. `len` is how many
    /// bytes were part of it, for callers that need to report the start
    /// offset of the offending sequence. `reprocess` is `true` when the
    /// byte (or code unit) that triggered this report was not itself part
    /// of the invalid subpart and must be re-submitted via [`Decoder::replay`]
    /// rather than dropped.
    Invalid { len: usize, reprocess: bool },
}

/// A per-encoding decoder: feed it one byte at a time, get back codepoints
/// (or precise failure reports) as they complete. Holds just enough state to
/// resume at any byte boundary -- mid multi-byte sequence, mid surrogate
/// pair -- which is what lets the parser be chunk-invariant (spec section 8).
pub struct Decoder {
    encoding: Encoding,
    pending: [u8; 4],
    pending_len: usize,
    expected_len: u8,
    first_lo: u8,
    first_hi: u8,
    utf16_high_surrogate: Option<u16>,
    byte_replay: Option<u8>,
    unit_replay: Option<u16>,
}

impl Decoder {
    pub fn new(encoding: Encoding) -> Self {
        Decoder {
            encoding,
            pending: [0; 4],
            pending_len: 0,
            expected_len: 0,
            first_lo: 0x80,
            first_hi: 0xBF,
            utf16_high_surrogate: None,
            byte_replay: None,
            unit_replay: None,
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// `true` if the next byte fed would begin an entirely new output
    /// codepoint, i.e. there is no partially-decoded sequence (including a
    /// dangling UTF-16 high surrogate awaiting its pair, or a queued
    /// [`DecodeOutcome::Invalid`] replay) in flight. Callers use this to
    /// know when to snapshot the location of the next byte as a
    /// token/codepoint start.
    pub fn at_fresh_boundary(&self) -> bool {
        self.pending_len == 0
            && self.utf16_high_surrogate.is_none()
            && self.byte_replay.is_none()
            && self.unit_replay.is_none()
    }

    /// Re-submit the byte or code unit that was held back by the last
    /// `Invalid { reprocess: true, .. }` outcome, without consuming any new
    /// input. Must be called exactly once after each such outcome, before
    /// feeding the next real byte. Returns `Pending` if there was nothing
    /// queued.
    pub fn replay(&mut self) -> DecodeOutcome {
        if let Some(b) = self.byte_replay.take() {
            return self.feed_utf8(b);
        }
        if let Some(unit) = self.unit_replay.take() {
            return self.process_utf16_unit(unit);
        }
        DecodeOutcome::Pending
    }

    /// Feed one more byte of input.
    pub fn feed(&mut self, byte: u8) -> DecodeOutcome {
        match self.encoding {
            Encoding::Utf8 => self.feed_utf8(byte),
            Encoding::Utf16Le => self.feed_utf16(byte, true),
            Encoding::Utf16Be => self.feed_utf16(byte, false),
            Encoding::Utf32Le => self.feed_utf32(byte, true),
            Encoding::Utf32Be => self.feed_utf32(byte, false),
        }
    }

    /// Called when the input stream has ended. Reports a truncated
    /// in-progress sequence as invalid; otherwise reports `Pending` (nothing
    /// outstanding).
    pub fn finish(&mut self) -> DecodeOutcome {
        if self.pending_len > 0 {
            let len = self.pending_len;
            self.pending_len = 0;
            return DecodeOutcome::Invalid { len, reprocess: false };
        }
        if self.utf16_high_surrogate.take().is_some() {
            return DecodeOutcome::Invalid { len: 2, reprocess: false };
        }
        DecodeOutcome::Pending
    }

    fn feed_utf8(&mut self, b: u8) -> DecodeOutcome {
        if self.pending_len == 0 {
            match b {
                0x00..=0x7F => return DecodeOutcome::Codepoint(b as u32),
                0xC2..=0xDF => {
                    self.expected_len = 2;
                    self.first_lo = 0x80;
                    self.first_hi = 0xBF;
                }
                0xE0 => {
                    self.expected_len = 3;
                    self.first_lo = 0xA0;
                    self.first_hi = 0xBF;
                }
                0xE1..=0xEC | 0xEE..=0xEF => {
                    self.expected_len = 3;
                    self.first_lo = 0x80;
                    self.first_hi = 0xBF;
                }
                0xED => {
                    self.expected_len = 3;
                    self.first_lo = 0x80;
                    self.first_hi = 0x9F;
                }
                0xF0 => {
                    self.expected_len = 4;
                    self.first_lo = 0x90;
                    self.first_hi = 0xBF;
                }
                0xF1..=0xF3 => {
                    self.expected_len = 4;
                    self.first_lo = 0x80;
                    self.first_hi = 0xBF;
                }
                0xF4 => {
                    self.expected_len = 4;
                    self.first_lo = 0x80;
                    self.first_hi = 0x8F;
                }
                _ => return DecodeOutcome::Invalid { len: 1, reprocess: false },
            }
            self.pending[0] = b;
            self.pending_len = 1;
            DecodeOutcome::Pending
        } else {
            let is_first_continuation = self.pending_len == 1;
            let (lo, hi) = if is_first_continuation {
                (self.first_lo, self.first_hi)
            } else {
                (0x80, 0xBF)
            };
            if b < lo || b > hi {
                // `b` is not part of the invalid subpart -- per Unicode
                // section 3.9 it must be re-examined as the start of a
                // fresh sequence, not swallowed.
                let len = self.pending_len;
                self.pending_len = 0;
                self.byte_replay = Some(b);
                return DecodeOutcome::Invalid { len, reprocess: true };
            }
            self.pending[self.pending_len] = b;
            self.pending_len += 1;
            if self.pending_len == self.expected_len as usize {
                let cp = self.assemble_utf8();
                self.pending_len = 0;
                DecodeOutcome::Codepoint(cp)
            } else {
                DecodeOutcome::Pending
            }
        }
    }

    fn assemble_utf8(&self) -> u32 {
        let p = &self.pending;
        match self.expected_len {
            2 => (u32::from(p[0] & 0x1F) << 6) | u32::from(p[1] & 0x3F),
            3 => {
                (u32::from(p[0] & 0x0F) << 12)
                    | (u32::from(p[1] & 0x3F) << 6)
                    | u32::from(p[2] & 0x3F)
            }
            4 => {
                (u32::from(p[0] & 0x07) << 18)
                    | (u32::from(p[1] & 0x3F) << 12)
                    | (u32::from(p[2] & 0x3F) << 6)
                    | u32::from(p[3] & 0x3F)
            }
            _ => unreachable!("expected_len is only ever 2, 3, or 4"),
        }
    }

    fn feed_utf16(&mut self, b: u8, little_endian: bool) -> DecodeOutcome {
        self.pending[self.pending_len] = b;
        self.pending_len += 1;
        if self.pending_len < 2 {
            return DecodeOutcome::Pending;
        }
        let unit = if little_endian {
            u16::from_le_bytes([self.pending[0], self.pending[1]])
        } else {
            u16::from_be_bytes([self.pending[0], self.pending[1]])
        };
        self.pending_len = 0;
        self.process_utf16_unit(unit)
    }

    fn process_utf16_unit(&mut self, unit: u16) -> DecodeOutcome {
        match (self.utf16_high_surrogate, unit) {
            (None, 0xD800..=0xDBFF) => {
                self.utf16_high_surrogate = Some(unit);
                DecodeOutcome::Pending
            }
            (None, 0xDC00..=0xDFFF) => DecodeOutcome::Invalid { len: 2, reprocess: false },
            (None, _) => DecodeOutcome::Codepoint(u32::from(unit)),
            (Some(high), 0xDC00..=0xDFFF) => {
                self.utf16_high_surrogate = None;
                let cp = 0x1_0000
                    + (u32::from(high) - 0xD800) * 0x400
                    + (u32::from(unit) - 0xDC00);
                DecodeOutcome::Codepoint(cp)
            }
            (Some(_), _) => {
                // The lone high surrogate is the invalid subpart; `unit`
                // was already fully assembled and is not itself invalid,
                // so it must be replayed rather than dropped.
                self.utf16_high_surrogate = None;
                self.unit_replay = Some(unit);
                DecodeOutcome::Invalid { len: 2, reprocess: true }
            }
        }
    }

    fn feed_utf32(&mut self, b: u8, little_endian: bool) -> DecodeOutcome {
        self.pending[self.pending_len] = b;
        self.pending_len += 1;
        if self.pending_len < 4 {
            return DecodeOutcome::Pending;
        }
        let value = if little_endian {
            u32::from_le_bytes(self.pending)
        } else {
            u32::from_be_bytes(self.pending)
        };
        self.pending_len = 0;

        if value > 0x10_FFFF || (0xD800..=0xDFFF).contains(&value) {
            return DecodeOutcome::Invalid { len: 4, reprocess: false };
        }
        DecodeOutcome::Codepoint(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(encoding: Encoding, bytes: &[u8]) -> Vec<DecodeOutcome> {
        let mut d = Decoder::new(encoding);
        let mut out = vec![];
        for &b in bytes {
            let mut o = d.feed(b);
            loop {
                let reprocess = matches!(o, DecodeOutcome::Invalid { reprocess: true, .. });
                if o != DecodeOutcome::Pending {
                    out.push(o);
                }
                if !reprocess {
                    break;
                }
                o = d.replay();
            }
        }
        let f = d.finish();
        if f != DecodeOutcome::Pending {
            out.push(f);
        }
        out
    }

    #[test]
    fn ascii_roundtrip() {
        let out = decode_all(Encoding::Utf8, b"abc");
        assert_eq!(
            out,
            vec![
                DecodeOutcome::Codepoint('a' as u32),
                DecodeOutcome::Codepoint('b' as u32),
                DecodeOutcome::Codepoint('c' as u32),
            ]
        );
    }

    #[test]
    fn utf8_overlong_rejected() {
        // 0xC0 0x80 would be an overlong encoding of NUL. Neither byte is a
        // valid lead byte on its own, so both are standalone invalid
        // subparts with nothing to reprocess.
        let out = decode_all(Encoding::Utf8, &[0xC0, 0x80]);
        assert_eq!(
            out,
            vec![
                DecodeOutcome::Invalid { len: 1, reprocess: false },
                DecodeOutcome::Invalid { len: 1, reprocess: false },
            ]
        );
    }

    #[test]
    fn utf8_truncated_at_eof() {
        let out = decode_all(Encoding::Utf8, &[0xE2, 0x82]);
        assert_eq!(out, vec![DecodeOutcome::Invalid { len: 2, reprocess: false }]);
    }

    #[test]
    fn utf8_truncated_sequence_reprocesses_terminating_byte() {
        // A 2-byte lead (0xC2) followed by a byte that cannot continue it:
        // the lead byte alone is the invalid subpart, and the closing quote
        // must still be seen by whatever comes next.
        let out = decode_all(Encoding::Utf8, &[0xC2, b'"']);
        assert_eq!(
            out,
            vec![
                DecodeOutcome::Invalid { len: 1, reprocess: true },
                DecodeOutcome::Codepoint(b'"' as u32),
            ]
        );
    }

    #[test]
    fn utf8_surrogate_rejected() {
        // U+D800 encoded via ED A0 80, which must be rejected.
        let out = decode_all(Encoding::Utf8, &[0xED, 0xA0, 0x80]);
        assert!(out.iter().any(|o| matches!(o, DecodeOutcome::Invalid { .. })));
    }

    #[test]
    fn utf16_surrogate_pair() {
        // U+1F600 = D83D DE00
        let out = decode_all(Encoding::Utf16Be, &[0xD8, 0x3D, 0xDE, 0x00]);
        assert_eq!(out, vec![DecodeOutcome::Codepoint(0x1F600)]);
    }

    #[test]
    fn utf16_unpaired_high_surrogate() {
        // D800 is a lone high surrogate; the following unit (0x0041, 'A')
        // was not part of the invalid subpart and must still be decoded.
        let out = decode_all(Encoding::Utf16Be, &[0xD8, 0x00, 0x00, 0x41]);
        assert_eq!(
            out,
            vec![
                DecodeOutcome::Invalid { len: 2, reprocess: true },
                DecodeOutcome::Codepoint('A' as u32),
            ]
        );
    }

    #[test]
    fn utf32_rejects_surrogate() {
        let out = decode_all(Encoding::Utf32Be, &[0x00, 0x00, 0xD8, 0x00]);
        assert_eq!(out, vec![DecodeOutcome::Invalid { len: 4, reprocess: false }]);
    }
}
