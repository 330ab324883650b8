use crate::TextCodec;

/// U+FFFD, substituted for sequences that cannot be decoded.
pub const REPLACEMENT_CHARACTER: char = '\u{FFFD}';

/// Minimal UTF-8 codec with no dependency on the host environment.
///
/// Decoding reads the continuation count from the leading byte and trusts the
/// bytes that follow: overlong forms and malformed continuation bytes are not
/// rejected. A sequence cut short by the end of the buffer becomes a single
/// [`REPLACEMENT_CHARACTER`] and ends the string.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackCodec;

impl FallbackCodec {
    /// Appends the UTF-8 encoding of `text` to `out`.
    pub fn encode_into(&self, text: &str, out: &mut Vec<u8>) {
        out.reserve(text.len());
        for ch in text.chars() {
            let code_point = u32::from(ch);
            let (mut shift, lead) = match code_point {
                0..=0x7F => (0, 0x00),
                0x80..=0x7FF => (6, 0xC0),
                0x800..=0xFFFF => (12, 0xE0),
                _ => (18, 0xF0),
            };
            out.push((lead | (code_point >> shift)) as u8);
            while shift > 0 {
                shift -= 6;
                out.push((0x80 | ((code_point >> shift) & 0x3F)) as u8);
            }
        }
    }

    /// Appends the decoded form of `bytes` to `out`.
    pub fn decode_into(&self, bytes: &[u8], out: &mut String) {
        let mut index = 0;
        while index < bytes.len() {
            let lead = bytes[index];
            let (continuation, mut code_point) = match lead {
                0x00..=0x7F => (0, u32::from(lead)),
                0x80..=0xDF => (1, u32::from(lead & 0x1F)),
                0xE0..=0xEF => (2, u32::from(lead & 0x0F)),
                0xF0..=0xF4 => (3, u32::from(lead & 0x07)),
                _ => {
                    out.push(REPLACEMENT_CHARACTER);
                    index += 1;
                    continue;
                }
            };

            let remaining = bytes.len() - index - 1;
            if remaining < continuation {
                out.push(REPLACEMENT_CHARACTER);
                return;
            }

            for byte in &bytes[index + 1..=index + continuation] {
                code_point = (code_point << 6) | u32::from(byte & 0x3F);
            }
            out.push(char::from_u32(code_point).unwrap_or(REPLACEMENT_CHARACTER));
            index += continuation + 1;
        }
    }
}

impl TextCodec for FallbackCodec {
    fn name(&self) -> &'static str {
        "fallback-utf8"
    }

    fn encode(&self, text: &str) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(text, &mut out);
        out
    }

    fn decode(&self, bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len());
        self.decode_into(bytes, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn encodes_each_length_class() {
        let codec = FallbackCodec;
        assert_eq!(codec.encode("A"), vec![0x41]);
        assert_eq!(codec.encode("\u{e9}"), vec![0xC3, 0xA9]);
        assert_eq!(codec.encode("\u{20ac}"), vec![0xE2, 0x82, 0xAC]);
        assert_eq!(codec.encode("\u{1F3B5}"), vec![0xF0, 0x9F, 0x8E, 0xB5]);
    }

    #[test]
    fn truncated_tail_becomes_replacement() {
        let codec = FallbackCodec;
        let mut bytes = codec.encode("gain \u{1F3B5}");
        bytes.pop();
        assert_eq!(codec.decode(&bytes), "gain \u{FFFD}");
    }

    #[test]
    fn lone_lead_byte_at_end_is_replaced() {
        assert_eq!(FallbackCodec.decode(&[0x61, 0xE2]), "a\u{FFFD}");
    }

    #[test]
    fn out_of_table_lead_byte_is_replaced() {
        assert_eq!(FallbackCodec.decode(&[0x61, 0xFF, 0x62]), "a\u{FFFD}b");
    }

    #[test]
    fn encoded_surrogate_decodes_to_replacement() {
        // ED A0 80 would be U+D800, which has no `char`.
        assert_eq!(FallbackCodec.decode(&[0xED, 0xA0, 0x80]), "\u{FFFD}");
    }

    #[test]
    fn empty_input() {
        assert_eq!(FallbackCodec.decode(&[]), "");
        assert!(FallbackCodec.encode("").is_empty());
    }
}
