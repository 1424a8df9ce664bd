//! Byte-level JSON string escaping.
//!
//! Escapes control bytes (0x00-0x1F), double quote and backslash. Every other
//! byte, including non-ASCII UTF-8 sequences and invalid UTF-8, is copied
//! through unchanged.

const HEX: &[u8; 16] = b"0123456789abcdef";

fn short_escape(b: u8) -> Option<&'static [u8]> {
    match b {
        b'"' => Some(b"\\\""),
        b'\\' => Some(b"\\\\"),
        0x08 => Some(b"\\b"),
        0x0c => Some(b"\\f"),
        b'\n' => Some(b"\\n"),
        b'\r' => Some(b"\\r"),
        b'\t' => Some(b"\\t"),
        _ => None,
    }
}

/// Appends `bytes` as a quoted JSON string.
pub(crate) fn write_str(out: &mut Vec<u8>, bytes: &[u8]) {
    out.push(b'"');
    let mut last = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if b >= 0x20 && b != b'"' && b != b'\\' {
            continue;
        }
        out.extend_from_slice(&bytes[last..i]);
        match short_escape(b) {
            Some(esc) => out.extend_from_slice(esc),
            None => out.extend_from_slice(&[
                b'\\',
                b'u',
                b'0',
                b'0',
                HEX[usize::from(b >> 4)],
                HEX[usize::from(b & 0xf)],
            ]),
        }
        last = i + 1;
    }
    out.extend_from_slice(&bytes[last..]);
    out.push(b'"');
}

/// Length of `write_str(bytes)` output, quotes included.
pub(crate) fn escaped_len(bytes: &[u8]) -> usize {
    2 + bytes
        .iter()
        .map(|&b| match b {
            _ if short_escape(b).is_some() => 2,
            0x00..=0x1f => 6,
            _ => 1,
        })
        .sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escape(bytes: &[u8]) -> String {
        let mut out = Vec::new();
        write_str(&mut out, bytes);
        assert_eq!(out.len(), escaped_len(bytes));
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn plain_text_is_only_quoted() {
        assert_eq!(escape(b"hello"), "\"hello\"");
        assert_eq!(escape(b""), "\"\"");
    }

    #[test]
    fn quotes_and_backslashes() {
        assert_eq!(escape(b"say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(escape(b"back\\slash"), "\"back\\\\slash\"");
    }

    #[test]
    fn short_control_escapes() {
        assert_eq!(escape(b"a\nb\rc\td"), "\"a\\nb\\rc\\td\"");
        assert_eq!(escape(b"back\x08space"), "\"back\\bspace\"");
        assert_eq!(escape(b"form\x0cfeed"), "\"form\\ffeed\"");
    }

    #[test]
    fn other_controls_use_unicode_escape() {
        assert_eq!(escape(b"null\0byte"), "\"null\\u0000byte\"");
        assert_eq!(escape(b"\x1a\x1f"), "\"\\u001a\\u001f\"");
    }

    #[test]
    fn unicode_passes_through() {
        assert_eq!(escape("hello 日本語".as_bytes()), "\"hello 日本語\"");
        assert_eq!(escape(b"\x7f"), "\"\x7f\"");
    }

    #[test]
    fn invalid_utf8_is_copied() {
        let mut out = Vec::new();
        write_str(&mut out, &[0xff, b'"']);
        assert_eq!(out, b"\"\xff\\\"\"");
    }
}
