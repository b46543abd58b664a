//! Content classification from a byte sample.
//!
//! HTML detection follows the WHATWG MIME sniffing signatures: skip leading
//! whitespace, then look for one of a fixed set of tags, case-insensitively,
//! terminated by a space or `>`.

/// How many leading bytes are inspected.
pub const SNIFF_LEN: usize = 512;

/// What the live-reload adapter does with a file is decided by this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Markup: gets the reload script appended.
    Html,
    /// Every sampled byte is ASCII: wrapped in an HTML shell.
    Text,
    /// Anything else: served byte for byte.
    Binary,
}

const HTML_SIGNATURES: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

/// Classify a sample (normally the first [`SNIFF_LEN`] bytes of a file).
///
/// An empty sample is `Text`.
pub fn classify(sample: &[u8]) -> ContentKind {
    let sample = &sample[..sample.len().min(SNIFF_LEN)];
    if is_html(sample) {
        ContentKind::Html
    } else if sample.is_ascii() {
        ContentKind::Text
    } else {
        ContentKind::Binary
    }
}

fn is_html(sample: &[u8]) -> bool {
    let start = sample
        .iter()
        .position(|b| !is_whitespace(*b))
        .unwrap_or(sample.len());
    let data = &sample[start..];

    HTML_SIGNATURES.iter().any(|sig| {
        data.len() > sig.len()
            && data[..sig.len()].eq_ignore_ascii_case(sig)
            && matches!(data[sig.len()], b' ' | b'>')
    })
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\x0c' | b'\r' | b' ')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_document_is_html() {
        assert_eq!(classify(b"<html><body>hi</body></html>"), ContentKind::Html);
        assert_eq!(classify(b"<!doctype html>\n<html>"), ContentKind::Html);
    }

    #[test]
    fn test_leading_whitespace_and_case() {
        assert_eq!(classify(b"\n\t  <HtMl lang=\"en\">"), ContentKind::Html);
    }

    #[test]
    fn test_fragment_is_html() {
        assert_eq!(classify(b"<div>fragment</div>"), ContentKind::Html);
        assert_eq!(classify(b"<p>para"), ContentKind::Html);
        assert_eq!(classify(b"<!-- comment -->"), ContentKind::Html);
    }

    #[test]
    fn test_tag_needs_terminator() {
        // "<abbr>" starts with "<a" but is not followed by space or '>'.
        assert_eq!(classify(b"<abbr>x</abbr>"), ContentKind::Text);
        assert_eq!(classify(b"<html"), ContentKind::Text);
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(classify(b"hello"), ContentKind::Text);
        assert_eq!(classify(b""), ContentKind::Text);
        assert_eq!(classify(b"fn main() {}\n"), ContentKind::Text);
    }

    #[test]
    fn test_binary() {
        assert_eq!(classify(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a]), ContentKind::Binary);
        assert_eq!(classify("héllo".as_bytes()), ContentKind::Binary);
    }

    #[test]
    fn test_only_sample_window_is_inspected() {
        let mut data = vec![b'a'; SNIFF_LEN];
        data.push(0xff);
        assert_eq!(classify(&data), ContentKind::Text);
    }
}
