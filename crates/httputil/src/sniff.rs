//! Content type sniffing.
//!
//! Implements the signature tables of the WHATWG MIME sniffing algorithm
//! (<https://mimesniff.spec.whatwg.org/>) over at most the first 512 bytes of
//! a body. Used to fill in `Content-Type` for responses that did not set one.

/// Number of leading bytes inspected.
pub const SNIFF_LEN: usize = 512;

const TEXT_HTML: &str = "text/html; charset=utf-8";
const TEXT_XML: &str = "text/xml; charset=utf-8";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const OCTET_STREAM: &str = "application/octet-stream";

enum Signature {
    /// An html tag, matched case-insensitively after leading whitespace and
    /// followed by a space or `>`.
    Html(&'static [u8]),
    /// `data & mask == pattern`, optionally after leading whitespace.
    Masked { mask: &'static [u8], pattern: &'static [u8], skip_ws: bool, content_type: &'static str },
    /// A literal prefix.
    Exact(&'static [u8], &'static str),
    Mp4,
    /// No binary data bytes after leading whitespace.
    Text,
}

static SIGNATURES: &[Signature] = &[
    Signature::Html(b"<!DOCTYPE HTML"),
    Signature::Html(b"<HTML"),
    Signature::Html(b"<HEAD"),
    Signature::Html(b"<SCRIPT"),
    Signature::Html(b"<IFRAME"),
    Signature::Html(b"<H1"),
    Signature::Html(b"<DIV"),
    Signature::Html(b"<FONT"),
    Signature::Html(b"<TABLE"),
    Signature::Html(b"<A"),
    Signature::Html(b"<STYLE"),
    Signature::Html(b"<TITLE"),
    Signature::Html(b"<B"),
    Signature::Html(b"<BODY"),
    Signature::Html(b"<BR"),
    Signature::Html(b"<P"),
    Signature::Html(b"<!--"),
    Signature::Masked { mask: b"\xFF\xFF\xFF\xFF\xFF", pattern: b"<?xml", skip_ws: true, content_type: TEXT_XML },
    Signature::Exact(b"%PDF-", "application/pdf"),
    Signature::Exact(b"%!PS-Adobe-", "application/postscript"),
    // byte order marks
    Signature::Masked {
        mask: b"\xFF\xFF\x00\x00",
        pattern: b"\xFE\xFF\x00\x00",
        skip_ws: false,
        content_type: "text/plain; charset=utf-16be",
    },
    Signature::Masked {
        mask: b"\xFF\xFF\x00\x00",
        pattern: b"\xFF\xFE\x00\x00",
        skip_ws: false,
        content_type: "text/plain; charset=utf-16le",
    },
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\x00",
        pattern: b"\xEF\xBB\xBF\x00",
        skip_ws: false,
        content_type: TEXT_PLAIN,
    },
    // images
    Signature::Exact(b"\x00\x00\x01\x00", "image/x-icon"),
    Signature::Exact(b"\x00\x00\x02\x00", "image/x-icon"),
    Signature::Exact(b"BM", "image/bmp"),
    Signature::Exact(b"GIF87a", "image/gif"),
    Signature::Exact(b"GIF89a", "image/gif"),
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF\xFF\xFF",
        pattern: b"RIFF\x00\x00\x00\x00WEBPVP",
        skip_ws: false,
        content_type: "image/webp",
    },
    Signature::Exact(b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
    Signature::Exact(b"\xFF\xD8\xFF", "image/jpeg"),
    // audio and video
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        pattern: b"FORM\x00\x00\x00\x00AIFF",
        skip_ws: false,
        content_type: "audio/aiff",
    },
    Signature::Masked { mask: b"\xFF\xFF\xFF", pattern: b"ID3", skip_ws: false, content_type: "audio/mpeg" },
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\xFF",
        pattern: b"OggS\x00",
        skip_ws: false,
        content_type: "application/ogg",
    },
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\xFF\xFF\xFF\xFF",
        pattern: b"MThd\x00\x00\x00\x06",
        skip_ws: false,
        content_type: "audio/midi",
    },
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        pattern: b"RIFF\x00\x00\x00\x00AVI ",
        skip_ws: false,
        content_type: "video/avi",
    },
    Signature::Masked {
        mask: b"\xFF\xFF\xFF\xFF\x00\x00\x00\x00\xFF\xFF\xFF\xFF",
        pattern: b"RIFF\x00\x00\x00\x00WAVE",
        skip_ws: false,
        content_type: "audio/wave",
    },
    Signature::Mp4,
    Signature::Exact(b"\x1A\x45\xDF\xA3", "video/webm"),
    // fonts
    Signature::Exact(b"\x00\x01\x00\x00", "font/ttf"),
    Signature::Exact(b"OTTO", "font/otf"),
    Signature::Exact(b"ttcf", "font/collection"),
    Signature::Exact(b"wOFF", "font/woff"),
    Signature::Exact(b"wOF2", "font/woff2"),
    // archives
    Signature::Exact(b"\x1F\x8B\x08", "application/x-gzip"),
    Signature::Exact(b"PK\x03\x04", "application/zip"),
    Signature::Exact(b"Rar!\x1A\x07\x00", "application/x-rar-compressed"),
    Signature::Exact(b"Rar!\x1A\x07\x01\x00", "application/x-rar-compressed"),
    Signature::Exact(b"\x00\x61\x73\x6D", "application/wasm"),
    Signature::Text,
];

/// Determines the content type of `data`.
///
/// Always returns a valid MIME type, falling back to
/// `application/octet-stream` when nothing matches.
pub fn detect_content_type(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN)];
    let first_non_ws = data.iter().position(|b| !is_ws(*b)).unwrap_or(data.len());

    SIGNATURES
        .iter()
        .find_map(|signature| signature.matches(data, first_non_ws))
        .unwrap_or(OCTET_STREAM)
}

impl Signature {
    fn matches(&self, data: &[u8], first_non_ws: usize) -> Option<&'static str> {
        match self {
            Signature::Html(tag) => {
                let data = &data[first_non_ws..];
                if data.len() < tag.len() + 1 {
                    return None;
                }
                let prefix_matches = tag.iter().zip(data).all(|(expected, actual)| {
                    if expected.is_ascii_uppercase() { actual & 0xDF == *expected } else { actual == expected }
                });
                (prefix_matches && is_tag_terminating(data[tag.len()])).then_some(TEXT_HTML)
            }
            Signature::Masked { mask, pattern, skip_ws, content_type } => {
                let data = if *skip_ws { &data[first_non_ws..] } else { data };
                if data.len() < pattern.len() {
                    return None;
                }
                let matches = data.iter().zip(mask.iter()).zip(pattern.iter()).all(|((d, m), p)| d & m == *p);
                matches.then_some(*content_type)
            }
            Signature::Exact(signature, content_type) => data.starts_with(signature).then_some(*content_type),
            Signature::Mp4 => is_mp4(data).then_some("video/mp4"),
            Signature::Text => data[first_non_ws..].iter().all(|b| !is_binary(*b)).then_some(TEXT_PLAIN),
        }
    }
}

fn is_mp4(data: &[u8]) -> bool {
    if data.len() < 12 {
        return false;
    }
    let box_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if data.len() < box_size || box_size % 4 != 0 || &data[4..8] != b"ftyp" {
        return false;
    }
    // the box lists brands in 4 byte steps, offset 12 holds the minor version
    (8..box_size).step_by(4).filter(|offset| *offset != 12).any(|offset| data[offset..].starts_with(b"mp4"))
}

#[inline]
fn is_ws(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

#[inline]
fn is_tag_terminating(b: u8) -> bool {
    b == b' ' || b == b'>'
}

/// Bytes that never occur in plain text.
#[inline]
fn is_binary(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

#[cfg(test)]
mod tests {
    use super::detect_content_type;

    #[test]
    fn test_empty_is_text() {
        assert_eq!(detect_content_type(b""), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(detect_content_type(b"hello"), "text/plain; charset=utf-8");
        assert_eq!(detect_content_type(br#"{"error":"not found"}"#), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_html_tags() {
        assert_eq!(detect_content_type(b"<!DOCTYPE html><html></html>"), "text/html; charset=utf-8");
        assert_eq!(detect_content_type(b"\n\t <HtMl><body>hi"), "text/html; charset=utf-8");
        assert_eq!(detect_content_type(b"<p class=\"x\">"), "text/html; charset=utf-8");
        assert_eq!(detect_content_type(b"<!-- comment -->"), "text/html; charset=utf-8");
        // tag must be terminated
        assert_eq!(detect_content_type(b"<pre>x</pre>"), "text/plain; charset=utf-8");
        assert_eq!(detect_content_type(b"<html"), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_xml() {
        assert_eq!(detect_content_type(b"  <?xml version=\"1.0\"?><a/>"), "text/xml; charset=utf-8");
    }

    #[test]
    fn test_binary_formats() {
        assert_eq!(detect_content_type(b"%PDF-1.7\n"), "application/pdf");
        assert_eq!(detect_content_type(b"\x89PNG\x0D\x0A\x1A\x0A\x00\x00\x00\x0DIHDR"), "image/png");
        assert_eq!(detect_content_type(b"\xFF\xD8\xFF\xE0\x00\x10JFIF"), "image/jpeg");
        assert_eq!(detect_content_type(b"GIF89a\x01\x00"), "image/gif");
        assert_eq!(detect_content_type(b"RIFF\x24\x00\x00\x00WEBPVP8 "), "image/webp");
        assert_eq!(detect_content_type(b"RIFF\x24\x00\x00\x00WAVEfmt "), "audio/wave");
        assert_eq!(detect_content_type(b"\x1F\x8B\x08\x00\x00\x00\x00\x00"), "application/x-gzip");
        assert_eq!(detect_content_type(b"\x00asm\x01\x00\x00\x00"), "application/wasm");
        assert_eq!(detect_content_type(b"wOF2\x00\x01"), "font/woff2");
    }

    #[test]
    fn test_mp4() {
        let mut data = Vec::new();
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x18]);
        data.extend_from_slice(b"ftypisom");
        data.extend_from_slice(&[0x00, 0x00, 0x02, 0x00]);
        data.extend_from_slice(b"isommp41");
        assert_eq!(detect_content_type(&data), "video/mp4");
    }

    #[test]
    fn test_byte_order_marks() {
        assert_eq!(detect_content_type(b"\xEF\xBB\xBFhello"), "text/plain; charset=utf-8");
        assert_eq!(detect_content_type(b"\xFE\xFF\x00h"), "text/plain; charset=utf-16be");
        assert_eq!(detect_content_type(b"\xFF\xFEh\x00"), "text/plain; charset=utf-16le");
    }

    #[test]
    fn test_unknown_binary() {
        assert_eq!(detect_content_type(b"\x01\x02\x03\x04"), "application/octet-stream");
    }

    #[test]
    fn test_only_prefix_is_inspected() {
        let mut data = vec![b'a'; super::SNIFF_LEN];
        data.push(0x00);
        assert_eq!(detect_content_type(&data), "text/plain; charset=utf-8");
    }
}
