//! Encoding detection and resource classification helpers.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

use encoding_rs::Encoding;

/// How many leading bytes are searched for a `charset=` declaration.
const CHARSET_SNIFF_LEN: usize = 1024;

// ============================================================================
// Encoding Detection
// ============================================================================

/// Detect the encoding of an HTML document.
///
/// Checks, in order:
/// 1. A byte order mark
/// 2. A `charset=` declaration near the start (`<meta charset>` or `http-equiv`)
/// 3. The encoding named by an XML declaration
///
/// Falls back to UTF-8 when none of these yield a known encoding.
pub fn detect_html_encoding(bytes: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding;
    }

    let declared = extract_meta_charset(bytes)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| {
            extract_xml_encoding(bytes).and_then(|label| Encoding::for_label(label.as_bytes()))
        });

    match declared {
        // A UTF-16 label inside markup we could read as ASCII is a lie
        Some(encoding) if encoding == encoding_rs::UTF_16LE || encoding == encoding_rs::UTF_16BE => {
            encoding_rs::UTF_8
        }
        Some(encoding) => encoding,
        None => encoding_rs::UTF_8,
    }
}

/// Decode an HTML document to a string using [`detect_html_encoding`].
///
/// A leading byte order mark is consumed. Uses `Cow<str>` to avoid
/// allocation when the input is already valid UTF-8.
pub fn decode_html(bytes: &[u8]) -> Cow<'_, str> {
    let encoding = detect_html_encoding(bytes);
    let (result, used, malformed) = encoding.decode(bytes);
    if malformed {
        tracing::debug!(encoding = used.name(), "Replaced malformed byte sequences while decoding");
    }
    result
}

/// Decode bytes that carry no markup, such as plain text files.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the hint encoding
/// 3. Falls back to Windows-1252
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    // Windows-1252 is a superset of ISO-8859-1
    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Extract the value of the first `charset=` declaration.
///
/// Only the first [`CHARSET_SNIFF_LEN`] bytes are checked. The value may be
/// quoted and ends at a quote, whitespace, `;`, `/` or `>`.
pub fn extract_meta_charset(bytes: &[u8]) -> Option<&str> {
    let prefix = &bytes[..bytes.len().min(CHARSET_SNIFF_LEN)];

    let pos = prefix
        .windows(8)
        .position(|w| w.eq_ignore_ascii_case(b"charset="))?;
    let mut rest = &prefix[pos + 8..];

    while let Some((&b, tail)) = rest.split_first() {
        if b.is_ascii_whitespace() || b == b'"' || b == b'\'' {
            rest = tail;
        } else {
            break;
        }
    }

    let end = rest
        .iter()
        .position(|&b| b.is_ascii_whitespace() || matches!(b, b'"' | b'\'' | b';' | b'/' | b'>'))
        .unwrap_or(rest.len());

    if end == 0 {
        return None;
    }

    std::str::from_utf8(&rest[..end]).ok()
}

/// Extract encoding from XML declaration.
///
/// Parses `<?xml ... encoding="..." ?>` to extract the encoding name.
///
/// # Arguments
///
/// * `bytes` - The raw bytes (only the first ~100 bytes are checked)
///
/// # Returns
///
/// The encoding name if found, or `None`.
pub fn extract_xml_encoding(bytes: &[u8]) -> Option<&str> {
    let check_len = bytes.len().min(100);
    let prefix = &bytes[..check_len];

    let xml_start = prefix.windows(5).position(|w| w == b"<?xml")?;
    let after_xml = &prefix[xml_start..];

    let enc_pos = after_xml
        .windows(9)
        .position(|w| w.eq_ignore_ascii_case(b"encoding="))?;
    let after_enc = &after_xml[enc_pos + 9..];

    if after_enc.is_empty() {
        return None;
    }

    let quote = after_enc[0];
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let value_start = 1;
    let value_end = after_enc[value_start..].iter().position(|&b| b == quote)? + value_start;

    std::str::from_utf8(&after_enc[value_start..value_end]).ok()
}

// ============================================================================
// Path Resolution
// ============================================================================

/// Resolve a relative reference against a base directory.
///
/// For example, if base is "/books/src" and relative is "../img/cover.jpg",
/// the result is "/books/img/cover.jpg". Absolute references are returned
/// unchanged.
pub fn resolve_relative_path(base_dir: &Path, relative: &str) -> PathBuf {
    let relative_path = Path::new(relative);
    if relative_path.is_absolute() {
        return relative_path.to_path_buf();
    }

    let joined = base_dir.join(relative_path);

    let mut result = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::Normal(name) => result.push(name),
            Component::CurDir => {}
            Component::RootDir => result.push(Component::RootDir.as_os_str()),
            Component::Prefix(prefix) => result.push(prefix.as_os_str()),
        }
    }

    result
}

// ============================================================================
// Resource Format Detection
// ============================================================================

/// Detected resource format.
///
/// Covers the media found next to HTML documents being imported into a
/// book. Detection is done via file extension or magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    /// JPEG image
    Jpeg,
    /// PNG image
    Png,
    /// GIF image
    Gif,
    /// SVG image (vector)
    Svg,
    /// WebP image
    WebP,
    /// TrueType font
    Ttf,
    /// OpenType font
    Otf,
    /// CSS stylesheet
    Css,
    /// Adobe page template stylesheet
    Xpgt,
    /// HTML or XHTML document
    Html,
    /// Unknown/binary format
    Binary,
}

impl MediaFormat {
    /// Get the MIME type string for this format.
    pub fn mime_type(self) -> &'static str {
        match self {
            MediaFormat::Jpeg => "image/jpeg",
            MediaFormat::Png => "image/png",
            MediaFormat::Gif => "image/gif",
            MediaFormat::Svg => "image/svg+xml",
            MediaFormat::WebP => "image/webp",
            MediaFormat::Ttf => "font/ttf",
            MediaFormat::Otf => "font/otf",
            MediaFormat::Css => "text/css",
            MediaFormat::Xpgt => "application/vnd.adobe-page-template+xml",
            MediaFormat::Html => "application/xhtml+xml",
            MediaFormat::Binary => "application/octet-stream",
        }
    }

    /// Check if this format represents an image.
    pub fn is_image(self) -> bool {
        matches!(
            self,
            MediaFormat::Jpeg
                | MediaFormat::Png
                | MediaFormat::Gif
                | MediaFormat::Svg
                | MediaFormat::WebP
        )
    }

    /// Check if this format represents a font.
    pub fn is_font(self) -> bool {
        matches!(self, MediaFormat::Ttf | MediaFormat::Otf)
    }

    /// Check if this format is a stylesheet that gets inlined on import.
    pub fn is_stylesheet(self) -> bool {
        matches!(self, MediaFormat::Css | MediaFormat::Xpgt)
    }

    /// The content folder subdirectory resources of this format live in.
    pub fn folder(self) -> &'static str {
        match self {
            f if f.is_image() => "Images",
            f if f.is_font() => "Fonts",
            f if f.is_stylesheet() => "Styles",
            MediaFormat::Html => "Text",
            _ => "Misc",
        }
    }
}

/// Detect resource format from file path and/or raw bytes.
///
/// Tries extension-based detection first, then falls back to magic bytes.
/// Returns `Binary` if unknown.
pub fn detect_media_format(path: &str, data: &[u8]) -> MediaFormat {
    let path_lower = path.to_lowercase();

    if path_lower.ends_with(".jpg") || path_lower.ends_with(".jpeg") {
        return MediaFormat::Jpeg;
    }
    if path_lower.ends_with(".png") {
        return MediaFormat::Png;
    }
    if path_lower.ends_with(".gif") {
        return MediaFormat::Gif;
    }
    if path_lower.ends_with(".svg") {
        return MediaFormat::Svg;
    }
    if path_lower.ends_with(".webp") {
        return MediaFormat::WebP;
    }
    if path_lower.ends_with(".ttf") {
        return MediaFormat::Ttf;
    }
    if path_lower.ends_with(".otf") {
        return MediaFormat::Otf;
    }
    if path_lower.ends_with(".css") {
        return MediaFormat::Css;
    }
    if path_lower.ends_with(".xpgt") {
        return MediaFormat::Xpgt;
    }
    if path_lower.ends_with(".html")
        || path_lower.ends_with(".htm")
        || path_lower.ends_with(".xhtml")
    {
        return MediaFormat::Html;
    }

    if data.len() >= 4 {
        // JPEG: FF D8 FF
        if data[0] == 0xFF && data[1] == 0xD8 {
            return MediaFormat::Jpeg;
        }
        // PNG: 89 50 4E 47 (.PNG)
        if data[0] == 0x89 && data[1] == 0x50 && data[2] == 0x4E && data[3] == 0x47 {
            return MediaFormat::Png;
        }
        // GIF: 47 49 46 (GIF)
        if data[0] == 0x47 && data[1] == 0x49 && data[2] == 0x46 {
            return MediaFormat::Gif;
        }
        // WebP: 52 49 46 46 ... 57 45 42 50 (RIFF...WEBP)
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return MediaFormat::WebP;
        }
        // TrueType: 00 01 00 00, OpenType: OTTO
        if data[0..4] == [0x00, 0x01, 0x00, 0x00] {
            return MediaFormat::Ttf;
        }
        if &data[0..4] == b"OTTO" {
            return MediaFormat::Otf;
        }
    }

    MediaFormat::Binary
}

// ============================================================================
// Tests
// ============================================================================
