//! Character encoding detection for legacy archive member names

use chardetng::EncodingDetector;
use encoding_rs::Encoding;

/// Hint for encoding detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingHint {
    /// Prefer Japanese encodings (Shift_JIS)
    Japanese,
    /// Prefer Chinese Simplified (GBK/GB18030)
    ChineseSimplified,
    /// Prefer Chinese Traditional (Big5)
    ChineseTraditional,
    /// Prefer Korean (EUC-KR)
    Korean,
    /// No preference
    None,
}

impl EncodingHint {
    /// TLD hint for chardetng and the encoding to use when detection only
    /// finds windows-1252
    fn preference(self) -> Option<(&'static [u8], &'static Encoding)> {
        match self {
            EncodingHint::Japanese => Some((&b"jp"[..], encoding_rs::SHIFT_JIS)),
            EncodingHint::ChineseSimplified => Some((&b"cn"[..], encoding_rs::GBK)),
            EncodingHint::ChineseTraditional => Some((&b"tw"[..], encoding_rs::BIG5)),
            EncodingHint::Korean => Some((&b"kr"[..], encoding_rs::EUC_KR)),
            EncodingHint::None => None,
        }
    }
}

/// Detect the most likely encoding of a byte sequence
pub(crate) fn detect_encoding(bytes: &[u8], hint: EncodingHint) -> &'static Encoding {
    if std::str::from_utf8(bytes).is_ok() {
        return encoding_rs::UTF_8;
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);

    match hint.preference() {
        Some((tld, fallback)) => {
            let detected = detector.guess(Some(tld), true);
            if detected == encoding_rs::WINDOWS_1252 {
                fallback
            } else {
                detected
            }
        }
        None => detector.guess(None, true),
    }
}

/// Decode bytes to a UTF-8 string
///
/// Returns the decoded string and a flag indicating if there were errors
pub fn decode_bytes(bytes: &[u8], hint: EncodingHint) -> (String, bool) {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return (s.to_string(), false);
    }

    let encoding = detect_encoding(bytes, hint);
    let (result, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::warn!(encoding = encoding.name(), "Lossy decode of archive member name");
    }
    (result.into_owned(), had_errors)
}

/// Encoding hint from the `LANG` locale
pub fn system_encoding_hint() -> EncodingHint {
    std::env::var("LANG")
        .map(|lang| hint_for_locale(&lang))
        .unwrap_or(EncodingHint::None)
}

fn hint_for_locale(lang: &str) -> EncodingHint {
    let lang = lang.to_lowercase();
    if lang.starts_with("ja") {
        EncodingHint::Japanese
    } else if lang.starts_with("zh_cn") || lang.starts_with("zh-cn") {
        EncodingHint::ChineseSimplified
    } else if lang.starts_with("zh_tw") || lang.starts_with("zh-tw") {
        EncodingHint::ChineseTraditional
    } else if lang.starts_with("ko") {
        EncodingHint::Korean
    } else {
        EncodingHint::None
    }
}
