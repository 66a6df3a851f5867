//! Encoding repair and whitespace cleanup for raw option text.
//!
//! Channel feeds occasionally deliver option text whose UTF-8 bytes were
//! decoded with the legacy charset the channel declares (EUC-KR for the
//! Korean marketplaces, Windows-1252 for the western ones). Legacy lead bytes
//! swallow the ASCII characters of embedded option codes, so the damage is
//! visible as a drop in extractable candidates.
//!
//! The repair is attempt-and-verify, never a blind re-encode: the misdecoded
//! form is pushed back through the suspect charset and the recovered bytes are
//! re-read as UTF-8. The repaired text is accepted only when it yields
//! strictly more candidate codes than the input; already-clean text always
//! comes back unchanged.

use encoding_rs::{Encoding, EUC_KR, WINDOWS_1252};

use crate::extract::extract_candidates;

/// Cleans raw option text: attempts an encoding repair, then trims each line
/// and uppercases ASCII letters so lowercase code shapes reach the extractor.
///
/// Pure function with no I/O; never fails. Guarantees that the returned text
/// has at least as many extractable candidates as the input: trimming and the
/// ASCII fold never change a character's alphanumeric class, so existing
/// matches and their boundaries survive both steps.
#[must_use]
pub fn normalize_option_text(raw: &str) -> String {
    let baseline = extract_candidates(raw).len();

    let mut best = raw.to_string();
    let mut best_count = baseline;

    for charset in [EUC_KR, WINDOWS_1252] {
        if let Some(repaired) = attempt_repair(raw, charset) {
            let count = extract_candidates(&repaired).len();
            if count > best_count {
                best = repaired;
                best_count = count;
            }
        }
    }

    trim_lines(&best).to_ascii_uppercase()
}

/// Re-encodes `text` through `charset` and reinterprets the recovered bytes
/// as UTF-8. Returns `None` when the round trip is lossy in either direction;
/// a lossy repair can only destroy signal.
fn attempt_repair(text: &str, charset: &'static Encoding) -> Option<String> {
    let (bytes, _, had_errors) = charset.encode(text);
    if had_errors {
        return None;
    }
    String::from_utf8(bytes.into_owned()).ok()
}

/// Trims leading and trailing whitespace from every line, preserving line
/// structure. Trimming cannot create new token adjacencies across lines, so
/// it never changes the candidate set.
fn trim_lines(text: &str) -> String {
    let mut lines = text.lines().map(str::trim);
    let mut out = String::with_capacity(text.len());
    if let Some(first) = lines.next() {
        out.push_str(first);
    }
    for line in lines {
        out.push('\n');
        out.push_str(line);
    }
    out
}
