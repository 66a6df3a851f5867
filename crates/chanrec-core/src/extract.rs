//! Candidate code extraction from free-text option fields.
//!
//! A candidate code is one ASCII uppercase letter followed by exactly two
//! ASCII digits (`R05`, `N03`). Extraction is purely lexical; deciding which
//! candidate identifies a product is the resolver's job.

use std::sync::LazyLock;

use regex::Regex;

static CANDIDATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z][0-9]{2}").expect("candidate pattern is valid"));

/// Scans `text` left-to-right and returns every candidate code in
/// first-occurrence order, de-duplicated.
///
/// A match embedded in a longer alphanumeric token (`AB123`, `R051`) is not a
/// candidate: the character before must not be ASCII alphanumeric and the
/// character after must not be an ASCII digit. Empty text yields an empty
/// list, never an error.
#[must_use]
pub fn extract_candidates(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();

    for m in CANDIDATE_RE.find_iter(text) {
        if m.start() > 0 {
            let prev = bytes[m.start() - 1];
            if prev.is_ascii_alphanumeric() {
                continue;
            }
        }
        if m.end() < bytes.len() && bytes[m.end()].is_ascii_digit() {
            continue;
        }
        if seen.insert(m.as_str()) {
            out.push(m.as_str().to_string());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_code() {
        assert_eq!(extract_candidates("R05"), vec!["R05"]);
    }

    #[test]
    fn multiple_codes_in_order() {
        assert_eq!(
            extract_candidates("option: R05 / extra: N03"),
            vec!["R05", "N03"]
        );
    }

    #[test]
    fn duplicates_keep_first_occurrence_order() {
        assert_eq!(
            extract_candidates("N03 then R05 then N03 again"),
            vec!["N03", "R05"]
        );
    }

    #[test]
    fn multiline_option_text() {
        let text = "line one: R05\nline two: R13\ndisclaimer: ships in 3 days";
        assert_eq!(extract_candidates(text), vec!["R05", "R13"]);
    }

    #[test]
    fn empty_text_yields_empty_list() {
        assert!(extract_candidates("").is_empty());
    }

    #[test]
    fn no_codes_yields_empty_list() {
        assert!(extract_candidates("red / large / gift wrap").is_empty());
    }

    #[test]
    fn lowercase_letter_does_not_match() {
        assert!(extract_candidates("r05").is_empty());
    }

    #[test]
    fn three_digit_suffix_does_not_match() {
        assert!(extract_candidates("R051").is_empty());
    }

    #[test]
    fn leading_alphanumeric_does_not_match() {
        assert!(extract_candidates("AB12").is_empty());
        assert!(extract_candidates("1R05").is_empty());
    }

    #[test]
    fn code_adjacent_to_punctuation_matches() {
        assert_eq!(extract_candidates("(R05),[N03]"), vec!["R05", "N03"]);
    }

    #[test]
    fn code_adjacent_to_non_ascii_text_matches() {
        // Candidate codes embedded in CJK option text are common.
        assert_eq!(extract_candidates("옵션R05선택"), vec!["R05"]);
    }

    #[test]
    fn trailing_letter_is_allowed() {
        // Only a trailing digit extends the numeric run; a letter ends it.
        assert_eq!(extract_candidates("R05x"), vec!["R05"]);
    }

    #[test]
    fn extraction_is_deterministic() {
        let text = "A01 B02 A01 C03";
        assert_eq!(extract_candidates(text), extract_candidates(text));
    }
}
