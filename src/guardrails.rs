//! PII Guardrails
//!
//! Scrubs e-mail addresses and phone numbers out of text shown to the user.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL: Regex =
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap();
    // 123-456-7890, 123.456.7890, (123) 456-7890, with optional +CC or leading 1.
    // One separator style per number; bare digit runs and space-separated groups are not phones.
    static ref PHONE: Regex = Regex::new(
        r"(?:(?:\+\d{1,3}|\b1)[-. ])?(?:\(\d{3}\) ?\d{3}[-.]\d{4}|\b\d{3}-\d{3}-\d{4}|\b\d{3}\.\d{3}\.\d{4})\b"
    )
    .unwrap();
}

pub const EMAIL_MASK: &str = "[EMAIL REDACTED]";
pub const PHONE_MASK: &str = "[PHONE REDACTED]";

/// Text scrubber. Total: always returns text.
pub trait Redactor: Send + Sync {
    fn redact(&self, text: &str) -> String;
}

#[derive(Debug, Clone, Default)]
pub struct RegexPiiRedactor;

impl RegexPiiRedactor {
    pub fn new() -> Self {
        Self
    }
}

impl Redactor for RegexPiiRedactor {
    fn redact(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        let text = EMAIL.replace_all(text, EMAIL_MASK);
        redact_phones(&text)
    }
}

fn redact_phones(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in PHONE.find_iter(text) {
        if is_part_of_number(text, m.start(), m.end()) {
            continue;
        }
        out.push_str(&text[last..m.start()]);
        out.push_str(PHONE_MASK);
        last = m.end();
    }
    out.push_str(&text[last..]);
    out
}

/// `123.456.7890.50` or `10.123-456-7890`: the match is a slice of a longer figure.
fn is_part_of_number(text: &str, start: usize, end: usize) -> bool {
    let joined = |a: Option<u8>, b: Option<u8>| {
        matches!(a, Some(b'.' | b'-' | b',')) && b.map_or(false, |c| c.is_ascii_digit())
    };
    let bytes = text.as_bytes();
    let after = joined(bytes.get(end).copied(), bytes.get(end + 1).copied());
    let before = start >= 2 && joined(bytes.get(start - 1).copied(), bytes.get(start - 2).copied());
    after || before
}
