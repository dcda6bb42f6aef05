//! Deterministic post-processing of generator output.
//!
//! The generator is not bound by the prompt, so formatting characters are stripped here and any
//! output that explains the input away as corrupted or binary is replaced with a canned summary.

/// Characters removed wherever they appear, hyphens included.
const FORMATTING_CHARS: [char; 5] = ['*', '•', '●', '-', '▪'];

/// Lower-case phrases that mark a "this looks like corrupted data" answer.
pub(crate) const BANNED_PHRASES: [&str; 5] = [
    "appears to be corrupted",
    "contains unreadable data",
    "not in a recognizable text format",
    "not presented in a coherent, textual format",
    "raw, binary data",
];

/// Replacement summary used when the generator output trips the content policy.
pub const FALLBACK_SUMMARY: &str = "1. The document text could not be read in a clear way.\n\
2. No reliable topics, facts, or dates can be identified from the available data.\n\
3. Consider uploading a text-based or searchable PDF version of the file.\n\
4. If the file is scanned, try running OCR locally and uploading the extracted text.";

/// Strip bullet characters, then trim each line and the whole text.
pub(crate) fn strip_formatting(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|ch| !FORMATTING_CHARS.contains(ch))
        .collect();

    cleaned
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// First banned phrase found in `text`, compared case-insensitively.
pub(crate) fn find_banned_phrase(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    BANNED_PHRASES
        .iter()
        .copied()
        .find(|phrase| lower.contains(phrase))
}
