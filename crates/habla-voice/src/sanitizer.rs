//! Text cleaning for speech synthesis.
//!
//! Chat models decorate replies with emoji, stage directions, markdown and
//! bracketed notes that a synthesizer would either read aloud or choke on.
//! [`clean`] strips all of that in five ordered steps:
//!
//! 1. emoji and pictographs
//! 2. parenthesised asides, parentheses included
//! 3. emphasis markers (`**bold**`, `_italic_` keep their text; a
//!    single-asterisk span such as `*sonríe*` is a stage direction and is
//!    dropped whole)
//! 4. anything outside word characters, whitespace, `. , ; : ! ? ¿ ¡ -`
//! 5. whitespace runs collapsed to one space, ends trimmed
//!
//! Order matters: removing an emoji or an aside leaves doubled spaces that
//! only step 5 tidies up.
//!
//! The output of step 4 contains no emoji, parentheses, `*` or `_`, and is
//! already collapsed by step 5, so a second pass changes nothing.
//!
//! [`clean`] never fails. If a step cannot run, the text goes through
//! [`coarse_filter`] instead.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::warn;

/// Punctuation that survives cleaning. Everything else that is not a word
/// character or whitespace is removed.
pub const ALLOWED_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '¿', '¡', '-'];

/// Inclusive code-point ranges treated as emoji or pictographs.
const EMOJI_RANGES: &[(char, char)] = &[
    ('\u{1F600}', '\u{1F64F}'), // emoticons
    ('\u{1F300}', '\u{1F5FF}'), // symbols & pictographs, skin tones
    ('\u{1F680}', '\u{1F6FF}'), // transport & map
    ('\u{1F1E0}', '\u{1F1FF}'), // regional indicators (flags)
    ('\u{2600}', '\u{27BF}'),   // miscellaneous symbols, dingbats
    ('\u{1F900}', '\u{1F9FF}'), // supplemental symbols & pictographs
    ('\u{1FA70}', '\u{1FAFF}'), // symbols & pictographs extended-A
    ('\u{1F200}', '\u{1F251}'), // enclosed ideographic supplement
    ('\u{24C2}', '\u{24C2}'),   // circled M
    ('\u{FE00}', '\u{FE0F}'),   // variation selectors
    ('\u{200D}', '\u{200D}'),   // zero width joiner
    ('\u{20E3}', '\u{20E3}'),   // combining keycap
];

static PARENTHETICAL: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)"));

static STRONG: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*|__([^_]+)__"));

static STAGE_DIRECTION: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\*\S(?:[^*\n]*\S)?\*"));

static UNDERSCORE_EMPHASIS: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"_([^_]+)_"));

static DISALLOWED: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"[^\w\s.,;:!?¿¡\-]"));

/// Reasons the full pipeline could not run.
#[derive(Debug, Error)]
enum SanitizeError {
    #[error("sanitizer pattern unavailable: {0}")]
    Pattern(String),
}

fn pattern(
    cell: &'static LazyLock<Result<Regex, regex::Error>>,
) -> Result<&'static Regex, SanitizeError> {
    LazyLock::force(cell)
        .as_ref()
        .map_err(|e| SanitizeError::Pattern(e.to_string()))
}

/// Cleans model output for speech synthesis.
///
/// Total and idempotent: `clean(&clean(x)) == clean(x)` for every `x`, and
/// input with nothing speakable yields an empty string.
pub fn clean(text: &str) -> String {
    match sanitize(text) {
        Ok(cleaned) => cleaned,
        Err(e) => {
            warn!(error = %e, "text sanitizer degraded to coarse filter");
            coarse_filter(text)
        }
    }
}

/// Cleans raw bytes of unknown encoding.
///
/// Valid UTF-8 goes through [`clean`]. Anything else is decoded lossily and
/// passed through [`coarse_filter`], since the finer steps cannot be trusted
/// on replacement characters.
pub fn clean_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => clean(text),
        Err(e) => {
            warn!(error = %e, "text is not valid UTF-8, using coarse filter");
            coarse_filter(&String::from_utf8_lossy(bytes))
        }
    }
}

/// Keeps only alphanumerics, whitespace and [`ALLOWED_PUNCTUATION`], then
/// collapses whitespace.
pub fn coarse_filter(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || ALLOWED_PUNCTUATION.contains(c))
        .collect();
    collapse_whitespace(&kept)
}

fn sanitize(text: &str) -> Result<String, SanitizeError> {
    let text = strip_emoji(text);
    let text = strip_parentheticals(&text)?;
    let text = strip_emphasis(&text)?;
    let text = retain_allowed(&text)?;
    Ok(collapse_whitespace(&text))
}

fn is_emoji(c: char) -> bool {
    EMOJI_RANGES
        .iter()
        .any(|&(start, end)| (start..=end).contains(&c))
}

/// Step 1.
fn strip_emoji(text: &str) -> String {
    text.chars().filter(|&c| !is_emoji(c)).collect()
}

/// Step 2. An unmatched `(` is left for step 4.
fn strip_parentheticals(text: &str) -> Result<String, SanitizeError> {
    Ok(pattern(&PARENTHETICAL)?.replace_all(text, "").into_owned())
}

/// Step 3. Markers with no partner are dropped too.
fn strip_emphasis(text: &str) -> Result<String, SanitizeError> {
    let text = pattern(&STRONG)?.replace_all(text, "$1$2");
    let text = pattern(&STAGE_DIRECTION)?.replace_all(&text, "");
    let text = pattern(&UNDERSCORE_EMPHASIS)?.replace_all(&text, "$1");
    Ok(text.chars().filter(|&c| c != '*' && c != '_').collect())
}

/// Step 4.
fn retain_allowed(text: &str) -> Result<String, SanitizeError> {
    Ok(pattern(&DISALLOWED)?.replace_all(text, "").into_owned())
}

/// Step 5.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
