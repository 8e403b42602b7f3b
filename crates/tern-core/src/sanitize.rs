use std::sync::OnceLock;

use regex::Regex;
use regex::RegexSet;
use serde_json::Value;

pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred.";

static FRAME_PATTERNS: OnceLock<RegexSet> = OnceLock::new();
static LOCATION_SUFFIX: OnceLock<Regex> = OnceLock::new();

fn frame_patterns() -> &'static RegexSet {
    FRAME_PATTERNS.get_or_init(|| {
        RegexSet::new([
            // JS/Java style frames
            r"^at\s",
            // Rust backtraces
            r"^stack backtrace:?$",
            r"^\d+:\s+(0x[0-9a-f]+\s+-\s+)?([\w<>{}]+::)*[\w<>{}]+$",
            r"^note: run with `RUST_BACKTRACE",
            r"^thread '.*' panicked at",
            // Python tracebacks
            r"^Traceback \(most recent call last\):?$",
            r#"^File ".*", line \d+"#,
            // bare source locations
            r"^[\w./\\-]+\.(rs|js|mjs|cjs|ts|tsx|jsx|py|go|java|rb):\d+(:\d+)?\b",
            // source-like lines
            r"^(pub\s+)?(fn|function|def|class|impl|import|export|const|let|var|use|return)\s.*[(){};=]",
            r"^[{}()\[\];]+$",
            r"=>\s*\{",
            r"\bfunction\s*\(",
        ])
        .expect("frame patterns are valid")
    })
}

fn location_suffix() -> &'static Regex {
    LOCATION_SUFFIX.get_or_init(|| {
        Regex::new(r"\s*\(?[\w./\\-]+\.(rs|js|mjs|cjs|ts|tsx|jsx|py):\d+(:\d+)?\)?\s*$")
            .expect("location pattern is valid")
    })
}

/// Removes stack frames and source-like lines. Falls back to
/// [`GENERIC_ERROR_MESSAGE`] when nothing displayable remains.
pub fn sanitize_text(text: &str) -> String {
    let kept: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !frame_patterns().is_match(line))
        .map(|line| location_suffix().replace(line, "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    if kept.is_empty() {
        GENERIC_ERROR_MESSAGE.to_string()
    } else {
        kept.join("\n")
    }
}

/// Strings are sanitized directly; objects contribute their `message` or
/// `error` string. Every other shape yields the generic message.
pub fn sanitize_value(value: &Value) -> String {
    match value {
        Value::String(text) => sanitize_text(text),
        Value::Object(map) => ["message", "error", "detail"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(sanitize_text)
            .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string()),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::Array(_) => {
            GENERIC_ERROR_MESSAGE.to_string()
        }
    }
}

pub fn sanitize_error(err: &(dyn std::error::Error + 'static)) -> String {
    sanitize_text(&err.to_string())
}
