//! Base64 codec for the session query parameter, and the JSON parser every
//! validity check goes through.
//!
//! Encodes the UTF-8 bytes of the text with the standard alphabet and
//! padding. Decoding is lenient about padding and reads spaces back as `+`,
//! which is what a form-urlencoded reader makes of an unescaped `+`.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;

use serde::Deserialize;
use serde_json::Value;

use crate::error::SessionError;

/// Deepest array/object nesting accepted by [`parse`].
///
/// serde_json's own limit (128) is lifted; this bound keeps parse, pretty
/// printing and drop of the resulting `Value` within the default 1 MiB wasm
/// stack.
pub const MAX_DEPTH: usize = 1024;

const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

pub fn encode(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

pub fn decode(param: &str) -> Result<String, SessionError> {
    let normalized: String = param
        .chars()
        .filter(|c| !matches!(c, '\n' | '\r' | '\t'))
        .map(|c| if c == ' ' { '+' } else { c })
        .collect();
    let bytes = LENIENT.decode(normalized)?;
    Ok(String::from_utf8(bytes)?)
}

/// Maximum array/object nesting in `text`, ignoring brackets inside strings.
fn nesting_depth(text: &str) -> usize {
    let (mut depth, mut max) = (0usize, 0usize);
    let (mut in_string, mut escaped) = (false, false);
    for b in text.bytes() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                max = max.max(depth);
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max
}

/// Parse `text` as a single JSON value, nested up to [`MAX_DEPTH`] deep.
pub fn parse(text: &str) -> Result<Value, SessionError> {
    let depth = nesting_depth(text);
    if depth > MAX_DEPTH {
        return Err(SessionError::TooDeep {
            depth,
            max: MAX_DEPTH,
        });
    }

    let mut de = serde_json::Deserializer::from_str(text);
    de.disable_recursion_limit();
    let value = Value::deserialize(&mut de)?;
    de.end()?;
    Ok(value)
}

/// Parse `text` as JSON and re-serialize it with two-space indentation.
pub fn pretty(text: &str) -> Result<String, SessionError> {
    let value = parse(text)?;
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Decode a query parameter into pretty-printed JSON text.
pub fn decode_pretty(param: &str) -> Result<String, SessionError> {
    pretty(&decode(param)?)
}
