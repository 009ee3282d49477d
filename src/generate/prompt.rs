/// Appended to prompts that are not plain English words.
pub const STYLE_SUFFIX: &str = " (meme style, funny, humorous, high quality)";

/// Whitespace as ECMAScript `\s` defines it. Unlike [`char::is_whitespace`]
/// this includes U+FEFF and excludes U+0085.
fn is_prompt_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\u{000B}'
            | '\u{000C}'
            | '\r'
            | ' '
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

/// Returns the prompt sent to the model.
///
/// Prompts made only of ASCII letters and whitespace pass through unchanged;
/// anything else (other scripts, digits, punctuation, empty input) gets
/// [`STYLE_SUFFIX`] to steer the model towards a consistent style.
pub fn normalize_prompt(raw: &str) -> String {
    let plain = !raw.is_empty()
        && raw
            .chars()
            .all(|c| c.is_ascii_alphabetic() || is_prompt_whitespace(c));

    if plain {
        raw.to_string()
    } else {
        format!("{}{}", raw, STYLE_SUFFIX)
    }
}
