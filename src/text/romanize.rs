//! Han to pinyin transliteration

use pinyin::ToPinyin;
use serde::{Deserialize, Serialize};

/// Romanization output options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RomanizeOptions {
    /// Keep tone marks (`huǒ guō`) instead of plain ASCII (`huo guo`)
    pub tone_marks: bool,
}

impl Default for RomanizeOptions {
    fn default() -> Self {
        Self { tone_marks: true }
    }
}

/// Transliterate text to lower-case pinyin
///
/// Each Han character becomes one syllable; runs of other characters are kept
/// verbatim as their own token. Tokens are separated by single spaces.
pub fn to_pinyin(text: &str, options: RomanizeOptions) -> String {
    let mut tokens: Vec<String> = Vec::new();
    let mut verbatim = String::new();

    for c in text.chars() {
        match c.to_pinyin() {
            Some(syllable) => {
                flush(&mut verbatim, &mut tokens);
                let rendered = if options.tone_marks {
                    syllable.with_tone()
                } else {
                    syllable.plain()
                };
                tokens.push(rendered.to_string());
            }
            None if c.is_whitespace() => flush(&mut verbatim, &mut tokens),
            None => verbatim.push(c),
        }
    }
    flush(&mut verbatim, &mut tokens);

    tokens.join(" ").to_lowercase()
}

fn flush(verbatim: &mut String, tokens: &mut Vec<String>) {
    if !verbatim.is_empty() {
        tokens.push(std::mem::take(verbatim));
    }
}
