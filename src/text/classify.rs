//! Line extraction and script classification
//!
//! Splits a raw recognition blob into cleaned lines and tags each one as
//! Chinese-script or not. Cleaning is a fixed point: feeding the joined output
//! back in yields exactly the same lines.

/// A cleaned line of recognized text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine {
    /// Cleaned text, never empty
    pub text: String,
    /// Whether the line holds at least one Han character
    pub is_chinese: bool,
}

/// Split raw recognizer output into cleaned, classified lines
pub fn classify(raw: &str) -> Vec<ClassifiedLine> {
    raw.split(['\n', '\r'])
        .filter_map(|line| {
            let text = clean_line(line);
            if text.is_empty() {
                return None;
            }
            let is_chinese = contains_han(&text);
            Some(ClassifiedLine { text, is_chinese })
        })
        .collect()
}

/// Remove OCR artifacts from a single line
///
/// Zero-width characters are dropped, non-breaking spaces become plain
/// spaces, whitespace runs collapse to one space and the ends are trimmed.
pub fn clean_line(line: &str) -> String {
    let stripped: String = line
        .chars()
        .filter(|c| !is_zero_width(*c))
        .map(|c| if c == '\u{00A0}' { ' ' } else { c })
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Zero-width space, non-joiner, joiner and byte-order mark
pub fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200B}'..='\u{200D}' | '\u{FEFF}')
}

/// Whether a character belongs to the Han script blocks used for classification
///
/// Covers the CJK ideograph blocks plus CJK symbols/punctuation and Bopomofo,
/// since signage often mixes those in with the ideographs.
pub fn is_han(c: char) -> bool {
    is_ideograph(c)
        || matches!(
            c,
            '\u{3000}'..='\u{303F}'     // CJK Symbols and Punctuation
                | '\u{3100}'..='\u{312F}' // Bopomofo
        )
}

/// Whether a character is a Han ideograph proper
pub fn is_ideograph(c: char) -> bool {
    matches!(
        c,
        '\u{4E00}'..='\u{9FFF}'       // CJK Unified Ideographs
            | '\u{3400}'..='\u{4DBF}' // Extension A
            | '\u{F900}'..='\u{FAFF}' // Compatibility Ideographs
            | '\u{20000}'..='\u{2FA1F}' // Extensions B and later, compatibility supplement
    )
}

/// Whether the text contains at least one Han character
pub fn contains_han(text: &str) -> bool {
    text.chars().any(is_han)
}

/// Share of characters that are ideographs (0.0 for empty text)
pub fn ideograph_density(text: &str) -> f32 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let ideographs = text.chars().filter(|c| is_ideograph(*c)).count();
    ideographs as f32 / total as f32
}

/// Whether leftover OCR artifacts remain in the text
///
/// Zero-width characters, non-breaking spaces and runs of two or more
/// whitespace characters all count.
pub fn has_artifacts(text: &str) -> bool {
    let mut previous_was_space = false;
    for c in text.chars() {
        if is_zero_width(c) || c == '\u{00A0}' {
            return true;
        }
        let is_space = c.is_whitespace();
        if is_space && previous_was_space {
            return true;
        }
        previous_was_space = is_space;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(lines: &[ClassifiedLine]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_classify_splits_and_tags_lines() {
        let lines = classify("欢迎光临\n营业时间\n123");

        assert_eq!(texts(&lines), vec!["欢迎光临", "营业时间", "123"]);
        assert!(lines[0].is_chinese);
        assert!(lines[1].is_chinese);
        assert!(!lines[2].is_chinese);
    }

    #[test]
    fn test_classify_drops_blank_and_artifact_only_lines() {
        let lines = classify("  老王火锅店  \n\n   \n\u{200B}\u{FEFF}\r\nhello   world\r\n");

        assert_eq!(texts(&lines), vec!["老王火锅店", "hello world"]);
        assert!(lines[0].is_chinese);
        assert!(!lines[1].is_chinese);
    }

    #[test]
    fn test_clean_line_strips_zero_width_and_nbsp() {
        assert_eq!(clean_line("老\u{200B}王\u{200C}面\u{200D}馆\u{FEFF}"), "老王面馆");
        assert_eq!(clean_line("欢迎\u{00A0}\u{00A0}光临"), "欢迎 光临");
        assert_eq!(clean_line("\t 小吃 \t 街 "), "小吃 街");
    }

    #[test]
    fn test_cjk_punctuation_counts_as_chinese() {
        let lines = classify("「」\nABC");
        assert!(lines[0].is_chinese);
        assert!(!lines[1].is_chinese);
    }

    #[test]
    fn test_punctuation_is_not_an_ideograph() {
        assert!(is_ideograph('火'));
        assert!(is_ideograph('\u{20000}'));
        assert!(is_han('。') && !is_ideograph('。'));
        assert!(is_han('「') && !is_ideograph('「'));
        assert!(is_han('ㄅ') && !is_ideograph('ㄅ'));
    }

    #[test]
    fn test_ideographic_space_is_collapsed() {
        let lines = classify("北京\u{3000}\u{3000}烤鸭");
        assert_eq!(texts(&lines), vec!["北京 烤鸭"]);
    }

    #[test]
    fn test_output_never_empty_and_artifact_free() {
        let samples = [
            "",
            "\n\n\n",
            "\u{200B}",
            "a\u{00A0}\u{00A0}b\n\u{FEFF}茶楼\u{200B}\n  ",
            "电话：123-4567\r\n地址  北京市",
            "   \u{3000}  ",
        ];

        for sample in samples {
            for line in classify(sample) {
                assert!(!line.text.is_empty(), "empty line from {:?}", sample);
                assert!(!has_artifacts(&line.text), "artifacts in {:?}", line.text);
                assert_eq!(line.text, line.text.trim());
            }
        }
    }

    #[test]
    fn test_classify_is_idempotent() {
        let samples = [
            "欢迎光临\n营业时间\n123",
            "  老王\u{200B}火锅店 \r\n\r\nOPEN  24H\n",
            "咖啡\u{00A0}\u{00A0}Coffee\n\u{FEFF}\n小 吃",
        ];

        for sample in samples {
            let first = classify(sample);
            let joined = texts(&first).join("\n");
            assert_eq!(classify(&joined), first);
        }
    }

    #[test]
    fn test_ideograph_density() {
        assert!((ideograph_density("火锅") - 1.0).abs() < 0.001);
        assert!((ideograph_density("火锅ab") - 0.5).abs() < 0.001);
        assert!((ideograph_density("火锅。") - 2.0 / 3.0).abs() < 0.001);
        assert_eq!(ideograph_density("「」"), 0.0);
        assert_eq!(ideograph_density(""), 0.0);
    }

    #[test]
    fn test_has_artifacts() {
        assert!(!has_artifacts("老王 火锅"));
        assert!(has_artifacts("老王  火锅"));
        assert!(has_artifacts("老王\u{00A0}火锅"));
        assert!(has_artifacts("老王\u{200B}火锅"));
    }
}
