//! Static venue-term glossary
//!
//! Used when the translation service is unavailable, so a snap of a hot-pot
//! shop still reads "Hot Pot Shop" rather than nothing.

/// Chinese venue terms and their English rendering
const GLOSSARY: &[(&str, &str)] = &[
    ("店", "Shop"),
    ("餐厅", "Restaurant"),
    ("饭馆", "Restaurant"),
    ("酒楼", "Restaurant"),
    ("茶楼", "Teahouse"),
    ("茶馆", "Teahouse"),
    ("咖啡", "Café"),
    ("面馆", "Noodle House"),
    ("火锅", "Hot Pot"),
    ("烧烤", "Barbecue"),
    ("小吃", "Snacks"),
    ("快餐", "Fast Food"),
    ("酒店", "Hotel"),
    ("宾馆", "Hotel"),
    ("会所", "Club"),
    ("酒吧", "Bar"),
];

/// Best-effort phrase lookup
///
/// Scans left to right taking the longest matching term at each position and
/// joins the English terms in text order. Returns `None` when no term matches.
pub fn lookup(text: &str) -> Option<String> {
    let mut found: Vec<&str> = Vec::new();
    let mut offset = 0;

    while offset < text.len() {
        let rest = &text[offset..];
        let hit = GLOSSARY
            .iter()
            .filter(|(term, _)| rest.starts_with(term))
            .max_by_key(|(term, _)| term.len());

        match hit {
            Some((term, english)) => {
                if found.last() != Some(english) {
                    found.push(*english);
                }
                offset += term.len();
            }
            None => {
                // Advance one character, staying on a char boundary
                offset += rest.chars().next().map_or(1, char::len_utf8);
            }
        }
    }

    if found.is_empty() {
        None
    } else {
        Some(found.join(" "))
    }
}
