//! Place-name ranking
//!
//! Scores Chinese lines by how likely they are to be the name of a shop,
//! restaurant or other venue. The word lists are versioned: any change to
//! them changes scores and must bump [`RANKING_VERSION`].

/// Version of the keyword lists below
pub const RANKING_VERSION: u32 = 1;

/// Venue-type terms, each worth a bonus once when present
pub const VENUE_KEYWORDS: &[&str] = &[
    "店", "餐厅", "饭馆", "酒楼", "茶楼", "咖啡", "面馆", "火锅", "烧烤", "小吃", "快餐", "酒店",
    "宾馆", "会所", "酒吧",
];

/// Food characters, each worth a bonus once when present
pub const FOOD_CHARACTERS: &[char] = &['菜', '肉', '鱼', '鸡', '鸭', '牛', '羊', '虾', '蟹'];

/// Patterns typical of signage that is not a name (phone, address, hours, prices, menus)
pub const NON_NAME_PATTERNS: &[&str] = &["电话", "地址", "营业", "时间", "价格", "菜单"];

/// Punctuation symbols penalized alongside digits
const PENALIZED_SYMBOLS: &[char] = &[
    '.', ',', ';', ':', '!', '?', '(', ')', '[', ']', '{', '}', '，', '。', '；', '：', '！', '？',
    '（', '）', '【', '】',
];

const VENUE_BONUS: f32 = 40.0;
const FOOD_BONUS: f32 = 20.0;
const NON_NAME_PENALTY: f32 = 30.0;
const SYMBOL_PENALTY: f32 = 5.0;

/// A candidate line with its name-likelihood score
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    /// Line text
    pub text: String,
    /// Score, never negative
    pub score: f32,
}

/// Score and order lines, best first
///
/// Equal scores keep their input order.
pub fn rank(lines: &[String]) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = lines
        .iter()
        .map(|text| RankedCandidate {
            text: text.clone(),
            score: score(text),
        })
        .collect();

    // sort_by is stable, which keeps ties in input order
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

/// Score a single line
pub fn score(text: &str) -> f32 {
    let length = text.chars().count();
    let mut score = match length {
        2..=4 => 30.0,
        5..=8 => 25.0,
        9..=12 => 15.0,
        _ => 5.0,
    };

    let venue_hits = VENUE_KEYWORDS.iter().filter(|k| text.contains(*k)).count();
    score += venue_hits as f32 * VENUE_BONUS;

    let food_hits = FOOD_CHARACTERS.iter().filter(|c| text.contains(**c)).count();
    score += food_hits as f32 * FOOD_BONUS;

    let non_name_hits = NON_NAME_PATTERNS.iter().filter(|p| text.contains(*p)).count();
    score -= non_name_hits as f32 * NON_NAME_PENALTY;

    let noise = text.chars().filter(|c| is_penalized(*c)).count();
    score -= noise as f32 * SYMBOL_PENALTY;

    score.max(0.0)
}

fn is_penalized(c: char) -> bool {
    c.is_ascii_digit() || ('０'..='９').contains(&c) || PENALIZED_SYMBOLS.contains(&c)
}
