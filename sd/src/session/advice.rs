//! Advice ("tips") helpers

use std::sync::LazyLock;

use regex::Regex;

/// Shown when the advice service fails
pub const ADVICE_FALLBACK: &str = "アドバイスの取得に失敗しました";

/// Characters per displayed tips line
pub const TIPS_LINE_CHARS: usize = 50;

/// Maximum displayed tips lines
pub const TIPS_MAX_LINES: usize = 3;

// "○○用" names the deck's purpose
static PURPOSE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r".+用").expect("static regex"));

/// True when the request names what the deck is for
pub fn has_purpose_keyword(text: &str) -> bool {
    PURPOSE_KEYWORD.is_match(text)
}

/// Wrap tips text into at most three lines of fifty characters
///
/// Existing line breaks are kept; each source line is wrapped on its own and
/// blank lines are dropped.
pub fn format_tips(tips: &str) -> Vec<String> {
    tips.lines()
        .flat_map(|line| {
            let chars: Vec<char> = line.chars().collect();
            chars
                .chunks(TIPS_LINE_CHARS)
                .map(|chunk| chunk.iter().collect::<String>())
                .collect::<Vec<_>>()
        })
        .take(TIPS_MAX_LINES)
        .collect()
}
