use regex::Regex;

use crate::models::Category;

use super::normalize_keyword;

/// Result of classifying one post's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    /// Normalized keyword when the category is `StockSpecific`, else `None`.
    pub matched_keyword: Option<String>,
}

struct CompiledKeyword {
    /// Normalized form, returned verbatim on a match.
    keyword: String,
    pattern: Regex,
}

/// Compiled representation of a keyword set, able to scan free-form text
/// for token-bounded occurrences of any keyword.
///
/// Patterns are kept in the order the keywords were supplied; the first
/// pattern that matches wins, so match priority is supplied order and
/// nothing else.
pub struct KeywordMatcher {
    keywords: Vec<CompiledKeyword>,
}

impl KeywordMatcher {
    /// Compile a keyword list into a matcher.
    ///
    /// Each keyword is normalized first; keywords that normalize to empty
    /// are skipped. An empty list yields a matcher that never matches.
    pub fn compile<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .filter_map(|raw| {
                let keyword = normalize_keyword(raw.as_ref());
                if keyword.is_empty() {
                    return None;
                }
                match Regex::new(&token_pattern(&keyword)) {
                    Ok(pattern) => Some(CompiledKeyword { keyword, pattern }),
                    Err(e) => {
                        tracing::warn!("Skipping unmatchable keyword {keyword:?}: {e}");
                        None
                    }
                }
            })
            .collect();

        Self { keywords }
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    /// Classify a post's text against the compiled keyword set.
    ///
    /// Scans patterns in compiled order and stops at the first match. The
    /// returned keyword is the normalized form paired with the winning
    /// pattern, so it never carries a `$`/`#` marker regardless of how the
    /// keyword appeared in the text.
    pub fn classify(&self, text: &str) -> Classification {
        for compiled in &self.keywords {
            if compiled.pattern.is_match(text) {
                return Classification {
                    category: Category::StockSpecific,
                    matched_keyword: Some(compiled.keyword.clone()),
                };
            }
        }
        Classification {
            category: Category::FinancialAwareness,
            matched_keyword: None,
        }
    }
}

/// Token-boundary pattern for one normalized keyword.
///
/// Matches the keyword as a standalone token: not adjacent to an
/// alphanumeric on either side, with an optional `$` or `#` marker
/// directly before it. `TCS`, `$TCS`, and `#TCS` match; `TCSINFOTECH`
/// does not. Hyphens inside the keyword are literal. The regex crate has
/// no look-around, so the boundaries are consuming alternations and the
/// token itself sits in a capture group.
fn token_pattern(keyword: &str) -> String {
    format!(
        "(?i)(?:^|[^A-Za-z0-9])([$#]?{})(?:[^A-Za-z0-9]|$)",
        regex::escape(keyword)
    )
}
