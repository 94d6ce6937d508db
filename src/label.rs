use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Debug;

static BAGS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+)\s*bags?\b").expect("regex"));
static BAGS_KEYED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bbags?\s*:?\s*(\d+)").expect("regex"));

/// Strategy for reading and rewriting the item-count label of a template.
pub trait CountLabelMatcher: Send + Sync + Debug {
    /// Whether `text` carries an item count this matcher can read.
    fn matches(&self, text: &str) -> bool {
        self.extract(text).is_some()
    }

    /// The item count held by the label, if any.
    fn extract(&self, text: &str) -> Option<u32>;

    /// Replace the count inside an existing label, keeping the surrounding text.
    fn rewrite(&self, text: &str, count: usize) -> String;

    /// Fresh label for a cell that held no recognizable text.
    fn render(&self, count: usize) -> String;
}

/// Matches labels such as `24 Bags`, `Total: 1 bag` or `Bags: 12`.
#[derive(Debug, Clone)]
pub struct KeywordCountMatcher {
    keyword: String,
    unit: String,
    pattern: Regex,
    keyed: Regex,
}

impl KeywordCountMatcher {
    pub fn new(keyword: &str, unit: &str) -> Result<Self, regex::Error> {
        let stem = keyword.trim_end_matches('s').to_lowercase();
        let escaped = regex::escape(&stem);
        let pattern = Regex::new(&format!(r"(?i)(\d+)\s*{}s?\b", escaped))?;
        let keyed = Regex::new(&format!(r"(?i)\b{}s?\s*:?\s*(\d+)", escaped))?;
        Ok(Self {
            keyword: stem,
            unit: unit.to_string(),
            pattern,
            keyed,
        })
    }

    pub fn bags() -> Self {
        Self {
            keyword: "bag".to_string(),
            unit: "Bags".to_string(),
            pattern: BAGS_RE.clone(),
            keyed: BAGS_KEYED_RE.clone(),
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Span of the digits that hold the count. `N bags` wins over `bags: N`.
    fn count_span(&self, text: &str) -> Option<(usize, usize)> {
        [&self.pattern, &self.keyed]
            .into_iter()
            .find_map(|re| re.captures(text).and_then(|caps| caps.get(1)))
            .map(|m| (m.start(), m.end()))
    }
}

impl Default for KeywordCountMatcher {
    fn default() -> Self {
        Self::bags()
    }
}

impl CountLabelMatcher for KeywordCountMatcher {
    fn extract(&self, text: &str) -> Option<u32> {
        let (start, end) = self.count_span(text)?;
        text[start..end].parse().ok()
    }

    fn rewrite(&self, text: &str, count: usize) -> String {
        match self.count_span(text) {
            Some((start, end)) => format!("{}{}{}", &text[..start], count, &text[end..]),
            None => self.render(count),
        }
    }

    fn render(&self, count: usize) -> String {
        format!("{} {}", count, self.unit)
    }
}
