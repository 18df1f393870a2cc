use crate::collaborators::ContextParser;
use ahash::AHashSet;
use lookbook_core::Result;

/// Splits TPO text on list separators.
///
/// `"Saturday, rooftop bar / date night"` becomes
/// `["saturday", "rooftop bar", "date night"]`. Text is lowercased before
/// splitting, terms are trimmed and repeats within one input are dropped.
#[derive(Debug, Clone, Default)]
pub struct KeywordContextParser;

const SEPARATORS: &[char] = &[',', ';', '/', '\n', '\r', '|', '·'];
const JOINERS: &[&str] = &[" and ", " & ", " 그리고 "];

impl KeywordContextParser {
    pub fn new() -> Self {
        Self
    }

    pub fn split_terms(text: &str) -> Vec<String> {
        let mut normalized = text.to_lowercase();
        for joiner in JOINERS {
            normalized = normalized.replace(joiner, ",");
        }

        let mut seen = AHashSet::new();
        normalized
            .split(SEPARATORS)
            .map(|term| term.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|term| !term.is_empty() && seen.insert(term.clone()))
            .collect()
    }
}

impl ContextParser for KeywordContextParser {
    fn parse(&self, text: &str) -> Result<Vec<String>> {
        Ok(Self::split_terms(text))
    }
}
