use crate::collaborators::Justifier;
use ahash::AHashSet;
use lookbook_core::Result;

/// Builds an explanation from the words an item description shares with the
/// composed context.
#[derive(Debug, Clone)]
pub struct TemplateJustifier {
    max_terms: usize,
}

impl TemplateJustifier {
    pub fn new(max_terms: usize) -> Self {
        Self { max_terms }
    }
}

impl Default for TemplateJustifier {
    fn default() -> Self {
        Self::new(3)
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 1)
        .map(|w| w.to_lowercase())
}

impl Justifier for TemplateJustifier {
    fn justify(&self, description: &str, context: &str) -> Result<String> {
        let context_words: AHashSet<String> = tokens(context).collect();

        // Keep description order so the sentence reads naturally.
        let mut seen = AHashSet::new();
        let shared: Vec<String> = tokens(description)
            .filter(|w| context_words.contains(w) && seen.insert(w.clone()))
            .take(self.max_terms)
            .collect();

        Ok(if shared.is_empty() {
            "A versatile pick that rounds out the look you are building.".to_string()
        } else {
            format!("Matches your {} preferences.", shared.join(", "))
        })
    }
}
