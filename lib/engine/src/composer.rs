use lookbook_core::{Persona, Selection};

/// Builds the text that gets embedded for a recommendation query.
///
/// Parts appear in a fixed order: persona style, persona features, context
/// terms, then the names of earlier selections. Blank parts are skipped and
/// the rest are joined with single spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryComposer;

impl QueryComposer {
    pub fn compose(persona: &Persona, context_terms: &[String], selections: &[Selection]) -> String {
        let persona_parts = [persona.style.as_str(), persona.features.as_str()];
        let context_parts = context_terms.iter().map(String::as_str);
        let selection_parts = selections.iter().map(render_selection);

        persona_parts
            .into_iter()
            .chain(context_parts)
            .chain(selection_parts)
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn render_selection(selection: &Selection) -> &str {
    if selection.name.trim().is_empty() {
        selection.item_id.as_str()
    } else {
        &selection.name
    }
}
