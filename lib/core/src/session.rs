//! Per-user progress through the outfit sequence.
//!
//! A [`Session`] keeps `selections.len() == progress.index()` at all times:
//! the only way to append a selection is [`Session::record_selection`], which
//! advances the progress in the same step.

use crate::{Category, Error, Exclusions, ItemId, Persona, Progress, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chosen item, stored with the literal fields supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub item_id: ItemId,
    pub category_tag: String,
    pub name: String,
    pub image_url: String,
    pub selected_at: DateTime<Utc>,
}

impl Selection {
    pub fn new(
        item_id: impl Into<ItemId>,
        category_tag: impl Into<String>,
        name: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            category_tag: category_tag.into(),
            name: name.into(),
            image_url: image_url.into(),
            selected_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    AwaitingPersona,
    AwaitingPreferences,
    AwaitingContext,
    Recommending,
    Finished,
}

/// Result of recording a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectOutcome {
    pub is_finished: bool,
    pub next_category: Option<Category>,
}

#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    persona: Option<Persona>,
    exclusions: Exclusions,
    exclusions_set: bool,
    context_terms: Vec<String>,
    selections: Vec<Selection>,
    progress: Progress,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_created_at(id, Utc::now())
    }

    pub fn with_created_at(id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            persona: None,
            exclusions: Exclusions::default(),
            exclusions_set: false,
            context_terms: Vec::new(),
            selections: Vec::new(),
            progress: Progress::start(),
            created_at,
            updated_at: created_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn persona(&self) -> Option<&Persona> {
        self.persona.as_ref()
    }

    pub fn exclusions(&self) -> &Exclusions {
        &self.exclusions
    }

    pub fn context_terms(&self) -> &[String] {
        &self.context_terms
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn current_category(&self) -> Option<Category> {
        self.progress.category()
    }

    pub fn is_finished(&self) -> bool {
        self.progress.is_finished()
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn phase(&self) -> SessionPhase {
        if self.persona.is_none() {
            SessionPhase::AwaitingPersona
        } else if self.progress.is_finished() {
            SessionPhase::Finished
        } else if !self.exclusions_set {
            SessionPhase::AwaitingPreferences
        } else if self.context_terms.is_empty() {
            SessionPhase::AwaitingContext
        } else {
            SessionPhase::Recommending
        }
    }

    /// Replaces the persona. Progress and selections are kept as they are.
    pub fn set_persona(&mut self, persona: Persona) {
        self.persona = Some(persona);
        self.touch();
    }

    /// Replaces the exclusion set wholesale.
    pub fn set_exclusions(&mut self, exclusions: Exclusions) {
        self.exclusions = exclusions;
        self.exclusions_set = true;
        self.touch();
    }

    pub fn add_context_terms<I>(&mut self, terms: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.context_terms.extend(terms);
        self.touch();
    }

    /// Appends a selection for the current category and moves to the next one.
    pub fn record_selection(&mut self, selection: Selection) -> Result<SelectOutcome> {
        if self.progress.is_finished() {
            return Err(Error::SessionFinished);
        }

        self.selections.push(selection);
        self.progress = self.progress.advance();
        self.touch();

        debug_assert_eq!(self.selections.len(), self.progress.index());

        Ok(SelectOutcome {
            is_finished: self.progress.is_finished(),
            next_category: self.progress.category(),
        })
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
