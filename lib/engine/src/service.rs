//! The step-by-step lookbook flow.
//!
//! [`LookbookService`] owns the session table and the collaborators and
//! exposes one method per step. Every step that takes a session id creates
//! the session when the id is unknown; `status` and `end_session` do not.
//!
//! Session mutexes are only held while reading or updating session state.
//! Parsing, embedding, retrieval and justification run with no lock held.

use crate::collaborators::{ContextParser, Embedder, Justifier};
use crate::composer::QueryComposer;
use crate::hashing::HashingEmbedder;
use crate::justify::TemplateJustifier;
use crate::parser::KeywordContextParser;
use crate::retrieval::{RetrievalEngine, RetrievalRequest};
use chrono::{DateTime, Utc};
use lookbook_core::{
    Category, Error, Exclusions, ItemId, Persona, PersonaCatalog, Result, SelectOutcome,
    Selection, SessionPhase,
};
use lookbook_storage::{IndexStore, InMemorySessionStore, SessionHandle, SessionStore};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_RESULT_CAP: usize = 5;

const FINISHED_MESSAGE: &str = "당신의 코디가 완성되었습니다!";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Maximum number of items returned per recommendation.
    pub result_cap: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            result_cap: DEFAULT_RESULT_CAP,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub item_id: ItemId,
    pub name: String,
    pub image: String,
    pub description: String,
    pub price: Option<u64>,
    pub score: f32,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendations {
    pub category: Category,
    pub items: Vec<Recommendation>,
}

/// The outfit assembled so far.
#[derive(Debug, Clone, Serialize)]
pub struct LookbookView {
    pub persona: Option<Persona>,
    pub selections: Vec<Selection>,
    pub message: String,
    pub is_finished: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub session_id: String,
    pub phase: SessionPhase,
    pub current_category: Option<Category>,
    pub persona_id: Option<String>,
    pub selections: usize,
    pub context_terms: usize,
    pub is_finished: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What `recommend` needs from a session, copied out under its lock.
struct QuerySnapshot {
    category: Category,
    query_text: String,
    exclusions: Exclusions,
}

pub struct LookbookService {
    sessions: Arc<dyn SessionStore>,
    personas: PersonaCatalog,
    retrieval: RetrievalEngine,
    embedder: Arc<dyn Embedder>,
    parser: Arc<dyn ContextParser>,
    justifier: Arc<dyn Justifier>,
}

impl LookbookService {
    /// Service with in-memory sessions, the builtin personas and the offline
    /// collaborators.
    pub fn new(config: ServiceConfig, indices: Arc<IndexStore>) -> Self {
        Self {
            sessions: Arc::new(InMemorySessionStore::new()),
            personas: PersonaCatalog::builtin(),
            retrieval: RetrievalEngine::new(indices, config.result_cap),
            embedder: Arc::new(HashingEmbedder::default()),
            parser: Arc::new(KeywordContextParser::new()),
            justifier: Arc::new(TemplateJustifier::default()),
        }
    }

    #[must_use]
    pub fn with_sessions(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }

    #[must_use]
    pub fn with_personas(mut self, personas: PersonaCatalog) -> Self {
        self.personas = personas;
        self
    }

    #[must_use]
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = embedder;
        self
    }

    #[must_use]
    pub fn with_parser(mut self, parser: Arc<dyn ContextParser>) -> Self {
        self.parser = parser;
        self
    }

    #[must_use]
    pub fn with_justifier(mut self, justifier: Arc<dyn Justifier>) -> Self {
        self.justifier = justifier;
        self
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    fn session(&self, session_id: &str) -> SessionHandle {
        let lookup = self.sessions.get_or_create(session_id);
        if lookup.was_created() {
            info!(session_id, "session created");
        }
        lookup.into_handle()
    }

    fn existing(&self, session_id: &str) -> Result<SessionHandle> {
        self.sessions
            .get(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))
    }

    pub fn create_session(&self) -> String {
        let (id, _) = self.sessions.create();
        info!(session_id = %id, "session created");
        id
    }

    /// Set or replace the persona. Progress and selections are kept.
    pub fn set_persona(&self, session_id: &str, persona_id: &str) -> Result<Persona> {
        let handle = self.session(session_id);
        let persona = self.personas.get(persona_id)?.clone();
        handle.lock().set_persona(persona.clone());
        debug!(session_id, persona_id, "persona set");
        Ok(persona)
    }

    /// Replace the session's exclusions.
    pub fn set_exclusions(&self, session_id: &str, exclusions: Exclusions) -> Result<Exclusions> {
        let handle = self.session(session_id);
        handle.lock().set_exclusions(exclusions.clone());
        debug!(
            session_id,
            fit = exclusions.fit.len(),
            pattern = exclusions.pattern.len(),
            price_threshold = ?exclusions.price_threshold,
            "exclusions set"
        );
        Ok(exclusions)
    }

    /// Parse `free_text` and append the terms; returns the terms from this call.
    pub fn add_context(&self, session_id: &str, free_text: &str) -> Result<Vec<String>> {
        let handle = self.session(session_id);
        let terms = match self.parser.parse(free_text) {
            Ok(terms) => terms,
            Err(e) => {
                warn!(session_id, error = %e, "context parsing failed, no terms added");
                Vec::new()
            }
        };
        handle.lock().add_context_terms(terms.iter().cloned());
        debug!(session_id, terms = terms.len(), "context added");
        Ok(terms)
    }

    fn snapshot(&self, session_id: &str) -> Result<QuerySnapshot> {
        let handle = self.session(session_id);
        let session = handle.lock();
        let persona = session.persona().ok_or(Error::PersonaNotSet)?;
        let category = session.current_category().ok_or(Error::SessionFinished)?;
        Ok(QuerySnapshot {
            category,
            query_text: QueryComposer::compose(
                persona,
                session.context_terms(),
                session.selections(),
            ),
            exclusions: session.exclusions().clone(),
        })
    }

    /// Candidates for the session's current category, each with a reason.
    pub fn recommend(&self, session_id: &str) -> Result<Recommendations> {
        let snapshot = self.snapshot(session_id)?;
        debug!(session_id, category = %snapshot.category, query = %snapshot.query_text, "composed query");

        let query = self.embedder.embed(&snapshot.query_text)?;
        let results = self.retrieval.retrieve(&RetrievalRequest {
            category: snapshot.category,
            query,
            embedder: self.embedder.model_id(),
            exclusions: snapshot.exclusions,
        })?;

        let items = results
            .into_iter()
            .map(|scored| {
                let item = scored.item;
                let reason = self
                    .justifier
                    .justify(&item.description, &snapshot.query_text)
                    .unwrap_or_else(|e| {
                        warn!(item_id = %item.id, error = %e, "justification failed");
                        String::new()
                    });
                Recommendation {
                    item_id: item.id,
                    name: item.name,
                    image: item.image_url,
                    description: item.description,
                    price: item.price,
                    score: scored.score,
                    reason,
                }
            })
            .collect::<Vec<_>>();

        info!(session_id, category = %snapshot.category, items = items.len(), "recommendations served");
        Ok(Recommendations {
            category: snapshot.category,
            items,
        })
    }

    /// Record the chosen item for the current category and move on.
    pub fn select(
        &self,
        session_id: &str,
        item_id: impl Into<ItemId>,
        category_tag: &str,
        name: &str,
        image_url: &str,
    ) -> Result<SelectOutcome> {
        let handle = self.session(session_id);
        let selection = Selection::new(item_id, category_tag, name, image_url);
        let item_id = selection.item_id.clone();
        let outcome = handle.lock().record_selection(selection)?;
        info!(
            session_id,
            %item_id,
            is_finished = outcome.is_finished,
            next_category = ?outcome.next_category,
            "item selected"
        );
        Ok(outcome)
    }

    pub fn finalize(&self, session_id: &str) -> Result<LookbookView> {
        let handle = self.session(session_id);
        let session = handle.lock();
        let is_finished = session.is_finished();
        let message = if is_finished {
            FINISHED_MESSAGE.to_string()
        } else {
            format!(
                "{}/{} categories chosen, next: {}",
                session.selections().len(),
                Category::ALL.len(),
                session.current_category().map(Category::tag).unwrap_or_default()
            )
        };
        Ok(LookbookView {
            persona: session.persona().cloned(),
            selections: session.selections().to_vec(),
            message,
            is_finished,
        })
    }

    pub fn status(&self, session_id: &str) -> Result<SessionStatus> {
        let handle = self.existing(session_id)?;
        let session = handle.lock();
        Ok(SessionStatus {
            session_id: session.id().to_string(),
            phase: session.phase(),
            current_category: session.current_category(),
            persona_id: session.persona().map(|p| p.id.clone()),
            selections: session.selections().len(),
            context_terms: session.context_terms().len(),
            is_finished: session.is_finished(),
            created_at: session.created(),
            updated_at: session.updated(),
        })
    }

    pub fn end_session(&self, session_id: &str) -> Result<()> {
        if self.sessions.remove(session_id) {
            info!(session_id, "session ended");
            Ok(())
        } else {
            Err(Error::SessionNotFound(session_id.to_string()))
        }
    }

    pub fn personas(&self) -> Vec<Persona> {
        self.personas.list()
    }

    pub fn categories(&self) -> [Category; 5] {
        Category::ALL
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn loaded_categories(&self) -> Vec<Category> {
        self.retrieval.store().loaded_categories()
    }

    /// Check every loaded index against the configured embedder.
    pub fn check_indices(&self) -> Result<()> {
        let model_id = self.embedder.model_id();
        let store = self.retrieval.store();
        for category in store.loaded_categories() {
            RetrievalEngine::check_embedder(&*store.get(category)?, &model_id)?;
        }
        Ok(())
    }
}
