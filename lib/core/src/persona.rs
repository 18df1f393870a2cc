use crate::{Error, Result};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// A named bundle of style preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Preferred style descriptor.
    #[serde(alias = "선호 스타일")]
    pub style: String,
    /// Preferred item features descriptor.
    #[serde(alias = "선호하는 아이템 특징")]
    pub features: String,
}

impl Persona {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        style: impl Into<String>,
        features: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            style: style.into(),
            features: features.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    List(Vec<Persona>),
    Keyed(HashMap<String, Persona>),
}

/// Persona presets, looked up by id.
#[derive(Debug, Clone, Default)]
pub struct PersonaCatalog {
    personas: AHashMap<String, Persona>,
}

impl PersonaCatalog {
    pub fn new(personas: impl IntoIterator<Item = Persona>) -> Self {
        Self {
            personas: personas.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    /// Presets covering the five style families the catalog is crawled for.
    pub fn builtin() -> Self {
        Self::new([
            Persona::new(
                "casual",
                "Casual",
                "relaxed everyday casual",
                "soft cotton, regular fit, solid colors, comfortable basics",
            ),
            Persona::new(
                "street",
                "Street",
                "hip street style",
                "oversized fit, logo and graphic prints, bold colors",
            ),
            Persona::new(
                "workwear",
                "Workwear",
                "rugged workwear",
                "sturdy canvas and denim, utility pockets, earthy tones",
            ),
            Persona::new(
                "preppy",
                "Preppy",
                "classic preppy",
                "knit and oxford fabrics, stripes and checks, neat fit",
            ),
            Persona::new(
                "chic",
                "Chic",
                "minimal chic",
                "slim tailored fit, monochrome palette, clean lines",
            ),
        ])
    }

    /// Load presets from JSON: either a list of personas or an object keyed by id.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_json_str(&data)?;
        debug!(path = ?path.as_ref(), personas = catalog.len(), "persona catalog loaded");
        Ok(catalog)
    }

    pub fn from_json_str(data: &str) -> Result<Self> {
        let personas = match serde_json::from_str::<CatalogFile>(data)? {
            CatalogFile::List(list) => list,
            CatalogFile::Keyed(map) => map
                .into_iter()
                .map(|(id, mut persona)| {
                    if persona.id.is_empty() {
                        persona.id = id;
                    }
                    persona
                })
                .collect(),
        };

        if let Some(p) = personas.iter().find(|p| p.id.trim().is_empty()) {
            return Err(Error::InvalidConfig(format!(
                "persona '{}' has no id",
                p.name
            )));
        }

        Ok(Self::new(personas))
    }

    pub fn get(&self, id: &str) -> Result<&Persona> {
        self.personas
            .get(id)
            .ok_or_else(|| Error::PersonaNotFound(id.to_string()))
    }

    /// All personas ordered by id.
    pub fn list(&self) -> Vec<Persona> {
        let mut personas: Vec<Persona> = self.personas.values().cloned().collect();
        personas.sort_by(|a, b| a.id.cmp(&b.id));
        personas
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}
