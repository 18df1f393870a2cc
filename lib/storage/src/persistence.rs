// On-disk layout of a category index:
//
//   <data_dir>/<category>/manifest.json   - IndexManifest
//   <data_dir>/<category>/items.jsonl     - one ItemRecord per line
//   <data_dir>/<category>/vectors.bin     - bincode Vec<VectorRecord>
//
// The manifest is written last, so a directory without one is never read.
use anyhow::{anyhow, bail, Context, Result};
use atomicwrites::{AllowOverwrite, AtomicFile};
use chrono::{DateTime, Utc};
use lookbook_core::{Category, CategoryIndex, Distance, ItemId, ItemRecord, Vector};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const ITEMS_FILE: &str = "items.jsonl";
pub const VECTORS_FILE: &str = "vectors.bin";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub category: Category,
    pub distance: Distance,
    pub vector_dim: usize,
    /// Model id of the embedder that produced `vectors.bin`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedder: Option<String>,
    pub count: usize,
    pub vectors_sha256: String,
    pub built_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct VectorRecord {
    id: String,
    vector: Vec<f32>,
}

pub fn category_dir(data_dir: &Path, category: Category) -> PathBuf {
    data_dir.join(category.tag())
}

/// Whether a complete index has been written for `category`.
pub fn index_exists(data_dir: &Path, category: Category) -> bool {
    category_dir(data_dir, category).join(MANIFEST_FILE).is_file()
}

/// Read a category index. Callers check [`index_exists`] first to tell a
/// missing index apart from a damaged one.
pub fn read_category_index(data_dir: &Path, category: Category) -> Result<CategoryIndex> {
    let dir = category_dir(data_dir, category);

    let manifest_path = dir.join(MANIFEST_FILE);
    let manifest: IndexManifest = serde_json::from_slice(
        &std::fs::read(&manifest_path).with_context(|| format!("reading {:?}", manifest_path))?,
    )
    .with_context(|| format!("parsing {:?}", manifest_path))?;

    if manifest.category != category {
        bail!(
            "manifest in {:?} is for category {}, expected {}",
            dir,
            manifest.category,
            category
        );
    }

    let vectors_path = dir.join(VECTORS_FILE);
    let vector_bytes =
        std::fs::read(&vectors_path).with_context(|| format!("reading {:?}", vectors_path))?;
    let checksum = format!("{:x}", Sha256::digest(&vector_bytes));
    if checksum != manifest.vectors_sha256 {
        bail!(
            "checksum mismatch for {:?}: manifest {}, file {}",
            vectors_path,
            manifest.vectors_sha256,
            checksum
        );
    }
    let vector_records: Vec<VectorRecord> = bincode::deserialize(&vector_bytes)
        .map_err(|e| anyhow!("Deserialization error in {:?}: {}", vectors_path, e))?;

    let items_path = dir.join(ITEMS_FILE);
    let items_text = std::fs::read_to_string(&items_path)
        .with_context(|| format!("reading {:?}", items_path))?;
    let items = parse_items(&items_text).with_context(|| format!("parsing {:?}", items_path))?;

    if items.len() != manifest.count || vector_records.len() != manifest.count {
        bail!(
            "manifest count {} does not match {} items / {} vectors",
            manifest.count,
            items.len(),
            vector_records.len()
        );
    }

    let vectors = vector_records
        .into_iter()
        .map(|r| (ItemId::new(r.id), Vector::new(r.vector)))
        .collect();

    let index = CategoryIndex::new(
        category,
        manifest.distance,
        manifest.vector_dim,
        items,
        vectors,
    )?;
    Ok(match manifest.embedder {
        Some(model_id) => index.with_embedder(model_id),
        None => index,
    })
}

/// Parse JSON lines, skipping blank ones.
pub fn parse_items(text: &str) -> Result<Vec<ItemRecord>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<ItemRecord>(line).with_context(|| format!("line {}", i + 1))
        })
        .collect()
}

/// Write a category index, replacing any previous one.
pub fn write_category_index(data_dir: &Path, index: &CategoryIndex) -> Result<IndexManifest> {
    let dir = category_dir(data_dir, index.category());
    std::fs::create_dir_all(&dir)?;

    let vector_records: Vec<VectorRecord> = index
        .entries()
        .iter()
        .map(|e| VectorRecord {
            id: e.id().to_string(),
            vector: e.vector.as_slice().to_vec(),
        })
        .collect();
    let vector_bytes = bincode::serialize(&vector_records)
        .map_err(|e| anyhow!("Serialization error: {}", e))?;

    let mut items_bytes = Vec::new();
    for entry in index.entries() {
        serde_json::to_writer(&mut items_bytes, &entry.record)?;
        items_bytes.push(b'\n');
    }

    let manifest = IndexManifest {
        category: index.category(),
        distance: index.distance(),
        vector_dim: index.vector_dim(),
        embedder: index.embedder().map(str::to_string),
        count: index.len(),
        vectors_sha256: format!("{:x}", Sha256::digest(&vector_bytes)),
        built_at: Utc::now(),
    };
    let manifest_bytes = serde_json::to_vec_pretty(&manifest)?;

    write_atomic(&dir.join(ITEMS_FILE), &items_bytes)?;
    write_atomic(&dir.join(VECTORS_FILE), &vector_bytes)?;
    write_atomic(&dir.join(MANIFEST_FILE), &manifest_bytes)?;

    Ok(manifest)
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    AtomicFile::new(path, AllowOverwrite)
        .write(|f| f.write_all(data))
        .with_context(|| format!("writing {:?}", path))
}
