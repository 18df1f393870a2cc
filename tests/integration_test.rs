// Integration tests for Lookbook
use lookbook_core::{
    Category, CategoryIndex, Distance, Error, Exclusions, ItemRecord, SessionPhase,
};
use lookbook_engine::{Embedder, HashingEmbedder, IndexBuilder, LookbookService, ServiceConfig};
use lookbook_storage::{persistence, write_category_index, IndexStore};
use std::path::Path;
use std::sync::Arc;

const DIM: usize = 64;

fn catalog(category: Category) -> Vec<ItemRecord> {
    let tag = category.tag();
    vec![
        ItemRecord::new("1")
            .with_name(format!("slim {} in black", tag))
            .with_description(format!("black slim {} for the office", tag))
            .with_fit("slim")
            .with_pattern("solid")
            .with_price(39_000),
        ItemRecord::new("2")
            .with_name(format!("oversized logo {}", tag))
            .with_description(format!("oversized street {} with a logo print, cafe weekend", tag))
            .with_fit("oversized")
            .with_pattern("logo")
            .with_price(49_000),
        ItemRecord::new("3")
            .with_name(format!("regular striped {}", tag))
            .with_description(format!("navy striped {} for a casual weekend", tag))
            .with_fit("regular")
            .with_pattern("stripe")
            .with_price(50_000),
        ItemRecord::new("4")
            .with_name(format!("premium {}", tag))
            .with_description(format!("premium street {} in wool, cafe weekend", tag))
            .with_fit("oversized")
            .with_pattern("solid")
            .with_price(129_000),
    ]
}

fn write_all_categories(data_dir: &Path) {
    let embedder = HashingEmbedder::new(DIM).unwrap();
    for category in Category::ALL {
        let index = IndexBuilder::new(category, &embedder)
            .build(catalog(category), &Default::default())
            .unwrap();
        write_category_index(data_dir, &index).unwrap();
    }
}

fn service(data_dir: &Path) -> LookbookService {
    LookbookService::new(ServiceConfig::default(), Arc::new(IndexStore::open(data_dir)))
        .with_embedder(Arc::new(HashingEmbedder::new(DIM).unwrap()))
}

#[test]
fn test_five_category_flow() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_all_categories(temp_dir.path());
    let service = service(temp_dir.path());

    service.set_persona("s1", "street").unwrap();
    service
        .set_exclusions("s1", Exclusions::new(["slim"], ["stripe"], Some(100_000)))
        .unwrap();
    let terms = service.add_context("s1", "Saturday, cafe and weekend").unwrap();
    assert_eq!(terms, vec!["saturday", "cafe", "weekend"]);
    assert_eq!(service.status("s1").unwrap().phase, SessionPhase::Recommending);

    let mut expected = Category::ALL.iter().skip(1).copied().map(Some).collect::<Vec<_>>();
    expected.push(None);

    for (step, category) in Category::ALL.into_iter().enumerate() {
        let recs = service.recommend("s1").unwrap();
        assert_eq!(recs.category, category);
        // Only item 2 survives slim, stripe and the price cap.
        let ids: Vec<&str> = recs.items.iter().map(|r| r.item_id.as_str()).collect();
        assert_eq!(ids, vec!["2"]);

        let pick = &recs.items[0];
        let outcome = service
            .select("s1", pick.item_id.clone(), category.tag(), &pick.name, &pick.image)
            .unwrap();
        assert_eq!(outcome.next_category, expected[step]);
        assert_eq!(outcome.is_finished, step == Category::ALL.len() - 1);
    }

    assert!(matches!(service.recommend("s1"), Err(Error::SessionFinished)));
    let view = service.finalize("s1").unwrap();
    assert!(view.is_finished);
    assert_eq!(view.selections.len(), 5);
    let tags: Vec<&str> = view.selections.iter().map(|s| s.category_tag.as_str()).collect();
    assert_eq!(tags, vec!["top", "bottom", "outerwear", "bag", "shoes"]);
    assert_eq!(service.loaded_categories(), Category::ALL.to_vec());
}

#[test]
fn test_price_threshold_50000() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_all_categories(temp_dir.path());
    let service = service(temp_dir.path());

    service.set_persona("s1", "casual").unwrap();
    service
        .set_exclusions(
            "s1",
            Exclusions::new(Vec::<String>::new(), Vec::<String>::new(), Some(50_000)),
        )
        .unwrap();

    let recs = service.recommend("s1").unwrap();
    assert_eq!(recs.items.len(), 3);
    assert!(recs.items.iter().all(|r| matches!(r.price, Some(p) if p <= 50_000)));
    assert!(recs.items.iter().any(|r| r.price == Some(50_000)));
}

#[test]
fn test_persona_required_at_every_category() {
    let temp_dir = tempfile::tempdir().unwrap();
    let service = service(temp_dir.path());

    for category in Category::ALL {
        assert!(matches!(service.recommend("s1"), Err(Error::PersonaNotSet)));
        service.select("s1", "9", category.tag(), "x", "").unwrap();
    }
    assert!(matches!(service.recommend("s1"), Err(Error::PersonaNotSet)));
}

#[test]
fn test_finalize_returns_literal_selection_fields() {
    let temp_dir = tempfile::tempdir().unwrap();
    let service = service(temp_dir.path());

    service
        .select("s1", "A-17", "상의", "  Cropped Knit  ", "https://img.example/a17.jpg?w=500")
        .unwrap();
    service.select("s1", "B-2", "하의", "", "").unwrap();

    let view = service.finalize("s1").unwrap();
    assert!(!view.is_finished);
    assert_eq!(view.selections[0].item_id.as_str(), "A-17");
    assert_eq!(view.selections[0].category_tag, "상의");
    assert_eq!(view.selections[0].name, "  Cropped Knit  ");
    assert_eq!(view.selections[0].image_url, "https://img.example/a17.jpg?w=500");
    assert_eq!(view.selections[1].name, "");
}

#[test]
fn test_concurrent_selects_keep_invariant() {
    let temp_dir = tempfile::tempdir().unwrap();
    let service = Arc::new(service(temp_dir.path()));

    let handles: Vec<_> = (0..12)
        .map(|i| {
            let service = service.clone();
            std::thread::spawn(move || service.select("shared", i as u64, "any", "item", ""))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let accepted = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(Error::SessionFinished)))
        .count();
    assert_eq!(accepted, 5);
    assert_eq!(rejected, 7);
    assert_eq!(results.iter().filter(|r| matches!(r, Ok(o) if o.is_finished)).count(), 1);

    let status = service.status("shared").unwrap();
    assert_eq!(status.selections, 5);
    assert!(status.is_finished);
    assert_eq!(service.session_count(), 1);
}

#[test]
fn test_index_round_trip_through_disk() {
    let temp_dir = tempfile::tempdir().unwrap();
    let embedder = HashingEmbedder::new(DIM).unwrap();
    let items = catalog(Category::Outerwear);
    let vectors = items
        .iter()
        .map(|item| (item.id.clone(), embedder.embed(&item.description).unwrap()))
        .collect();
    let index =
        CategoryIndex::new(Category::Outerwear, Distance::Dot, DIM, items, vectors).unwrap();
    write_category_index(temp_dir.path(), &index).unwrap();

    let store = IndexStore::open(temp_dir.path());
    let loaded = store.get(Category::Outerwear).unwrap();
    assert_eq!(loaded.len(), 4);
    assert_eq!(loaded.distance(), Distance::Dot);
    for (original, entry) in index.entries().iter().zip(loaded.entries()) {
        assert_eq!(original.record, entry.record);
        assert_eq!(original.vector, entry.vector);
    }

    // A second lookup is served from the cache.
    store.get(Category::Outerwear).unwrap();
    assert_eq!(store.load_count(), 1);
}

#[test]
fn test_corrupted_index_is_unavailable() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_all_categories(temp_dir.path());

    let vectors = persistence::category_dir(temp_dir.path(), Category::Top).join(persistence::VECTORS_FILE);
    let mut bytes = std::fs::read(&vectors).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    std::fs::write(&vectors, bytes).unwrap();

    let service = service(temp_dir.path());
    service.set_persona("s1", "street").unwrap();
    let recs = service.recommend("s1").unwrap();
    assert_eq!(recs.category, Category::Top);
    assert!(recs.items.is_empty());
    assert!(service.loaded_categories().is_empty());

    // Other categories still load.
    service.select("s1", "1", "top", "x", "").unwrap();
    assert!(!service.recommend("s1").unwrap().items.is_empty());
}

#[test]
fn test_persona_change_mid_flow_keeps_picks() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_all_categories(temp_dir.path());
    let service = service(temp_dir.path());

    service.set_persona("s1", "street").unwrap();
    service.select("s1", "2", "top", "oversized logo top", "").unwrap();
    service.set_persona("s1", "workwear").unwrap();

    let recs = service.recommend("s1").unwrap();
    assert_eq!(recs.category, Category::Bottom);
    let view = service.finalize("s1").unwrap();
    assert_eq!(view.selections.len(), 1);
    assert_eq!(view.persona.unwrap().id, "workwear");
}

#[test]
fn test_crawler_dump_builds_index() {
    let temp_dir = tempfile::tempdir().unwrap();
    let dump = [
        r#"{"product_id": 101, "main_cat_name": "상의", "product_name": "Logo Hoodie", "img_url": ["https://img/101.jpg"], "fit_name": "oversized", "pattern_name": "logo", "price": "49,000원"}"#,
        r#"{"product_id": 102, "main_cat_name": "상의", "product_name": "Plain Hoodie", "img_url": ["https://img/102.jpg"], "fit_name": "oversized", "pattern_name": "solid", "price": ""}"#,
        r#"{"product_id": 201, "main_cat_name": "하의", "product_name": "Cargo Pants", "img_url": [], "fit_name": "wide", "pattern_name": "solid", "price": "59,000원"}"#,
    ]
    .join("\n");
    let rows = persistence::parse_items(&dump).unwrap();
    assert_eq!(rows.len(), 3);

    let embedder = HashingEmbedder::new(DIM).unwrap();
    let index = IndexBuilder::new(Category::Top, &embedder)
        .build(rows, &Default::default())
        .unwrap();
    let manifest = write_category_index(temp_dir.path(), &index).unwrap();
    assert_eq!(manifest.count, 2);
    assert_eq!(manifest.embedder, Some(embedder.model_id()));

    let service = service(temp_dir.path());
    service.set_persona("s1", "street").unwrap();
    let mut ids: Vec<String> = service
        .recommend("s1")
        .unwrap()
        .items
        .into_iter()
        .map(|r| r.item_id.to_string())
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["101", "102"]);

    // The unpriced hoodie cannot be shown to stay under a budget.
    service
        .set_exclusions(
            "s1",
            Exclusions::new(Vec::<String>::new(), Vec::<String>::new(), Some(50_000)),
        )
        .unwrap();
    let recs = service.recommend("s1").unwrap();
    let ids: Vec<&str> = recs.items.iter().map(|r| r.item_id.as_str()).collect();
    assert_eq!(ids, vec!["101"]);
}

#[test]
fn test_preloaded_indices_checked_against_embedder() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_all_categories(temp_dir.path());

    let store = Arc::new(IndexStore::open(temp_dir.path()));
    assert_eq!(store.preload(), Category::ALL.len());

    let mismatched = LookbookService::new(ServiceConfig::default(), store.clone())
        .with_embedder(Arc::new(HashingEmbedder::new(DIM / 2).unwrap()));
    assert!(matches!(mismatched.check_indices(), Err(Error::IndexMismatch(_))));

    let matched = LookbookService::new(ServiceConfig::default(), store)
        .with_embedder(Arc::new(HashingEmbedder::new(DIM).unwrap()));
    matched.check_indices().unwrap();
}
