// Retrieval and query-path benchmarks
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lookbook_core::{
    Category, CategoryIndex, Distance, Exclusions, ExclusionFilter, ItemId, ItemRecord, Vector,
};
use lookbook_engine::{Embedder, HashingEmbedder, LookbookService, RetrievalEngine, ServiceConfig};
use lookbook_storage::IndexStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

const DIM: usize = 256;
const FITS: [&str; 4] = ["slim", "regular", "oversized", "wide"];
const PATTERNS: [&str; 4] = ["solid", "stripe", "check", "logo"];

fn generate_random_vector(rng: &mut StdRng, dim: usize) -> Vector {
    let data: Vec<f32> = (0..dim).map(|_| rng.random_range(-1.0f32..1.0f32)).collect();
    Vector::new(data)
}

fn generate_index(category: Category, size: usize) -> CategoryIndex {
    let mut rng = StdRng::seed_from_u64(42);
    let mut items = Vec::with_capacity(size);
    let mut vectors = Vec::with_capacity(size);
    for i in 0..size as u64 {
        let item = ItemRecord::new(i)
            .with_name(format!("item {}", i))
            .with_description(format!("catalog item number {}", i))
            .with_fit(FITS[rng.random_range(0..FITS.len())])
            .with_pattern(PATTERNS[rng.random_range(0..PATTERNS.len())])
            .with_price(rng.random_range(10_000..200_000));
        vectors.push((ItemId::from(i), generate_random_vector(&mut rng, DIM)));
        items.push(item);
    }
    CategoryIndex::new(category, Distance::Cosine, DIM, items, vectors).unwrap()
}

fn benchmark_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank");
    let mut rng = StdRng::seed_from_u64(7);
    let query = generate_random_vector(&mut rng, DIM);
    let filter = Exclusions::new(["slim"], ["check"], Some(120_000)).to_filter();

    for size in [1_000, 10_000, 50_000].iter() {
        let index = generate_index(Category::Top, *size);
        group.bench_with_input(BenchmarkId::new("filtered", size), size, |b, _| {
            b.iter(|| {
                let results = RetrievalEngine::rank(&index, black_box(&query), &filter, 5).unwrap();
                black_box(results);
            });
        });
        group.bench_with_input(BenchmarkId::new("unfiltered", size), size, |b, _| {
            let filter = ExclusionFilter::default();
            b.iter(|| {
                let results = RetrievalEngine::rank(&index, black_box(&query), &filter, 5).unwrap();
                black_box(results);
            });
        });
    }

    group.finish();
}

fn benchmark_embed(c: &mut Criterion) {
    let embedder = HashingEmbedder::default();
    let text = "street casual oversized logo graphic saturday cafe weekend black logo hoodie wide cargo pants";

    c.bench_function("hashing_embed", |b| {
        b.iter(|| black_box(embedder.embed(black_box(text)).unwrap()));
    });
}

fn benchmark_recommend(c: &mut Criterion) {
    let store = Arc::new(IndexStore::open(std::env::temp_dir().join("lookbook-bench-unused")));
    store.insert(generate_index(Category::Top, 10_000));
    let service = LookbookService::new(ServiceConfig::default(), store);
    service.set_persona("bench", "street").unwrap();
    service.add_context("bench", "saturday, cafe, weekend").unwrap();

    c.bench_function("recommend_10k", |b| {
        b.iter(|| black_box(service.recommend("bench").unwrap()));
    });
}

criterion_group!(benches, benchmark_rank, benchmark_embed, benchmark_recommend);
criterion_main!(benches);
