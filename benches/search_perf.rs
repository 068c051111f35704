use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::collections::HashMap;
use std::hint::black_box;

use spot_search::model::{
    Embedding, FeatureTable, ImagePayload, Modality, ModalityWeights, ScoredSpot, SpotEntry,
};
use spot_search::providers::offline::{ByteHistogramImageEmbedder, FnvTextEmbedder};
use spot_search::search::fusion::fuse_rankings;
use spot_search::search::keywords::{KeywordExtractor, UnicodeKeywordExtractor};
use spot_search::search::location_filter::filter_by_location;
use spot_search::search::ranker::{cosine_similarity, rank_by_similarity};

const DIMENSION: usize = 384;

const REGIONS: [&str; 8] = [
    "Kyoto", "Osaka", "Nara", "Tokyo", "Hakone", "Nikko", "Kanazawa", "Sapporo",
];

// =============================================================================
// Offline Embedder Benchmarks
// =============================================================================

/// Benchmark the FNV text embedder on 1000 short queries.
/// Target: <1ms per query
fn bench_fnv_embed_1000_queries(c: &mut Criterion) {
    let embedder = FnvTextEmbedder::default();
    let queries: Vec<String> = (0..1000)
        .map(|i| format!("quiet riverside temple number {i} with moss gardens and autumn maples"))
        .collect();

    c.bench_function("fnv_embed_1000_queries", |b| {
        b.iter(|| {
            for query in &queries {
                black_box(embedder.embed_sync(query));
            }
        })
    });
}

/// Benchmark the byte-histogram embedder on a 256KB payload, roughly a
/// thumbnail-sized upload.
fn bench_byte_histogram_256kb(c: &mut Criterion) {
    let embedder = ByteHistogramImageEmbedder::default();
    let bytes: Vec<u8> = (0..256 * 1024).map(|i| (i % 251) as u8).collect();
    let payload = ImagePayload::new(bytes);

    c.bench_function("byte_histogram_256kb", |b| {
        b.iter(|| black_box(embedder.embed_sync(black_box(&payload))))
    });
}

// =============================================================================
// Keyword Extraction Benchmarks
// =============================================================================

/// Benchmark extraction over mixed Latin/CJK text, the worst case because
/// CJK runs also emit bigram windows.
fn bench_extract_keywords_mixed_script(c: &mut Criterion) {
    let extractor = UnicodeKeywordExtractor;
    let text: String = (0..20)
        .map(|_| "quiet temple gardens near 京都駅 with 紅葉 views and open-air 温泉 baths ")
        .collect();

    c.bench_function("extract_keywords_mixed_script", |b| {
        b.iter(|| black_box(extractor.extract(black_box(&text))))
    });
}

// =============================================================================
// Location Filter Benchmarks
// =============================================================================

/// Benchmark the keyword filter over a 1000-spot catalog; the keyword list
/// hits one region in eight.
fn bench_location_filter_1000_spots(c: &mut Criterion) {
    let spots = build_spots(1000);
    let keywords = vec![
        "Kyoto".to_string(),
        "temple".to_string(),
        "gardens".to_string(),
    ];

    c.bench_function("location_filter_1000_spots", |b| {
        b.iter(|| black_box(filter_by_location(black_box(&keywords), black_box(&spots))))
    });
}

// =============================================================================
// Ranking Benchmarks
// =============================================================================

/// Benchmark one cosine similarity at the production dimension.
fn bench_cosine_384(c: &mut Criterion) {
    let a = build_query(DIMENSION);
    let b_vec = build_vector(7, DIMENSION);

    c.bench_function("cosine_384", |b| {
        b.iter(|| black_box(cosine_similarity(black_box(a.as_slice()), black_box(&b_vec))))
    });
}

/// Benchmark similarity ranking over 1000 candidates.
/// Target: <5ms
fn bench_rank_1000_spots(c: &mut Criterion) {
    let spots = build_spots(1000);
    let features = build_features(1000, DIMENSION);
    let query = build_query(DIMENSION);

    c.bench_function("rank_1000_spots", |b| {
        b.iter(|| {
            let ranked = rank_by_similarity(black_box(&spots), black_box(&query), &features)
                .unwrap_or_default();
            black_box(ranked)
        })
    });
}

/// Parameterized ranking benchmark across catalog sizes.
fn bench_rank_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank_scaling");

    for size in [100, 500, 1_000, 5_000] {
        let spots = build_spots(size);
        let features = build_features(size, DIMENSION);
        let query = build_query(DIMENSION);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let ranked = rank_by_similarity(black_box(&spots), black_box(&query), &features)
                    .unwrap_or_default();
                black_box(ranked)
            });
        });
    }
    group.finish();
}

// =============================================================================
// Fusion Benchmarks
// =============================================================================

/// Benchmark weighted fusion with 500 entries per modality and 50% id
/// overlap between the two rankings.
fn bench_fusion_500_overlapping(c: &mut Criterion) {
    let text = build_scored(0, 500);
    let image = build_scored(250, 500);
    let weights = ModalityWeights::from_text_weight(0.5);

    c.bench_function("fusion_500_overlapping", |b| {
        b.iter(|| {
            let fused = fuse_rankings(black_box(&text), black_box(&image), weights);
            black_box(fused)
        })
    });
}

// =============================================================================
// Synthetic data builders
// =============================================================================

fn build_spots(count: usize) -> Vec<SpotEntry> {
    (0..count)
        .map(|idx| SpotEntry {
            id: format!("spot_{idx:05}"),
            name: format!("Spot {idx}"),
            location: REGIONS[idx % REGIONS.len()].to_string(),
            extra: serde_json::Map::new(),
        })
        .collect()
}

fn build_vector(seed: usize, dimension: usize) -> Vec<f32> {
    (0..dimension)
        .map(|d| ((seed + d * 31) % 997) as f32 / 997.0)
        .collect()
}

fn build_features(count: usize, dimension: usize) -> FeatureTable {
    let mut vectors = HashMap::with_capacity(count);
    for idx in 0..count {
        vectors.insert(format!("spot_{idx:05}"), build_vector(idx, dimension));
    }
    FeatureTable::from_vectors(Modality::Text, vectors).unwrap()
}

fn build_query(dimension: usize) -> Embedding {
    Embedding::new((0..dimension).map(|d| (d % 17) as f32 / 17.0).collect())
}

fn build_scored(start: usize, count: usize) -> Vec<ScoredSpot> {
    (start..start + count)
        .map(|idx| ScoredSpot {
            id: format!("spot_{idx:05}"),
            similarity: 1.0 - 0.001 * (idx - start) as f32,
            name: Some(format!("Spot {idx}")),
            location: Some(REGIONS[idx % REGIONS.len()].to_string()),
        })
        .collect()
}

criterion_group!(
    benches,
    // Offline embedder benchmarks
    bench_fnv_embed_1000_queries,
    bench_byte_histogram_256kb,
    // Keyword extraction benchmarks
    bench_extract_keywords_mixed_script,
    // Location filter benchmarks
    bench_location_filter_1000_spots,
    // Ranking benchmarks
    bench_cosine_384,
    bench_rank_1000_spots,
    bench_rank_scaling,
    // Fusion benchmarks
    bench_fusion_500_overlapping,
);
criterion_main!(benches);
