use academic_trivia::dedup::simhash::simhash64;
use academic_trivia::dedup::{Deduplicator, NearDuplicateIndex};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const SENTENCE: &str = "This course covers classical mechanics, including Newton's laws of motion and energy conservation, taught over a 14-week semester.";

fn sentences(nb: usize) -> Vec<String> {
    (0..nb)
        .map(|i| {
            format!(
                "Sample {} of the corpus mentions topic {} alongside reference {} and page {}.",
                i,
                i * 7919 % 1013,
                i * 104_729 % 4099,
                i % 97
            )
        })
        .collect()
}

fn fingerprint(c: &mut Criterion) {
    c.bench_function("simhash64", |b| b.iter(|| simhash64(black_box(SENTENCE))));
}

fn query(c: &mut Criterion) {
    let mut index = NearDuplicateIndex::default();
    for s in sentences(10_000) {
        index.add(simhash64(&s));
    }
    let fp = simhash64(SENTENCE);
    c.bench_function("query_candidates 10k", |b| {
        b.iter(|| index.query_candidates(black_box(fp)))
    });
}

fn check_and_insert(c: &mut Criterion) {
    let batch = sentences(1_000);
    c.bench_function("check_and_insert 1k", |b| {
        b.iter(|| {
            let mut dedup = Deduplicator::default();
            for s in &batch {
                let _ = dedup.check_and_insert(black_box(s));
            }
        })
    });
}

criterion_group!(benches, fingerprint, query, check_and_insert);
criterion_main!(benches);
