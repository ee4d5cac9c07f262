use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use anytime_index::codec::{self, Codec};
use anytime_index::query;

fn criterion_benchmark(c: &mut Criterion) {
    const DOCUMENTS: u32 = 1_000_000;
    const POSTINGS: usize = 50_000;

    let mut rng = StdRng::seed_from_u64(100);

    // A postings segment of sorted document ids, delta-encoded
    let mut ids: Vec<u32> = (0..POSTINGS)
        .map(|_| rng.gen_range(0..DOCUMENTS))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    let mut deltas = Vec::with_capacity(ids.len());
    let mut previous = 0;
    for &id in &ids {
        deltas.push(id - previous);
        previous = id;
    }

    let primary_keys: Arc<Vec<String>> =
        Arc::new((0..DOCUMENTS).map(|i| format!("doc-{}", i)).collect());

    for codec_name in ["none", "vbyte", "simdbp"] {
        let codec = codec::get_by_name(codec_name);
        let mut compressed = Vec::new();
        codec.encode(&mut compressed, &deltas);

        for strategy in ["simple", "1d_heap", "2d_heap", "blockmax"] {
            let mut query = query::get_by_name::<u16>(strategy, Arc::clone(&codec));
            query
                .init(Arc::clone(&primary_keys), DOCUMENTS, 10, 0)
                .expect("Error while initialising the query");

            c.bench_function(&format!("{}/{}", strategy, codec_name), |b| {
                b.iter(|| {
                    query.rewind(0, 1, u16::MAX);
                    let _ = query
                        .decode_and_process(3, deltas.len(), &compressed)
                        .expect("Error while processing");
                    query.sort();
                })
            });
        }
    }
}

criterion_group! {
    name = benches;
    config = Criterion::default().significance_level(0.1).sample_size(50);
    targets = criterion_benchmark
}
criterion_main!(benches);
