// Demo: a vector-index namespace as a dataset
//
// Records are addressed by id; here sample `i` is the record "doc-i". One
// fetch serves a whole batch, and the fetch options pick which fields come
// back.

use std::sync::Arc;

use anyhow::Result;
use serde_json::json;
use upstash_dataset::{Dataset, FetchOptions, FetchResult, MemoryVectorIndex, RemoteDataset};

fn main() -> Result<()> {
    env_logger::init();

    let index = Arc::new(MemoryVectorIndex::new());
    index.upsert(
        "articles",
        (0..8).map(|i| {
            let angle = i as f32 / 8.0 * std::f32::consts::TAU;
            FetchResult::new(format!("doc-{}", i))
                .with_vector(vec![angle.cos(), angle.sin()])
                .with_metadata(json!({ "label": i % 3 }))
                .with_data(format!("article body {}", i))
        }),
    );

    let info = serde_json::to_string_pretty(&upstash_dataset::VectorIndex::info(&*index)?)?;
    println!("index info:\n{}", info);

    // (vector, label) pairs for training.
    let ds = RemoteDataset::vector(index.clone(), "articles", |i: usize| format!("doc-{}", i))
        .with_transform(|r: FetchResult| {
            let label = r.metadata.as_ref().and_then(|m| m["label"].as_u64()).unwrap_or(0);
            (r.vector.unwrap_or_default(), label)
        });
    println!("{} samples", ds.len()?);
    for (i, (vector, label)) in [5, 0, 3].into_iter().zip(ds.get_many(&[5, 0, 3])?) {
        println!("sample {}: label {} vector {:?}", i, label, vector);
    }

    // Raw text only, no vectors on the wire.
    let texts = RemoteDataset::vector(index.clone(), "articles", |i: usize| format!("doc-{}", i))
        .with_fetch_options(
            FetchOptions::default()
                .include_vectors(false)
                .include_metadata(false)
                .include_data(true),
        )
        .with_transform(|r: FetchResult| r.data.unwrap_or_default());
    println!("texts: {:?}", texts.get_many(&[7, 7, 1])?);

    println!("{} round trips in total", index.round_trips());
    Ok(())
}
