// Demo: training-style access over Redis lists and sorted sets
//
// Fills an in-process store, then reads it the way a training loop would:
// shuffled batches, a seeded train/validation split, and a concatenation
// of two store layouts behind one index space.
//
// Run with RUST_LOG=debug to see one pipeline per batch.

use std::sync::Arc;

use anyhow::Result;
use serde_json::json;
use upstash_dataset::data_loader::ShuffleSampler;
use upstash_dataset::{
    random_split, split_lengths, ConcatDataset, Dataset, MemoryRedis, RemoteDataset,
};

fn main() -> Result<()> {
    env_logger::init();

    let redis = Arc::new(MemoryRedis::new());
    redis.rpush(
        "comments",
        ["great product", "arrived broken", "would buy again", "meh", "five stars", "refunded"],
    )?;
    redis.zadd("leaderboard", [("alice", 31.0), ("bob", 12.5), ("carol", 27.0)])?;

    // Samples become {"text": ...} records on both the single and batch paths.
    let comments = RemoteDataset::redis_list(redis.clone(), "comments")
        .with_transform(|text: String| json!({ "text": text }));
    println!("comments: {} samples", comments.len()?);
    println!("comments[1] = {}", comments.get(1)?);

    // One shuffled epoch in batches of 4.
    let order: Vec<usize> = ShuffleSampler::new(comments.len()?, 42).collect();
    for (n, batch) in order.chunks(4).enumerate() {
        println!("batch {} {:?}: {:?}", n, batch, comments.get_many(batch)?);
    }

    // 2/3 train, 1/3 validation, reproducible.
    let comments = Arc::new(comments);
    let lens = split_lengths(comments.len()?, &[2.0 / 3.0, 1.0 / 3.0])?;
    let parts = random_split(comments.clone(), &lens, 7)?;
    for (name, part) in ["train", "valid"].iter().zip(&parts) {
        println!("{}: indices {:?}", name, part.indices());
    }

    // Sorted-set members in rank order, appended after the raw list.
    let raw = RemoteDataset::redis_list(redis.clone(), "comments");
    let ranked = RemoteDataset::redis_sorted_set(redis.clone(), "leaderboard")
        .with_transform(|(member, score): (String, f64)| format!("{} ({})", member, score));
    let all = ConcatDataset::default().with(raw).with(ranked);
    println!("concat of {} parts, {} samples", all.num_parts(), all.len()?);
    println!("last three: {:?}", all.get_many(&[6, 7, 8])?);

    println!("{} round trips in total", redis.round_trips());
    Ok(())
}
