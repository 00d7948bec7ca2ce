//! Integration tests for the Redis-backed datasets.
//!
//! Everything runs against `MemoryRedis`, which answers the same commands a
//! real server would and counts round trips, so the tests are deterministic
//! and need no network.

use std::sync::Arc;

use serde_json::{json, Value};
use upstash_dataset::{
    Dataset, DatasetError, DecimalIds, Fallible, MemoryRedis, ReadOptions, RemoteDataset,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// List `l` holding `["test", "asd", "lorem"]`, built with LPUSH.
fn comments() -> Arc<MemoryRedis> {
    let redis = Arc::new(MemoryRedis::new());
    redis.lpush("l", ["lorem", "asd", "test"]).unwrap();
    redis
}

// ────────────────────────────────────────────────────────────────────────────
// Lists
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn list_single_and_batch_reads() {
    init_logging();
    let ds = RemoteDataset::redis_list(comments(), "l");

    assert_eq!(ds.len().unwrap(), 3);
    assert_eq!(ds.get(0).unwrap(), "test");
    assert_eq!(ds.get(2).unwrap(), "lorem");
    assert_eq!(ds.get_many(&[0, 2, 1]).unwrap(), vec!["test", "lorem", "asd"]);
    assert_eq!(ds.get_many(&[1, 1, 0]).unwrap(), vec!["asd", "asd", "test"]);
    assert!(ds.get_many(&[]).unwrap().is_empty());
}

#[test]
fn list_transform_applies_on_both_paths() {
    let ds = RemoteDataset::redis_list(comments(), "l")
        .with_transform(|text: String| json!({ "text": text }));

    assert_eq!(ds.get(1).unwrap(), json!({ "text": "asd" }));
    assert_eq!(
        ds.get_many(&[2, 0]).unwrap(),
        vec![json!({ "text": "lorem" }), json!({ "text": "test" })]
    );
}

#[test]
fn list_out_of_range() {
    let ds = RemoteDataset::redis_list(comments(), "l");

    match ds.get(3) {
        Err(DatasetError::IndexOutOfRange { index, len }) => assert_eq!((index, len), (3, 3)),
        other => panic!("expected IndexOutOfRange, got {:?}", other),
    }
    assert!(ds.get_many(&[0, 7, 1]).unwrap_err().is_out_of_range());
}

#[test]
fn list_without_bounds_check_reports_missing() {
    let redis = comments();
    let ds = RemoteDataset::redis_list(redis.clone(), "l")
        .with_read_options(ReadOptions::default().check_bounds(false));

    let err = ds.get(5).unwrap_err();
    assert!(matches!(err, DatasetError::Missing { index: 5, .. }));
    assert!(err.is_out_of_range());

    // Whole batch fails, even though two of three indices exist.
    let err = ds.get_many(&[0, 9, 1]).unwrap_err();
    assert!(matches!(err, DatasetError::Missing { index: 9, .. }));
}

#[test]
fn batch_is_one_round_trip_plus_length() {
    let redis = comments();
    let ds = RemoteDataset::redis_list(redis.clone(), "l");

    let before = redis.round_trips();
    ds.get_many(&[2, 1, 0, 1, 2]).unwrap();
    assert_eq!(redis.round_trips() - before, 2);

    let unchecked = RemoteDataset::redis_list(redis.clone(), "l")
        .with_read_options(ReadOptions::default().check_bounds(false));
    let before = redis.round_trips();
    unchecked.get_many(&[2, 1, 0, 1, 2]).unwrap();
    assert_eq!(redis.round_trips() - before, 1);
}

#[test]
fn length_is_live() {
    let redis = comments();
    let ds = RemoteDataset::redis_list(redis.clone(), "l");
    assert_eq!(ds.len().unwrap(), 3);

    redis.rpush("l", ["ipsum"]).unwrap();
    assert_eq!(ds.len().unwrap(), 4);
    assert_eq!(ds.get(3).unwrap(), "ipsum");

    redis.del(&["l"]);
    assert_eq!(ds.len().unwrap(), 0);
    assert!(ds.is_empty().unwrap());
}

#[test]
fn offline_store_makes_length_unavailable() {
    let redis = comments();
    let ds = RemoteDataset::redis_list(redis.clone(), "l");
    redis.set_offline(true);

    assert!(matches!(ds.len(), Err(DatasetError::LengthUnavailable { .. })));
    assert!(matches!(ds.get(0), Err(DatasetError::LengthUnavailable { .. })));
}

#[test]
fn offline_store_fails_unchecked_reads_as_backend_error() {
    let redis = comments();
    let ds = RemoteDataset::redis_list(redis.clone(), "l")
        .with_read_options(ReadOptions::default().check_bounds(false));
    redis.set_offline(true);

    assert!(matches!(ds.get_many(&[0]), Err(DatasetError::Backend(_))));
}

#[test]
fn wrong_type_is_a_backend_error() {
    let redis = Arc::new(MemoryRedis::new());
    redis.set("l", "not a list");
    let ds = RemoteDataset::redis_list(redis, "l");
    assert!(matches!(ds.len(), Err(DatasetError::LengthUnavailable { .. })));

    let ds = ds.with_read_options(ReadOptions::default().check_bounds(false));
    assert!(matches!(ds.get(0), Err(DatasetError::Backend(_))));
    assert!(matches!(ds.get_many(&[0, 1]), Err(DatasetError::Backend(_))));
}

// ────────────────────────────────────────────────────────────────────────────
// Sorted sets
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn sorted_set_rank_order_with_scores() {
    init_logging();
    let redis = Arc::new(MemoryRedis::new());
    redis.zadd("z", [("lorem", 3.0), ("test", 1.0), ("asd", 2.0)]).unwrap();
    let ds = RemoteDataset::redis_sorted_set(redis.clone(), "z");

    assert_eq!(ds.len().unwrap(), 3);
    assert_eq!(ds.get(0).unwrap(), ("test".to_string(), 1.0));
    assert_eq!(ds.get(1).unwrap(), ("asd".to_string(), 2.0));
    assert_eq!(ds.get(2).unwrap(), ("lorem".to_string(), 3.0));
    assert_eq!(
        ds.get_many(&[0, 2, 1]).unwrap(),
        vec![
            ("test".to_string(), 1.0),
            ("lorem".to_string(), 3.0),
            ("asd".to_string(), 2.0),
        ]
    );
    assert!(ds.get(3).unwrap_err().is_out_of_range());
}

#[test]
fn sorted_set_members_only() {
    let redis = Arc::new(MemoryRedis::new());
    redis.zadd("z", [("b", 0.5), ("a", 0.5), ("c", -1.0)]).unwrap();
    let ds = RemoteDataset::redis_sorted_set(redis, "z")
        .with_transform(|(member, _score): (String, f64)| member);

    // Equal scores fall back to lexical order.
    assert_eq!(ds.get_many(&[0, 1, 2]).unwrap(), vec!["c", "a", "b"]);
}

// ────────────────────────────────────────────────────────────────────────────
// One string per key
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn string_keys_from_mapping() {
    let redis = Arc::new(MemoryRedis::new());
    for (i, word) in ["zero", "one", "two"].iter().enumerate() {
        redis.set(&format!("doc:{}", i), *word);
    }
    let ds = RemoteDataset::redis_string(redis.clone(), |i: usize| format!("doc:{}", i), || 3usize);

    assert_eq!(ds.len().unwrap(), 3);
    assert_eq!(ds.get(1).unwrap(), "one");
    assert_eq!(ds.get_many(&[2, 0]).unwrap(), vec!["two", "zero"]);
    assert!(ds.get(3).unwrap_err().is_out_of_range());

    // The caller-supplied length claims a key the store does not have.
    redis.del(&["doc:1"]);
    assert!(matches!(ds.get(1), Err(DatasetError::Missing { index: 1, .. })));
}

#[test]
fn fallible_transform_error_passes_through() {
    let redis = Arc::new(MemoryRedis::new());
    redis.set("0", "12");
    redis.set("1", "twelve");
    let ds = RemoteDataset::redis_string(redis, DecimalIds, || 2usize)
        .with_transform(Fallible(|s: String| s.parse::<u32>()));

    assert_eq!(ds.get(0).unwrap(), 12);
    let err = ds.get_many(&[0, 1]).unwrap_err();
    assert!(matches!(err, DatasetError::Transform(_)));
    assert!(err.to_string().contains("invalid digit"));
}

// ────────────────────────────────────────────────────────────────────────────
// JSON
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn json_array_at_root_and_sub_path() {
    init_logging();
    let redis = Arc::new(MemoryRedis::new());
    redis.json_set("root", "$", json!(["a", "b", "c"])).unwrap();
    redis
        .json_set("doc", "$", json!({ "meta": { "rows": [{ "x": 1 }, { "x": 2 }] } }))
        .unwrap();

    for path in ["", "$"] {
        let ds = RemoteDataset::redis_json_array(redis.clone(), "root", path).unwrap();
        assert_eq!(ds.len().unwrap(), 3);
        assert_eq!(ds.get(2).unwrap(), json!("c"));
        assert_eq!(ds.get_many(&[1, 0]).unwrap(), vec![json!("b"), json!("a")]);
    }

    let ds = RemoteDataset::redis_json_array(redis.clone(), "doc", "$.meta.rows")
        .unwrap()
        .with_transform(|v: Value| v["x"].as_i64().unwrap_or_default());
    assert_eq!(ds.len().unwrap(), 2);
    assert_eq!(ds.get_many(&[1, 0, 1]).unwrap(), vec![2, 1, 2]);
    assert!(ds.get(2).unwrap_err().is_out_of_range());
}

#[test]
fn json_array_batch_is_one_pipeline() {
    let redis = Arc::new(MemoryRedis::new());
    redis.json_set("root", "$", json!([10, 20, 30, 40])).unwrap();
    let ds = RemoteDataset::redis_json_array(redis.clone(), "root", "$")
        .unwrap()
        .with_read_options(ReadOptions::default().check_bounds(false));

    let before = redis.round_trips();
    assert_eq!(ds.get_many(&[3, 0, 2]).unwrap(), vec![json!(40), json!(10), json!(30)]);
    assert_eq!(redis.round_trips() - before, 1);
}

#[test]
fn json_array_missing_key_has_no_length() {
    let redis = Arc::new(MemoryRedis::new());
    let ds = RemoteDataset::redis_json_array(redis, "nope", "$").unwrap();
    assert!(matches!(ds.len(), Err(DatasetError::LengthUnavailable { .. })));
}

#[test]
fn json_path_is_validated_up_front() {
    let redis = Arc::new(MemoryRedis::new());
    let err = RemoteDataset::redis_json_array(redis.clone(), "k", "$..[").err();
    assert!(matches!(err, Some(DatasetError::InvalidArgument(_))));

    let err = RemoteDataset::redis_json_object(redis, DecimalIds, || 0usize, "rows").err();
    assert!(matches!(err, Some(DatasetError::InvalidArgument(_))));
}

#[test]
fn json_object_per_key_documents() {
    let redis = Arc::new(MemoryRedis::new());
    for i in 0..3 {
        let doc = json!({ "name": format!("u{}", i), "age": 20 + i });
        redis.json_set(&format!("user:{}", i), "$", doc).unwrap();
    }
    let key = |i: usize| format!("user:{}", i);

    let whole = RemoteDataset::redis_json_object(redis.clone(), key, || 3usize, "$").unwrap();
    assert_eq!(whole.get(1).unwrap(), json!({ "name": "u1", "age": 21 }));

    let names = RemoteDataset::redis_json_object(redis.clone(), key, || 3usize, "$.name").unwrap();
    assert_eq!(names.get(2).unwrap(), json!("u2"));
    assert_eq!(names.get_many(&[2, 0, 2]).unwrap(), vec![json!("u2"), json!("u0"), json!("u2")]);

    // Same path everywhere: the batch is a single JSON.MGET, and the
    // caller-supplied length costs nothing.
    let before = redis.round_trips();
    names.get_many(&[0, 1]).unwrap();
    assert_eq!(redis.round_trips() - before, 1);
}

#[test]
fn json_object_root_path_returns_whole_documents_on_both_paths() {
    let redis = Arc::new(MemoryRedis::new());
    let docs: Vec<Value> = (0..3)
        .map(|i| json!({ "id": i, "tags": ["a", "b"], "meta": { "n": i * 10 } }))
        .collect();
    for (i, doc) in docs.iter().enumerate() {
        redis.json_set(&format!("doc:{}", i), "$", doc.clone()).unwrap();
    }
    let key = |i: usize| format!("doc:{}", i);

    for path in ["", "$"] {
        let ds = RemoteDataset::redis_json_object(redis.clone(), key, || 3usize, path).unwrap();
        let batch = ds.get_many(&[2, 0]).unwrap();
        assert_eq!(batch, vec![ds.get(2).unwrap(), ds.get(0).unwrap()]);
        assert_eq!(batch, vec![docs[2].clone(), docs[0].clone()]);
    }
}

#[test]
fn json_object_single_read_uses_the_index_key() {
    let redis = Arc::new(MemoryRedis::new());
    redis.json_set("a", "$", json!({ "v": "from a" })).unwrap();
    redis.json_set("b", "$", json!({ "v": "from b" })).unwrap();
    let keys = ["a", "b"];
    let ds = RemoteDataset::redis_json_object(
        redis,
        move |i: usize| keys[i % keys.len()].to_string(),
        || 2usize,
        "$.v",
    )
    .unwrap();

    assert_eq!(ds.get(1).unwrap(), json!("from b"));
    assert_eq!(ds.get_many(&[1]).unwrap(), vec![json!("from b")]);
}

#[test]
fn json_object_missing_document() {
    let redis = Arc::new(MemoryRedis::new());
    redis.json_set("0", "$", json!({ "v": 1 })).unwrap();
    redis.json_set("2", "$", json!({ "w": 1 })).unwrap();
    let ds = RemoteDataset::redis_json_object(redis, DecimalIds, || 3usize, "$.v")
        .unwrap();

    assert_eq!(ds.get(0).unwrap(), json!(1));
    assert!(matches!(ds.get(1), Err(DatasetError::Missing { index: 1, .. })));
    // Document exists, path does not match.
    assert!(matches!(ds.get_many(&[0, 2]), Err(DatasetError::Missing { index: 2, .. })));
}
