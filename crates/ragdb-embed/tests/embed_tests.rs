use ragdb_core::traits::Embedder;
use ragdb_embed::{probe_dimension, FakeEmbedder};

#[tokio::test]
async fn fake_embedder_shapes_and_determinism() {
    let embedder = FakeEmbedder::default();
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).await.expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 768, "embedding dim matches nomic-embed-text");

    // Norm approximately 1.0
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Deterministic for same input
    for (a, b) in v1.iter().zip(v2.iter()) {
        assert!((a - b).abs() <= 1e-6);
    }
}

#[tokio::test]
async fn fake_embedder_distinguishes_texts() {
    let embedder = FakeEmbedder::new(64);
    let a = embedder.embed("lithium battery cathode").await.unwrap();
    let b = embedder.embed("retrieval augmented generation").await.unwrap();
    assert_ne!(a, b, "different texts map to different vectors");
}

#[tokio::test]
async fn probe_reports_configured_dimension() {
    let embedder = FakeEmbedder::new(96);
    let dim = probe_dimension(&embedder).await.expect("probe");
    assert_eq!(dim, 96);
}
