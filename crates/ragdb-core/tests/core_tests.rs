use std::fs;

use tempfile::TempDir;

use ragdb_core::data_processor::{count_tokens, DataProcessor};
use ragdb_core::types::{ContentKind, Document};

#[test]
fn process_directory_single_small_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("scattering.txt"), "The sky is blue because of Rayleigh scattering.\n").unwrap();

    let processor = DataProcessor::new();
    let docs = processor.process_directory(dir).expect("process");

    assert_eq!(docs.len(), 1, "one small paragraph becomes one document");
    let doc = &docs[0];
    assert_eq!(doc.content, "The sky is blue because of Rayleigh scattering.");
    assert_eq!(doc.title.as_deref(), Some("scattering"));
    assert_eq!(doc.metadata.filename.as_deref(), Some("scattering.txt"));
    assert_eq!(doc.kind, ContentKind::Text);
    assert!(doc.token_count > 0);
}

#[test]
fn long_paragraph_is_windowed_with_overlap() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    // 600 distinct words, far above the 500-token default
    let long: Vec<String> = (0..600).map(|i| format!("word{i}")).collect();
    fs::write(dir.join("long.txt"), long.join(" ")).unwrap();

    let processor = DataProcessor::new();
    let docs = processor.process_directory(dir).expect("process");

    assert!(docs.len() >= 2, "long paragraph splits into windows");
    // Overlap: the second window starts before the first one ended
    let first_last_word = docs[0].content.split_whitespace().last().unwrap();
    assert!(
        docs[1].content.split_whitespace().any(|w| w == first_last_word),
        "adjacent windows share overlapping words"
    );
}

#[test]
fn prepared_json_documents_keep_their_kinds() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    let json = r#"[
        {"content": "figure of merit", "content_type": "image",
         "metadata": {"caption": "Figure 3", "image_text": "axes"}},
        {"content": "comparison of approaches", "content_type": "table",
         "table_html": "<table></table>", "token_count": 7},
        {"title": "Battery cell", "content": "a lithium battery", "content_type": "text"}
    ]"#;
    fs::write(dir.join("chunks.json"), json).unwrap();

    let processor = DataProcessor::new();
    let docs = processor.process_directory(dir).expect("process");

    assert_eq!(docs.len(), 3);
    assert_eq!(docs[0].kind, ContentKind::Image { base64_image: None });
    assert_eq!(docs[0].metadata.caption.as_deref(), Some("Figure 3"));
    assert!(docs[0].token_count > 0, "missing token counts are recomputed");
    assert_eq!(docs[1].kind, ContentKind::Table { table_html: Some("<table></table>".into()) });
    assert_eq!(docs[1].token_count, 7, "explicit token counts survive");
    assert_eq!(docs[2].title.as_deref(), Some("Battery cell"));
}

#[test]
fn document_wire_shape_round_trips() {
    let mut doc = Document::text("hello").with_title("greeting");
    doc.token_count = 2;

    let value = serde_json::to_value(&doc).unwrap();
    assert_eq!(value["content_type"], "text");
    assert_eq!(value["content"], "hello");
    assert!(value.get("embedding").is_none(), "unset embedding is omitted");
    assert!(value.get("metadata").is_none(), "empty metadata is omitted");

    let back: Document = serde_json::from_value(value).unwrap();
    assert_eq!(back, doc);
}

#[test]
fn token_count_heuristic_scales_with_words() {
    assert_eq!(count_tokens(""), 0);
    assert_eq!(count_tokens("one two three"), 4); // 3 words / 0.75
    assert!(count_tokens("a b c d e f") > count_tokens("a b c"));
}
