//! Translation from the typed query model to the engine's search DSL.

use ragdb_core::types::SearchQuery;
use serde_json::{json, Value};

/// Field holding the searchable text of every document.
pub(crate) const TEXT_FIELD: &str = "content";
/// Field holding the knn vector.
pub(crate) const EMBEDDING_FIELD: &str = "embedding";

pub(crate) fn clause(query: &SearchQuery) -> Value {
    match query {
        SearchQuery::Match { text } => json!({
            "match": { TEXT_FIELD: text }
        }),
        SearchQuery::Knn { vector, k } => json!({
            "knn": { EMBEDDING_FIELD: { "vector": vector, "k": k } }
        }),
        SearchQuery::Should(clauses) => {
            let shoulds: Vec<Value> = clauses.iter().map(clause).collect();
            json!({ "bool": { "should": shoulds } })
        }
    }
}

/// Full search body: query, result size, and `_source` without the vector
/// payload (hits never need it back).
pub(crate) fn search_body(query: &SearchQuery, top_k: usize) -> Value {
    json!({
        "size": top_k,
        "query": clause(query),
        "_source": { "excludes": [EMBEDDING_FIELD] },
    })
}

/// Index schema: text fields for matching, keyword fields for filtering,
/// a knn vector locked to the embedder's dimension, and stored-but-unindexed
/// payloads for image and table documents.
pub(crate) fn index_mappings(dimension: usize) -> Value {
    json!({
        "mappings": {
            "properties": {
                "title": { "type": "text" },
                "content": { "type": "text" },
                "content_type": { "type": "keyword" },
                "token_count": { "type": "integer" },
                "embedding": { "type": "knn_vector", "dimension": dimension },
                "base64_image": { "type": "binary", "doc_values": false, "index": false },
                "table_html": { "type": "text", "index": false },
                "metadata": {
                    "properties": {
                        "filename": { "type": "keyword" },
                        "caption": { "type": "text" },
                        "image_text": { "type": "text" }
                    }
                }
            }
        },
        "settings": {
            "index": {
                "knn": true,
                "knn.space_type": "cosinesimil"
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_clause_targets_content_field() {
        let q = SearchQuery::Match { text: "Compare RAG v/s fine-tuning".to_string() };
        assert_eq!(
            clause(&q),
            json!({ "match": { "content": "Compare RAG v/s fine-tuning" } })
        );
    }

    #[test]
    fn knn_clause_carries_vector_and_k() {
        let q = SearchQuery::Knn { vector: vec![0.1, 0.2], k: 5 };
        assert_eq!(
            clause(&q),
            json!({ "knn": { "embedding": { "vector": [0.1, 0.2], "k": 5 } } })
        );
    }

    #[test]
    fn hybrid_should_wraps_both_clauses() {
        let q = SearchQuery::Should(vec![
            SearchQuery::Knn { vector: vec![0.5], k: 10 },
            SearchQuery::Match { text: "rag".to_string() },
        ]);
        let body = clause(&q);
        let shoulds = body["bool"]["should"].as_array().expect("should array");
        assert_eq!(shoulds.len(), 2);
        assert!(shoulds[0]["knn"].is_object());
        assert!(shoulds[1]["match"].is_object());
    }

    #[test]
    fn search_body_sets_size_and_excludes_vector() {
        let body = search_body(&SearchQuery::Match { text: "rag".to_string() }, 10);
        assert_eq!(body["size"], json!(10));
        assert_eq!(body["_source"]["excludes"], json!(["embedding"]));
        assert!(body["query"]["match"].is_object());
    }

    #[test]
    fn mappings_lock_vector_dimension() {
        let mappings = index_mappings(768);
        assert_eq!(mappings["mappings"]["properties"]["embedding"]["dimension"], json!(768));
        assert_eq!(mappings["mappings"]["properties"]["embedding"]["type"], json!("knn_vector"));
        assert_eq!(mappings["settings"]["index"]["knn"], json!(true));
        assert_eq!(mappings["settings"]["index"]["knn.space_type"], json!("cosinesimil"));
    }
}
