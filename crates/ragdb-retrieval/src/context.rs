//! Context block formatting, the contract exposed to the generation layer.

use ragdb_core::types::SearchHit;

/// Render ranked hits as labeled context blocks for a language-model
/// prompt: `[Document i - content_type]`, an optional caption line, then
/// the content, with `---` separators between documents.
#[must_use]
pub fn format_context(hits: &[SearchHit]) -> String {
    let mut blocks = Vec::with_capacity(hits.len());
    for (i, hit) in hits.iter().enumerate() {
        let mut block = format!("[Document {} - {}]", i + 1, hit.document.kind.label());
        if let Some(caption) = hit.document.metadata.caption.as_deref() {
            if !caption.is_empty() {
                block.push_str("\nCaption: ");
                block.push_str(caption);
            }
        }
        block.push('\n');
        block.push_str(&hit.document.content);
        blocks.push(block);
    }
    blocks.join("\n\n---\n\n")
}
