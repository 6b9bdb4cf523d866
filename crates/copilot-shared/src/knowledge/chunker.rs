//! Word-boundary chunking with overlap.

use super::loader::Document;

/// A retrievable slice of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// `<document id>#<n>`
    pub id: String,
    pub source_id: String,
    pub text: String,
}

/// Split a document into windows of at most `chunk_size` characters.
///
/// Windows break on whitespace; a single word longer than the window becomes
/// its own chunk. Consecutive chunks share up to `overlap` characters of
/// trailing words.
pub fn chunk_document(doc: &Document, chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    let chunk_size = chunk_size.max(1);
    let words: Vec<&str> = doc.text.split_whitespace().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < words.len() {
        let mut end = start;
        let mut len = 0;
        while end < words.len() {
            let add = words[end].chars().count() + usize::from(end > start);
            if end > start && len + add > chunk_size {
                break;
            }
            len += add;
            end += 1;
        }

        chunks.push(Chunk {
            id: format!("{}#{}", doc.id, chunks.len()),
            source_id: doc.source_id.clone(),
            text: words[start..end].join(" "),
        });

        if end >= words.len() {
            break;
        }

        // Walk back over trailing words for the overlap, always moving forward
        let mut next = end;
        let mut carried = 0;
        while next > start + 1 {
            let w = words[next - 1].chars().count() + 1;
            if carried + w > overlap {
                break;
            }
            carried += w;
            next -= 1;
        }
        start = next;
    }

    chunks
}
