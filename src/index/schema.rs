//! Index schema shared by every course index

use tantivy::schema::{Field, Schema, STORED, STRING, TEXT};

/// Handles to the fields of a course index
#[derive(Debug, Clone, Copy)]
pub(crate) struct IndexFields {
    /// Untokenized, so a URL can be deleted by exact term
    pub url: Field,
    pub title: Field,
    pub content: Field,
    /// Unix timestamp of the crawl that produced the document
    pub indexed_at: Field,
}

/// Builds the schema and returns it with its field handles
pub(crate) fn build_schema() -> (Schema, IndexFields) {
    let mut builder = Schema::builder();
    let fields = IndexFields {
        url: builder.add_text_field("url", STRING | STORED),
        title: builder.add_text_field("title", TEXT | STORED),
        content: builder.add_text_field("content", TEXT | STORED),
        indexed_at: builder.add_i64_field("indexed_at", STORED),
    };
    (builder.build(), fields)
}
