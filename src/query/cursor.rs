use bson::Document as BsonDocument;
use std::fmt;

/// A forward-only cursor over query results.
///
/// Stores decide how lazily rows are produced; a cursor only promises each row once.
pub struct Cursor {
    inner: Box<dyn Iterator<Item = BsonDocument> + Send>,
    pos: usize,
}

impl Cursor {
    pub fn new(inner: impl Iterator<Item = BsonDocument> + Send + 'static) -> Self {
        Self { inner: Box::new(inner), pos: 0 }
    }

    /// A cursor over already materialized rows.
    #[must_use]
    pub fn from_docs(docs: Vec<BsonDocument>) -> Self {
        Self::new(docs.into_iter())
    }

    pub fn advance(&mut self) -> Option<BsonDocument> {
        let d = self.inner.next()?;
        self.pos += 1;
        Some(d)
    }

    /// Number of rows yielded so far.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub fn to_vec(self) -> Vec<BsonDocument> {
        self.collect()
    }
}

impl Iterator for Cursor {
    type Item = BsonDocument;
    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor").field("pos", &self.pos).finish_non_exhaustive()
    }
}
