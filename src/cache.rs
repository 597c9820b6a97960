use crate::db::QueryResult;

/// Single-slot cache for the most recent query result. Last write wins; no
/// history. The empty state ("nothing queried yet") is distinct from a
/// cached zero-row result, which is a perfectly valid thing to hold.
#[derive(Debug, Default)]
pub struct ResultCache {
    slot: Option<QueryResult>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, result: QueryResult) {
        self.slot = Some(result);
    }

    pub fn current(&self) -> Option<&QueryResult> {
        self.slot.as_ref()
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}
