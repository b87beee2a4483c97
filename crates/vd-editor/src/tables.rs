//! Data-table collaborator boundary.
//!
//! Tables are owned outside the document. Nodes only remember a table's ID
//! (`Node::data_source_id`); rows are copied into the node when bound.

use std::collections::HashMap;
use vd_core::Row;

/// Read access to externally owned data tables.
pub trait TableStore {
    fn table_by_id(&self, id: &str) -> Option<Vec<Row>>;
}

/// In-memory table store.
#[derive(Debug, Clone, Default)]
pub struct MemoryTables {
    tables: HashMap<String, Vec<Row>>,
}

impl MemoryTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, rows: Vec<Row>) {
        self.tables.insert(id.into(), rows);
    }
}

impl TableStore for MemoryTables {
    fn table_by_id(&self, id: &str) -> Option<Vec<Row>> {
        self.tables.get(id).cloned()
    }
}
