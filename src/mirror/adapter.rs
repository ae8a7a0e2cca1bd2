use std::collections::HashMap;
use crate::core::error::Result;
use crate::core::types::DocId;

/// Relational store holding the authoritative row data, used to
/// verify `LIKE` wildcard semantics over the top ranked candidates.
///
/// Adapters are pooled by their own layer; the core holds a
/// connection only for the duration of one call. Identifiers are
/// quoted literally into the statement, no parameter binding is
/// assumed.
pub trait MirrorAdapter: Send + Sync {
    /// Run a statement returning a single integer column.
    fn query_ids(&self, sql: &str) -> Result<Vec<i64>>;
}

/// Double embedded single quotes for literal inclusion in SQL.
pub fn escape_sql_literal(text: &str) -> String {
    text.replace('\'', "''")
}

/// Bidirectional `doc_id ↔ external_id` translation for mirrors whose
/// id column is a replacement field. Process-wide, shared read-only.
#[derive(Debug, Default)]
pub struct DocIdMapper {
    to_external: HashMap<u32, i64>,
    to_doc: HashMap<i64, u32>,
}

impl DocIdMapper {
    pub fn new(pairs: impl IntoIterator<Item = (DocId, i64)>) -> Self {
        let mut mapper = DocIdMapper::default();
        for (doc_id, external) in pairs {
            mapper.to_external.insert(doc_id.0, external);
            mapper.to_doc.insert(external, doc_id.0);
        }
        mapper
    }

    pub fn external_of(&self, doc_id: DocId) -> Option<i64> {
        self.to_external.get(&doc_id.0).copied()
    }

    pub fn doc_of(&self, external: i64) -> Option<DocId> {
        self.to_doc.get(&external).map(|&id| DocId(id))
    }

    pub fn len(&self) -> usize {
        self.to_external.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_external.is_empty()
    }
}
