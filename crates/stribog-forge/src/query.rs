//! Record lookup and search.

use stribog_common::Guid;

use crate::structs::RecordDefinition;
use crate::DataForge;

/// Search hit with the record's resolved names.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct RecordSummary {
    /// Resolved record name.
    pub name: String,
    /// Resolved source file path.
    pub file_path: String,
    /// Record identifier.
    pub guid: Guid,
    /// Name of the record's struct type.
    pub struct_type: String,
}

impl DataForge {
    /// Record by table index.
    #[inline]
    pub fn record(&self, index: usize) -> Option<&RecordDefinition> {
        self.records().get(index)
    }

    /// Record by GUID.
    pub fn record_by_guid(&self, guid: &Guid) -> Option<&RecordDefinition> {
        self.record_index_by_guid(guid)
            .and_then(|index| self.records().get(index))
    }

    /// Case-insensitive substring search over resolved record names, in
    /// table order, stopping at `limit` hits.
    pub fn search_records(&self, pattern: &str, limit: usize) -> Vec<RecordSummary> {
        let needle = pattern.to_ascii_lowercase();
        let mut hits = Vec::new();

        for record in self.records() {
            if hits.len() >= limit {
                break;
            }
            let Some(name) = self.record_name(record) else {
                continue;
            };
            if !name.to_ascii_lowercase().contains(&needle) {
                continue;
            }
            hits.push(self.summarize(record, name));
        }

        hits
    }

    /// All resolvable struct type names, in definition order.
    pub fn type_names(&self) -> Vec<&str> {
        (0..self.struct_definitions().len())
            .filter_map(|index| self.struct_name(index))
            .collect()
    }

    fn summarize(&self, record: &RecordDefinition, name: &str) -> RecordSummary {
        let struct_index = record.struct_index;
        let struct_type = usize::try_from(struct_index)
            .ok()
            .and_then(|index| self.struct_name(index))
            .unwrap_or("<unknown>")
            .to_string();

        RecordSummary {
            name: name.to_string(),
            file_path: self.record_file_name(record).unwrap_or("").to_string(),
            guid: record.id,
            struct_type,
        }
    }
}
