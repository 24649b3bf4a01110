//! In-memory sample.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::value::Value;

use super::Sample;

/// Sample that keeps every value in a process-local map.
///
/// Values are stored as given; nothing is serialized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySample {
    data: BTreeMap<String, Value>,
}

impl MemorySample {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sample pre-populated with `data`.
    pub fn with_data(data: BTreeMap<String, Value>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Sample for MemorySample {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: Value) -> Result<()> {
        self.data.insert(key.to_string(), value);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }
}
