//! Cross-pass aggregation of detection records.
//!
//! `AggregateTable` maps each symbol to every record it produced, in pass
//! order. Symbols keep the order in which they first appeared. The table is
//! append-only: nothing is deduplicated or removed.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

use crate::types::DetectionRecord;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateTable {
    entries: Vec<(String, Vec<DetectionRecord>)>,
    index: HashMap<String, usize>,
}

impl AggregateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every record of one pass to its symbol's history.
    ///
    /// Duplicates within the same pass are kept as separate entries.
    pub fn merge(&mut self, pass: impl IntoIterator<Item = DetectionRecord>) {
        for record in pass {
            self.push(record);
        }
    }

    fn push(&mut self, record: DetectionRecord) {
        match self.index.get(&record.symbol) {
            Some(&i) => self.entries[i].1.push(record),
            None => {
                self.index.insert(record.symbol.clone(), self.entries.len());
                self.entries.push((record.symbol.clone(), vec![record]));
            }
        }
    }

    /// Records for `symbol`, in pass order.
    pub fn get(&self, symbol: &str) -> Option<&[DetectionRecord]> {
        self.index.get(symbol).map(|&i| self.entries[i].1.as_slice())
    }

    /// Symbols with their records, in first-appearance order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[DetectionRecord])> {
        self.entries.iter().map(|(s, r)| (s.as_str(), r.as_slice()))
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(s, _)| s.as_str())
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of records across all symbols.
    pub fn total_records(&self) -> usize {
        self.entries.iter().map(|(_, r)| r.len()).sum()
    }
}

impl Serialize for AggregateTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (symbol, records) in &self.entries {
            map.serialize_entry(symbol, records)?;
        }
        map.end()
    }
}

struct TableVisitor;

impl<'de> Visitor<'de> for TableVisitor {
    type Value = AggregateTable;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map from symbol to a list of detection records")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut table = AggregateTable::new();
        while let Some((symbol, records)) =
            access.next_entry::<String, Vec<DetectionRecord>>()?
        {
            if table.index.contains_key(&symbol) {
                return Err(serde::de::Error::custom(format!("duplicate symbol {symbol}")));
            }
            table.index.insert(symbol.clone(), table.entries.len());
            table.entries.push((symbol, records));
        }
        Ok(table)
    }
}

impl<'de> Deserialize<'de> for AggregateTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TableVisitor)
    }
}
