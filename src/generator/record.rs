//! The synthetic record persisted into each shard.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Keys present in every record's metadata map.
pub const METADATA_KEYS: [&str; 4] = ["alpha", "beta", "gamma", "delta"];

/// One synthetic record.
///
/// The field names here are the on-disk format. The writer and the reader
/// both go through this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Id of the task that produced the record.
    pub id: u64,
    pub name: String,
    /// Synthesis time.
    pub timestamp: DateTime<Utc>,
    /// Between 1 and 10 values in `[0, 100)`.
    pub values: Vec<f64>,
    /// Each of [`METADATA_KEYS`] mapped to a value in `[0, 1000)`.
    pub metadata: BTreeMap<String, u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_field_names() {
        let record = Record {
            id: 5,
            name: "Item-5-42".to_string(),
            timestamp: Utc::now(),
            values: vec![1.5, 99.25],
            metadata: METADATA_KEYS
                .iter()
                .map(|k| (k.to_string(), 7))
                .collect(),
        };

        let yaml = serde_yaml::to_string(&record).unwrap();
        for field in ["id:", "name:", "timestamp:", "values:", "metadata:", "alpha:", "delta:"] {
            assert!(yaml.contains(field), "missing {field} in {yaml}");
        }

        let parsed: Record = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, record);
    }
}
