use serde_json::Value;

/// One dataset as returned by a detailed `datasets` lookup.
///
/// Only the fields this tool reads are modeled; everything else the server
/// sends is carried in `extra` unmodified.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct DatasetRecord {
    /// Full dataset path, `/primary/process/tier`.
    pub dataset: String,
    #[serde(default)]
    pub processed_ds_name: String,
    /// Unix timestamp of the last catalog modification.
    #[serde(default)]
    pub last_modification_date: i64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// One file as returned by a `files` lookup.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct FileRecord {
    pub logical_file_name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_record_keeps_unmodeled_fields() {
        let json = r#"{
            "dataset": "/ZeroBias/Run2024A-v1/RAW",
            "processed_ds_name": "Run2024A-v1",
            "last_modification_date": 1714656000,
            "dataset_access_type": "VALID",
            "physics_group_name": "NoGroup"
        }"#;
        let r: DatasetRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.dataset, "/ZeroBias/Run2024A-v1/RAW");
        assert_eq!(r.processed_ds_name, "Run2024A-v1");
        assert_eq!(r.last_modification_date, 1714656000);
        assert_eq!(r.extra["dataset_access_type"], "VALID");
    }

    #[test]
    fn file_record_parses_minimal_payload() {
        let r: FileRecord =
            serde_json::from_str(r#"{"logical_file_name": "/store/data/a.root"}"#).unwrap();
        assert_eq!(r.logical_file_name, "/store/data/a.root");
        assert!(r.extra.is_empty());
    }

    #[test]
    fn dataset_record_tolerates_missing_detail_fields() {
        let r: DatasetRecord = serde_json::from_str(r#"{"dataset": "/A/B/C"}"#).unwrap();
        assert_eq!(r.processed_ds_name, "");
        assert_eq!(r.last_modification_date, 0);
    }
}
