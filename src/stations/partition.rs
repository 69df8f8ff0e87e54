use crate::stations::error::PartitionError;
use crate::types::station::{Batch, StationId};
use log::info;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Station entries in the batch file are either objects carrying a `station_id`
/// (plus any metadata we ignore) or bare ids.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StationEntry {
    Object { station_id: RawStationId },
    Bare(RawStationId),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawStationId {
    Text(String),
    Number(u64),
}

impl StationEntry {
    fn into_raw(self) -> String {
        let raw = match self {
            StationEntry::Object { station_id } | StationEntry::Bare(station_id) => station_id,
        };
        match raw {
            RawStationId::Text(text) => text.trim().to_string(),
            RawStationId::Number(n) => n.to_string(),
        }
    }
}

/// The ordered list of batches for one cycle, loaded from a JSON file of the form
/// `[[{"station_id": "20004002"}, ...], ...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPartition {
    batches: Vec<Batch>,
}

impl BatchPartition {
    pub fn new(batches: Vec<Batch>) -> Self {
        Self { batches }
    }

    /// Reads and validates the partition. An empty partition is an error: a cycle
    /// without batches must not take the quota lock.
    pub async fn load(path: &Path) -> Result<Self, PartitionError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PartitionError::Read(path.to_path_buf(), e))?;
        let path_buf = path.to_path_buf();
        let partition =
            tokio::task::spawn_blocking(move || Self::from_slice(&bytes, path_buf)).await??;
        info!(
            "Loaded {} batches ({} stations) from {}",
            partition.batches.len(),
            partition.station_count(),
            path.display()
        );
        Ok(partition)
    }

    fn from_slice(bytes: &[u8], path: PathBuf) -> Result<Self, PartitionError> {
        let raw: Vec<Vec<StationEntry>> =
            serde_json::from_slice(bytes).map_err(|e| PartitionError::Decode(path.clone(), e))?;
        if raw.is_empty() {
            return Err(PartitionError::Empty(path));
        }

        let mut batches = Vec::with_capacity(raw.len());
        for (batch_index, entries) in raw.into_iter().enumerate() {
            let mut stations = Vec::with_capacity(entries.len());
            for (position, entry) in entries.into_iter().enumerate() {
                let id = entry.into_raw();
                if id.is_empty() {
                    return Err(PartitionError::BlankStationId {
                        path,
                        batch: batch_index + 1,
                        position: position + 1,
                    });
                }
                stations.push(StationId::new(id));
            }
            batches.push(Batch::new(stations));
        }
        Ok(Self { batches })
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn station_count(&self) -> usize {
        self.batches.iter().map(Batch::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_partition(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn loads_object_and_bare_entries() -> Result<(), PartitionError> {
        let file = write_partition(
            r#"[
                [{"station_id": "20004002", "name": "AJACCIO"}, {"station_id": 20148001}],
                ["20050001"]
            ]"#,
        );

        let partition = BatchPartition::load(file.path()).await?;
        assert_eq!(partition.batches().len(), 2);
        assert_eq!(partition.station_count(), 3);
        assert_eq!(partition.batches()[0].stations()[1].as_str(), "20148001");
        assert_eq!(partition.batches()[1].stations()[0].as_str(), "20050001");
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let err = BatchPartition::load(Path::new("/nonexistent/batches.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, PartitionError::Read(..)));
    }

    #[tokio::test]
    async fn corrupt_file_is_a_decode_error() {
        let file = write_partition("[[{\"station_id\": ");
        let err = BatchPartition::load(file.path()).await.unwrap_err();
        assert!(matches!(err, PartitionError::Decode(..)));
    }

    #[tokio::test]
    async fn empty_partition_is_rejected() {
        let file = write_partition("[]");
        let err = BatchPartition::load(file.path()).await.unwrap_err();
        assert!(matches!(err, PartitionError::Empty(_)));
    }

    #[tokio::test]
    async fn blank_station_id_is_rejected() {
        let file = write_partition(r#"[["a", {"station_id": "  "}]]"#);
        let err = BatchPartition::load(file.path()).await.unwrap_err();
        assert!(matches!(
            err,
            PartitionError::BlankStationId {
                batch: 1,
                position: 2,
                ..
            }
        ));
    }
}
