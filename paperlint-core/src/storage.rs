use crate::config::{AGENT_NAME, AGENT_VERSION};
use crate::types::AuditLevel;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Success,
    Failed,
}

/// One persisted audit run, keyed by the caller's request id.
///
/// Re-running a request overwrites its record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// The request id; a random UUID when the request carried none
    pub task_id: String,
    pub paper_id: String,
    pub chunk_id: String,
    pub agent_name: String,
    pub agent_version: String,
    pub status: TaskStatus,
    pub score: Option<u8>,
    pub audit_level: Option<AuditLevel>,
    /// Serialized audit report, absent on failure
    pub result_json: Option<serde_json::Value>,
    pub error_msg: Option<String>,
    pub usage_tokens: u64,
    pub latency_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl TaskRecord {
    pub fn new(request_id: &str, paper_id: &str, chunk_id: &str, status: TaskStatus) -> Self {
        let task_id = match request_id.trim() {
            "" => Uuid::new_v4().to_string(),
            id => id.to_string(),
        };
        Self {
            task_id,
            paper_id: paper_id.to_string(),
            chunk_id: chunk_id.to_string(),
            agent_name: AGENT_NAME.to_string(),
            agent_version: AGENT_VERSION.to_string(),
            status,
            score: None,
            audit_level: None,
            result_json: None,
            error_msg: None,
            usage_tokens: 0,
            latency_ms: 0,
            created_at: Utc::now(),
        }
    }

    pub fn with_result(
        mut self,
        score: u8,
        audit_level: AuditLevel,
        result_json: serde_json::Value,
        usage_tokens: u64,
    ) -> Self {
        self.score = Some(score);
        self.audit_level = Some(audit_level);
        self.result_json = Some(result_json);
        self.usage_tokens = usage_tokens;
        self
    }

    pub fn with_error(mut self, error_msg: impl Into<String>) -> Self {
        self.error_msg = Some(error_msg.into());
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }
}

/// Storage abstraction for audit task records
pub trait TaskStore: Send + Sync {
    fn save(&self, record: &TaskRecord) -> Result<()>;
    fn load(&self, task_id: &str) -> Result<Option<TaskRecord>>;
}

/// One pretty-printed JSON file per task under a directory
pub struct FileTaskStore {
    dir: PathBuf,
}

impl FileTaskStore {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Request ids are caller input: anything outside `[A-Za-z0-9._-]` is
    /// replaced so the record always lands directly under `dir`
    fn task_path(&self, task_id: &str) -> PathBuf {
        let file_stem: String = task_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
            .collect();
        self.dir.join(format!("{file_stem}.json"))
    }
}

impl TaskStore for FileTaskStore {
    fn save(&self, record: &TaskRecord) -> Result<()> {
        let json_str = serde_json::to_string_pretty(record)
            .map_err(|e| anyhow!("Failed to serialize TaskRecord: {}", e))?;
        fs::write(self.task_path(&record.task_id), json_str)?;
        Ok(())
    }

    fn load(&self, task_id: &str) -> Result<Option<TaskRecord>> {
        let path = self.task_path(task_id);
        if !path.exists() {
            return Ok(None);
        }
        let json_str = fs::read_to_string(path)?;
        let record: TaskRecord = serde_json::from_str(&json_str)
            .map_err(|e| anyhow!("Failed to deserialize TaskRecord: {}", e))?;
        Ok(Some(record))
    }
}

/// Discards every record; used when persistence is not configured
pub struct NoOpTaskStore;

impl TaskStore for NoOpTaskStore {
    fn save(&self, _record: &TaskRecord) -> Result<()> {
        Ok(())
    }

    fn load(&self, _task_id: &str) -> Result<Option<TaskRecord>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;
    use tempfile::TempDir;

    #[test]
    fn file_store_round_trips_a_record() {
        let dir = TempDir::new().unwrap();
        let store = FileTaskStore::new(dir.path().join("tasks")).unwrap();
        let record = TaskRecord::new("req-1", "paper-1", "chunk-3", TaskStatus::Success)
            .with_result(77, Severity::Warning, serde_json::json!({"score": 77}), 120)
            .with_latency(35);

        store.save(&record).unwrap();
        let loaded = store.load("req-1").unwrap().unwrap();
        assert_eq!(loaded, record);
        assert_eq!(loaded.task_id, "req-1");
        assert_eq!(loaded.agent_name, AGENT_NAME);
        assert!(dir.path().join("tasks").join("req-1.json").exists());
    }

    #[test]
    fn saving_same_request_twice_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = FileTaskStore::new(dir.path()).unwrap();

        store
            .save(&TaskRecord::new("req_001", "p", "c", TaskStatus::Failed).with_error("first"))
            .unwrap();
        store
            .save(&TaskRecord::new("req_001", "p", "c", TaskStatus::Success).with_latency(12))
            .unwrap();

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
        let loaded = store.load("req_001").unwrap().unwrap();
        assert_eq!(loaded.status, TaskStatus::Success);
        assert!(loaded.error_msg.is_none());
    }

    #[test]
    fn unsafe_request_id_stays_inside_store_dir() {
        let dir = TempDir::new().unwrap();
        let store = FileTaskStore::new(dir.path().join("tasks")).unwrap();
        let record = TaskRecord::new("../escape/req", "p", "c", TaskStatus::Success);

        store.save(&record).unwrap();
        assert!(dir.path().join("tasks").join(".._escape_req.json").exists());
        assert_eq!(store.load("../escape/req").unwrap().unwrap().task_id, "../escape/req");
    }

    #[test]
    fn empty_request_id_gets_generated_task_id() {
        let record = TaskRecord::new("  ", "p", "c", TaskStatus::Failed);
        assert!(Uuid::parse_str(&record.task_id).is_ok());
    }

    #[test]
    fn missing_task_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = FileTaskStore::new(dir.path()).unwrap();
        assert!(store.load("never-saved").unwrap().is_none());
    }

    #[test]
    fn failed_record_carries_error() {
        let record = TaskRecord::new("r", "p", "c", TaskStatus::Failed).with_error("boom");
        assert_eq!(record.status, TaskStatus::Failed);
        assert_eq!(record.error_msg.as_deref(), Some("boom"));
        assert!(record.score.is_none());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "FAILED");
    }

    #[test]
    fn noop_store_accepts_everything() {
        let record = TaskRecord::new("r", "p", "c", TaskStatus::Failed);
        NoOpTaskStore.save(&record).unwrap();
        assert!(NoOpTaskStore.load(&record.task_id).unwrap().is_none());
    }
}
