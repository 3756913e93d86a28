use serde::Serialize;

use crate::error::Result;
use crate::models::Record;
use crate::tasks::Task;

/// Result of committing previewed records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportOutcome {
    pub success: bool,
    /// Records actually inserted; duplicates are ignored silently.
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Completion notice of a task-creation dialog session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DialogOutcome {
    pub success: bool,
    pub saved: usize,
}

/// Request/response calls the movement views depend on. Persistence,
/// duplicate detection and everything else behind it is the
/// implementation's business.
pub trait LedgerBridge {
    fn list_accounts(&self) -> Result<Vec<String>>;

    /// Most recent movements of an account, capped by the implementation.
    fn list_recent_records(&self, caja: &str) -> Result<Vec<Record>>;

    /// Returns the refreshed movement list of the account.
    fn set_accounted_state(&self, id: &str, caja: &str, accounted: bool) -> Result<Vec<Record>>;

    fn record_exists(&self, id: &str) -> Result<bool>;

    fn import_records(&self, records: &[Record]) -> Result<ImportOutcome>;

    /// Attach tasks to a movement and mark it accounted. Returns how many
    /// tasks were stored.
    fn save_tasks(&self, movement_id: &str, tasks: &[Task]) -> Result<usize>;

    fn list_tasks(&self, movement_id: &str) -> Result<Vec<Task>>;

    /// Remove the tasks of a movement and mark it not accounted.
    fn delete_tasks(&self, movement_id: &str) -> Result<usize>;
}
