// crates/dataprep-services/src/workflow.rs
// ============================================================================
// Module: Workflow Fixtures
// Description: Ad-hoc task processes attached to repository content.
// Purpose: Start and delete workflow processes through the workflow REST API.
// Dependencies: dataprep-core, serde_json, time, tracing
// ============================================================================

//! ## Overview
//! [`WorkflowService::start_task`] starts an ad-hoc review task assigned to a
//! single user with optional content items and returns the process id.

use dataprep_core::Credentials;
use dataprep_core::DataPrepError;
use dataprep_core::HttpClient;
use dataprep_core::NodeRef;
use dataprep_core::RestRequest;
use dataprep_core::http::WORKFLOW_API_PATH;
use dataprep_core::require_value;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;
use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use tracing::info;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Process definition used for ad-hoc tasks.
pub const ADHOC_PROCESS_KEY: &str = "activitiAdhoc";

/// Calendar date format used for due dates.
const DUE_DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

// ============================================================================
// SECTION: Types
// ============================================================================

/// Priority of a workflow task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskPriority {
    /// Priority 1.
    High,
    /// Priority 2.
    #[default]
    Medium,
    /// Priority 3.
    Low,
}

impl TaskPriority {
    /// Returns the numeric value the workflow engine expects.
    #[must_use]
    pub const fn level(self) -> u8 {
        match self {
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }
}

/// Ad-hoc task request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// User the task is assigned to.
    pub assignee: String,
    /// Task description shown to the assignee.
    pub message: String,
    /// Due date.
    pub due_date: Date,
    /// Priority.
    pub priority: TaskPriority,
    /// Whether the engine should notify the assignee by email.
    pub send_email: bool,
    /// Content items attached to the task.
    pub items: Vec<NodeRef>,
}

/// Parses a `YYYY-MM-DD` due date.
///
/// # Errors
///
/// Returns [`DataPrepError::InvalidArgument`] when the text is not a valid date.
pub fn parse_due_date(text: &str) -> Result<Date, DataPrepError> {
    Date::parse(text.trim(), DUE_DATE_FORMAT)
        .map_err(|err| DataPrepError::InvalidArgument(format!("due date {text}: {err}")))
}

/// Process entry returned on creation.
#[derive(Debug, Deserialize)]
struct ProcessEntry {
    /// Entry body.
    entry: ProcessBody,
}

/// Process entry body.
#[derive(Debug, Deserialize)]
struct ProcessBody {
    /// Process instance id.
    id: String,
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Workflow fixture operations.
#[derive(Debug, Clone)]
pub struct WorkflowService {
    /// HTTP executor.
    client: HttpClient,
}

impl WorkflowService {
    /// Creates the service over an HTTP client.
    #[must_use]
    pub const fn new(client: HttpClient) -> Self {
        Self {
            client,
        }
    }

    /// Starts an ad-hoc task process and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the request fails or is rejected.
    pub fn start_task(&self, credentials: &Credentials, task: &NewTask) -> Result<String, DataPrepError> {
        require_value(&task.assignee, "assignee")?;
        require_value(&task.message, "task message")?;
        let url = self.client.endpoint(WORKFLOW_API_PATH, &["processes"])?;
        let body = task_body(task)?;
        let response = self
            .client
            .execute(credentials, RestRequest::post("start task", url).json(body))?
            .require_status(&[201])?;
        let process: ProcessEntry = response.json()?;
        info!(process = %process.entry.id, assignee = %task.assignee, "workflow task started");
        Ok(process.entry.id)
    }

    /// Deletes a process. Returns `false` when the process does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DataPrepError`] when the request fails or is rejected.
    pub fn delete_process(
        &self,
        credentials: &Credentials,
        process_id: &str,
    ) -> Result<bool, DataPrepError> {
        require_value(process_id, "process id")?;
        let url = self.client.endpoint(WORKFLOW_API_PATH, &["processes", process_id])?;
        self.client
            .execute(credentials, RestRequest::delete("delete process", url))?
            .into_outcome(&[204], &[404])
    }
}

/// Builds the process creation body.
fn task_body(task: &NewTask) -> Result<Value, DataPrepError> {
    let due_date = task
        .due_date
        .format(DUE_DATE_FORMAT)
        .map_err(|err| DataPrepError::InvalidArgument(format!("due date: {err}")))?;
    Ok(json!({
        "processDefinitionKey": ADHOC_PROCESS_KEY,
        "variables": {
            "bpm_assignee": task.assignee,
            "bpm_workflowDescription": task.message,
            "bpm_workflowDueDate": due_date,
            "bpm_workflowPriority": task.priority.level(),
            "bpm_sendEMailNotifications": task.send_email,
        },
        "items": task.items,
    }))
}
