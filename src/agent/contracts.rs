use crate::gateway::QueryRequest;
use crate::schema::SchemaDescriptor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything the agent is told about one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest {
    pub question: String,
    pub schema: SchemaDescriptor,
    /// Store path as the gateway expects it, relative to the project root.
    pub store_location: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutedQuery {
    pub sql: String,
    pub accepted: bool,
    pub executed_at: DateTime<Utc>,
}

impl ExecutedQuery {
    pub fn now(sql: impl Into<String>, accepted: bool) -> Self {
        Self {
            sql: sql.into(),
            accepted,
            executed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentAnswer {
    pub answer_text: String,
    #[serde(default)]
    pub queries_executed: Vec<ExecutedQuery>,
}

impl AgentAnswer {
    pub fn text(answer_text: impl Into<String>) -> Self {
        Self {
            answer_text: answer_text.into(),
            queries_executed: Vec::new(),
        }
    }
}

/// One model turn, as requested in the task prompt. A `query` turn carries
/// the gateway's tool arguments directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AgentAction {
    Query(QueryRequest),
    FinalAnswer {
        answer: String,
    },
}
