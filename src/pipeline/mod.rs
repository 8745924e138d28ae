//! Pipeline Controller
//!
//! `Idle -> Loaded -> Inspected -> Answered -> Closed`, strictly in order,
//! no retries. Stages are plain functions in [`stages`]; the controller only
//! composes them and reports the outcome.

pub mod stages;
pub mod state;

pub use state::{
    flow_diagram, Answered, Closed, FlowState, Idle, Inspected, Loaded, PipelineState, Stage,
};

use crate::agent::{ExecutedQuery, ReasoningAgent};
use crate::config::FlowConfig;
use crate::error::{FlowError, Result};
use crate::sink::SummarySink;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub run_id: String,
    pub rows_loaded: usize,
    pub answer: String,
    pub queries_executed: Vec<ExecutedQuery>,
    pub summary_path: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

pub struct FlowController<A> {
    config: FlowConfig,
    agent: A,
    sink: SummarySink,
}

impl<A: ReasoningAgent> FlowController<A> {
    pub fn new(config: FlowConfig, agent: A) -> Self {
        let sink = SummarySink::new(config.summary_file());
        Self { config, agent, sink }
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    /// Runs all four stages for `question`. A failing stage ends the run and
    /// its error is returned; nothing after it executes.
    pub async fn run(&self, question: impl Into<String>) -> Result<RunOutcome> {
        self.config.validate()?;

        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("flow_run", run_id = %run_id);

        let result = self.run_stages(run_id.clone(), question.into()).instrument(span).await;
        if let Err(ref e) = result {
            error!(run_id = %run_id, "Flow run failed: {}", e);
        }
        result
    }

    async fn run_stages(&self, run_id: String, question: String) -> Result<RunOutcome> {
        let started_at = Utc::now();

        let idle = Idle::new(question);
        let loaded = stages::load(&self.config, idle)?;
        let inspected = stages::inspect(&self.config, loaded)?;
        let answered = stages::delegate(&self.config, &self.agent, &self.sink, inspected).await?;
        let closed = stages::teardown(answered)?;

        let answer = closed
            .flow()
            .answer
            .clone()
            .ok_or_else(|| FlowError::Agent("flow closed without an answer".to_string()))?;

        let outcome = RunOutcome {
            run_id,
            rows_loaded: closed.load.rows,
            answer,
            queries_executed: closed.answer.queries_executed,
            summary_path: closed.summary_path,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            "Flow complete: {} rows, {} queries",
            outcome.rows_loaded,
            outcome.queries_executed.len()
        );
        Ok(outcome)
    }
}
