//! Stage transitions. Each consumes the previous state and returns the next;
//! on failure the consumed state, and its connection, is dropped.

use crate::agent::{AgentRequest, ReasoningAgent};
use crate::config::FlowConfig;
use crate::error::{FlowError, Result};
use crate::ingestion::load_csv;
use crate::pipeline::state::{Answered, Closed, Idle, Inspected, Loaded};
use crate::schema;
use crate::sink::SummarySink;
use tracing::info;

/// Reads the source file, then creates or replaces the table.
pub fn load(config: &FlowConfig, state: Idle) -> Result<Loaded> {
    info!(">>> Loading dataset");

    let (conn, load) = load_csv(config.database_file(), config.csv_file(), &config.table_name)?;

    Ok(Loaded {
        conn,
        flow: state.flow,
        load,
    })
}

pub fn inspect(config: &FlowConfig, state: Loaded) -> Result<Inspected> {
    info!(">>> Inspecting database structure");

    let schema = schema::inspect(&state.conn, &config.table_name)?;
    let flow = state.flow.with_schema(schema.clone());

    Ok(Inspected {
        conn: state.conn,
        flow,
        load: state.load,
        schema,
    })
}

/// Hands the question to `agent` and persists its answer through `sink`.
pub async fn delegate<A>(
    config: &FlowConfig,
    agent: &A,
    sink: &SummarySink,
    state: Inspected,
) -> Result<Answered>
where
    A: ReasoningAgent + ?Sized,
{
    info!(">>> Answering user prompt");

    let request = AgentRequest {
        question: state.flow.user_question.clone(),
        schema: state.schema.clone(),
        store_location: config.database_path.clone(),
    };

    let answer = agent.answer(&request).await?;
    if answer.answer_text.trim().is_empty() {
        return Err(FlowError::Agent("agent returned an empty answer".to_string()));
    }

    let summary_path = sink.write(&answer.answer_text)?;
    let flow = state.flow.with_answer(answer.answer_text.clone());

    Ok(Answered {
        conn: state.conn,
        flow,
        load: state.load,
        answer,
        summary_path,
    })
}

pub fn teardown(state: Answered) -> Result<Closed> {
    info!(">>> Closing connection");

    state
        .conn
        .close()
        .map_err(|(_, e)| FlowError::Database(format!("Failed to close connection: {}", e)))?;

    Ok(Closed {
        flow: state.flow,
        load: state.load,
        answer: state.answer,
        summary_path: state.summary_path,
    })
}
