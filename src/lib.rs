pub mod agent;
pub mod config;
pub mod error;
pub mod gateway;
pub mod ingestion;
pub mod llm;
pub mod pipeline;
pub mod schema;
pub mod sink;

pub use agent::{AgentAnswer, AgentRequest, ReasoningAgent, SqlAnalystAgent};
pub use config::{FlowConfig, LlmConfig};
pub use error::{FlowError, Result};
pub use gateway::{
    GatewayError, GatewayErrorKind, QueryGateway, QueryReport, QueryRequest, ValidationError,
};
pub use pipeline::{FlowController, FlowState, RunOutcome, Stage};
pub use schema::SchemaDescriptor;
