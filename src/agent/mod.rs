//! Reasoning agents
//!
//! The pipeline only knows the [`ReasoningAgent`] capability. The shipped
//! implementation is [`SqlAnalystAgent`], which lets a chat model call the
//! Query Gateway until it can answer.

pub mod analyst;
pub mod contracts;
pub mod prompts;

pub use analyst::{parse_action, SqlAnalystAgent};
pub use contracts::{AgentAction, AgentAnswer, AgentRequest, ExecutedQuery};

use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ReasoningAgent: Send + Sync {
    async fn answer(&self, request: &AgentRequest) -> Result<AgentAnswer>;
}

#[async_trait]
impl<T: ReasoningAgent + ?Sized> ReasoningAgent for Box<T> {
    async fn answer(&self, request: &AgentRequest) -> Result<AgentAnswer> {
        (**self).answer(request).await
    }
}
