//! SQL analyst - an LLM tool loop over the Query Gateway.

use crate::agent::contracts::{AgentAction, AgentAnswer, AgentRequest, ExecutedQuery};
use crate::agent::prompts;
use crate::agent::ReasoningAgent;
use crate::error::{FlowError, Result};
use crate::gateway::{
    GatewayError, GatewayErrorKind, GatewayResult, QueryGateway, QueryReport, QueryRequest,
};
use crate::llm::{strip_code_fences, ChatMessage, ChatModel};
use async_trait::async_trait;
use tracing::{debug, info, warn};

pub struct SqlAnalystAgent<M> {
    model: M,
    gateway: QueryGateway,
    max_steps: usize,
}

impl<M: ChatModel> SqlAnalystAgent<M> {
    pub fn new(model: M, gateway: QueryGateway, max_steps: usize) -> Self {
        Self {
            model,
            gateway,
            max_steps: max_steps.max(1),
        }
    }

    async fn run_query(&self, query: QueryRequest) -> GatewayResult<QueryReport> {
        let gateway = self.gateway.clone();
        tokio::task::spawn_blocking(move || gateway.execute_request(&query))
            .await
            .unwrap_or_else(|e| {
                Err(GatewayError::Unexpected {
                    message: format!("query task failed: {}", e),
                })
            })
    }
}

/// Replies that are not a JSON action are taken as the final answer.
pub fn parse_action(reply: &str) -> AgentAction {
    let cleaned = strip_code_fences(reply);
    match serde_json::from_str::<AgentAction>(cleaned) {
        Ok(action) => action,
        Err(e) => {
            debug!("Reply is not a JSON action ({}), treating it as the answer", e);
            AgentAction::FinalAnswer {
                answer: reply.trim().to_string(),
            }
        }
    }
}

#[async_trait]
impl<M: ChatModel> ReasoningAgent for SqlAnalystAgent<M> {
    async fn answer(&self, request: &AgentRequest) -> Result<AgentAnswer> {
        let mut messages = vec![
            ChatMessage::system(prompts::SYSTEM_PROMPT),
            ChatMessage::user(prompts::task_prompt(request)),
        ];
        let mut queries_executed = Vec::new();

        for step in 1..=self.max_steps {
            let reply = self.model.chat(&messages).await?;

            let query = match parse_action(&reply) {
                AgentAction::FinalAnswer { answer } => {
                    info!(
                        "Agent answered after {} step(s) and {} queries",
                        step,
                        queries_executed.len()
                    );
                    return Ok(AgentAnswer {
                        answer_text: answer,
                        queries_executed,
                    });
                }
                AgentAction::Query(query) => query,
            };

            info!("Agent step {}: {} ({})", step, query.query, query.database_path);
            let sql = query.query.clone();

            let outcome = self.run_query(query).await;
            let observation = match &outcome {
                Ok(report) => report.to_string(),
                Err(err) => {
                    let kind = err.kind();
                    if matches!(kind, GatewayErrorKind::Backend | GatewayErrorKind::Unexpected) {
                        warn!("{}", err);
                    }
                    err.to_string()
                }
            };
            queries_executed.push(ExecutedQuery::now(sql, outcome.is_ok()));

            messages.push(ChatMessage::assistant(reply));
            let mut feedback = prompts::observation(&observation);
            let remaining = self.max_steps - step;
            if remaining > 0 && remaining <= 2 {
                feedback.push_str("\n\n");
                feedback.push_str(&prompts::step_limit_reminder(remaining));
            }
            messages.push(ChatMessage::user(feedback));
        }

        Err(FlowError::Agent(format!(
            "no final answer after {} steps ({} queries executed)",
            self.max_steps,
            queries_executed.len()
        )))
    }
}
