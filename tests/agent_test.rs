use async_trait::async_trait;
use rusqlite::Connection;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use support_ticket_flow::agent::{AgentRequest, ReasoningAgent, SqlAnalystAgent};
use support_ticket_flow::llm::{ChatMessage, ChatModel, Role};
use support_ticket_flow::schema::SchemaDescriptor;
use support_ticket_flow::{FlowError, QueryGateway, Result};
use tempfile::TempDir;

/// Replays canned replies and records every transcript it was shown.
struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    transcripts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedModel {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            transcripts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        self.transcripts.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| FlowError::Llm("script exhausted".to_string()))
    }
}

const STORE: &str = "data/customer_support_tickets.db";

fn store() -> (TempDir, QueryGateway, AgentRequest) {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("data")).unwrap();
    let conn = Connection::open(dir.path().join(STORE)).unwrap();
    conn.execute_batch(
        "CREATE TABLE customer_support_tickets (\"Ticket Type\" TEXT, \"Ticket Status\" TEXT);
         INSERT INTO customer_support_tickets VALUES
            ('Refund request', 'Open'),
            ('Refund request', 'Pending Customer Response'),
            ('Technical issue', 'Closed');",
    )
    .unwrap();
    let ddl: String = conn
        .query_row("SELECT sql FROM sqlite_master WHERE name = 'customer_support_tickets'", [], |r| r.get(0))
        .unwrap();

    let request = AgentRequest {
        question: "What is the most common unsolved issue?".to_string(),
        schema: SchemaDescriptor {
            table_name: "customer_support_tickets".to_string(),
            ddl,
        },
        store_location: PathBuf::from(STORE),
    };
    let gateway = QueryGateway::new(dir.path());
    (dir, gateway, request)
}

#[tokio::test]
async fn test_query_then_answer() {
    let (_dir, gateway, request) = store();
    let model = Arc::new(ScriptedModel::new(&[
        r#"{"action": "query", "query": "SELECT \"Ticket Type\", COUNT(*) AS n FROM customer_support_tickets WHERE \"Ticket Status\" != 'Closed' GROUP BY 1 ORDER BY n DESC", "database_path": "data/customer_support_tickets.db"}"#,
        r#"```json
{"action": "final_answer", "answer": "Refund requests are the most common unsolved issue (2 tickets)."}
```"#,
    ]));

    let agent = SqlAnalystAgent::new(Arc::clone(&model), gateway, 5);
    let answer = agent.answer(&request).await.unwrap();

    assert_eq!(
        answer.answer_text,
        "Refund requests are the most common unsolved issue (2 tickets)."
    );
    assert_eq!(answer.queries_executed.len(), 1);
    assert!(answer.queries_executed[0].accepted);

    let transcripts = model.transcripts.lock().unwrap();
    assert_eq!(transcripts.len(), 2);
    assert_eq!(transcripts[0][0].role, Role::System);
    assert!(transcripts[0][1].content.contains("most common unsolved issue"));
    assert!(transcripts[0][1].content.contains("\"Ticket Status\" TEXT"));

    let observation = &transcripts[1].last().unwrap().content;
    assert!(observation.contains("Retrieved 1 row(s)"), "{}", observation);
    assert!(observation.contains("Ticket Type: Refund request"), "{}", observation);
}

#[tokio::test]
async fn test_rejected_query_is_fed_back() {
    let (_dir, gateway, request) = store();
    let model = Arc::new(ScriptedModel::new(&[
        r#"{"action": "query", "sql": "DELETE FROM customer_support_tickets"}"#,
        "There are three tickets in total.",
    ]));

    let agent = SqlAnalystAgent::new(Arc::clone(&model), gateway, 5);
    let answer = agent.answer(&request).await.unwrap();

    assert_eq!(answer.answer_text, "There are three tickets in total.");
    assert_eq!(answer.queries_executed.len(), 1);
    assert!(!answer.queries_executed[0].accepted);

    let transcripts = model.transcripts.lock().unwrap();
    let observation = &transcripts[1].last().unwrap().content;
    assert!(observation.contains("Error: Query rejected"), "{}", observation);
}

#[tokio::test]
async fn test_query_targets_the_requested_store() {
    let (dir, gateway, request) = store();
    let archive = Connection::open(dir.path().join("archive.db")).unwrap();
    archive
        .execute_batch("CREATE TABLE customer_support_tickets (\"Ticket Type\" TEXT)")
        .unwrap();
    drop(archive);

    let model = Arc::new(ScriptedModel::new(&[
        r#"{"action": "query", "query": "SELECT COUNT(*) AS n FROM customer_support_tickets", "database_path": "archive.db"}"#,
        r#"{"action": "final_answer", "answer": "The archive is empty."}"#,
    ]));

    let agent = SqlAnalystAgent::new(Arc::clone(&model), gateway, 5);
    let answer = agent.answer(&request).await.unwrap();
    assert_eq!(answer.answer_text, "The archive is empty.");

    let transcripts = model.transcripts.lock().unwrap();
    let observation = &transcripts[1].last().unwrap().content;
    assert!(observation.contains("  n: 0"), "{}", observation);
}

#[tokio::test]
async fn test_step_limit() {
    let (_dir, gateway, request) = store();
    let query = r#"{"action": "query", "sql": "SELECT COUNT(*) FROM customer_support_tickets"}"#;
    let model = Arc::new(ScriptedModel::new(&[query, query, query]));

    let agent = SqlAnalystAgent::new(Arc::clone(&model), gateway, 2);
    let err = agent.answer(&request).await.unwrap_err();

    assert!(matches!(err, FlowError::Agent(_)), "{:?}", err);
    assert_eq!(model.transcripts.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_model_failure_propagates() {
    let (_dir, gateway, request) = store();
    let model = Arc::new(ScriptedModel::new(&[]));

    let agent = SqlAnalystAgent::new(Arc::clone(&model), gateway, 3);
    let err = agent.answer(&request).await.unwrap_err();
    assert!(matches!(err, FlowError::Llm(_)));
}
