//! Prompt templates for the SQL analyst.

use crate::agent::contracts::AgentRequest;

pub const SYSTEM_PROMPT: &str = r#"You are a Database Specialist for a customer support team.
You turn questions about support tickets into precise SQLite SELECT queries,
read the results carefully and explain what they mean for the business.
You never guess numbers: every figure in your answer comes from a query result.
Reply with a single JSON object and nothing else."#;

pub fn task_prompt(request: &AgentRequest) -> String {
    format!(
        r#"Answer the user's question using the customer support tickets database.

Question: "{question}"

Database path: {path}

Table structure:
{schema}

Column names contain spaces, so wrap them in double quotes. Only a single
SELECT statement is accepted, and any query containing DROP, DELETE, INSERT,
UPDATE, ALTER, CREATE or TRUNCATE anywhere (even inside a name or a string)
is rejected. Results show at most 20 sample rows, so aggregate in SQL
instead of listing rows.

Respond with exactly one of:
{{"action": "query", "query": "SELECT ...", "database_path": "{path}"}}
{{"action": "final_answer", "answer": "..."}}

The final answer is an executive summary in Markdown: lead with the direct
answer, then the supporting figures, then the SQL you relied on."#,
        question = request.question,
        path = request.store_location.display(),
        schema = request.schema,
    )
}

pub fn observation(report: &str) -> String {
    format!(
        "Query tool output:\n{}\n\nContinue with another query or give the final answer.",
        report
    )
}

pub fn step_limit_reminder(remaining: usize) -> String {
    format!(
        "You have {} step(s) left. \
         Reply with {{\"action\": \"final_answer\", ...}} as soon as you can.",
        remaining
    )
}
