use support_ticket_flow::config::{FlowConfig, LlmConfig, DEFAULT_DATABASE_PATH, DEFAULT_TABLE_NAME};
use support_ticket_flow::gateway::QueryGateway;
use support_ticket_flow::llm::LlmClient;
use support_ticket_flow::pipeline::{flow_diagram, FlowController};
use support_ticket_flow::schema;
use support_ticket_flow::SqlAnalystAgent;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_QUESTION: &str =
    "What is the most recurrent type of issue reported by customers that are still unsolved?";

#[derive(Parser)]
#[command(name = "support-ticket-flow")]
#[command(about = "Answer questions about customer support tickets with SQL")]
#[command(version)]
struct Args {
    /// Project root all relative paths are resolved against
    /// (or set SUPPORT_FLOW_PROJECT_ROOT)
    #[arg(long, global = true)]
    project_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the CSV, inspect the table, ask the agent and write the summary
    Kickoff {
        /// The question in natural language
        #[arg(default_value = DEFAULT_QUESTION)]
        prompt: String,

        /// Source CSV (default: data/customer_support_tickets.csv)
        #[arg(long)]
        csv: Option<PathBuf>,

        /// SQLite store to create (default: data/customer_support_tickets.db)
        #[arg(long)]
        database: Option<PathBuf>,

        /// Table name (default: customer_support_tickets)
        #[arg(long)]
        table: Option<String>,

        /// Where the final answer is written (default: executive_summary.md)
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Maximum agent turns before giving up
        #[arg(long)]
        max_steps: Option<usize>,

        /// OpenAI API key (or set OPENAI_API_KEY env var)
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Run one read-only query through the gateway
    Query {
        /// SELECT statement
        sql: String,

        #[arg(long, default_value = DEFAULT_DATABASE_PATH)]
        database_path: PathBuf,
    },
    /// Print the DDL of the ticket table
    Schema {
        #[arg(long, default_value = DEFAULT_DATABASE_PATH)]
        database_path: PathBuf,

        #[arg(long, default_value = DEFAULT_TABLE_NAME)]
        table: String,
    },
    /// Print the flow's stages
    Plot,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let mut config = FlowConfig::from_env()?;
    if let Some(root) = args.project_root {
        config.project_root = root;
    }

    match args.command {
        Commands::Kickoff {
            prompt,
            csv,
            database,
            table,
            summary,
            max_steps,
            api_key,
        } => {
            if let Some(csv) = csv {
                config.csv_path = csv;
            }
            if let Some(database) = database {
                config.database_path = database;
            }
            if let Some(table) = table {
                config.table_name = table;
            }
            if let Some(summary) = summary {
                config.summary_path = summary;
            }
            if let Some(max_steps) = max_steps {
                config.max_agent_steps = max_steps;
            }
            kickoff(config, prompt, api_key).await
        }
        Commands::Query { sql, database_path } => {
            let gateway = QueryGateway::new(&config.project_root);
            match gateway.execute(&sql, &database_path) {
                Ok(report) => {
                    println!("{}", report);
                    Ok(())
                }
                Err(err) => {
                    eprintln!("{}", err);
                    std::process::exit(1);
                }
            }
        }
        Commands::Schema { database_path, table } => {
            let descriptor = schema::inspect_path(config.resolve(&database_path), &table)
                .with_context(|| format!("Failed to inspect table '{}'", table))?;
            println!("{}", descriptor);
            Ok(())
        }
        Commands::Plot => {
            println!("{}", flow_diagram());
            Ok(())
        }
    }
}

async fn kickoff(config: FlowConfig, prompt: String, api_key: Option<String>) -> Result<()> {
    let llm_config = LlmConfig::from_env(api_key)?;
    let llm = LlmClient::from_config(&llm_config);
    info!("Using model {}", llm.model());

    let gateway = QueryGateway::new(&config.project_root);
    let agent = SqlAnalystAgent::new(llm, gateway, config.max_agent_steps);
    let controller = FlowController::new(config, agent);

    let outcome = controller.run(prompt).await?;

    println!("{}", outcome.answer);
    println!();
    println!(
        "Summary written to {} ({} rows loaded, {} queries executed)",
        outcome.summary_path.display(),
        outcome.rows_loaded,
        outcome.queries_executed.len()
    );
    Ok(())
}
