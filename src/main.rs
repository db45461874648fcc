//! Prism server entry point.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use prism::{
    create_router, ApiEmbeddingProvider, ApiOracle, Catalog, Config, Orchestrator, QdrantSearch,
    RelationalStore, ToolAgent, WebApiConfig,
};

/// Prism: conversational analytics over the customer database
#[derive(Parser, Debug)]
#[command(name = "prism")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask a one-shot question
    Ask {
        /// The question to answer
        question: String,
    },
    /// Ask a one-shot question through the tool loop
    Agent {
        /// The question to answer
        question: String,
    },
    /// Print the column catalog for the target table
    Schema,
    /// Print example questions
    Examples,
    /// Run the HTTP chat server (default)
    Serve {
        /// HTTP port. If not specified, uses the config file value.
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("prism=info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_file(path).context("loading configuration")?,
        None => Config::load().context("loading configuration")?,
    };

    match args.command.unwrap_or(Command::Serve { port: None }) {
        Command::Ask { question } => {
            let (orchestrator, _) = build_core(&config)?;
            let answer = orchestrator.answer(&question, &[]).await;
            println!("{}", answer.text);
            if !answer.related_questions.is_empty() {
                println!("\nRelated questions:");
                for related in &answer.related_questions {
                    println!("- {}", related);
                }
            }
        }
        Command::Agent { question } => {
            let (_, agent) = build_core(&config)?;
            let answer = agent.run(&question, &[]).await;
            println!("{}", answer.text);
        }
        Command::Schema => {
            let store = Arc::new(RelationalStore::new(config.database_path()));
            let types = store
                .column_types(&config.database.table)
                .await
                .context("reading table schema")?;
            let catalog = Catalog::from_declared(&types);
            if catalog.is_empty() {
                println!("Table {} has no columns.", config.database.table);
            } else {
                println!("Columns of {}:", config.database.table);
                for column in catalog.columns() {
                    println!("  {:<40} {:?}", column.name, column.kind);
                }
            }
        }
        Command::Examples => {
            println!("{}", prism::example_questions());
        }
        Command::Serve { port } => {
            let (orchestrator, agent) = build_core(&config)?;
            let router = create_router(orchestrator, agent, &WebApiConfig::default());

            let port = port.unwrap_or(config.server.http_port);
            let addr = format!("{}:{}", config.server.bind, port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("binding {}", addr))?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, router).await.context("serving")?;
        }
    }

    Ok(())
}

/// Wire the orchestrator and tool agent from configuration.
fn build_core(config: &Config) -> anyhow::Result<(Arc<Orchestrator>, Arc<ToolAgent>)> {
    let store = Arc::new(RelationalStore::new(config.database_path()));
    let oracle = Arc::new(ApiOracle::from_config(&config.oracle)?);
    let embedder = Arc::new(ApiEmbeddingProvider::from_config(&config.embedding)?);
    let semantic = Arc::new(QdrantSearch::new(&config.vector, embedder)?);

    let orchestrator = Arc::new(Orchestrator::new(
        oracle.clone(),
        store,
        semantic,
        config,
    ));
    let agent = Arc::new(ToolAgent::new(
        oracle,
        orchestrator.clone(),
        config.oracle.max_tool_rounds,
    ));

    Ok((orchestrator, agent))
}
