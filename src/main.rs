use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stackview::model::{ExperimentId, ToolSession};
use stackview::remote::{HttpToolClient, ToolService};
use stackview::viewer::Viewer;

#[derive(Parser)]
#[command(name = "stackview")]
#[command(about = "Image-stack viewer client for server-side tool jobs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tools offered by the server
    Tools {
        /// Server base URL
        #[arg(long)]
        url: String,
    },

    /// Submit a tool request and print the session uuid
    Submit {
        /// Server base URL
        #[arg(long)]
        url: String,
        /// Experiment id owning the job
        #[arg(long)]
        experiment: String,
        /// Server-side tool name
        #[arg(long)]
        tool: String,
        /// Tool-specific JSON payload
        #[arg(long, default_value = "{}")]
        payload: String,
    },

    /// Poll an experiment's tool jobs and reconcile results until Ctrl-C
    Watch {
        /// Server base URL
        #[arg(long)]
        url: String,
        /// Experiment id to monitor
        #[arg(long)]
        experiment: String,
        /// Poll period in milliseconds
        #[arg(long, default_value_t = 3000)]
        period_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Tools { url } => {
            let client = HttpToolClient::new(url)?;
            let tools = client.tools().await?;
            if tools.is_empty() {
                println!("no tools available");
            }
            for tool in tools {
                if tool.description.is_empty() {
                    println!("{}", tool.name);
                } else {
                    println!("{}  {}", tool.name, tool.description);
                }
            }
        }

        Commands::Submit {
            url,
            experiment,
            tool,
            payload,
        } => {
            let payload: serde_json::Value =
                serde_json::from_str(&payload).context("parse payload")?;
            let client: Arc<dyn ToolService> = Arc::new(HttpToolClient::new(url)?);
            let viewer = Viewer::new(ExperimentId(experiment), client)?;
            let session = ToolSession::new(tool)?;
            if !viewer.send_tool_request(&session, payload).await {
                anyhow::bail!("tool submit failed");
            }
            println!("submitted; session uuid {}", session.uuid.as_str());
        }

        Commands::Watch {
            url,
            experiment,
            period_ms,
        } => {
            let client: Arc<dyn ToolService> = Arc::new(HttpToolClient::new(url)?);
            let mut viewer = Viewer::new(ExperimentId(experiment), client)?;
            let started_at = time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .context("format timestamp")?;
            println!(
                "watching experiment {} every {}ms (started {}; Ctrl-C to stop)",
                viewer.experiment(),
                period_ms,
                started_at
            );

            viewer.start_monitoring(Duration::from_millis(period_ms)).await;
            tokio::signal::ctrl_c().await.context("wait for ctrl-c")?;

            match viewer.current_result() {
                Some(result) => println!(
                    "current result: {} (submission {})",
                    result.name, result.submission_id
                ),
                None => println!("no current result"),
            }
            println!("saved results: {}", viewer.saved_results().len());
            viewer.destroy().await;
        }
    }

    Ok(())
}
