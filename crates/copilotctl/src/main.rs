//! copilotctl - CLI client for the Knowledge Copilot daemon

use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use copilot_shared::{AskRequest, DEFAULT_API_URL, VERSION};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use copilotctl::client::CopilotClient;
use copilotctl::eval::{self, Report, DEFAULT_REPORTS_DIR, DEFAULT_TESTS_PATH};
use copilotctl::output;

#[derive(Parser)]
#[command(name = "copilotctl")]
#[command(about = "Knowledge Copilot - ask the enterprise knowledge base", long_about = None)]
#[command(version = VERSION)]
struct Cli {
    /// copilotd base URL
    #[arg(long, global = true, env = "API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 120)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question
    Ask {
        /// The question (remaining words are joined)
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,

        #[arg(long, default_value_t = 4)]
        top_k: usize,

        /// Print the raw JSON answer
        #[arg(long)]
        json: bool,
    },

    /// Show daemon health and readiness
    Health,

    /// Reload documents into the knowledge base
    Ingest,

    /// Run the regression questions and write a report
    Eval {
        #[arg(long, default_value = DEFAULT_TESTS_PATH)]
        tests: PathBuf,

        #[arg(long, default_value = DEFAULT_REPORTS_DIR)]
        reports: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        output::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let client = CopilotClient::new(&cli.api_url, Duration::from_secs(cli.timeout))?;

    match cli.command {
        Commands::Ask {
            question,
            top_k,
            json,
        } => {
            let request = AskRequest {
                question: question.join(" "),
                top_k,
            };
            let result = client.ask(&request).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                output::display_answer(&result);
            }
            Ok(())
        }
        Commands::Health => {
            let health = client.health().await?;
            println!(
                "health: {} (v{}, up {}s)",
                health.status.bright_green(),
                health.version,
                health.uptime_seconds
            );

            let ready = client.ready().await?;
            if ready.ready {
                println!("ready:  {}", "yes".bright_green());
                Ok(())
            } else {
                println!("ready:  {}", "no".yellow());
                if let Some(error) = ready.error {
                    println!("        {}", error.dimmed());
                }
                Err(anyhow!("copilotd is not ready"))
            }
        }
        Commands::Ingest => {
            let response = client.ingest().await?;
            output::display_ingest(&response);
            Ok(())
        }
        Commands::Eval { tests, reports } => run_eval(&client, &tests, &reports).await,
    }
}

async fn run_eval(client: &CopilotClient, tests: &Path, reports: &Path) -> Result<()> {
    let cases = eval::load_cases(tests)?;
    println!("Running {} tests against {} ...\n", cases.len(), client.base_url());

    let mut results = Vec::with_capacity(cases.len());
    for case in &cases {
        let report = eval::run_case(client, case).await?;
        output::display_case(&report);
        results.push(report);
    }

    let now = Utc::now();
    let summary = eval::summarize(client.base_url(), &results, now);
    output::display_summary(&summary);

    let failed = summary.failed;
    let path = eval::write_report(reports, &Report { summary, results }, now)?;
    println!("Report: {}", path.display());

    if failed > 0 {
        return Err(anyhow!("{} of {} cases failed", failed, cases.len()));
    }
    Ok(())
}
