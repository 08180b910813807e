use std::io::{self, Read};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use wayfarer_agents::{AgentConfig, OpenAiModel, TravelDesk};
use wayfarer_core::extract::render;
use wayfarer_core::{
    extract_with_keys, format, format_plan, service_reply, DomainKind, Fence, TravelRequest,
};
use wayfarer_observability::{init_tracing, AppMetrics};

#[derive(Debug, Parser)]
#[command(name = "wayfarer")]
#[command(about = "Wayfarer trip planner CLI")]
struct Cli {
    /// Model used for recommendations (overrides WAYFARER_MODEL).
    #[arg(long)]
    model: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ask all three services and print the combined plan.
    Plan {
        #[command(flatten)]
        trip: TripArgs,
        #[arg(long)]
        json: bool,
    },
    /// Ask a single service (flights, lodging or activities).
    Recommend {
        domain: String,
        #[command(flatten)]
        trip: TripArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,
    },
    /// Read a model completion from stdin and print the recovered list.
    Extract {
        #[arg(long)]
        domain: String,
        /// Top-level keys to look for, in order. Defaults to the domain's keys.
        #[arg(long = "key")]
        keys: Vec<String>,
    },
}

#[derive(Debug, Args)]
struct TripArgs {
    #[arg(long)]
    origin: Option<String>,
    #[arg(long)]
    destination: String,
    #[arg(long)]
    start_date: NaiveDate,
    #[arg(long)]
    end_date: NaiveDate,
    #[arg(long)]
    budget: f64,
}

impl TripArgs {
    fn into_request(self) -> Result<TravelRequest> {
        let request = TravelRequest {
            origin: self.origin,
            destination: self.destination,
            start_date: self.start_date,
            end_date: self.end_date,
            budget: self.budget,
        };
        request.validate().context("invalid trip")?;
        Ok(request)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Markdown,
    Json,
    Fenced,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("wayfarer_cli");
    let cli = Cli::parse();

    match cli.command {
        Command::Plan { trip, json } => {
            let request = trip.into_request()?;
            let desk = build_desk(cli.model)?;

            let plan = tokio::select! {
                plan = desk.coordinator().plan(&request) => plan,
                _ = tokio::signal::ctrl_c() => bail!("interrupted; pending recommendations cancelled"),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&plan.to_envelope())?);
            } else {
                println!("{}", format_plan(&plan));
            }
        }
        Command::Recommend {
            domain,
            trip,
            format: output,
        } => {
            let kind = domain.parse::<DomainKind>().context("invalid domain")?;
            let request = trip.into_request()?;
            let desk = build_desk(cli.model)?;

            let result = desk.agent(kind).recommend(&request).await;
            match output {
                OutputFormat::Markdown => println!("{}", format(&result, kind)),
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&service_reply(kind, &result))?)
                }
                OutputFormat::Fenced => println!("{}", render(kind, &result, Fence::Json)),
            }
        }
        Command::Extract { domain, keys } => {
            let kind = domain.parse::<DomainKind>().context("invalid --domain value")?;
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .context("failed reading completion from stdin")?;

            let keys = if keys.is_empty() {
                kind.keys().to_vec()
            } else {
                keys.iter().map(String::as_str).collect()
            };
            let result = extract_with_keys(&raw, &keys, kind);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

fn build_desk(model: Option<String>) -> Result<TravelDesk<OpenAiModel>> {
    let mut config = AgentConfig::from_env();
    if let Some(model) = model {
        config.model.model = model;
    }

    let model = OpenAiModel::new(config.model.clone())?;
    if !model.is_configured() {
        eprintln!("warning: OPENAI_API_KEY is not set; every category will come back empty");
    }

    TravelDesk::new(Arc::new(model), &config, AppMetrics::shared())
}
