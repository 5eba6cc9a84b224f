use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use chrono_tz::Tz;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use neurosync_ai::{AssemblyError, EnrichmentRequest, PlanAssembler};
use neurosync_core::Plan;

mod auth;
mod config;
mod input;
mod render;
mod state;

#[derive(Parser, Debug)]
#[command(
    name = "neurosync",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("NEUROSYNC_BUILD_SHA"), ")"),
    about = "NeuroSync planning core CLI"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build today's plan from a planning-cycle JSON file
    Plan {
        /// Cycle input: candidates, slots, optional mood_signals / now / timezone
        #[arg(long)]
        input: PathBuf,

        /// Optional AI enrichment (comma separated)
        #[arg(long, value_enum, value_delimiter = ',')]
        enrich: Vec<Enrich>,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,

        /// IANA timezone for local slots and deadlines (overrides the input file)
        #[arg(long)]
        tz: Option<String>,
    },

    /// Manage ~/.neurosync/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Store provider API keys in ~/.neurosync/auth.json
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    PasteAnthropicToken,
    PasteOpenaiApiKey,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Enrich {
    Breakdowns,
    LearningPaths,
    Mood,
}

fn enrichment_request(flags: &[Enrich]) -> EnrichmentRequest {
    EnrichmentRequest {
        breakdowns: flags.contains(&Enrich::Breakdowns),
        learning_paths: flags.contains(&Enrich::LearningPaths),
        mood_insight: flags.contains(&Enrich::Mood),
    }
}

fn init_tracing(fallback_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(fallback_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config();
    init_tracing(cfg.as_ref().map(|c| c.logging.level.as_str()).unwrap_or("warn"));

    match cli.command {
        Command::Plan { input, enrich, json, tz } => {
            let cfg = cfg?;
            let cancel = CancellationToken::new();
            let on_ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_ctrl_c.cancel();
                }
            });

            let cycle_input = input::read_cycle(&input)?;
            let tz_name = tz
                .or_else(|| cycle_input.timezone.clone())
                .unwrap_or_else(|| state::DEFAULT_TIMEZONE.to_string());
            let tz: Tz = tz_name
                .parse()
                .map_err(|_| anyhow!("invalid timezone: {tz_name}"))?;
            let cycle = cycle_input.resolve(&tz_name, Utc::now())?;

            let plan = run_plan(&cfg, &cycle, enrichment_request(&enrich), &cancel).await?;

            if json {
                println!("{}", render::render_json(&plan)?);
            } else {
                print!("{}", render::render_text(&plan, tz));
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config(&cfg?)?,
        },

        Command::Auth { command } => match command {
            AuthCommand::PasteAnthropicToken => auth::anthropic_paste_token()?,
            AuthCommand::PasteOpenaiApiKey => auth::openai_paste_api_key()?,
        },
    }

    Ok(())
}

/// Mood, scoring and scheduling, then optional enrichment.
async fn run_plan(
    cfg: &config::Config,
    cycle: &input::Cycle,
    request: EnrichmentRequest,
    cancel: &CancellationToken,
) -> Result<Plan> {
    let planner = cfg.planner();
    let mut mood = planner.mood_model().context("invalid [mood] config")?;
    for signal in &cycle.mood_signals {
        mood.update(*signal).context("mood signal")?;
    }

    let plan = planner
        .scheduler()
        .context("invalid [scoring] config")?
        .build(&cycle.candidates, &cycle.budget, &mood.current_at(cycle.now), cycle.now)
        .context("build plan")?;
    info!(
        scheduled = plan.entries().len(),
        unscheduled = plan.unscheduled().len(),
        "plan built"
    );

    if request.is_empty() {
        return Ok(plan);
    }

    let auth = auth::load_auth()?;
    let ai = cfg.ai();
    let gateway = Arc::new(ai.gateway(|kind| auth.key_for(kind)));
    let assembler = PlanAssembler::new(gateway, ai.enrichment.clone());

    match assembler.assemble(plan, request, cancel).await {
        Ok(plan) => Ok(plan),
        Err(AssemblyError::Cancelled) => bail!("cancelled; no plan produced"),
    }
}
