//! `arrangement`: validate, format, and submit Delta events from the terminal.

mod config;
mod logging;
mod output;

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use arrangement_engine::auth::paths;
use arrangement_engine::{
    parse_instant, validate, ApiError, AuthGate, EventApi, EventDraft, EventId, EventQuery,
    HttpEventApi, StaticTokenGate, SubmitError, Submitter,
};
use clap::{Parser, Subcommand};
use tracing::{debug, error};

use crate::config::{Overrides, Settings};

#[derive(Parser)]
#[command(
    name = "arrangement",
    version,
    about = "Validate, format, and submit Delta events"
)]
struct Cli {
    /// TOML settings file (default: ./arrangement.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the event API
    #[arg(long, global = true, env = "ARRANGEMENT_API_URL")]
    api_url: Option<String>,

    /// IANA timezone of the organization
    #[arg(long, global = true, env = "ARRANGEMENT_TIMEZONE")]
    timezone: Option<String>,

    /// Bearer token for the event API
    #[arg(long, global = true, env = "ARRANGEMENT_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "ARRANGEMENT_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate an event draft (JSON) and print the normalized event
    Validate {
        /// Draft file, or '-' for stdin
        #[arg(default_value = "-")]
        input: String,
    },
    /// Format an event's time span, duration, and signup deadline
    Format {
        /// Start instant (RFC 3339)
        #[arg(long)]
        start: String,
        /// End instant (RFC 3339)
        #[arg(long)]
        end: String,
        /// Signup deadline (RFC 3339)
        #[arg(long)]
        deadline: Option<String>,
    },
    /// Front page: upcoming public events, events you created, events you joined
    Home,
    /// Show one event with its participants
    Show { id: String },
    /// List events
    List {
        /// Events you created
        #[arg(long, conflicts_with = "joined")]
        mine: bool,
        /// Events you have signed up for
        #[arg(long)]
        joined: bool,
        /// Past instead of upcoming events
        #[arg(long)]
        past: bool,
        /// Only events visible on the front page
        #[arg(long)]
        public: bool,
        /// Restrict to category ids
        #[arg(long = "category")]
        categories: Vec<i64>,
    },
    /// Print an existing event as an editable draft (JSON)
    EditDraft { id: String },
    /// Validate a draft and create it, or update an existing event with --id
    Submit {
        /// Draft file, or '-' for stdin
        #[arg(default_value = "-")]
        input: String,
        /// Id of the event to update
        #[arg(long)]
        id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let settings = Settings::load(cli.config.as_deref())?.apply(Overrides {
        api_base_url: cli.api_url,
        timezone: cli.timezone,
        api_token: cli.token,
        request_timeout_secs: cli.timeout_secs,
    });
    debug!(api = %settings.api_base_url, timezone = %settings.timezone, "settings loaded");
    let normalizer = settings.normalizer()?;
    let mut gate = StaticTokenGate::new(settings.api_token.clone());
    if let Some(user) = settings.user.clone() {
        gate = gate.with_user(user);
    }

    match cli.command {
        Command::Validate { input } => {
            let draft = read_draft(&input)?;
            match validate(&draft) {
                Ok(event) => {
                    println!("{}", serde_json::to_string_pretty(&event)?);
                    Ok(ExitCode::SUCCESS)
                }
                Err(errors) => {
                    println!("{}", serde_json::to_string_pretty(&errors)?);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Format {
            start,
            end,
            deadline,
        } => {
            let start = parse_instant(&start)?;
            let end = parse_instant(&end)?;
            let deadline = deadline.as_deref().map(parse_instant).transpose()?;
            println!("{}", normalizer.format_range(start, end));
            println!("{}", normalizer.format_duration(start, end));
            if let Some(deadline) = normalizer.format_deadline(deadline) {
                println!("Påmeldingsfrist: {deadline}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Home => {
            gate.check_token(paths::HOME)?;
            let api = connect(&settings, &gate)?;
            if let Some(user) = gate.current_user() {
                println!("{}", output::signed_in_line(&user));
            }
            let sections = [
                ("Alle", api.list_events(&EventQuery::upcoming_public()).await),
                ("Mine", api.list_created_events().await),
                ("Påmeldte", api.list_joined_events().await),
            ];
            for (heading, events) in sections {
                let events = match events {
                    Ok(events) => events,
                    Err(err) => return Ok(report_api_error(&err)),
                };
                println!("{heading} ({})", events.len());
                for event in &events {
                    println!("  {}", output::event_line(event, &normalizer));
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Show { id } => {
            let id = EventId::new(id);
            gate.check_token(&id.detail_path())?;
            let api = connect(&settings, &gate)?;
            match api.get_event(&id).await {
                Ok(found) => {
                    let viewer = gate.current_user();
                    print!(
                        "{}",
                        output::event_details(&found, &normalizer, viewer.as_ref())
                    );
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => Ok(report_api_error(&err)),
            }
        }
        Command::List {
            mine,
            joined,
            past,
            public,
            categories,
        } => {
            gate.check_token(if mine { paths::MY_EVENTS } else { paths::HOME })?;
            let api = connect(&settings, &gate)?;
            let query = EventQuery {
                only_future: !past,
                only_past: past,
                only_public: public,
                only_joined: joined,
                only_mine: mine,
                categories,
            };
            match api.list_events(&query).await {
                Ok(events) => {
                    for event in &events {
                        println!("{}", output::event_line(event, &normalizer));
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => Ok(report_api_error(&err)),
            }
        }
        Command::EditDraft { id } => {
            let id = EventId::new(id);
            gate.check_token(&id.detail_path())?;
            let api = connect(&settings, &gate)?;
            match api.get_event(&id).await {
                Ok(found) => {
                    let draft = EventDraft::from_persisted(&found.event, &normalizer);
                    println!("{}", serde_json::to_string_pretty(&draft)?);
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => Ok(report_api_error(&err)),
            }
        }
        Command::Submit { input, id } => {
            let existing = id.map(EventId::new);
            let return_path = existing
                .as_ref()
                .map(EventId::detail_path)
                .unwrap_or_else(|| paths::NEW_EVENT.to_string());
            gate.check_token(&return_path)?;
            let draft = read_draft(&input)?;
            let submitter = Submitter::new(connect(&settings, &gate)?, normalizer);
            submit(&submitter, &draft, existing.as_ref()).await
        }
    }
}

async fn submit(
    submitter: &Submitter<HttpEventApi>,
    draft: &EventDraft,
    existing: Option<&EventId>,
) -> Result<ExitCode> {
    match submitter.submit_draft(draft, existing).await {
        Ok(id) => {
            println!("{}", id.detail_path());
            Ok(ExitCode::SUCCESS)
        }
        Err(SubmitError::Invalid(errors)) => {
            println!("{}", serde_json::to_string_pretty(&errors)?);
            Ok(ExitCode::FAILURE)
        }
        Err(SubmitError::Api(err)) => Ok(report_api_error(&err)),
    }
}

fn connect(settings: &Settings, gate: &StaticTokenGate) -> Result<HttpEventApi> {
    let api = HttpEventApi::with_timeout(&settings.api_base_url, settings.request_timeout())
        .context("building event API client")?;
    Ok(match gate.token() {
        Some(token) => api.with_token(token),
        None => api,
    })
}

fn report_api_error(err: &ApiError) -> ExitCode {
    error!(error = %err, "event API call failed");
    eprintln!(
        "{}",
        err.user_message().unwrap_or(output::NOT_FOUND_MESSAGE)
    );
    ExitCode::FAILURE
}

fn read_draft(input: &str) -> Result<EventDraft> {
    let text = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading draft from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("reading draft {input}"))?
    };
    serde_json::from_str(&text).context("parsing event draft JSON")
}
