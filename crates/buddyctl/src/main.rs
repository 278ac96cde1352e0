//! buddyctl - Traffic Buddy dashboard reports from exported backend data
//!
//! Reads JSON exports of the admin endpoints (email log, resolution times,
//! division stats, volunteer applications) and renders the dashboard views.

use anyhow::Result;
use buddy_shared::resolution::ResolutionQuery;
use buddy_shared::{ApplicationStatus, DashboardConfig, DeliveryStatus, ReportMonth};
use buddyctl::commands::emails::{self, EmailsRequest};
use buddyctl::commands::volunteers::{self, Decision, ListRequest};
use buddyctl::commands::analytics;
use buddyctl::errors::exit_code;
use buddyctl::logging;
use buddyctl::output::OutputFormat;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;

#[derive(Parser)]
#[command(name = "buddyctl")]
#[command(about = "Traffic Buddy - admin dashboard reports", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: $BUDDY_CONFIG, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grouped email notification log
    Emails {
        /// Email-records response or bare JSON array
        #[arg(long)]
        input: PathBuf,

        /// Division value or label (default: configured scope)
        #[arg(long)]
        division: Option<String>,

        /// Month as YYYY-MM
        #[arg(long)]
        month: Option<ReportMonth>,

        /// sent or failed
        #[arg(long)]
        status: Option<DeliveryStatus>,

        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Average resolution time by division
    Resolution {
        #[arg(long)]
        input: PathBuf,

        /// Query type the export was fetched for (default: Traffic Congestion)
        #[arg(long)]
        query_type: Option<String>,
    },

    /// Daily query trends of one division
    Trends {
        /// Division stats response
        #[arg(long)]
        input: PathBuf,
    },

    /// Recent months for report filters
    Months {
        #[arg(long, default_value_t = 12)]
        count: usize,
    },

    /// Volunteer applications
    Volunteers {
        #[command(subcommand)]
        command: VolunteerCommands,
    },
}

#[derive(Subcommand)]
enum VolunteerCommands {
    /// List applications, one page at a time
    List {
        #[arg(long)]
        input: PathBuf,

        /// all, pending, approved or rejected
        #[arg(long, default_value = "all")]
        status: String,

        /// Month as YYYY-MM
        #[arg(long)]
        month: Option<ReportMonth>,

        #[arg(long)]
        division: Option<String>,

        /// Matches name, WhatsApp name, email or phone
        #[arg(long)]
        search: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Application counts by status
    Stats {
        #[arg(long)]
        input: PathBuf,
    },

    /// Build the status update for a review decision
    Review {
        #[arg(long, value_enum)]
        decision: Decision,

        /// Verifier name
        #[arg(long = "by")]
        verifier: String,

        /// Rejection reason
        #[arg(long)]
        reason: Option<String>,

        /// Current status of the application
        #[arg(long, default_value = "pending")]
        current: ApplicationStatus,
    },

    /// Build a broadcast request
    Broadcast {
        #[arg(long)]
        message: String,

        /// Do not send to citizens
        #[arg(long)]
        no_users: bool,

        /// Send to volunteers
        #[arg(long)]
        volunteers: bool,

        /// Send to a division (repeatable)
        #[arg(long = "division")]
        divisions: Vec<String>,
    },
}

fn load_config(explicit: Option<&std::path::Path>) -> Result<(DashboardConfig, Option<String>)> {
    if explicit.is_some() {
        return Ok((DashboardConfig::resolve(explicit)?, None));
    }
    // Logging is not up yet, so a bad discovered file is reported afterwards.
    Ok(match DashboardConfig::try_load() {
        Ok(config) => (config, None),
        Err(e) => (DashboardConfig::default(), Some(e.to_string())),
    })
}

fn run(cli: Cli) -> Result<String> {
    let (config, ignored) = load_config(cli.config.as_deref())?;
    logging::init(&config.log.level);
    if let Some(reason) = ignored {
        warn!("Ignoring config: {}", reason);
    }

    let format = OutputFormat::from_flag(cli.json);
    match cli.command {
        Commands::Emails { input, division, month, status, page } => {
            let request = EmailsRequest { input, division, month, status, page };
            emails::run(&config, &request, format)
        }
        Commands::Resolution { input, query_type } => {
            let query = ResolutionQuery::default().with_query_type(query_type.as_deref());
            analytics::run_resolution(&input, &query, format)
        }
        Commands::Trends { input } => analytics::run_trends(&input, format),
        Commands::Months { count } => {
            let today = chrono::Local::now().date_naive();
            analytics::run_months(today, count, format)
        }
        Commands::Volunteers { command } => match command {
            VolunteerCommands::List { input, status, month, division, search, page } => {
                let request = ListRequest { input, status, month, division, search, page };
                volunteers::run_list(&config, &request, format)
            }
            VolunteerCommands::Stats { input } => volunteers::run_stats(&input, format),
            VolunteerCommands::Review { decision, verifier, reason, current } => {
                volunteers::run_review(decision, &verifier, reason.as_deref(), current, format)
            }
            VolunteerCommands::Broadcast { message, no_users, volunteers: to_volunteers, divisions } => {
                volunteers::run_broadcast(&message, !no_users, to_volunteers, &divisions, format)
            }
        },
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{} {:#}", "[ERROR]".bright_red(), err);
            ExitCode::from(exit_code(&err))
        }
    }
}
