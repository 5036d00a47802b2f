use std::net::IpAddr;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use ticketgate::app_state::{AppState, SharedAppState};
use ticketgate::http::setup_http_server;
use ticketgate::init_telemetry;
use ticketgate::settings::config::Settings;
use ticketgate_core::auth::{Clock, SystemClock, TicketAuthenticator};
use ticketgate_core::ticket::Ticket;

#[derive(Parser)]
#[command(name = "ticketgate")]
#[command(about = "Signed ticket authentication and ACL authorization server")]
#[clap(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Parser)]
enum Commands {
    /// Show current configuration and exit
    Config,
    /// Start the ticketgate server (default)
    Run,
    /// Issue a ticket with the configured secret and print it
    Issue {
        user_id: String,
        /// Opaque user data to embed
        #[arg(long, default_value = "")]
        data: String,
        /// Client IP to bind the ticket to
        #[arg(long)]
        ip: Option<IpAddr>,
    },
    /// Validate a ticket with the configured secret and print its contents
    Inspect {
        ticket: String,
        /// Client IP the ticket was bound to
        #[arg(long)]
        ip: Option<IpAddr>,
    },
    /// Print a bcrypt hash for a user's password_hash setting
    HashPassword { password: String },
}

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::from_filename(".env.local").ok();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Config => {
            let settings = Settings::new().context("Failed to load configuration")?;
            println!("{settings:#?}");
            return Ok(());
        }
        Commands::Issue { user_id, data, ip } => {
            let settings = Settings::new().context("Failed to load configuration")?;
            let authenticator = TicketAuthenticator::from_settings(&settings.auth)?;
            let ticket = Ticket::new(&user_id, &data, SystemClock.now());
            println!("{}", authenticator.codec().encode(&ticket, ip)?);
            return Ok(());
        }
        Commands::Inspect { ticket, ip } => {
            let settings = Settings::new().context("Failed to load configuration")?;
            let authenticator = TicketAuthenticator::from_settings(&settings.auth)?;
            let now = SystemClock.now();
            let decoded = authenticator
                .codec()
                .decode(&ticket, ip, authenticator.max_age(), now)?;
            println!("user_id:    {}", decoded.user_id);
            println!("user_data:  {}", decoded.user_data);
            println!("issue_time: {}", decoded.issue_time);
            println!("age:        {}s of {}s", decoded.age(now), authenticator.max_age());
            return Ok(());
        }
        Commands::HashPassword { password } => {
            println!("{}", bcrypt::hash(password, bcrypt::DEFAULT_COST)?);
            return Ok(());
        }
        Commands::Run => {
            // Continue with the normal server startup
        }
    }

    let mut handles = vec![];

    let settings = Settings::new().context("Failed to load configuration")?;
    init_telemetry::init_telemetry_and_tracing(settings.debug)?;
    let app_state = AppState::new(settings).await?;

    // Setup http server.
    {
        let handle = setup_http_server(app_state.clone(), &app_state.settings.api.bind_address).await?;
        handles.push(handle);
    }

    // Expire abandoned sessions.
    handles.push(spawn_session_cleanup(app_state.clone()));

    loop {
        // Remove and await completed handles
        handles.retain(|handle| !handle.is_finished());

        // Break the loop if no more handles are running
        if handles.is_empty() {
            info!("All tasks are done");
            break;
        }

        // Sleep for a short duration to avoid busy-waiting
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    Ok(())
}

fn spawn_session_cleanup(app_state: SharedAppState) -> tokio::task::JoinHandle<anyhow::Result<()>> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    app_state.sessions.cleanup_expired().await;
                }
                _ = app_state.stop_flag.wait() => {
                    info!("Session cleanup stopped");
                    return Ok(());
                }
            }
        }
    })
}
