//! TicketFlow CLI - browse events, reserve seats and check out from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Check the ticketing API is reachable
//! ticketflow health
//!
//! # Sign in (prompts for the password when --password is omitted)
//! ticketflow login -e alice@example.com
//!
//! # Browse
//! ticketflow events list
//! ticketflow events show evt_1
//! ticketflow seats evt_1
//!
//! # Hold seats, then pay
//! ticketflow reserve evt_1 s1 s2
//! ticketflow checkout evt_1 --seats s1,s2
//! ```
//!
//! Configuration comes from the environment (see
//! [`ticketflow_storefront::config`]). The session survives between runs in
//! the platform data directory.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use ticketflow_storefront::config::StorefrontConfig;
use ticketflow_storefront::error::StorefrontError;
use ticketflow_storefront::logging::{self, LogFormat};
use ticketflow_storefront::Storefront;

mod commands;

#[derive(Parser)]
#[command(name = "ticketflow")]
#[command(author, version, about = "TicketFlow storefront")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the ticketing API is reachable
    Health,
    /// Sign in
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Password (read from stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an account and sign in
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Password (read from stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Browse events
    Events {
        #[command(subcommand)]
        action: EventsAction,
    },
    /// Show the seat map of an event
    Seats {
        /// Event ID
        event_id: String,
    },
    /// Reserve seats for the signed-in user
    Reserve {
        /// Event ID
        event_id: String,

        /// Seat IDs to reserve
        #[arg(required = true)]
        seat_ids: Vec<String>,
    },
    /// Create the order and payment intent for reserved seats
    Checkout {
        /// Event ID
        event_id: String,

        /// Comma-separated seat IDs
        #[arg(short, long)]
        seats: String,
    },
}

#[derive(Subcommand)]
enum EventsAction {
    /// List upcoming events
    List,
    /// Show one event
    Show {
        /// Event ID
        id: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => fail(&StorefrontError::from(e)),
    };

    // Sentry must be up before the tracing layer that feeds it
    let _sentry_guard = init_sentry(&config);

    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    if let Err(e) = logging::init(&config, format) {
        tracing::warn!("Logging already initialized: {e}");
    }

    let result = match Storefront::new(config).await {
        Ok(storefront) => run(cli.command, &storefront).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        e.report();
        fail(&e);
    }
}

#[allow(clippy::print_stderr)]
fn fail(err: &StorefrontError) -> ! {
    eprintln!("Error: {err}");
    std::process::exit(1);
}

async fn run(command: Commands, storefront: &Storefront) -> Result<(), StorefrontError> {
    match command {
        Commands::Health => commands::events::health(storefront).await,
        Commands::Login { email, password } => {
            commands::auth::login(storefront, &email, password).await
        }
        Commands::Register {
            name,
            email,
            password,
        } => commands::auth::register(storefront, &name, &email, password).await,
        Commands::Logout => commands::auth::logout(storefront).await,
        Commands::Whoami => {
            commands::auth::whoami(storefront).await;
            Ok(())
        }
        Commands::Events { action } => match action {
            EventsAction::List => commands::events::list(storefront).await,
            EventsAction::Show { id } => commands::events::show(storefront, &id).await,
        },
        Commands::Seats { event_id } => commands::events::seats(storefront, &event_id).await,
        Commands::Reserve { event_id, seat_ids } => {
            commands::orders::reserve(storefront, &event_id, &seat_ids).await
        }
        Commands::Checkout { event_id, seats } => {
            commands::orders::checkout(storefront, &event_id, &seats).await
        }
    }
}
