//! Solid Ops CLI - Migrations and day-to-day inventory operations.
//!
//! # Usage
//!
//! ```bash
//! # Apply the ops schema migrations
//! solid-ops migrate
//!
//! # Catalog and stock
//! solid-ops ingredient add --name "Shea butter" --unit g --cost 0.04
//! solid-ops stock in 1 1000 --cost 0.04
//! solid-ops stock balances
//!
//! # Recipes and production
//! solid-ops recipe create --file shampoo-bar.yaml
//! solid-ops recipe cost 1
//! solid-ops --actor 7 batch plan --recipe 1 --units 40
//! solid-ops --actor 7 batch produce 1
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `ingredient` - Manage the ingredient catalog
//! - `stock` - Record movements and read balances
//! - `recipe` - Manage recipes and cost sheets
//! - `batch` - Plan, produce and cancel production batches
//!
//! Configuration is read from the environment (see `solid_ops::config`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use solid_ops::config::{LogFormat, OpsConfig};
use solid_ops::db::{self, PgStore};
use solid_ops_core::UserId;

mod commands;

use commands::CommandError;
use commands::batch::BatchAction;
use commands::ingredient::IngredientAction;
use commands::recipe::RecipeAction;
use commands::stock::StockAction;

#[derive(Parser)]
#[command(name = "solid-ops")]
#[command(author, version, about = "Solid cosmetics inventory and production tools")]
struct Cli {
    /// User recorded as the author of movements and batches
    #[arg(long, global = true, env = "OPS_ACTOR_ID", default_value_t = 1)]
    actor: i32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage ingredients
    Ingredient {
        #[command(subcommand)]
        action: IngredientAction,
    },
    /// Record stock movements and read balances
    Stock {
        #[command(subcommand)]
        action: StockAction,
    },
    /// Manage recipes
    Recipe {
        #[command(subcommand)]
        action: RecipeAction,
    },
    /// Manage production batches
    Batch {
        #[command(subcommand)]
        action: BatchAction,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &OpsConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Only errors become Sentry events; rejected requests are logged at WARN
/// and kept as breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO | tracing::Level::DEBUG => {
            sentry_tracing::EventFilter::Breadcrumb
        }
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(config: &OpsConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "solid_ops=info,solid_ops_cli=info".into());

    let is_json = config.log_format == LogFormat::Json;
    let json_layer = is_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!is_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match OpsConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            // No subscriber yet
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Failed to load configuration: {e}");
            }
            std::process::exit(2);
        }
    };

    // Sentry before the subscriber so the tracing layer has a client
    let _sentry_guard = init_sentry(&config);
    init_tracing(&config);

    if let Err(e) = run(cli, &config).await {
        if e.is_internal() {
            tracing::error!(error = %e, "Command failed");
        } else {
            tracing::warn!(error = %e, "Command rejected");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &OpsConfig) -> Result<(), CommandError> {
    let pool = db::create_pool(&config.database).await?;
    tracing::debug!("Database pool created");

    let store = PgStore::new(pool);
    let actor = UserId::new(cli.actor);

    match cli.command {
        Commands::Migrate => commands::migrate::run(store.pool()).await,
        Commands::Ingredient { action } => commands::ingredient::run(&store, action).await,
        Commands::Stock { action } => commands::stock::run(&store, action, actor).await,
        Commands::Recipe { action } => commands::recipe::run(&store, action).await,
        Commands::Batch { action } => commands::batch::run(&store, action, actor).await,
    }
}
