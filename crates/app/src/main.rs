#![forbid(unsafe_code)]

mod db;
mod input;
mod render;
mod sample;
mod take;

use clap::{Parser, Subcommand};
use exam_core::model::{TestId, UserId};
use services::{AppServices, Clock, RECENT_WINDOW};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::db::{normalize_sqlite_url, prepare_sqlite_file};

#[derive(Parser)]
#[command(name = "exam", version, about = "Timed multiple-choice exam practice")]
struct Cli {
    /// SQLite database URL or file path
    #[arg(
        long,
        global = true,
        env = "EXAM_DB_URL",
        default_value = "sqlite:exam.sqlite3"
    )]
    db: String,

    /// Learner the attempts are recorded for
    #[arg(long, global = true, env = "EXAM_USER_ID", default_value = "local")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available tests, newest first
    List,
    /// Take a test; answers are saved as you go
    Take {
        /// Test identifier, as shown by `list`
        test_id: String,
    },
    /// Show recent results and dashboard stats
    History {
        /// Number of results to show
        #[arg(long, default_value_t = RECENT_WINDOW)]
        limit: u32,
    },
    /// Store the built-in tests if the database has none
    Seed {
        /// Also add this many sample results for the user
        #[arg(long, default_value_t = 0)]
        sample_results: usize,
    },
}

fn init_tracing() -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("warn")
            .add_directive("app=info".parse()?)
            .add_directive("services=info".parse()?)
            .add_directive("storage=info".parse()?),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let user_id: UserId = cli.user.parse()?;
    let db_url = normalize_sqlite_url(&cli.db);
    prepare_sqlite_file(&db_url)?;

    let services = AppServices::new_sqlite(&db_url, Clock::default_clock()).await?;
    info!(db = %db_url, user = %user_id, "storage ready");

    match cli.command {
        Commands::List => {
            let tests = services.catalog().list_tests().await;
            render::test_list(&tests);
        }
        Commands::Take { test_id } => {
            take::run(&services, user_id, TestId::new(test_id)).await?;
        }
        Commands::History { limit } => {
            let history = services.history();
            let results = history.recent_results(&user_id, limit).await?;
            let stats = history.dashboard_stats(&user_id).await?;
            render::history(&results, &stats);
        }
        Commands::Seed { sample_results } => {
            let seeded = services.catalog().seed_if_empty().await?;
            if seeded == 0 {
                println!("Database already has tests; nothing seeded.");
            } else {
                println!("Seeded {seeded} tests into {db_url}");
            }
            if sample_results > 0 {
                let added =
                    sample::add_sample_results(&services, &user_id, sample_results).await?;
                println!("Added {added} of {sample_results} sample results for {user_id}");
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = init_tracing() {
        eprintln!("logging setup failed: {err}");
    }
    if let Err(err) = run(cli).await {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}
