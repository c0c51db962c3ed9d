//! Insert a single account into the database, e.g. to bootstrap an admin.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use account_store::{AccountError, AccountStore, Config};

#[derive(Debug, Parser)]
#[command(about = "Register one account in the account database")]
struct Args {
    #[arg(long)]
    username: String,

    #[arg(long)]
    email: String,

    #[arg(long, env = "SEED_PASSWORD", hide_env_values = true)]
    password: String,

    /// Overrides `DATABASE_URL`.
    #[arg(long)]
    database_url: Option<String>,
}

fn main() -> ExitCode {
    account_store::init_logging();
    let args = Args::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    if let Some(url) = args.database_url {
        config = config.with_database_url(url);
    }

    let store = match AccountStore::open(&config) {
        Ok(store) => store,
        Err(err) => {
            error!(%err, "could not open the account database");
            return ExitCode::FAILURE;
        }
    };

    match store.register(args.username.trim(), args.email.trim(), &args.password) {
        Ok(account) => {
            info!(id = account.id, username = %account.username, "account seeded");
            ExitCode::SUCCESS
        }
        Err(AccountError::DuplicateAccount) => {
            error!(
                username = %args.username.trim(),
                email = %args.email.trim(),
                "username or email already exists"
            );
            ExitCode::FAILURE
        }
        Err(err) => {
            error!(%err, "could not seed account");
            ExitCode::FAILURE
        }
    }
}
