//! `abf-migrate`: standalone schema migration runner, mirroring
//! `cmd/migrate/main.go`. The server also runs these migrations itself at
//! startup; this binary exists for operators who want a standalone step.

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "abf-migrate", about = "Run the ABF guard's list store migrations")]
struct Args {
    #[arg(long, env = "ABF_DB_HOST", default_value = "localhost")]
    host: String,
    #[arg(long, env = "ABF_DB_PORT", default_value_t = 5432)]
    port: u16,
    #[arg(long, env = "ABF_DB_NAME", default_value = "abf")]
    dbname: String,
    #[arg(long, env = "ABF_DB_USER", default_value = "abfuser")]
    user: String,
    #[arg(long, env = "ABF_DB_PASSWORD", default_value = "abfpassword")]
    password: String,
    #[arg(long, env = "ABF_DB_SSLMODE", default_value = "require")]
    sslmode: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let url = format!(
        "postgres://{}:{}@{}:{}/{}?sslmode={}",
        args.user, args.password, args.host, args.port, args.dbname, args.sslmode
    );

    let pool = PgPoolOptions::new().connect(&url).await?;

    tracing::info!(host = %args.host, dbname = %args.dbname, "running migrations");
    sqlx::migrate!("../abf-storage/migrations").run(&pool).await?;
    tracing::info!("migrations up to date");

    Ok(())
}
