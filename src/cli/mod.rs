//! `daycare-admin`: bootstrap tasks that cannot go through the HTTP API,
//! since every write endpoint needs a token from an existing user.

pub mod utils;

use clap::{Parser, Subcommand};
use serde_json::json;
use sqlx::Executor;

use crate::database::models::NewDaycare;
use crate::database::DatabaseManager;
use crate::services::{AuthService, DaycareService};
use utils::{output_error, output_success};

const SCHEMA: &str = include_str!("../../sql/schema.sql");

#[derive(Parser)]
#[command(name = "daycare-admin")]
#[command(about = "Daycare API administration - schema setup and bootstrap accounts")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply sql/schema.sql to DATABASE_URL (idempotent)")]
    InitSchema,

    #[command(about = "Create a platform administrator")]
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    #[command(about = "Create a daycare")]
    CreateDaycare {
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },

    #[command(about = "Check database connectivity")]
    Health,
}

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::InitSchema => {
            let pool = DatabaseManager::pool().await?;
            pool.execute(SCHEMA).await?;
            output_success(output_format, "Schema applied", None)
        }
        Commands::CreateAdmin { email, password } => {
            let user = AuthService::new(DatabaseManager::pool().await?)
                .create_admin(&email, &password)
                .await?;
            output_success(
                output_format,
                &format!("Created admin {}", user.email),
                Some(json!({ "id": user.id, "email": user.email })),
            )
        }
        Commands::CreateDaycare {
            name,
            address,
            phone,
            email,
        } => {
            let daycare = DaycareService::new(DatabaseManager::pool().await?)
                .create(NewDaycare {
                    name,
                    address,
                    phone,
                    email,
                })
                .await?;
            output_success(
                output_format,
                &format!("Created daycare {} ({})", daycare.name, daycare.id),
                Some(json!({ "id": daycare.id, "name": daycare.name })),
            )
        }
        Commands::Health => match DatabaseManager::health_check().await {
            Ok(()) => output_success(output_format, "Database reachable", None),
            Err(e) => {
                output_error(output_format, &e.to_string(), Some("DATABASE_UNAVAILABLE"))?;
                anyhow::bail!("database health check failed")
            }
        },
    }
}
