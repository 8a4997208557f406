use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mssql_scaffold::{scaffold_database, ScaffoldCommand, ScaffoldOptions};

/// Environment variable read when `--connection` is omitted
const CONNECTION_ENV: &str = "MSSQL_CONNECTION_STRING";

#[derive(Parser)]
#[command(name = "mssql-scaffold")]
#[command(author, version, about = "Reverse-engineer a SQL Server database into a schema model")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the database catalog and print the discovered model
    Scaffold {
        /// ADO.NET connection string (defaults to $MSSQL_CONNECTION_STRING)
        #[arg(short, long)]
        connection: Option<String>,

        /// Schema to include (repeatable)
        #[arg(short, long = "schema")]
        schemas: Vec<String>,

        /// Table to include, e.g. Orders or [dbo].[Orders] (repeatable)
        #[arg(short, long = "table")]
        tables: Vec<String>,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scaffold {
            connection,
            schemas,
            tables,
            verbose,
        } => {
            let connection_string = match connection {
                Some(c) => c,
                None => std::env::var(CONNECTION_ENV).with_context(|| {
                    format!("no --connection given and {} is not set", CONNECTION_ENV)
                })?,
            };

            let command = ScaffoldCommand {
                connection_string,
                options: ScaffoldOptions { schemas, tables },
                verbose,
            };

            let (model, events) = scaffold_database(&command)?;
            print!("{}", model.summary());

            let warnings: Vec<_> = events.iter().filter(|e| e.is_warning()).collect();
            if !warnings.is_empty() {
                println!("Warnings: {}", warnings.len());
                for warning in warnings {
                    println!("  {}", warning);
                }
            }
        }
    }

    Ok(())
}
