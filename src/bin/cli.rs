//! surrealrpc CLI Client
//!
//! Command-line interface for issuing single commands to a server.

use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::Value;
use surrealrpc::{Client, Config, Context, Credentials};
use tracing_subscriber::{fmt, EnvFilter};

/// surrealrpc CLI
#[derive(Parser, Debug)]
#[command(name = "surrealrpc-cli")]
#[command(about = "CLI for issuing RPC commands to a document database")]
#[command(version)]
struct Args {
    /// Server address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8000")]
    server: String,

    /// User to sign in as
    #[arg(short, long)]
    user: Option<String>,

    /// Password for --user
    #[arg(short, long, default_value = "")]
    pass: String,

    /// Namespace to use
    #[arg(long, requires = "db")]
    ns: Option<String>,

    /// Database to use
    #[arg(long, requires = "ns")]
    db: Option<String>,

    /// Per-call timeout in seconds
    #[arg(short, long, default_value = "30")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show session information
    Info,

    /// Select a table or record
    Select {
        /// Table (`users`) or record (`users:42`)
        thing: String,
    },

    /// Run one or more statements
    Query {
        /// Statement text
        sql: String,

        /// Variables as a JSON object
        #[arg(long, default_value = "{}")]
        vars: String,
    },

    /// Delete a table or record
    Delete {
        /// Table (`users`) or record (`users:42`)
        thing: String,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,surrealrpc=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> surrealrpc::Result<()> {
    let config = Config::builder()
        .server_addr(&args.server)
        .request_timeout(Duration::from_secs(args.timeout))
        .build();

    tracing::debug!("Connecting to {}", config.server_addr);
    let client = Client::connect(config)?;
    let ctx = Context::background();

    if let Some(user) = &args.user {
        client.signin(&ctx, &Credentials::new(user.as_str(), args.pass.as_str()))?;
    }
    if let (Some(ns), Some(db)) = (&args.ns, &args.db) {
        client.use_ns(&ctx, ns, db)?;
    }

    let output = match args.command {
        Commands::Info => client.info(&ctx)?,
        Commands::Select { thing } => client
            .select(&ctx, &thing)?
            .into_value()
            .unwrap_or(Value::Null),
        Commands::Query { sql, vars } => {
            let vars: Value = serde_json::from_str(&vars)?;
            let response = client.query(&ctx, &sql, &vars)?;
            Value::Array(
                response
                    .statements()
                    .iter()
                    .map(|s| s.records.clone().into_value().unwrap_or(Value::Null))
                    .collect(),
            )
        }
        Commands::Delete { thing } => {
            client.delete(&ctx, &thing)?;
            Value::Null
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);

    if let Err(e) = client.close() {
        tracing::debug!("Close failed: {}", e);
    }
    Ok(())
}
