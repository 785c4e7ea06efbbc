//! dynql CLI Entry Point
//!
//! Connects to the store, authenticates the operator, and hands the
//! session to the interactive loop. Result output goes to stdout; logs go
//! to stderr.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dialoguer::{Input, Password};
use tracing_subscriber::EnvFilter;

use dynql::auth;
use dynql::repl::{self, Interpreter};
use dynql::store::memory::MemoryStore;
use dynql::store::RecordStore;
use dynql::value::{record_from_json, Record};

/// Role-gated interactive shell for DynamoDB-style key-value stores
#[derive(Parser)]
#[command(name = "dynql")]
#[command(about = "Role-gated interactive shell for DynamoDB-style key-value stores")]
#[command(version)]
struct Cli {
    /// Store endpoint (defaults to $DYNAMO_ENDPOINT, then a local store)
    #[arg(long)]
    endpoint: Option<String>,

    /// Store region
    #[arg(long)]
    region: Option<String>,

    /// Run against a seeded in-memory store instead of a remote endpoint
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let (store, target) = open_store(&cli).await?;

    println!("=== dynql shell (connected to {target}) ===");
    let username: String = Input::new()
        .with_prompt("login")
        .interact_text()
        .context("failed to read login")?;
    let password = Password::new()
        .with_prompt("password")
        .interact()
        .context("failed to read password")?;

    let Some(session) = auth::authenticate(store.as_ref(), username.trim(), &password).await?
    else {
        eprintln!("access denied: invalid login or password");
        return Ok(());
    };
    println!("logged in as {} (role: {})", session.username(), session.role());

    let interpreter = Interpreter::new(session, store);
    repl::run(&interpreter).await
}

/// Open the configured store backend
async fn open_store(cli: &Cli) -> anyhow::Result<(Arc<dyn RecordStore>, String)> {
    if cli.memory {
        let store = seed_demo_store().await?;
        return Ok((store, "in-memory demo store (login: admin/admin)".to_string()));
    }
    #[cfg(feature = "dynamodb")]
    {
        let config = dynql::StoreConfig::resolve(cli.endpoint.clone(), cli.region.clone());
        let target = config.endpoint.clone();
        let store = dynql::store::dynamo::DynamoStore::connect(&config).await;
        Ok((Arc::new(store), target))
    }
    #[cfg(not(feature = "dynamodb"))]
    {
        anyhow::bail!("this build has no DynamoDB support; run with --memory")
    }
}

/// Seed users, roles, and a sample table for `--memory` mode
async fn seed_demo_store() -> anyhow::Result<Arc<MemoryStore>> {
    let store = Arc::new(MemoryStore::new());
    store.create_table(auth::USERS_TABLE, &["username"]);
    store.create_table(auth::ROLES_TABLE, &["role_name"]);
    store.create_table("inventory", &["sku"]);

    let seeds = [
        (auth::USERS_TABLE, r#"{"username": "admin", "password": "admin", "role": "admin"}"#),
        (auth::USERS_TABLE, r#"{"username": "reader", "password": "reader", "role": "viewer"}"#),
        (auth::ROLES_TABLE, r#"{"role_name": "admin", "permissions": "READ,INSERT,UPDATE,DELETE"}"#),
        (auth::ROLES_TABLE, r#"{"role_name": "viewer", "permissions": "READ"}"#),
        (auth::USERS_TABLE, r#"{"username": "clerk", "password": "clerk", "role": "editor"}"#),
        (auth::ROLES_TABLE, r#"{"role_name": "editor", "permissions": "READ,INSERT,UPDATE"}"#),
        ("inventory", r#"{"sku": "A-1", "qty": 3, "loc": "B2"}"#),
        ("inventory", r#"{"sku": "A-2", "qty": 12, "loc": "C1"}"#),
    ];
    for (table, json) in seeds {
        let record = demo_record(json)?;
        store.put(table, record).await?;
    }
    Ok(store)
}

fn demo_record(json: &str) -> anyhow::Result<Record> {
    let object: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(json).context("invalid demo seed")?;
    Ok(record_from_json(object)?)
}
