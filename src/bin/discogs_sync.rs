use std::env;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::{error, info};

use chrono::Utc;
use platter::config::Config;
use platter::credentials::{CredentialError, CredentialStore, StoredConnection};
use platter::db::Database;
use platter::discogs::{DiscogsClient, OauthFlow, TokenStore};
use platter::sync::{CancelFlag, DiscogsAccount, SyncReport, SyncService};

#[tokio::main]
async fn main() {
    // Use RUST_LOG env var if set, otherwise default to info level
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(log_filter).init();

    let args: Vec<String> = env::args().collect();

    let mut disconnect = false;
    let mut status_only = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--disconnect" => {
                disconnect = true;
                i += 1;
            }
            "--status" => {
                status_only = true;
                i += 1;
            }
            _ => {
                error!("Unknown argument: {}", args[i]);
                print_usage(&args[0]);
                std::process::exit(1);
            }
        }
    }

    let config = Config::load();
    if let Err(e) = config.validate() {
        error!("{}", e);
        error!("Set PLATTER_DISCOGS_CONSUMER_KEY and PLATTER_DISCOGS_CONSUMER_SECRET");
        std::process::exit(1);
    }

    let store = match CredentialStore::new() {
        Ok(store) => store,
        Err(e) => {
            error!("Cannot open system keychain: {}", e);
            std::process::exit(1);
        }
    };

    if disconnect {
        if let Err(e) = store.clear() {
            error!("Failed to remove stored connection: {}", e);
            std::process::exit(1);
        }
        println!("Disconnected from Discogs.");
        return;
    }

    if status_only {
        match store.load() {
            Ok(connection) => println!("Connected as {}", connection.username),
            Err(CredentialError::NotFound) => println!("Not connected."),
            Err(e) => {
                error!("Failed to read stored connection: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let client = match DiscogsClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let connection = match store.load() {
        Ok(connection) => connection,
        Err(CredentialError::NotFound) => match connect(&client, &store).await {
            Ok(connection) => connection,
            Err(e) => {
                error!("Authorization failed: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to read stored connection: {}", e);
            std::process::exit(1);
        }
    };

    let library_path = config.get_library_path();
    if let Err(e) = std::fs::create_dir_all(&library_path) {
        error!("Cannot create {}: {}", library_path.display(), e);
        std::process::exit(1);
    }

    let db_path = library_path.join("library.db");
    let database = match Database::new(&db_path.to_string_lossy()).await {
        Ok(database) => database,
        Err(e) => {
            error!("Failed to open library database: {}", e);
            std::process::exit(1);
        }
    };

    let db_account = match database.upsert_discogs_account(&connection.username).await {
        Ok(account) => account,
        Err(e) => {
            error!("Failed to record account: {}", e);
            std::process::exit(1);
        }
    };

    let account = DiscogsAccount {
        username: connection.username.clone(),
        credentials: Some(connection.credentials.clone()),
        sync_enabled: db_account.sync_enabled,
    };

    // Ctrl-C finishes the current item and returns a partial report
    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, finishing current item");
                cancel.cancel();
            }
        });
    }

    let service = SyncService::new(Arc::new(client), Arc::new(database.clone()));
    let report = match service.import_collection(&account, &cancel).await {
        Ok(report) => report,
        Err(e) => {
            error!("Sync failed: {}", e);
            std::process::exit(1);
        }
    };

    if report.errors.is_empty() && !cancel.is_cancelled() {
        if let Err(e) = database.mark_sync_completed(&db_account.id, Utc::now()).await {
            error!("Failed to stamp sync time: {}", e);
        }
    }

    print_report(&report);
}

/// First-run PIN handshake: open the URL, paste the code, store the result.
async fn connect(
    client: &DiscogsClient,
    store: &CredentialStore,
) -> Result<StoredConnection, Box<dyn std::error::Error>> {
    let token_store = Arc::new(TokenStore::new());
    let flow = OauthFlow::new(client.clone(), token_store);

    let pending = flow.begin().await?;

    println!("Open this URL in a browser and approve the application:");
    println!();
    println!("  {}", pending.authorize_url);
    println!();
    print!("Enter the code shown by Discogs: ");
    io::stdout().flush()?;

    let mut pin = String::new();
    io::stdin().lock().read_line(&mut pin)?;

    let credentials = flow.complete(&pending.token, pin.trim()).await?;
    let identity = client.identity(&credentials).await?;

    let connection = StoredConnection {
        username: identity.username,
        credentials,
    };
    store.store(&connection)?;

    println!("Connected as {}.", connection.username);
    Ok(connection)
}

fn print_report(report: &SyncReport) {
    println!(
        "Sync complete: {} imported, {} skipped, {} error(s)",
        report.imported,
        report.skipped,
        report.errors.len()
    );
    for error in &report.errors {
        println!("  {}: {}", error.label, error.message);
    }
}

fn print_usage(program_name: &str) {
    eprintln!("Usage:");
    eprintln!("  {}              sync the Discogs collection into the library", program_name);
    eprintln!("  {} --status     show the stored connection", program_name);
    eprintln!("  {} --disconnect remove the stored connection", program_name);
}
