//! # Nullboard Backup Binary
//!
//! The entry point that assembles the application based on compile-time features.

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use nb_api::handlers::{self, AppState};
use nb_api::middleware::{cors_policy, payload_config, standard_middleware};
use nb_core::{BackupConfig, BackupService};

#[cfg(feature = "storage-local")]
use nb_storage_local::{LocalSnapshotStore, LocalStashStore};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // 1. Configuration is read from the environment exactly once
    let config = BackupConfig::from_env().context("invalid configuration")?;

    let default_level = if config.debug { "debug" } else { "info" };
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(default_level));

    if config.uses_working_dir() {
        log::warn!("BACKUP_DIR is not set; backups go to the current directory");
    }

    // 2. Initialize Storage Implementation
    #[cfg(feature = "storage-local")]
    let (snapshots, stash) = (
        LocalSnapshotStore::new(config.backup_root.clone()),
        LocalStashStore::new(&config.backup_root),
    );

    // 3. Wrap in AppState (Using dynamic dispatch for maximum flexibility)
    let state = web::Data::new(AppState {
        service: BackupService::new(Box::new(snapshots), Box::new(stash), config.keep_revisions),
    });

    log::info!(
        "nullboard-backup listening on http://{}:{}, storing under {}",
        config.bind_addr,
        config.port,
        config.backup_root.display()
    );
    let max_body_bytes = config.max_body_bytes;

    HttpServer::new(move || {
        App::new()
            .wrap(cors_policy())
            .wrap(standard_middleware())
            .app_data(state.clone())
            .app_data(payload_config(max_body_bytes))
            .configure(nb_api::configure_routes)
            .default_service(web::to(handlers::not_found))
    })
    .bind((config.bind_addr.as_str(), config.port))
    .with_context(|| format!("cannot bind {}:{}", config.bind_addr, config.port))?
    .run()
    .await?;

    Ok(())
}
