use std::sync::Arc;
use std::time::Duration;

use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod routes;
mod service;
mod state;
mod store;
#[cfg(test)]
mod testing;
mod utils;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::service::automation::AutomationService;
use crate::service::leave::LeaveService;
use crate::service::notifier::Notifier;
use crate::state::AppState;
use crate::store::mysql::MySqlStore;
use crate::store::role_cache::CachedRoleDirectory;
use crate::utils::clock::{Clock, SystemClock};
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/health")]
async fn health() -> impl Responder {
    "OK"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let level: tracing::Level = config
        .log_level
        .parse()
        .with_context(|| format!("LOG_LEVEL has invalid value '{}'", config.log_level))?;

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url, config.db_max_connections).await?;
    let store = Arc::new(MySqlStore::new(pool));
    let directory = Arc::new(CachedRoleDirectory::new(
        store.clone(),
        Duration::from_secs(config.role_cache_ttl_secs),
    ));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let notifier = Notifier::new(store.clone(), directory);

    let state = AppState {
        leave: Arc::new(LeaveService::new(
            store.clone(),
            notifier.clone(),
            clock.clone(),
            config.leave_approver_roles.clone(),
        )),
        automation: Arc::new(AutomationService::new(store, notifier, clock)),
    };

    let limiter = routes::protected_limiter(&config)?;
    let server_addr = config.server_addr.clone();

    info!(
        addr = %server_addr,
        approver_roles = ?config.leave_approver_roles,
        "Listening"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(config.clone()))
            .app_data(Data::new(state.clone()))
            .service(health)
            // Protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, &config, limiter.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {}", server_addr))?
    .run()
    .await?;

    Ok(())
}
