use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use std::sync::Arc;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod errors;
mod ledger;
mod model;
mod models;
mod report;
mod routes;
mod utils;

use config::Config;
use db::init_db;

use crate::auth::usernames::UsernameRegistry;
use crate::docs::ApiDoc;
use crate::report::converter::HtmlToPdf;
use crate::report::html::Templates;
use crate::utils::clock::{Clock, SystemClock};
use anyhow::Context;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url, config.db_max_connections).await?;
    let templates = Data::new(Templates::new().context("Failed to compile report templates")?);
    let converter = Data::new(HtmlToPdf::new(config.html_to_pdf_bin.clone()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let clock: Data<dyn Clock> = Data::from(clock);
    let usernames = Data::new(UsernameRegistry::new());

    let warm_pool = pool.clone();
    let warm_usernames = usernames.clone();
    actix_web::rt::spawn(async move {
        match warm_usernames.warmup_filter(&warm_pool, 100).await {
            Ok(count) => info!(count, "Username filter warmed up"),
            Err(e) => warn!(error = %e, "Failed to warm up username filter"),
        }
        // Users active in the last 30 days
        match warm_usernames.warmup_cache(&warm_pool, 30, 250).await {
            Ok(count) => info!(count, "Username cache warmed up"),
            Err(e) => warn!(error = %e, "Failed to warm up username cache"),
        }
    });

    let server_addr = config.server_addr.clone();
    let pool = Data::new(pool);
    let config_data = Data::new(config.clone());

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard so the JS/CSS assets match
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(pool.clone())
            .app_data(config_data.clone())
            .app_data(clock.clone())
            .app_data(templates.clone())
            .app_data(converter.clone())
            .app_data(usernames.clone())
            .configure(|cfg| routes::configure(cfg, config.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {}", server_addr))?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}
