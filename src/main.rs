extern crate dotenv;

pub mod app;
pub mod config;
pub mod database;
pub mod pagination;
pub mod responses;
pub mod schema;

mod auth;
mod routes;

use actix_web::{middleware::Logger, web::Data, App, HttpServer};
use anyhow::Context;
use chrono::Duration;

use crate::{
    app::AppState,
    auth::token::TokenKeys,
    config::Settings,
    database::db_utils::{build_pool, run_migrations},
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::from_env()?;

    let pool = build_pool(&settings.database_url, settings.pool_size)
        .with_context(|| format!("could not open database {}", settings.database_url))?;
    let applied = run_migrations(&pool)?;
    log::info!("database {} ready, {applied} migration(s) applied", settings.database_url);

    let tokens = TokenKeys::new(
        settings.jwt_secret.as_bytes(),
        Duration::seconds(settings.access_token_lifetime),
        Duration::seconds(settings.refresh_token_lifetime),
    );
    let app_state = AppState::new(pool, tokens);

    log::info!("Server running on {}:{}", settings.bind_address, settings.port);
    HttpServer::new(move || {
        App::new()
            .app_data(Data::new(app_state.clone()))
            .wrap(Logger::default())
            .configure(routes::configure)
    })
    .bind((settings.bind_address.as_str(), settings.port))?
    .run()
    .await?;

    Ok(())
}
