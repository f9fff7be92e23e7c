use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use log::{error, info, warn};

use ragproxy::server::{routes, AppState};
use ragproxy_core::config::ProxyConfig;

#[actix_web::main]
async fn main() {
    let dotenv_result = dotenv::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = dotenv_result {
        warn!("no .env file loaded: {}", e);
    }

    if let Err(e) = serve().await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn serve() -> anyhow::Result<()> {
    let cfg = ProxyConfig::from_env().context("failed to load configuration")?;
    let state = web::Data::new(
        AppState::from_config(&cfg).context("failed to initialize proxy")?,
    );

    info!("starting ragproxy on {}:{}", cfg.host, cfg.port);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(routes)
    })
    .bind((cfg.host.as_str(), cfg.port))
    .with_context(|| format!("failed to bind {}:{}", cfg.host, cfg.port))?
    .run()
    .await
    .context("server terminated")?;
    Ok(())
}
