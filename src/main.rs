use astra::Server;

use crate::app::App;
use crate::config::AppConfig;
use crate::router::handle;

mod app;
mod auth;
mod config;
mod db;
mod domain;
mod errors;
mod gateway;
mod import;
mod local;
mod logging;
mod responses;
mod router;
mod spreadsheets;

#[cfg(test)]
mod tests;

fn main() {
    logging::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };
    let addr = config.addr;
    let workers = config.workers;

    let app = match App::from_config(config) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = %e, "storage initialization failed");
            std::process::exit(1);
        }
    };

    tracing::info!(%addr, workers, "starting server");

    let server = Server::bind(&addr).max_workers(workers);
    let result = server.serve(move |req, _info| handle(req, &app));

    if let Err(e) = result {
        tracing::error!(error = %e, "server ended with error");
        std::process::exit(1);
    }

    tracing::info!("server shut down cleanly");
}
