mod api;
mod app;
mod auth;
mod cache;
mod config;
mod content;
mod db;
mod error;
mod filesystem;
mod model;
mod remote;
mod schema;
mod score;
mod storage;
mod string;
mod time;
mod update;

use tracing::error;

#[tokio::main]
async fn main() {
    app::enable_tracing();

    let state = match app::AppState::new().await {
        Ok(state) => state,
        Err(err) => {
            error!("Failed to construct application state. Details:\n{err}");
            std::process::exit(1);
        }
    };
    if let Err(err) = app::initialize(&state) {
        error!("Failed to initialize server. Details:\n{err}");
        std::process::exit(1);
    }
    if let Err(err) = app::run(state).await {
        error!("Server exited with error. Details:\n{err}");
        std::process::exit(1);
    }
}
