// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use axum::Router;
use axum::routing::get;
use axum::routing::put;
use supercard_core::OwnerId;
use tokio::net::TcpListener;
use tokio::signal;

use crate::cmd::serve::read::card_handler;
use crate::cmd::serve::read::list_handler;
use crate::cmd::serve::state::ApiError;
use crate::cmd::serve::state::ServerState;
use crate::cmd::serve::write::create_handler;
use crate::cmd::serve::write::delete_handler;
use crate::cmd::serve::write::edit_handler;
use crate::cmd::serve::write::review_handler;
use crate::config::Config;
use crate::db::Database;
use crate::error::Fallible;

pub struct ServerConfig {
    pub database: PathBuf,
    pub host: String,
    pub port: u16,
    pub owner: OwnerId,
    pub page_size: usize,
}

impl From<Config> for ServerConfig {
    fn from(config: Config) -> Self {
        Self {
            database: config.database,
            host: config.host,
            port: config.port,
            owner: config.owner,
            page_size: config.page_size,
        }
    }
}

pub async fn start_server(config: ServerConfig) -> Fallible<()> {
    let db = Database::open(&config.database)?;
    let state = ServerState {
        owner: config.owner,
        page_size: config.page_size,
        db: Arc::new(Mutex::new(db)),
    };
    let app = Router::new();
    let app = app.route("/api/cards", get(list_handler).post(create_handler));
    let app = app.route(
        "/api/cards/{id}",
        get(card_handler).put(edit_handler).delete(delete_handler),
    );
    let app = app.route("/api/cards/{id}/review", put(review_handler));
    let app = app.fallback(not_found_handler);
    let app = app.with_state(state);
    let bind = format!("{}:{}", config.host, config.port);

    log::info!("Serving cards for owner {} on http://{bind}", config.owner);
    let listener = TcpListener::bind(bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn not_found_handler() -> ApiError {
    ApiError::NotFound
}

async fn shutdown_signal() {
    signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    log::debug!("Received Ctrl+C, shutting down gracefully");
}
