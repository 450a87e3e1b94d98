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

use clap::Parser;
use clap::Subcommand;
use supercard_core::CardEdit;
use supercard_core::CardId;
use supercard_core::OwnerId;

use crate::cmd::cards::CardListing;
use crate::cmd::cards::add_card;
use crate::cmd::cards::delete_card;
use crate::cmd::cards::edit_card;
use crate::cmd::cards::list_cards;
use crate::cmd::cards::parse_answer;
use crate::cmd::cards::review_card;
use crate::cmd::cards::show_card;
use crate::cmd::serve::server::ServerConfig;
use crate::cmd::serve::server::start_server;
use crate::config::Config;
use crate::error::Fallible;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file. By default, `supercard.toml` in the
    /// current directory is used if it exists.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Act on this learner's cards instead of the configured owner.
    #[arg(long, global = true)]
    owner: Option<OwnerId>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the card API over HTTP.
    Serve {
        /// The host address to bind to.
        #[arg(long)]
        host: Option<String>,
        /// The port to listen on.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Create a new card. New cards are due immediately.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long, default_value = "")]
        answer: String,
    },
    /// Change the text of a card. Its schedule is not affected.
    Edit {
        id: CardId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        answer: Option<String>,
    },
    /// Record a review of a card.
    Review {
        id: CardId,
        /// One of easy, good, hard, fail.
        grade: Option<String>,
        /// Pass/fail answer instead of a grade: success or failure.
        #[arg(long)]
        outcome: Option<String>,
    },
    /// List the cards due today.
    Due {
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Cards per page. Defaults to the configured page size.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List all cards.
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Cards per page. Defaults to the configured page size.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print a single card.
    Show { id: CardId },
    /// Delete a card.
    Delete { id: CardId },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(owner) = cli.owner {
        config.owner = owner;
    }
    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            start_server(ServerConfig::from(config)).await
        }
        Command::Add {
            title,
            content,
            answer,
        } => add_card(&config, title, content, answer),
        Command::Edit {
            id,
            title,
            content,
            answer,
        } => edit_card(
            &config,
            id,
            CardEdit {
                title,
                content,
                answer,
            },
        ),
        Command::Review { id, grade, outcome } => {
            let grade = parse_answer(grade, outcome)?;
            review_card(&config, id, grade)
        }
        Command::Due { page, limit } => list_cards(&config, CardListing::Due, page, limit),
        Command::List { page, limit } => list_cards(&config, CardListing::All, page, limit),
        Command::Show { id } => show_card(&config, id),
        Command::Delete { id } => delete_card(&config, id),
    }
}
