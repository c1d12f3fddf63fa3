//! xasd - music player command line

mod config;
mod player;

use crate::config::AppConfig;
use crate::player::PlayOptions;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use xasd_client::{
    ClientConfig, FileTokenStore, SearchFilter, SearchState, Session, XasdClient,
};

#[derive(Parser)]
#[command(name = "xasd")]
#[command(about = "xasd music player", long_about = None, version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "XASD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the access token
    Login {
        /// Username
        #[arg(short, long)]
        username: String,
        /// Password
        #[arg(short, long, env = "XASD_PASSWORD")]
        password: String,
    },
    /// Forget the stored access token
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Search the catalog
    Search {
        /// Search query
        query: String,
        /// all | tracks
        #[arg(short, long, default_value = "all")]
        filter: SearchFilter,
    },
    /// Search, queue the results and play them on the virtual engine
    Play {
        /// Search query
        query: String,
        /// all | tracks
        #[arg(short, long, default_value = "all")]
        filter: SearchFilter,
        /// Queue at most this many results
        #[arg(short, long)]
        limit: Option<usize>,
        /// Playback speed multiplier
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
        /// Length of every virtual track, in seconds
        #[arg(long, default_value_t = 180)]
        track_secs: u64,
        /// Volume (0-100)
        #[arg(long)]
        volume: Option<u8>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "xasd=info,xasd_playback=info,xasd_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Login { username, password } => {
            let mut session = open_session(&config)?;
            let user = session.login(&username, &password).await?;
            println!("Logged in as {} <{}>", user.name, user.email_address);
        }
        Commands::Logout => {
            let mut session = open_session(&config)?;
            session.logout().await?;
            println!("Logged out");
        }
        Commands::Whoami => {
            let mut session = open_session(&config)?;
            match session.restore().await? {
                Some(user) => println!("{} <{}> (id {})", user.name, user.email_address, user.user_id),
                None => println!("Not logged in"),
            }
        }
        Commands::Search { query, filter } => {
            let client = XasdClient::new(ClientConfig::new(&config.server.url))?;
            let tracks = search(&client, query, filter, None).await?;

            if tracks.is_empty() {
                println!("No results");
            }
            for track in tracks {
                println!("{:>6}  {} - {}", track.id, track.artist, track.title);
            }
        }
        Commands::Play {
            query,
            filter,
            limit,
            speed,
            track_secs,
            volume,
        } => {
            let client = XasdClient::new(ClientConfig::new(&config.server.url))?;
            let tracks = search(&client, query, filter, limit).await?;

            let options = PlayOptions {
                speed,
                track_length: Duration::from_secs(track_secs),
                volume,
            };
            player::play_queue(config.playback.clone(), tracks, options).await?;
        }
    }

    Ok(())
}

fn open_session(config: &AppConfig) -> anyhow::Result<Session<FileTokenStore>> {
    let client = XasdClient::new(ClientConfig::new(&config.server.url))?;
    let store = FileTokenStore::new(config.session.token_path.clone());
    Ok(Session::new(client, store))
}

async fn search(
    client: &XasdClient,
    query: String,
    filter: SearchFilter,
    limit: Option<usize>,
) -> anyhow::Result<Vec<xasd_playback::Track>> {
    let mut state = SearchState::new();
    state.set_query(query);
    state.set_filter(filter);
    state.run(client).await?;

    let mut tracks = state.results;
    if let Some(limit) = limit {
        tracks.truncate(limit);
    }
    tracing::info!(results = tracks.len(), filter = %filter, "Search complete");
    Ok(tracks)
}
