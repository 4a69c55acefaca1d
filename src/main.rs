use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre::Context};
use url::Url;

use spotify_slack_status::{
    config::Config,
    credentials::{ClientCredentials, CredentialStore},
    http_server::{self, app::HttpServerConfig, state::AppState},
    logging::{SERVICE_NAME, init_tracing},
    persistence::FileStore,
    services::{
        background::BackgroundTasks, playback_poller::PlaybackPoller,
        status_publisher::StatusPublisher, status_sync::StatusSync,
        token_refresher::TokenRefresher,
    },
    slack_rs::SlackClient,
    spotify_rs::{
        auth::{SPOTIFY_AUTH_URL, SpotifyAuthClient},
        client::SpotifyPlaybackClient,
    },
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "BRIDGE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `spotify_slack_status=debug`
    #[arg(long, default_value = "info", global = true, env = "LOG_LEVEL")]
    log_level: String,

    /// Export spans to this OTLP gRPC endpoint
    #[arg(long, global = true, env = "OTLP_ENDPOINT")]
    otlp_endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

fn is_url(s: &str) -> Result<String, String> {
    Url::parse(s)
        .map(|_| s.to_string())
        .map_err(|e| format!("`{}` is not a valid URL: {}", s, e))
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the login server and keep the Slack status in sync
    Serve {
        /// The port to run the server on
        #[arg(short, long, default_value = "3000", env = "BRIDGE_HTTP_PORT")]
        port: u16,

        /// Spotify application client id
        #[arg(long, env = "SPOTIFY_CLIENT_ID")]
        spotify_client_id: String,

        /// Spotify application client secret
        #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
        spotify_client_secret: String,

        /// Redirect URI registered with the Spotify application
        #[arg(
            long,
            default_value = "http://localhost:3000/callback",
            value_parser = is_url,
            env = "REDIRECT_URI"
        )]
        redirect_uri: String,

        /// Slack user token with the users.profile:write scope
        #[arg(long, env = "SLACK_BOT_TOKEN", hide_env_values = true)]
        slack_token: String,

        /// Refresh token to start with when none has been persisted yet
        #[arg(long, env = "SPOTIFY_REFRESH_TOKEN", hide_env_values = true)]
        spotify_refresh_token: Option<String>,
    },
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    color_eyre::install()?;

    let args = Args::parse();
    let tracer_provider = init_tracing(
        SERVICE_NAME,
        args.otlp_endpoint.as_deref(),
        &args.log_level,
    )?;

    let config = {
        if let Some(config) = &args.config {
            Config::from_file(config)
        } else {
            Config::load()
        }
    }
    .wrap_err("Failed to load config")?;

    match args.command {
        Commands::Config(config_commands) => match config_commands {
            ConfigCommands::CreateDefault => {
                let path = Config::create_default()?;
                tracing::info!("Default config available at {}", path.display());
            }
            ConfigCommands::Path => match Config::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No default config path found"),
            },
        },
        Commands::Serve {
            port,
            spotify_client_id,
            spotify_client_secret,
            redirect_uri,
            slack_token,
            spotify_refresh_token,
        } => {
            let state_file = config.state_file_path()?;
            tracing::debug!("Using state file at: {}", state_file.display());
            let store = Arc::new(FileStore::new(state_file));

            let client = ClientCredentials {
                client_id: spotify_client_id,
                client_secret: spotify_client_secret,
                redirect_uri,
            };
            let credentials = Arc::new(
                CredentialStore::load(client.clone(), spotify_refresh_token, store)
                    .wrap_err("Failed to load persisted credentials")?,
            );

            let timeout = config.request_timeout();
            let auth_server = Arc::new(SpotifyAuthClient::new(client, timeout));
            let refresher = Arc::new(TokenRefresher::new(
                credentials.clone(),
                auth_server.clone(),
            ));
            let status_sync = Arc::new(StatusSync::new(
                PlaybackPoller::new(
                    credentials.clone(),
                    refresher.clone(),
                    Arc::new(SpotifyPlaybackClient::new(timeout)),
                ),
                StatusPublisher::new(
                    Arc::new(SlackClient::new(slack_token, timeout)),
                    config.status_emoji().to_string(),
                    config.status_expiration(),
                ),
            ));

            let tasks = BackgroundTasks::start(
                refresher.clone(),
                status_sync.clone(),
                config.schedule(),
            );

            let server = http_server::app::start(
                HttpServerConfig {
                    port,
                    app_state: Arc::new(AppState {
                        credentials,
                        auth_server,
                        refresher,
                        status_sync,
                        authorize_url: SPOTIFY_AUTH_URL.to_string(),
                    }),
                },
                async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!(error = %e, "Failed to listen for shutdown signal");
                    }
                    tracing::info!("Shutting down");
                },
            )
            .await;

            tasks.shutdown().await;
            server?;
        }
    }

    if let Some(tracer_provider) = tracer_provider {
        tracer_provider
            .shutdown()
            .wrap_err("Failed to flush traces")?;
    }

    Ok(())
}
