//! StudyWise server binary.
//!
//! ```bash
//! GEMINI_API_KEY=... studywise-server --port 3001
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use studywise_core::{Config, Database, GeminiClient, GenerativeError};
use studywise_server::{serve, upload_dir, AppState};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "studywise-server", version, about = "StudyWise HTTP API server")]
struct Args {
    /// Port to listen on (overrides server.port)
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Host to bind to (overrides server.host)
    #[arg(long)]
    host: Option<String>,

    /// SQLite file for the session log (defaults to the data directory)
    #[arg(long)]
    db: Option<std::path::PathBuf>,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "studywise_server=info,studywise_core=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    let config = Config::load_or_default();
    let mut server = config.server.clone();
    if let Some(port) = args.port {
        server.port = port;
    }
    if let Some(host) = args.host {
        server.host = host;
    }

    let db = match args.db {
        Some(path) => Database::open_at(&path).map_err(Into::into),
        None => Database::open(),
    };
    let db = match db {
        Ok(db) => db,
        Err(e) => {
            error!(error = %e, "Failed to open session database");
            return ExitCode::FAILURE;
        }
    };

    let gemini = match GeminiClient::from_config(&config.gemini) {
        Ok(client) => {
            info!(model = %config.gemini.model, "AI connected");
            Some(client)
        }
        Err(GenerativeError::MissingCredential) => {
            warn!("GEMINI_API_KEY not set; uploads will work but AI processing will fail");
            None
        }
        Err(e) => {
            error!(error = %e, "Failed to configure generative client");
            return ExitCode::FAILURE;
        }
    };

    let upload_dir = match upload_dir(&server) {
        Ok(dir) => dir,
        Err(e) => {
            error!(error = %e, "Upload directory unavailable");
            return ExitCode::FAILURE;
        }
    };

    let state = Arc::new(AppState {
        sessions: Arc::new(db),
        gemini,
        upload_dir,
    });

    match serve(state, &server).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}
