use malipo_confirm::shared::LoggingUtils;
use malipo_confirm::{AppConfig, ConfirmServer};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Initialize logging before anything else; config load failures below
    // should already be visible in the logs
    if let Err(e) = LoggingUtils::initialize("info") {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting payment confirmation service...");

    // Load configuration
    let config = match AppConfig::load() {
        Ok(config) => {
            info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Create and start server
    let server = match ConfirmServer::new(config) {
        Ok(server) => {
            info!("Server initialized successfully");
            server
        }
        Err(e) => {
            error!("Failed to initialize server: {}", e);
            std::process::exit(1);
        }
    };

    info!("Server starting on {}", server.config().server_address());

    if let Err(e) = server.run().await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
