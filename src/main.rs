use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use academia::db::DatabaseProvider;
use academia::web::WebServer;
use academia::Config;

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    // Missing file means defaults; a present but broken file is fatal
    let config = if Path::new(CONFIG_PATH).exists() {
        match Config::load_with_env(CONFIG_PATH) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {CONFIG_PATH}: {e}");
                std::process::exit(1);
            }
        }
    } else {
        eprintln!("{CONFIG_PATH} not found. Using default configuration.");
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    };

    if let Err(e) = academia::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        academia::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    info!("Academia - academic resource sharing server");

    let db = Arc::new(DatabaseProvider::new(&config.database.path));
    if let Err(e) = db.get().await {
        error!("Failed to open database {}: {}", config.database.path, e);
        std::process::exit(1);
    }
    info!("Database ready at {}", config.database.path);

    let store = match academia::storage::open(&config) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to initialize object store: {}", e);
            std::process::exit(1);
        }
    };
    info!("Object store backend: {}", store.name());

    let server = match WebServer::new(&config, db, store) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to configure web server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        error!("Web server error: {}", e);
        std::process::exit(1);
    }
}
