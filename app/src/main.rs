use tracing::{error, info};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let path = opyn_lib::config_path(
        std::env::args().skip(1),
        std::env::var(opyn_lib::CONFIG_ENV).ok(),
    );
    let config = match opyn_lib::load_config(
        path.as_deref(),
        std::env::var(opyn_lib::PRIVATE_KEY_ENV).ok(),
    ) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e:#}");
            std::process::exit(1);
        }
    };

    opyn_lib::init_logging(&config.logging);
    info!("opyn starting");

    if let Err(e) = opyn_lib::run(config).await {
        error!(error = %e, "Fatal error");
        std::process::exit(1);
    }

    info!("opyn stopped");
}
