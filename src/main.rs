use dashboard::{Config, app};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env();
    log::info!(
        "Starting dashboard with database directory {}",
        config.database_dir.display()
    );

    app::run(config).await
}
