use anyhow::Result;
use shop_orderservice::{
    app_state::AppState,
    bootstrap::{self, bootstrap},
    config, create_app, db,
};

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_env();
    bootstrap::init_tracing();

    let config = config::load()?;

    tracing::info!("Running migrations...");
    let migrations_count = db::run_migrations_blocking(&config.database.url).await?;
    tracing::info!("Run {} new migrations successfully", migrations_count);

    let db_pool = db::create_pool(&config.database).await?;
    let app = create_app(AppState::new(db_pool));

    tracing::info!("Bootstrapping...");
    bootstrap("OrderService", app, &config.server).await?;
    Ok(())
}
