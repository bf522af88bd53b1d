use bookstore::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_tracing(&config)?;
    tracing::info!(
        port = config.service.port,
        database = %config.database.database,
        collection = %config.database.collection,
        "Configuration loaded"
    );

    // A store that cannot be reached aborts startup before the port is bound
    let store = BookStore::connect(&config.database)
        .await
        .inspect_err(|e| tracing::error!("Startup aborted: {}", e))?;

    tracing::info!(backend = store.backend(), "Book store ready");

    let state = AppState::new(config.clone(), store);
    Server::new(config).serve(state).await
}
