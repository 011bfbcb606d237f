use print_server::{Config, Server, ServerState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv, working directory, logging)
    setup_environment()?;

    print_banner();
    tracing::info!("Print server starting...");

    // 2. Configuration
    let config = Config::from_env();
    tracing::info!(
        environment = %config.environment,
        work_dir = %config.work_dir,
        port = config.http_port,
        "Configuration loaded"
    );

    // 3. State (database, print pipeline)
    let state = ServerState::initialize(&config).await?;

    // 4. HTTP server; background tasks start inside run()
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
