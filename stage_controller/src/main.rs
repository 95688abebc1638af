use std::{path::PathBuf, sync::Arc};

use stage_controller::{
    communication::service::run_communication_layer,
    config::{create_default_config, init_config},
    controller::engine::ControllerEngine,
    logging,
};

fn should_create_config() -> bool {
    std::env::var("CREATE_CONFIG")
        .map(|val| val == "1" || val.to_lowercase() == "true")
        .unwrap_or(false)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _log_guard = logging::init();

    if should_create_config() {
        create_default_config(None::<PathBuf>)?;
    }

    let (_config_manager, config) = init_config().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Run with CREATE_CONFIG=1 to create a default configuration file.");
        e
    })?;

    let engine = Arc::new(ControllerEngine::new(config.engine.clone()));

    run_communication_layer(engine, Arc::new(config)).await
}
