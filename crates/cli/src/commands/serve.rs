//! `robert serve`: Start the HTTP gateway.

use std::path::Path;

pub async fn run(
    config_path: &Path,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (mut config, secrets) = super::load(config_path)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    let agent = robert_agent::build(&config, &secrets)?;

    println!("Agent R.O.B.E.R.T. Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Auth required: {}", !secrets.gateway_api_keys.is_empty());
    if config.gateway.allowed_origins.is_empty() {
        println!("   CORS origins: any");
    } else {
        println!("   CORS origins: {}", config.gateway.allowed_origins.join(", "));
    }

    robert_gateway::start(
        agent,
        &config.gateway.host,
        config.gateway.port,
        secrets.gateway_api_keys,
        config.gateway.allowed_origins,
    )
    .await?;

    Ok(())
}
