//! `genweb serve`: start the HTTP gateway and front-end.

use genweb_config::AppConfig;

pub async fn run(
    mut config: AppConfig,
    port_override: Option<u16>,
    host_override: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port_override {
        config.gateway.port = port;
    }
    if let Some(host) = host_override {
        config.gateway.host = host;
    }

    println!("GenWeb Gateway");
    println!("   Listening:  http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   Agents:     {}", config.gateway.agents_file.display());
    println!("   Front-end:  {}", config.gateway.static_dir.display());
    println!("   Provider:   {} ({})", config.default_provider, config.active_model());

    genweb_gateway::start(config).await?;

    Ok(())
}
