//! `genweb agents`: list the agent directory.

use genweb_config::{AgentDirectory, AppConfig};

pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let path = &config.gateway.agents_file;
    let directory = AgentDirectory::load(path).await?;

    if directory.is_empty() {
        println!("No agents defined in {}", path.display());
        return Ok(());
    }

    println!("{} agent(s) in {}:", directory.len(), path.display());
    for name in directory.names() {
        println!("  {name}");
    }

    Ok(())
}
