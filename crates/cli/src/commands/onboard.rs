//! `sopchat onboard` — Write a starter configuration file.

use sopchat_config::AppConfig;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
        return Ok(());
    }

    std::fs::create_dir_all(&config_dir)?;
    std::fs::write(&config_path, AppConfig::default_toml())?;

    println!("Wrote starter config to {}", config_path.display());
    println!("Set OPENAI_API_KEY (or add api_key to the file) before chatting.");
    Ok(())
}
