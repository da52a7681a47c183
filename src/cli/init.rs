use dialoguer::{Input, theme::ColorfulTheme};
use owo_colors::OwoColorize;
use std::error::Error;
use std::fs;
use std::path::Path;
use wavdeck::config::Config;

pub fn handle_init(music_root: Option<&str>) -> Result<(), Box<dyn Error>> {
    // Check if already initialized
    if Config::exists()? {
        return Err("wavdeck is already initialized. Use 'wavdeck config set music_root <path>' to change the music root.".into());
    }

    let music_root = match music_root {
        Some(root) => root.to_string(),
        None => Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt("Music root (the card's top level)")
            .default("~/Music".to_string())
            .interact_text()?,
    };

    // Expand tilde if present
    let expanded_path = shellexpand::tilde(&music_root);
    let root_path = Path::new(expanded_path.as_ref());

    // Create directory if it doesn't exist
    if !root_path.exists() {
        println!("Creating music root: {}", root_path.display());
        fs::create_dir_all(root_path)?;
    } else if !root_path.is_dir() {
        return Err(format!("{} exists but is not a directory", root_path.display()).into());
    }

    let config = Config::new(root_path.to_string_lossy().to_string());
    config.save()?;

    println!("{}", "wavdeck initialized successfully!".green());
    println!("Music root: {}", root_path.display().to_string().cyan());
    println!(
        "Configuration saved to: {}",
        Config::config_path()?.display()
    );

    Ok(())
}
