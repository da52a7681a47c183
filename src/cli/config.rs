use owo_colors::OwoColorize;
use std::error::Error;
use std::process::Command;
use wavdeck::config::Config;

fn print_problems(config: &Config) {
    for problem in config.problems() {
        println!("  {} {problem}", "!".yellow());
    }
}

pub fn handle_config_view() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let root = config.music_root_path();

    println!("{}", "wavdeck configuration".cyan().bold());
    println!("  music_root:   {} ({})", config.music_root, root.display());
    println!(
        "  colour form:  http://{}:{}/",
        config.bind_address, config.port
    );
    println!("  debounce_ms:  {}", config.debounce_ms);
    println!("  log_file:     {}", config.log_file_path().display());
    println!("  speaker:      {}", config.speaker);
    println!(
        "  colours:      {}",
        Config::eeprom_path()?.display().to_string().bright_black()
    );
    print_problems(&config);

    Ok(())
}

pub fn handle_config_set(key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;
    config.set_value(key, value)?;
    config.save()?;

    println!("{} {key} = {value}", "Set".green());
    print_problems(&config);

    Ok(())
}

pub fn handle_config_edit() -> Result<(), Box<dyn Error>> {
    if !Config::exists()? {
        return Err("wavdeck not initialized. Run 'wavdeck init' first.".into());
    }

    let config_path = Config::config_path()?;
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    let status = Command::new(&editor)
        .arg(&config_path)
        .status()
        .map_err(|e| format!("Failed to launch editor '{editor}': {e}"))?;
    if !status.success() {
        return Err(format!("Editor '{editor}' exited with error").into());
    }

    // A file that no longer parses would make 'play' fall over later
    let config = Config::load()
        .map_err(|e| format!("{} is no longer valid: {e}", config_path.display()))?;
    println!("{}", "Configuration saved".green());
    print_problems(&config);

    Ok(())
}
