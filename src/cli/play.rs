use owo_colors::OwoColorize;
use std::error::Error;
use wavdeck::config::Config;

pub fn handle_play(root: Option<&str>, port: Option<u16>) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;
    if let Some(root) = root {
        config.music_root = root.to_string();
    }
    if let Some(port) = port {
        config.port = port;
    }

    let music_root = config.music_root_path();
    if !music_root.is_dir() {
        // The device boots into its NO CARD screen in this case
        eprintln!(
            "{} music root {} is not a directory",
            "Warning:".yellow(),
            music_root.display().to_string().cyan()
        );
    }

    println!(
        "{} colours at http://{}:{}/  (log: {})",
        "wavdeck".cyan().bold(),
        config.bind_address,
        config.port,
        config.log_file_path().display()
    );

    wavdeck::player::run(&config)
}
