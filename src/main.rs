//! wavdeck - a pocket WAV player you can run in a terminal.
//!
//! The player core is written for a small device: three buttons, a volume
//! knob, a 21-column colour display, an SD card full of WAV files and two
//! indicator pixels configured over a tiny web form. This binary runs that
//! core on a desktop:
//!
//! - the music root directory stands in for the card,
//! - the terminal is the display and the keyboard the buttons and knob,
//! - a small file next to the config stands in for the persistent storage.
//!
//! Use `wavdeck tone` to produce a WAV in the one layout the player streams.

use clap::{CommandFactory, Parser, Subcommand, builder::PossibleValuesParser};
use clap_complete::{Generator, Shell, generate};
use std::error::Error;
use std::io;

mod cli;

#[derive(Parser)]
#[command(name = "wavdeck")]
#[command(about = "Pocket WAV player: card browsing, PCM streaming, three-button navigation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize wavdeck configuration
    Init {
        /// Directory to treat as the card (prompted for when omitted)
        music_root: Option<String>,
    },
    /// Show or change the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Run the player in this terminal
    Play {
        /// Music root to browse instead of the configured one
        #[arg(short, long)]
        root: Option<String>,
        /// Port for the colour configuration form
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Show the persisted indicator colours
    Colors,
    /// Write a test tone in the player's WAV layout
    Tone {
        /// Output file
        path: String,
        /// Tone frequency in Hz
        #[arg(short, long, default_value_t = 440.0)]
        frequency: f32,
        /// Length in seconds
        #[arg(short, long, default_value_t = 3.0)]
        seconds: f32,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// View current configuration
    View,
    /// Set a configuration value
    Set {
        /// Configuration key
        #[arg(value_parser = PossibleValuesParser::new(["music_root", "bind_address", "port", "debounce_ms", "log_file", "speaker"]))]
        key: String,
        /// Configuration value
        value: String,
    },
    /// Edit configuration file in your editor
    Edit,
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { music_root } => {
            cli::init::handle_init(music_root.as_deref())?;
        }
        Commands::Config { action } => match action {
            ConfigAction::View => {
                cli::config::handle_config_view()?;
            }
            ConfigAction::Set { key, value } => {
                cli::config::handle_config_set(&key, &value)?;
            }
            ConfigAction::Edit => {
                cli::config::handle_config_edit()?;
            }
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            print_completions(shell, &mut cmd);
        }
        Commands::Play { root, port } => {
            cli::play::handle_play(root.as_deref(), port)?;
        }
        Commands::Colors => {
            cli::colors::handle_colors()?;
        }
        Commands::Tone {
            path,
            frequency,
            seconds,
        } => {
            cli::tone::handle_tone(&path, frequency, seconds)?;
        }
    }

    Ok(())
}
