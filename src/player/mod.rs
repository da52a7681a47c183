pub mod app;
pub mod colors;
pub mod endpoint;
pub mod input;
pub mod listing;
pub mod navigator;
pub mod render;
pub mod session;
pub mod state;
pub mod streamer;
pub mod volume;

use crate::config::Config;
use std::error::Error;

pub fn run(config: &Config) -> Result<(), Box<dyn Error>> {
    app::run(config)
}
