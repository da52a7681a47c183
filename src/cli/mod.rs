pub mod colors;
pub mod config;
pub mod init;
pub mod play;
pub mod tone;
