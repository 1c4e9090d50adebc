pub mod cli;
pub mod commands;
pub mod plot;
pub mod utils;
