pub mod aggregate;
pub mod app;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod executor;
pub mod output;
pub mod runner;
pub mod target;
pub mod utils;

#[cfg(test)]
mod tests;
