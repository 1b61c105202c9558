pub mod command;
pub mod config;
pub mod error;
pub mod platform;
pub mod poll;
pub mod scanner;
pub mod server;
pub mod shutdown;
pub mod snapshot;
pub mod workflow;
pub mod workspace;

#[cfg(test)]
mod testing;
