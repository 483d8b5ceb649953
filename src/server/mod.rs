//! TCP server for the chat service

pub mod config;
mod connection;
pub mod listener;

pub use config::ServerConfig;
pub use listener::ChatServer;
