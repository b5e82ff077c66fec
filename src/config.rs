use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Where application data is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// Nothing survives a restart
    Memory,
    /// A single JSON file on disk
    File,
    Postgres,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("--database-url (or DATABASE_URL) is required for the postgres store")]
    MissingDatabaseUrl,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "dominoscore", about = "Score keeper for domino and rummy games")]
pub struct Config {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:3000", env = "DOMINOSCORE_BIND")]
    pub bind: SocketAddr,

    #[arg(long, value_enum, default_value = "file", env = "DOMINOSCORE_STORE")]
    pub store: StoreKind,

    /// JSON file used by the file store
    #[arg(long, default_value = "dominoscore.json", env = "DOMINOSCORE_DATA_FILE")]
    pub data_file: PathBuf,

    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Snapshots buffered per spectator session before slow viewers skip ahead
    #[arg(long, default_value = "100", env = "DOMINOSCORE_SPECTATOR_CAPACITY")]
    pub spectator_capacity: usize,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store == StoreKind::Postgres && self.database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        Ok(())
    }
}
