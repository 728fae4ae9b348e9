// Copyright 2023 Remi Bernotavicius

use crate::error::{Error, Result};
use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

const BIND_VAR: &str = "RECIPROCITY_BIND";
const DATABASE_VAR: &str = "RECIPROCITY_DATABASE";
const LOG_VAR: &str = "RECIPROCITY_LOG";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_path: PathBuf,
    pub log_level: log::LevelFilter,
}

impl Config {
    /// Read from the environment. Runs before logging is set up, so nothing is logged here.
    pub fn load() -> Result<Self> {
        let database_path = match env::var_os(DATABASE_VAR) {
            Some(path) => PathBuf::from(path),
            None => data_path()?.join("data.sqlite"),
        };
        Ok(Self {
            bind_address: try_load(BIND_VAR, "127.0.0.1:8000")?,
            database_path,
            log_level: try_load(LOG_VAR, "info")?,
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_owned());
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("invalid {key} value {value:?}: {e}")))
}

/// This is where the database lives on-disk unless configured otherwise. On Linux it should be
/// like: `~/.local/share/reciprocity/`
fn data_path() -> Result<PathBuf> {
    let dirs = directories::BaseDirs::new()
        .ok_or_else(|| Error::Config("failed to get user home directory".into()))?;
    let path = dirs.data_dir().join("reciprocity");
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

#[test]
fn defaults_parse() {
    let address: SocketAddr = try_load("RECIPROCITY_TEST_UNSET", "127.0.0.1:8000").unwrap();
    assert_eq!(address.port(), 8000);
    let level: log::LevelFilter = try_load("RECIPROCITY_TEST_UNSET", "debug").unwrap();
    assert_eq!(level, log::LevelFilter::Debug);

    let err = try_load::<SocketAddr>("RECIPROCITY_TEST_UNSET", "nowhere").unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}
