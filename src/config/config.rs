use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use serde::Deserialize;
use serde_yaml::from_reader;

use crate::request::ConnectionRequest;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(alias = "LDAP", alias = "Ldap")]
    pub ldap: ConnectionRequest,
    // client library default when unset
    #[serde(with = "humantime_serde")]
    pub conn_timeout: Option<Duration>,
}

impl Config {
    pub fn from_file(filename: PathBuf) -> Result<Self> {
        let file = File::open(filename)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let conf: Config = from_reader(reader)?;

        conf.validate()?;

        Ok(conf)
    }

    pub fn validate(&self) -> Result<()> {
        if self.conn_timeout.is_some_and(|t| t.is_zero()) {
            bail!("conn_timeout must not be zero");
        }
        Ok(())
    }
}
