// SPDX-FileCopyrightText: 2024 Maciej Borzecki <maciek.borzecki@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log;
use serde;
use serde_yml;
use thiserror;

use crate::flags::DEFAULT_DEFINE;
use crate::version::FALLBACK_TOKEN;

const CONF_NAME: &str = "firmware-version.yaml";

/// Wraps configuration loading errors.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Io(#[from] io::Error),
    #[error("cannot parse configuration: {0}")]
    Parse(#[from] serde_yml::Error),
}

fn default_define() -> String {
    DEFAULT_DEFINE.to_string()
}

fn default_fallback() -> String {
    FALLBACK_TOKEN.to_string()
}

fn default_escape_quotes() -> bool {
    true
}

fn default_git() -> String {
    "git".to_string()
}

/// Resolver configuration.
#[derive(serde::Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Name of the defined macro.
    #[serde(default = "default_define")]
    pub define: String,
    /// Token used when the repository cannot be described.
    #[serde(default = "default_fallback")]
    pub fallback: String,
    /// Whether quotes around the token are backslash-escaped.
    #[serde(rename = "escape-quotes", default = "default_escape_quotes")]
    pub escape_quotes: bool,
    /// Git executable.
    #[serde(default = "default_git")]
    pub git: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            define: default_define(),
            fallback: default_fallback(),
            escape_quotes: default_escape_quotes(),
            git: default_git(),
        }
    }
}

/// Walks up from `start_dir` looking for the configuration file.
pub fn locate(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = Some(start_dir);

    while let Some(curdir) = dir {
        log::trace!("checking {}", curdir.display());
        let conf = curdir.join(CONF_NAME);
        if conf.is_file() {
            log::debug!("found config {}", conf.display());
            return Some(conf);
        }
        dir = curdir.parent();
    }
    None
}

/// Loads configuration from the provided reader.
pub fn from_reader<R>(cfg: R) -> Result<Config, ConfigError>
where
    R: io::Read,
{
    let conf: Config = serde_yml::from_reader(cfg)?;
    log::debug!("config: {:?}", conf);
    Ok(conf)
}

/// Loads configuration from an explicit path, or from the first file found
/// walking up from `start_dir`. Defaults apply when there is none.
pub fn load(path: Option<&Path>, start_dir: &Path) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match locate(start_dir) {
            Some(p) => p,
            None => {
                log::debug!("no {} found, using defaults", CONF_NAME);
                return Ok(Config::default());
            }
        },
    };

    log::debug!("loading config from {}", path.display());
    from_reader(fs::File::open(&path)?)
}
