// Copyright 2015-2018 Deyan Ginev. See the LICENSE
// file at the top-level directory of this distribution.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Endpoint and pool settings, read from the environment (and a `.env` file)

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::workerpool::default_num_workers;

/// Endpoint where submitters push tasks (a streamer's frontend)
pub const DEFAULT_FRONTEND_URL: &str = "tcp://127.0.0.1:51694";
/// Endpoint where worker pools pull tasks (a streamer's backend)
pub const DEFAULT_TASK_URL: &str = "tcp://127.0.0.1:51695";
/// Port range template for submitters' return addresses
pub const DEFAULT_RECEIVER_URL: &str = "tcp://127.0.0.1:51700-51800";

/// Deployment settings shared by the binaries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
  /// `ZTASK_FRONTEND_URL`: endpoint submitters push to
  pub frontend_url: String,
  /// `ZTASK_TASK_URL`: endpoint worker pools pull from
  pub task_url: String,
  /// `ZTASK_RECEIVER_URL`: return address template, `scheme://host:min-max`
  pub receiver_url: String,
  /// `ZTASK_NUM_WORKERS`: execution slots per worker pool
  pub num_workers: usize,
  /// `ZTASK_RESULT_TIMEOUT_SECS`: per-result deadline for submitters, unset waits forever
  pub result_timeout: Option<Duration>,
}

impl Default for Config {
  fn default() -> Config {
    Config {
      frontend_url: DEFAULT_FRONTEND_URL.to_string(),
      task_url: DEFAULT_TASK_URL.to_string(),
      receiver_url: DEFAULT_RECEIVER_URL.to_string(),
      num_workers: default_num_workers(),
      result_timeout: None,
    }
  }
}

impl Config {
  /// Loads `.env` if present, then overrides the defaults with any `ZTASK_*` variables
  pub fn from_env() -> Result<Config> {
    dotenv::dotenv().ok();
    let defaults = Config::default();
    Ok(Config {
      frontend_url: env::var("ZTASK_FRONTEND_URL").unwrap_or(defaults.frontend_url),
      task_url: env::var("ZTASK_TASK_URL").unwrap_or(defaults.task_url),
      receiver_url: env::var("ZTASK_RECEIVER_URL").unwrap_or(defaults.receiver_url),
      num_workers: parse_var::<usize>("ZTASK_NUM_WORKERS")?.unwrap_or(defaults.num_workers),
      result_timeout: parse_var::<u64>("ZTASK_RESULT_TIMEOUT_SECS")?
        .map(Duration::from_secs)
        .or(defaults.result_timeout),
    })
  }
}

fn parse_var<T>(key: &str) -> Result<Option<T>>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match env::var(key) {
    Err(_) => Ok(None),
    Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| Error::Config {
      key: key.to_string(),
      reason: format!("{:?}: {}", raw, e),
    }),
  }
}
