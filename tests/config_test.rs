// Copyright 2015-2018 Deyan Ginev. See the LICENSE
// file at the top-level directory of this distribution.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed
// except according to those terms.
use std::env;
use std::time::Duration;
use ztask::config::{self, Config};
use ztask::Error;

// Environment variables are process-wide, so all cases run in a single test.
#[test]
fn environment_overrides_defaults() {
  for key in &[
    "ZTASK_FRONTEND_URL",
    "ZTASK_TASK_URL",
    "ZTASK_RECEIVER_URL",
    "ZTASK_NUM_WORKERS",
    "ZTASK_RESULT_TIMEOUT_SECS",
  ] {
    env::remove_var(key);
  }
  let defaults = Config::from_env().unwrap();
  assert_eq!(defaults.frontend_url, config::DEFAULT_FRONTEND_URL);
  assert_eq!(defaults.task_url, config::DEFAULT_TASK_URL);
  assert_eq!(defaults.receiver_url, config::DEFAULT_RECEIVER_URL);
  assert!(defaults.num_workers >= 1);
  assert_eq!(defaults.result_timeout, None);

  env::set_var("ZTASK_TASK_URL", "tcp://10.0.0.7:6000");
  env::set_var("ZTASK_NUM_WORKERS", " 3 ");
  env::set_var("ZTASK_RESULT_TIMEOUT_SECS", "90");
  let configured = Config::from_env().unwrap();
  assert_eq!(configured.task_url, "tcp://10.0.0.7:6000");
  assert_eq!(configured.frontend_url, config::DEFAULT_FRONTEND_URL);
  assert_eq!(configured.num_workers, 3);
  assert_eq!(configured.result_timeout, Some(Duration::from_secs(90)));

  env::set_var("ZTASK_NUM_WORKERS", "many");
  match Config::from_env() {
    Err(Error::Config { key, .. }) => assert_eq!(key, "ZTASK_NUM_WORKERS"),
    other => panic!("expected a config error, got {:?}", other),
  }
  env::remove_var("ZTASK_NUM_WORKERS");
  env::remove_var("ZTASK_TASK_URL");
  env::remove_var("ZTASK_RESULT_TIMEOUT_SECS");
}
