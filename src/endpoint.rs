// Copyright 2015-2018 Deyan Ginev. See the LICENSE
// file at the top-level directory of this distribution.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Endpoint address parsing, including `scheme://host:min-max` port range templates

use regex::Regex;
use std::fmt;
use std::ops::RangeInclusive;

use crate::error::{Error, Result};

lazy_static! {
  static ref PORT_RANGE_REGEX: Regex = Regex::new(r"^(.+):(\d+)-(\d+)$").unwrap();
  static ref PORT_REGEX: Regex = Regex::new(r":(\d+)$").unwrap();
}

/// An ephemeral endpoint template, e.g. `tcp://127.0.0.1:51700-51800`,
/// split into the address stem and the admissible port range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRange {
  /// the endpoint with its `:min-max` suffix stripped
  pub base: String,
  /// lowest admissible port
  pub min: u16,
  /// highest admissible port (inclusive)
  pub max: u16,
}

impl PortRange {
  /// Parses the trailing `:min-max` suffix of `endpoint`.
  pub fn parse(endpoint: &str) -> Result<PortRange> {
    let malformed = |reason: &str| Error::MalformedEndpoint {
      endpoint: endpoint.to_string(),
      reason: reason.to_string(),
    };
    let captures = PORT_RANGE_REGEX
      .captures(endpoint)
      .ok_or_else(|| malformed("expected a trailing :<min_port>-<max_port> range"))?;
    let min = captures[2]
      .parse::<u16>()
      .map_err(|_| malformed("minimum port is not a valid port number"))?;
    let max = captures[3]
      .parse::<u16>()
      .map_err(|_| malformed("maximum port is not a valid port number"))?;
    if min == 0 || min > max {
      return Err(malformed("port range must satisfy 0 < min <= max"));
    }
    Ok(PortRange {
      base: captures[1].to_string(),
      min,
      max,
    })
  }

  /// The concrete endpoint ("backurl") for a chosen port
  pub fn with_port(&self, port: u16) -> String { format!("{}:{}", self.base, port) }

  /// All admissible ports
  pub fn ports(&self) -> RangeInclusive<u16> { self.min..=self.max }

  /// Is `port` inside the range?
  pub fn contains(&self, port: u16) -> bool { self.ports().contains(&port) }
}

impl fmt::Display for PortRange {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}:{}-{}", self.base, self.min, self.max)
  }
}

/// Extracts the trailing port of a concrete endpoint, if it has one.
pub fn port_of(endpoint: &str) -> Option<u16> {
  PORT_REGEX
    .captures(endpoint)
    .and_then(|captures| captures[1].parse::<u16>().ok())
}
