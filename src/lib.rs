// Copyright 2015-2018 Deyan Ginev. See the LICENSE
// file at the top-level directory of this distribution.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! A ZMQ-based starmap: push tasks through a streamer to remote worker pools and collect one
//! result per task on an ephemeral return address, in completion order.

#![deny(missing_docs)]

#[macro_use]
extern crate lazy_static;

pub mod config;
pub mod context;
pub mod endpoint;
pub mod error;
pub mod logging;
pub mod message;
pub mod registry;
pub mod responder;
pub mod scoped;
pub mod shutdown;
pub mod starmap;
pub mod streamer;
pub mod workerpool;

pub use crate::context::{Context, SocketRole};
pub use crate::error::{Error, Result};
pub use crate::message::{Args, Monitor, Outcome, ResultEnvelope};
pub use crate::registry::Registry;
pub use crate::starmap::{starmap, Starmap, Submitter};
pub use crate::streamer::Streamer;
pub use crate::workerpool::{send_stop, PoolState, WorkerPool};
