// Copyright 2015-2018 Deyan Ginev. See the LICENSE
// file at the top-level directory of this distribution.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Result sink: delivers one result envelope to a task's return address

use std::fmt;
use tracing::debug;

use crate::context::{Context, SocketRole};
use crate::error::{Error, Result};
use crate::message::ResultEnvelope;

/// A not-yet-connected handle on a return address.
///
/// Cheap to build and to move into an execution slot; the socket is only
/// created by [`Responder::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Responder {
  backurl: String,
  role: SocketRole,
}

impl Responder {
  /// A responder for `backurl`, connecting with `role` (normally `Push`)
  pub fn new<S: Into<String>>(backurl: S, role: SocketRole) -> Responder {
    Responder {
      backurl: backurl.into(),
      role,
    }
  }

  /// The return address this responder delivers to
  pub fn backurl(&self) -> &str { &self.backurl }

  /// Connects the responder's socket. It is closed when the returned guard drops.
  pub fn open(&self, context: &Context) -> Result<OpenResponder> {
    let socket = context.connect(&self.backurl, self.role, None)?;
    Ok(OpenResponder {
      backurl: self.backurl.clone(),
      socket,
    })
  }

  /// Opens the socket, builds the envelope and sends it.
  ///
  /// The socket is acquired before `payload` runs and released on every exit
  /// path, including a panic inside `payload`.
  pub fn deliver<F>(&self, context: &Context, payload: F) -> Result<()>
  where F: FnOnce() -> ResultEnvelope {
    let open = self.open(context)?;
    let envelope = payload();
    open.send(&envelope)
  }
}

impl fmt::Display for Responder {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "<Responder {}>", self.backurl) }
}

/// A connected responder; the socket closes on drop
pub struct OpenResponder {
  backurl: String,
  socket: zmq::Socket,
}

impl OpenResponder {
  /// Sends one envelope. No retries.
  pub fn send(&self, envelope: &ResultEnvelope) -> Result<()> {
    let payload = envelope.encode()?;
    self
      .socket
      .send(payload, 0)
      .map_err(|source| Error::SinkDelivery {
        backurl: self.backurl.clone(),
        source,
      })
  }
}

impl Drop for OpenResponder {
  fn drop(&mut self) {
    debug!(backurl = %self.backurl, "closing responder");
  }
}
