// Copyright 2015-2018 Deyan Ginev. See the LICENSE
// file at the top-level directory of this distribution.
//
// Licensed under the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Socket creation: binding, connecting and ephemeral port allocation over a ZMQ context

use rand::seq::SliceRandom;
use rand::thread_rng;
use std::fmt;
use tracing::debug;

use crate::endpoint::PortRange;
use crate::error::{Error, Result};

/// The socket roles a `Context` can create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketRole {
  /// one-directional sender, round-robins over connected pullers
  Push,
  /// one-directional receiver, fair-queues over connected pushers
  Pull,
  /// synchronous request
  Request,
  /// synchronous reply
  Reply,
  /// broadcast sender
  Publish,
  /// broadcast receiver
  Subscribe,
  /// identity-routing server side
  Router,
  /// asynchronous client side of a router
  Dealer,
}

impl SocketRole {
  /// The matching zmq socket type
  pub fn socket_type(self) -> zmq::SocketType {
    match self {
      SocketRole::Push => zmq::PUSH,
      SocketRole::Pull => zmq::PULL,
      SocketRole::Request => zmq::REQ,
      SocketRole::Reply => zmq::REP,
      SocketRole::Publish => zmq::PUB,
      SocketRole::Subscribe => zmq::SUB,
      SocketRole::Router => zmq::ROUTER,
      SocketRole::Dealer => zmq::DEALER,
    }
  }
}

impl fmt::Display for SocketRole {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let name = match self {
      SocketRole::Push => "PUSH",
      SocketRole::Pull => "PULL",
      SocketRole::Request => "REQ",
      SocketRole::Reply => "REP",
      SocketRole::Publish => "PUB",
      SocketRole::Subscribe => "SUB",
      SocketRole::Router => "ROUTER",
      SocketRole::Dealer => "DEALER",
    };
    f.write_str(name)
  }
}

/// A ZMQ context with endpoint-aware `bind`/`connect` helpers.
///
/// Every process or thread entry point owns one; clones share the underlying
/// zmq context. Sockets are closed when dropped, and the context terminates
/// once the last clone and the last socket are gone.
#[derive(Clone)]
pub struct Context {
  inner: zmq::Context,
}

impl Default for Context {
  fn default() -> Context { Context::new() }
}

impl fmt::Debug for Context {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { f.write_str("Context") }
}

impl Context {
  /// A fresh zmq context
  pub fn new() -> Context {
    Context {
      inner: zmq::Context::new(),
    }
  }

  fn socket(&self, role: SocketRole, identity: Option<&[u8]>) -> Result<zmq::Socket> {
    let socket = self.inner.socket(role.socket_type())?;
    if let Some(identity) = identity {
      socket.set_identity(identity)?;
    }
    Ok(socket)
  }

  /// Creates a socket of `role` and binds it to `endpoint`.
  /// On failure the socket is closed before the error is returned.
  pub fn bind(
    &self,
    endpoint: &str,
    role: SocketRole,
    identity: Option<&[u8]>,
  ) -> Result<zmq::Socket>
  {
    let socket = self.socket(role, identity)?;
    match socket.bind(endpoint) {
      Ok(()) => {
        debug!(%endpoint, %role, "bound socket");
        Ok(socket)
      },
      Err(source) => {
        drop(socket);
        Err(Error::Bind {
          endpoint: endpoint.to_string(),
          source,
        })
      },
    }
  }

  /// Binds a socket of `role` to a free port of the `:min-max` range that
  /// terminates `endpoint`, returning the concrete endpoint alongside it.
  ///
  /// The range is validated before any socket is created. Candidate ports are
  /// tried in random order, skipping those already in use.
  pub fn bind_ephemeral(&self, endpoint: &str, role: SocketRole) -> Result<(String, zmq::Socket)> {
    let range = PortRange::parse(endpoint)?;
    let socket = self.socket(role, None)?;
    let mut ports: Vec<u16> = range.ports().collect();
    ports.shuffle(&mut thread_rng());
    for port in ports {
      let backurl = range.with_port(port);
      match socket.bind(&backurl) {
        Ok(()) => {
          debug!(%backurl, %role, "bound ephemeral socket");
          return Ok((backurl, socket));
        },
        Err(zmq::Error::EADDRINUSE) | Err(zmq::Error::EACCES) => continue,
        Err(source) => {
          return Err(Error::Bind {
            endpoint: endpoint.to_string(),
            source,
          })
        },
      }
    }
    Err(Error::Bind {
      endpoint: endpoint.to_string(),
      source: zmq::Error::EADDRINUSE,
    })
  }

  /// Creates a socket of `role` and connects it to `endpoint`.
  /// On failure the socket is closed before the error is returned.
  pub fn connect(
    &self,
    endpoint: &str,
    role: SocketRole,
    identity: Option<&[u8]>,
  ) -> Result<zmq::Socket>
  {
    let socket = self.socket(role, identity)?;
    match socket.connect(endpoint) {
      Ok(()) => {
        debug!(%endpoint, %role, "connected socket");
        Ok(socket)
      },
      Err(source) => {
        drop(socket);
        Err(Error::Connect {
          endpoint: endpoint.to_string(),
          source,
        })
      },
    }
  }
}

/// A random printable identity, for router/dealer sockets that need one
pub fn random_identity() -> String {
  use rand::distributions::Alphanumeric;
  use rand::Rng;
  thread_rng()
    .sample_iter(&Alphanumeric)
    .take(10)
    .map(char::from)
    .collect()
}

/// Receives one single-part message, retrying when a signal interrupts the call
pub fn recv_bytes(socket: &zmq::Socket) -> Result<Vec<u8>> {
  loop {
    match socket.recv_bytes(0) {
      Err(zmq::Error::EINTR) => continue,
      received => return Ok(received?),
    }
  }
}

/// Receives every frame of one message, retrying when a signal interrupts the call
pub fn recv_multipart(socket: &zmq::Socket) -> Result<Vec<Vec<u8>>> {
  loop {
    match socket.recv_multipart(0) {
      Err(zmq::Error::EINTR) => continue,
      received => return Ok(received?),
    }
  }
}
