use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::LinkStream;

/// Connect to a control server (blocking, transport-default timeout).
///
/// Exactly one attempt is made per resolved address; there is no retry.
pub fn connect(addr: &str) -> Result<LinkStream> {
    connect_timeout(addr, None)
}

/// Connect to a control server with an optional connect timeout.
pub fn connect_timeout(addr: &str, timeout: Option<Duration>) -> Result<LinkStream> {
    let stream = match timeout {
        None => TcpStream::connect(addr).map_err(|e| TransportError::Connect {
            addr: addr.to_string(),
            source: e,
        })?,
        Some(timeout) => {
            let target = resolve(addr)?;
            TcpStream::connect_timeout(&target, timeout).map_err(|e| {
                TransportError::Connect {
                    addr: addr.to_string(),
                    source: e,
                }
            })?
        }
    };
    debug!(addr, "connected to control server");
    Ok(LinkStream::from_tcp(stream))
}

fn resolve(addr: &str) -> Result<SocketAddr> {
    let mut addrs = addr.to_socket_addrs().map_err(|e| TransportError::Connect {
        addr: addr.to_string(),
        source: e,
    })?;
    addrs.next().ok_or_else(|| TransportError::Resolve {
        addr: addr.to_string(),
    })
}

/// Listening side of the link, used by the bench control server.
pub struct LinkListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl LinkListener {
    /// Bind and listen on a TCP address such as `0.0.0.0:6000`.
    ///
    /// Port `0` picks an ephemeral port; read it back with
    /// [`LinkListener::local_addr`].
    pub fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;
        let local_addr = listener.local_addr().map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;

        info!(%local_addr, "listening for robot connections");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<LinkStream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted robot connection");
        Ok(LinkStream::from_tcp(stream))
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn test_bind_accept_connect() {
        let listener = LinkListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().to_string();

        let handle = std::thread::spawn(move || {
            let mut client = connect(&addr).unwrap();
            client.write_all(b"hello").unwrap();
        });

        let mut server = listener.accept().unwrap();
        let mut buf = [0u8; 5];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");

        handle.join().unwrap();
    }

    #[test]
    fn test_connect_refused_is_connect_error() {
        // Bind then drop to get a port with nothing listening on it.
        let port = {
            let listener = LinkListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().port()
        };
        let result = connect(&format!("127.0.0.1:{port}"));
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }

    #[test]
    fn test_connect_timeout_reaches_listener() {
        let listener = LinkListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().to_string();

        let stream = connect_timeout(&addr, Some(Duration::from_secs(1))).unwrap();
        let accepted = listener.accept().unwrap();
        assert_eq!(
            stream.local_addr().unwrap(),
            accepted.peer_addr().unwrap()
        );
    }

    #[test]
    fn test_unresolvable_address_with_timeout() {
        let result = connect_timeout("not an address", Some(Duration::from_millis(50)));
        assert!(matches!(
            result,
            Err(TransportError::Connect { .. }) | Err(TransportError::Resolve { .. })
        ));
    }

    #[test]
    fn test_bind_rejects_address_in_use() {
        let first = LinkListener::bind("127.0.0.1:0").unwrap();
        let addr = first.local_addr().to_string();
        let second = LinkListener::bind(&addr);
        assert!(matches!(second, Err(TransportError::Bind { .. })));
    }

    #[test]
    fn test_shutdown_unblocks_cloned_reader() {
        let listener = LinkListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().to_string();

        let client = connect(&addr).unwrap();
        let _server = listener.accept().unwrap();

        let mut reader = client.try_clone().unwrap();
        let blocked = std::thread::spawn(move || {
            let mut buf = [0u8; 16];
            reader.read(&mut buf).unwrap()
        });

        client.shutdown().unwrap();
        assert_eq!(blocked.join().unwrap(), 0);
        // A second shutdown on an already shut down socket is tolerated.
        let _ = client.shutdown();
    }
}
