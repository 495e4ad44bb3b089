//! Stream transports: local domain socket or TCP.

use std::time::Duration;

use relay_protocol::Endpoint;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::error::RelayError;

pub(crate) type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
pub(crate) type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Open a connection to `endpoint`, bounded by `timeout`, and split it into
/// independently owned read and write halves.
pub(crate) async fn open(
    endpoint: &Endpoint,
    timeout: Duration,
) -> Result<(BoxedReader, BoxedWriter), RelayError> {
    let connect_err = |reason: String| RelayError::Connect {
        endpoint: endpoint.to_string(),
        reason,
    };

    match tokio::time::timeout(timeout, open_inner(endpoint)).await {
        Ok(Ok(halves)) => Ok(halves),
        Ok(Err(e)) => Err(connect_err(e.to_string())),
        Err(_) => Err(connect_err(format!(
            "timed out after {}ms",
            timeout.as_millis()
        ))),
    }
}

async fn open_inner(endpoint: &Endpoint) -> std::io::Result<(BoxedReader, BoxedWriter)> {
    match endpoint {
        Endpoint::Tcp { host, port } => {
            // Name lookup happens here when `host` is not a literal address.
            let stream = TcpStream::connect((host.as_str(), *port)).await?;
            stream.set_nodelay(true)?;
            let (r, w) = stream.into_split();
            Ok((Box::new(r), Box::new(w)))
        }
        #[cfg(unix)]
        Endpoint::Unix(path) => {
            let stream = tokio::net::UnixStream::connect(path).await?;
            let (r, w) = stream.into_split();
            Ok((Box::new(r), Box::new(w)))
        }
        #[cfg(not(unix))]
        Endpoint::Unix(_) => Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "domain sockets are not available on this platform",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn tcp_halves_carry_bytes_both_ways() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 5];
            sock.read_exact(&mut buf).await.unwrap();
            sock.write_all(b"pong\n").await.unwrap();
            buf
        });

        let ep = Endpoint::Tcp {
            host: "127.0.0.1".into(),
            port,
        };
        let (mut r, mut w) = open(&ep, Duration::from_secs(2)).await.unwrap();
        w.write_all(b"ping\n").await.unwrap();
        let mut reply = [0u8; 5];
        r.read_exact(&mut reply).await.unwrap();

        assert_eq!(&reply, b"pong\n");
        assert_eq!(&server.await.unwrap(), b"ping\n");
    }

    #[tokio::test]
    async fn missing_socket_is_a_connect_error() {
        let dir = tempfile::tempdir().unwrap();
        let ep = Endpoint::Unix(dir.path().join("absent.sock"));
        let err = match open(&ep, Duration::from_secs(1)).await {
            Ok(_) => panic!("connected to a missing socket"),
            Err(e) => e,
        };
        assert!(matches!(err, RelayError::Connect { .. }), "{err}");
    }

    #[tokio::test]
    async fn refused_tcp_is_a_connect_error() {
        // Bind then drop to get a port with nothing listening.
        let port = {
            let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
            l.local_addr().unwrap().port()
        };
        let ep = Endpoint::Tcp {
            host: "127.0.0.1".into(),
            port,
        };
        let res = open(&ep, Duration::from_secs(1)).await;
        assert!(matches!(res, Err(RelayError::Connect { .. })));
    }
}
