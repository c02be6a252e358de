//! Non-blocking datagram socket construction

use socket2::{Domain, Protocol, Socket, Type};

use crate::constants::SOCKET_SEND_BUFFER_BYTES;
use crate::error::NetworkError;

/// Create the UDP socket the sender thread transmits on.
///
/// The socket is non-blocking, so a full send buffer surfaces as
/// would-block instead of stalling the sender loop. The enlarged send
/// buffer is best-effort.
pub fn create_send_socket() -> Result<Socket, NetworkError> {
    // socket2 disables SIGPIPE on platforms where sends can raise it
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .map_err(|e| NetworkError::SocketCreate(e.to_string()))?;

    socket
        .set_nonblocking(true)
        .map_err(|e| NetworkError::SocketCreate(e.to_string()))?;

    if let Err(e) = socket.set_send_buffer_size(SOCKET_SEND_BUFFER_BYTES) {
        tracing::debug!("couldn't set send buffer size (non-fatal): {}", e);
    }

    Ok(socket)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_creation() {
        let socket = create_send_socket();
        assert!(socket.is_ok());
    }
}
