//! Network subsystem for UDP audio transport

pub mod sender;
pub mod socket;

pub use sender::{NetworkSender, SenderStats};
pub use socket::create_send_socket;
