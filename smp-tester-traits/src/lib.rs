//! SMP tester channel traits.
//!
//! Provides a channel trait that allows running scripted SMP exchanges over
//! various transports, such as an emulated controller or a real L2CAP socket.
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
use core::future::Future;

/// Opaque identifier of an established connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionHandle(pub u16);

/// Receive Error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelRxError {
    /// Received frame discarded, e.g. because it was malformed or addressed to another channel.
    Discarded,

    /// The connection was torn down before or during reception.
    Disconnected,

    /// The received PDU did not fit the buffer. Holds the PDU's length.
    Oversized(usize),
}

/// Transmit Error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelTxError {
    /// The connection is gone.
    Disconnected,
}

/// Channel trait, through which the tester talks to the peer.
///
/// The channel owns connection bring-up, delivery and flow control. Sends are
/// fire-and-forget: a successful `send` only means that the payload was handed over.
pub trait Channel {
    /// Wait until a connection to the peer is established.
    fn wait_for_connection(&mut self) -> impl Future<Output = Result<ConnectionHandle, ChannelRxError>>;

    /// Receive the next PDU addressed to channel `cid` on connection `handle`.
    ///
    /// Returns the number of bytes written to `buffer`. A PDU that is larger than
    /// `buffer` is consumed and reported as [`ChannelRxError::Oversized`].
    fn receive(
        &mut self,
        handle: ConnectionHandle,
        cid: u16,
        buffer: &mut [u8],
    ) -> impl Future<Output = Result<usize, ChannelRxError>>;

    /// Send a PDU on channel `cid` of connection `handle`.
    fn send(&mut self, handle: ConnectionHandle, cid: u16, data: &[u8]) -> impl Future<Output = Result<(), ChannelTxError>>;
}
