//! Implements a dummy channel and timers for testing.
use std::future::pending;
use std::vec::Vec;

use smp_tester_traits::{Channel, ChannelRxError, ChannelTxError, ConnectionHandle};

use crate::l2cap;
use crate::pdu::{MAX_PDU_SIZE, SMP_CID};
use crate::timers::Timer;

/// The handle of the dummy channel's single connection.
pub const DUMMY_HANDLE: ConnectionHandle = ConnectionHandle(0x002a);

/// Fits frames with payloads beyond the SMP maximum, to test oversized PDUs.
pub const MAX_FRAME_SIZE: usize = l2cap::HEADER_SIZE + 128;

type Frame = heapless::Vec<u8, MAX_FRAME_SIZE>;

fn frame(cid: u16, payload: &[u8]) -> Frame {
    let mut buffer = [0u8; MAX_FRAME_SIZE];
    let size = l2cap::encode(cid, payload, &mut buffer).unwrap();

    let mut frame = heapless::Vec::new();
    frame.extend_from_slice(&buffer[..size]).unwrap();
    frame
}

/// A dummy channel for testing.
///
/// Received PDUs are injected up front. Once they are drained, reception never completes,
/// unless the channel was told to hang up.
pub struct DummyChannel {
    rx_vec: Vec<Frame>,
    tx_vec: Vec<Frame>,
    connected: bool,
    hang_up_when_drained: bool,
    oversized_as_length: bool,
}

impl DummyChannel {
    /// Create a new dummy channel with an established connection.
    pub fn new() -> Self {
        Self {
            rx_vec: Vec::new(),
            tx_vec: Vec::new(),
            connected: true,
            hang_up_when_drained: false,
            oversized_as_length: false,
        }
    }

    /// Inject a received PDU on the SMP channel.
    pub fn inject_received_data(&mut self, data: &[u8]) {
        self.inject_received_frame(SMP_CID, data);
    }

    /// Inject a received PDU on an arbitrary channel.
    pub fn inject_received_frame(&mut self, cid: u16, data: &[u8]) {
        self.rx_vec.push(frame(cid, data));
    }

    /// Probe a PDU that was transmitted by the engine.
    pub fn probe_transmitted_data(&mut self) -> heapless::Vec<u8, MAX_PDU_SIZE> {
        let frame = self.tx_vec.remove(0);
        let (cid, payload) = l2cap::decode(&frame).unwrap();
        assert_eq!(cid, SMP_CID);

        let mut vec = heapless::Vec::new();
        vec.extend_from_slice(payload).unwrap();
        vec
    }

    /// Check, whether there is transmitted data that was not probed yet.
    pub fn has_transmitted_data(&self) -> bool {
        !self.tx_vec.is_empty()
    }

    /// Tear down the connection.
    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    /// Tear down the connection once all injected PDUs were received.
    pub fn hang_up_when_drained(&mut self) {
        self.hang_up_when_drained = true;
    }

    /// Truncate oversized PDUs and report their full length, instead of an error.
    pub fn report_oversized_as_length(&mut self) {
        self.oversized_as_length = true;
    }
}

impl Channel for DummyChannel {
    async fn wait_for_connection(&mut self) -> Result<ConnectionHandle, ChannelRxError> {
        if self.connected {
            Ok(DUMMY_HANDLE)
        } else {
            Err(ChannelRxError::Disconnected)
        }
    }

    async fn receive(&mut self, handle: ConnectionHandle, cid: u16, buffer: &mut [u8]) -> Result<usize, ChannelRxError> {
        assert_eq!(handle, DUMMY_HANDLE);

        if self.rx_vec.is_empty() && self.hang_up_when_drained {
            self.connected = false;
        }

        if !self.connected {
            return Err(ChannelRxError::Disconnected);
        }

        if self.rx_vec.is_empty() {
            // The peer stays silent.
            pending::<()>().await;
        }

        let frame = self.rx_vec.remove(0);
        let (frame_cid, payload) = l2cap::decode(&frame).map_err(|_| ChannelRxError::Discarded)?;
        if frame_cid != cid {
            return Err(ChannelRxError::Discarded);
        }

        if payload.len() > buffer.len() {
            if !self.oversized_as_length {
                return Err(ChannelRxError::Oversized(payload.len()));
            }

            let fitting = buffer.len();
            buffer.copy_from_slice(&payload[..fitting]);
            return Ok(payload.len());
        }

        buffer[..payload.len()].copy_from_slice(payload);
        Ok(payload.len())
    }

    async fn send(&mut self, handle: ConnectionHandle, cid: u16, data: &[u8]) -> Result<(), ChannelTxError> {
        assert_eq!(handle, DUMMY_HANDLE);

        if !self.connected {
            return Err(ChannelTxError::Disconnected);
        }

        self.tx_vec.push(frame(cid, data));
        Ok(())
    }
}

/// A dummy timer that never expires.
pub struct DummyTimer {}

impl Timer for DummyTimer {
    async fn after_millis(_milliseconds: u64) {
        // Never time out
        pending().await
    }
}

/// A dummy timer that expires immediately.
pub struct ExpiredTimer {}

impl Timer for ExpiredTimer {
    async fn after_millis(_milliseconds: u64) {}
}

#[cfg(test)]
mod tests {
    use smp_tester_traits::{Channel, ChannelRxError, ChannelTxError};

    use crate::dummy::{DUMMY_HANDLE, DummyChannel};
    use crate::pdu::SMP_CID;

    #[tokio::test]
    async fn test_receive() {
        let mut channel = DummyChannel::new();

        channel.inject_received_data(&[0x05, 0x07]);
        channel.inject_received_frame(0x0004, &[0x0a]);

        let mut buf = [0u8; 8];
        let len = channel.receive(DUMMY_HANDLE, SMP_CID, &mut buf).await.unwrap();
        assert_eq!(&buf[..len], &[0x05, 0x07]);

        assert_eq!(
            channel.receive(DUMMY_HANDLE, SMP_CID, &mut buf).await,
            Err(ChannelRxError::Discarded)
        );
    }

    #[tokio::test]
    async fn test_receive_oversized() {
        let mut channel = DummyChannel::new();

        channel.inject_received_data(&[0x01; 12]);
        channel.inject_received_data(&[0x01; 12]);

        let mut buf = [0u8; 8];
        assert_eq!(
            channel.receive(DUMMY_HANDLE, SMP_CID, &mut buf).await,
            Err(ChannelRxError::Oversized(12))
        );

        channel.report_oversized_as_length();
        assert_eq!(channel.receive(DUMMY_HANDLE, SMP_CID, &mut buf).await, Ok(12));
        assert_eq!(buf, [0x01; 8]);
    }

    #[tokio::test]
    async fn test_transmit() {
        let mut channel = DummyChannel::new();

        channel.send(DUMMY_HANDLE, SMP_CID, &[0x0b, 0x00]).await.unwrap();
        assert_eq!(&channel.probe_transmitted_data()[..], &[0x0b, 0x00]);
        assert!(!channel.has_transmitted_data());

        channel.disconnect();
        assert_eq!(
            channel.send(DUMMY_HANDLE, SMP_CID, &[0x0b, 0x00]).await,
            Err(ChannelTxError::Disconnected)
        );
    }
}
