//! Scripted conformance tester for the Bluetooth LE Security Manager Protocol (SMP).
//!
//! A test case is a [`script::Script`] of expected-request/canned-response pairs. The
//! [`exchange`] engines play such a script against a live peer, in either the initiator
//! or the responder role, and report a single [`exchange::Verdict`].
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

#[macro_use]
mod fmt;

pub mod catalogue;
pub mod exchange;
pub mod l2cap;
pub mod pdu;
pub mod script;
pub mod tester;
pub mod timers;

#[cfg(test)]
mod dummy;

pub use smp_tester_traits::{Channel, ChannelRxError, ChannelTxError, ConnectionHandle};

/// The protocol role that an engine plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Role {
    /// Sends the first request, then reacts to responses.
    Initiator,
    /// Reacts to requests.
    Responder,
}

impl Role {
    /// The role of the peer.
    pub fn peer(self) -> Self {
        match self {
            Role::Initiator => Role::Responder,
            Role::Responder => Role::Initiator,
        }
    }
}
