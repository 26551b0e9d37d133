//! Scripted exchange engines.
//!
//! An engine binds a [`Script`] to a connection and walks through it round by round.
//! The [`Responder`] answers the peer's requests, the [`Initiator`] sends requests and
//! checks the peer's responses. Both stop at the first mismatch.
//!
//! Engines have no timeouts. A peer that stops talking leaves an engine waiting until
//! the surrounding harness gives up.
mod initiator;
mod responder;


pub use initiator::Initiator;
pub use responder::Responder;
use smp_tester_traits::{Channel, ChannelTxError, ConnectionHandle};

use crate::Role;
use crate::pdu::{self, Comparison, SMP_CID};
use crate::script::{Script, ScriptEntry, ScriptError};

/// Errors that fail a test case.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The received PDU's length disagrees with the script.
    #[error("round {round}: unexpected PDU length (expected {expected}, found {found})")]
    LengthMismatch {
        /// The round in which the mismatch occurred.
        round: usize,
        /// The scripted length.
        expected: usize,
        /// The received length.
        found: usize,
    },
    /// The received PDU's content disagrees with the script.
    #[error("round {round}: unexpected content in PDU with opcode {opcode:#04x}")]
    ContentMismatch {
        /// The round in which the mismatch occurred.
        round: usize,
        /// The received PDU's opcode.
        opcode: u8,
    },
    /// A transmission could not be delivered.
    #[error("channel error: {0:?}")]
    Channel(ChannelTxError),
    /// The connection was torn down before the script completed.
    #[error("connection torn down")]
    Disconnected,
    /// The harness deadline expired before the script completed.
    #[error("deadline of {0} ms expired")]
    Timeout(u64),
    /// The test case's script is invalid.
    #[error("invalid script: {0}")]
    Script(#[from] ScriptError),
}

/// The outcome of a test case.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Verdict {
    /// The whole script was played successfully.
    Passed,
    /// The test case failed.
    Failed(Error),
}

/// Per-connection progress through a script.
#[derive(Debug, Clone)]
pub struct ExchangeState<'s> {
    script: Script<'s>,
    position: usize,
    handle: ConnectionHandle,
}

impl<'s> ExchangeState<'s> {
    /// Bind `script` to the connection `handle`, starting at the first round.
    pub fn new(script: Script<'s>, handle: ConnectionHandle) -> Self {
        Self {
            script,
            position: 0,
            handle,
        }
    }

    /// The number of rounds consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// The connection that the script is played on.
    pub fn handle(&self) -> ConnectionHandle {
        self.handle
    }

    /// All rounds were consumed.
    pub fn is_complete(&self) -> bool {
        self.position >= self.script.length()
    }

    /// The round that is played next, if any.
    fn upcoming(&self) -> Option<&'s ScriptEntry<'s>> {
        self.script.entry_at(self.position).ok()
    }

    /// Consume the current round, returning its index and entry.
    ///
    /// Must not be called on a complete exchange.
    fn advance(&mut self) -> (usize, &'s ScriptEntry<'s>) {
        let round = self.position;
        let entry = match self.script.entry_at(round) {
            Ok(entry) => entry,
            Err(error) => unreachable!("{}", error),
        };

        self.position += 1;
        (round, entry)
    }

    /// Transmit a scripted payload to the peer.
    async fn send<C: Channel>(&self, channel: &mut C, round: usize, payload: &[u8]) -> Result<(), Error> {
        let pdu = pdu::outbound(payload);
        pdu::log_pdu("send", round, pdu);

        channel.send(self.handle, SMP_CID, pdu).await.map_err(|error| {
            error!("Round {}: transmission failed: {:?}", round, error);
            Error::Channel(error)
        })
    }
}

/// Engine states.
#[derive(Debug, Clone)]
pub enum State<'s> {
    /// No connection was bound yet.
    Idle,
    /// Waiting for the peer's next PDU: a request for the responder, a response for the initiator.
    Awaiting(ExchangeState<'s>),
    /// The script completed successfully.
    Passed,
    /// The script failed.
    Failed(Error),
    /// The connection was torn down before a verdict was reached.
    Abandoned,
}

/// Whether a round left the script open, or finished it.
enum Progress {
    Continue,
    Done,
}

impl<'s> State<'s> {
    /// Whether no further PDUs are processed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Passed | State::Failed(_) | State::Abandoned)
    }

    /// Apply the result of a round, returning a verdict on entering a terminal state.
    fn conclude(&mut self, result: Result<Progress, Error>) -> Option<Verdict> {
        match result {
            Ok(Progress::Continue) => None,
            Ok(Progress::Done) => {
                info!("Script complete, test passed");
                *self = State::Passed;
                Some(Verdict::Passed)
            }
            Err(error) => {
                warn!("Test failed: {}", error);
                *self = State::Failed(error.clone());
                Some(Verdict::Failed(error))
            }
        }
    }

    /// Drop the in-flight exchange without a verdict.
    fn abandon(&mut self) {
        if let State::Awaiting(exchange) = self {
            debug!("Abandoning exchange at round {}", exchange.position());
            *self = State::Abandoned;
        }
    }
}

/// A PDU handed to an engine.
#[derive(Debug, Clone, Copy)]
enum Inbound<'a> {
    /// A PDU that fit the receive buffer.
    Pdu(&'a [u8]),
    /// The length of a PDU that did not fit the receive buffer.
    Oversized(usize),
}

/// Check a received PDU against its scripted counterpart.
fn validate(round: usize, expected: &[u8], inbound: Inbound<'_>) -> Result<(), Error> {
    let received = match inbound {
        Inbound::Pdu(received) => received,
        Inbound::Oversized(found) => {
            // Scripted PDUs always fit, so an oversized one never matches.
            warn!("Round {}: oversized PDU ({} bytes)", round, found);

            return Err(Error::LengthMismatch {
                round,
                expected: expected.len(),
                found,
            });
        }
    };

    pdu::log_pdu("received", round, received);

    if received.len() != expected.len() {
        warn!(
            "Round {}: unexpected PDU length ({} != {})",
            round,
            received.len(),
            expected.len()
        );

        return Err(Error::LengthMismatch {
            round,
            expected: expected.len(),
            found: received.len(),
        });
    }

    let comparison = pdu::classify(received);
    if comparison.matches(expected, received) {
        if comparison == Comparison::LengthOnly {
            trace!("Round {}: content not compared", round);
        }

        Ok(())
    } else {
        warn!("Round {}: unexpected PDU content", round);

        Err(Error::ContentMismatch {
            round,
            opcode: received.first().copied().unwrap_or_default(),
        })
    }
}

/// An engine for either role, created fresh for every test case.
#[derive(Debug)]
pub enum Exchange<'s> {
    /// Plays the initiator.
    Initiator(Initiator<'s>),
    /// Plays the responder.
    Responder(Responder<'s>),
}

impl<'s> Exchange<'s> {
    /// Create an engine that plays `script` in `role`.
    pub fn new(script: Script<'s>, role: Role) -> Self {
        match role {
            Role::Initiator => Exchange::Initiator(Initiator::new(script)),
            Role::Responder => Exchange::Responder(Responder::new(script)),
        }
    }

    /// The role that the engine plays.
    pub fn role(&self) -> Role {
        match self {
            Exchange::Initiator(_) => Role::Initiator,
            Exchange::Responder(_) => Role::Responder,
        }
    }

    /// The engine's state.
    pub fn state(&self) -> &State<'s> {
        match self {
            Exchange::Initiator(initiator) => initiator.state(),
            Exchange::Responder(responder) => responder.state(),
        }
    }

    /// Handle a new connection.
    pub async fn on_connect<C: Channel>(&mut self, channel: &mut C, handle: ConnectionHandle) -> Option<Verdict> {
        match self {
            Exchange::Initiator(initiator) => initiator.on_connect(channel, handle).await,
            Exchange::Responder(responder) => responder.on_connect(handle),
        }
    }

    /// Handle an inbound PDU.
    pub async fn on_message<C: Channel>(&mut self, channel: &mut C, pdu: &[u8]) -> Option<Verdict> {
        match self {
            Exchange::Initiator(initiator) => initiator.on_message(channel, pdu).await,
            Exchange::Responder(responder) => responder.on_message(channel, pdu).await,
        }
    }

    /// Handle an inbound PDU of `length` bytes that did not fit the receive buffer.
    pub async fn on_oversized<C: Channel>(&mut self, channel: &mut C, length: usize) -> Option<Verdict> {
        match self {
            Exchange::Initiator(initiator) => initiator.on_oversized(channel, length).await,
            Exchange::Responder(responder) => responder.on_oversized(channel, length).await,
        }
    }

    /// Handle connection teardown.
    pub fn on_disconnect(&mut self) {
        match self {
            Exchange::Initiator(initiator) => initiator.on_disconnect(),
            Exchange::Responder(responder) => responder.on_disconnect(),
        }
    }
}
