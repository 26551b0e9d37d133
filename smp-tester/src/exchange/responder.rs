//! The responder engine.
use smp_tester_traits::{Channel, ConnectionHandle};

use super::{Error, ExchangeState, Inbound, Progress, State, Verdict, validate};
use crate::script::Script;

/// Answers the peer's requests with scripted responses.
#[derive(Debug)]
pub struct Responder<'s> {
    script: Script<'s>,
    state: State<'s>,
}

impl<'s> Responder<'s> {
    /// Create a responder for `script`.
    pub fn new(script: Script<'s>) -> Self {
        Self {
            script,
            state: State::Idle,
        }
    }

    /// The engine's state.
    pub fn state(&self) -> &State<'s> {
        &self.state
    }

    /// Bind the script to a new connection and wait for the first request.
    ///
    /// Only the first connection is bound, later ones are ignored.
    pub fn on_connect(&mut self, handle: ConnectionHandle) -> Option<Verdict> {
        if !matches!(self.state, State::Idle) {
            trace!("Responder ignores connection {:?}, already bound", handle);
            return None;
        }

        debug!("Responder bound to connection {:?}", handle);
        self.state = State::Awaiting(ExchangeState::new(self.script, handle));
        None
    }

    /// Check a request from the peer and transmit the scripted response.
    ///
    /// Returns the verdict once, on reaching a terminal state.
    pub async fn on_message<C: Channel>(&mut self, channel: &mut C, pdu: &[u8]) -> Option<Verdict> {
        self.receive(channel, Inbound::Pdu(pdu)).await
    }

    /// Handle a request of `length` bytes that did not fit the receive buffer.
    pub async fn on_oversized<C: Channel>(&mut self, channel: &mut C, length: usize) -> Option<Verdict> {
        self.receive(channel, Inbound::Oversized(length)).await
    }

    /// Abandon the exchange on connection teardown.
    pub fn on_disconnect(&mut self) {
        self.state.abandon();
    }

    async fn receive<C: Channel>(&mut self, channel: &mut C, inbound: Inbound<'_>) -> Option<Verdict> {
        let State::Awaiting(exchange) = &mut self.state else {
            trace!("Responder ignores PDU outside of an exchange");
            return None;
        };

        let result = Self::play_round(exchange, channel, inbound).await;
        self.state.conclude(result)
    }

    async fn play_round<C: Channel>(
        exchange: &mut ExchangeState<'s>,
        channel: &mut C,
        inbound: Inbound<'_>,
    ) -> Result<Progress, Error> {
        if exchange.is_complete() {
            debug!("Request after script completion");
            return Ok(Progress::Done);
        }

        let (round, entry) = exchange.advance();
        validate(round, entry.request, inbound)?;

        match entry.response {
            Some(response) => {
                exchange.send(channel, round, response).await?;

                if exchange.is_complete() {
                    Ok(Progress::Done)
                } else {
                    Ok(Progress::Continue)
                }
            }
            // The script ends without a final reply.
            None => Ok(Progress::Done),
        }
    }
}
