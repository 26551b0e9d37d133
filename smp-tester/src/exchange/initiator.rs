//! The initiator engine.
use smp_tester_traits::{Channel, ConnectionHandle};

use super::{Error, ExchangeState, Inbound, Progress, State, Verdict, validate};
use crate::script::Script;

/// Sends scripted requests and checks the peer's responses.
#[derive(Debug)]
pub struct Initiator<'s> {
    script: Script<'s>,
    state: State<'s>,
}

impl<'s> Initiator<'s> {
    /// Create an initiator for `script`.
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

    /// Bind the script to a new connection and transmit the first request.
    ///
    /// Only the first connection is bound, later ones are ignored and nothing is sent.
    pub async fn on_connect<C: Channel>(&mut self, channel: &mut C, handle: ConnectionHandle) -> Option<Verdict> {
        if !matches!(self.state, State::Idle) {
            trace!("Initiator ignores connection {:?}, already bound", handle);
            return None;
        }

        debug!("Initiator bound to connection {:?}", handle);

        let exchange = ExchangeState::new(self.script, handle);
        let result = match exchange.upcoming() {
            Some(first) => exchange
                .send(channel, 0, first.request)
                .await
                .map(|()| Progress::Continue),
            None => Ok(Progress::Done),
        };

        self.state = State::Awaiting(exchange);
        self.state.conclude(result)
    }

    /// Check a response from the peer and transmit the next request.
    ///
    /// Returns the verdict once, on reaching a terminal state.
    pub async fn on_message<C: Channel>(&mut self, channel: &mut C, pdu: &[u8]) -> Option<Verdict> {
        self.receive(channel, Inbound::Pdu(pdu)).await
    }

    /// Handle a response of `length` bytes that did not fit the receive buffer.
    pub async fn on_oversized<C: Channel>(&mut self, channel: &mut C, length: usize) -> Option<Verdict> {
        self.receive(channel, Inbound::Oversized(length)).await
    }

    /// Abandon the exchange on connection teardown.
    pub fn on_disconnect(&mut self) {
        self.state.abandon();
    }

    async fn receive<C: Channel>(&mut self, channel: &mut C, inbound: Inbound<'_>) -> Option<Verdict> {
        let State::Awaiting(exchange) = &mut self.state else {
            trace!("Initiator ignores PDU outside of an exchange");
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
            debug!("Response after script completion");
            return Ok(Progress::Done);
        }

        let (round, entry) = exchange.advance();
        match entry.response {
            Some(expected) => validate(round, expected, inbound)?,
            None => trace!("Round {}: no response scripted, PDU not checked", round),
        }

        match exchange.upcoming() {
            Some(next) => {
                exchange.send(channel, exchange.position(), next.request).await?;
                Ok(Progress::Continue)
            }
            None => Ok(Progress::Done),
        }
    }
}
