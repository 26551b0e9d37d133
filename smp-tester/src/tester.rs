//! Runs test cases end to end.
//!
//! The runner waits for a connection, binds a fresh [`Exchange`] to it, feeds it inbound
//! PDUs and races the whole case against a deadline. The deadline belongs to the harness,
//! not to the engines, which never time out on their own.
use core::marker::PhantomData;

use embassy_futures::select::{Either, select};
use smp_tester_traits::{Channel, ChannelRxError};

use crate::Role;
use crate::exchange::{Error, Exchange, Verdict};
use crate::pdu::{MAX_PDU_SIZE, SMP_CID};
use crate::script::{Script, ScriptEntry};
use crate::timers::Timer;

/// A named test case.
#[derive(Debug, Clone, Copy)]
pub struct TestCase {
    /// Human readable name.
    pub name: &'static str,
    /// The role that the engine plays. The peer under test plays the other one.
    pub role: Role,
    /// The rounds of the script.
    pub entries: &'static [ScriptEntry<'static>],
}

/// Runner configuration.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Deadline for a whole test case.
    pub timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self { timeout_ms: 2000 }
    }
}

/// Runs test cases over a channel.
#[derive(Debug)]
pub struct Tester<CHANNEL: Channel, TIMER: Timer> {
    channel: CHANNEL,
    config: Config,
    _timer: PhantomData<TIMER>,
}

impl<CHANNEL: Channel, TIMER: Timer> Tester<CHANNEL, TIMER> {
    /// Create a new runner from a channel and configuration.
    pub fn new(channel: CHANNEL, config: Config) -> Self {
        Self {
            channel,
            config,
            _timer: PhantomData,
        }
    }

    /// Access the channel.
    pub fn channel(&mut self) -> &mut CHANNEL {
        &mut self.channel
    }

    /// Run a test case to its verdict.
    pub async fn run(&mut self, case: &TestCase) -> Verdict {
        info!("Running \"{}\" as {:?} against a {:?}", case.name, case.role, case.role.peer());

        let script = match Script::new(case.entries) {
            Ok(script) => script,
            Err(error) => {
                error!("Invalid script: {}", error);
                return Verdict::Failed(error.into());
            }
        };

        let timeout_ms = self.config.timeout_ms;
        let play_fut = Self::play(&mut self.channel, script, case.role);
        let deadline_fut = TIMER::after_millis(timeout_ms);

        let verdict = match select(play_fut, deadline_fut).await {
            Either::First(verdict) => verdict,
            Either::Second(()) => {
                warn!("Deadline of {} ms expired", timeout_ms);
                Verdict::Failed(Error::Timeout(timeout_ms))
            }
        };

        info!("\"{}\": {:?}", case.name, verdict);
        verdict
    }

    async fn play(channel: &mut CHANNEL, script: Script<'_>, role: Role) -> Verdict {
        let Ok(handle) = channel.wait_for_connection().await else {
            return Verdict::Failed(Error::Disconnected);
        };

        let mut exchange = Exchange::new(script, role);
        if let Some(verdict) = exchange.on_connect(channel, handle).await {
            return verdict;
        }

        let mut buffer = [0u8; MAX_PDU_SIZE];
        loop {
            let received = channel.receive(handle, SMP_CID, &mut buffer).await;
            let verdict = match received {
                Ok(length) => match buffer.get(..length) {
                    Some(pdu) => exchange.on_message(channel, pdu).await,
                    None => exchange.on_oversized(channel, length).await,
                },
                Err(ChannelRxError::Oversized(length)) => exchange.on_oversized(channel, length).await,
                Err(ChannelRxError::Discarded) => {
                    trace!("Skipping discarded frame");
                    continue;
                }
                Err(ChannelRxError::Disconnected) => {
                    exchange.on_disconnect();
                    return Verdict::Failed(Error::Disconnected);
                }
            };

            if let Some(verdict) = verdict {
                return verdict;
            }
        }
    }
}
