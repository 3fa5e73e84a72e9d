use std::any::Any;
use std::env;
use std::time::Duration;

use futures::future::BoxFuture;

mod envelope;
mod error;
mod list_broker;
mod stub;

pub use envelope::{BrokerEnvelope, CHANNEL_TAG, NOTIFY_TAG};
pub use error::TransportError;
pub use list_broker::{ListBroker, ListBrokerTransport};
pub use stub::{StubTransport, TraceEntry};

/// Monotonically increasing per-connection request nonce, starting at 1.
/// Each `Transport` implementation owns one; wraparound is unspecified, as
/// in the upstream protocol.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokenGenerator(i32);

impl TokenGenerator {
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    pub fn next(&mut self) -> i32 {
        self.0 = self.0.wrapping_add(1);
        self.0
    }
}

/// Configuration read once at `Transport::connect` time and never again
/// (per the "global mutable state" design note: `SIMBUS_TIMEOUT` is sampled
/// once, not polled on every wait).
#[derive(Debug, Clone, PartialEq)]
pub struct TransportConfig {
    pub recv_timeout: Duration,
    pub immediate_timeout: Duration,
    pub broker_prefix: String,
    pub connect_timeout: Duration,
}

impl TransportConfig {
    pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_IMMEDIATE_TIMEOUT: Duration = Duration::from_secs(1);
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_BROKER_PREFIX: &'static str = "dse.simbus";

    /// Reads `SIMBUS_TIMEOUT` (integer seconds) if present; falls back to
    /// the 60-second default otherwise. Intended to be called exactly once,
    /// during `connect`.
    #[must_use]
    pub fn from_env() -> Self {
        let recv_timeout = env::var("SIMBUS_TIMEOUT")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Self::DEFAULT_RECV_TIMEOUT);

        Self {
            recv_timeout,
            ..Self::default()
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            recv_timeout: Self::DEFAULT_RECV_TIMEOUT,
            immediate_timeout: Self::DEFAULT_IMMEDIATE_TIMEOUT,
            broker_prefix: Self::DEFAULT_BROKER_PREFIX.to_string(),
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Polymorphic send/wait/peek capability over named logical channels.
///
/// Object-safe via boxed futures (mirroring `gwcore_io::MessageSink`/
/// `MessageSource`) so the Gateway Engine can hold a `Box<dyn Transport>`
/// without committing to a concrete executor binding at the trait level.
pub trait Transport: Send {
    /// One-shot setup; `channels` is the logical channel list the caller
    /// will send/receive on (used for optional subscription bookkeeping by
    /// implementations that need it; the reference list-broker transport
    /// does not).
    fn connect(&mut self, channels: Vec<String>) -> BoxFuture<'_, Result<(), TransportError>>;

    /// `channel == ""` means a broadcast/notify frame.
    fn send_message(
        &mut self,
        frame: Vec<u8>,
        channel: String,
    ) -> BoxFuture<'_, Result<(), TransportError>>;

    /// Blocks up to the connection's configured timeout (`immediate = true`
    /// forces the short one-second timeout used when polling for
    /// out-of-order replies during the register handshake).
    fn wait_message(
        &mut self,
        immediate: bool,
    ) -> BoxFuture<'_, Result<(Vec<u8>, String), TransportError>>;

    /// Non-blocking head-of-queue lookup.
    fn peek_message(&mut self) -> BoxFuture<'_, Result<Option<(Vec<u8>, String)>, TransportError>>;

    /// Next token in this connection's nonce sequence.
    fn token(&mut self) -> i32;

    /// Idempotent teardown.
    fn disconnect(&mut self) -> BoxFuture<'_, Result<(), TransportError>>;

    /// Downcast hook so a caller holding `Box<dyn Transport>` (the Gateway
    /// Engine) can recover the concrete implementation, e.g. a test reading
    /// a `StubTransport`'s trace.
    fn as_any(&self) -> &dyn Any;

    /// Mutable counterpart of `as_any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[cfg(test)]
mod tests {
    use super::{TokenGenerator, TransportConfig};

    #[test]
    fn token_generator_starts_at_one_and_increments() {
        let mut gen = TokenGenerator::new();
        assert_eq!(gen.next(), 1);
        assert_eq!(gen.next(), 2);
        assert_eq!(gen.next(), 3);
    }

    #[test]
    fn default_config_uses_sixty_second_receive_timeout() {
        let config = TransportConfig::default();
        assert_eq!(config.recv_timeout, TransportConfig::DEFAULT_RECV_TIMEOUT);
        assert_eq!(config.broker_prefix, "dse.simbus");
    }
}
