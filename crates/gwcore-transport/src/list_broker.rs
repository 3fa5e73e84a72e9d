use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::{Mutex, Notify};

use crate::{BrokerEnvelope, TokenGenerator, Transport, TransportConfig, TransportError};

#[derive(Debug, Default)]
struct BrokerState {
    queues: HashMap<String, VecDeque<Vec<u8>>>,
}

/// An in-memory stand-in for the external list-server broker (e.g. Redis)
/// the reference transport talks to. Cloning shares the same underlying
/// queues: construct one `ListBroker` per simulated bus and hand a clone to
/// every participant's `ListBrokerTransport`.
#[derive(Debug, Clone)]
pub struct ListBroker {
    state: Arc<Mutex<BrokerState>>,
    notify: Arc<Notify>,
}

impl ListBroker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BrokerState::default())),
            notify: Arc::new(Notify::new()),
        }
    }

    async fn push(&self, key: &str, bytes: Vec<u8>) {
        let mut guard = self.state.lock().await;
        guard.queues.entry(key.to_string()).or_default().push_back(bytes);
        drop(guard);
        self.notify.notify_waiters();
    }

    async fn pop_if_present(&self, key: &str) -> Option<Vec<u8>> {
        let mut guard = self.state.lock().await;
        guard.queues.get_mut(key).and_then(VecDeque::pop_front)
    }

    async fn peek(&self, key: &str) -> Option<Vec<u8>> {
        let guard = self.state.lock().await;
        guard.queues.get(key).and_then(|q| q.front().cloned())
    }

    /// Waits until `key`'s queue is non-empty, then pops and returns the
    /// front element. Registers for notification before the first check so
    /// a push racing with the wait is never missed.
    async fn pop_blocking(&self, key: &str) -> Vec<u8> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            if let Some(bytes) = self.pop_if_present(key).await {
                return bytes;
            }
            notified.await;
        }
    }
}

impl Default for ListBroker {
    fn default() -> Self {
        Self::new()
    }
}

/// Reference `Transport` implementation: sends push to a fixed outbound key
/// (`<broker_prefix>`), waits pop from a per-uid inbound key
/// (`<broker_prefix>.<uid>`).
pub struct ListBrokerTransport {
    broker: ListBroker,
    uid: u32,
    config: TransportConfig,
    connected: bool,
    token: TokenGenerator,
    broker_version: String,
}

impl ListBrokerTransport {
    pub fn new(broker: ListBroker, uid: u32) -> Result<Self, TransportError> {
        if uid == 0 {
            return Err(TransportError::Configuration {
                reason: "uid not configured".to_string(),
            });
        }

        Ok(Self {
            broker,
            uid,
            config: TransportConfig::default(),
            connected: false,
            token: TokenGenerator::new(),
            broker_version: "list-broker-transport/1".to_string(),
        })
    }

    /// Diagnostic-only identification of the simulated broker, surfaced by
    /// the CLI's `handshake dry-run`/`health`-style inspection commands.
    #[must_use]
    pub fn broker_info(&self) -> &str {
        &self.broker_version
    }

    #[must_use]
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn outbound_key(&self) -> String {
        self.config.broker_prefix.clone()
    }

    fn inbound_key(&self) -> String {
        format!("{}.{}", self.config.broker_prefix, self.uid)
    }
}

impl Transport for ListBrokerTransport {
    fn connect(&mut self, _channels: Vec<String>) -> BoxFuture<'_, Result<(), TransportError>> {
        Box::pin(async move {
            self.config = TransportConfig::from_env();
            self.connected = true;
            Ok(())
        })
    }

    fn send_message(
        &mut self,
        frame: Vec<u8>,
        channel: String,
    ) -> BoxFuture<'_, Result<(), TransportError>> {
        Box::pin(async move {
            if !self.connected {
                return Err(TransportError::NotConnected);
            }
            let envelope = BrokerEnvelope::for_channel(&channel, frame);
            let encoded = envelope.encode()?;
            self.broker.push(&self.outbound_key(), encoded).await;
            Ok(())
        })
    }

    fn wait_message(
        &mut self,
        immediate: bool,
    ) -> BoxFuture<'_, Result<(Vec<u8>, String), TransportError>> {
        Box::pin(async move {
            if !self.connected {
                return Err(TransportError::NotConnected);
            }

            let timeout = if immediate {
                self.config.immediate_timeout
            } else {
                self.config.recv_timeout
            };
            let key = self.inbound_key();

            let encoded = tokio::time::timeout(timeout, self.broker.pop_blocking(&key))
                .await
                .map_err(|_| TransportError::Timeout { waited: timeout })?;

            let envelope = BrokerEnvelope::decode(&encoded)?;
            Ok((envelope.bytes, envelope.channel))
        })
    }

    fn peek_message(&mut self) -> BoxFuture<'_, Result<Option<(Vec<u8>, String)>, TransportError>> {
        Box::pin(async move {
            let key = self.inbound_key();
            let Some(encoded) = self.broker.peek(&key).await else {
                return Ok(None);
            };
            let envelope = BrokerEnvelope::decode(&encoded)?;
            Ok(Some((envelope.bytes, envelope.channel)))
        })
    }

    fn token(&mut self) -> i32 {
        self.token.next()
    }

    fn disconnect(&mut self) -> BoxFuture<'_, Result<(), TransportError>> {
        Box::pin(async move {
            self.connected = false;
            Ok(())
        })
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{ListBroker, ListBrokerTransport};
    use crate::{Transport, TransportError};

    #[tokio::test]
    async fn uid_zero_is_rejected_at_construction() {
        let error = ListBrokerTransport::new(ListBroker::new(), 0)
            .expect_err("uid 0 should be rejected");
        assert!(matches!(error, TransportError::Configuration { .. }));
    }

    #[tokio::test]
    async fn send_lands_on_the_shared_outbound_key() {
        let broker = ListBroker::new();
        let mut model = ListBrokerTransport::new(broker.clone(), 42).unwrap();
        model.connect(vec!["scalar".to_string()]).await.unwrap();

        model
            .send_message(b"hello".to_vec(), "scalar".to_string())
            .await
            .unwrap();

        let encoded = broker
            .pop_if_present(&model.outbound_key())
            .await
            .expect("the push should have landed on the outbound key");
        let envelope = super::BrokerEnvelope::decode(&encoded).unwrap();
        assert_eq!(envelope.bytes, b"hello");
        assert_eq!(envelope.channel, "scalar");
    }

    #[tokio::test]
    async fn wait_message_pops_from_the_per_uid_inbound_key() {
        let broker = ListBroker::new();
        let mut model = ListBrokerTransport::new(broker.clone(), 42).unwrap();
        model.connect(vec![]).await.unwrap();

        let envelope = super::BrokerEnvelope::channel_scoped("scalar", b"reply".to_vec());
        broker
            .push(&model.inbound_key(), envelope.encode().unwrap())
            .await;

        let (frame, channel) = model.wait_message(false).await.unwrap();
        assert_eq!(frame, b"reply");
        assert_eq!(channel, "scalar");
    }

    #[tokio::test]
    async fn wait_message_times_out_when_nothing_arrives() {
        let mut model = ListBrokerTransport::new(ListBroker::new(), 42).unwrap();
        model.connect(vec![]).await.unwrap();
        model.config.recv_timeout = std::time::Duration::from_millis(20);
        model.config.immediate_timeout = std::time::Duration::from_millis(5);

        let error = model.wait_message(true).await.expect_err("should time out");
        assert!(matches!(error, TransportError::Timeout { .. }));
    }
}
