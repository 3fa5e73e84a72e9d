use std::collections::VecDeque;
use std::time::Duration;

use futures::future::BoxFuture;

use crate::{TokenGenerator, Transport, TransportError};

/// One chronological entry in a `StubTransport`'s send/recv record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEntry {
    Send { channel: String, frame: Vec<u8> },
    Recv { channel: String, frame: Vec<u8> },
}

/// Test double for `Transport`: a `Stack` of primed inbound frames and a
/// `Trace` of every send/recv in chronological order, so handshake and sync
/// tests can assert exact message ordering.
///
/// Every byte slice is deep-copied on entry to both buffers — callers are
/// free to reuse or mutate the slice they passed to `push_message` after the
/// call returns.
#[derive(Debug, Default)]
pub struct StubTransport {
    connected: bool,
    channels: Vec<String>,
    stack: VecDeque<(Vec<u8>, String)>,
    trace: Vec<TraceEntry>,
    token: TokenGenerator,
}

impl StubTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Primes the stack with a frame that a subsequent `wait_message` will
    /// return. Deep-copies `frame`.
    pub fn push_message(&mut self, channel: &str, frame: &[u8]) {
        self.stack.push_back((frame.to_vec(), channel.to_string()));
    }

    #[must_use]
    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }

    #[must_use]
    pub fn trace_message(&self, index: usize) -> Option<&TraceEntry> {
        self.trace.get(index)
    }

    #[must_use]
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.stack.len()
    }
}

impl Transport for StubTransport {
    fn connect(&mut self, channels: Vec<String>) -> BoxFuture<'_, Result<(), TransportError>> {
        Box::pin(async move {
            self.channels = channels;
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
            self.trace.push(TraceEntry::Send {
                channel,
                frame,
            });
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
            let Some((frame, channel)) = self.stack.pop_front() else {
                let waited = if immediate {
                    Duration::from_secs(1)
                } else {
                    Duration::from_secs(60)
                };
                return Err(TransportError::Timeout { waited });
            };
            self.trace.push(TraceEntry::Recv {
                channel: channel.clone(),
                frame: frame.clone(),
            });
            Ok((frame, channel))
        })
    }

    fn peek_message(&mut self) -> BoxFuture<'_, Result<Option<(Vec<u8>, String)>, TransportError>> {
        Box::pin(async move { Ok(self.stack.front().cloned()) })
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
