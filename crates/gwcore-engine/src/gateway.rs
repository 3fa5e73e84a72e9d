use std::collections::{HashMap, HashSet};

use gwcore_signal::{BinaryVector, ScalarVector};
use gwcore_transport::Transport;
use gwcore_wire::{
    ChannelMessage, ChannelPayload, MessageType, NotifyMessage, NotifySignalVector, SignalUidValue,
};

use crate::config::GatewayConfig;
use crate::error::GatewayError;

/// What a completed `sync` call tells the caller: keep stepping, or the
/// configured `end_time` has been reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Continue,
    EndTimeReached,
}

/// The co-simulation client: owns a transport and one signal vector per
/// channel, and drives the register/index/read handshake followed by the
/// per-step notify exchange.
pub struct Gateway {
    config: GatewayConfig,
    limits: gwcore_limits::Limits,
    transport: Option<Box<dyn Transport>>,
    scalar_vectors: HashMap<String, ScalarVector>,
    binary_vectors: HashMap<String, BinaryVector>,
    channel_order: Vec<String>,
    model_time: f64,
    schedule_time: f64,
    gateway_time: f64,
    connected: bool,
}

impl Gateway {
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_limits(config, gwcore_limits::Limits::default())
    }

    #[must_use]
    pub fn with_limits(config: GatewayConfig, limits: gwcore_limits::Limits) -> Self {
        Self {
            config,
            limits,
            transport: None,
            scalar_vectors: HashMap::new(),
            binary_vectors: HashMap::new(),
            channel_order: Vec::new(),
            model_time: 0.0,
            schedule_time: 0.0,
            gateway_time: 0.0,
            connected: false,
        }
    }

    pub fn set_transport(&mut self, transport: impl Transport + 'static) {
        self.transport = Some(Box::new(transport));
    }

    /// Downcast access to the concrete transport, for callers (tests) that
    /// need to inspect implementation-specific state such as a
    /// `StubTransport`'s trace.
    pub fn transport_as_any_mut(&mut self) -> Option<&mut dyn std::any::Any> {
        self.transport.as_mut().map(|transport| transport.as_any_mut())
    }

    pub fn add_scalar_vector<S: AsRef<str>>(
        &mut self,
        channel: &str,
        names: &[S],
    ) -> Result<(), GatewayError> {
        self.ensure_channel_available(channel)?;
        let mut vector = ScalarVector::with_limits(&self.limits);
        vector.add(names)?;
        self.scalar_vectors.insert(channel.to_string(), vector);
        self.channel_order.push(channel.to_string());
        Ok(())
    }

    pub fn add_binary_vector<S: AsRef<str>>(
        &mut self,
        channel: &str,
        names: &[S],
    ) -> Result<(), GatewayError> {
        self.ensure_channel_available(channel)?;
        let mut vector = BinaryVector::with_limits(&self.limits);
        vector.add(names)?;
        self.binary_vectors.insert(channel.to_string(), vector);
        self.channel_order.push(channel.to_string());
        Ok(())
    }

    fn ensure_channel_available(&self, channel: &str) -> Result<(), GatewayError> {
        if self.scalar_vectors.contains_key(channel) || self.binary_vectors.contains_key(channel) {
            return Err(GatewayError::GatewayConfig {
                reason: format!("channel {channel:?} is already configured"),
            });
        }
        if self.channel_order.len() >= self.limits.max_channels {
            return Err(GatewayError::GatewayConfig {
                reason: format!(
                    "channel {channel:?} exceeds max_channels ({})",
                    self.limits.max_channels
                ),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn uid(&self) -> u32 {
        self.config.uid
    }

    #[must_use]
    pub fn model_time(&self) -> f64 {
        self.model_time
    }

    #[must_use]
    pub fn schedule_time(&self) -> f64 {
        self.schedule_time
    }

    #[must_use]
    pub fn gateway_time(&self) -> f64 {
        self.gateway_time
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    #[must_use]
    pub fn scalar_vector(&self, channel: &str) -> Option<&ScalarVector> {
        self.scalar_vectors.get(channel)
    }

    #[must_use]
    pub fn scalar_vector_mut(&mut self, channel: &str) -> Option<&mut ScalarVector> {
        self.scalar_vectors.get_mut(channel)
    }

    #[must_use]
    pub fn binary_vector(&self, channel: &str) -> Option<&BinaryVector> {
        self.binary_vectors.get(channel)
    }

    #[must_use]
    pub fn binary_vector_mut(&mut self, channel: &str) -> Option<&mut BinaryVector> {
        self.binary_vectors.get_mut(channel)
    }

    fn names_for_channel(&self, channel: &str) -> Vec<String> {
        if let Some(vector) = self.scalar_vectors.get(channel) {
            vector.names().into_iter().map(String::from).collect()
        } else if let Some(vector) = self.binary_vectors.get(channel) {
            vector.names().into_iter().map(String::from).collect()
        } else {
            Vec::new()
        }
    }

    fn validate_config(&self) -> Result<(), GatewayError> {
        if self.config.name.is_empty() {
            return Err(GatewayError::GatewayConfig {
                reason: "gateway name not configured".to_string(),
            });
        }
        if self.config.uid == 0 {
            return Err(GatewayError::GatewayConfig {
                reason: "uid not configured".to_string(),
            });
        }
        if self.channel_order.is_empty() {
            return Err(GatewayError::GatewayConfig {
                reason: "signal vectors not configured".to_string(),
            });
        }
        if self.config.register_retry > self.limits.register_retry_ceiling {
            return Err(GatewayError::GatewayConfig {
                reason: format!(
                    "register_retry ({}) exceeds register_retry_ceiling ({})",
                    self.config.register_retry, self.limits.register_retry_ceiling
                ),
            });
        }
        if self.transport.is_none() {
            return Err(GatewayError::ModelNoConnection);
        }
        Ok(())
    }

    /// Connects the transport, then runs the three-phase handshake:
    /// ModelRegister, SignalIndex, SignalRead.
    pub async fn connect(&mut self) -> Result<(), GatewayError> {
        self.validate_config()?;

        let channels = self.channel_order.clone();
        let transport = self.transport.as_mut().ok_or(GatewayError::ModelNoConnection)?;
        transport
            .connect(channels)
            .await
            .map_err(GatewayError::ModelConnectFail)?;

        self.register_handshake().await?;
        self.index_handshake().await?;
        self.read_handshake().await?;

        self.connected = true;
        Ok(())
    }

    async fn register_handshake(&mut self) -> Result<(), GatewayError> {
        let rounds = self.config.register_retry.max(1);
        let mut outstanding: HashMap<String, i32> = HashMap::new();

        for round in 0..rounds {
            let channels_to_send: Vec<String> = if round == 0 {
                self.channel_order.clone()
            } else {
                outstanding.keys().cloned().collect()
            };

            for channel in &channels_to_send {
                let transport = self
                    .transport
                    .as_mut()
                    .ok_or(GatewayError::ModelNoConnection)?;
                let token = transport.token();
                let msg = ChannelMessage::model_register(self.config.uid, self.config.uid, token);
                let encoded = msg
                    .encode(self.limits.max_frame_bytes)
                    .map_err(GatewayError::Wire)?;
                transport
                    .send_message(encoded, channel.clone())
                    .await
                    .map_err(GatewayError::ModelConnectFail)?;
                outstanding.insert(channel.clone(), token);
            }

            loop {
                if outstanding.is_empty() {
                    return Ok(());
                }
                let transport = self
                    .transport
                    .as_mut()
                    .ok_or(GatewayError::ModelNoConnection)?;
                match transport.wait_message(true).await {
                    Ok((frame, _channel)) => {
                        if let Ok(msg) = ChannelMessage::decode(&frame, self.limits.max_frame_bytes)
                        {
                            if msg.model_uid == self.config.uid {
                                if let Some(token) = msg.token {
                                    outstanding.retain(|_, pending| *pending != token);
                                }
                            }
                        }
                    }
                    Err(gwcore_transport::TransportError::Timeout { .. }) => break,
                    Err(err) => {
                        return Err(GatewayError::ModelChannelWait {
                            reason: err.to_string(),
                        })
                    }
                }
            }
        }

        if outstanding.is_empty() {
            Ok(())
        } else {
            let mut channels: Vec<&String> = outstanding.keys().collect();
            channels.sort();
            Err(GatewayError::ModelChannelWait {
                reason: format!("register ack timed out for channels: {channels:?}"),
            })
        }
    }

    async fn index_handshake(&mut self) -> Result<(), GatewayError> {
        for channel in self.channel_order.clone() {
            let names = self.names_for_channel(&channel);
            let msg = ChannelMessage::signal_index_request(self.config.uid, names);
            let encoded = msg
                .encode(self.limits.max_frame_bytes)
                .map_err(GatewayError::Wire)?;
            let transport = self
                .transport
                .as_mut()
                .ok_or(GatewayError::ModelNoConnection)?;
            transport
                .send_message(encoded, channel)
                .await
                .map_err(GatewayError::Transport)?;
        }

        let mut pending: HashSet<String> = self.channel_order.iter().cloned().collect();
        while !pending.is_empty() {
            let (channel, msg) = self.wait_for_channel_message(MessageType::SignalIndex).await?;
            if let ChannelPayload::SignalIndexReply { indexes } = msg.payload {
                let names: Vec<String> = indexes.iter().map(|entry| entry.name.clone()).collect();
                let uids: Vec<u32> = indexes.iter().map(|entry| entry.signal_uid).collect();
                if let Some(vector) = self.scalar_vectors.get_mut(&channel) {
                    vector.index_signals(&names, &uids)?;
                } else if let Some(vector) = self.binary_vectors.get_mut(&channel) {
                    vector.index_signals(&names, &uids)?;
                }
                pending.remove(&channel);
            }
        }
        Ok(())
    }

    /// Sends `SignalRead` and waits `SignalValue` on every configured
    /// channel, scalar and binary alike; only scalar replies are actually
    /// applied via `from_msgpack` (binary vectors ignore the snapshot body,
    /// per spec, but still participate in the send/wait round).
    async fn read_handshake(&mut self) -> Result<(), GatewayError> {
        for channel in self.channel_order.clone() {
            let names = self.names_for_channel(&channel);
            let msg = ChannelMessage::signal_read_request(self.config.uid, names);
            let encoded = msg
                .encode(self.limits.max_frame_bytes)
                .map_err(GatewayError::Wire)?;
            let transport = self
                .transport
                .as_mut()
                .ok_or(GatewayError::ModelNoConnection)?;
            transport
                .send_message(encoded, channel)
                .await
                .map_err(GatewayError::Transport)?;
        }

        let mut pending: HashSet<String> = self.channel_order.iter().cloned().collect();
        while !pending.is_empty() {
            let (channel, msg) = self.wait_for_channel_message(MessageType::SignalValue).await?;
            if let ChannelPayload::SignalValueReply { body } = msg.payload {
                if let Some(vector) = self.scalar_vectors.get_mut(&channel) {
                    vector.from_msgpack(&body)?;
                }
                pending.remove(&channel);
            }
        }
        Ok(())
    }

    /// Drains channel messages until one of type `expected`, addressed to
    /// this gateway's uid, shows up. Anything else addressed to us is routed
    /// through `dispatch_side_effect_channel_message`; frames addressed to a
    /// different model, or that fail to decode at all, are skipped.
    async fn wait_for_channel_message(
        &mut self,
        expected: MessageType,
    ) -> Result<(String, ChannelMessage), GatewayError> {
        loop {
            let transport = self
                .transport
                .as_mut()
                .ok_or(GatewayError::ModelNoConnection)?;
            let (frame, channel) = transport
                .wait_message(false)
                .await
                .map_err(|err| GatewayError::ModelChannelWait {
                    reason: err.to_string(),
                })?;

            match ChannelMessage::decode(&frame, self.limits.max_frame_bytes) {
                Ok(msg) if msg.model_uid == self.config.uid && msg.message_type == expected => {
                    return Ok((channel, msg));
                }
                Ok(msg) if msg.model_uid == self.config.uid => {
                    self.dispatch_side_effect_channel_message(&channel, msg);
                }
                _ => {}
            }
        }
    }

    fn dispatch_side_effect_channel_message(&mut self, channel: &str, msg: ChannelMessage) {
        match msg.payload {
            ChannelPayload::SignalIndexReply { indexes } => {
                let names: Vec<String> = indexes.iter().map(|entry| entry.name.clone()).collect();
                let uids: Vec<u32> = indexes.iter().map(|entry| entry.signal_uid).collect();
                if let Some(vector) = self.scalar_vectors.get_mut(channel) {
                    let _ = vector.index_signals(&names, &uids);
                } else if let Some(vector) = self.binary_vectors.get_mut(channel) {
                    let _ = vector.index_signals(&names, &uids);
                }
            }
            ChannelPayload::SignalValueReply { body } => {
                if let Some(vector) = self.scalar_vectors.get_mut(channel) {
                    let _ = vector.from_msgpack(&body);
                }
            }
            _ => {}
        }
    }

    /// Advances the gateway to `external_time`: applies the clock epsilon
    /// nudge, rejects a gateway that has fallen behind, steps the notify
    /// exchange until `model_time` passes `external_time`, then reports
    /// whether `end_time` has been reached.
    pub async fn sync(&mut self, external_time: f64) -> Result<SyncOutcome, GatewayError> {
        if !self.connected {
            return Err(GatewayError::ModelNoConnection);
        }

        if self.config.clock_epsilon > 0.0 {
            self.model_time += self.config.clock_epsilon;
        }

        if external_time < self.model_time {
            return Err(GatewayError::GatewayBehind {
                external_time,
                model_time: self.model_time,
            });
        }

        while self.model_time <= external_time {
            self.step().await?;
        }

        self.gateway_time = external_time;

        if self.config.end_time > 0.0 && self.config.end_time < self.model_time {
            return Ok(SyncOutcome::EndTimeReached);
        }
        Ok(SyncOutcome::Continue)
    }

    async fn step(&mut self) -> Result<(), GatewayError> {
        self.notify_out().await?;
        self.notify_in().await
    }

    async fn notify_out(&mut self) -> Result<(), GatewayError> {
        let mut signals = Vec::new();

        for (channel, vector) in &mut self.scalar_vectors {
            let pairs = vector.take_changed();
            if pairs.is_empty() {
                continue;
            }
            let values = pairs
                .into_iter()
                .map(|(uid, value)| SignalUidValue { uid, value })
                .collect();
            signals.push(NotifySignalVector::scalar(channel, self.config.uid, values));
        }

        for (channel, vector) in &mut self.binary_vectors {
            if vector.changed_count() == 0 {
                continue;
            }
            let body = vector.to_msgpack();
            signals.push(NotifySignalVector::binary(channel, self.config.uid, body));
        }

        let notify = NotifyMessage {
            model_uid: vec![self.config.uid],
            model_time: self.model_time,
            schedule_time: self.schedule_time,
            notify_time: self.model_time,
            signals,
        };
        let encoded = notify
            .encode(self.limits.max_frame_bytes)
            .map_err(GatewayError::Wire)?;
        let transport = self
            .transport
            .as_mut()
            .ok_or(GatewayError::ModelNoConnection)?;
        transport
            .send_message(encoded, String::new())
            .await
            .map_err(GatewayError::Transport)?;
        Ok(())
    }

    /// Waits for the next notify addressed to this gateway's uid. Notify
    /// frames addressed to someone else are ignored outright: no local
    /// vector is touched. Channel messages seen while waiting (e.g. a
    /// late register ack) are routed as side effects rather than dropped.
    async fn notify_in(&mut self) -> Result<(), GatewayError> {
        loop {
            let transport = self
                .transport
                .as_mut()
                .ok_or(GatewayError::ModelNoConnection)?;
            let (frame, channel) = transport
                .wait_message(false)
                .await
                .map_err(GatewayError::Transport)?;

            if let Ok(notify) = NotifyMessage::decode(&frame, self.limits.max_frame_bytes) {
                if notify.addressed_to(self.config.uid) {
                    self.apply_notify(notify)?;
                    return Ok(());
                }
                continue;
            }

            if let Ok(msg) = ChannelMessage::decode(&frame, self.limits.max_frame_bytes) {
                if msg.model_uid == self.config.uid {
                    self.dispatch_side_effect_channel_message(&channel, msg);
                }
            }
        }
    }

    fn apply_notify(&mut self, notify: NotifyMessage) -> Result<(), GatewayError> {
        self.model_time = notify.model_time;
        self.schedule_time = notify.schedule_time;

        for entry in notify.signals {
            if entry.is_binary() {
                if let Some(vector) = self.binary_vectors.get_mut(&entry.name) {
                    vector.from_msgpack(&entry.data.unwrap_or_default())?;
                }
            } else if let Some(vector) = self.scalar_vectors.get_mut(&entry.name) {
                for pair in entry.signal {
                    vector.update_by_uid(pair.uid, pair.value)?;
                }
            }
        }
        Ok(())
    }

    /// Idempotent teardown: emits one `ModelExit` per configured channel,
    /// then disconnects the transport. A no-op if never connected or
    /// already disconnected.
    pub async fn disconnect(&mut self) -> Result<(), GatewayError> {
        if !self.connected {
            return Ok(());
        }

        let channels = self.channel_order.clone();
        if let Some(transport) = self.transport.as_mut() {
            for channel in channels {
                let msg = ChannelMessage::model_exit(self.config.uid);
                let encoded = msg
                    .encode(self.limits.max_frame_bytes)
                    .map_err(GatewayError::Wire)?;
                transport
                    .send_message(encoded, channel)
                    .await
                    .map_err(GatewayError::Transport)?;
            }
            transport.disconnect().await.map_err(GatewayError::Transport)?;
        }

        self.connected = false;
        Ok(())
    }
}
