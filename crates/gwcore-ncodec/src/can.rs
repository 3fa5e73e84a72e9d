use serde::{Deserialize, Serialize};

use crate::mimetype::MimeSpec;
use crate::trace::{IdFilter, TraceDirection, TraceHook};
use crate::NCodecError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CanFrameType {
    Can,
    CanFd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanSender {
    pub bus_id: u8,
    pub node_id: u8,
    pub interface_id: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanMessage {
    pub frame_id: u32,
    pub frame_type: CanFrameType,
    pub sender: CanSender,
    pub payload: Vec<u8>,
}

const CAN_STREAM_IDENTIFIER: [u8; 4] = *b"CANS";

/// Binds a MIME-configured CAN codec to the backing byte slot of a binary
/// signal. The codec borrows the slot for as long as it lives; the signal
/// vector remains the owner.
pub struct CanCodec<'a> {
    mime: MimeSpec,
    stream: &'a mut Vec<u8>,
    accumulator: Vec<CanMessage>,
    trace: Option<TraceHook<CanMessage>>,
    trace_filter: Option<IdFilter>,
    max_stream_bytes: usize,
}

impl<'a> CanCodec<'a> {
    pub fn configure(
        mime_type: &str,
        stream: &'a mut Vec<u8>,
        max_stream_bytes: usize,
    ) -> Result<Self, NCodecError> {
        let mime = MimeSpec::parse(mime_type)?;
        let trace_filter = IdFilter::from_can_env(
            mime.stat("bus").unwrap_or("can"),
            mime.stat_u32("bus_id").unwrap_or(0),
        );
        Ok(Self {
            mime,
            stream,
            accumulator: Vec::new(),
            trace: None,
            trace_filter,
            max_stream_bytes,
        })
    }

    /// Installs a per-direction hook. Once an `NCODEC_TRACE_CAN_<bus>_<bus_id>`
    /// filter is present (read at `configure` time), the hook only fires for
    /// frames whose `frame_id` the filter matches; with no env filter it
    /// fires for every message, as if traced unconditionally.
    pub fn trace(&mut self, hook: TraceHook<CanMessage>) {
        self.trace = Some(hook);
    }

    fn should_trace(&self, frame_id: u32) -> bool {
        self.trace_filter
            .as_ref()
            .map_or(true, |filter| filter.matches(frame_id))
    }

    pub fn stat(&self, key: &str) -> Option<&str> {
        self.mime.stat(key)
    }

    /// Decodes the current stream slot, filtering out any frame whose
    /// `frame_id` equals this codec's configured `node_id` (loop-back).
    pub fn read(&mut self) -> Result<Vec<CanMessage>, NCodecError> {
        if self.stream.is_empty() {
            return Ok(Vec::new());
        }

        let body = gwcore_net::unpack_identified_frame(
            self.stream,
            CAN_STREAM_IDENTIFIER,
            self.max_stream_bytes,
        )?;
        let frames: Vec<CanMessage> = rmp_serde::from_slice(body).map_err(NCodecError::Decode)?;

        let node_id = self.mime.stat_u32("node_id");
        let mut out = Vec::with_capacity(frames.len());
        for frame in frames {
            if let Some(node_id) = node_id {
                if frame.frame_id == node_id {
                    continue;
                }
            }
            if self.should_trace(frame.frame_id) {
                if let Some(hook) = &mut self.trace {
                    hook(TraceDirection::Read, &frame);
                }
            }
            out.push(frame);
        }
        Ok(out)
    }

    /// Appends frames to the in-memory accumulator; does not touch the
    /// stream slot until `flush`.
    pub fn write(&mut self, msgs: &[CanMessage]) -> Result<(), NCodecError> {
        if msgs.is_empty() {
            return Err(NCodecError::NoCanMessageProvided);
        }
        for msg in msgs {
            if self.should_trace(msg.frame_id) {
                if let Some(hook) = &mut self.trace {
                    hook(TraceDirection::Write, msg);
                }
            }
            self.accumulator.push(msg.clone());
        }
        Ok(())
    }

    /// Finalises the accumulator into the stream slot. A no-op if nothing
    /// was written since the last flush or truncate.
    pub fn flush(&mut self) -> Result<(), NCodecError> {
        if self.accumulator.is_empty() {
            return Ok(());
        }

        let body = rmp_serde::to_vec(&self.accumulator).map_err(NCodecError::Encode)?;
        let framed =
            gwcore_net::pack_identified_frame(CAN_STREAM_IDENTIFIER, &body, self.max_stream_bytes)?;
        *self.stream = framed;
        self.accumulator.clear();
        Ok(())
    }

    pub fn truncate(&mut self) {
        self.accumulator.clear();
        self.stream.clear();
    }
}
