use serde::{Deserialize, Serialize};

use crate::mimetype::MimeSpec;
use crate::trace::{IdFilter, TraceDirection, TraceHook};
use crate::NCodecError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CanMessageFormat {
    Base,
    Fd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CanFrameType {
    Data,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanMessageMetadata {
    pub format: CanMessageFormat,
    pub frame_type: CanFrameType,
    pub interface_id: u32,
    pub network_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IpAddr {
    V4 { src_ip: u32, dst_ip: u32 },
    V6 { src_ip: [u16; 8], dst_ip: [u16; 8] },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoIpAdapter {
    pub protocol_version: u8,
    pub payload_type: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SomeIpAdapter {
    pub message_id: u32,
    pub length: u32,
    pub request_id: u32,
    pub protocol_version: u8,
    pub interface_version: u8,
    pub message_type: u8,
    pub return_code: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocketAdapter {
    None,
    DoIp(DoIpAdapter),
    SomeIp(SomeIpAdapter),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpMessageMetadata {
    pub eth_dst_mac: u64,
    pub eth_src_mac: u64,
    pub eth_ethertype: u16,
    pub eth_tci_pcp: u8,
    pub eth_tci_dei: u8,
    pub eth_tci_vid: u16,
    pub ip_addr: IpAddr,
    pub src_port: u16,
    pub dst_port: u16,
    pub socket_adapter: SocketAdapter,
}

impl IpMessageMetadata {
    /// A minimal IPv6 endpoint descriptor, useful when only addresses and
    /// ports matter to the caller (the ethernet/socket-adapter fields are
    /// zeroed / `SocketAdapter::None`).
    #[must_use]
    pub fn v6(src_ip: [u16; 8], dst_ip: [u16; 8], src_port: u16, dst_port: u16) -> Self {
        Self {
            eth_dst_mac: 0,
            eth_src_mac: 0,
            eth_ethertype: 0,
            eth_tci_pcp: 0,
            eth_tci_dei: 0,
            eth_tci_vid: 0,
            ip_addr: IpAddr::V6 { src_ip, dst_ip },
            src_port,
            dst_port,
            socket_adapter: SocketAdapter::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PduTransport {
    None,
    Can(CanMessageMetadata),
    Ip(IpMessageMetadata),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PduMessage {
    pub id: u32,
    pub payload: Vec<u8>,
    pub swc_id: u32,
    pub ecu_id: u32,
    pub transport: PduTransport,
}

const PDU_STREAM_IDENTIFIER: [u8; 4] = *b"PDUS";

pub struct PduCodec<'a> {
    mime: MimeSpec,
    stream: &'a mut Vec<u8>,
    accumulator: Vec<PduMessage>,
    trace: Option<TraceHook<PduMessage>>,
    trace_filter: Option<IdFilter>,
    max_stream_bytes: usize,
}

impl<'a> PduCodec<'a> {
    pub fn configure(
        mime_type: &str,
        stream: &'a mut Vec<u8>,
        max_stream_bytes: usize,
    ) -> Result<Self, NCodecError> {
        let mime = MimeSpec::parse(mime_type)?;
        let trace_filter = IdFilter::from_pdu_env(mime.stat_u32("swc_id").unwrap_or(0));
        Ok(Self {
            mime,
            stream,
            accumulator: Vec::new(),
            trace: None,
            trace_filter,
            max_stream_bytes,
        })
    }

    /// Installs a per-direction hook. Once an `NCODEC_TRACE_PDU_<swc_id>`
    /// filter is present (read at `configure` time), the hook only fires for
    /// pdus whose `id` the filter matches; with no env filter it fires for
    /// every message, as if traced unconditionally.
    pub fn trace(&mut self, hook: TraceHook<PduMessage>) {
        self.trace = Some(hook);
    }

    fn should_trace(&self, id: u32) -> bool {
        self.trace_filter
            .as_ref()
            .map_or(true, |filter| filter.matches(id))
    }

    pub fn stat(&self, key: &str) -> Option<&str> {
        self.mime.stat(key)
    }

    /// Decodes the current stream slot, filtering out any pdu whose `swc_id`
    /// equals this codec's configured `swc_id` (loop-back).
    pub fn read(&mut self) -> Result<Vec<PduMessage>, NCodecError> {
        if self.stream.is_empty() {
            return Ok(Vec::new());
        }

        let body = gwcore_net::unpack_identified_frame(
            self.stream,
            PDU_STREAM_IDENTIFIER,
            self.max_stream_bytes,
        )?;
        let pdus: Vec<PduMessage> = rmp_serde::from_slice(body).map_err(NCodecError::Decode)?;

        let own_swc_id = self.mime.stat_u32("swc_id");
        let mut out = Vec::with_capacity(pdus.len());
        for pdu in pdus {
            if let Some(own_swc_id) = own_swc_id {
                if pdu.swc_id == own_swc_id {
                    continue;
                }
            }
            if self.should_trace(pdu.id) {
                if let Some(hook) = &mut self.trace {
                    hook(TraceDirection::Read, &pdu);
                }
            }
            out.push(pdu);
        }
        Ok(out)
    }

    /// Appends pdus to the in-memory accumulator. A zero `swc_id`/`ecu_id`
    /// on the message falls back to the codec's configured MIME stat, as
    /// the upstream implementation does.
    pub fn write(&mut self, msgs: &[PduMessage]) -> Result<(), NCodecError> {
        if msgs.is_empty() {
            return Err(NCodecError::NoPduMessageProvided);
        }

        for msg in msgs {
            let mut msg = msg.clone();
            if msg.swc_id == 0 {
                if let Some(swc_id) = self.mime.stat_u32("swc_id") {
                    msg.swc_id = swc_id;
                }
            }
            if msg.ecu_id == 0 {
                if let Some(ecu_id) = self.mime.stat_u32("ecu_id") {
                    msg.ecu_id = ecu_id;
                }
            }

            if self.should_trace(msg.id) {
                if let Some(hook) = &mut self.trace {
                    hook(TraceDirection::Write, &msg);
                }
            }
            self.accumulator.push(msg);
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), NCodecError> {
        if self.accumulator.is_empty() {
            return Ok(());
        }

        let body = rmp_serde::to_vec(&self.accumulator).map_err(NCodecError::Encode)?;
        let framed =
            gwcore_net::pack_identified_frame(PDU_STREAM_IDENTIFIER, &body, self.max_stream_bytes)?;
        *self.stream = framed;
        self.accumulator.clear();
        Ok(())
    }

    pub fn truncate(&mut self) {
        self.accumulator.clear();
        self.stream.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{IpMessageMetadata, PduCodec, PduMessage, PduTransport};

    fn ip_pdu() -> PduMessage {
        PduMessage {
            id: 123,
            payload: b"Hello World".to_vec(),
            swc_id: 42,
            ecu_id: 99,
            transport: PduTransport::Ip(IpMessageMetadata::v6(
                [0, 1, 2, 3, 4, 5, 6, 7],
                [7, 6, 5, 4, 3, 2, 1, 0],
                3003,
                4004,
            )),
        }
    }

    #[test]
    fn write_flush_read_round_trips_every_field() {
        let mut stream = Vec::new();
        let mut codec =
            PduCodec::configure("interface=stream;type=pdu;schema=fbs", &mut stream, 4096)
                .expect("configure should succeed");

        let pdu = ip_pdu();
        codec.write(&[pdu.clone()]).expect("write should succeed");
        codec.flush().expect("flush should succeed");

        let read_back = codec.read().expect("read should succeed");
        assert_eq!(read_back, vec![pdu]);
    }

    #[test]
    fn truncate_zeroes_the_stream() {
        let mut stream = Vec::new();
        let mut codec =
            PduCodec::configure("interface=stream;type=pdu;schema=fbs", &mut stream, 4096)
                .expect("configure should succeed");
        codec.write(&[ip_pdu()]).expect("write should succeed");
        codec.flush().expect("flush should succeed");
        codec.truncate();
        assert!(codec.stream.is_empty());
    }

    #[test]
    fn read_filters_own_swc_id() {
        let mut stream = Vec::new();
        let mut codec = PduCodec::configure(
            "interface=stream;type=pdu;schema=fbs;swc_id=42",
            &mut stream,
            4096,
        )
        .expect("configure should succeed");

        let mut other = ip_pdu();
        other.swc_id = 7;
        codec
            .write(&[ip_pdu(), other])
            .expect("write should succeed");
        codec.flush().expect("flush should succeed");

        let read_back = codec.read().expect("read should succeed");
        assert_eq!(read_back.len(), 1);
        assert_eq!(read_back[0].swc_id, 7);
    }

    #[test]
    fn write_falls_back_to_mime_swc_id_when_message_swc_id_is_zero() {
        let mut stream = Vec::new();
        let mut codec = PduCodec::configure(
            "interface=stream;type=pdu;schema=fbs;swc_id=55;ecu_id=9",
            &mut stream,
            4096,
        )
        .expect("configure should succeed");

        let mut pdu = ip_pdu();
        pdu.swc_id = 0;
        pdu.ecu_id = 0;
        codec.write(&[pdu]).expect("write should succeed");
        codec.flush().expect("flush should succeed");

        // configured swc_id==55 means this pdu (now swc_id 55) gets filtered
        // out by the loop-back check on read.
        assert!(codec.read().expect("read should succeed").is_empty());
    }

    #[test]
    fn trace_hook_is_gated_by_the_env_id_filter() {
        std::env::set_var("NCODEC_TRACE_PDU_909090", "123");

        let mut stream = Vec::new();
        let mut codec = PduCodec::configure(
            "interface=stream;type=pdu;schema=fbs;swc_id=909090",
            &mut stream,
            4096,
        )
        .expect("configure should succeed");

        let traced = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let traced_clone = traced.clone();
        codec.trace(Box::new(move |_direction, msg| {
            traced_clone.lock().unwrap().push(msg.id);
        }));

        let mut other = ip_pdu();
        other.id = 999;
        codec.write(&[ip_pdu(), other]).expect("write should succeed");
        codec.flush().expect("flush should succeed");
        codec.read().expect("read should succeed");

        std::env::remove_var("NCODEC_TRACE_PDU_909090");

        assert_eq!(*traced.lock().unwrap(), vec![123, 123], "only pdu id 123 matches the filter");
    }
}
