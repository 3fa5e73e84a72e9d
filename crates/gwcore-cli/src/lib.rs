use std::fs;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use gwcore::prelude::{
    Gateway, GatewayConfig, GatewayError, ListBroker, ListBrokerTransport, StubTransport,
    Transport, TransportError,
};
use gwcore_ncodec::{MimeSpec, NCodecError};
use gwcore_wire::{ChannelMessage, NotifyMessage, WireError};
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(
    name = "gwcore",
    version,
    about = "Command-line diagnostics and utilities for the gateway core"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect and validate ncodec MIME configuration strings.
    Mime(MimeArgs),
    /// Decode a length-prefixed, identifier-tagged wire frame from a file.
    Frame(FrameArgs),
    /// Run the register/index/read handshake against an in-memory stub
    /// broker and print the resulting message trace.
    Handshake(HandshakeArgs),
    /// Connect to an in-memory reference broker and report its version and
    /// effective timeout configuration.
    Health(HealthArgs),
}

#[derive(Debug, Args)]
pub struct MimeArgs {
    #[command(subcommand)]
    pub action: MimeAction,
}

#[derive(Debug, Subcommand)]
pub enum MimeAction {
    /// Parse a MIME configuration string and report whether it is valid.
    Validate(MimeValidateArgs),
}

#[derive(Debug, Args)]
pub struct MimeValidateArgs {
    /// e.g. `interface=stream;type=can;schema=fbs;bus=canfd;bus_id=1`
    pub mimetype: String,
}

#[derive(Debug, Args)]
pub struct FrameArgs {
    #[command(subcommand)]
    pub action: FrameAction,
}

#[derive(Debug, Subcommand)]
pub enum FrameAction {
    /// Decode a frame, trying the channel-message shape and then the
    /// notify-message shape.
    Decode(FrameDecodeArgs),
}

#[derive(Debug, Args)]
pub struct FrameDecodeArgs {
    pub path: PathBuf,
    #[arg(long, default_value_t = gwcore_limits::Limits::DEFAULT_MAX_FRAME_BYTES)]
    pub max_frame_bytes: usize,
}

#[derive(Debug, Args)]
pub struct HandshakeArgs {
    #[command(subcommand)]
    pub action: HandshakeAction,
}

#[derive(Debug, Subcommand)]
pub enum HandshakeAction {
    /// Run the handshake against a stub broker primed with canned replies,
    /// without ever touching a real SimBus process.
    DryRun(HandshakeDryRunArgs),
}

#[derive(Debug, Args)]
pub struct HandshakeDryRunArgs {
    #[arg(long, default_value = "gwcore-cli-dry-run")]
    pub name: String,
    #[arg(long, default_value_t = 1)]
    pub uid: u32,
    #[arg(long, default_value = "scalar")]
    pub channel: String,
    #[arg(long, value_delimiter = ',', default_value = "a,b")]
    pub signals: Vec<String>,
}

#[derive(Debug, Args)]
pub struct HealthArgs {
    #[arg(long, default_value_t = 1)]
    pub uid: u32,
}

pub fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Mime(args) => run_mime(args),
        Command::Frame(args) => run_frame(args),
        Command::Handshake(args) => run_handshake(args),
        Command::Health(args) => run_health(args),
    }
}

fn run_mime(args: MimeArgs) -> Result<(), CliError> {
    match args.action {
        MimeAction::Validate(validate) => {
            let spec = MimeSpec::parse(&validate.mimetype)?;
            println!("valid: bus={:?} schema well-formed", spec.bus_kind());
            Ok(())
        }
    }
}

fn run_frame(args: FrameArgs) -> Result<(), CliError> {
    match args.action {
        FrameAction::Decode(decode) => {
            let bytes = fs::read(&decode.path).map_err(|source| CliError::InputRead {
                path: decode.path.display().to_string(),
                source,
            })?;

            match ChannelMessage::decode(&bytes, decode.max_frame_bytes) {
                Ok(msg) => {
                    println!("channel message: {msg:?}");
                    return Ok(());
                }
                Err(channel_err) => {
                    match NotifyMessage::decode(&bytes, decode.max_frame_bytes) {
                        Ok(msg) => {
                            println!("notify message: {msg:?}");
                            Ok(())
                        }
                        Err(notify_err) => Err(CliError::FrameDecode {
                            channel_reason: channel_err,
                            notify_reason: notify_err,
                        }),
                    }
                }
            }
        }
    }
}

fn run_handshake(args: HandshakeArgs) -> Result<(), CliError> {
    match args.action {
        HandshakeAction::DryRun(dry_run) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .expect("building a current-thread runtime cannot fail");
            runtime.block_on(dry_run_handshake(dry_run))
        }
    }
}

fn run_health(args: HealthArgs) -> Result<(), CliError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("building a current-thread runtime cannot fail");
    runtime.block_on(check_health(args))
}

async fn check_health(args: HealthArgs) -> Result<(), CliError> {
    let broker = ListBroker::new();
    let mut transport = ListBrokerTransport::new(broker, args.uid)?;
    transport.connect(Vec::new()).await?;
    println!("broker: {}", transport.broker_info());
    println!("recv_timeout: {:?}", transport.config().recv_timeout);
    println!("immediate_timeout: {:?}", transport.config().immediate_timeout);
    println!("connect_timeout: {:?}", transport.config().connect_timeout);
    Ok(())
}

async fn dry_run_handshake(args: HandshakeDryRunArgs) -> Result<(), CliError> {
    let mut gateway = Gateway::new(GatewayConfig::new(args.name, args.uid));
    gateway.add_scalar_vector(&args.channel, &args.signals)?;

    let mut stub = StubTransport::new();
    let token = stub.token();
    stub.push_message(
        "",
        &ChannelMessage::model_register_ack(args.uid, token).encode(65536)?,
    );
    let indexes = args
        .signals
        .iter()
        .enumerate()
        .map(|(position, name)| gwcore_wire::SignalIndexEntry {
            name: name.clone(),
            signal_uid: (position + 1) as u32,
        })
        .collect();
    stub.push_message(
        &args.channel,
        &ChannelMessage::signal_index_reply(args.uid, indexes).encode(65536)?,
    );
    stub.push_message(
        &args.channel,
        &ChannelMessage::signal_value_reply(args.uid, Vec::new()).encode(65536)?,
    );

    gateway.set_transport(stub);
    gateway.connect().await?;

    println!("handshake ok: connected={}", gateway.is_connected());
    if let Some(stub) = gateway
        .transport_as_any_mut()
        .and_then(|any| any.downcast_mut::<StubTransport>())
    {
        for (index, entry) in stub.trace().iter().enumerate() {
            println!("{index}: {entry:?}");
        }
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Mime(#[from] NCodecError),

    #[error("failed to read input file `{path}`: {source}")]
    InputRead {
        path: String,
        source: std::io::Error,
    },

    #[error("frame did not decode as a channel message ({channel_reason}) or a notify message ({notify_reason})")]
    FrameDecode {
        channel_reason: WireError,
        notify_reason: WireError,
    },

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl CliError {
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        1
    }
}
