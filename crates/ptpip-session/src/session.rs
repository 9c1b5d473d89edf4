use std::io::ErrorKind;
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use bytes::Bytes;
use ptpip_wire::{PacketReader, PacketWriter, DEFAULT_MAX_PACKET, PTPIP_PORT};
use tracing::{debug, info};

use crate::error::Result;
use crate::events::{self, EventSink, LogSink};
use crate::handshake::{self, Initiator, ResponderIdentity};
use crate::transaction::{self, OperationRequest};

/// Session behavior configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Responder TCP port. Default: 15740.
    pub port: u16,
    /// Timeout for establishing each TCP connection.
    pub connect_timeout: Option<Duration>,
    /// Read deadline on the command channel.
    pub read_timeout: Option<Duration>,
    /// Write deadline on the command channel.
    pub write_timeout: Option<Duration>,
    /// Maximum accepted packet body size in bytes. Default: 16 MiB.
    pub max_packet_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            port: PTPIP_PORT,
            connect_timeout: None,
            read_timeout: None,
            write_timeout: None,
            max_packet_size: DEFAULT_MAX_PACKET,
        }
    }
}

#[derive(Debug)]
struct CommandChannel {
    reader: PacketReader<TcpStream>,
    writer: PacketWriter<TcpStream>,
}

/// An established PTP/IP session: command channel, event channel, and the
/// background event receiver.
#[derive(Debug)]
pub struct Session {
    command: Mutex<CommandChannel>,
    command_stream: TcpStream,
    event_stream: TcpStream,
    responder: ResponderIdentity,
    shutdown: Arc<AtomicBool>,
    receiver: Option<JoinHandle<()>>,
}

/// Connect to a responder with default identity and configuration.
///
/// Events are reported through [`LogSink`].
pub fn connect(host: &str) -> Result<Session> {
    connect_with_config(
        host,
        &Initiator::default(),
        &SessionConfig::default(),
        Arc::new(LogSink),
    )
}

/// Connect with explicit identity, configuration, and event sink.
///
/// Opens the command channel, runs the init handshake, binds the event
/// channel to the acknowledged connection number, and spawns the receiver.
pub fn connect_with_config(
    host: &str,
    initiator: &Initiator,
    config: &SessionConfig,
    sink: Arc<dyn EventSink>,
) -> Result<Session> {
    let command_stream = open_stream(host, config)?;
    command_stream.set_read_timeout(config.read_timeout)?;
    command_stream.set_write_timeout(config.write_timeout)?;

    let mut reader =
        PacketReader::with_max_packet(command_stream.try_clone()?, config.max_packet_size);
    let mut writer = PacketWriter::new(command_stream.try_clone()?);

    let responder = handshake::init_command(&mut reader, &mut writer, initiator)?;
    info!(
        host,
        connection_number = format_args!("0x{:08x}", responder.connection_number),
        "command channel established"
    );

    // The event channel keeps blocking reads between events; a read
    // deadline there would tear down the receiver while the device idles.
    let event_stream = open_stream(host, config)?;
    event_stream.set_write_timeout(config.write_timeout)?;

    let mut event_reader =
        PacketReader::with_max_packet(event_stream.try_clone()?, config.max_packet_size);
    let mut event_writer = PacketWriter::new(event_stream.try_clone()?);

    handshake::init_event(&mut event_reader, &mut event_writer, responder.connection_number)?;
    info!(host, "event channel established");

    let shutdown = Arc::new(AtomicBool::new(false));
    let receiver = std::thread::Builder::new()
        .name("ptpip-event".to_string())
        .spawn({
            let shutdown = Arc::clone(&shutdown);
            move || events::run(event_reader, event_writer, sink, shutdown)
        })?;

    Ok(Session {
        command: Mutex::new(CommandChannel { reader, writer }),
        command_stream,
        event_stream,
        responder,
        shutdown,
        receiver: Some(receiver),
    })
}

fn open_stream(host: &str, config: &SessionConfig) -> Result<TcpStream> {
    let stream = match config.connect_timeout {
        None => TcpStream::connect((host, config.port))?,
        Some(timeout) => {
            let mut last_err = None;
            let mut stream = None;
            for addr in (host, config.port).to_socket_addrs()? {
                match TcpStream::connect_timeout(&addr, timeout) {
                    Ok(s) => {
                        stream = Some(s);
                        break;
                    }
                    Err(err) => last_err = Some(err),
                }
            }
            match stream {
                Some(stream) => stream,
                None => {
                    return Err(last_err
                        .unwrap_or_else(|| {
                            std::io::Error::new(
                                ErrorKind::AddrNotAvailable,
                                "host resolved to no addresses",
                            )
                        })
                        .into())
                }
            }
        }
    };
    debug!(peer = ?stream.peer_addr().ok(), "tcp connection opened");
    Ok(stream)
}

impl Session {
    /// The connection number the responder assigned to this session.
    pub fn connection_number(&self) -> u32 {
        self.responder.connection_number
    }

    /// Identity the responder reported in the init handshake.
    pub fn responder(&self) -> &ResponderIdentity {
        &self.responder
    }

    /// Issue one PTP operation on the command channel.
    ///
    /// Calls serialize on an internal lock, so `&self` is safe to share
    /// across threads; the command channel carries one transaction at a
    /// time either way.
    pub fn operation(
        &self,
        request: &OperationRequest,
        send_data: Option<&[u8]>,
    ) -> Result<Bytes> {
        let mut channel = self
            .command
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let CommandChannel { reader, writer } = &mut *channel;
        transaction::execute(reader, writer, request, send_data)
    }

    /// Tear the session down: close both sockets and stop the receiver.
    ///
    /// The receiver is almost always blocked in a socket read, so the
    /// shutdown flag is asserted first and then the event socket is shut
    /// down to fail that read; the receiver sees the flag and exits.
    pub fn disconnect(mut self) -> Result<()> {
        self.teardown()
    }

    fn teardown(&mut self) -> Result<()> {
        self.shutdown.store(true, Ordering::SeqCst);

        let command = self.command_stream.shutdown(Shutdown::Both);
        let event = self.event_stream.shutdown(Shutdown::Both);

        if let Some(receiver) = self.receiver.take() {
            let _ = receiver.join();
        }
        debug!("session closed");

        ignore_not_connected(command)?;
        ignore_not_connected(event)?;
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.receiver.is_some() {
            let _ = self.teardown();
        }
    }
}

/// A socket the peer already closed is torn down, not an error.
fn ignore_not_connected(result: std::io::Result<()>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotConnected => Ok(()),
        Err(err) => Err(err.into()),
    }
}
