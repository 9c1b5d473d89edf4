use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ptpip_wire::{Packet, PacketReader, PacketWriter};
use tracing::{debug, info, trace};

use crate::error::SessionError;

/// An asynchronous event reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceEvent {
    pub event_code: u16,
    pub transaction_id: u32,
    pub params: [u32; 3],
}

/// Consumer of device events delivered by the background receiver.
pub trait EventSink: Send + Sync {
    /// Called for every Event packet on the event channel.
    fn on_event(&self, event: DeviceEvent);

    /// Called when the receiver stops on an error outside of shutdown.
    fn on_error(&self, _error: SessionError) {}
}

/// Sink that reports events through `tracing`.
pub struct LogSink;

impl EventSink for LogSink {
    fn on_event(&self, event: DeviceEvent) {
        info!(
            event_code = format_args!("0x{:04x}", event.event_code),
            transaction_id = event.transaction_id,
            "device event"
        );
    }

    fn on_error(&self, error: SessionError) {
        tracing::warn!(%error, "event receiver stopped");
    }
}

/// Channel-style consumption: send each event into an mpsc queue.
impl EventSink for std::sync::mpsc::Sender<DeviceEvent> {
    fn on_event(&self, event: DeviceEvent) {
        let _ = self.send(event);
    }
}

/// The event-channel receive loop.
///
/// Blocks in packet reads almost all of the time, so the shutdown flag
/// alone cannot stop it; the session unblocks it by shutting down the
/// event socket, which fails the read. A read failure with the flag set
/// is a clean exit.
pub(crate) fn run<R: Read, W: Write>(
    mut reader: PacketReader<R>,
    mut writer: PacketWriter<W>,
    sink: Arc<dyn EventSink>,
    shutdown: Arc<AtomicBool>,
) {
    loop {
        let packet = match reader.read_packet() {
            Ok(packet) => packet,
            Err(err) => {
                if shutdown.load(Ordering::SeqCst) {
                    debug!("event receiver stopping");
                } else {
                    sink.on_error(err.into());
                }
                return;
            }
        };

        match packet {
            Packet::Event {
                event_code,
                transaction_id,
                params,
            } => {
                trace!(
                    event_code = format_args!("0x{event_code:04x}"),
                    "event received"
                );
                sink.on_event(DeviceEvent {
                    event_code,
                    transaction_id,
                    params,
                });
            }
            Packet::ProbeRequest => {
                trace!("probe request, answering");
                if let Err(err) = writer.send(&Packet::ProbeResponse) {
                    if !shutdown.load(Ordering::SeqCst) {
                        sink.on_error(err.into());
                    }
                    return;
                }
            }
            other => {
                debug!(packet = %other.packet_type(), "ignoring packet on event channel");
            }
        }

        if shutdown.load(Ordering::SeqCst) {
            debug!("event receiver stopping");
            return;
        }
    }
}
