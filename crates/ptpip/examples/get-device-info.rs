//! Fetch DeviceInfo from a PTP/IP responder and dump the raw dataset.
//!
//! Run with:
//!   cargo run --example get-device-info -- 192.168.0.10

use ptpip::session::{connect, DataPhase, OperationRequest};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();

    let host = std::env::args()
        .nth(1)
        .ok_or("usage: get-device-info <host>")?;

    let session = connect(&host)?;
    eprintln!(
        "Connected: {} (connection number 0x{:08x})",
        session.responder().friendly_name,
        session.connection_number()
    );

    let data = session.operation(
        &OperationRequest {
            data_phase: DataPhase::NoDataOrIn,
            operation_code: 0x1001, // GetDeviceInfo
            transaction_id: 1,
            params: [0; 4],
        },
        None,
    )?;

    eprintln!("DeviceInfo dataset: {} bytes", data.len());
    for chunk in data.chunks(16) {
        for byte in chunk {
            print!("{byte:02x} ");
        }
        println!();
    }

    session.disconnect()?;
    Ok(())
}
