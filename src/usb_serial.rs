//! USB CDC-ACM line transport.
//!
//! The adapter core speaks whole lines; USB speaks packets. The receive
//! half reassembles packets into command lines and the transmit half
//! drains queued reply lines, with a pair of global channels in between
//! so the adapter loop never blocks on the bus.

use defmt::warn;
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_usb::class::cdc_acm::{CdcAcmClass, Receiver, Sender, State};
use embassy_usb::Builder;
use flappy_core::{LineAssembler, LinkError, SerialLink, MAX_LINE_LENGTH};
use heapless::Vec;
use portable_atomic::{AtomicBool, Ordering};

/// One command or reply line, terminator included on replies.
pub type LineBuf = Vec<u8, MAX_LINE_LENGTH>;

/// Host-to-adapter command lines.
pub static COMMANDS: Channel<CriticalSectionRawMutex, LineBuf, 4> = Channel::new();

/// Adapter-to-host reply lines.
pub static REPLIES: Channel<CriticalSectionRawMutex, LineBuf, 8> = Channel::new();

/// Set while a host holds the CDC connection open.
pub static CONNECTED: AtomicBool = AtomicBool::new(false);

/// Configure the CDC-ACM class in the USB builder.
///
/// Returns the split transmit/receive halves for the serve loops.
pub fn configure_usb_serial<'d>(
    builder: &mut Builder<'d, Driver<'d, USB>>,
    state: &'d mut State<'d>,
) -> (Sender<'d, Driver<'d, USB>>, Receiver<'d, Driver<'d, USB>>) {
    CdcAcmClass::new(builder, state, 64).split()
}

/// Receive loop: reassemble packets into command lines.
///
/// `\n` and `\r` terminate a line. A packet boundary also completes a
/// pending line, so bare single-keystroke commands work without a
/// terminator. Oversized lines are dropped whole, terminator included,
/// even when they span packets.
pub async fn serve_receiver(mut rx: Receiver<'static, Driver<'static, USB>>) -> ! {
    let mut packet = [0u8; 64];
    let mut lines = LineAssembler::new();
    loop {
        rx.wait_connection().await;
        CONNECTED.store(true, Ordering::Release);
        loop {
            let n = match rx.read_packet(&mut packet).await {
                Ok(n) => n,
                Err(_) => break,
            };
            for &byte in &packet[..n] {
                if let Some(line) = lines.push(byte) {
                    forward(line);
                }
            }
            if let Some(line) = lines.finish_chunk() {
                forward(line);
            }
        }
        CONNECTED.store(false, Ordering::Release);
        lines.reset();
    }
}

fn forward(line: LineBuf) {
    if COMMANDS.try_send(line).is_err() {
        warn!("command queue full, dropping line");
    }
}

/// Transmit loop: drain queued reply lines to the host.
pub async fn serve_sender(mut tx: Sender<'static, Driver<'static, USB>>) -> ! {
    loop {
        tx.wait_connection().await;
        loop {
            let line = REPLIES.receive().await;
            if tx.write_packet(&line).await.is_err() {
                break;
            }
        }
    }
}

/// The adapter-side view of the transport.
///
/// Non-blocking on both directions: a reply line too long for the
/// buffers is [`LinkError::Overflow`], and a reply queue the transmit
/// loop is not draining is [`LinkError::Io`]; neither stalls the
/// main-loop pass.
pub struct UsbSerialLink;

impl SerialLink for UsbSerialLink {
    fn is_ready(&self) -> bool {
        CONNECTED.load(Ordering::Acquire)
    }

    fn poll_line(&mut self) -> Option<LineBuf> {
        COMMANDS.try_receive().ok()
    }

    fn write_line(&mut self, line: &[u8]) -> Result<(), LinkError> {
        let buf = LineBuf::from_slice(line).map_err(|_| LinkError::Overflow)?;
        REPLIES.try_send(buf).map_err(|_| LinkError::Io)
    }

    fn flush(&mut self) -> Result<(), LinkError> {
        // The transmit loop drains the queue as soon as it runs.
        Ok(())
    }
}
