//! OSC listener for landmark trackers and speech transcripts.
//!
//! Addresses:
//! - `/hand`   63 floats (21 x,y,z); no arguments means the hand was lost
//! - `/face`   flat float list (compact 6-point layout or full mesh)
//! - `/speech` one string

use crossbeam_channel::Sender;
use rosc::{OscMessage, OscPacket, OscType};
use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::landmarks::{FaceLandmarks, HandLandmarks};
use super::InputEvent;
use crate::error::{Error, Result};

/// Poll interval so shutdown is noticed while idle
const READ_TIMEOUT: Duration = Duration::from_millis(250);

/// Numeric OSC argument as f32
fn as_f32(arg: &OscType) -> Option<f32> {
    match *arg {
        OscType::Float(f) => Some(f),
        OscType::Double(d) => Some(d as f32),
        OscType::Int(i) => Some(i as f32),
        OscType::Long(l) => Some(l as f32),
        _ => None,
    }
}

/// Translate one OSC message into an input event
pub fn parse_message(msg: &OscMessage) -> Option<InputEvent> {
    match msg.addr.as_str() {
        "/hand" => {
            if msg.args.is_empty() {
                return Some(InputEvent::HandLost);
            }
            let values: Vec<f32> = msg.args.iter().filter_map(as_f32).collect();
            HandLandmarks::from_flat(&values).map(InputEvent::Hand)
        }
        "/face" => {
            let values: Vec<f32> = msg.args.iter().filter_map(as_f32).collect();
            FaceLandmarks::from_flat(&values).map(InputEvent::Face)
        }
        "/speech" => msg.args.iter().find_map(|arg| match arg {
            OscType::String(s) => Some(InputEvent::Utterance(s.clone())),
            _ => None,
        }),
        _ => None,
    }
}

/// Flatten bundles into events
fn collect_events(packet: OscPacket, out: &mut Vec<InputEvent>) {
    match packet {
        OscPacket::Message(msg) => match parse_message(&msg) {
            Some(event) => out.push(event),
            None => debug!("Ignoring OSC message {} ({} args)", msg.addr, msg.args.len()),
        },
        OscPacket::Bundle(bundle) => {
            for packet in bundle.content {
                collect_events(packet, out);
            }
        }
    }
}

/// Background UDP listener; rebinds after socket errors until stopped
pub struct OscListener {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl OscListener {
    pub fn spawn(port: u16, restart_delay: Duration, events: Sender<InputEvent>) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("osc-listener".to_string())
            .spawn(move || {
                // Consecutive bind failures; only the first is reported loudly
                let mut failures = 0u32;
                while flag.load(Ordering::Relaxed) {
                    match bind(port) {
                        Ok(socket) => {
                            if failures > 0 {
                                info!("OSC port {} bound after {} failed attempts", port, failures);
                            }
                            failures = 0;
                            match listen(&socket, &flag, &events) {
                                Ok(()) => break,
                                Err(e) => error!(
                                    "OSC listener failed: {}; restarting in {:?}",
                                    e, restart_delay
                                ),
                            }
                        }
                        Err(e) => {
                            failures = failures.saturating_add(1);
                            if failures == 1 {
                                error!(
                                    "OSC port {} unavailable: {}; retrying every {:?}",
                                    port, e, restart_delay
                                );
                            } else {
                                debug!("OSC port {} still unavailable: {}", port, e);
                            }
                        }
                    }
                    thread::sleep(restart_delay);
                }
                debug!("OSC listener stopped");
            })
            .map_err(|e| Error::Input(format!("Failed to spawn OSC thread: {}", e)))?;

        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for OscListener {
    fn drop(&mut self) {
        self.stop();
    }
}

fn bind(port: u16) -> Result<UdpSocket> {
    let addr = format!("0.0.0.0:{}", port);
    let socket = UdpSocket::bind(&addr)?;
    socket.set_read_timeout(Some(READ_TIMEOUT))?;
    info!("OSC listening on {}", addr);
    Ok(socket)
}

/// Receive until stopped (Ok) or the socket fails (Err)
fn listen(socket: &UdpSocket, running: &AtomicBool, events: &Sender<InputEvent>) -> Result<()> {
    let mut buf = [0u8; rosc::decoder::MTU * 4];
    let mut batch = Vec::new();

    while running.load(Ordering::Relaxed) {
        match socket.recv_from(&mut buf) {
            Ok((size, _)) => match rosc::decoder::decode_udp(&buf[..size]) {
                Ok((_, packet)) => {
                    collect_events(packet, &mut batch);
                    for event in batch.drain(..) {
                        if events.send(event).is_err() {
                            // Receiver gone: app is shutting down
                            return Ok(());
                        }
                    }
                }
                Err(e) => warn!("Failed to decode OSC packet: {}", e),
            },
            Err(ref e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosc::{encoder, OscBundle, OscTime};

    fn message(addr: &str, args: Vec<OscType>) -> OscMessage {
        OscMessage {
            addr: addr.to_string(),
            args,
        }
    }

    #[test]
    fn test_parse_hand() {
        let args = (0..63).map(|i| OscType::Float(i as f32 / 100.0)).collect();
        match parse_message(&message("/hand", args)) {
            Some(InputEvent::Hand(hand)) => assert_eq!(hand.points[1].x, 0.03),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(parse_message(&message("/hand", vec![])), Some(InputEvent::HandLost)));
        assert!(parse_message(&message("/hand", vec![OscType::Float(0.1)])).is_none());
    }

    #[test]
    fn test_parse_face_and_speech() {
        let face = (0..18).map(|_| OscType::Double(0.5)).collect();
        assert!(matches!(parse_message(&message("/face", face)), Some(InputEvent::Face(_))));

        let speech = message("/speech", vec![OscType::String("next shader".into())]);
        match parse_message(&speech) {
            Some(InputEvent::Utterance(text)) => assert_eq!(text, "next shader"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(parse_message(&message("/unknown", vec![])).is_none());
    }

    #[test]
    fn test_bundles_are_flattened() {
        let bundle = OscPacket::Bundle(OscBundle {
            timetag: OscTime { seconds: 0, fractional: 1 },
            content: vec![
                OscPacket::Message(message("/speech", vec![OscType::String("play".into())])),
                OscPacket::Message(message("/hand", vec![])),
            ],
        });
        let mut events = Vec::new();
        collect_events(bundle, &mut events);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_listener_receives_over_udp() {
        let (tx, rx) = crossbeam_channel::unbounded();
        // Bind an ephemeral port to find a free one
        let port = UdpSocket::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let mut listener = OscListener::spawn(port, Duration::from_millis(50), tx).unwrap();

        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        let packet = OscPacket::Message(message("/speech", vec![OscType::String("faster".into())]));
        let bytes = encoder::encode(&packet).unwrap();

        // The listener may not have bound yet; resend until something arrives
        let mut received = None;
        for _ in 0..40 {
            sender.send_to(&bytes, ("127.0.0.1", port)).unwrap();
            if let Ok(event) = rx.recv_timeout(Duration::from_millis(50)) {
                received = Some(event);
                break;
            }
        }
        listener.stop();
        assert!(matches!(received, Some(InputEvent::Utterance(ref s)) if s == "faster"));
    }

    #[test]
    fn test_listener_rebinds_when_port_frees_up() {
        let (tx, rx) = crossbeam_channel::unbounded();
        // Hold the port so the first bind fails
        let blocker = UdpSocket::bind("0.0.0.0:0").unwrap();
        let port = blocker.local_addr().unwrap().port();
        let mut listener = OscListener::spawn(port, Duration::from_millis(20), tx).unwrap();

        thread::sleep(Duration::from_millis(100));
        drop(blocker);

        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        let packet = OscPacket::Message(message("/speech", vec![OscType::String("slower".into())]));
        let bytes = encoder::encode(&packet).unwrap();

        let mut received = None;
        for _ in 0..60 {
            sender.send_to(&bytes, ("127.0.0.1", port)).unwrap();
            if let Ok(event) = rx.recv_timeout(Duration::from_millis(50)) {
                received = Some(event);
                break;
            }
        }
        listener.stop();
        assert!(matches!(received, Some(InputEvent::Utterance(ref s)) if s == "slower"));
    }
}
