//! Typed commands on stdin, treated like spoken utterances.

use crossbeam_channel::Sender;
use std::io::BufRead;
use std::thread;
use tracing::{debug, warn};

use super::InputEvent;
use crate::error::{Error, Result};

/// Read stdin lines on a detached thread until EOF or the app exits
pub fn spawn(events: Sender<InputEvent>) -> Result<()> {
    thread::Builder::new()
        .name("console-input".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("Console input error: {}", e);
                        break;
                    }
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if events.send(InputEvent::Utterance(line.to_string())).is_err() {
                    break;
                }
            }
            debug!("Console input closed");
        })
        .map_err(|e| Error::Input(format!("Failed to spawn console thread: {}", e)))?;
    Ok(())
}
