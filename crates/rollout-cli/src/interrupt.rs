//! Termination signals while playbook snapshots are held
//!
//! SIGINT and SIGTERM only raise a flag, so the process keeps running long
//! enough to stop its child and remove snapshot directories before exiting.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::flag;

use crate::error::Result;

/// Records the last termination signal received.
#[derive(Debug, Clone)]
pub struct Interrupt {
    caught: Arc<AtomicUsize>,
}

impl Interrupt {
    /// Replace the default action of SIGINT and SIGTERM with recording.
    pub fn install() -> Result<Self> {
        let caught = Arc::new(AtomicUsize::new(0));
        for signal in [SIGINT, SIGTERM] {
            flag::register_usize(signal, Arc::clone(&caught), signal as usize)?;
        }
        Ok(Self { caught })
    }

    /// Shell-style exit code (`128 + signal`) once a signal was received.
    pub fn exit_code(&self) -> Option<i32> {
        match self.caught.load(Ordering::SeqCst) {
            0 => None,
            signal => Some(128 + signal as i32),
        }
    }
}
