//! Recording panel for tests.

use std::sync::{Arc, Mutex};

use super::PanelDevice;
use crate::error::{BravoError, Result};

/// Panel double that keeps every LED report it was sent.
///
/// Clones share the same report log, so a test can keep one handle while
/// the other is moved into a [`Panel`](super::Panel).
#[derive(Debug, Clone, Default)]
pub struct MockPanel {
    reports: Arc<Mutex<Vec<[u8; 4]>>>,
    fail: Arc<Mutex<bool>>,
}

impl MockPanel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn reports(&self) -> Vec<[u8; 4]> {
        self.reports.lock().unwrap().clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<[u8; 4]> {
        self.reports.lock().unwrap().last().copied()
    }

    /// Make every send fail, as if the cable was pulled.
    pub fn set_failing(&self, failing: bool) {
        *self.fail.lock().unwrap() = failing;
    }
}

impl PanelDevice for MockPanel {
    fn send_leds(&mut self, leds: [u8; 4]) -> Result<()> {
        if *self.fail.lock().unwrap() {
            return Err(BravoError::PanelCommunication(
                "mock panel disconnected".to_string(),
            ));
        }
        self.reports.lock().unwrap().push(leds);
        Ok(())
    }
}
