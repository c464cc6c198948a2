//! Panel hardware output.
//!
//! Indicator callbacks flip bits in a [`LedBank`]; a [`Panel`] pushes the
//! bank to the device, but only when the bits changed since the last
//! successful send.

pub mod bravo;
pub mod leds;
pub mod mock;

pub use bravo::BravoPanel;
pub use leds::LedBank;
pub use mock::MockPanel;

use tracing::warn;

use crate::error::Result;

/// Something that can display an LED state.
pub trait PanelDevice: Send {
    fn send_leds(&mut self, leds: [u8; 4]) -> Result<()>;
}

/// Change-tracking wrapper around a [`PanelDevice`].
pub struct Panel {
    device: Box<dyn PanelDevice>,
    last_sent: Option<[u8; 4]>,
}

impl Panel {
    pub fn new(device: impl PanelDevice + 'static) -> Self {
        Self {
            device: Box::new(device),
            last_sent: None,
        }
    }

    /// LED bytes the panel was last sent successfully.
    pub const fn last_sent(&self) -> Option<[u8; 4]> {
        self.last_sent
    }

    /// Send the bank if it differs from what the panel shows.
    ///
    /// Returns whether a report was sent. A failed send is retried on the
    /// next call.
    pub fn flush(&mut self, bank: &LedBank) -> Result<bool> {
        let bytes = bank.bytes();
        if self.last_sent == Some(bytes) {
            return Ok(false);
        }
        self.device.send_leds(bytes)?;
        self.last_sent = Some(bytes);
        Ok(true)
    }

    /// Turn every LED off.
    pub fn blank(&mut self) -> Result<()> {
        self.device.send_leds([0; 4]).inspect_err(|e| {
            warn!(error = %e, "Failed to blank panel");
        })?;
        self.last_sent = Some([0; 4]);
        Ok(())
    }
}
