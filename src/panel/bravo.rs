//! Honeycomb Bravo over HID.

use hidapi::{HidApi, HidDevice};
use tracing::{debug, info};

use super::PanelDevice;
use crate::error::{BravoError, Result};

pub const VENDOR_ID: u16 = 0x294b;
pub const PRODUCT_ID: u16 = 0x1901;

/// Feature report length: report id plus 64 bytes.
pub const REPORT_LEN: usize = 65;

/// Build the LED feature report for `leds`.
pub fn feature_report(leds: [u8; 4]) -> [u8; REPORT_LEN] {
    let mut report = [0u8; REPORT_LEN];
    report[1..5].copy_from_slice(&leds);
    report
}

/// A connected Bravo throttle quadrant.
pub struct BravoPanel {
    device: HidDevice,
    product: String,
}

impl BravoPanel {
    /// Open the first connected Bravo.
    pub fn open() -> Result<Self> {
        let api = HidApi::new().map_err(|e| BravoError::PanelCommunication(e.to_string()))?;
        let present = api
            .device_list()
            .any(|d| d.vendor_id() == VENDOR_ID && d.product_id() == PRODUCT_ID);
        if !present {
            return Err(BravoError::PanelNotFound);
        }

        let device = api
            .open(VENDOR_ID, PRODUCT_ID)
            .map_err(|e| BravoError::PanelCommunication(e.to_string()))?;
        device
            .set_blocking_mode(false)
            .map_err(|e| BravoError::PanelCommunication(e.to_string()))?;

        let product = device
            .get_product_string()
            .ok()
            .flatten()
            .unwrap_or_else(|| "Bravo Throttle Quadrant".to_string());
        info!(%product, "Panel connected");

        Ok(Self { device, product })
    }

    pub fn product(&self) -> &str {
        &self.product
    }
}

impl PanelDevice for BravoPanel {
    fn send_leds(&mut self, leds: [u8; 4]) -> Result<()> {
        debug!(?leds, "Sending LED report");
        self.device
            .send_feature_report(&feature_report(leds))
            .map_err(|e| BravoError::PanelCommunication(e.to_string()))
    }
}
