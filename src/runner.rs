//! The foreground sync loop behind `bravo run`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::engine::Engine;
use crate::error::BravoError;
use crate::panel::{LedBank, Panel};

/// Ticks between aircraft identity checks.
pub const IDENTITY_POLL_TICKS: u64 = 10;

/// Totals for one run of the loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub activated: usize,
    pub deactivated: usize,
    pub profile_switches: usize,
    pub panel_reports: usize,
    pub panel_errors: usize,
}

/// Ticks an [`Engine`] and mirrors its indicators onto a panel.
pub struct SyncLoop<'a> {
    engine: &'a Engine,
    bank: LedBank,
    panel: Option<Panel>,
    interval: Duration,
    last_identity: Vec<String>,
}

impl<'a> SyncLoop<'a> {
    /// The engine's outputs should already be bound to `bank`.
    pub fn new(engine: &'a Engine, bank: LedBank, panel: Option<Panel>, interval: Duration) -> Self {
        Self {
            engine,
            bank,
            panel,
            interval,
            last_identity: Vec::new(),
        }
    }

    /// Re-select when the loaded aircraft changed since the last check.
    ///
    /// Returns the newly active profile and the identity that chose it.
    pub fn poll_aircraft(&mut self) -> Option<(String, String)> {
        let identity = self.engine.aircraft_identity();
        if identity.is_empty() {
            // Drop cached lookups so they are retried once the sim is up.
            if self.engine.active_profile().is_none() {
                self.engine.resolver().clear();
            }
            return None;
        }
        if identity == self.last_identity {
            return None;
        }

        let shown = identity.first().cloned().unwrap_or_default();
        self.last_identity = identity;
        match self.engine.select_for_loaded_aircraft() {
            Ok(name) => Some((name, shown)),
            Err(e @ BravoError::NoMatchingProfile { .. }) => {
                warn!(error = %e, "Keeping the current profile");
                None
            }
            Err(e) => {
                warn!(error = %e, "Profile selection failed");
                None
            }
        }
    }

    /// One tick plus a panel flush.
    pub fn step(&mut self, summary: &mut RunSummary) {
        let report = self.engine.tick();
        summary.ticks += 1;
        summary.activated += report.activated;
        summary.deactivated += report.deactivated;
        trace!(?report, "Tick");

        if let Some(panel) = self.panel.as_mut() {
            match panel.flush(&self.bank) {
                Ok(true) => summary.panel_reports += 1,
                Ok(false) => {}
                Err(e) => {
                    summary.panel_errors += 1;
                    warn!(error = %e, "Panel update failed");
                }
            }
        }
    }

    /// Run until `stop` is set, then switch everything off.
    ///
    /// `on_switch` is called with the profile name and aircraft identity
    /// whenever a different aircraft selects a profile.
    pub fn run(mut self, stop: &AtomicBool, mut on_switch: impl FnMut(&str, &str)) -> RunSummary {
        let mut summary = RunSummary::default();
        info!(interval_ms = self.interval.as_millis(), "Sync loop started");

        while !stop.load(Ordering::SeqCst) {
            let started = Instant::now();
            if summary.ticks % IDENTITY_POLL_TICKS == 0 {
                if let Some((name, identity)) = self.poll_aircraft() {
                    summary.profile_switches += 1;
                    on_switch(&name, &identity);
                }
            }
            self.step(&mut summary);

            if let Some(rest) = self.interval.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }

        self.finish();
        info!(ticks = summary.ticks, "Sync loop stopped");
        summary
    }

    fn finish(&mut self) {
        self.engine.shutdown();
        self.bank.clear();
        if let Some(panel) = self.panel.as_mut() {
            if panel.blank().is_ok() {
                debug!("Panel blanked");
            }
        }
    }
}
