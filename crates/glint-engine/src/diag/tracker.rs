use crate::device::{Device, DeviceError};

use super::{Diagnostic, Diagnostics};

/// One-shot latch over a device's error flag.
///
/// Polls once per [`check`](Self::check). The first pending error is
/// reported and latches the tracker; while latched, further errors are
/// consumed silently so a persistent fault does not flood the console.
/// Only [`reset`](Self::reset) re-arms reporting.
#[derive(Debug, Default, Clone)]
pub struct ErrorTracker {
    in_error: bool,
    last: Option<DeviceError>,
}

impl ErrorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Polls `device` once and returns the error it reported, if any.
    ///
    /// The returned value is the polled code whether or not it was logged.
    pub fn check<D: Device + ?Sized>(
        &mut self,
        device: &mut D,
        diagnostics: &mut dyn Diagnostics,
    ) -> Option<DeviceError> {
        let error = device.poll_error()?;
        self.last = Some(error);
        if !self.in_error {
            diagnostics.report(Diagnostic::Device(error));
            self.in_error = true;
        } else {
            log::trace!("suppressed repeated {error}");
        }
        Some(error)
    }

    pub fn is_in_error(&self) -> bool {
        self.in_error
    }

    /// Most recent error seen by [`check`](Self::check), reported or not.
    pub fn last_error(&self) -> Option<DeviceError> {
        self.last
    }

    /// Clears the latch so the next error is reported again.
    pub fn reset(&mut self) {
        self.in_error = false;
    }
}
