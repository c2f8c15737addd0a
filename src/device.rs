//! Device lifecycle: region acquisition, controller construction,
//! orderly teardown.

use log::{error, info};

use crate::{
    bus::RegionHost,
    controller::FchGpio,
    error::GpioError,
    pins::{ACPI_MMIO_BASE, PM_REGION_OFFSET, PM_REGION_SIZE},
    window::RegisterWindow,
};

/// The bound controller instance plus the platform services it was
/// built from.
///
/// [`FchDevice::initialize`] is the driver's entry point; the
/// surrounding framework registers [`FchDevice::gpio`] as its pin
/// provider and calls [`FchDevice::shutdown`] when unloading. Dropping
/// the device without shutdown leaks the region claim.
pub struct FchDevice<H: RegionHost> {
    gpio: FchGpio<H::Bus>,
    host: H,
}

impl<H: RegionHost> FchDevice<H> {
    /// Claims and maps the power-management window, then binds the
    /// controller to it.
    ///
    /// On a claim conflict nothing is mapped and
    /// [`GpioError::RegionBusy`] is returned; a mapping failure rolls
    /// the claim back before returning [`GpioError::MapFailed`]. In
    /// either case no controller exists afterwards and no pins are
    /// exposed.
    pub fn initialize(mut host: H) -> Result<Self, GpioError> {
        let base = ACPI_MMIO_BASE + PM_REGION_OFFSET;
        let window = match RegisterWindow::map(&mut host, base, PM_REGION_SIZE) {
            Ok(window) => window,
            Err(err) => {
                error!("power-management window at {base:#010x} unavailable: {err}");
                return Err(err);
            }
        };
        info!("FCH GPIO window mapped at {base:#010x}");
        Ok(Self {
            gpio: FchGpio::new(window),
            host,
        })
    }

    /// The controller reference the framework's registration holds for
    /// the lifetime of the device.
    pub fn gpio(&self) -> &FchGpio<H::Bus> {
        &self.gpio
    }

    /// Restores still-reserved pins, unmaps the window, and releases
    /// the region, returning the platform handle.
    ///
    /// The framework is expected to have released its pins already;
    /// any reservation that survived is restored here so no register
    /// keeps driver-era contents past unload.
    pub fn shutdown(self) -> H {
        let FchDevice { gpio, mut host } = self;
        gpio.release_remaining();
        gpio.into_window().unmap(&mut host);
        info!("FCH GPIO window unmapped");
        host
    }
}

impl<H: RegionHost> core::fmt::Debug for FchDevice<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FchDevice").finish_non_exhaustive()
    }
}
