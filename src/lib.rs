//! A `no_std` driver core for the four-line GPIO block in the AMD FCH
//! power-management register window.
//!
//! The controller translates abstract pin operations (reserve, release,
//! direction, level) into correctly sequenced reads and writes of 32-bit
//! registers at fixed byte offsets, and restores the original register
//! contents when a pin is released.
//!
//! # Features
//!
//! - **Zero heap allocation** - Controller state is a fixed array plus a bitmap
//! - **Bounds-checked register access** - No raw offsets escape the window
//! - **One global lock** - Every read-modify-write runs in a critical section
//! - **Platform seams** - Region claiming, mapping, and register I/O are traits
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐         ┌──────────────────────────┐
//! │  Pin framework     │         │  FchGpio                 │
//! │                    │         │                          │
//! │  reserve/release   │────────▶│  pin table lookup        │
//! │  set/get level     │  PinOps │  saved bytes + bitmap    │
//! │  direction         │         │  locked read-mod-write   │
//! └────────────────────┘         └───────────┬──────────────┘
//!                                            │ bounds-checked
//!                                ┌───────────▼──────────────┐
//!                                │  RegisterWindow          │
//!                                │  (RegisterBus impl:      │
//!                                │   MmioBus / simulation)  │
//!                                └──────────────────────────┘
//! ```
//!
//! The four pins sit at byte offsets 89, 68, 69, and 70, so their 32-bit
//! register words overlap. Level and direction updates therefore share a
//! single process-wide critical section rather than per-pin locks.
//!
//! # Example
//!
//! ```rust,no_run
//! use fch_gpio::prelude::*;
//! use fch_gpio::{ACPI_MMIO_BASE, PM_REGION_OFFSET, PM_REGION_SIZE};
//!
//! // Platform code has mapped the PM window and hands over the virtual base.
//! let bus = unsafe { MmioBus::new(0xFED8_1500 as *mut u8) };
//! let window = RegisterWindow::new(bus, ACPI_MMIO_BASE + PM_REGION_OFFSET, PM_REGION_SIZE);
//! let gpio = FchGpio::new(window);
//!
//! gpio.reserve(0).unwrap();
//! gpio.set_direction_output(0).unwrap();
//! gpio.set_level(0, Level::High).unwrap();
//! assert_eq!(gpio.get_level(0).unwrap(), Level::High);
//! gpio.release(0).unwrap();
//! ```

#![deny(unsafe_code)]
#![no_std]

mod bus;
mod controller;
mod device;
mod error;
mod pins;
mod window;

#[cfg(test)]
mod test_support;

pub use bus::{MmioBus, RegionHost, RegisterBus};
pub use controller::{FchGpio, Level, PinOps};
pub use device::FchDevice;
pub use error::GpioError;
pub use pins::{ACPI_MMIO_BASE, PIN_COUNT, PM_REGION_OFFSET, PM_REGION_SIZE, pin_register};
pub use window::RegisterWindow;

pub mod prelude {
    pub use crate::{
        FchDevice, FchGpio, GpioError, Level, MmioBus, PinOps, RegionHost, RegisterBus,
        RegisterWindow,
    };
}
