//! The stateful pin-controller core.

#![allow(unsafe_code)]

use core::cell::UnsafeCell;

use log::{debug, trace};

use crate::{
    bus::RegisterBus,
    error::GpioError,
    pins::{BIT_DIRECTION, BIT_READ, BIT_WRITE, PIN_COUNT, pin_register},
    window::RegisterWindow,
};

/// Logical level of a GPIO line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Logical low / 0.
    Low,
    /// Logical high / 1.
    High,
}

impl Level {
    /// Returns true for [`Level::High`].
    #[inline]
    pub fn is_high(self) -> bool {
        matches!(self, Level::High)
    }
}

impl From<bool> for Level {
    #[inline]
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

impl From<Level> for bool {
    #[inline]
    fn from(level: Level) -> Self {
        level.is_high()
    }
}

/// Framework-facing pin operations.
///
/// Object-safe so the surrounding pin-control framework can register
/// the controller behind a single long-lived reference. Indices are
/// 0-based; every operation resolves the index through the pin table
/// first and fails with [`GpioError::NoSuchPin`] on an unknown line.
pub trait PinOps {
    /// Reserves a pin, saving the byte at its register for restoration.
    fn reserve(&self, index: usize) -> Result<(), GpioError>;

    /// Releases a pin, restoring the byte saved at reserve time.
    fn release(&self, index: usize) -> Result<(), GpioError>;

    /// Drives the pin's output level.
    fn set_level(&self, index: usize, level: Level) -> Result<(), GpioError>;

    /// Samples the pin's input level.
    fn get_level(&self, index: usize) -> Result<Level, GpioError>;

    /// Configures the pin as a driven output.
    fn set_direction_output(&self, index: usize) -> Result<(), GpioError>;

    /// Configures the pin as a sensed input.
    fn set_direction_input(&self, index: usize) -> Result<(), GpioError>;

    /// Number of lines exposed by the controller.
    fn pin_count(&self) -> usize;
}

/// Per-pin bookkeeping: the byte saved at reserve time and the set of
/// live reservations.
struct Reservations {
    saved: [u8; PIN_COUNT],
    held: bitmaps::Bitmap<PIN_COUNT>,
}

/// Four-line GPIO controller over the power-management window.
///
/// Every mutating register operation is a read-modify-write executed
/// inside one process-wide critical section. The pins' register words
/// overlap in the window, so the lock is global across pins rather
/// than per pin; a narrower scheme would first have to prove no two
/// pins alias the same word.
pub struct FchGpio<B: RegisterBus> {
    window: RegisterWindow<B>,
    state: UnsafeCell<Reservations>,
}

// SAFETY: `state` is only touched inside `critical_section::with`, and
// window accesses go through the bus, which tolerates concurrent
// readers by contract.
unsafe impl<B: RegisterBus + Sync> Sync for FchGpio<B> {}

impl<B: RegisterBus> core::fmt::Debug for FchGpio<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FchGpio").finish_non_exhaustive()
    }
}

impl<B: RegisterBus> FchGpio<B> {
    /// Binds the controller to its register window, taking exclusive
    /// ownership.
    pub fn new(window: RegisterWindow<B>) -> Self {
        Self {
            window,
            state: UnsafeCell::new(Reservations {
                saved: [0; PIN_COUNT],
                held: bitmaps::Bitmap::new(),
            }),
        }
    }

    pub(crate) fn into_window(self) -> RegisterWindow<B> {
        self.window
    }

    /// Restores every pin that still holds a reservation.
    ///
    /// Shutdown path: the framework is expected to release its pins
    /// first, but bytes saved by straggling reservations must reach
    /// the hardware before the window goes away.
    pub(crate) fn release_remaining(&self) {
        for index in 0..PIN_COUNT {
            match self.release(index) {
                Ok(()) => debug!("restored unreleased pin {index} at shutdown"),
                Err(GpioError::NotReserved) => {}
                Err(err) => debug!("pin {index} not restored at shutdown: {err}"),
            }
        }
    }

    /// Locked read-modify-write of the register backing `index`.
    fn update(&self, index: usize, f: impl FnOnce(u32) -> u32) -> Result<u32, GpioError> {
        let reg = pin_register(index)?;
        critical_section::with(|_| {
            let current = self.window.read_u32_at(reg)?;
            let next = f(current);
            self.window.write_u32_at(reg, next)?;
            Ok(next)
        })
    }
}

impl<B: RegisterBus> PinOps for FchGpio<B> {
    fn reserve(&self, index: usize) -> Result<(), GpioError> {
        let reg = pin_register(index)?;
        critical_section::with(|_| {
            // SAFETY: the critical section gives exclusive access.
            let state = unsafe { &mut *self.state.get() };
            if state.held.get(index) {
                return Err(GpioError::AlreadyReserved);
            }
            let byte = self.window.read_u8_at(reg)?;
            state.saved[index] = byte;
            state.held.set(index, true);
            debug!("reserved pin {index}, saved {byte:#04x}");
            Ok(())
        })
    }

    fn release(&self, index: usize) -> Result<(), GpioError> {
        let reg = pin_register(index)?;
        critical_section::with(|_| {
            // SAFETY: the critical section gives exclusive access.
            let state = unsafe { &mut *self.state.get() };
            if !state.held.get(index) {
                return Err(GpioError::NotReserved);
            }
            self.window.write_u8_at(reg, state.saved[index])?;
            state.held.set(index, false);
            debug!("released pin {index}, restored {:#04x}", state.saved[index]);
            Ok(())
        })
    }

    fn set_level(&self, index: usize, level: Level) -> Result<(), GpioError> {
        let word = self.update(index, |word| match level {
            Level::High => word | (1 << BIT_WRITE),
            Level::Low => word & !(1 << BIT_WRITE),
        })?;
        debug!("set pin {index} {level:?}, reg={word:#010x}");
        Ok(())
    }

    fn get_level(&self, index: usize) -> Result<Level, GpioError> {
        let reg = pin_register(index)?;
        // Single read; needs no ordering against concurrent writers.
        let word = self.window.read_u32_at(reg)?;
        let level = Level::from((word >> BIT_READ) & 1 == 1);
        trace!("read pin {index}: {level:?}");
        Ok(level)
    }

    fn set_direction_output(&self, index: usize) -> Result<(), GpioError> {
        self.update(index, |word| word | (1 << BIT_DIRECTION))?;
        debug!("pin {index} direction: output");
        Ok(())
    }

    fn set_direction_input(&self, index: usize) -> Result<(), GpioError> {
        self.update(index, |word| word & !(1 << BIT_DIRECTION))?;
        debug!("pin {index} direction: input");
        Ok(())
    }

    fn pin_count(&self) -> usize {
        PIN_COUNT
    }
}
