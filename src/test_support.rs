//! Test support utilities - only compiled in test builds.

#![allow(unsafe_code)]

use core::cell::{Cell, RefCell};

use crate::{
    bus::{RegionHost, RegisterBus},
    controller::FchGpio,
    error::GpioError,
    pins::{ACPI_MMIO_BASE, BIT_READ, BIT_WRITE, PM_REGION_OFFSET, PM_REGION_SIZE},
    window::RegisterWindow,
};

/// Simulated register memory backing the test buses.
pub struct SimMemory {
    bytes: RefCell<[u8; PM_REGION_SIZE]>,
}

impl SimMemory {
    pub fn new() -> Self {
        Self {
            bytes: RefCell::new([0; PM_REGION_SIZE]),
        }
    }

    /// Reads a byte directly, bypassing the bus.
    pub fn peek(&self, offset: usize) -> u8 {
        self.bytes.borrow()[offset]
    }

    /// Writes a byte directly, bypassing the bus.
    pub fn poke(&self, offset: usize, value: u8) {
        self.bytes.borrow_mut()[offset] = value;
    }

    /// Copies out the full register space for whole-window assertions.
    pub fn snapshot(&self) -> [u8; PM_REGION_SIZE] {
        *self.bytes.borrow()
    }
}

/// Array-backed register bus.
pub struct SimBus<'a> {
    mem: &'a SimMemory,
}

unsafe impl RegisterBus for SimBus<'_> {
    fn read_u8(&self, offset: usize) -> u8 {
        self.mem.peek(offset)
    }

    fn write_u8(&self, offset: usize, value: u8) {
        self.mem.poke(offset, value);
    }

    fn read_u32(&self, offset: usize) -> u32 {
        let bytes = self.mem.bytes.borrow();
        u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    }

    fn write_u32(&self, offset: usize, value: u32) {
        let mut bytes = self.mem.bytes.borrow_mut();
        bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }
}

/// Register bus with the output level wired back to the input level,
/// the way a test harness jumpers a pin to itself. Writing the word
/// mirrors the write bit into the read bit before it lands.
pub struct LoopbackBus<'a> {
    inner: SimBus<'a>,
}

unsafe impl RegisterBus for LoopbackBus<'_> {
    fn read_u8(&self, offset: usize) -> u8 {
        self.inner.read_u8(offset)
    }

    fn write_u8(&self, offset: usize, value: u8) {
        self.inner.write_u8(offset, value);
    }

    fn read_u32(&self, offset: usize) -> u32 {
        self.inner.read_u32(offset)
    }

    fn write_u32(&self, offset: usize, value: u32) {
        let wired = if value & (1 << BIT_WRITE) != 0 {
            value | (1 << BIT_READ)
        } else {
            value & !(1 << BIT_READ)
        };
        self.inner.write_u32(offset, wired);
    }
}

/// Simulated platform: one claimable region plus fault injection.
pub struct SimPlatform<'a> {
    mem: &'a SimMemory,
    pub claimed: Cell<bool>,
    /// Pretend another owner already holds the region.
    pub busy: Cell<bool>,
    /// Force the mapping step to fail after a successful claim.
    pub fail_map: Cell<bool>,
    pub live_mappings: Cell<u32>,
    pub last_claim: Cell<Option<(u32, usize)>>,
}

impl<'a> SimPlatform<'a> {
    pub fn new(mem: &'a SimMemory) -> Self {
        Self {
            mem,
            claimed: Cell::new(false),
            busy: Cell::new(false),
            fail_map: Cell::new(false),
            live_mappings: Cell::new(0),
            last_claim: Cell::new(None),
        }
    }
}

/// Region host handle over a [`SimPlatform`].
pub struct SimHost<'a> {
    platform: &'a SimPlatform<'a>,
}

impl<'a> SimHost<'a> {
    pub fn new(platform: &'a SimPlatform<'a>) -> Self {
        Self { platform }
    }
}

impl<'a> RegionHost for SimHost<'a> {
    type Bus = SimBus<'a>;

    fn claim(&mut self, base: u32, size: usize) -> Result<(), GpioError> {
        if self.platform.busy.get() || self.platform.claimed.get() {
            return Err(GpioError::RegionBusy);
        }
        self.platform.claimed.set(true);
        self.platform.last_claim.set(Some((base, size)));
        Ok(())
    }

    fn map(&mut self, _base: u32, _size: usize) -> Result<Self::Bus, GpioError> {
        if self.platform.fail_map.get() {
            return Err(GpioError::MapFailed);
        }
        self.platform
            .live_mappings
            .set(self.platform.live_mappings.get() + 1);
        Ok(SimBus {
            mem: self.platform.mem,
        })
    }

    fn unmap(&mut self, _bus: Self::Bus) {
        self.platform
            .live_mappings
            .set(self.platform.live_mappings.get() - 1);
    }

    fn release(&mut self, _base: u32, _size: usize) {
        self.platform.claimed.set(false);
    }
}

/// Window over simulated memory at the hardware base and size.
pub fn sim_window(mem: &SimMemory) -> RegisterWindow<SimBus<'_>> {
    RegisterWindow::new(
        SimBus { mem },
        ACPI_MMIO_BASE + PM_REGION_OFFSET,
        PM_REGION_SIZE,
    )
}

/// Controller over plain simulated memory.
pub fn sim_gpio(mem: &SimMemory) -> FchGpio<SimBus<'_>> {
    FchGpio::new(sim_window(mem))
}

/// Controller over loopback memory (write bit wired to read bit).
pub fn loopback_gpio(mem: &SimMemory) -> FchGpio<LoopbackBus<'_>> {
    let bus = LoopbackBus {
        inner: SimBus { mem },
    };
    FchGpio::new(RegisterWindow::new(
        bus,
        ACPI_MMIO_BASE + PM_REGION_OFFSET,
        PM_REGION_SIZE,
    ))
}
