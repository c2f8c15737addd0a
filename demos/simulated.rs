//! Full lifecycle against simulated registers.
//!
//! This example demonstrates:
//! - Implementing the platform seams (`RegionHost`, `RegisterBus`) in
//!   plain host memory
//! - Initializing the device, driving pins, and shutting down
//! - The reserve/release cycle restoring original register bytes

use std::cell::{Cell, RefCell};

use fch_gpio::prelude::*;
use fch_gpio::{PM_REGION_SIZE, pin_register};

/// Host-memory stand-in for the power-management register window.
struct SimPlatform {
    mem: RefCell<Vec<u8>>,
    claimed: Cell<bool>,
}

/// Bus handle over the simulated window.
struct SimBus<'a> {
    platform: &'a SimPlatform,
}

unsafe impl RegisterBus for SimBus<'_> {
    fn read_u8(&self, offset: usize) -> u8 {
        self.platform.mem.borrow()[offset]
    }

    fn write_u8(&self, offset: usize, value: u8) {
        self.platform.mem.borrow_mut()[offset] = value;
    }

    fn read_u32(&self, offset: usize) -> u32 {
        let mem = self.platform.mem.borrow();
        u32::from_le_bytes(mem[offset..offset + 4].try_into().unwrap())
    }

    fn write_u32(&self, offset: usize, value: u32) {
        let mut mem = self.platform.mem.borrow_mut();
        mem[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }
}

struct SimHost<'a> {
    platform: &'a SimPlatform,
}

impl<'a> RegionHost for SimHost<'a> {
    type Bus = SimBus<'a>;

    fn claim(&mut self, base: u32, size: usize) -> Result<(), GpioError> {
        if self.platform.claimed.get() {
            return Err(GpioError::RegionBusy);
        }
        println!("claimed region {base:#010x}..+{size:#x}");
        self.platform.claimed.set(true);
        Ok(())
    }

    fn map(&mut self, base: u32, _size: usize) -> Result<Self::Bus, GpioError> {
        println!("mapped region {base:#010x}");
        Ok(SimBus {
            platform: self.platform,
        })
    }

    fn unmap(&mut self, _bus: Self::Bus) {
        println!("unmapped region");
    }

    fn release(&mut self, base: u32, _size: usize) {
        println!("released region {base:#010x}");
        self.platform.claimed.set(false);
    }
}

fn main() {
    println!("=== Simulated FCH GPIO lifecycle ===\n");

    let platform = SimPlatform {
        mem: RefCell::new(vec![0; PM_REGION_SIZE]),
        claimed: Cell::new(false),
    };

    // Pretend firmware left something in pin 0's register.
    platform.mem.borrow_mut()[89] = 0x5A;

    let device = FchDevice::initialize(SimHost {
        platform: &platform,
    })
    .expect("initialize");
    let gpio = device.gpio();

    for pin in 0..gpio.pin_count() {
        let reg = pin_register(pin).unwrap();
        println!("pin {pin} -> register offset {reg}");
    }

    println!("\nDriving pin 0:");
    gpio.reserve(0).expect("reserve");
    gpio.set_direction_output(0).expect("direction");
    gpio.set_level(0, Level::High).expect("set high");
    println!("  register word now {:#010x}", word_at(&platform, 89));
    gpio.set_level(0, Level::Low).expect("set low");
    println!("  register word now {:#010x}", word_at(&platform, 89));
    gpio.release(0).expect("release");
    println!(
        "  after release, byte restored to {:#04x}",
        platform.mem.borrow()[89]
    );

    // A second claimant is turned away while the device is live.
    let err = FchDevice::initialize(SimHost {
        platform: &platform,
    })
    .unwrap_err();
    println!("\nSecond claimant rejected: {err}");

    device.shutdown();
    println!("\nDone.");
}

fn word_at(platform: &SimPlatform, offset: usize) -> u32 {
    let mem = platform.mem.borrow();
    u32::from_le_bytes(mem[offset..offset + 4].try_into().unwrap())
}
