//! Bounds-checked view of the mapped register region.

use crate::{
    bus::{RegionHost, RegisterBus},
    error::GpioError,
};

/// Mapped, byte-addressable view of the power-management register
/// region.
///
/// All access is offset-based and checked against the mapped size; the
/// window never hands out raw memory. Exclusively owned by the pin
/// controller for its lifetime.
pub struct RegisterWindow<B: RegisterBus> {
    bus: B,
    base: u32,
    size: usize,
}

/// Generates a bounds-checked read/write accessor pair for one
/// primitive width.
macro_rules! impl_window_primitive {
    ($type:ty, $size:literal) => {
        paste::paste! {
            #[doc = "Reads a `" $type "` at `offset` within the window."]
            #[doc = ""]
            #[doc = "Fails with [`GpioError::OutOfBounds`] outside the mapped range."]
            #[inline]
            pub fn [<read_ $type _at>](&self, offset: u16) -> Result<$type, GpioError> {
                let offset = self.span(offset, $size)?;
                Ok(self.bus.[<read_ $type>](offset))
            }

            #[doc = "Writes a `" $type "` at `offset` within the window."]
            #[doc = ""]
            #[doc = "Fails with [`GpioError::OutOfBounds`] outside the mapped range."]
            #[inline]
            pub fn [<write_ $type _at>](&self, offset: u16, value: $type) -> Result<(), GpioError> {
                let offset = self.span(offset, $size)?;
                self.bus.[<write_ $type>](offset, value);
                Ok(())
            }
        }
    };
}

impl<B: RegisterBus> RegisterWindow<B> {
    /// Claims the physical region and maps it into an addressable view.
    ///
    /// Both steps succeed or neither does: a claim whose mapping fails
    /// is released before the error returns.
    pub fn map<H>(host: &mut H, base: u32, size: usize) -> Result<Self, GpioError>
    where
        H: RegionHost<Bus = B>,
    {
        host.claim(base, size)?;
        match host.map(base, size) {
            Ok(bus) => Ok(Self::new(bus, base, size)),
            Err(err) => {
                host.release(base, size);
                Err(err)
            }
        }
    }

    /// Wraps an already-mapped bus.
    ///
    /// Platform integrations that manage their own mapping can build a
    /// window directly; `size` must cover every register the controller
    /// touches.
    pub fn new(bus: B, base: u32, size: usize) -> Self {
        Self { bus, base, size }
    }

    /// Physical base address of the window.
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Mapped size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Releases the view and the region claim.
    ///
    /// Consumes the window, so a second unmap is unrepresentable.
    pub fn unmap<H>(self, host: &mut H)
    where
        H: RegionHost<Bus = B>,
    {
        host.unmap(self.bus);
        host.release(self.base, self.size);
    }

    fn span(&self, offset: u16, len: usize) -> Result<usize, GpioError> {
        let offset = offset as usize;
        let end = offset.checked_add(len).ok_or(GpioError::OutOfBounds)?;
        if end > self.size {
            return Err(GpioError::OutOfBounds);
        }
        Ok(offset)
    }

    impl_window_primitive!(u8, 1);
    impl_window_primitive!(u32, 4);
}

impl<B: RegisterBus> core::fmt::Debug for RegisterWindow<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegisterWindow")
            .field("base", &self.base)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}
