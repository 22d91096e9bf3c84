//! Register bus trait definition

use super::{HwBuffer, Register};

/// Access to the NAND controller's registers and data buffers
///
/// This trait is the boundary between the controller core and the hardware.
/// A memory-mapped implementation performs volatile accesses on the NFC
/// register block; the simulator implements it over an in-memory model.
///
/// All access is synchronous. Implementations must not block: completion is
/// detected by the core polling the busy bit of [`Register::Cmd`].
///
/// ## Buffers
///
/// The controller stages page data in two windows, the main buffer (one
/// page) and the spare buffer (one OOB area). [`NfcBus::buffer`] exposes
/// each as a byte slice. The core moves bytes in and out of them with
/// [`crate::mover::copy`], which picks the widest access the destination
/// alignment allows.
///
/// ## Example
///
/// ```ignore
/// impl NfcBus for Mmio {
///     fn read_reg(&mut self, reg: Register) -> u32 {
///         unsafe { core::ptr::read_volatile(self.reg_ptr(reg)) }
///     }
///
///     fn write_reg(&mut self, reg: Register, value: u32) {
///         unsafe { core::ptr::write_volatile(self.reg_ptr(reg), value) }
///     }
///
///     fn buffer(&mut self, buf: HwBuffer) -> &mut [u8] {
///         self.window(buf)
///     }
///
///     fn delay_us(&mut self, us: u32) {
///         self.timer.delay_us(us)
///     }
/// }
/// ```
pub trait NfcBus {
    /// Read a controller register
    fn read_reg(&mut self, reg: Register) -> u32;

    /// Write a controller register
    fn write_reg(&mut self, reg: Register, value: u32);

    /// Get the main or spare data buffer
    fn buffer(&mut self, buf: HwBuffer) -> &mut [u8];

    /// Delay for the specified number of microseconds
    fn delay_us(&mut self, us: u32);

    /// Read-modify-write helper: set bits in a register
    fn set_bits(&mut self, reg: Register, bits: u32) {
        let value = self.read_reg(reg);
        self.write_reg(reg, value | bits);
    }
}

impl<T: NfcBus + ?Sized> NfcBus for &mut T {
    fn read_reg(&mut self, reg: Register) -> u32 {
        (**self).read_reg(reg)
    }

    fn write_reg(&mut self, reg: Register, value: u32) {
        (**self).write_reg(reg, value)
    }

    fn buffer(&mut self, buf: HwBuffer) -> &mut [u8] {
        (**self).buffer(buf)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}
