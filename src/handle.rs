//! The [`Handle`]: the sole stateful entity in the crate.

use embedded_hal::delay::DelayNs;

use crate::error::{Error, Result};
use crate::family::Family;
use crate::mode::{AddressMode, DualQuad, Interface};
use crate::transport::Transport;

/// Command-assembly scratch buffer: opcode + up to 5 address bytes + 256
/// data bytes.
pub const CMD_BUF_LEN: usize = 262;

/// Sector staging buffer: one full 4 KiB sector plus one spare byte.
pub const SECTOR_BUF_LEN: usize = 4097;

/// The one stateful object this crate exposes.
///
/// Generic over the injected [`Transport`] (`T`) and delay source (`D`,
/// an `embedded_hal::delay::DelayNs` implementor for the millisecond/
/// microsecond sleeps a busy-wait needs). Construct with [`Handle::new`],
/// configure via the `set_*` setters, then drive through
/// [`crate::lifecycle::init`] before issuing any other operation.
pub struct Handle<T, D> {
    pub(crate) transport: T,
    pub(crate) delay: D,
    pub(crate) family: Family,
    pub(crate) interface: Interface,
    pub(crate) dual_quad: DualQuad,
    pub(crate) address_mode: AddressMode,
    pub(crate) param: u8,
    pub(crate) dummy: u8,
    pub(crate) inited: bool,
    /// Reserved to keep the `Handle`'s stack/BSS footprint fixed at
    /// compile time, matching the scratch buffer this type's data model
    /// calls for. `encoder::encode` builds `CommandRequest`s that borrow
    /// the caller's own buffers directly, so this crate never actually
    /// copies through it.
    #[allow(dead_code)]
    pub(crate) cmd_buf: [u8; CMD_BUF_LEN],
    pub(crate) sector_buf: [u8; SECTOR_BUF_LEN],
}

impl<T, D> Handle<T, D>
where
    T: Transport,
    D: DelayNs,
{
    /// Build an uninitialised handle. `interface`/`dual_quad` may be
    /// changed until [`crate::lifecycle::init`] is called; `family` is
    /// fixed at construction — nothing before `init` depends on it
    /// changing, so there is no reason to allow it.
    pub fn new(transport: T, delay: D, family: Family, interface: Interface) -> Self {
        Self {
            transport,
            delay,
            family,
            interface,
            dual_quad: DualQuad::Off,
            address_mode: AddressMode::ThreeByte,
            param: 0,
            dummy: 8,
            inited: false,
            cmd_buf: [0u8; CMD_BUF_LEN],
            sector_buf: [0u8; SECTOR_BUF_LEN],
        }
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn interface(&self) -> Interface {
        self.interface
    }

    pub fn address_mode(&self) -> AddressMode {
        self.address_mode
    }

    pub fn is_inited(&self) -> bool {
        self.inited
    }

    /// Authorise (or revoke) dual/quad-lane opcodes while in SPI mode.
    /// Only meaningful before `init`, much like `interface`; changing it
    /// after `init` is legal but has no effect on a device that already
    /// completed its mode-entry sequence.
    pub fn set_dual_quad_enable(&mut self, dual_quad: DualQuad) {
        self.dual_quad = dual_quad;
    }

    pub fn dual_quad_enable(&self) -> DualQuad {
        self.dual_quad
    }

    /// Release the transport and delay source, consuming the handle.
    /// Callers should have driven [`crate::lifecycle::deinit`] first.
    pub fn release(self) -> (T, D) {
        (self.transport, self.delay)
    }

    /// Set the QSPI fast-read parameter byte / effective dummy-cycle
    /// count directly. Used internally by [`crate::lifecycle::init`]'s
    /// QSPI mode-entry step and exposed for callers who need a
    /// non-default dummy count.
    pub fn set_read_parameters(&mut self, param: u8, dummy: u8) {
        self.param = param;
        self.dummy = dummy;
    }

    pub fn read_parameters(&self) -> (u8, u8) {
        (self.param, self.dummy)
    }

    pub(crate) fn require_inited(&self) -> Result<()> {
        if self.inited {
            Ok(())
        } else {
            Err(Error::NotInitialised)
        }
    }
}
