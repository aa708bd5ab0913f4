//! Transport-agnostic command protocol core for the Winbond W25Qxx serial
//! NOR flash family (W25Q80 .. W25Q256), over single-SPI, dual/quad-SPI or
//! QSPI.
//!
//! The crate owns three things: a [`mode`] matrix that turns (operation,
//! interface, dual/quad-enable, address mode) into a wire frame shape, a
//! busy-wait state machine ([`busy`]) that polls status1 after every
//! operation that sets it, and a read-modify-write engine ([`rmw`]) that
//! only erases a sector when the bytes it's about to overwrite aren't
//! already blank. Everything is driven through the caller-supplied
//! [`Transport`](transport::Transport) — this crate never touches a GPIO
//! or SPI peripheral register directly.
//!
//! Construct a [`Handle`] with [`Handle::new`], then call
//! [`Handle::init`] before issuing any other operation.

#![no_std]
#![deny(unsafe_code)]

mod busy;
mod encoder;
mod error;
mod family;
mod handle;
mod lifecycle;
mod mode;
mod ops;
mod rmw;
mod status;
pub mod transport;

#[cfg(test)]
mod testutil;
#[cfg(test)]
mod tests;

pub use busy::BusyBudget;
pub use error::{Error, Result};
pub use family::{Family, BLOCK_32K_SIZE, BLOCK_64K_SIZE, PAGE_SIZE, SECTOR_SIZE};
pub use handle::Handle;
pub use mode::{AddressMode, DualQuad, Interface};
pub use status::{QspiReadDummy, SecurityRegister};
pub use transport::{AddressWidth, CommandRequest, Lanes, Transport};
pub use transport::spi::{SpiBusTransport, SpiTransportError};
