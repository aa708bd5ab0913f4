//! Polls status1.BUSY after every operation that sets it, against a
//! per-operation deadline.

use embedded_hal::delay::DelayNs;

use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::mode::{self, AddressMode, OperationClass};
use crate::status::STATUS1_BUSY;
use crate::transport::Transport;

pub const READ_STATUS_REG1: u8 = 0x05;

/// Deadline + poll granularity pair for one class of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusyBudget {
    pub deadline_ms: u32,
    pub poll_granularity_us: u32,
}

impl BusyBudget {
    pub const STATUS_WRITE: BusyBudget = BusyBudget {
        deadline_ms: 1_000,
        poll_granularity_us: 1_000,
    };
    pub const PAGE_PROGRAM: BusyBudget = BusyBudget {
        deadline_ms: 3,
        poll_granularity_us: 10,
    };
    pub const SECURITY_REGISTER: BusyBudget = BusyBudget {
        deadline_ms: 1_000,
        poll_granularity_us: 10,
    };
    pub const SECTOR_ERASE: BusyBudget = BusyBudget {
        deadline_ms: 400,
        poll_granularity_us: 1_000,
    };
    pub const BLOCK_ERASE_32K: BusyBudget = BusyBudget {
        deadline_ms: 1_600,
        poll_granularity_us: 1_000,
    };
    pub const BLOCK_ERASE_64K: BusyBudget = BusyBudget {
        deadline_ms: 2_000,
        poll_granularity_us: 1_000,
    };
    pub const CHIP_ERASE: BusyBudget = BusyBudget {
        deadline_ms: 400_000,
        poll_granularity_us: 1_000,
    };
}

impl<T, D> Handle<T, D>
where
    T: Transport,
    D: DelayNs,
{
    /// Poll `READ_STATUS_REG1` until BUSY clears or `budget.deadline_ms`
    /// elapses. Status reads always go through the interface-default
    /// register template (the "Status read/write" row) regardless of
    /// which opcode preceded this wait.
    pub(crate) fn wait_until_ready(&mut self, budget: BusyBudget) -> Result<()> {
        let template = mode::build_template(
            OperationClass::RegisterByte,
            self.interface,
            self.dual_quad,
            AddressMode::ThreeByte, // irrelevant: no address phase on this template
            0,
        )?;

        let mut elapsed_us: u64 = 0;
        let deadline_us: u64 = (budget.deadline_ms as u64) * 1_000;

        loop {
            let mut status = [0u8; 1];
            let request = crate::encoder::encode(template, READ_STATUS_REG1, 0, 0, &[], &mut status);
            self.transport
                .write_read(request)
                .map_err(|_| Error::TransportFailure)?;

            if status[0] & STATUS1_BUSY == 0 {
                #[cfg(feature = "defmt")]
                defmt::trace!("w25qxx: busy cleared after {}us", elapsed_us);
                return Ok(());
            }

            if elapsed_us >= deadline_us {
                #[cfg(feature = "defmt")]
                defmt::warn!("w25qxx: busy-wait timed out after {}ms", budget.deadline_ms);
                return Err(Error::Timeout);
            }

            self.delay.delay_us(budget.poll_granularity_us);
            elapsed_us += budget.poll_granularity_us as u64;
        }
    }
}
