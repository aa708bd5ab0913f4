//! The `init`/`deinit` sequences that bring the device from power-on
//! into the handle's configured interface and back down again.

use embedded_hal::delay::DelayNs;

use crate::busy::BusyBudget;
use crate::encoder;
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::mode::{AddressMode, FrameTemplate, Interface};
use crate::status::{QspiReadDummy, STATUS2_QE};
use crate::transport::{AddressWidth, Lanes, Transport};

const RELEASE_POWER_DOWN: u8 = 0xAB;
const ENABLE_RESET: u8 = 0x66;
const RESET_DEVICE: u8 = 0x99;
const ENTER_QSPI_MODE: u8 = 0x38;
const EXIT_QSPI_MODE: u8 = 0xFF;
const ENTER_3BYTE_MODE: u8 = 0xE9;
const ENTER_4BYTE_MODE: u8 = 0xB7;
const POWER_DOWN: u8 = 0xB9;

/// A bare frame shape with no address/alternate/dummy/data phases, issued
/// single-lane. Used for the reset sequence, which runs before the device
/// has been told to expect multi-lane framing at all.
const fn bare_single_lane() -> FrameTemplate {
    FrameTemplate {
        instruction_lanes: Lanes::Single,
        address_lanes: Lanes::None,
        address_bytes: AddressWidth::None,
        alternate_lanes: Lanes::None,
        alternate_bytes: AddressWidth::None,
        dummy_cycles: 0,
        data_lanes: Lanes::None,
        needs_ext_addr_register: false,
    }
}

impl<T, D> Handle<T, D>
where
    T: Transport,
    D: DelayNs,
{
    /// Bring the device up: power-on reset recovery, optional QSPI
    /// mode-entry, JEDEC identity check, and 4-byte-to-3-byte address mode
    /// normalisation on W25Q256 (this crate keeps every family in 3-byte
    /// framing by default, routing through the Extended Address Register
    /// instead of native 4-byte addressing).
    ///
    /// On any failure after `transport.init()` succeeds, `transport.deinit()`
    /// is invoked before the error is returned, so a caller that gets `Err`
    /// back never needs to clean up the transport itself.
    pub fn init(&mut self) -> Result<()> {
        self.transport.init().map_err(|_| Error::TransportInitFailed)?;

        match self.run_init_sequence() {
            Ok(()) => Ok(()),
            Err(err) => {
                let _ = self.transport.deinit();
                Err(err)
            }
        }
    }

    fn run_init_sequence(&mut self) -> Result<()> {
        self.release_power_down()?;
        self.reset_device()?;
        // Spec step 3: a fixed settle time after Enable-Reset/Reset-Device,
        // not a status poll — the device doesn't reliably answer 0x05
        // until reset recovery has actually finished.
        self.delay.delay_ms(10);

        if self.interface == Interface::Qspi {
            self.enter_qspi_mode()?;
        }

        let id = self.read_manufacturer_device_id()?;
        let probed = u16::from_be_bytes(id);
        if probed != self.family.jedec_id() {
            return Err(Error::IdMismatch);
        }

        self.address_mode = AddressMode::ThreeByte;
        if self.family.supports_4byte_address_mode() {
            self.enter_3byte_mode()?;
        }

        self.inited = true;
        Ok(())
    }

    fn release_power_down(&mut self) -> Result<()> {
        // Three dummy bytes, then one discarded data byte — the legacy
        // shape of 0xAB carried over from the era it doubled as a
        // Read-Electronic-Signature command.
        let template = FrameTemplate {
            dummy_cycles: 24,
            data_lanes: Lanes::Single,
            ..bare_single_lane()
        };
        let mut discard = [0u8; 1];
        let request = encoder::encode(template, RELEASE_POWER_DOWN, 0, 0, &[], &mut discard);
        self.transport
            .write_read(request)
            .map_err(|_| Error::ResetFailed)
    }

    fn reset_device(&mut self) -> Result<()> {
        let template = bare_single_lane();
        let enable = encoder::encode_command(template, ENABLE_RESET);
        self.transport
            .write_read(enable)
            .map_err(|_| Error::ResetFailed)?;
        let reset = encoder::encode_command(template, RESET_DEVICE);
        self.transport
            .write_read(reset)
            .map_err(|_| Error::ResetFailed)
    }

    fn enter_qspi_mode(&mut self) -> Result<()> {
        // The device is still plain single-lane SPI at this point — 0x38
        // hasn't gone out yet — so the status2 read/write and its busy-wait
        // are built directly rather than through `read_status2`/
        // `write_status2`/`wait_until_ready`, all of which key their lane
        // widths off `self.interface` and would otherwise frame these as
        // quad-lane.
        let status2 = self
            .read_status2_single_lane()
            .map_err(|_| Error::EnterQspiFailed)?;
        if status2 & STATUS2_QE == 0 {
            self.write_status2_single_lane(status2 | STATUS2_QE)
                .map_err(|_| Error::EnterQspiFailed)?;
        }

        let template = bare_single_lane();
        let request = encoder::encode_command(template, ENTER_QSPI_MODE);
        self.transport
            .write_read(request)
            .map_err(|_| Error::EnterQspiFailed)?;
        self.delay.delay_ms(10);

        self.set_qspi_read_dummy(QspiReadDummy::Cycles8)
            .map_err(|_| Error::EnterQspiFailed)
    }

    /// Read Status Register 2 (0x35), framed single-lane.
    fn read_status2_single_lane(&mut self) -> Result<u8> {
        let template = FrameTemplate {
            data_lanes: Lanes::Single,
            ..bare_single_lane()
        };
        let mut value = [0u8; 1];
        let request = encoder::encode(template, 0x35, 0, 0, &[], &mut value);
        self.transport
            .write_read(request)
            .map_err(|_| Error::EnterQspiFailed)?;
        Ok(value[0])
    }

    /// Volatile SR Write Enable (0x50) + Write Status Register 2 (0x31),
    /// framed single-lane, followed by a single-lane busy-wait poll.
    fn write_status2_single_lane(&mut self, value: u8) -> Result<()> {
        let template = FrameTemplate {
            data_lanes: Lanes::Single,
            ..bare_single_lane()
        };
        let enable = encoder::encode_command(template, 0x50);
        self.transport
            .write_read(enable)
            .map_err(|_| Error::EnterQspiFailed)?;

        let payload = [value];
        let mut empty: [u8; 0] = [];
        let request = encoder::encode(template, 0x31, 0, 0, &payload, &mut empty);
        self.transport
            .write_read(request)
            .map_err(|_| Error::EnterQspiFailed)?;

        self.wait_until_ready_single_lane(BusyBudget::STATUS_WRITE)
    }

    /// `wait_until_ready`'s polling loop, framed single-lane. Needed only
    /// during the pre-QSPI-entry window where `self.interface` already
    /// reads `Qspi` (the handle's target) but the device itself hasn't
    /// switched off single-lane SPI framing yet.
    fn wait_until_ready_single_lane(&mut self, budget: BusyBudget) -> Result<()> {
        let template = FrameTemplate {
            data_lanes: Lanes::Single,
            ..bare_single_lane()
        };
        let mut elapsed_us: u64 = 0;
        let deadline_us: u64 = (budget.deadline_ms as u64) * 1_000;
        loop {
            let mut status = [0u8; 1];
            let request = encoder::encode(template, 0x05, 0, 0, &[], &mut status);
            self.transport
                .write_read(request)
                .map_err(|_| Error::EnterQspiFailed)?;
            if status[0] & crate::status::STATUS1_BUSY == 0 {
                return Ok(());
            }
            if elapsed_us >= deadline_us {
                return Err(Error::Timeout);
            }
            self.delay.delay_us(budget.poll_granularity_us);
            elapsed_us += budget.poll_granularity_us as u64;
        }
    }

    fn enter_3byte_mode(&mut self) -> Result<()> {
        let template = self.current_interface_bare_template()?;
        let request = encoder::encode_command(template, ENTER_3BYTE_MODE);
        self.transport
            .write_read(request)
            .map_err(|_| Error::AddressModeFailed)
    }

    /// Switch a live, initialised W25Q256 handle into native 4-byte
    /// addressing, forgoing the Extended Address Register prefix on
    /// subsequent address-bearing commands. Not part of `init` — callers
    /// opt in explicitly, since the default path keeps every family in
    /// 3-byte framing.
    pub fn enter_4byte_mode(&mut self) -> Result<()> {
        self.require_inited()?;
        if !self.family.supports_4byte_address_mode() {
            return Err(Error::InvalidAddressMode);
        }
        let template = self.current_interface_bare_template()?;
        let request = encoder::encode_command(template, ENTER_4BYTE_MODE);
        self.transport
            .write_read(request)
            .map_err(|_| Error::AddressModeFailed)?;
        self.address_mode = AddressMode::FourByte;
        Ok(())
    }

    fn current_interface_bare_template(&self) -> Result<FrameTemplate> {
        Ok(match self.interface {
            Interface::Spi => bare_single_lane(),
            Interface::Qspi => FrameTemplate {
                instruction_lanes: Lanes::Quad,
                ..bare_single_lane()
            },
        })
    }

    /// Tear the device back down: drop out of QSPI framing if active, then
    /// power it down and release the transport. Mirrors `init`'s ordering
    /// in reverse. Returns `Ok(())` uniformly regardless of which interface
    /// was active.
    pub fn deinit(&mut self) -> Result<()> {
        if self.interface == Interface::Qspi {
            let template = FrameTemplate {
                instruction_lanes: Lanes::Quad,
                ..bare_single_lane()
            };
            let request = encoder::encode_command(template, EXIT_QSPI_MODE);
            let _ = self.transport.write_read(request);
            self.delay.delay_ms(10);
        }

        let template = bare_single_lane();
        let request = encoder::encode_command(template, POWER_DOWN);
        let _ = self.transport.write_read(request);

        self.inited = false;
        self.transport
            .deinit()
            .map_err(|_| Error::TransportInitFailed)
    }
}
