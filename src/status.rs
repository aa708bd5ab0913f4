//! Status registers 1/2/3, security registers, SFDP and lock bits.

use embedded_hal::delay::DelayNs;

use crate::busy::BusyBudget;
use crate::encoder;
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::mode::{self, AddressMode, OperationClass};
use crate::transport::{AddressWidth, Lanes, Transport};

// --- Status 1 bits ---
pub const STATUS1_BUSY: u8 = 1 << 0;
pub const STATUS1_WEL: u8 = 1 << 1;
pub const STATUS1_BP0: u8 = 1 << 2;
pub const STATUS1_BP1: u8 = 1 << 3;
pub const STATUS1_BP2: u8 = 1 << 4;
pub const STATUS1_TB_BP3: u8 = 1 << 5;
pub const STATUS1_SEC_CMP: u8 = 1 << 6;
pub const STATUS1_SRP0: u8 = 1 << 7;

// --- Status 2 bits ---
pub const STATUS2_SRP1: u8 = 1 << 0;
pub const STATUS2_QE: u8 = 1 << 1;
pub const STATUS2_LB1: u8 = 1 << 3;
pub const STATUS2_LB2: u8 = 1 << 4;
pub const STATUS2_LB3: u8 = 1 << 5;
pub const STATUS2_CMP: u8 = 1 << 6;
pub const STATUS2_SUS: u8 = 1 << 7;

// --- Status 3 bits ---
pub const STATUS3_ADS: u8 = 1 << 0;
pub const STATUS3_ADP: u8 = 1 << 1;
pub const STATUS3_WPS: u8 = 1 << 2;
pub const STATUS3_DRV_MASK: u8 = 0b0110_0000;
pub const STATUS3_HOLD_RESET: u8 = 1 << 7;

// --- Opcodes ---
const WRITE_ENABLE: u8 = 0x06;
const WRITE_DISABLE: u8 = 0x04;
const VOLATILE_SR_WRITE_ENABLE: u8 = 0x50;
const READ_STATUS_REG1: u8 = 0x05;
const WRITE_STATUS_REG1: u8 = 0x01;
const READ_STATUS_REG2: u8 = 0x35;
const WRITE_STATUS_REG2: u8 = 0x31;
const READ_STATUS_REG3: u8 = 0x15;
const WRITE_STATUS_REG3: u8 = 0x11;
const WRITE_EXTENDED_ADDR_REG: u8 = 0xC5;
const READ_SFDP: u8 = 0x5A;
const PROGRAM_SECURITY_REGISTER: u8 = 0x42;
const ERASE_SECURITY_REGISTER: u8 = 0x44;
const READ_SECURITY_REGISTER: u8 = 0x48;
const READ_UNIQUE_ID: u8 = 0x4B;
const SET_READ_PARAMETERS: u8 = 0xC0;
const INDIVIDUAL_BLOCK_LOCK: u8 = 0x36;
const INDIVIDUAL_BLOCK_UNLOCK: u8 = 0x39;
const READ_BLOCK_LOCK: u8 = 0x3D;
const GLOBAL_BLOCK_LOCK: u8 = 0x7E;
const GLOBAL_BLOCK_UNLOCK: u8 = 0x98;

/// One of the three one-time-programmable 256-byte security regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SecurityRegister {
    One,
    Two,
    Three,
}

impl SecurityRegister {
    /// A[15:12] slot address.
    const fn base_address(self) -> u32 {
        match self {
            SecurityRegister::One => 0x1000,
            SecurityRegister::Two => 0x2000,
            SecurityRegister::Three => 0x3000,
        }
    }
}

/// The four QSPI fast-read dummy-cycle configurations selectable via
/// Set Read Parameters (0xC0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QspiReadDummy {
    /// 2 dummy cycles, up to 33 MHz.
    Cycles2 = 0x00,
    /// 4 dummy cycles, up to 55 MHz.
    Cycles4 = 0x01,
    /// 6 dummy cycles, up to 80 MHz.
    Cycles6 = 0x02,
    /// 8 dummy cycles, up to 80 MHz.
    Cycles8 = 0x03,
}

impl QspiReadDummy {
    pub const fn cycles(self) -> u8 {
        match self {
            QspiReadDummy::Cycles2 => 2,
            QspiReadDummy::Cycles4 => 4,
            QspiReadDummy::Cycles6 => 6,
            QspiReadDummy::Cycles8 => 8,
        }
    }

    /// Param byte loaded into the upper nibble of the 0xC0 payload,
    /// burst-wrap disabled (lower nibble `0b0000`). The lifecycle's QSPI
    /// mode-entry step loads `param = 0x30` for `Cycles8`.
    const fn param_byte(self) -> u8 {
        (self as u8) << 4
    }
}

impl<T, D> Handle<T, D>
where
    T: Transport,
    D: DelayNs,
{
    fn register_template(&self) -> Result<mode::FrameTemplate> {
        mode::build_template(
            OperationClass::RegisterByte,
            self.interface,
            self.dual_quad,
            self.address_mode,
            self.dummy,
        )
    }

    fn spi_only_template(&self) -> Result<mode::FrameTemplate> {
        mode::build_template(
            OperationClass::SpiOnlyRegister,
            self.interface,
            self.dual_quad,
            self.address_mode,
            self.dummy,
        )
    }

    /// 3-byte address, zero-dummy shape for security-register program/erase
    /// (0x42/0x44): these "follow normal program protocol", unlike the
    /// 8-dummy-cycle read (0x48), so they must not share `spi_only_template`.
    fn security_write_template(&self) -> mode::FrameTemplate {
        mode::FrameTemplate {
            instruction_lanes: Lanes::Single,
            address_lanes: Lanes::Single,
            address_bytes: AddressWidth::Three,
            alternate_lanes: Lanes::None,
            alternate_bytes: AddressWidth::None,
            dummy_cycles: 0,
            data_lanes: Lanes::Single,
            needs_ext_addr_register: false,
        }
    }

    fn issue_command(&mut self, instruction: u8) -> Result<()> {
        let template = self.register_template()?;
        let request = encoder::encode_command(template, instruction);
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)
    }

    /// Write Enable (0x06): raises WEL ahead of any program/erase/register
    /// write.
    pub fn write_enable(&mut self) -> Result<()> {
        self.issue_command(WRITE_ENABLE)
    }

    /// Write Disable (0x04): clears WEL.
    pub fn write_disable(&mut self) -> Result<()> {
        self.issue_command(WRITE_DISABLE)
    }

    /// Volatile SR Write Enable (0x50): the WEL precursor this crate uses
    /// ahead of status-register writes, rather than the persistent Write
    /// Enable (0x06) a program/erase uses.
    fn volatile_sr_write_enable(&mut self) -> Result<()> {
        self.issue_command(VOLATILE_SR_WRITE_ENABLE)
    }

    fn read_register_byte(&mut self, instruction: u8) -> Result<u8> {
        let template = self.register_template()?;
        let mut value = [0u8; 1];
        let request = encoder::encode(template, instruction, 0, 0, &[], &mut value);
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)?;
        Ok(value[0])
    }

    fn write_register_byte(&mut self, instruction: u8, value: u8) -> Result<()> {
        self.volatile_sr_write_enable()?;
        let template = self.register_template()?;
        let payload = [value];
        let mut empty: [u8; 0] = [];
        let request = encoder::encode(template, instruction, 0, 0, &payload, &mut empty);
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)?;
        self.wait_until_ready(BusyBudget::STATUS_WRITE)
    }

    pub fn read_status1(&mut self) -> Result<u8> {
        self.read_register_byte(READ_STATUS_REG1)
    }

    pub fn read_status2(&mut self) -> Result<u8> {
        self.read_register_byte(READ_STATUS_REG2)
    }

    pub fn read_status3(&mut self) -> Result<u8> {
        self.read_register_byte(READ_STATUS_REG3)
    }

    pub fn write_status1(&mut self, value: u8) -> Result<()> {
        self.write_register_byte(WRITE_STATUS_REG1, value)
    }

    pub fn write_status2(&mut self, value: u8) -> Result<()> {
        self.write_register_byte(WRITE_STATUS_REG2, value)
    }

    pub fn write_status3(&mut self, value: u8) -> Result<()> {
        self.write_register_byte(WRITE_STATUS_REG3, value)
    }

    /// Whether quad-mode opcodes are currently authorised by the device
    /// (status2.QE).
    pub fn quad_enabled(&mut self) -> Result<bool> {
        Ok(self.read_status2()? & STATUS2_QE != 0)
    }

    /// Write Extended Address Register (0xC5): provides address bits
    /// 31:24 while a Q256 command still carries a 3-byte address.
    pub(crate) fn write_extended_address_register(&mut self, high_byte: u8) -> Result<()> {
        self.write_enable()?;
        let template = self.register_template()?;
        let payload = [high_byte];
        let mut empty: [u8; 0] = [];
        let request = encoder::encode(
            template,
            WRITE_EXTENDED_ADDR_REG,
            0,
            0,
            &payload,
            &mut empty,
        );
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)
    }

    /// If the current template calls for an Extended Address Register
    /// prefix (Q256 in 3-byte mode), issue it for the given full 32-bit
    /// address before the real command goes out.
    pub(crate) fn maybe_write_ext_addr(
        &mut self,
        template: mode::FrameTemplate,
        address: u32,
    ) -> Result<()> {
        if template.needs_ext_addr_register {
            self.write_extended_address_register((address >> 24) as u8)?;
        }
        Ok(())
    }

    /// Read the 256-byte SFDP parameter block at `address` (SPI-mode only,
    /// 8 dummy cycles).
    pub fn read_sfdp(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        self.require_inited()?;
        let template = self.spi_only_template()?;
        let request = encoder::encode(template, READ_SFDP, address, 0, &[], buf);
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)
    }

    /// Read the 8-byte factory-programmed Unique ID (SPI-mode only).
    pub fn read_unique_id(&mut self, buf: &mut [u8; 8]) -> Result<()> {
        self.require_inited()?;
        let template = self.spi_only_template()?;
        let request = encoder::encode(template, READ_UNIQUE_ID, 0, 0, &[], buf);
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)
    }

    /// Read a 256-byte security register (SPI-mode only, 8 dummy cycles).
    pub fn read_security_register(&mut self, reg: SecurityRegister, buf: &mut [u8]) -> Result<()> {
        self.require_inited()?;
        let template = self.spi_only_template()?;
        let request = encoder::encode(
            template,
            READ_SECURITY_REGISTER,
            reg.base_address(),
            0,
            &[],
            buf,
        );
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)
    }

    /// Program up to 256 bytes into a security register (normal program
    /// protocol: write-enable, program, busy-wait).
    pub fn program_security_register(&mut self, reg: SecurityRegister, data: &[u8]) -> Result<()> {
        self.require_inited()?;
        if data.len() > 256 {
            return Err(Error::InvalidLength);
        }
        let template = self.security_write_template();
        self.write_enable()?;
        let mut empty: [u8; 0] = [];
        let request = encoder::encode(
            template,
            PROGRAM_SECURITY_REGISTER,
            reg.base_address(),
            0,
            data,
            &mut empty,
        );
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)?;
        self.wait_until_ready(BusyBudget::SECURITY_REGISTER)
    }

    /// Erase a security register (behaves like a sector erase).
    pub fn erase_security_register(&mut self, reg: SecurityRegister) -> Result<()> {
        self.require_inited()?;
        let template = self.security_write_template();
        self.write_enable()?;
        let mut empty: [u8; 0] = [];
        let request = encoder::encode(
            template,
            ERASE_SECURITY_REGISTER,
            reg.base_address(),
            0,
            &[],
            &mut empty,
        );
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)?;
        self.wait_until_ready(BusyBudget::SECURITY_REGISTER)
    }

    /// Set Read Parameters (0xC0): configures the QSPI fast-read dummy
    /// count and records it in `self.dummy`/`self.param` for subsequent
    /// quad-I/O reads.
    pub fn set_qspi_read_dummy(&mut self, dummy: QspiReadDummy) -> Result<()> {
        let template = self.register_template()?;
        let param = dummy.param_byte();
        let payload = [param];
        let mut empty: [u8; 0] = [];
        let request = encoder::encode(template, SET_READ_PARAMETERS, 0, 0, &payload, &mut empty);
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)?;
        self.set_read_parameters(param, dummy.cycles());
        Ok(())
    }

    /// Individual Block/Sector Lock (0x36) / Unlock (0x39) at `address`.
    pub fn set_block_lock(&mut self, address: u32, locked: bool) -> Result<()> {
        self.require_inited()?;
        let template = mode::build_template(
            OperationClass::Erase,
            self.interface,
            self.dual_quad,
            self.address_mode,
            self.dummy,
        )?;
        self.write_enable()?;
        self.maybe_write_ext_addr(template, address)?;
        let instruction = if locked {
            INDIVIDUAL_BLOCK_LOCK
        } else {
            INDIVIDUAL_BLOCK_UNLOCK
        };
        let mut empty: [u8; 0] = [];
        let request = encoder::encode(template, instruction, address, 0, &[], &mut empty);
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)
    }

    /// Read Block/Sector Lock (0x3D) status at `address`.
    pub fn read_block_lock(&mut self, address: u32) -> Result<bool> {
        self.require_inited()?;
        // Address + one data byte, no dummy: the same frame shape as a
        // page program, just read instead of written.
        let template = mode::build_template(
            OperationClass::PageProgram,
            self.interface,
            self.dual_quad,
            self.address_mode,
            self.dummy,
        )?;
        self.maybe_write_ext_addr(template, address)?;
        let mut value = [0u8; 1];
        let request = encoder::encode(template, READ_BLOCK_LOCK, address, 0, &[], &mut value);
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)?;
        Ok(value[0] != 0)
    }

    /// Global Block Lock (0x7E) / Unlock (0x98): protects/unprotects every
    /// sector via Dynamic Protection Bits in one call.
    pub fn set_global_block_lock(&mut self, locked: bool) -> Result<()> {
        self.require_inited()?;
        self.write_enable()?;
        let instruction = if locked {
            GLOBAL_BLOCK_LOCK
        } else {
            GLOBAL_BLOCK_UNLOCK
        };
        self.issue_command(instruction)
    }
}
