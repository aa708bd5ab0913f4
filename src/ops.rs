//! Read variants, program/erase variants, suspend/resume, and the ID
//! reads the lifecycle sequence (and ordinary callers) rely on.

use embedded_hal::delay::DelayNs;

use crate::busy::BusyBudget;
use crate::encoder;
use crate::error::{Error, Result};
use crate::family::{BLOCK_32K_SIZE, BLOCK_64K_SIZE, PAGE_SIZE, SECTOR_SIZE};
use crate::handle::Handle;
use crate::mode::{self, OperationClass};
use crate::transport::Transport;

const READ_DATA: u8 = 0x03;
const FAST_READ: u8 = 0x0B;
const FAST_READ_DUAL_OUTPUT: u8 = 0x3B;
const FAST_READ_QUAD_OUTPUT: u8 = 0x6B;
const FAST_READ_DUAL_IO: u8 = 0xBB;
const FAST_READ_QUAD_IO: u8 = 0xEB;
const WORD_READ_QUAD_IO: u8 = 0xE7;
const OCTAL_WORD_READ_QUAD_IO: u8 = 0xE3;
const PAGE_PROGRAM: u8 = 0x02;
const QUAD_PAGE_PROGRAM: u8 = 0x32;
const SECTOR_ERASE_4K: u8 = 0x20;
const BLOCK_ERASE_32K: u8 = 0x52;
const BLOCK_ERASE_64K: u8 = 0xD8;
const CHIP_ERASE: u8 = 0xC7;
const ERASE_PROGRAM_SUSPEND: u8 = 0x75;
const ERASE_PROGRAM_RESUME: u8 = 0x7A;
const READ_MANUFACTURER_DEVICE_ID: u8 = 0x90;
const READ_JEDEC_ID: u8 = 0x9F;

/// Continuous-read mode byte carried in the alternate phase of quad-I/O
/// reads; `0xFF` disables continuous-read mode.
const QUAD_IO_ALTERNATE: u8 = 0xFF;

impl<T, D> Handle<T, D>
where
    T: Transport,
    D: DelayNs,
{
    fn template_for(&self, op: OperationClass) -> Result<mode::FrameTemplate> {
        mode::build_template(
            op,
            self.interface,
            self.dual_quad,
            self.address_mode,
            self.dummy,
        )
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    /// Plain read (0x03): no dummy cycles, lowest max clock. Deliberately
    /// kept distinct from `fast_read` rather than folded together — this
    /// is the low-frequency-safe path, not dead code.
    pub fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        self.require_inited()?;
        let template = self.template_for(OperationClass::ReadData)?;
        self.maybe_write_ext_addr(template, address)?;
        let request = encoder::encode(template, READ_DATA, address, 0, &[], buf);
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)
    }

    /// Fast read (0x0B): 8 dummy cycles on every SPI path, `self.dummy`
    /// cycles on QSPI.
    pub fn fast_read(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        self.require_inited()?;
        let template = self.template_for(OperationClass::FastRead)?;
        self.maybe_write_ext_addr(template, address)?;
        let request = encoder::encode(template, FAST_READ, address, 0, &[], buf);
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)
    }

    /// Fast read dual output (0x3B): dual/quad-enabled SPI only.
    pub fn fast_read_dual_output(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        self.require_inited()?;
        let template = self.template_for(OperationClass::FastReadDualOutput)?;
        self.maybe_write_ext_addr(template, address)?;
        let request = encoder::encode(template, FAST_READ_DUAL_OUTPUT, address, 0, &[], buf);
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)
    }

    /// Fast read quad output (0x6B): dual/quad-enabled SPI only.
    pub fn fast_read_quad_output(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        self.require_inited()?;
        let template = self.template_for(OperationClass::FastReadQuadOutput)?;
        self.maybe_write_ext_addr(template, address)?;
        let request = encoder::encode(template, FAST_READ_QUAD_OUTPUT, address, 0, &[], buf);
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)
    }

    /// Fast read dual I/O (0xBB): dual/quad-enabled SPI only.
    pub fn fast_read_dual_io(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        self.require_inited()?;
        let template = self.template_for(OperationClass::FastReadDualIo)?;
        self.maybe_write_ext_addr(template, address)?;
        let request =
            encoder::encode(template, FAST_READ_DUAL_IO, address, QUAD_IO_ALTERNATE, &[], buf);
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)
    }

    /// Fast read quad I/O (0xEB): dual/quad-enabled SPI or QSPI. In QSPI
    /// mode the dummy count is `self.dummy`, not a fixed value — the
    /// caller is responsible for keeping it consistent with whatever the
    /// device's read-parameters register is actually configured to.
    pub fn fast_read_quad_io(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        self.require_inited()?;
        let template = self.template_for(OperationClass::FastReadQuadIo)?;
        self.maybe_write_ext_addr(template, address)?;
        let request =
            encoder::encode(template, FAST_READ_QUAD_IO, address, QUAD_IO_ALTERNATE, &[], buf);
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)
    }

    /// Word read quad I/O (0xE7): requires a 2-byte-aligned address.
    pub fn word_read_quad_io(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        self.require_inited()?;
        if address % 2 != 0 {
            return Err(Error::InvalidAddress);
        }
        let template = self.template_for(OperationClass::WordReadQuadIo)?;
        self.maybe_write_ext_addr(template, address)?;
        let request = encoder::encode(
            template,
            WORD_READ_QUAD_IO,
            address,
            QUAD_IO_ALTERNATE,
            &[],
            buf,
        );
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)
    }

    /// Octal word read quad I/O (0xE3): requires a 16-byte-aligned address.
    pub fn octal_word_read_quad_io(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        self.require_inited()?;
        if address % 16 != 0 {
            return Err(Error::InvalidAddress);
        }
        let template = self.template_for(OperationClass::OctalWordReadQuadIo)?;
        self.maybe_write_ext_addr(template, address)?;
        let request = encoder::encode(
            template,
            OCTAL_WORD_READ_QUAD_IO,
            address,
            QUAD_IO_ALTERNATE,
            &[],
            buf,
        );
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)
    }

    // ---------------------------------------------------------------
    // Program
    // ---------------------------------------------------------------

    /// Page program (0x02/0x32 by interface): `address` must be
    /// page-aligned and `data.len() <= 256`. Sequence: write-enable,
    /// optional extended-address-register prefix, opcode+address+data,
    /// busy-wait(3 ms).
    pub fn page_program(&mut self, address: u32, data: &[u8]) -> Result<()> {
        self.require_inited()?;
        if address as usize % PAGE_SIZE != 0 {
            return Err(Error::InvalidAddress);
        }
        if data.len() > PAGE_SIZE {
            return Err(Error::InvalidLength);
        }
        let template = self.template_for(OperationClass::PageProgram)?;
        self.write_enable()?;
        self.maybe_write_ext_addr(template, address)?;
        let mut empty: [u8; 0] = [];
        let request = encoder::encode(template, PAGE_PROGRAM, address, 0, data, &mut empty);
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)?;
        self.wait_until_ready(BusyBudget::PAGE_PROGRAM)
    }

    /// Quad page program (0x32): dual/quad-enabled SPI only, data on 4
    /// lanes, address/instruction stay single-lane.
    pub fn quad_page_program(&mut self, address: u32, data: &[u8]) -> Result<()> {
        self.require_inited()?;
        if address as usize % PAGE_SIZE != 0 {
            return Err(Error::InvalidAddress);
        }
        if data.len() > PAGE_SIZE {
            return Err(Error::InvalidLength);
        }
        let template = self.template_for(OperationClass::QuadPageProgram)?;
        self.write_enable()?;
        self.maybe_write_ext_addr(template, address)?;
        let mut empty: [u8; 0] = [];
        let request = encoder::encode(template, QUAD_PAGE_PROGRAM, address, 0, data, &mut empty);
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)?;
        self.wait_until_ready(BusyBudget::PAGE_PROGRAM)
    }

    // ---------------------------------------------------------------
    // Erase
    // ---------------------------------------------------------------

    fn erase(&mut self, instruction: u8, address: u32, budget: BusyBudget) -> Result<()> {
        let template = self.template_for(OperationClass::Erase)?;
        self.write_enable()?;
        self.maybe_write_ext_addr(template, address)?;
        let mut empty: [u8; 0] = [];
        let request = encoder::encode(template, instruction, address, 0, &[], &mut empty);
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)?;
        self.wait_until_ready(budget)
    }

    /// Sector erase (4 KiB, 0x20): `address` must be 4 KiB-aligned.
    pub fn erase_sector_4k(&mut self, address: u32) -> Result<()> {
        self.require_inited()?;
        if address as usize % SECTOR_SIZE != 0 {
            return Err(Error::InvalidAddress);
        }
        self.erase(SECTOR_ERASE_4K, address, BusyBudget::SECTOR_ERASE)
    }

    /// Block erase (32 KiB, 0x52): `address` must be 32 KiB-aligned.
    pub fn erase_block_32k(&mut self, address: u32) -> Result<()> {
        self.require_inited()?;
        if address as usize % BLOCK_32K_SIZE != 0 {
            return Err(Error::InvalidAddress);
        }
        self.erase(BLOCK_ERASE_32K, address, BusyBudget::BLOCK_ERASE_32K)
    }

    /// Block erase (64 KiB, 0xD8): `address` must be 64 KiB-aligned.
    pub fn erase_block_64k(&mut self, address: u32) -> Result<()> {
        self.require_inited()?;
        if address as usize % BLOCK_64K_SIZE != 0 {
            return Err(Error::InvalidAddress);
        }
        self.erase(BLOCK_ERASE_64K, address, BusyBudget::BLOCK_ERASE_64K)
    }

    /// Chip erase (0xC7): write-enable, opcode, busy-wait up to 400 s.
    pub fn erase_chip(&mut self) -> Result<()> {
        self.require_inited()?;
        let template = self.template_for(OperationClass::Erase)?;
        self.write_enable()?;
        let request = encoder::encode_command(template, CHIP_ERASE);
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)?;
        self.wait_until_ready(BusyBudget::CHIP_ERASE)
    }

    // ---------------------------------------------------------------
    // Suspend / resume
    // ---------------------------------------------------------------

    /// Suspend an in-progress program/erase (0x75). No busy-wait: the
    /// device's transition isn't observable through status1 alone.
    /// Returns `Ok(())` uniformly regardless of interface.
    pub fn suspend(&mut self) -> Result<()> {
        self.require_inited()?;
        let template = self.template_for(OperationClass::RegisterByte)?;
        let request = encoder::encode_command(template, ERASE_PROGRAM_SUSPEND);
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)
    }

    /// Resume a suspended program/erase (0x7A). No busy-wait.
    pub fn resume(&mut self) -> Result<()> {
        self.require_inited()?;
        let template = self.template_for(OperationClass::RegisterByte)?;
        let request = encoder::encode_command(template, ERASE_PROGRAM_RESUME);
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)
    }

    // ---------------------------------------------------------------
    // Identity
    // ---------------------------------------------------------------

    /// Read Manufacturer/Device ID (0x90): returns the 2-byte
    /// {manufacturer, device} pair the lifecycle sequence checks against
    /// the configured family. Unlike 0x9F/0x4B/0x48, this opcode is valid
    /// from both SPI and QSPI — it shares the address+data, zero-dummy
    /// frame shape of a page program rather than the SPI-only register
    /// template.
    pub(crate) fn read_manufacturer_device_id(&mut self) -> Result<[u8; 2]> {
        let template = self.template_for(OperationClass::PageProgram)?;
        let mut id = [0u8; 2];
        let request = encoder::encode(template, READ_MANUFACTURER_DEVICE_ID, 0, 0, &[], &mut id);
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)?;
        Ok(id)
    }

    /// Read JEDEC ID (0x9F): {manufacturer, memory type, capacity},
    /// SPI-mode only.
    pub fn read_jedec_id(&mut self) -> Result<[u8; 3]> {
        self.require_inited()?;
        let template = self.template_for(OperationClass::SpiOnlyRegister)?;
        let mut id = [0u8; 3];
        let request = encoder::encode(template, READ_JEDEC_ID, 0, 0, &[], &mut id);
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)?;
        Ok(id)
    }
}
