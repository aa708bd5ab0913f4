//! Partitions an arbitrary-length write into 4 KiB-aligned chunks, erasing
//! a sector only when the bytes it is about to overwrite aren't already
//! blank, and always programs through the 256-byte page splitter so every
//! page-program call stays page-aligned with a payload of at most 256
//! bytes.

use embedded_hal::delay::DelayNs;

use crate::encoder;
use crate::error::{Error, Result};
use crate::family::{PAGE_SIZE, SECTOR_SIZE};
use crate::handle::Handle;
use crate::mode::{self, OperationClass};
use crate::transport::Transport;

const FAST_READ: u8 = 0x0B;
const ERASED_BYTE: u8 = 0xFF;

impl<T, D> Handle<T, D>
where
    T: Transport,
    D: DelayNs,
{
    /// Write `data` at `addr`, erasing only the sectors that actually need
    /// it. No rollback on failure: a sector may be left partially
    /// programmed if a step fails partway through — the caller owns
    /// higher-level atomicity.
    pub fn write(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        self.require_inited()?;

        let mut offset = 0usize;
        while offset < data.len() {
            let abs_addr = addr as usize + offset;
            let sector_base = abs_addr & !(SECTOR_SIZE - 1);
            let sector_offset = abs_addr - sector_base;
            let chunk_len = (SECTOR_SIZE - sector_offset).min(data.len() - offset);
            let chunk = &data[offset..offset + chunk_len];

            self.read_sector_into_staging(sector_base as u32)?;

            let span = &self.sector_buf[sector_offset..sector_offset + chunk_len];
            let already_blank = span.iter().all(|&b| b == ERASED_BYTE);

            if already_blank {
                self.program_slice(abs_addr as u32, chunk)?;
            } else {
                self.erase_sector_4k(sector_base as u32)?;
                self.sector_buf[sector_offset..sector_offset + chunk_len].copy_from_slice(chunk);
                self.program_staging_sector(sector_base as u32)?;
            }

            offset += chunk_len;
        }

        Ok(())
    }

    /// Read one 4 KiB sector into `self.sector_buf[..SECTOR_SIZE]`.
    ///
    /// Implemented as a direct field-split read rather than calling
    /// `self.fast_read(sector_base, &mut self.sector_buf[..])` — the
    /// latter would need to borrow all of `self` (the method receiver)
    /// and `self.sector_buf` (the argument) at once, which the borrow
    /// checker rejects even though the two borrows the call actually
    /// performs (`self.transport`, `self.sector_buf`) are disjoint fields.
    fn read_sector_into_staging(&mut self, sector_base: u32) -> Result<()> {
        let template = mode::build_template(
            OperationClass::FastRead,
            self.interface,
            self.dual_quad,
            self.address_mode,
            self.dummy,
        )?;
        if template.needs_ext_addr_register {
            self.write_extended_address_register((sector_base >> 24) as u8)?;
        }
        let request = encoder::encode(
            template,
            FAST_READ,
            sector_base,
            0,
            &[],
            &mut self.sector_buf[..SECTOR_SIZE],
        );
        self.transport
            .write_read(request)
            .map_err(|_| Error::TransportFailure)
    }

    /// The page-crossing splitter: walks `data`, at each step programming
    /// `min(len, 256 - (addr mod 256))` bytes before advancing, so every
    /// emitted page-program call is page-aligned with a payload of at most
    /// 256 bytes.
    fn program_slice(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        let mut addr = addr;
        let mut offset = 0usize;
        while offset < data.len() {
            let remain = PAGE_SIZE - (addr as usize % PAGE_SIZE);
            let len = remain.min(data.len() - offset);
            self.page_program(addr, &data[offset..offset + len])?;
            addr += len as u32;
            offset += len;
        }
        Ok(())
    }

    /// Program the full staged 4 KiB sector back, page by page. Copies
    /// each page into a 256-byte stack scratch buffer first, since
    /// `page_program` needs `&mut self` while the source data lives in
    /// `self.sector_buf` (same aliasing constraint as
    /// `read_sector_into_staging`, resolved here by copying instead of
    /// splitting borrows, since the call itself cannot be split).
    fn program_staging_sector(&mut self, sector_base: u32) -> Result<()> {
        let mut addr = sector_base;
        let mut offset = 0usize;
        while offset < SECTOR_SIZE {
            let remain = PAGE_SIZE - (addr as usize % PAGE_SIZE);
            let len = remain.min(SECTOR_SIZE - offset);
            let mut page = [0u8; PAGE_SIZE];
            page[..len].copy_from_slice(&self.sector_buf[offset..offset + len]);
            self.page_program(addr, &page[..len])?;
            addr += len as u32;
            offset += len;
        }
        Ok(())
    }
}
