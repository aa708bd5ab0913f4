//! A recording mock [`Transport`] backed by an in-memory flash image,
//! used only by this crate's own unit tests.

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::transport::{CommandRequest, Transport};

/// A delay source that doesn't actually wait — keeps unit tests fast
/// regardless of how many busy-wait polls a scenario simulates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDelay;

impl DelayNs for NoopDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// Flash image size for the mock: large enough to exercise a handful of
/// sectors and page-crossing writes without carrying a full 32 MiB array
/// around in test binaries.
pub const MOCK_MEMORY_SIZE: usize = 64 * 1024;

/// Maximum number of opcodes the frame log records before older entries
/// are dropped by further pushes (a `push` past capacity is simply a
/// no-op — see [`MockTransport::write_read`]).
const FRAME_LOG_CAPACITY: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

/// Byte-addressable flash model plus a log of every opcode issued, in
/// order, for asserting end-to-end opcode sequences.
pub struct MockTransport {
    pub memory: [u8; MOCK_MEMORY_SIZE],
    pub jedec_id: u16,
    pub status1: u8,
    pub status2: u8,
    pub status3: u8,
    pub ext_addr_register: u8,
    /// Counts down on every status1 read; while nonzero, status1 reports
    /// BUSY set, so tests can exercise the busy-wait polling loop.
    pub busy_polls_remaining: u32,
    pub frames: Vec<u8, FRAME_LOG_CAPACITY>,
    /// `(address, write_len)` of every page-program (0x02/0x32) frame, in
    /// order — lets tests pin down exactly where the page-splitter cut a
    /// write, not just how many page-programs it issued.
    pub page_programs: Vec<(u32, usize), FRAME_LOG_CAPACITY>,
    pub init_calls: u32,
    pub deinit_calls: u32,
}

impl MockTransport {
    pub fn blank(jedec_id: u16) -> Self {
        Self {
            memory: [0xFFu8; MOCK_MEMORY_SIZE],
            jedec_id,
            status1: 0,
            status2: 0,
            status3: 0,
            ext_addr_register: 0,
            busy_polls_remaining: 0,
            frames: Vec::new(),
            page_programs: Vec::new(),
            init_calls: 0,
            deinit_calls: 0,
        }
    }

    fn index(&self, address: u32) -> usize {
        address as usize % MOCK_MEMORY_SIZE
    }
}

impl Transport for MockTransport {
    type Error = MockError;

    fn init(&mut self) -> Result<(), Self::Error> {
        self.init_calls += 1;
        Ok(())
    }

    fn deinit(&mut self) -> Result<(), Self::Error> {
        self.deinit_calls += 1;
        Ok(())
    }

    fn write_read(&mut self, request: CommandRequest<'_>) -> Result<(), Self::Error> {
        let _ = self.frames.push(request.instruction);

        match request.instruction {
            // Write Enable / Write Disable
            0x06 => self.status1 |= 1 << 1,
            0x04 => self.status1 &= !(1 << 1),

            // Status register reads
            0x05 => {
                let busy = if self.busy_polls_remaining > 0 {
                    self.busy_polls_remaining -= 1;
                    1
                } else {
                    0
                };
                request.read_buf[0] = (self.status1 & !1) | busy;
            }
            0x35 => request.read_buf[0] = self.status2,
            0x15 => request.read_buf[0] = self.status3,

            // Volatile SR write enable — no observable state in the mock.
            0x50 => {}

            // Status register writes
            0x01 => self.status1 = request.write_buf[0],
            0x31 => self.status2 = request.write_buf[0],
            0x11 => self.status3 = request.write_buf[0],

            // Extended Address Register
            0xC5 => self.ext_addr_register = request.write_buf[0],

            // Plain / fast / multi-lane reads: all resolve the same way in
            // the mock, since lane width doesn't change what bytes come
            // back, only how many wire cycles they'd cost on real silicon.
            0x03 | 0x0B | 0x3B | 0x6B | 0xBB | 0xEB | 0xE7 | 0xE3 => {
                let start = self.index(request.address);
                let len = request.read_buf.len();
                request
                    .read_buf
                    .copy_from_slice(&self.memory[start..start + len]);
            }

            // Page program: NOR devices can only clear bits on a program,
            // never set them, so AND rather than overwrite.
            0x02 | 0x32 => {
                let start = self.index(request.address);
                for (i, &b) in request.write_buf.iter().enumerate() {
                    self.memory[start + i] &= b;
                }
                let _ = self
                    .page_programs
                    .push((request.address, request.write_buf.len()));
            }

            // Sector (4K) / block (32K/64K) erase
            0x20 => self.erase_region(request.address, 4 * 1024),
            0x52 => self.erase_region(request.address, 32 * 1024),
            0xD8 => self.erase_region(request.address, 64 * 1024),

            // Security register program / erase / read: modelled on the
            // same backing array as the main memory, which is large enough
            // to cover the 0x1000/0x2000/0x3000 region slots.
            0x42 => {
                let start = self.index(request.address);
                for (i, &b) in request.write_buf.iter().enumerate() {
                    self.memory[start + i] &= b;
                }
            }
            0x44 => self.erase_region(request.address, 256),
            0x48 => {
                let start = self.index(request.address);
                let len = request.read_buf.len();
                request
                    .read_buf
                    .copy_from_slice(&self.memory[start..start + len]);
            }

            // Individual/global block lock/unlock: frame-log only, no
            // observable state in the mock.
            0x36 | 0x39 | 0x7E | 0x98 => {}
            0x3D => request.read_buf[0] = 0,

            // Chip erase
            0xC7 => self.memory.fill(0xFF),

            // Manufacturer/Device ID
            0x90 => {
                let be = self.jedec_id.to_be_bytes();
                request.read_buf[0] = be[0];
                request.read_buf[1] = be[1];
            }

            // JEDEC ID
            0x9F => {
                let be = self.jedec_id.to_be_bytes();
                request.read_buf[0] = be[0];
                request.read_buf[1] = be[1];
                request.read_buf[2] = be[1];
            }

            // Release power-down / reset / QSPI mode-entry/exit / power-down
            // / 3-byte / 4-byte address mode: no observable state change in
            // the mock beyond the frame log itself.
            0xAB | 0x66 | 0x99 | 0x38 | 0xFF | 0xB9 | 0xE9 | 0xB7 | 0x75 | 0x7A => {}

            // Set Read Parameters: accept unconditionally.
            0xC0 => {}

            _ => {}
        }

        Ok(())
    }
}

impl MockTransport {
    fn erase_region(&mut self, address: u32, len: usize) {
        let start = self.index(address);
        self.memory[start..start + len].fill(0xFF);
    }
}
