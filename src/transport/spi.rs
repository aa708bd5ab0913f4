//! The degenerate single-SPI transport path: a plain `embedded-hal` SPI
//! bus, one lane on every phase, no QSPI capability at all.

use embedded_hal::spi::{Operation, SpiDevice};

use super::{AddressWidth, CommandRequest, Lanes, Transport};

/// Wraps any [`embedded_hal::spi::SpiDevice`] as a [`Transport`].
///
/// Every phase of every [`CommandRequest`] handed to this adapter must be
/// single-lane (or absent) — the bus underneath genuinely has one data
/// line each direction. A request asking for dual/quad lanes on any phase
/// is a contract violation the mode matrix should never have produced for
/// an SPI-without-dual/quad handle; this adapter reports it as
/// [`SpiTransportError::UnsupportedLaneWidth`] rather than silently
/// degrading it.
pub struct SpiBusTransport<SPI> {
    spi: SPI,
}

impl<SPI> SpiBusTransport<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    pub fn release(self) -> SPI {
        self.spi
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiTransportError<E> {
    Spi(E),
    UnsupportedLaneWidth,
}

fn require_single(lanes: Lanes) -> Result<(), ()> {
    match lanes {
        Lanes::None | Lanes::Single => Ok(()),
        Lanes::Dual | Lanes::Quad => Err(()),
    }
}

impl<SPI> Transport for SpiBusTransport<SPI>
where
    SPI: SpiDevice,
{
    type Error = SpiTransportError<SPI::Error>;

    fn write_read(
        &mut self,
        request: CommandRequest<'_>,
    ) -> core::result::Result<(), Self::Error> {
        require_single(request.instruction_lanes).map_err(|_| SpiTransportError::UnsupportedLaneWidth)?;
        require_single(request.address_lanes).map_err(|_| SpiTransportError::UnsupportedLaneWidth)?;
        require_single(request.alternate_lanes).map_err(|_| SpiTransportError::UnsupportedLaneWidth)?;
        require_single(request.data_lanes).map_err(|_| SpiTransportError::UnsupportedLaneWidth)?;

        // opcode || address (big-endian) || alternate byte || dummy bytes
        let mut header = [0u8; 1 + 4 + 1];
        let mut header_len = 0;

        if !matches!(request.instruction_lanes, Lanes::None) {
            header[header_len] = request.instruction;
            header_len += 1;
        }

        let addr_bytes = request.address_bytes.bytes();
        if addr_bytes > 0 {
            let be = request.address.to_be_bytes();
            header[header_len..header_len + addr_bytes as usize]
                .copy_from_slice(&be[4 - addr_bytes as usize..]);
            header_len += addr_bytes as usize;
        }

        if matches!(request.alternate_bytes, AddressWidth::One) {
            header[header_len] = request.alternate;
            header_len += 1;
        }

        // Dummy cycles are expressed in whole bytes on a single-lane bus.
        let dummy_bytes = (request.dummy_cycles / 8) as usize;

        let mut ops: heapless::Vec<Operation<'_, u8>, 4> = heapless::Vec::new();
        let _ = ops.push(Operation::Write(&header[..header_len]));
        if dummy_bytes > 0 {
            static ZEROES: [u8; 8] = [0u8; 8];
            let _ = ops.push(Operation::Write(&ZEROES[..dummy_bytes.min(8)]));
        }
        if !request.write_buf.is_empty() {
            let _ = ops.push(Operation::Write(request.write_buf));
        }
        if !request.read_buf.is_empty() {
            let _ = ops.push(Operation::Read(request.read_buf));
        }

        self.spi
            .transaction(ops.as_mut_slice())
            .map_err(SpiTransportError::Spi)
    }
}
