//! A pure lookup from (operation class, interface, dual/quad-enable,
//! address mode) to a [`FrameTemplate`] — the single place that decides
//! line-counts, address width and dummy-cycle count for every opcode,
//! rather than scattering that logic across every call site. Nothing
//! here touches the transport; it only ever computes values.

use crate::error::{Error, Result};
use crate::transport::{AddressWidth, Lanes};

/// SPI vs full QSPI bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Interface {
    Spi,
    Qspi,
}

/// Whether dual/quad-lane opcodes are authorised while in SPI mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DualQuad {
    Off,
    On,
}

/// Current address width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressMode {
    ThreeByte,
    FourByte,
}

impl AddressMode {
    pub const fn width(self) -> AddressWidth {
        match self {
            AddressMode::ThreeByte => AddressWidth::Three,
            AddressMode::FourByte => AddressWidth::Four,
        }
    }
}

/// Every distinct command shape this module knows how to template.
///
/// One variant per distinct opcode shape the device exposes, plus a
/// couple of supplemental register operations (lock bits, extended
/// address register) that share an existing shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperationClass {
    /// Status register / extended-address-register / lock-bit byte
    /// transfers: instruction + one data byte, no address phase.
    RegisterByte,
    /// Plain read (0x03).
    ReadData,
    /// Fast read (0x0B).
    FastRead,
    /// Fast read dual output (0x3B).
    FastReadDualOutput,
    /// Fast read quad output (0x6B).
    FastReadQuadOutput,
    /// Fast read dual I/O (0xBB).
    FastReadDualIo,
    /// Fast read quad I/O (0xEB).
    FastReadQuadIo,
    /// Word read quad I/O (0xE7).
    WordReadQuadIo,
    /// Octal word read quad I/O (0xE3).
    OctalWordReadQuadIo,
    /// Page program (0x02).
    PageProgram,
    /// Quad page program (0x32).
    QuadPageProgram,
    /// Sector (4K) / block (32K/64K) / chip erase — share one address
    /// shape; chip erase carries no address at all (handled by the
    /// caller supplying `AddressMode` irrelevant to the opcode).
    Erase,
    /// SFDP, unique ID, security register, dual-IO device ID: SPI-only,
    /// fixed 3-byte address field with 8 dummy cycles.
    SpiOnlyRegister,
}

/// The fully-resolved shape of a command frame, independent of the
/// concrete address/opcode/payload that will be plugged into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameTemplate {
    pub instruction_lanes: Lanes,
    pub address_lanes: Lanes,
    pub address_bytes: AddressWidth,
    pub alternate_lanes: Lanes,
    pub alternate_bytes: AddressWidth,
    pub dummy_cycles: u8,
    pub data_lanes: Lanes,
    /// Q256-in-3-byte-mode address-bearing commands are preceded by a
    /// write-enable + Extended Address Register write.
    pub needs_ext_addr_register: bool,
}

/// Build the frame template for `op` under the given mode state.
///
/// `qspi_quad_io_dummy` is `handle.dummy`: the quad-I/O fast-read dummy
/// count in QSPI mode follows the handle's configured read-parameter
/// dummy count rather than a fixed value.
pub fn build_template(
    op: OperationClass,
    interface: Interface,
    dual_quad: DualQuad,
    addr_mode: AddressMode,
    qspi_quad_io_dummy: u8,
) -> Result<FrameTemplate> {
    use OperationClass::*;

    let ext_addr = matches!(addr_mode, AddressMode::ThreeByte)
        && matches!(
            op,
            ReadData
                | FastRead
                | FastReadDualOutput
                | FastReadQuadOutput
                | FastReadDualIo
                | FastReadQuadIo
                | WordReadQuadIo
                | OctalWordReadQuadIo
                | PageProgram
                | QuadPageProgram
                | Erase
        );

    let template = match (op, interface, dual_quad) {
        // --- Status / extended-address-register / lock-bit byte transfers ---
        (RegisterByte, Interface::Spi, DualQuad::Off) => FrameTemplate {
            instruction_lanes: Lanes::Single,
            address_lanes: Lanes::None,
            address_bytes: AddressWidth::None,
            alternate_lanes: Lanes::None,
            alternate_bytes: AddressWidth::None,
            dummy_cycles: 0,
            data_lanes: Lanes::Single,
            needs_ext_addr_register: false,
        },
        (RegisterByte, Interface::Spi, DualQuad::On) => FrameTemplate {
            instruction_lanes: Lanes::Quad,
            address_lanes: Lanes::None,
            address_bytes: AddressWidth::None,
            alternate_lanes: Lanes::None,
            alternate_bytes: AddressWidth::None,
            dummy_cycles: 0,
            data_lanes: Lanes::Single,
            needs_ext_addr_register: false,
        },
        (RegisterByte, Interface::Qspi, _) => FrameTemplate {
            instruction_lanes: Lanes::Quad,
            address_lanes: Lanes::None,
            address_bytes: AddressWidth::None,
            alternate_lanes: Lanes::None,
            alternate_bytes: AddressWidth::None,
            dummy_cycles: 0,
            data_lanes: Lanes::Quad,
            needs_ext_addr_register: false,
        },

        // --- Plain read (0x03): never valid from QSPI ---
        (ReadData, Interface::Spi, _) => FrameTemplate {
            instruction_lanes: Lanes::Single,
            address_lanes: Lanes::Single,
            address_bytes: addr_mode.width(),
            alternate_lanes: Lanes::None,
            alternate_bytes: AddressWidth::None,
            dummy_cycles: 0,
            data_lanes: Lanes::Single,
            needs_ext_addr_register: ext_addr,
        },
        (ReadData, Interface::Qspi, _) => return Err(Error::UnsupportedInMode),

        // --- Fast read (0x0B) ---
        (FastRead, Interface::Spi, _) => FrameTemplate {
            instruction_lanes: Lanes::Single,
            address_lanes: Lanes::Single,
            address_bytes: addr_mode.width(),
            alternate_lanes: Lanes::None,
            alternate_bytes: AddressWidth::None,
            dummy_cycles: 8,
            data_lanes: Lanes::Single,
            needs_ext_addr_register: ext_addr,
        },
        (FastRead, Interface::Qspi, _) => FrameTemplate {
            instruction_lanes: Lanes::Quad,
            address_lanes: Lanes::Quad,
            address_bytes: addr_mode.width(),
            alternate_lanes: Lanes::None,
            alternate_bytes: AddressWidth::None,
            dummy_cycles: qspi_quad_io_dummy,
            data_lanes: Lanes::Quad,
            needs_ext_addr_register: ext_addr,
        },

        // --- Fast read dual/quad output: SPI + dual/quad only ---
        (FastReadDualOutput, Interface::Spi, DualQuad::On) => FrameTemplate {
            instruction_lanes: Lanes::Single,
            address_lanes: Lanes::Single,
            address_bytes: addr_mode.width(),
            alternate_lanes: Lanes::None,
            alternate_bytes: AddressWidth::None,
            dummy_cycles: 8,
            data_lanes: Lanes::Dual,
            needs_ext_addr_register: ext_addr,
        },
        (FastReadQuadOutput, Interface::Spi, DualQuad::On) => FrameTemplate {
            instruction_lanes: Lanes::Single,
            address_lanes: Lanes::Single,
            address_bytes: addr_mode.width(),
            alternate_lanes: Lanes::None,
            alternate_bytes: AddressWidth::None,
            dummy_cycles: 8,
            data_lanes: Lanes::Quad,
            needs_ext_addr_register: ext_addr,
        },
        (FastReadDualOutput | FastReadQuadOutput, _, _) => return Err(Error::UnsupportedInMode),

        // --- Dual I/O (0xBB): SPI + dual/quad only ---
        (FastReadDualIo, Interface::Spi, DualQuad::On) => FrameTemplate {
            instruction_lanes: Lanes::Dual,
            address_lanes: Lanes::Dual,
            address_bytes: addr_mode.width(),
            alternate_lanes: Lanes::Dual,
            alternate_bytes: AddressWidth::One,
            dummy_cycles: 0,
            data_lanes: Lanes::Dual,
            needs_ext_addr_register: ext_addr,
        },
        (FastReadDualIo, _, _) => return Err(Error::UnsupportedInMode),

        // --- Quad I/O (0xEB): SPI+dualQuad or QSPI ---
        (FastReadQuadIo, Interface::Spi, DualQuad::On) => FrameTemplate {
            instruction_lanes: Lanes::Quad,
            address_lanes: Lanes::Quad,
            address_bytes: addr_mode.width(),
            alternate_lanes: Lanes::Quad,
            alternate_bytes: AddressWidth::One,
            dummy_cycles: 4,
            data_lanes: Lanes::Quad,
            needs_ext_addr_register: ext_addr,
        },
        (FastReadQuadIo, Interface::Qspi, _) => FrameTemplate {
            instruction_lanes: Lanes::Quad,
            address_lanes: Lanes::Quad,
            address_bytes: addr_mode.width(),
            alternate_lanes: Lanes::Quad,
            alternate_bytes: AddressWidth::One,
            dummy_cycles: qspi_quad_io_dummy,
            data_lanes: Lanes::Quad,
            needs_ext_addr_register: ext_addr,
        },
        (FastReadQuadIo, Interface::Spi, DualQuad::Off) => return Err(Error::UnsupportedInMode),

        // --- Word / octal-word quad I/O: SPI+dualQuad only ---
        (WordReadQuadIo, Interface::Spi, DualQuad::On) => FrameTemplate {
            instruction_lanes: Lanes::Quad,
            address_lanes: Lanes::Quad,
            address_bytes: addr_mode.width(),
            alternate_lanes: Lanes::Quad,
            alternate_bytes: AddressWidth::One,
            dummy_cycles: 2,
            data_lanes: Lanes::Quad,
            needs_ext_addr_register: ext_addr,
        },
        (WordReadQuadIo, _, _) => return Err(Error::UnsupportedInMode),
        (OctalWordReadQuadIo, Interface::Spi, DualQuad::On) => FrameTemplate {
            instruction_lanes: Lanes::Quad,
            address_lanes: Lanes::Quad,
            address_bytes: addr_mode.width(),
            alternate_lanes: Lanes::Quad,
            alternate_bytes: AddressWidth::One,
            dummy_cycles: 0,
            data_lanes: Lanes::Quad,
            needs_ext_addr_register: ext_addr,
        },
        (OctalWordReadQuadIo, _, _) => return Err(Error::UnsupportedInMode),

        // --- Page program (0x02) ---
        (PageProgram, Interface::Spi, _) => FrameTemplate {
            instruction_lanes: Lanes::Single,
            address_lanes: Lanes::Single,
            address_bytes: addr_mode.width(),
            alternate_lanes: Lanes::None,
            alternate_bytes: AddressWidth::None,
            dummy_cycles: 0,
            data_lanes: Lanes::Single,
            needs_ext_addr_register: ext_addr,
        },
        (PageProgram, Interface::Qspi, _) => FrameTemplate {
            instruction_lanes: Lanes::Quad,
            address_lanes: Lanes::Quad,
            address_bytes: addr_mode.width(),
            alternate_lanes: Lanes::None,
            alternate_bytes: AddressWidth::None,
            dummy_cycles: 0,
            data_lanes: Lanes::Quad,
            needs_ext_addr_register: ext_addr,
        },

        // --- Quad page program (0x32): SPI+dualQuad only ---
        (QuadPageProgram, Interface::Spi, DualQuad::On) => FrameTemplate {
            instruction_lanes: Lanes::Single,
            address_lanes: Lanes::Single,
            address_bytes: addr_mode.width(),
            alternate_lanes: Lanes::None,
            alternate_bytes: AddressWidth::None,
            dummy_cycles: 0,
            data_lanes: Lanes::Quad,
            needs_ext_addr_register: ext_addr,
        },
        (QuadPageProgram, _, _) => return Err(Error::UnsupportedInMode),

        // --- Sector / block / chip erase ---
        (Erase, Interface::Spi, _) => FrameTemplate {
            instruction_lanes: Lanes::Single,
            address_lanes: Lanes::Single,
            address_bytes: addr_mode.width(),
            alternate_lanes: Lanes::None,
            alternate_bytes: AddressWidth::None,
            dummy_cycles: 0,
            data_lanes: Lanes::None,
            needs_ext_addr_register: ext_addr,
        },
        (Erase, Interface::Qspi, _) => FrameTemplate {
            instruction_lanes: Lanes::Quad,
            address_lanes: Lanes::Quad,
            address_bytes: addr_mode.width(),
            alternate_lanes: Lanes::None,
            alternate_bytes: AddressWidth::None,
            dummy_cycles: 0,
            data_lanes: Lanes::None,
            needs_ext_addr_register: ext_addr,
        },

        // --- SFDP / unique ID / security register / dual-IO device ID ---
        (SpiOnlyRegister, Interface::Spi, _) => FrameTemplate {
            instruction_lanes: Lanes::Single,
            address_lanes: Lanes::Single,
            address_bytes: AddressWidth::Three,
            alternate_lanes: Lanes::None,
            alternate_bytes: AddressWidth::None,
            dummy_cycles: 8,
            data_lanes: Lanes::Single,
            needs_ext_addr_register: false,
        },
        (SpiOnlyRegister, Interface::Qspi, _) => return Err(Error::UnsupportedInMode),
    };

    Ok(template)
}
