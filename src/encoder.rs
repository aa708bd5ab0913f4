//! A pure function from a [`FrameTemplate`] plus opcode/address/payload
//! to a [`CommandRequest`]. Never touches hardware.

use crate::mode::FrameTemplate;
use crate::transport::{CommandRequest, Lanes};

/// Assemble a [`CommandRequest`] from a resolved template and the
/// per-call opcode/address/alternate/payload.
///
/// `alternate` is only meaningful when `template.alternate_bytes != None`
/// (quad-I/O reads carry a continuous-read mode byte here, conventionally
/// `0xFF` to disable continuous-read mode).
#[allow(clippy::too_many_arguments)]
pub fn encode<'a>(
    template: FrameTemplate,
    instruction: u8,
    address: u32,
    alternate: u8,
    write_buf: &'a [u8],
    read_buf: &'a mut [u8],
) -> CommandRequest<'a> {
    CommandRequest {
        instruction,
        instruction_lanes: template.instruction_lanes,
        address,
        address_lanes: template.address_lanes,
        address_bytes: template.address_bytes,
        alternate,
        alternate_lanes: template.alternate_lanes,
        alternate_bytes: template.alternate_bytes,
        dummy_cycles: template.dummy_cycles,
        write_buf,
        read_buf,
        data_lanes: if matches!(template.data_lanes, Lanes::None) {
            Lanes::None
        } else {
            template.data_lanes
        },
    }
}

/// Bare instruction frame with no address/data (write-enable, reset steps,
/// suspend/resume).
pub fn encode_command(template: FrameTemplate, instruction: u8) -> CommandRequest<'static> {
    CommandRequest {
        instruction,
        instruction_lanes: template.instruction_lanes,
        address: 0,
        address_lanes: Lanes::None,
        address_bytes: crate::transport::AddressWidth::None,
        alternate: 0,
        alternate_lanes: Lanes::None,
        alternate_bytes: crate::transport::AddressWidth::None,
        dummy_cycles: 0,
        write_buf: &[],
        read_buf: &mut [],
        data_lanes: Lanes::None,
    }
}
