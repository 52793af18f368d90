//! Patlite USB signal tower control.

use bytes::{BufMut, Bytes, BytesMut};

use crate::controller::TowerController;
use crate::{Color, Pattern};

/// Length of a light command report.
pub const COMMAND_LEN: usize = 9;

/// Offset of the light setting inside the command report.
const LIGHT_OFFSET: usize = 5;

pub struct Patlite;

impl TowerController for Patlite {
    fn vendor_id(&self) -> u16 {
        0x191A
    }

    fn product_id(&self) -> u16 {
        0x6001
    }

    fn command_bytes(&self, color: Color, pattern: Pattern) -> Bytes {
        let mut buf = BytesMut::with_capacity(COMMAND_LEN);

        // Report ID followed by the fixed command header.
        buf.put_slice(&[0x00, 0x00, 0x00, 0x08, 0x0f]);

        // Light setting.
        buf.put_u8(color_bits(color) | pattern_bits(pattern));

        // Padding.
        buf.put_slice(&[0x00; COMMAND_LEN - LIGHT_OFFSET - 1]);

        buf.freeze()
    }
}

/// Convert color to the high nibble of the light setting.
fn color_bits(color: Color) -> u8 {
    match color {
        Color::Off => 0x00,
        Color::Red => 0x10,
        Color::Green => 0x20,
        Color::Yellow => 0x30,
        Color::Blue => 0x40,
        Color::Purple => 0x50,
        Color::Cyan => 0x60,
        Color::White => 0x70,
    }
}

/// Convert pattern to the low bits of the light setting.
fn pattern_bits(pattern: Pattern) -> u8 {
    match pattern {
        Pattern::Off => 0x00,
        Pattern::Continuous => 0x01,
    }
}
