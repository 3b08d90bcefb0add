//! Planar graphics ROM decoding.
//!
//! Characters are 8x8 and sprites 16x16, both 2 bits per pixel with the two bitplanes packed
//! into the high and low nibbles of each ROM byte. Decoding happens once at construction; the
//! draw paths only ever see flat row-major color IDs.

use crate::vdp::RomError;
use std::array;

pub(crate) const CHAR_ROM_BYTES_PER_TILE: usize = 16;
pub(crate) const SPRITE_ROM_BYTES_PER_FRAME: usize = 64;

/// 8x8 tile of 2-bit color IDs, row-major.
pub(crate) type CharTile = [u8; 64];
/// 16x16 sprite frame of 2-bit color IDs, row-major.
pub(crate) type SpriteFrame = [u8; 256];

// Bit offsets of the two planes within an element; the high nibble supplies the high pixel bit
const PLANE_OFFSETS: [usize; 2] = [4, 0];

// Pixel columns 0-3 of each row come from one byte, columns 4-7 from the byte 8 rows later
const CHAR_X_OFFSETS: [usize; 8] = [0, 1, 2, 3, 64, 65, 66, 67];
const CHAR_Y_OFFSETS: [usize; 8] = [0, 8, 16, 24, 32, 40, 48, 56];

// Sprites are stored as four 8x8 quadrants
const SPRITE_X_OFFSETS: [usize; 16] =
    [0, 1, 2, 3, 64, 65, 66, 67, 128, 129, 130, 131, 192, 193, 194, 195];
const SPRITE_Y_OFFSETS: [usize; 16] =
    [0, 8, 16, 24, 32, 40, 48, 56, 256, 264, 272, 280, 288, 296, 304, 312];

// ROM bits are numbered MSB-first within each byte
fn rom_bit(rom: &[u8], bit: usize) -> u8 {
    (rom[bit >> 3] >> (7 - (bit & 7))) & 1
}

fn decode_pixel(rom: &[u8], base_bit: usize, x_offset: usize, y_offset: usize) -> u8 {
    let mut pixel = 0;
    for plane_offset in PLANE_OFFSETS {
        pixel = (pixel << 1) | rom_bit(rom, base_bit + plane_offset + x_offset + y_offset);
    }
    pixel
}

pub(crate) fn decode_char_rom(rom: &[u8]) -> Result<Vec<CharTile>, RomError> {
    if rom.is_empty() || rom.len() % CHAR_ROM_BYTES_PER_TILE != 0 {
        return Err(RomError::CharRom { element: CHAR_ROM_BYTES_PER_TILE, actual: rom.len() });
    }

    Ok((0..rom.len() / CHAR_ROM_BYTES_PER_TILE)
        .map(|code| {
            let base_bit = 8 * CHAR_ROM_BYTES_PER_TILE * code;
            array::from_fn(|pixel| {
                decode_pixel(rom, base_bit, CHAR_X_OFFSETS[pixel % 8], CHAR_Y_OFFSETS[pixel / 8])
            })
        })
        .collect())
}

pub(crate) fn decode_sprite_rom(rom: &[u8]) -> Result<Vec<SpriteFrame>, RomError> {
    if rom.is_empty() || rom.len() % SPRITE_ROM_BYTES_PER_FRAME != 0 {
        return Err(RomError::SpriteRom { element: SPRITE_ROM_BYTES_PER_FRAME, actual: rom.len() });
    }

    Ok((0..rom.len() / SPRITE_ROM_BYTES_PER_FRAME)
        .map(|code| {
            let base_bit = 8 * SPRITE_ROM_BYTES_PER_FRAME * code;
            array::from_fn(|pixel| {
                decode_pixel(
                    rom,
                    base_bit,
                    SPRITE_X_OFFSETS[pixel % 16],
                    SPRITE_Y_OFFSETS[pixel / 16],
                )
            })
        })
        .collect())
}
