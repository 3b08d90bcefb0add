//! Color PROM decoding.
//!
//! The board carries two 32-byte palette PROMs whose outputs drive the RGB guns through resistor
//! ladders, giving 5 non-linearly weighted bits per channel split asymmetrically across the two
//! PROMs. A 384-byte lookup PROM then maps every character and sprite color group entry onto one
//! of the 32 base colors.

use crate::vdp::RomError;
use timepilot_common::frontend::Color;
use timepilot_common::num::GetBit;

pub(crate) const PALETTE_PROM_LEN: usize = 64;

pub(crate) const SPRITE_LOOKUP_LEN: usize = 64 * 4;
pub(crate) const CHAR_LOOKUP_LEN: usize = 32 * 4;
pub(crate) const LOOKUP_PROM_LEN: usize = SPRITE_LOOKUP_LEN + CHAR_LOOKUP_LEN;

/// Character pens occupy indices 0-127, sprite pens 128-383.
pub const PEN_COUNT: usize = CHAR_LOOKUP_LEN + SPRITE_LOOKUP_LEN;
pub(crate) const SPRITE_PEN_BASE: u16 = CHAR_LOOKUP_LEN as u16;

// Resistor ladder weights for the five bits of each channel in ascending bit order
// (1.2kohm, 820ohm, 560ohm, 470ohm, 390ohm). The five weights sum to 0xFF.
const RESISTOR_WEIGHTS: [u16; 5] = [0x19, 0x24, 0x35, 0x40, 0x4D];

fn weighted_channel(bits: [bool; 5]) -> u8 {
    let sum: u16 =
        bits.into_iter().zip(RESISTOR_WEIGHTS).map(|(bit, weight)| u16::from(bit) * weight).sum();
    sum as u8
}

/// Resolve the palette and lookup PROMs into the final 384-entry pen table.
///
/// Pure and deterministic; fails fast if either PROM is not exactly the size the board's address
/// decode expects.
pub(crate) fn derive_pens(
    palette_prom: &[u8],
    lookup_prom: &[u8],
) -> Result<Box<[Color; PEN_COUNT]>, RomError> {
    if palette_prom.len() != PALETTE_PROM_LEN {
        return Err(RomError::PaletteProm {
            expected: PALETTE_PROM_LEN,
            actual: palette_prom.len(),
        });
    }
    if lookup_prom.len() != LOOKUP_PROM_LEN {
        return Err(RomError::LookupProm { expected: LOOKUP_PROM_LEN, actual: lookup_prom.len() });
    }

    // Red and the high green bits come from the second PROM, blue and the low green bits from
    // the first
    let base_colors: [Color; 32] = std::array::from_fn(|i| {
        let low = palette_prom[i];
        let high = palette_prom[i + 32];

        let r = weighted_channel([high.bit(1), high.bit(2), high.bit(3), high.bit(4), high.bit(5)]);
        let g = weighted_channel([high.bit(6), high.bit(7), low.bit(0), low.bit(1), low.bit(2)]);
        let b = weighted_channel([low.bit(3), low.bit(4), low.bit(5), low.bit(6), low.bit(7)]);

        Color::rgb(r, g, b)
    });

    let mut pens = Box::new([Color::default(); PEN_COUNT]);

    let (sprite_lookup, char_lookup) = lookup_prom.split_at(SPRITE_LOOKUP_LEN);
    for (pen, &entry) in pens[SPRITE_PEN_BASE as usize..].iter_mut().zip(sprite_lookup) {
        *pen = base_colors[usize::from(entry & 0x0F)];
    }
    // The character half of the lookup indexes the upper 16 base colors
    for (pen, &entry) in pens[..SPRITE_PEN_BASE as usize].iter_mut().zip(char_lookup) {
        *pen = base_colors[usize::from(entry & 0x0F) + 0x10];
    }

    Ok(pens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resistor_weights() {
        assert_eq!(0x19, weighted_channel([true, false, false, false, false]));
        assert_eq!(0x24, weighted_channel([false, true, false, false, false]));
        assert_eq!(0x35, weighted_channel([false, false, true, false, false]));
        assert_eq!(0x40, weighted_channel([false, false, false, true, false]));
        assert_eq!(0x4D, weighted_channel([false, false, false, false, true]));
        assert_eq!(0xFF, weighted_channel([true; 5]));
    }

    #[test]
    fn channel_bit_layout() {
        let mut palette_prom = [0_u8; PALETTE_PROM_LEN];
        // Base color 0: all 5 red bits, all 5 green bits, all 5 blue bits
        palette_prom[32] = 0b1111_1110;
        palette_prom[0] = 0b1111_1111;

        let lookup_prom = [0_u8; LOOKUP_PROM_LEN];
        let pens = derive_pens(&palette_prom, &lookup_prom).unwrap();

        // Sprite pen 0 (table index 128) maps through lookup entry 0 to base color 0
        assert_eq!(Color::rgb(0xFF, 0xFF, 0xFF), pens[SPRITE_PEN_BASE as usize]);
    }

    #[test]
    fn lookup_halves_and_char_offset() {
        let mut palette_prom = [0_u8; PALETTE_PROM_LEN];
        // Base color 1 red = 0x19 (bit 1 of the second PROM)
        palette_prom[32 + 1] = 0b0000_0010;
        // Base color 17 red = 0x24 (bit 2)
        palette_prom[32 + 17] = 0b0000_0100;

        let mut lookup_prom = [0_u8; LOOKUP_PROM_LEN];
        // First sprite lookup entry and first character lookup entry both select color 1,
        // but the character half is offset into the upper 16 base colors
        lookup_prom[0] = 0x01;
        lookup_prom[SPRITE_LOOKUP_LEN] = 0x01;

        let pens = derive_pens(&palette_prom, &lookup_prom).unwrap();
        assert_eq!(Color::rgb(0x19, 0, 0), pens[SPRITE_PEN_BASE as usize]);
        assert_eq!(Color::rgb(0x24, 0, 0), pens[0]);
    }

    #[test]
    fn deterministic() {
        let palette_prom: Vec<u8> = (0..PALETTE_PROM_LEN as u8).collect();
        let lookup_prom: Vec<u8> = (0..LOOKUP_PROM_LEN).map(|i| (i % 16) as u8).collect();

        let a = derive_pens(&palette_prom, &lookup_prom).unwrap();
        let b = derive_pens(&palette_prom, &lookup_prom).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_wrong_sizes() {
        assert!(matches!(
            derive_pens(&[0; 63], &[0; LOOKUP_PROM_LEN]),
            Err(RomError::PaletteProm { expected: PALETTE_PROM_LEN, actual: 63 })
        ));
        assert!(matches!(
            derive_pens(&[0; PALETTE_PROM_LEN], &[0; 100]),
            Err(RomError::LookupProm { expected: LOOKUP_PROM_LEN, actual: 100 })
        ));
    }
}
