//! Background tilemap: a 32x32 grid of 8x8 characters over two parallel 1KB RAM planes.
//!
//! Tile attributes are decoded lazily: every RAM write marks its tile dirty, and the decoded
//! attributes are recomputed the next time that tile is drawn. The cache is purely a performance
//! artifact; output is identical to redecoding every tile on every draw.

use crate::vdp::gfx::CharTile;
use crate::vdp::{BoardVariant, ClipRect, FrameBuffer};
use bincode::{Decode, Encode};
use timepilot_common::boxedarray::BoxedByteArray;
use timepilot_common::num::GetBit;

pub(crate) const TILE_RAM_LEN: usize = 32 * 32;

const TILE_SIZE: u16 = 8;
const TILES_PER_ROW: u16 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub(crate) struct TileInfo {
    pub(crate) code: u16,
    pub(crate) color: u8,
    pub(crate) flip_x: bool,
    pub(crate) flip_y: bool,
    pub(crate) category: u8,
}

fn decode_tile(variant: BoardVariant, code: u8, attr: u8) -> TileInfo {
    match variant {
        BoardVariant::TimePilot | BoardVariant::PowerSurge => TileInfo {
            code: u16::from(code) + 8 * u16::from(attr & 0x20),
            color: attr.bits(0..=4),
            flip_x: attr.bit(6),
            flip_y: attr.bit(7),
            category: u8::from(attr.bit(4)),
        },
        // Bootleg board: attribute bits 5-6 extend the character code and nothing ever flips
        BoardVariant::ChanceKun => TileInfo {
            code: u16::from(code) + (u16::from(attr & 0x60) << 3),
            color: attr.bits(0..=4),
            flip_x: false,
            flip_y: false,
            category: u8::from(attr.bit(7)),
        },
    }
}

#[derive(Debug, Clone, Encode, Decode)]
pub(crate) struct Tilemap {
    variant: BoardVariant,
    videoram: BoxedByteArray<TILE_RAM_LEN>,
    colorram: BoxedByteArray<TILE_RAM_LEN>,
    cache: Box<[TileInfo; TILE_RAM_LEN]>,
    dirty: [u64; TILE_RAM_LEN / 64],
}

impl Tilemap {
    pub(crate) fn new(variant: BoardVariant) -> Self {
        Self {
            variant,
            videoram: BoxedByteArray::new(),
            colorram: BoxedByteArray::new(),
            cache: Box::new([TileInfo::default(); TILE_RAM_LEN]),
            // Every tile starts dirty so the first draw decodes the whole grid
            dirty: [u64::MAX; TILE_RAM_LEN / 64],
        }
    }

    pub(crate) fn write_videoram(&mut self, address: u16, value: u8) {
        self.videoram[usize::from(address)] = value;
        self.mark_tile_dirty(address);
    }

    pub(crate) fn write_colorram(&mut self, address: u16, value: u8) {
        self.colorram[usize::from(address)] = value;
        self.mark_tile_dirty(address);
    }

    fn mark_tile_dirty(&mut self, tile: u16) {
        self.dirty[usize::from(tile >> 6)] |= 1 << (tile & 0x3F);
    }

    fn tile_info(&mut self, tile: usize) -> TileInfo {
        let word = tile >> 6;
        if self.dirty[word].bit((tile & 0x3F) as u8) {
            self.cache[tile] = decode_tile(self.variant, self.videoram[tile], self.colorram[tile]);
            self.dirty[word] &= !(1 << (tile & 0x3F));
        }
        self.cache[tile]
    }

    /// Draw every tile of the given priority category that intersects the clip rect.
    ///
    /// Tiles on this layer have no transparent pen; all 64 pixels are written as character
    /// pens (`4 * color + color_id`). Tile RAM is never mutated by drawing.
    pub(crate) fn draw(
        &mut self,
        bitmap: &mut FrameBuffer,
        cliprect: ClipRect,
        chars: &[CharTile],
        category: u8,
    ) {
        for tile_row in cliprect.top / TILE_SIZE..=cliprect.bottom / TILE_SIZE {
            for tile_col in cliprect.left / TILE_SIZE..=cliprect.right / TILE_SIZE {
                let tile = usize::from(TILES_PER_ROW * tile_row + tile_col);
                let info = self.tile_info(tile);
                if info.category != category {
                    continue;
                }

                let char_tile = &chars[usize::from(info.code) % chars.len()];
                let pen_base = 4 * u16::from(info.color);

                for py in 0..TILE_SIZE {
                    let y = TILE_SIZE * tile_row + py;
                    if !(cliprect.top..=cliprect.bottom).contains(&y) {
                        continue;
                    }
                    let src_y = if info.flip_y { 7 - py } else { py };

                    for px in 0..TILE_SIZE {
                        let x = TILE_SIZE * tile_col + px;
                        if !(cliprect.left..=cliprect.right).contains(&x) {
                            continue;
                        }
                        let src_x = if info.flip_x { 7 - px } else { px };

                        let color_id = char_tile[usize::from(8 * src_y + src_x)];
                        bitmap.set(y, x, pen_base + u16::from(color_id));
                    }
                }
            }
        }
    }
}
