//! Sprite attribute table and compositing.
//!
//! Two parallel 64-byte RAMs hold the sprite attributes. Only the even offsets $10-$3E are wired
//! to the sprite generator, giving 24 slots. Slots are drawn from the highest offset down, so
//! lower offsets end up on top; that iteration order is the only sprite-to-sprite priority the
//! hardware has, and there is no per-slot enable bit.

use crate::vdp::gfx::SpriteFrame;
use crate::vdp::palette::SPRITE_PEN_BASE;
use crate::vdp::{ClipRect, FrameBuffer};
use bincode::{Decode, Encode};
use timepilot_common::num::GetBit;

pub(crate) const SPRITE_RAM_LEN: usize = 64;

const SPRITE_SIZE: i32 = 16;
const FIRST_SLOT_OFFSET: usize = 0x10;
const LAST_SLOT_OFFSET: usize = 0x3E;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Sprite {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) code: u8,
    pub(crate) color: u8,
    pub(crate) flip_x: bool,
    pub(crate) flip_y: bool,
}

#[derive(Debug, Clone, Encode, Decode)]
pub(crate) struct SpriteTable {
    ram: [u8; SPRITE_RAM_LEN],
    ram2: [u8; SPRITE_RAM_LEN],
}

impl SpriteTable {
    pub(crate) fn new() -> Self {
        Self { ram: [0; SPRITE_RAM_LEN], ram2: [0; SPRITE_RAM_LEN] }
    }

    pub(crate) fn write_ram(&mut self, address: u16, value: u8) {
        self.ram[usize::from(address)] = value;
    }

    pub(crate) fn write_ram2(&mut self, address: u16, value: u8) {
        self.ram2[usize::from(address)] = value;
    }

    fn sprite(&self, offset: usize) -> Sprite {
        let attr = self.ram2[offset];
        Sprite {
            x: i32::from(self.ram[offset]),
            // The vertical origin sits at line 241 with the axis inverted
            y: 241 - i32::from(self.ram2[offset + 1]),
            code: self.ram[offset + 1],
            color: attr.bits(0..=5),
            flip_x: !attr.bit(6),
            flip_y: attr.bit(7),
        }
    }

    /// Composite all 24 sprite slots onto the bitmap, back to front.
    ///
    /// Color ID 0 of each sprite's color group is transparent; everything else is written as
    /// sprite pens (`128 + 4 * color + color_id`), clipped to the clip rect.
    pub(crate) fn draw(
        &self,
        bitmap: &mut FrameBuffer,
        cliprect: ClipRect,
        frames: &[SpriteFrame],
    ) {
        for offset in (FIRST_SLOT_OFFSET..=LAST_SLOT_OFFSET).rev().step_by(2) {
            let sprite = self.sprite(offset);
            let frame = &frames[usize::from(sprite.code) % frames.len()];
            let pen_base = SPRITE_PEN_BASE + 4 * u16::from(sprite.color);

            for py in 0..SPRITE_SIZE {
                let y = sprite.y + py;
                let src_y = if sprite.flip_y { 15 - py } else { py };

                for px in 0..SPRITE_SIZE {
                    let x = sprite.x + px;
                    if !cliprect.contains(x, y) {
                        continue;
                    }
                    let src_x = if sprite.flip_x { 15 - px } else { px };

                    let color_id = frame[(16 * src_y + src_x) as usize];
                    if color_id == 0 {
                        continue;
                    }
                    bitmap.set(y as u16, x as u16, pen_base + u16::from(color_id));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_decoding() {
        let mut table = SpriteTable::new();
        table.write_ram(0x10, 0x50);
        table.write_ram(0x11, 0x07);
        table.write_ram2(0x10, 0x00);
        table.write_ram2(0x11, 0x64);

        // Bit 6 clear means flip_x set; y = 241 - 0x64
        assert_eq!(
            Sprite { x: 0x50, y: 177, code: 7, color: 0, flip_x: true, flip_y: false },
            table.sprite(0x10)
        );

        let mut table = SpriteTable::new();
        table.write_ram2(0x3E, 0xFF);
        let sprite = table.sprite(0x3E);
        assert_eq!(0x3F, sprite.color);
        assert!(!sprite.flip_x);
        assert!(sprite.flip_y);
    }

    fn place_sprite(table: &mut SpriteTable, offset: u16, x: u8, y: u8, attr: u8) {
        table.write_ram(offset, x);
        table.write_ram2(offset + 1, (241 - i32::from(y)) as u8);
        table.write_ram2(offset, attr);
    }

    #[test]
    fn lower_offsets_draw_on_top() {
        let frames = vec![[1_u8; 256]];
        let mut table = SpriteTable::new();
        // Two overlapping sprites with different color groups
        place_sprite(&mut table, 0x10, 0, 0, 0x01);
        place_sprite(&mut table, 0x12, 0, 0, 0x02);

        let mut bitmap = FrameBuffer::new();
        table.draw(&mut bitmap, ClipRect::FULL, &frames);

        // Slot $12 draws first, slot $10 overdraws it
        assert_eq!(SPRITE_PEN_BASE + 4 + 1, bitmap.get(0, 0));
    }

    #[test]
    fn color_id_zero_is_transparent() {
        let frames = vec![[0_u8; 256]];
        let mut table = SpriteTable::new();
        place_sprite(&mut table, 0x10, 0, 0, 0x05);

        let mut bitmap = FrameBuffer::new();
        bitmap.fill(0xAAAA);
        table.draw(&mut bitmap, ClipRect::FULL, &frames);

        assert_eq!(0xAAAA, bitmap.get(0, 0));
        assert_eq!(0xAAAA, bitmap.get(15, 15));
    }

    #[test]
    fn clipped_at_buffer_edges() {
        let frames = vec![[1_u8; 256]];
        let mut table = SpriteTable::new();
        // Hangs off the right edge; default slots sit below line 241 and partially off-screen
        place_sprite(&mut table, 0x10, 250, 100, 0x00);

        let mut bitmap = FrameBuffer::new();
        table.draw(&mut bitmap, ClipRect::FULL, &frames);

        assert_eq!(SPRITE_PEN_BASE + 1, bitmap.get(100, 255));
        assert_eq!(SPRITE_PEN_BASE + 1, bitmap.get(100, 250));
        assert_eq!(0, bitmap.get(100, 249));
    }

    #[test]
    fn flip_reverses_source_pixels() {
        let mut frame = [0_u8; 256];
        // Single opaque pixel in the top-left corner
        frame[0] = 2;
        let frames = vec![frame];

        let mut table = SpriteTable::new();
        // flip_x only (bit 6 set clears the inverted flip_x)
        place_sprite(&mut table, 0x10, 0, 0, 0x40);
        let mut bitmap = FrameBuffer::new();
        table.draw(&mut bitmap, ClipRect::FULL, &frames);
        assert_eq!(SPRITE_PEN_BASE + 2, bitmap.get(0, 0));

        // With bit 6 clear the sprite is x-flipped and the pixel lands on the right edge
        place_sprite(&mut table, 0x10, 0, 0, 0x00);
        let mut bitmap = FrameBuffer::new();
        table.draw(&mut bitmap, ClipRect::FULL, &frames);
        assert_eq!(0, bitmap.get(0, 0));
        assert_eq!(SPRITE_PEN_BASE + 2, bitmap.get(0, 15));
    }

    #[test]
    fn all_24_slots_are_drawn() {
        let frames = vec![[1_u8; 256]];
        let mut table = SpriteTable::new();
        // One sprite per slot in a non-overlapping grid, color group = slot index
        for (i, offset) in (FIRST_SLOT_OFFSET..=LAST_SLOT_OFFSET).step_by(2).enumerate() {
            let x = 16 * (i % 16) as u8;
            let y = 48 * (i / 16) as u8;
            place_sprite(&mut table, offset as u16, x, y, i as u8);
        }

        let mut bitmap = FrameBuffer::new();
        table.draw(&mut bitmap, ClipRect::FULL, &frames);

        for i in 0..24_u16 {
            let row = 48 * (i / 16);
            let col = 16 * (i % 16);
            assert_eq!(SPRITE_PEN_BASE + 4 * i + 1, bitmap.get(row, col), "slot {i}");
        }
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn out_of_range_primary_write_panics() {
        let mut table = SpriteTable::new();
        table.write_ram(64, 0);
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn out_of_range_secondary_write_panics() {
        let mut table = SpriteTable::new();
        table.write_ram2(64, 0);
    }
}
