//! Time Pilot video hardware
//!
//! The board composites a frame in three fixed passes: background tiles of priority category 0,
//! then the sprite layer, then background tiles of category 1. Changing that order changes which
//! layer occludes which, so [`Vdp::render_frame`] never reorders it.
//!
//! The frame buffer holds pen indices rather than RGB; a frontend resolves pens through
//! [`Vdp::pens`] when presenting.

mod gfx;
mod palette;
mod sprites;
mod tilemap;

use crate::vdp::gfx::{CharTile, SpriteFrame};
use crate::vdp::sprites::SpriteTable;
use crate::vdp::tilemap::Tilemap;
use bincode::{Decode, Encode};
use thiserror::Error;
use timepilot_common::frontend::{Color, FrameSize};

pub use palette::PEN_COUNT;

pub const SCREEN_WIDTH: u16 = 256;
pub const SCREEN_HEIGHT: u16 = 256;
pub const FRAME_BUFFER_LEN: usize = SCREEN_WIDTH as usize * SCREEN_HEIGHT as usize;

pub const FRAME_SIZE: FrameSize =
    FrameSize { width: SCREEN_WIDTH as u32, height: SCREEN_HEIGHT as u32 };

/// Which revision of the video board to emulate, selected once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub enum BoardVariant {
    #[default]
    TimePilot,
    /// Identical tile decoding to Time Pilot, but the board has no video enable latch; the
    /// display is always on.
    PowerSurge,
    /// Bootleg rewiring: attribute bits 5-6 extend the character code, the flip lines are not
    /// connected, and tile priority moves to attribute bit 7.
    ChanceKun,
}

impl BoardVariant {
    const fn video_enabled_at_reset(self) -> bool {
        matches!(self, Self::PowerSurge)
    }
}

/// Raw ROM images consumed at construction.
#[derive(Debug, Clone, Copy)]
pub struct VideoRoms<'a> {
    /// Two interleaved 32-byte palette PROMs (64 bytes).
    pub palette_prom: &'a [u8],
    /// Sprite then character color lookup PROMs (384 bytes).
    pub lookup_prom: &'a [u8],
    /// Planar 8x8 character graphics, 16 bytes per character.
    pub char_rom: &'a [u8],
    /// Planar 16x16 sprite graphics, 64 bytes per frame.
    pub sprite_rom: &'a [u8],
}

#[derive(Debug, Error)]
pub enum RomError {
    #[error("palette PROM must be exactly {expected} bytes, got {actual}")]
    PaletteProm { expected: usize, actual: usize },
    #[error("color lookup PROM must be exactly {expected} bytes, got {actual}")]
    LookupProm { expected: usize, actual: usize },
    #[error("character ROM size must be a non-zero multiple of {element} bytes, got {actual}")]
    CharRom { element: usize, actual: usize },
    #[error("sprite ROM size must be a non-zero multiple of {element} bytes, got {actual}")]
    SpriteRom { element: usize, actual: usize },
}

/// Clip rectangle in frame buffer coordinates. All four edges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct ClipRect {
    pub left: u16,
    pub right: u16,
    pub top: u16,
    pub bottom: u16,
}

impl ClipRect {
    /// The full 256x256 pixel buffer.
    pub const FULL: Self =
        Self { left: 0, right: SCREEN_WIDTH - 1, top: 0, bottom: SCREEN_HEIGHT - 1 };

    /// The 256x224 window the monitor actually displays (lines 16-239).
    pub const VISIBLE: Self = Self { left: 0, right: SCREEN_WIDTH - 1, top: 16, bottom: 239 };

    pub(crate) fn contains(self, x: i32, y: i32) -> bool {
        (i32::from(self.left)..=i32::from(self.right)).contains(&x)
            && (i32::from(self.top)..=i32::from(self.bottom)).contains(&y)
    }
}

/// Frame buffer of pen indices (0-127 character pens, 128-383 sprite pens).
///
/// Caller-owned and never serialized; save states only carry the memory the buffer is
/// rendered from.
#[derive(Debug, Clone)]
pub struct FrameBuffer(Box<[u16; FRAME_BUFFER_LEN]>);

impl FrameBuffer {
    #[must_use]
    #[allow(clippy::missing_panics_doc)]
    pub fn new() -> Self {
        Self(vec![0; FRAME_BUFFER_LEN].into_boxed_slice().try_into().unwrap())
    }

    #[inline]
    #[must_use]
    pub fn get(&self, row: u16, col: u16) -> u16 {
        self.0[usize::from(row) * usize::from(SCREEN_WIDTH) + usize::from(col)]
    }

    #[inline]
    pub(crate) fn set(&mut self, row: u16, col: u16, pen: u16) {
        self.0[usize::from(row) * usize::from(SCREEN_WIDTH) + usize::from(col)] = pen;
    }

    /// Fill the whole buffer with a single pen. Rendering never blanks the buffer on its own,
    /// not even while the display is disabled; any clear-to-backdrop policy is the caller's.
    pub fn fill(&mut self, pen: u16) {
        self.0.fill(pen);
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u16]> {
        self.0.chunks_exact(SCREEN_WIDTH.into())
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct Vdp {
    tilemap: Tilemap,
    sprites: SpriteTable,
    pens: Box<[Color; PEN_COUNT]>,
    chars: Vec<CharTile>,
    sprite_frames: Vec<SpriteFrame>,
    video_enabled: bool,
    flip_screen: bool,
    scanline: u8,
}

impl Vdp {
    /// Decode all four ROM images and initialize the video state for the given board revision.
    ///
    /// # Errors
    ///
    /// Returns an error if any ROM image has an invalid size; no partially initialized state is
    /// ever returned.
    pub fn new(variant: BoardVariant, roms: VideoRoms<'_>) -> Result<Self, RomError> {
        let pens = palette::derive_pens(roms.palette_prom, roms.lookup_prom)?;
        let chars = gfx::decode_char_rom(roms.char_rom)?;
        let sprite_frames = gfx::decode_sprite_rom(roms.sprite_rom)?;

        log::debug!(
            "Decoded {} characters and {} sprite frames for {variant:?}",
            chars.len(),
            sprite_frames.len()
        );

        Ok(Self {
            tilemap: Tilemap::new(variant),
            sprites: SpriteTable::new(),
            pens,
            chars,
            sprite_frames,
            video_enabled: variant.video_enabled_at_reset(),
            flip_screen: false,
            scanline: 0,
        })
    }

    /// Write to the tile code plane.
    ///
    /// # Panics
    ///
    /// Panics if `address` is not in 0-1023; the board's address decode cannot produce
    /// out-of-range writes, so one indicates an integration bug.
    pub fn write_videoram(&mut self, address: u16, value: u8) {
        self.tilemap.write_videoram(address, value);
    }

    /// Write to the tile attribute plane.
    ///
    /// # Panics
    ///
    /// Panics if `address` is not in 0-1023.
    pub fn write_colorram(&mut self, address: u16, value: u8) {
        self.tilemap.write_colorram(address, value);
    }

    /// Write to the primary sprite RAM (x positions and graphics codes).
    ///
    /// # Panics
    ///
    /// Panics if `address` is not in 0-63.
    pub fn write_spriteram(&mut self, address: u16, value: u8) {
        self.sprites.write_ram(address, value);
    }

    /// Write to the secondary sprite RAM (colors/flips and y positions).
    ///
    /// # Panics
    ///
    /// Panics if `address` is not in 0-63.
    pub fn write_spriteram2(&mut self, address: u16, value: u8) {
        self.sprites.write_ram2(address, value);
    }

    /// Video enable line. While clear, [`Self::render_frame`] leaves the buffer untouched.
    pub fn set_video_enabled(&mut self, enabled: bool) {
        log::debug!("Video enable set to {enabled}");
        self.video_enabled = enabled;
    }

    #[must_use]
    pub fn video_enabled(&self) -> bool {
        self.video_enabled
    }

    /// Flip screen line. Stored here with the rest of the video state; the orientation
    /// transform itself is applied by the frontend when presenting the buffer, not by the
    /// draw passes.
    pub fn set_flip_screen(&mut self, flip: bool) {
        log::debug!("Flip screen set to {flip}");
        self.flip_screen = flip;
    }

    #[must_use]
    pub fn flip_screen(&self) -> bool {
        self.flip_screen
    }

    /// Called by the timing source as the raster advances.
    pub fn set_scanline(&mut self, line: u8) {
        self.scanline = line;
    }

    /// Current raster line, as read back by the game program.
    #[must_use]
    pub fn scanline(&self) -> u8 {
        self.scanline
    }

    /// Final RGB colors for all 384 pens.
    #[must_use]
    pub fn pens(&self) -> &[Color; PEN_COUNT] {
        &self.pens
    }

    /// Compose one frame into `bitmap`, clipped to `cliprect`.
    ///
    /// The three passes run in fixed order: category 0 tiles, sprites, category 1 tiles.
    /// Sprites therefore cover category 0 tiles and are covered by category 1 tiles.
    pub fn render_frame(&mut self, bitmap: &mut FrameBuffer, cliprect: ClipRect) {
        if !self.video_enabled {
            log::trace!("Video disabled, skipping frame");
            return;
        }

        self.tilemap.draw(bitmap, cliprect, &self.chars, 0);
        self.sprites.draw(bitmap, cliprect, &self.sprite_frames);
        self.tilemap.draw(bitmap, cliprect, &self.chars, 1);
    }
}
