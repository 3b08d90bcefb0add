//! Video hardware emulation core for Konami's Time Pilot arcade board
//!
//! The board generates a 256x256 raster from a 32x32 background tilemap of 8x8 characters and
//! twenty-four 16x16 sprites, with colors resolved through resistor-ladder palette PROMs. This crate
//! reconstructs the visible frame from the memory-mapped video state; CPU emulation and frame
//! timing live with the host.

mod vdp;

pub use vdp::{
    BoardVariant, ClipRect, FrameBuffer, RomError, Vdp, VideoRoms, FRAME_BUFFER_LEN, FRAME_SIZE,
    PEN_COUNT, SCREEN_HEIGHT, SCREEN_WIDTH,
};
