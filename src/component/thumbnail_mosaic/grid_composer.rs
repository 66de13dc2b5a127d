use crate::tools::Frame;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use log::debug;
use std::borrow::Borrow;
use thiserror::Error;

/// 每格縮圖尺寸（正方形）
pub const TILE_SIZE: u32 = 300;
/// 最多 3x3 = 9 格
pub const MAX_GRID_SIDE: u32 = 3;
pub const MAX_TILES: usize = (MAX_GRID_SIDE * MAX_GRID_SIDE) as usize;

pub const DEFAULT_JPEG_QUALITY: u8 = 95;

#[derive(Debug, Error)]
pub enum MosaicError {
    #[error("JPEG encode failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// 網格邊長：`clamp(ceil(sqrt(count)), 1, 3)`
#[must_use]
pub fn grid_side(count: usize) -> u32 {
    let mut side: usize = 1;
    while side < MAX_GRID_SIDE as usize && side * side < count {
        side += 1;
    }
    side as u32
}

/// 將影格依序（左上開始，先列後行）貼到黑色畫布上
///
/// 只取前 9 張；每張強制縮放為 300x300，不保持比例。
pub fn build_grid<F: Borrow<Frame>>(frames: &[F]) -> Frame {
    let count = frames.len().min(MAX_TILES);
    let side = grid_side(count);
    let mut canvas = Frame::new(side * TILE_SIZE, side * TILE_SIZE);

    debug!("建立 {side}x{side} 網格，共 {count} 張影格");

    for (i, frame) in frames.iter().take(count).enumerate() {
        let tile = imageops::resize(frame.borrow(), TILE_SIZE, TILE_SIZE, FilterType::Triangle);
        let row = i as u32 / side;
        let col = i as u32 % side;
        imageops::replace(
            &mut canvas,
            &tile,
            i64::from(col * TILE_SIZE),
            i64::from(row * TILE_SIZE),
        );
    }

    canvas
}

pub fn encode_jpeg(canvas: &Frame, quality: u8) -> Result<Vec<u8>, MosaicError> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100)).encode_image(canvas)?;
    Ok(buffer)
}

/// 建立網格並編碼為 JPEG
pub fn compose_mosaic<F: Borrow<Frame>>(frames: &[F], quality: u8) -> Result<Vec<u8>, MosaicError> {
    encode_jpeg(&build_grid(frames), quality)
}
