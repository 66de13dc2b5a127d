//! 亮度縮圖拼貼元件
//!
//! 兩階段流程：
//! A. 計算每張影格的平均亮度，選出最亮的 9 張
//! B. 依亮度由高到低排入最多 3x3 的網格並編碼為 JPEG

mod brightness_ranker;
mod grid_composer;

pub use brightness_ranker::{RankedFrames, frame_brightness, rank_by_brightness};
pub use grid_composer::{
    DEFAULT_JPEG_QUALITY, MAX_GRID_SIDE, MAX_TILES, MosaicError, TILE_SIZE, build_grid,
    compose_mosaic, encode_jpeg, grid_side,
};
