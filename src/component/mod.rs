//! 功能元件模組
//!
//! 每個子模組實現一個獨立的功能，包含主要邏輯和專用工具

pub mod stream_manager;
pub mod thumbnail_mosaic;

pub use stream_manager::StreamManager;
