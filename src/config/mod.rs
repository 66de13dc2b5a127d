pub mod load;
pub mod save;
pub mod types;

pub use save::save_settings;
pub use types::{DEFAULT_SETTINGS_PATH, FfmpegSettings, Settings};
