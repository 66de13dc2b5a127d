mod clock;
mod ffmpeg_source;
mod ffprobe_info;
mod path_validator;
mod video_source;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ffmpeg_source::FfmpegSource;
pub use ffprobe_info::{StreamInfo, probe_stream};
pub use path_validator::{ensure_directory_exists, resolve_source_location};
pub use video_source::{AbortHandle, Frame, FrameReader, VideoSource};
