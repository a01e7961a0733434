// Crate error type. Every variant states *where* things went wrong.
// Degenerate strokes and shapes are not errors: they are dropped silently.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("window init error: {0}")]
    WindowInit(String),   // Creating the window failed
    #[error("window update error: {0}")]
    WindowUpdate(String), // Updating the window buffer failed
    #[error("camera init error: {0}")]
    CameraInit(String),   // Opening/starting the camera failed
    #[error("camera frame error: {0}")]
    CameraFrame(String),  // Grabbing/decoding a frame failed
    #[error("cannot decode frame {path}: {source}")]
    FrameDecode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("cannot list frames in {path}: {source}")]
    FrameDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no frames found in {0}")]
    NoFrames(String),
    #[error("empty frame")]
    EmptyFrame,
    #[error("frame has {actual} pixels, expected {expected}")]
    FrameSizeMismatch { expected: usize, actual: usize },
}
