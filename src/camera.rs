// Frame sources: the live camera, or a recorded sequence of still frames.
// Both hand out 0x00RRGGBB frame buffers ready for the engine and the window.

use std::path::{Path, PathBuf};

use log::info;

use crate::error::Error;
use crate::types::{FrameBuffer, pack_rgb};

// Bring in nokhwa types for camera control.
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};

use image::RgbImage;

pub trait FrameSource {
    /// Next frame, or `None` once a finite source is exhausted.
    fn next_frame(&mut self) -> Result<Option<FrameBuffer>, Error>;
    fn resolution(&self) -> (u32, u32);
}

/// Pack an RGB image as 0x00RRGGBB pixels.
pub fn frame_from_rgb(img: &RgbImage) -> FrameBuffer {
    let (w, h) = img.dimensions();
    let pixels = img
        .pixels()
        .map(|p| pack_rgb(p.0))
        .collect();
    FrameBuffer { width: w as usize, height: h as usize, pixels }
}

// A small wrapper around nokhwa::Camera so the main loop stays clean.
pub struct CameraCapture {
    cam: Camera,
    width: u32,
    height: u32,
}

impl CameraCapture {
    /// Open camera `index` at a target resolution (falls back if not exact).
    pub fn new(index: u32, width: u32, height: u32) -> Result<Self, Error> {
        let idx = CameraIndex::Index(index);

        let fmt = CameraFormat::new(
            Resolution::new(width, height),
            FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
            30,                // target FPS
        );

        // Ask for RGB frames, closest to our request.
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        let mut cam = Camera::new(idx, req)
            .map_err(|e| Error::CameraInit(format!("Create camera: {e}")))?;

        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("Open stream: {e}")))?;

        // The actual stream might choose a slightly different resolution.
        let actual = cam.resolution();
        info!("camera {} streaming at {}x{}", index, actual.width(), actual.height());

        Ok(Self { cam, width: actual.width(), height: actual.height() })
    }
}

impl FrameSource for CameraCapture {
    /// Blocks until the camera delivers a new frame.
    fn next_frame(&mut self) -> Result<Option<FrameBuffer>, Error> {
        let frame = self
            .cam
            .frame()
            .map_err(|e| Error::CameraFrame(format!("Fetch frame: {e}")))?;

        let rgb_img = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::CameraFrame(format!("Decode RGB: {e}")))?;

        Ok(Some(frame_from_rgb(&rgb_img)))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Recorded input: every decodable image in a directory, in file-name order.
pub struct ImageSequence {
    paths: Vec<PathBuf>,
    next: usize,
    width: u32,
    height: u32,
}

const FRAME_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "ppm"];

impl ImageSequence {
    pub fn open(dir: &Path) -> Result<Self, Error> {
        let listing = std::fs::read_dir(dir).map_err(|source| Error::FrameDir {
            path: dir.display().to_string(),
            source,
        })?;
        let mut paths: Vec<PathBuf> = listing
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            })
            .collect();
        paths.sort();

        let first = paths.first().ok_or_else(|| Error::NoFrames(dir.display().to_string()))?;
        let (width, height) = image::image_dimensions(first).map_err(|source| Error::FrameDecode {
            path: first.display().to_string(),
            source,
        })?;
        info!("{} frames of {}x{} in {}", paths.len(), width, height, dir.display());

        Ok(Self { paths, next: 0, width, height })
    }

    pub fn len(&self) -> usize { self.paths.len() }
    pub fn is_empty(&self) -> bool { self.paths.is_empty() }
}

impl FrameSource for ImageSequence {
    fn next_frame(&mut self) -> Result<Option<FrameBuffer>, Error> {
        let Some(path) = self.paths.get(self.next) else { return Ok(None) };
        self.next += 1;
        let img = image::open(path).map_err(|source| Error::FrameDecode {
            path: path.display().to_string(),
            source,
        })?;
        let frame = frame_from_rgb(&img.to_rgb8());
        if frame.width as u32 != self.width || frame.height as u32 != self.height {
            return Err(Error::FrameSizeMismatch {
                expected: (self.width * self.height) as usize,
                actual: frame.pixels.len(),
            });
        }
        Ok(Some(frame))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn rgb_images_pack_to_frames() {
        let img = RgbImage::from_pixel(2, 1, Rgb([0x12, 0x34, 0x56]));
        let frame = frame_from_rgb(&img);
        assert_eq!(frame.pixels, vec![0x00123456, 0x00123456]);
    }

    #[test]
    fn sequence_plays_frames_in_name_order() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        RgbImage::from_pixel(4, 3, Rgb([255, 0, 0])).save(dir.join("b.png")).unwrap();
        RgbImage::from_pixel(4, 3, Rgb([0, 0, 255])).save(dir.join("a.png")).unwrap();
        std::fs::write(dir.join("notes.txt"), "skip me").unwrap();

        let mut seq = ImageSequence::open(dir).unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.resolution(), (4, 3));
        assert_eq!(seq.next_frame().unwrap().unwrap().pixels[0], 0x000000FF);
        assert_eq!(seq.next_frame().unwrap().unwrap().pixels[0], 0x00FF0000);
        assert!(seq.next_frame().unwrap().is_none());
    }

    #[test]
    fn empty_directory_has_no_frames() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(ImageSequence::open(tmp.path()), Err(Error::NoFrames(_))));
    }
}
