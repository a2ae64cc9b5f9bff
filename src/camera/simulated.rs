use std::io::Cursor;
use std::sync::{Arc, Mutex};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use log::info;

use super::backend::{bmp_to_raw_rgb, CameraBackend};
use super::Encoding;
use crate::config::CameraConfig;
use crate::error::{HwError, HwResult};

/// Counters shared between a `SimulatedCamera` and whoever is watching it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CameraStats{
    pub opens: usize,
    pub grabs: usize,
    pub releases: usize,
}

/// Camera that renders a gradient test pattern instead of reading a sensor.
/// Frames are produced in the same layouts `RpiCamStill` returns.
#[derive(Default)]
pub struct SimulatedCamera{
    stats: Arc<Mutex<CameraStats>>,
    open: bool,
    fail_open: bool,
}

impl SimulatedCamera{
    pub fn new() -> Self{
        Self::default()
    }

    /// Make `open` fail, to exercise error paths
    pub fn failing() -> Self{
        SimulatedCamera{ fail_open: true, ..Default::default() }
    }

    pub fn stats_handle(&self) -> Arc<Mutex<CameraStats>>{
        Arc::clone(&self.stats)
    }

    fn bump(&self, f: impl FnOnce(&mut CameraStats)){
        if let Ok(mut stats) = self.stats.lock(){
            f(&mut stats);
        }
    }
}

/// Red ramps left to right, green ramps top to bottom
pub fn test_pattern(width: u32, height: u32) -> RgbImage{
    RgbImage::from_fn(width, height, |x, y|{
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    })
}

fn encode(img: RgbImage, format: ImageFormat) -> HwResult<Vec<u8>>{
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img).write_to(&mut Cursor::new(&mut buf), format)?;
    Ok(buf)
}

impl CameraBackend for SimulatedCamera{
    fn open(&mut self, _config: &CameraConfig) -> HwResult<()>{
        if self.fail_open{
            return Err(HwError::Camera("simulated camera refused to open".to_string()));
        }
        self.open = true;
        self.bump(|s| s.opens += 1);
        Ok(())
    }

    fn grab(&mut self, config: &CameraConfig) -> HwResult<Vec<u8>>{
        let (w, h) = (config.image_width, config.image_height);
        let pattern = test_pattern(w, h);
        let data = match config.encoding{
            Encoding::Png => encode(pattern, ImageFormat::Png)?,
            Encoding::Jpeg => encode(pattern, ImageFormat::Jpeg)?,
            Encoding::Rgb => bmp_to_raw_rgb(&encode(pattern, ImageFormat::Bmp)?, w, h)?,
        };
        self.bump(|s| s.grabs += 1);
        Ok(data)
    }

    fn release(&mut self){
        if self.open{
            info!("simulated camera released");
        }
        self.open = false;
        self.bump(|s| s.releases += 1);
    }

    fn is_open(&self) -> bool{
        self.open
    }
}

#[cfg(test)]
mod tests{
    use super::*;
    use crate::camera::frame::RGB_HEADER_LEN;

    #[test]
    fn test_png_frame_decodes(){
        let mut cam = SimulatedCamera::new();
        let config = CameraConfig::default();
        cam.open(&config).unwrap();
        let data = cam.grab(&config).unwrap();
        let img = image::load_from_memory(&data).unwrap();
        assert_eq!((img.width(), img.height()), (320, 240));
    }

    #[test]
    fn test_rgb_frame_is_bottom_up(){
        let mut cam = SimulatedCamera::new();
        let config = CameraConfig{ image_width: 4, image_height: 3, encoding: Encoding::Rgb, ..Default::default() };
        let data = cam.grab(&config).unwrap();
        assert_eq!(data.len(), 4 * 3 * 3 + RGB_HEADER_LEN);
        //first stored row is the bottom of the pattern
        let expected = test_pattern(4, 3);
        assert_eq!(&data[..3], &expected.get_pixel(0, 2).0);
    }

    #[test]
    fn test_stats_shared(){
        let mut cam = SimulatedCamera::new();
        let stats = cam.stats_handle();
        let config = CameraConfig::default();
        cam.open(&config).unwrap();
        cam.grab(&config).unwrap();
        cam.release();
        assert_eq!(*stats.lock().unwrap(), CameraStats{ opens: 1, grabs: 1, releases: 1 });
    }

    #[test]
    fn test_failing_open(){
        let mut cam = SimulatedCamera::failing();
        assert!(cam.open(&CameraConfig::default()).is_err());
        assert!(!cam.is_open());
    }
}
