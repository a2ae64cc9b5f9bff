use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbImage};
use log::warn;

use super::Encoding;
use crate::error::{HwError, HwResult};

//size of the descriptor block carried by raw rgb captures
pub const RGB_HEADER_LEN: usize = 54;

/// A captured frame plus the metadata needed to interpret it
#[derive(Debug, Clone, PartialEq)]
pub struct Image{
    data: Vec<u8>,
    width: u32,
    height: u32,
    encoding: Encoding,
    has_header: bool,
}

impl Default for Image{
    fn default() -> Self{
        Image{
            data: Vec::new(),
            width: 0,
            height: 0,
            encoding: Encoding::Png,
            has_header: false,
        }
    }
}

impl Image{
    pub fn new(data: Vec<u8>, width: u32, height: u32, encoding: Encoding, has_header: bool) -> Self{
        Image{ data, width, height, encoding, has_header }
    }

    pub fn data(&self) -> &[u8]{
        &self.data
    }

    pub fn into_data(self) -> Vec<u8>{
        self.data
    }

    pub fn size(&self) -> usize{
        self.data.len()
    }

    pub fn width(&self) -> u32{
        self.width
    }

    pub fn height(&self) -> u32{
        self.height
    }

    pub fn encoding(&self) -> Encoding{
        self.encoding
    }

    /// Encoded formats always keep their container header; only rgb can drop it.
    pub fn has_header(&self) -> bool{
        self.has_header
    }

    fn row_size(&self) -> usize{
        self.width as usize * 3
    }

    fn pixel_len(&self) -> usize{
        self.row_size() * self.height as usize
    }

    /// Write the bytes to disk as they are. png and jpeg images must be saved
    /// under a matching extension; rgb data may use any name.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> HwResult<()>{
        let path = path.as_ref();
        if self.data.is_empty(){
            return Err(HwError::Image("no data to save".to_string()));
        }
        self.check_save_extension(path)?;
        std::fs::write(path, &self.data)?;
        Ok(())
    }

    fn check_save_extension(&self, path: &Path) -> HwResult<()>{
        if self.encoding == Encoding::Rgb{
            return Ok(());
        }
        let ext = match path.extension().and_then(|e| e.to_str()){
            Some(ext) if !ext.is_empty() => ext.to_ascii_lowercase(),
            _ => return Err(HwError::Image(format!("invalid file extension: {}", path.display()))),
        };
        if self.encoding.matches_extension(&ext){
            Ok(())
        }else{
            Err(HwError::Image(format!(
                "file extension .{} does not match {} encoding",
                ext, self.encoding
            )))
        }
    }

    /// Drop the trailing descriptor block from a raw rgb capture, leaving
    /// exactly `width * height * 3` bytes.
    pub fn remove_rgb_header(&mut self){
        if self.encoding != Encoding::Rgb{
            warn!("Abort remove header: only rgb encoded images carry a removable header");
            return;
        }
        if !self.has_header{
            warn!("Abort remove header: header already removed");
            return;
        }
        if self.data.len() <= RGB_HEADER_LEN{
            warn!("Abort remove header: data is too small ({} bytes)", self.data.len());
            return;
        }
        self.data.truncate(self.data.len() - RGB_HEADER_LEN);
        self.has_header = false;
    }

    fn check_flippable(&self, what: &str) -> bool{
        if self.encoding != Encoding::Rgb{
            warn!("Abort {} flip: can only flip rgb encoded images", what);
            return false;
        }
        if self.has_header{
            warn!("Abort {} flip: remove header first", what);
            return false;
        }
        if self.width == 0 || self.height == 0{
            warn!("Abort {} flip: image is {}x{}", what, self.width, self.height);
            return false;
        }
        if self.data.len() < self.pixel_len(){
            warn!(
                "Abort {} flip: {} bytes is smaller than {}x{} rgb",
                what, self.data.len(), self.width, self.height
            );
            return false;
        }
        true
    }

    /// Mirror left to right. Pixels stay in RGB order.
    pub fn flip_rgb_h(&mut self){
        if !self.check_flippable("h"){
            return;
        }
        let row_size = self.row_size();
        let pixel_len = self.pixel_len();
        for row in self.data[..pixel_len].chunks_exact_mut(row_size){
            //reversing the bytes turns RGB into BGR, swap it back per pixel
            row.reverse();
            for px in row.chunks_exact_mut(3){
                px.swap(0, 2);
            }
        }
    }

    /// Mirror top to bottom by swapping whole rows.
    pub fn flip_rgb_v(&mut self){
        if !self.check_flippable("v"){
            return;
        }
        let row_size = self.row_size();
        let rows = self.height as usize;
        for row in 0..rows / 2{
            let bottom = rows - row - 1;
            let (top_half, bottom_half) = self.data.split_at_mut(bottom * row_size);
            top_half[row * row_size..(row + 1) * row_size]
                .swap_with_slice(&mut bottom_half[..row_size]);
        }
    }

    /// View a headerless rgb capture as an `RgbImage`.
    pub fn to_rgb_image(&self) -> HwResult<RgbImage>{
        if self.encoding != Encoding::Rgb || self.has_header{
            return Err(HwError::Image("expected an rgb image with the header removed".to_string()));
        }
        let pixels = self.data[..self.pixel_len().min(self.data.len())].to_vec();
        RgbImage::from_raw(self.width, self.height, pixels).ok_or_else(|| {
            HwError::Image(format!(
                "{} bytes cannot hold a {}x{} rgb image",
                self.data.len(), self.width, self.height
            ))
        })
    }

    /// Decode png or jpeg bytes. Used to verify what the camera produced.
    pub fn decode(&self) -> HwResult<DynamicImage>{
        let format = match self.encoding{
            Encoding::Png => ImageFormat::Png,
            Encoding::Jpeg => ImageFormat::Jpeg,
            Encoding::Rgb => return Ok(DynamicImage::ImageRgb8(self.to_rgb_image()?)),
        };
        Ok(image::load_from_memory_with_format(&self.data, format)?)
    }

    /// Encode a headerless rgb capture as PNG and write it.
    pub fn save_as_png<P: AsRef<Path>>(&self, path: P) -> HwResult<()>{
        let mut buf = Vec::new();
        self.to_rgb_image()?.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        std::fs::write(path, buf)?;
        Ok(())
    }
}
