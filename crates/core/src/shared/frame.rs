use ndarray::Array2;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
    #[error("pixel buffer has {actual} bytes, expected {expected} for {width}x{height} RGB")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// A single decoded image: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only; the domain layer
/// treats pixel data as opaque apart from the grayscale projection used
/// by detection and fingerprinting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Frame {
    pub const CHANNELS: usize = 3;

    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self, FrameError> {
        let expected = (width as usize) * (height as usize) * Self::CHANNELS;
        if data.len() != expected {
            return Err(FrameError::BufferSize {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// A frame filled with a single colour.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * Self::CHANNELS)
            .collect();
        Self {
            data,
            width,
            height,
        }
    }

    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            data: img.into_raw(),
            width,
            height,
        }
    }

    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.data.clone())
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Copies the rectangle `[x, x + w) × [y, y + h)` into a new frame.
    ///
    /// The rectangle is intersected with the frame bounds first, so the
    /// result may be smaller than requested (or empty).
    pub fn crop(&self, x: i64, y: i64, w: i64, h: i64) -> Frame {
        let x0 = x.clamp(0, self.width as i64) as usize;
        let y0 = y.clamp(0, self.height as i64) as usize;
        let x1 = (x + w).clamp(0, self.width as i64) as usize;
        let y1 = (y + h).clamp(0, self.height as i64) as usize;
        let cw = x1.saturating_sub(x0);
        let ch = y1.saturating_sub(y0);

        let stride = self.width as usize * Self::CHANNELS;
        let mut data = Vec::with_capacity(cw * ch * Self::CHANNELS);
        for row in y0..y0 + ch {
            let start = row * stride + x0 * Self::CHANNELS;
            data.extend_from_slice(&self.data[start..start + cw * Self::CHANNELS]);
        }
        Frame {
            data,
            width: cw as u32,
            height: ch as u32,
        }
    }

    /// Luma projection (ITU-R BT.601 weights) as a `rows × cols` plane.
    pub fn to_gray_plane(&self) -> GrayPlane {
        let rows = self.height as usize;
        let cols = self.width as usize;
        let luma: Vec<u8> = self
            .data
            .chunks_exact(Self::CHANNELS)
            .map(|px| ((px[0] as u32 * 299 + px[1] as u32 * 587 + px[2] as u32 * 114) / 1000) as u8)
            .collect();
        let pixels = Array2::from_shape_vec((rows, cols), luma)
            .unwrap_or_else(|_| Array2::zeros((0, 0)));
        GrayPlane { pixels }
    }
}

/// 8-bit grayscale pixel plane, indexed `[row, col]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayPlane {
    pixels: Array2<u8>,
}

impl GrayPlane {
    pub fn rows(&self) -> usize {
        self.pixels.nrows()
    }

    pub fn cols(&self) -> usize {
        self.pixels.ncols()
    }

    /// Pixel at `(row, col)`, or `None` when outside the plane.
    pub fn get(&self, row: i64, col: i64) -> Option<u8> {
        if row < 0 || col < 0 {
            return None;
        }
        self.pixels.get((row as usize, col as usize)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(w: u32, h: u32) -> Frame {
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                let v = (y * w + x) as u8;
                data.extend_from_slice(&[v, v, v]);
            }
        }
        Frame::new(data, w, h).unwrap()
    }

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2).unwrap();
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.data(), &data[..]);
        assert!(!frame.is_empty());
    }

    #[test]
    fn test_mismatched_data_length_is_rejected() {
        let err = Frame::new(vec![0u8; 10], 2, 2).unwrap_err();
        assert_eq!(
            err,
            FrameError::BufferSize {
                width: 2,
                height: 2,
                expected: 12,
                actual: 10
            }
        );
    }

    #[test]
    fn test_filled_repeats_colour() {
        let frame = Frame::filled(3, 2, [10, 20, 30]);
        assert_eq!(frame.data().len(), 18);
        assert_eq!(&frame.data()[15..18], &[10, 20, 30]);
    }

    #[test]
    fn test_crop_inside_bounds() {
        let frame = gradient_frame(4, 4);
        let crop = frame.crop(1, 1, 2, 2);
        assert_eq!((crop.width(), crop.height()), (2, 2));
        // (row 1, col 1) = 5, (row 2, col 2) = 10
        assert_eq!(crop.data()[0], 5);
        assert_eq!(crop.data()[9], 10);
    }

    #[test]
    fn test_crop_clamps_to_bounds() {
        let frame = gradient_frame(4, 4);
        let crop = frame.crop(-2, -2, 4, 4);
        assert_eq!((crop.width(), crop.height()), (2, 2));
        assert_eq!(crop.data()[0], 0);
    }

    #[test]
    fn test_crop_fully_outside_is_empty() {
        let frame = gradient_frame(4, 4);
        let crop = frame.crop(10, 10, 5, 5);
        assert!(crop.is_empty());
        assert!(crop.data().is_empty());
    }

    #[test]
    fn test_gray_plane_shape_and_luma() {
        let mut data = vec![0u8; 2 * 3 * 3];
        // row 1, col 2 = pure red
        data[(3 + 2) * 3] = 255;
        let frame = Frame::new(data, 3, 2).unwrap();
        let gray = frame.to_gray_plane();
        assert_eq!(gray.rows(), 2);
        assert_eq!(gray.cols(), 3);
        assert_eq!(gray.get(1, 2), Some(76)); // 255 * 0.299
        assert_eq!(gray.get(0, 0), Some(0));
    }

    #[test]
    fn test_gray_plane_get_out_of_bounds() {
        let gray = Frame::filled(2, 2, [1, 1, 1]).to_gray_plane();
        assert_eq!(gray.get(-1, 0), None);
        assert_eq!(gray.get(0, 2), None);
        assert_eq!(gray.get(2, 0), None);
    }

    #[test]
    fn test_rgb_image_roundtrip_dimensions() {
        let frame = gradient_frame(5, 3);
        let img = frame.to_rgb_image().unwrap();
        assert_eq!(img.dimensions(), (5, 3));
        assert_eq!(Frame::from_rgb_image(img), frame);
    }
}
