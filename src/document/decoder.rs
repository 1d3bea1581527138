//! 图片解码
//!
//! [`ImageDecoder`] 是文档组装与具体解码实现之间的接缝：
//! 生产环境使用基于 `image` crate 的 [`RustDecoder`]，测试中可以替换为计数 / 模拟实现。
//! 解码在阻塞线程池中执行，因此实现必须是 `Send + Sync`。

use image::{DynamicImage, GenericImageView};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("无法解码图片: {0}")]
    Image(#[from] image::ImageError),
    #[error("图片宽或高为 0")]
    ZeroSize,
    #[error("{0}")]
    Other(String),
}

/// 图片像素尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_landscape(self) -> bool {
        self.width > self.height
    }
}

/// 解码结果：尺寸 + 8 位 RGB 像素（已合成到白底）
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl DecodedImage {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }
}

/// 图片解码接口
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, data: &[u8]) -> Result<DecodedImage, DecodeError>;
}

/// 基于 `image` crate 的解码器（PNG / JPEG / WebP）
#[derive(Debug, Clone, Copy, Default)]
pub struct RustDecoder;

impl ImageDecoder for RustDecoder {
    fn decode(&self, data: &[u8]) -> Result<DecodedImage, DecodeError> {
        let img = image::load_from_memory(data)?;
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(DecodeError::ZeroSize);
        }

        Ok(DecodedImage {
            width,
            height,
            rgb: flatten_onto_white(&img),
        })
    }
}

/// 透明像素按白底合成，避免 RGBA 直接丢 alpha 后变成黑色
fn flatten_onto_white(img: &DynamicImage) -> Vec<u8> {
    if !img.color().has_alpha() {
        return img.to_rgb8().into_raw();
    }

    let rgba = img.to_rgba8();
    let mut out = Vec::with_capacity(rgba.width() as usize * rgba.height() as usize * 3);
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u32;
        for c in [r, g, b] {
            out.push(((c as u32 * alpha + 255 * (255 - alpha)) / 255) as u8);
        }
    }
    out
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// 测试用的伪图片格式：`FAKE` + 宽 + 高 + 延迟毫秒（均为 u32 小端）
    pub fn fake_image(width: u32, height: u32) -> Vec<u8> {
        slow_fake_image(width, height, 0)
    }

    pub fn slow_fake_image(width: u32, height: u32, delay_ms: u32) -> Vec<u8> {
        let mut bytes = b"FAKE".to_vec();
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());
        bytes.extend_from_slice(&delay_ms.to_le_bytes());
        bytes
    }

    /// 生成真实的 PNG 字节
    pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([255, 255, 255]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    /// 解析伪图片格式并统计调用次数的解码器
    #[derive(Default)]
    pub struct CountingDecoder {
        pub calls: AtomicUsize,
    }

    impl CountingDecoder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
        let chunk: [u8; 4] = bytes.get(at..at + 4)?.try_into().ok()?;
        Some(u32::from_le_bytes(chunk))
    }

    impl ImageDecoder for CountingDecoder {
        fn decode(&self, data: &[u8]) -> Result<DecodedImage, DecodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if !data.starts_with(b"FAKE") {
                return RustDecoder.decode(data);
            }
            let width = read_u32(data, 4).ok_or_else(|| DecodeError::Other("截断".into()))?;
            let height = read_u32(data, 8).ok_or_else(|| DecodeError::Other("截断".into()))?;
            let delay = read_u32(data, 12).unwrap_or(0);
            if delay > 0 {
                std::thread::sleep(Duration::from_millis(delay as u64));
            }
            if width == 0 || height == 0 {
                return Err(DecodeError::ZeroSize);
            }
            Ok(DecodedImage {
                width,
                height,
                rgb: vec![255; (width * height * 3) as usize],
            })
        }
    }

    #[test]
    fn decodes_real_png() {
        let decoded = RustDecoder.decode(&png_bytes(8, 6)).unwrap();
        assert_eq!(decoded.dimensions(), Dimensions::new(8, 6));
        assert_eq!(decoded.rgb.len(), 8 * 6 * 3);
    }

    #[test]
    fn rejects_garbage() {
        let err = RustDecoder.decode(b"not an image").unwrap_err();
        assert!(matches!(err, DecodeError::Image(_)));
    }

    #[test]
    fn transparent_pixels_become_white() {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 0, 0]));
        let rgb = flatten_onto_white(&DynamicImage::ImageRgba8(img));
        assert!(rgb.iter().all(|&c| c == 255));
    }

    #[test]
    fn counting_decoder_counts() {
        let decoder = CountingDecoder::new();
        decoder.decode(&fake_image(4, 3)).unwrap();
        decoder.decode(&fake_image(0, 3)).unwrap_err();
        assert_eq!(decoder.call_count(), 2);
    }

    #[test]
    fn landscape_requires_strictly_wider() {
        assert!(Dimensions::new(800, 600).is_landscape());
        assert!(!Dimensions::new(600, 800).is_landscape());
        assert!(!Dimensions::new(500, 500).is_landscape());
    }
}
