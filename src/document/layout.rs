//! 版面计算
//!
//! 全部是纯函数：根据图片尺寸和标题决定有几页、每页的方向、
//! 图片的缩放与居中位置，以及封面文字的坐标。单位为 PDF 点（1/72 英寸），
//! 原点在页面左下角。

use super::decoder::Dimensions;

pub const POINTS_PER_INCH: f32 = 72.0;

/// 基础纸张：US Letter 竖版
pub const LETTER: PageSize = PageSize {
    width: 8.5 * POINTS_PER_INCH,
    height: 11.0 * POINTS_PER_INCH,
};

/// 四边留白 0.5 英寸
pub const MARGIN: f32 = 0.5 * POINTS_PER_INCH;

pub const TITLE_FONT_SIZE: f32 = 36.0;
pub const SUBTITLE_FONT_SIZE: f32 = 14.0;
pub const SUBTITLE_TEXT: &str = "A Coloring Book";
/// 副标题灰度（0 黑 - 1 白）
pub const SUBTITLE_GRAY: f32 = 128.0 / 255.0;
/// 副标题基线位于标题基线下方 0.6 英寸
pub const SUBTITLE_OFFSET: f32 = 0.6 * POINTS_PER_INCH;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// 宽大于高为横版，否则（含正方形）为竖版
    pub fn of(dims: Dimensions) -> Self {
        if dims.is_landscape() {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

/// 纸张尺寸（竖版方向记录）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    /// 按方向返回实际的 (宽, 高)
    pub fn oriented(self, orientation: Orientation) -> (f32, f32) {
        let (short, long) = (self.width.min(self.height), self.width.max(self.height));
        match orientation {
            Orientation::Portrait => (short, long),
            Orientation::Landscape => (long, short),
        }
    }
}

/// 图片在页面上的绘制位置
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

/// 等比缩放到可打印区域内并居中；不拉伸、不裁剪
pub fn fit_centered(page: (f32, f32), image: Dimensions, margin: f32) -> Placement {
    let (page_w, page_h) = page;
    let printable_w = page_w - margin * 2.0;
    let printable_h = page_h - margin * 2.0;

    let scale = (printable_w / image.width as f32).min(printable_h / image.height as f32);
    let width = image.width as f32 * scale;
    let height = image.height as f32 * scale;

    Placement {
        x: (page_w - width) / 2.0,
        y: (page_h - height) / 2.0,
        width,
        height,
        scale,
    }
}

/// 封面文字坐标（基线左端）
#[derive(Debug, Clone, PartialEq)]
pub struct CoverLayout {
    pub title: String,
    pub title_x: f32,
    pub title_y: f32,
    pub subtitle_x: f32,
    pub subtitle_y: f32,
}

pub fn cover_layout(page: (f32, f32), title: &str) -> CoverLayout {
    let (page_w, page_h) = page;
    let center_x = page_w / 2.0;
    let center_y = page_h / 2.0;

    CoverLayout {
        title: title.to_string(),
        title_x: center_x - text_width(title, TITLE_FONT_SIZE) / 2.0,
        title_y: center_y,
        subtitle_x: center_x - text_width(SUBTITLE_TEXT, SUBTITLE_FONT_SIZE) / 2.0,
        subtitle_y: center_y - SUBTITLE_OFFSET,
    }
}

/// 单页规划
#[derive(Debug, Clone, PartialEq)]
pub enum PagePlan {
    Cover {
        size: (f32, f32),
        orientation: Orientation,
        layout: CoverLayout,
    },
    Content {
        size: (f32, f32),
        orientation: Orientation,
        image_index: usize,
        placement: Placement,
    },
}

impl PagePlan {
    pub fn orientation(&self) -> Orientation {
        match self {
            PagePlan::Cover { orientation, .. } | PagePlan::Content { orientation, .. } => {
                *orientation
            }
        }
    }

    pub fn size(&self) -> (f32, f32) {
        match self {
            PagePlan::Cover { size, .. } | PagePlan::Content { size, .. } => *size,
        }
    }
}

fn content_page(dims: Dimensions, image_index: usize) -> PagePlan {
    let orientation = Orientation::of(dims);
    let size = LETTER.oriented(orientation);
    PagePlan::Content {
        size,
        orientation,
        image_index,
        placement: fit_centered(size, dims, MARGIN),
    }
}

/// 规划整本文档
///
/// 文档默认方向取自第一张图片。文档创建时自带一页：
/// 有封面时它就是封面，之后每张图片各自新增一页；
/// 没有封面时第一张图片直接画在这一页上。
/// `title` 需要调用方预先裁剪，空字符串视为无封面。
pub fn plan_document(images: &[Dimensions], title: Option<&str>) -> Vec<PagePlan> {
    let Some(&first) = images.first() else {
        return Vec::new();
    };
    let default_orientation = Orientation::of(first);
    let initial_size = LETTER.oriented(default_orientation);

    let mut pages = Vec::with_capacity(images.len() + 1);
    match title.filter(|t| !t.is_empty()) {
        Some(title) => {
            pages.push(PagePlan::Cover {
                size: initial_size,
                orientation: default_orientation,
                layout: cover_layout(initial_size, title),
            });
            pages.extend(images.iter().enumerate().map(|(i, &d)| content_page(d, i)));
        }
        None => {
            pages.push(PagePlan::Content {
                size: initial_size,
                orientation: default_orientation,
                image_index: 0,
                placement: fit_centered(initial_size, first, MARGIN),
            });
            pages.extend(
                images
                    .iter()
                    .enumerate()
                    .skip(1)
                    .map(|(i, &d)| content_page(d, i)),
            );
        }
    }
    pages
}

/// Helvetica 字宽（AFM，千分之一 em），覆盖 0x20..=0x7E
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Helvetica 字宽，覆盖 Latin-1 补充区 0xA0..=0xFF
const HELVETICA_LATIN1_WIDTHS: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333, // nbsp..'¯'
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611, // '°'..'¿'
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, // 'À'..'Ï'
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, // 'Ð'..'ß'
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278, // 'à'..'ï'
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500, // 'ð'..'ÿ'
];

/// 其余字符在封面上写成 '?'，按 '?' 的宽度计
const FALLBACK_WIDTH: u16 = 556;

/// 文本在 Helvetica 下的排版宽度（点）
pub fn text_width(text: &str, font_size: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| match c as u32 {
            code @ 0x20..=0x7E => HELVETICA_WIDTHS[(code - 0x20) as usize] as u32,
            code @ 0xA0..=0xFF => HELVETICA_LATIN1_WIDTHS[(code - 0xA0) as usize] as u32,
            _ => FALLBACK_WIDTH as u32,
        })
        .sum();
    units as f32 * font_size / 1000.0
}
