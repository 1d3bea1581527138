//! PDF 序列化（lopdf）
//!
//! 把 [`PagePlan`] 列表和解码后的像素写成一个 PDF：
//! 每页独立的 MediaBox，图片以 RGB XObject 嵌入，封面文字使用内置 Helvetica。

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

use super::decoder::DecodedImage;
use super::layout::{
    CoverLayout, PagePlan, Placement, SUBTITLE_FONT_SIZE, SUBTITLE_GRAY, SUBTITLE_TEXT,
    TITLE_FONT_SIZE,
};
use crate::error::AssemblyError;

const PRODUCER: &str = concat!("coloring_book ", env!("CARGO_PKG_VERSION"));

fn real(value: f32) -> Object {
    value.into()
}

fn pdf_error(err: lopdf::Error) -> AssemblyError {
    AssemblyError::Pdf(err.to_string())
}

fn io_error(err: std::io::Error) -> AssemblyError {
    AssemblyError::Pdf(err.to_string())
}

/// 转成 WinAnsi 单字节编码；超出 Latin-1 的字符替换为 '?'
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
            _ => b'?',
        })
        .collect()
}

/// 信息字典中的文本：纯 ASCII 直接写，否则用带 BOM 的 UTF-16BE
fn info_text(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

struct PdfWriter {
    doc: Document,
    pages_id: ObjectId,
    font_id: Option<ObjectId>,
    kids: Vec<Object>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            font_id: None,
            kids: Vec::new(),
        }
    }

    fn font(&mut self) -> ObjectId {
        if let Some(id) = self.font_id {
            return id;
        }
        let id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        self.font_id = Some(id);
        id
    }

    fn push_page(
        &mut self,
        size: (f32, f32),
        operations: Vec<Operation>,
        resources: lopdf::Dictionary,
    ) -> Result<(), AssemblyError> {
        let content = Content { operations };
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content.encode().map_err(pdf_error)?));
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![real(0.0), real(0.0), real(size.0), real(size.1)],
            "Contents" => content_id,
            "Resources" => resources,
        });
        self.kids.push(page_id.into());
        Ok(())
    }

    fn add_cover_page(&mut self, size: (f32, f32), layout: &CoverLayout) -> Result<(), AssemblyError> {
        let font_id = self.font();
        let operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), real(TITLE_FONT_SIZE)]),
            Operation::new("Td", vec![real(layout.title_x), real(layout.title_y)]),
            Operation::new(
                "Tj",
                vec![Object::string_literal(encode_win_ansi(&layout.title))],
            ),
            Operation::new("ET", vec![]),
            Operation::new("g", vec![real(SUBTITLE_GRAY)]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), real(SUBTITLE_FONT_SIZE)]),
            Operation::new("Td", vec![real(layout.subtitle_x), real(layout.subtitle_y)]),
            Operation::new("Tj", vec![Object::string_literal(SUBTITLE_TEXT)]),
            Operation::new("ET", vec![]),
            Operation::new("g", vec![real(0.0)]),
        ];
        let resources = dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        };
        self.push_page(size, operations, resources)
    }

    fn add_image_page(
        &mut self,
        size: (f32, f32),
        image: DecodedImage,
        placement: &Placement,
    ) -> Result<(), AssemblyError> {
        let image_id = self.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width as i64,
                "Height" => image.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8i64,
            },
            image.rgb,
        ));
        let operations = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    real(placement.width),
                    real(0.0),
                    real(0.0),
                    real(placement.height),
                    real(placement.x),
                    real(placement.y),
                ],
            ),
            Operation::new("Do", vec!["Im0".into()]),
            Operation::new("Q", vec![]),
        ];
        let resources = dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        };
        self.push_page(size, operations, resources)
    }

    fn finish(mut self, title: Option<&str>) -> Result<Vec<u8>, AssemblyError> {
        let count = self.kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => self.kids,
            "Count" => count,
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut info = dictionary! {
            "Producer" => Object::string_literal(PRODUCER),
            "CreationDate" => Object::string_literal(
                chrono::Local::now().format("D:%Y%m%d%H%M%S").to_string(),
            ),
        };
        if let Some(title) = title {
            info.set("Title", info_text(title));
        }
        let info_id = self.doc.add_object(info);
        self.doc.trailer.set("Info", info_id);

        self.doc.compress();
        let mut bytes = Vec::new();
        self.doc.save_to(&mut bytes).map_err(io_error)?;
        Ok(bytes)
    }
}

/// 按规划写出整个 PDF
///
/// `images` 与输入顺序一致，按 `image_index` 取用；每张图片只使用一次。
pub fn render(
    plan: &[PagePlan],
    images: Vec<DecodedImage>,
    title: Option<&str>,
) -> Result<Vec<u8>, AssemblyError> {
    let mut slots: Vec<Option<DecodedImage>> = images.into_iter().map(Some).collect();
    let mut writer = PdfWriter::new();

    for page in plan {
        match page {
            PagePlan::Cover { size, layout, .. } => writer.add_cover_page(*size, layout)?,
            PagePlan::Content {
                size,
                image_index,
                placement,
                ..
            } => {
                let image = slots
                    .get_mut(*image_index)
                    .and_then(Option::take)
                    .ok_or_else(|| {
                        AssemblyError::Pdf(format!("第 {} 张图片缺失或重复引用", image_index + 1))
                    })?;
                writer.add_image_page(*size, image, placement)?;
            }
        }
    }

    writer.finish(title)
}
