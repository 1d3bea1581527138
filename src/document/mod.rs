//! 文档层
//!
//! - `decoder`: 图片解码接口与实现
//! - `layout`: 纯版面计算（方向、缩放、封面坐标）
//! - `writer`: PDF 序列化
//! - `assembler`: 并发解码 + 汇合 + 生成文档

pub mod assembler;
pub mod decoder;
pub mod layout;
pub mod writer;

pub use assembler::{AssembledDocument, DocumentAssembler, PageKind, PageSummary};
pub use decoder::{DecodeError, DecodedImage, Dimensions, ImageDecoder, RustDecoder};
pub use layout::{Orientation, PagePlan};
