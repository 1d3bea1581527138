//! 文档组装器
//!
//! 流程：并发解码全部图片 → 汇合 → 版面规划 → 写出 PDF。
//! 任意一张图片解码失败，整个组装失败，不会产生残缺文档。
//! 产物 [`AssembledDocument`] 持有共享字节，可以被多次导出而无需重新解码。

use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info};

use super::decoder::{DecodedImage, ImageDecoder, RustDecoder};
use super::layout::{self, Orientation, PagePlan};
use super::writer;
use crate::error::AssemblyError;
use crate::models::EncodedImage;

/// 页面类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Cover,
    Content { image_index: usize },
}

/// 已生成文档中单页的摘要
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSummary {
    pub kind: PageKind,
    pub orientation: Orientation,
}

/// 组装完成的 PDF
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    bytes: Arc<[u8]>,
    pages: Vec<PageSummary>,
}

impl AssembledDocument {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn pages(&self) -> &[PageSummary] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn has_cover(&self) -> bool {
        matches!(
            self.pages.first(),
            Some(PageSummary {
                kind: PageKind::Cover,
                ..
            })
        )
    }

    /// 内容页的方向（不含封面）
    pub fn content_orientations(&self) -> Vec<Orientation> {
        self.pages
            .iter()
            .filter(|p| matches!(p.kind, PageKind::Content { .. }))
            .map(|p| p.orientation)
            .collect()
    }
}

/// 文档组装器
pub struct DocumentAssembler {
    decoder: Arc<dyn ImageDecoder>,
}

impl DocumentAssembler {
    pub fn new() -> Self {
        Self::with_decoder(Arc::new(RustDecoder))
    }

    /// 使用自定义解码器（测试中用于统计解码次数）
    pub fn with_decoder(decoder: Arc<dyn ImageDecoder>) -> Self {
        Self { decoder }
    }

    /// 组装文档
    ///
    /// # 参数
    /// - `images`: 按打印顺序排列的页面图片
    /// - `title`: 书名，裁剪后非空时生成封面
    pub async fn assemble(
        &self,
        images: &[EncodedImage],
        title: Option<&str>,
    ) -> Result<AssembledDocument, AssemblyError> {
        if images.is_empty() {
            return Err(AssemblyError::EmptyBook);
        }
        let title = title.map(str::trim).filter(|t| !t.is_empty());

        info!("📄 开始组装文档: {} 张图片, 封面: {}", images.len(), title.is_some());

        let decoded = self.decode_all(images).await?;
        let dims: Vec<_> = decoded.iter().map(DecodedImage::dimensions).collect();

        let plan = layout::plan_document(&dims, title);
        let pages = plan.iter().map(summarize).collect();

        let owned_title = title.map(str::to_owned);
        let bytes = tokio::task::spawn_blocking(move || {
            writer::render(&plan, decoded, owned_title.as_deref())
        })
        .await
        .map_err(|e| AssemblyError::Pdf(e.to_string()))??;

        info!("✓ 文档组装完成: {} 页, {} 字节", dims.len() + usize::from(title.is_some()), bytes.len());

        Ok(AssembledDocument {
            bytes: Arc::from(bytes),
            pages,
        })
    }

    /// 并发解码，结果顺序与输入顺序一致
    async fn decode_all(&self, images: &[EncodedImage]) -> Result<Vec<DecodedImage>, AssemblyError> {
        let tasks = images.iter().enumerate().map(|(index, image)| {
            let decoder = Arc::clone(&self.decoder);
            let image = image.clone();
            async move {
                let decoded = tokio::task::spawn_blocking(move || decoder.decode(image.as_bytes()))
                    .await
                    .map_err(|e| AssemblyError::DecodeTask {
                        index,
                        message: e.to_string(),
                    })?
                    .map_err(|source| AssemblyError::Decode { index, source })?;
                debug!("第 {} 页解码完成: {}x{}", index + 1, decoded.width, decoded.height);
                Ok::<_, AssemblyError>(decoded)
            }
        });

        try_join_all(tasks).await
    }
}

impl Default for DocumentAssembler {
    fn default() -> Self {
        Self::new()
    }
}

fn summarize(page: &PagePlan) -> PageSummary {
    let kind = match page {
        PagePlan::Cover { .. } => PageKind::Cover,
        PagePlan::Content { image_index, .. } => PageKind::Content {
            image_index: *image_index,
        },
    };
    PageSummary {
        kind,
        orientation: page.orientation(),
    }
}
