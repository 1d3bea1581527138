//! 涂色书状态
//!
//! 会话级的书本存储：由调用方显式创建并以引用传递，
//! `reset()` 恢复默认值。所有修改都是同步的，越界下标一律静默忽略。

use crate::models::{AgeBand, EncodedImage, GenerationBatch};

/// 书中的一页
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub image: EncodedImage,
    pub selected: bool,
}

/// 书本状态：标题 + 有序页面
///
/// 页面顺序就是打印顺序；页面按位置区分，允许内容重复。
#[derive(Debug, Clone, Default)]
pub struct BookState {
    title: String,
    pages: Vec<Page>,
    age: AgeBand,
}

impl BookState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn age(&self) -> AgeBand {
        self.age
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// 原样替换标题，不做裁剪或校验
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_age(&mut self, age: AgeBand) {
        self.age = age;
    }

    /// 追加一页，默认选中
    pub fn add_page(&mut self, image: EncodedImage) {
        self.pages.push(Page {
            image,
            selected: true,
        });
    }

    /// 按批次顺序追加所有成功生成的页面，返回追加数量
    pub fn extend_from_batch(&mut self, batch: &GenerationBatch) -> usize {
        let before = self.pages.len();
        for image in batch.successful_images() {
            self.add_page(image.clone());
        }
        self.pages.len() - before
    }

    /// 删除指定页；越界时不做任何修改
    pub fn remove_page(&mut self, index: usize) {
        if index < self.pages.len() {
            self.pages.remove(index);
        }
    }

    /// 切换选中状态；越界时不做任何修改
    pub fn toggle_page_selection(&mut self, index: usize) {
        if let Some(page) = self.pages.get_mut(index) {
            page.selected = !page.selected;
        }
    }

    /// 把 `from` 处的页面移动到 `to`，其余页面顺移
    pub fn reorder_pages(&mut self, from: usize, to: usize) {
        let len = self.pages.len();
        if from == to || from >= len || to >= len {
            return;
        }
        let moved = self.pages.remove(from);
        self.pages.insert(to, moved);
    }

    /// 选中页面的图片（保持顺序），用于导出
    pub fn selected_images(&self) -> Vec<EncodedImage> {
        self.pages
            .iter()
            .filter(|p| p.selected)
            .map(|p| p.image.clone())
            .collect()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
