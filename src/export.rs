//! 导出分发
//!
//! 把已经组装好的 [`AssembledDocument`] 保存到本地或通过邮件发送。
//! 两种方式共用同一份字节，导出不会重新解码或重新排版。

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::document::AssembledDocument;
use crate::error::{AppError, AppResult, ValidationError};
use crate::services::email::{EmailDelivery, EmailRequest};

pub const DEFAULT_FILENAME: &str = "coloring-book.pdf";
pub const DEFAULT_SUBJECT: &str = "Your Coloring Book";

fn email_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
}

/// 由书名得到文件名：裁剪、转小写、连续空白替换为 `-`
///
/// 路径分隔符同样替换为 `-`，保证结果只是一个文件名。
pub fn export_filename(title: &str) -> String {
    let stem = title
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .replace(['/', '\\'], "-");

    if stem.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        format!("{}.pdf", stem)
    }
}

/// 邮件主题：裁剪后的书名，为空时使用默认主题
pub fn email_subject(title: &str) -> String {
    match title.trim() {
        "" => DEFAULT_SUBJECT.to_string(),
        t => t.to_string(),
    }
}

/// 邮箱格式检查：`@` 之后还需要有 `.`，且不含空白
pub fn validate_email(address: &str) -> Result<(), ValidationError> {
    let valid = email_pattern().is_some_and(|re| re.is_match(address));
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail {
            address: address.to_string(),
        })
    }
}

/// 导出目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    Local { dir: PathBuf },
    Email { recipient: String },
}

/// 单个目标的导出结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportReceipt {
    Saved(PathBuf),
    Emailed { recipient: String },
}

/// 导出分发器
pub struct ExportDispatcher<E> {
    email: E,
}

impl<E: EmailDelivery> ExportDispatcher<E> {
    pub fn new(email: E) -> Self {
        Self { email }
    }

    pub fn email_service(&self) -> &E {
        &self.email
    }

    /// 保存到 `<dir>/<由书名得到的文件名>`，目录不存在时自动创建
    pub async fn save_local(
        &self,
        document: &AssembledDocument,
        title: &str,
        dir: impl AsRef<Path>,
    ) -> AppResult<PathBuf> {
        let dir = dir.as_ref();
        let path = dir.join(export_filename(title));

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| AppError::file_write_failed(dir, e))?;
        tokio::fs::write(&path, document.bytes())
            .await
            .map_err(|e| AppError::file_write_failed(&path, e))?;

        info!("💾 已保存: {} ({} 字节)", path.display(), document.len());
        Ok(path)
    }

    /// 通过邮件发送
    ///
    /// 地址按原样校验（前后空白也视为不合法），不合法时直接返回校验错误，
    /// 不会调用邮件服务；邮件服务的错误消息原样返回。
    pub async fn send_email(
        &self,
        document: &AssembledDocument,
        title: &str,
        recipient: &str,
    ) -> AppResult<()> {
        if let Err(e) = validate_email(recipient) {
            warn!("邮箱地址无效，未发送: {}", recipient);
            return Err(e.into());
        }

        let request = EmailRequest {
            recipient: recipient.to_string(),
            attachment_base64: STANDARD.encode(document.bytes()),
            filename: export_filename(title),
            subject: email_subject(title),
        };
        self.email.send(&request).await?;
        Ok(())
    }

    /// 按顺序导出到多个目标，遇到第一个错误即停止
    pub async fn dispatch(
        &self,
        document: &AssembledDocument,
        title: &str,
        targets: &[ExportTarget],
    ) -> AppResult<Vec<ExportReceipt>> {
        let mut receipts = Vec::with_capacity(targets.len());
        for target in targets {
            let receipt = match target {
                ExportTarget::Local { dir } => {
                    ExportReceipt::Saved(self.save_local(document, title, dir).await?)
                }
                ExportTarget::Email { recipient } => {
                    self.send_email(document, title, recipient).await?;
                    ExportReceipt::Emailed {
                        recipient: recipient.clone(),
                    }
                }
            };
            receipts.push(receipt);
        }
        Ok(receipts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::decoder::tests::{fake_image, CountingDecoder};
    use crate::document::DocumentAssembler;
    use crate::error::ServiceError;
    use crate::models::EncodedImage;
    use std::sync::{Arc, Mutex};

    /// 记录所有请求；设置 `reject` 时返回该消息
    #[derive(Default)]
    struct RecordingEmail {
        sent: Mutex<Vec<EmailRequest>>,
        reject: Option<String>,
    }

    impl EmailDelivery for RecordingEmail {
        async fn send(&self, request: &EmailRequest) -> Result<(), ServiceError> {
            self.sent.lock().unwrap().push(request.clone());
            match &self.reject {
                Some(message) => Err(ServiceError::Collaborator(message.clone())),
                None => Ok(()),
            }
        }
    }

    async fn sample_document() -> (Arc<CountingDecoder>, AssembledDocument) {
        let decoder = Arc::new(CountingDecoder::new());
        let assembler = DocumentAssembler::with_decoder(decoder.clone());
        let images = vec![
            EncodedImage::from_bytes(fake_image(800, 600)),
            EncodedImage::from_bytes(fake_image(600, 800)),
        ];
        let doc = assembler.assemble(&images, Some("Jungle Party")).await.unwrap();
        (decoder, doc)
    }

    #[test]
    fn filename_from_title() {
        assert_eq!(export_filename("  My   Dino\tBook "), "my-dino-book.pdf");
        assert_eq!(export_filename("Space"), "space.pdf");
        assert_eq!(export_filename("   "), DEFAULT_FILENAME);
        assert_eq!(export_filename(""), DEFAULT_FILENAME);
        assert_eq!(export_filename("Cats/Dogs"), "cats-dogs.pdf");
    }

    #[test]
    fn subject_from_title() {
        assert_eq!(email_subject("  Ocean  "), "Ocean");
        assert_eq!(email_subject(" "), DEFAULT_SUBJECT);
    }

    #[test]
    fn email_shape_check() {
        assert!(validate_email("kid@example.com").is_ok());
        assert!(validate_email("a.b@c.co.uk").is_ok());
        for bad in ["", "kid", "kid@example", "@example.com", "kid@.com", "k id@example.com", "kid@@example.com"] {
            assert_eq!(
                validate_email(bad),
                Err(ValidationError::InvalidEmail {
                    address: bad.to_string()
                }),
                "{bad:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn invalid_email_never_reaches_service() {
        let (_, doc) = sample_document().await;
        let dispatcher = ExportDispatcher::new(RecordingEmail::default());

        let err = dispatcher
            .send_email(&doc, "Jungle Party", "not-an-email")
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert!(dispatcher.email_service().sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn padded_recipient_is_rejected() {
        let (_, doc) = sample_document().await;
        let dispatcher = ExportDispatcher::new(RecordingEmail::default());

        let err = dispatcher
            .send_email(&doc, "Jungle Party", " kid@example.com ")
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert!(dispatcher.email_service().sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn email_carries_encoded_document() {
        let (_, doc) = sample_document().await;
        let dispatcher = ExportDispatcher::new(RecordingEmail::default());

        dispatcher
            .send_email(&doc, "  Jungle Party ", "kid@example.com")
            .await
            .unwrap();

        let sent = dispatcher.email_service().sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "kid@example.com");
        assert_eq!(sent[0].filename, "jungle-party.pdf");
        assert_eq!(sent[0].subject, "Jungle Party");
        assert_eq!(STANDARD.decode(&sent[0].attachment_base64).unwrap(), doc.bytes());
    }

    #[tokio::test]
    async fn collaborator_message_is_verbatim() {
        let (_, doc) = sample_document().await;
        let dispatcher = ExportDispatcher::new(RecordingEmail {
            reject: Some("You can only send testing emails to your own address".into()),
            ..Default::default()
        });

        let err = dispatcher
            .send_email(&doc, "", "kid@example.com")
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "You can only send testing emails to your own address"
        );
        let sent = dispatcher.email_service().sent.lock().unwrap();
        assert_eq!(sent[0].subject, DEFAULT_SUBJECT);
        assert_eq!(sent[0].filename, DEFAULT_FILENAME);
    }

    #[tokio::test]
    async fn local_save_writes_exact_bytes() {
        let (_, doc) = sample_document().await;
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = ExportDispatcher::new(RecordingEmail::default());

        let path = dispatcher
            .save_local(&doc, "Jungle Party", dir.path().join("books"))
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("books").join("jungle-party.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), doc.bytes());
    }

    #[tokio::test]
    async fn dispatch_reuses_one_build() {
        let (decoder, doc) = sample_document().await;
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = ExportDispatcher::new(RecordingEmail::default());

        let receipts = dispatcher
            .dispatch(
                &doc,
                "Jungle Party",
                &[
                    ExportTarget::Local {
                        dir: dir.path().to_path_buf(),
                    },
                    ExportTarget::Email {
                        recipient: "kid@example.com".into(),
                    },
                ],
            )
            .await
            .unwrap();

        assert_eq!(
            receipts,
            vec![
                ExportReceipt::Saved(dir.path().join("jungle-party.pdf")),
                ExportReceipt::Emailed {
                    recipient: "kid@example.com".into()
                },
            ]
        );
        assert_eq!(decoder.call_count(), 2);
    }

    #[tokio::test]
    async fn dispatch_stops_at_first_error() {
        let (_, doc) = sample_document().await;
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = ExportDispatcher::new(RecordingEmail::default());

        let err = dispatcher
            .dispatch(
                &doc,
                "x",
                &[
                    ExportTarget::Email {
                        recipient: "nope".into(),
                    },
                    ExportTarget::Local {
                        dir: dir.path().to_path_buf(),
                    },
                ],
            )
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert!(!dir.path().join("x.pdf").exists());
    }
}
