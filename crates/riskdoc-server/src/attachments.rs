//! Filesystem [`AttachmentStore`].
//!
//! Files are content-addressed: the stored name is the SHA-256 of the bytes
//! plus the original extension, so uploading the same file twice writes it
//! once. Documents keep only the returned descriptor.

use std::path::{Path, PathBuf};

use riskdoc_core::{rows::Attachment, store::AttachmentStore};
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Longest extension carried over from the uploaded name.
const MAX_EXTENSION_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct FsAttachmentStore {
  dir:      PathBuf,
  base_url: String,
}

impl FsAttachmentStore {
  /// Use `dir` for file storage, creating it if needed. Descriptor URLs are
  /// `{base_url}/{stored name}`.
  pub async fn open(dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Result<Self> {
    let dir = dir.into();
    tokio::fs::create_dir_all(&dir).await?;
    Ok(Self { dir, base_url: base_url.into().trim_end_matches('/').to_owned() })
  }

  pub fn dir(&self) -> &Path { &self.dir }
}

/// `{sha256 hex}[.{ext}]` for `bytes` uploaded as `name`.
pub fn stored_name(name: &str, bytes: &[u8]) -> String {
  let hash = hex::encode(Sha256::digest(bytes));
  let ext = Path::new(name)
    .extension()
    .and_then(|e| e.to_str())
    .filter(|e| {
      !e.is_empty() && e.len() <= MAX_EXTENSION_LEN && e.chars().all(|c| c.is_ascii_alphanumeric())
    })
    .map(str::to_ascii_lowercase);
  match ext {
    Some(ext) => format!("{hash}.{ext}"),
    None => hash,
  }
}

impl AttachmentStore for FsAttachmentStore {
  type Error = Error;

  async fn upload(&self, name: String, bytes: Vec<u8>) -> Result<Attachment> {
    let file_name = stored_name(&name, &bytes);
    let path = self.dir.join(&file_name);

    if tokio::fs::try_exists(&path).await? {
      tracing::debug!(%file_name, "attachment already stored");
    } else {
      tokio::fs::write(&path, &bytes).await?;
      tracing::debug!(%file_name, size = bytes.len(), "attachment written");
    }

    Ok(Attachment {
      url: format!("{}/{file_name}", self.base_url),
      size: bytes.len() as u64,
      name,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn stored_name_keeps_safe_extension() {
    let name = stored_name("현장사진.JPG", b"abc");
    assert_eq!(
      name,
      "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad.jpg"
    );
    assert!(!stored_name("archive.tar.g/z", b"abc").contains('/'));
    assert!(!stored_name("noext", b"abc").contains('.'));
    assert!(!stored_name("weird.ex t", b"abc").contains('.'));
  }

  #[tokio::test]
  async fn upload_writes_content_addressed_file() {
    let tmp = tempfile::tempdir().unwrap();
    let store = FsAttachmentStore::open(tmp.path().join("files"), "/files/").await.unwrap();

    let first = store.upload("msds.pdf".into(), b"%PDF-1.7".to_vec()).await.unwrap();
    let second = store.upload("copy.pdf".into(), b"%PDF-1.7".to_vec()).await.unwrap();

    assert_eq!(first.size, 8);
    assert_eq!(first.name, "msds.pdf");
    assert!(first.url.starts_with("/files/"));
    assert_eq!(first.url, second.url);
    assert_eq!(second.name, "copy.pdf");

    let entries = std::fs::read_dir(store.dir()).unwrap().count();
    assert_eq!(entries, 1);
  }
}
