//! Filesystem-backed cover image store.
//!
//! Files land in one directory opened through `cap_std`, named
//! `<uuid>_<sanitised original name>`, shortened to fit the 255 byte
//! `books.cover_image` column. Only png, jpg, jpeg and gif uploads are
//! accepted; anything else is declined without error.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ImageRef;
use crate::domain::ports::{CoverUpload, ImageStore, ImageStoreError};

/// Largest accepted upload: 16 MiB.
pub const MAX_IMAGE_BYTES: usize = 16 * 1024 * 1024;
const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];
/// Longest stored reference; matches the column width and stays under the
/// usual 255 byte file name limit.
pub const MAX_REFERENCE_LEN: usize = 255;

/// Whether `file_name` carries an accepted image extension.
pub fn is_allowed_image(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Reduce a client-supplied name to a safe single path component.
pub fn sanitise_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter_map(|ch| match ch {
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();
    let trimmed = cleaned.trim_start_matches(['.', '_']);
    if trimmed.is_empty() {
        "cover".to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Build the stored reference for an upload, trimming the stem so the whole
/// name fits in [`MAX_REFERENCE_LEN`] while the extension survives.
fn stored_name(id: Uuid, file_name: &str) -> String {
    let prefix = format!("{id}_");
    let mut name = sanitise_file_name(file_name);
    let budget = MAX_REFERENCE_LEN - prefix.len();
    if name.len() > budget {
        // Sanitised names are ASCII, so byte offsets are char boundaries.
        let ext_len = name.rfind('.').map_or(0, |dot| name.len() - dot);
        let ext = name.split_off(name.len() - ext_len);
        name.truncate(budget.saturating_sub(ext.len()));
        name.push_str(&ext);
    }
    prefix + &name
}

/// Image store writing into a single upload directory.
#[derive(Clone)]
pub struct FilesystemImageStore {
    dir: Arc<Dir>,
    max_bytes: usize,
}

impl FilesystemImageStore {
    /// Open (creating if needed) the upload directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error when the directory cannot be created or opened.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        Dir::create_ambient_dir_all(path, ambient_authority())?;
        let dir = Dir::open_ambient_dir(path, ambient_authority())?;
        Ok(Self {
            dir: Arc::new(dir),
            max_bytes: MAX_IMAGE_BYTES,
        })
    }

    /// Override the size limit.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, ImageStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Dir) -> io::Result<T> + Send + 'static,
    {
        let dir = Arc::clone(&self.dir);
        tokio::task::spawn_blocking(move || op(&dir))
            .await
            .map_err(|err| ImageStoreError::io(err.to_string()))?
            .map_err(|err| ImageStoreError::io(err.to_string()))
    }
}

#[async_trait]
impl ImageStore for FilesystemImageStore {
    async fn store_image(&self, upload: &CoverUpload) -> Result<Option<ImageRef>, ImageStoreError> {
        if !is_allowed_image(&upload.file_name) {
            debug!(file_name = %upload.file_name, "unsupported cover type");
            return Ok(None);
        }
        if upload.bytes.len() > self.max_bytes {
            return Err(ImageStoreError::too_large(upload.bytes.len(), self.max_bytes));
        }

        let name = stored_name(Uuid::new_v4(), &upload.file_name);
        let target = PathBuf::from(&name);
        let bytes = upload.bytes.clone();
        self.blocking(move |dir| dir.write(&target, bytes)).await?;
        debug!(image = %name, "stored cover image");
        Ok(Some(ImageRef::new(name)))
    }

    async fn remove_image(&self, image: &ImageRef) -> Result<(), ImageStoreError> {
        let target = PathBuf::from(sanitise_file_name(image.as_ref()));
        self.blocking(move |dir| match dir.remove_file(&target) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct Scratch {
        _root: TempDir,
        path: PathBuf,
        store: FilesystemImageStore,
    }

    #[fixture]
    fn scratch() -> Scratch {
        let root = tempfile::tempdir().expect("tempdir");
        let path = root.path().join("covers");
        let store = FilesystemImageStore::open(&path).expect("open store");
        Scratch {
            _root: root,
            path,
            store,
        }
    }

    fn upload(name: &str, len: usize) -> CoverUpload {
        CoverUpload {
            file_name: name.to_owned(),
            bytes: vec![7; len],
        }
    }

    #[rstest]
    #[case("cover.PNG", true)]
    #[case("photo.jpeg", true)]
    #[case("anim.gif", true)]
    #[case("notes.txt", false)]
    #[case("png", false)]
    fn extension_allow_list(#[case] name: &str, #[case] allowed: bool) {
        assert_eq!(is_allowed_image(name), allowed);
    }

    #[rstest]
    #[case("../../etc/passwd.png", "passwd.png")]
    #[case("my cover.jpg", "my_cover.jpg")]
    #[case("C:\\Users\\me\\pic.gif", "pic.gif")]
    #[case("...", "cover")]
    fn names_are_sanitised(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(sanitise_file_name(raw), expected);
    }

    #[rstest]
    #[tokio::test]
    async fn stores_and_removes_images(scratch: Scratch) {
        let stored = scratch
            .store
            .store_image(&upload("front cover.png", 4))
            .await
            .expect("store")
            .expect("accepted");

        assert!(stored.as_ref().ends_with("_front_cover.png"));
        assert!(scratch.path.join(stored.as_ref()).exists());

        scratch.store.remove_image(&stored).await.expect("remove");
        assert!(!scratch.path.join(stored.as_ref()).exists());
        scratch
            .store
            .remove_image(&stored)
            .await
            .expect("missing files are ignored");
    }

    #[rstest]
    #[case(230)]
    #[case(300)]
    #[case(4096)]
    #[tokio::test]
    async fn long_names_are_shortened_to_fit(scratch: Scratch, #[case] stem: usize) {
        let name = format!("{}.png", "a".repeat(stem));
        let stored = scratch
            .store
            .store_image(&upload(&name, 4))
            .await
            .expect("store")
            .expect("accepted");

        assert_eq!(stored.as_ref().len(), MAX_REFERENCE_LEN);
        assert!(stored.as_ref().ends_with("aaa.png"));
        assert!(scratch.path.join(stored.as_ref()).exists());
        scratch.store.remove_image(&stored).await.expect("remove");
        assert!(!scratch.path.join(stored.as_ref()).exists());
    }

    #[rstest]
    fn short_names_keep_their_full_form() {
        let id = Uuid::nil();
        assert_eq!(
            stored_name(id, "dune.jpg"),
            "00000000-0000-0000-0000-000000000000_dune.jpg"
        );
    }

    #[rstest]
    #[tokio::test]
    async fn declines_unsupported_types(scratch: Scratch) {
        let stored = scratch
            .store
            .store_image(&upload("cover.bmp", 4))
            .await
            .expect("store");
        assert!(stored.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn rejects_oversized_uploads(scratch: Scratch) {
        let store = scratch.store.clone().with_max_bytes(8);
        let err = store
            .store_image(&upload("cover.png", 9))
            .await
            .expect_err("too large");
        assert_eq!(err, ImageStoreError::too_large(9_usize, 8_usize));
    }
}
