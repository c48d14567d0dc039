//! Driven port for book cover storage.

use async_trait::async_trait;

use crate::domain::ImageRef;

use super::define_port_error;

define_port_error! {
    /// Errors raised by image store adapters.
    pub enum ImageStoreError {
        /// The upload exceeds the accepted size.
        TooLarge { size: usize, max: usize } => "image of {size} bytes exceeds the {max} byte limit",
        /// Reading or writing the backing storage failed.
        Io { message: String } => "image storage failed: {message}",
    }
}

/// Raw cover upload as received from a client.
#[derive(Clone, PartialEq, Eq)]
pub struct CoverUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for CoverUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverUpload")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Persist cover images and hand back an opaque reference.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store the upload. `Ok(None)` means the file type is not accepted.
    async fn store_image(&self, upload: &CoverUpload) -> Result<Option<ImageRef>, ImageStoreError>;

    /// Remove a previously stored image. Missing files are not an error.
    async fn remove_image(&self, image: &ImageRef) -> Result<(), ImageStoreError>;
}

/// Store used when uploads are disabled: every file is declined.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledImageStore;

#[async_trait]
impl ImageStore for DisabledImageStore {
    async fn store_image(&self, _upload: &CoverUpload) -> Result<Option<ImageRef>, ImageStoreError> {
        Ok(None)
    }

    async fn remove_image(&self, _image: &ImageRef) -> Result<(), ImageStoreError> {
        Ok(())
    }
}
