//! Chunked upload pump shared by the object-store adapters.
//!
//! Reads are fed straight into a multipart upload, so memory stays bounded
//! by the part buffer and the in-flight part cap, independent of the size of
//! the source.

use crate::traits::{StorageError, StorageResult, UploadReader};
use object_store::{MultipartUpload, WriteMultipart};
use tokio::io::AsyncReadExt;

const CHUNK_SIZE: usize = 8192;

/// Upper bound on concurrently in-flight part uploads.
const MAX_IN_FLIGHT_PARTS: usize = 8;

/// Drain `reader` into `upload` chunk by chunk. Returns the number of bytes
/// written once the final part has been committed.
pub(crate) async fn copy_to_multipart(
    mut reader: UploadReader,
    upload: Box<dyn MultipartUpload>,
) -> StorageResult<u64> {
    let mut writer = WriteMultipart::new(upload);
    let mut chunk = vec![0u8; CHUNK_SIZE];
    let mut written: u64 = 0;

    loop {
        let bytes_read = reader.read(&mut chunk).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to read from stream: {}", e))
        })?;
        if bytes_read == 0 {
            break;
        }

        writer
            .wait_for_capacity(MAX_IN_FLIGHT_PARTS)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        writer.write(&chunk[..bytes_read]);
        written += bytes_read as u64;
    }

    writer
        .finish()
        .await
        .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;
    use object_store::path::Path;
    use object_store::ObjectStoreExt;

    #[tokio::test]
    async fn pumps_reader_across_chunk_boundaries() {
        let store = InMemory::new();
        let location = Path::from("big.bin");

        // Several times the read chunk size, with a ragged tail.
        let payload: Vec<u8> = (0..CHUNK_SIZE * 3 + 123).map(|i| (i % 251) as u8).collect();
        let reader: UploadReader = Box::pin(std::io::Cursor::new(payload.clone()));

        let upload = store.put_multipart(&location).await.unwrap();
        let written = copy_to_multipart(reader, upload).await.unwrap();
        assert_eq!(written, payload.len() as u64);

        let stored = store.get(&location).await.unwrap().bytes().await.unwrap();
        assert_eq!(stored.as_ref(), payload.as_slice());
    }

    #[tokio::test]
    async fn empty_reader_commits_an_empty_object() {
        let store = InMemory::new();
        let location = Path::from("empty.bin");

        let reader: UploadReader = Box::pin(std::io::Cursor::new(Vec::new()));
        let upload = store.put_multipart(&location).await.unwrap();
        let written = copy_to_multipart(reader, upload).await.unwrap();
        assert_eq!(written, 0);

        let stored = store.get(&location).await.unwrap().bytes().await.unwrap();
        assert!(stored.is_empty());
    }
}
