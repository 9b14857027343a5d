//! Port definition for downloading picture bytes.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::errors::CacheResult;

/// Port for fetching raw picture bytes from their origin.
/// Implementations must be thread-safe.
#[async_trait]
pub trait ImageFetcherPort: Send + Sync {
    /// Downloads the resource at `url`.
    ///
    /// # Errors
    /// Returns a network error if the request fails or the response is not a success.
    async fn fetch(&self, url: &str) -> CacheResult<Bytes>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::domain::errors::CacheError;

    /// Encodes a small solid PNG of the given size.
    pub fn png_bytes(width: u32, height: u32) -> Bytes {
        let img = image::DynamicImage::new_rgb8(width, height);
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        Bytes::from(buf.into_inner())
    }

    /// In-memory fetcher that records every request.
    ///
    /// Unknown URLs fail with a network error.
    #[derive(Default)]
    pub struct MockImageFetcher {
        responses: Mutex<HashMap<String, CacheResult<Bytes>>>,
        requests: Mutex<Vec<String>>,
        delay: Option<Duration>,
    }

    impl MockImageFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        /// Delays every response, keeping batches in flight for a while.
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn respond(&self, url: &str, bytes: Bytes) {
            self.responses
                .lock()
                .unwrap()
                .insert(url.to_string(), Ok(bytes));
        }

        pub fn respond_png(&self, url: &str, width: u32, height: u32) {
            self.respond(url, png_bytes(width, height));
        }

        pub fn fail(&self, url: &str, error: CacheError) {
            self.responses
                .lock()
                .unwrap()
                .insert(url.to_string(), Err(error));
        }

        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ImageFetcherPort for MockImageFetcher {
        async fn fetch(&self, url: &str) -> CacheResult<Bytes> {
            self.requests.lock().unwrap().push(url.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.responses
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .unwrap_or_else(|| Err(CacheError::network(format!("no route to {url}"))))
        }
    }
}
