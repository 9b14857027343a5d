mod article_store_port;
mod batch_listener_port;
mod image_fetcher_port;
mod picture_cache_port;

pub use article_store_port::ArticleStorePort;
pub use batch_listener_port::BatchListener;
pub use image_fetcher_port::ImageFetcherPort;
pub use picture_cache_port::PictureCachePort;

#[cfg(test)]
pub mod mocks {
    pub use super::batch_listener_port::mock::MockBatchListener;
    pub use super::image_fetcher_port::mock::{MockImageFetcher, png_bytes};
    pub use super::picture_cache_port::mock::{MockPictureCache, PictureCacheCall};
}
