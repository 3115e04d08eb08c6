//! Annotation state: the annotation set and the image preload cache.

mod image_cache;
mod store;

pub use image_cache::{FileFetcher, ImageCache, ImageFetcher, ImageStatus};
pub use store::{AnnotationStore, DrawBuffer, Preloader};
