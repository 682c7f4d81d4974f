use std::time::Duration;

use rand::RngExt as _;

use crate::{
    core::RasterImage,
    error::{ParadeError, ParadeResult},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Decode raster bytes (any format the `image` crate recognizes) into
/// straight-alpha RGBA8.
pub fn decode_image(bytes: &[u8]) -> ParadeResult<RasterImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| ParadeError::load(format!("decode image: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    RasterImage::from_rgba8(width, height, rgba.into_raw())
}

/// Supplier of sprite indices for the loader.
///
/// Production draws uniformly from the collection; tests inject a
/// deterministic sequence.
pub trait IndexSource: Send {
    fn next_index(&mut self) -> u32;
}

/// Uniform random indices over `[0, collection_size)`.
pub struct RandomIndexSource {
    collection_size: u32,
}

impl RandomIndexSource {
    pub fn new(collection_size: u32) -> Self {
        Self { collection_size }
    }
}

impl IndexSource for RandomIndexSource {
    fn next_index(&mut self) -> u32 {
        rand::rng().random_range(0..self.collection_size)
    }
}

/// Wrapping sequential indices, for deterministic tests and demos.
pub struct SequentialIndexSource {
    next: u32,
    collection_size: u32,
}

impl SequentialIndexSource {
    pub fn new(start: u32, collection_size: u32) -> Self {
        Self {
            next: start % collection_size.max(1),
            collection_size: collection_size.max(1),
        }
    }
}

impl IndexSource for SequentialIndexSource {
    fn next_index(&mut self) -> u32 {
        let idx = self.next;
        self.next = (self.next + 1) % self.collection_size;
        idx
    }
}

/// One attempt at acquiring a decoded sprite image.
///
/// A failed fetch is terminal for that attempt: the queue logs it and moves
/// on to a fresh index. There is no retry layer here.
pub trait SpriteFetcher: Send + Sync {
    fn fetch(&self, index: u32) -> ParadeResult<RasterImage>;
}

/// Fetches sprites from a content-addressed HTTP image store: the URL is the
/// configured base followed by the index and `.png`.
pub struct HttpSpriteFetcher {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpSpriteFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build()
            .into();
        Self {
            agent,
            base_url: base_url.into(),
        }
    }

    pub fn sprite_url(&self, index: u32) -> String {
        format!("{}{}.png", self.base_url, index)
    }
}

impl SpriteFetcher for HttpSpriteFetcher {
    fn fetch(&self, index: u32) -> ParadeResult<RasterImage> {
        let url = self.sprite_url(index);
        let resp = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| ParadeError::load(format!("GET {url}: {e}")))?;
        let bytes = resp
            .into_body()
            .read_to_vec()
            .map_err(|e| ParadeError::load(format!("read body of {url}: {e}")))?;
        decode_image(&bytes)
    }
}
