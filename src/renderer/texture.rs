//! Sprite sheet loading and upload
//!
//! A missing or broken sheet is not fatal: the game runs with a transparent
//! sheet so the sky, SDF effects and collision plumbing still work.

use std::fmt;

use wgpu::util::DeviceExt;

use crate::shade::SpriteSheet;

/// Low-DPI offline sprite sheet, relative to the page or working directory
pub const SPRITE_SHEET_PATH: &str = "assets/offline-sprite-1x.png";

#[derive(Debug)]
pub enum TextureError {
    /// Reading the file failed (native)
    Io(std::io::Error),
    /// Fetching the file failed (web)
    Fetch(String),
    Decode(image::ImageError),
    /// Decoded pixels did not match the reported size
    Dimensions { width: u32, height: u32 },
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::Io(e) => write!(f, "read failed: {e}"),
            TextureError::Fetch(e) => write!(f, "fetch failed: {e}"),
            TextureError::Decode(e) => write!(f, "decode failed: {e}"),
            TextureError::Dimensions { width, height } => {
                write!(f, "unexpected sheet size {width}x{height}")
            }
        }
    }
}

impl std::error::Error for TextureError {}

impl From<std::io::Error> for TextureError {
    fn from(e: std::io::Error) -> Self {
        TextureError::Io(e)
    }
}

impl From<image::ImageError> for TextureError {
    fn from(e: image::ImageError) -> Self {
        TextureError::Decode(e)
    }
}

/// Decode PNG bytes into a CPU sprite sheet
pub fn decode_sprite_sheet(bytes: &[u8]) -> Result<SpriteSheet, TextureError> {
    let rgba = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    SpriteSheet::from_rgba8(width, height, rgba.as_raw())
        .ok_or(TextureError::Dimensions { width, height })
}

/// Log the outcome of a load and fall back to a blank sheet on error
pub fn sheet_or_blank(loaded: Result<SpriteSheet, TextureError>) -> SpriteSheet {
    match loaded {
        Ok(sheet) => {
            log::info!("Sprite sheet loaded ({}x{})", sheet.width(), sheet.height());
            sheet
        }
        Err(e) => {
            log::warn!("Sprite sheet unavailable ({e}), drawing without sprites; see assets/README.md");
            SpriteSheet::blank()
        }
    }
}

#[cfg(target_arch = "wasm32")]
async fn fetch_bytes(url: &str) -> Result<Vec<u8>, TextureError> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    let js_err = |e: wasm_bindgen::JsValue| TextureError::Fetch(format!("{e:?}"));

    let window = web_sys::window().ok_or_else(|| TextureError::Fetch("no window".into()))?;
    let response = JsFuture::from(window.fetch_with_str(url)).await.map_err(js_err)?;
    let response: web_sys::Response = response.dyn_into().map_err(js_err)?;
    if !response.ok() {
        return Err(TextureError::Fetch(format!("HTTP {}", response.status())));
    }
    let buffer = JsFuture::from(response.array_buffer().map_err(js_err)?)
        .await
        .map_err(js_err)?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

/// Fetch and decode the sprite sheet, blank on failure
#[cfg(target_arch = "wasm32")]
pub async fn load_sprite_sheet(url: &str) -> SpriteSheet {
    let loaded = match fetch_bytes(url).await {
        Ok(bytes) => decode_sprite_sheet(&bytes),
        Err(e) => Err(e),
    };
    sheet_or_blank(loaded)
}

/// Read and decode the sprite sheet, blank on failure
#[cfg(not(target_arch = "wasm32"))]
pub fn load_sprite_sheet(path: &str) -> SpriteSheet {
    let loaded = std::fs::read(path)
        .map_err(TextureError::from)
        .and_then(|bytes| decode_sprite_sheet(&bytes));
    sheet_or_blank(loaded)
}

/// Sprite sheet on the GPU
pub struct SpriteTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl SpriteTexture {
    pub fn upload(device: &wgpu::Device, queue: &wgpu::Queue, sheet: &SpriteSheet) -> Self {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("sprite_sheet"),
                size: wgpu::Extent3d {
                    width: sheet.width(),
                    height: sheet.height(),
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                // Decoded to linear on sample, like SpriteSheet::texel
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            sheet.as_bytes(),
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Nearest filtering keeps pixel-art edges hard, clamp keeps the
        // sampling inside the sheet
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sprite_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }
}
