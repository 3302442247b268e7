//! The `seekgpt.codecs` namespace (extra: `codecs`).
//!
//! Binary attachments for multimodal messages: images are normalized to PNG and
//! embedded as base64 data URLs.

use crate::modules::{CODECS_PATH, ModuleLoader, Namespace, Registry};
use crate::proxy::LazyProxy;

/// Process-wide codecs namespace, loaded on first use.
pub static CODECS: LazyProxy<ModuleLoader<Codecs>> =
    LazyProxy::new(ModuleLoader::new(Registry::builtin(), ()));

#[derive(Debug, Clone, Copy, Default)]
pub struct Codecs {
    _private: (),
}

impl Namespace for Codecs {
    const PATH: &'static str = CODECS_PATH;
    type Deps = ();

    fn materialize(_deps: &()) -> Self {
        Self { _private: () }
    }
}

#[cfg(feature = "codecs")]
impl Codecs {
    /// Re-encodes arbitrary image bytes as PNG and returns the base64 payload.
    pub fn encode_png_base64(&self, bytes: &[u8]) -> Result<String, crate::error::Error> {
        use std::io::Cursor;

        use base64::Engine;
        use base64::engine::general_purpose::STANDARD;

        let image = image::load_from_memory(bytes)?;
        let mut buffer = Vec::new();
        image.write_to(&mut Cursor::new(&mut buffer), image::ImageOutputFormat::Png)?;
        Ok(STANDARD.encode(&buffer))
    }

    /// Wraps image bytes as an `image_url` content part.
    pub fn image_part(&self, bytes: &[u8]) -> Result<crate::types::ContentPart, crate::error::Error> {
        let encoded = self.encode_png_base64(bytes)?;
        Ok(crate::types::ContentPart::ImageUrl {
            image_url: crate::types::ImageUrl {
                url: format!("data:image/png;base64,{encoded}"),
            },
        })
    }
}
