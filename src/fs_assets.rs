//! Filesystem image loader for the headless client.
//!
//! Image URLs are mapped onto a local asset directory (`/assets/a.png` and
//! `https://host/assets/a.png` both resolve to `<root>/assets/a.png`).  Each
//! load runs as its own tokio task and reports back over an unbounded
//! channel drained by the session owner, so completions arrive in the same
//! loop as every other event.

use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

use tokio::sync::mpsc;

use crate::assets::{AssetError, Bitmap, ImageLoader};
use crate::types::Size;

/// Decoded image header.  Headless rendering never needs the pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl Bitmap for ImageInfo {
    fn size(&self) -> Size {
        Size::new(self.width as f32, self.height as f32)
    }
}

/// Completion message sent back to the session owner.
#[derive(Debug)]
pub struct LoadedAsset {
    pub key: String,
    pub result: Result<ImageInfo, AssetError>,
}

pub struct FsImageLoader {
    root: PathBuf,
    done: mpsc::UnboundedSender<LoadedAsset>,
    started: usize,
}

impl FsImageLoader {
    pub fn new(root: impl Into<PathBuf>, done: mpsc::UnboundedSender<LoadedAsset>) -> Self {
        Self {
            root: root.into(),
            done,
            started: 0,
        }
    }

    /// Loader plus the receiving end of its completion channel.
    pub fn channel(root: impl Into<PathBuf>) -> (Self, mpsc::UnboundedReceiver<LoadedAsset>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(root, tx), rx)
    }

    /// Number of loads started so far.
    pub fn started(&self) -> usize {
        self.started
    }

    /// Map a URL onto a path under the asset root.  `..` segments are dropped.
    pub fn resolve(&self, url: &str) -> PathBuf {
        let path = match url.split_once("://") {
            Some((_, rest)) => rest.split_once('/').map_or("", |(_, p)| p),
            None => url,
        };
        let path = path.split(['?', '#']).next().unwrap_or_default();

        let mut resolved = self.root.clone();
        for component in Path::new(path).components() {
            if let Component::Normal(part) = component {
                resolved.push(part);
            }
        }
        resolved
    }
}

impl ImageLoader for FsImageLoader {
    type Bitmap = ImageInfo;

    fn load(&mut self, key: &str, url: &str) {
        self.started += 1;
        let path = self.resolve(url);
        let key = key.to_string();
        let url = url.to_string();
        let done = self.done.clone();
        tokio::spawn(async move {
            let result = read_image(path, &url).await;
            if done.send(LoadedAsset { key, result }).is_err() {
                log::debug!("[assets] session gone, dropping completion for {}", url);
            }
        });
    }
}

async fn read_image(path: PathBuf, url: &str) -> Result<ImageInfo, AssetError> {
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| AssetError::LoadFailed {
            url: url.to_string(),
            reason: format!("{}: {}", path.display(), e),
        })?;

    let decode_err = |reason: String| AssetError::Decode {
        url: url.to_string(),
        reason,
    };
    let (width, height) = image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| decode_err(e.to_string()))?
        .into_dimensions()
        .map_err(|e| decode_err(e.to_string()))?;

    Ok(ImageInfo {
        path,
        width,
        height,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> FsImageLoader {
        FsImageLoader::channel("/srv/assets").0
    }

    #[test]
    fn resolve_strips_scheme_and_host() {
        let l = loader();
        assert_eq!(
            l.resolve("https://cdn.example.com/avatars/a.png"),
            PathBuf::from("/srv/assets/avatars/a.png")
        );
        assert_eq!(
            l.resolve("/avatars/a.png?v=3"),
            PathBuf::from("/srv/assets/avatars/a.png")
        );
        assert_eq!(l.resolve("a.png"), PathBuf::from("/srv/assets/a.png"));
    }

    #[test]
    fn resolve_never_escapes_root() {
        let l = loader();
        assert_eq!(
            l.resolve("../../etc/passwd"),
            PathBuf::from("/srv/assets/etc/passwd")
        );
    }

    #[tokio::test]
    async fn loads_image_dimensions() {
        let dir = std::env::temp_dir().join(format!("roamer-assets-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        image::RgbaImage::new(3, 5)
            .save(dir.join("knight.png"))
            .unwrap();

        let (mut l, mut rx) = FsImageLoader::channel(&dir);
        l.load("k", "/knight.png");
        l.load("missing", "/nope.png");
        assert_eq!(l.started(), 2);

        let mut results = vec![rx.recv().await.unwrap(), rx.recv().await.unwrap()];
        results.sort_by(|a, b| a.key.cmp(&b.key));

        let info = results[0].result.as_ref().unwrap();
        assert_eq!(results[0].key, "k");
        assert_eq!(info.size(), Size::new(3.0, 5.0));

        assert_eq!(results[1].key, "missing");
        assert!(matches!(
            results[1].result,
            Err(AssetError::LoadFailed { .. })
        ));

        std::fs::remove_dir_all(&dir).ok();
    }
}
