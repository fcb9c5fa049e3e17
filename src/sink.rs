// ABOUTME: Destinations for exported slide images
// ABOUTME: Writes PNG files to a directory or hands them to the live view as downloads

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::errors::Result;
use crate::export::{ImageSink, SlideImage};
use crate::utils;
use crate::view::{ViewHandle, ViewUpdate};

/// Writes each image as a file inside an output directory
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Create a sink, making sure the directory exists and is writable
    pub fn new(dir: &Path) -> Result<Self> {
        utils::ensure_directory_exists(dir)?;
        utils::validate_directory_writable(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ImageSink for DirectorySink {
    fn persist(&self, file_name: &str, image: &SlideImage) -> Result<()> {
        let path = self.dir.join(file_name);
        fs::write(&path, image.png())?;
        info!("Saved {:?}", path);
        Ok(())
    }
}

/// Pushes each image to the connected view, which saves it as a download
pub struct DownloadSink {
    view: ViewHandle,
}

impl DownloadSink {
    pub fn new(view: ViewHandle) -> Self {
        Self { view }
    }
}

impl ImageSink for DownloadSink {
    fn persist(&self, file_name: &str, image: &SlideImage) -> Result<()> {
        self.view.publish(ViewUpdate::Download {
            file_name: file_name.to_string(),
            data_uri: image.to_data_uri(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::png_bytes;
    use tempfile::TempDir;

    #[test]
    fn test_directory_sink_creates_dir_and_writes() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let out = temp.path().join("exports");
        let sink = DirectorySink::new(&out).unwrap();
        let image = SlideImage::from_png(png_bytes(4, 4)).unwrap();

        sink.persist("Slide_1.png", &image).unwrap();
        sink.persist("Slide_1.png", &image).unwrap();

        let written = fs::read(out.join("Slide_1.png")).unwrap();
        assert_eq!(written, image.png());
        assert_eq!(fs::read_dir(&out).unwrap().count(), 1);
    }

    #[test]
    fn test_directory_sink_rejects_file_path() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let file = temp.path().join("taken");
        fs::write(&file, "x").unwrap();
        assert!(DirectorySink::new(&file).is_err());
    }

    #[tokio::test]
    async fn test_download_sink_publishes_data_uri() {
        let view = ViewHandle::new();
        let mut rx = view.subscribe();
        let sink = DownloadSink::new(view);
        let image = SlideImage::from_png(png_bytes(2, 2)).unwrap();

        sink.persist("Slide_4.png", &image).unwrap();

        match rx.recv().await.unwrap() {
            ViewUpdate::Download {
                file_name,
                data_uri,
            } => {
                assert_eq!(file_name, "Slide_4.png");
                assert_eq!(data_uri, image.to_data_uri());
            }
            other => panic!("unexpected update {:?}", other),
        }
    }
}
