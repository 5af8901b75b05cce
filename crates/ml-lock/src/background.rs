//! Background image
//!
//! A random picture from the image directory is scaled to cover the whole
//! screen and drawn with half-block cells, two pixels per cell. Without a
//! usable image the backdrop stays black.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::RgbImage;
use rand::seq::SliceRandom;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::widgets::Widget;
use tracing::{debug, warn};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

const UPPER_HALF_BLOCK: &str = "▀";

/// Whether a path names a supported image file
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// List candidate images in a directory
pub fn list_images(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("No background images in {:?}: {}", dir, e);
            return Vec::new();
        }
    };

    let mut images: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_image(path))
        .collect();
    images.sort();
    images
}

/// Size that covers `target` while keeping the source aspect ratio
pub fn cover_size(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (sw, sh) = source;
    let (tw, th) = target;
    if sw == 0 || sh == 0 {
        return target;
    }
    let scale = f64::max(f64::from(tw) / f64::from(sw), f64::from(th) / f64::from(sh));
    let width = ((f64::from(sw) * scale).round() as u32).max(tw);
    let height = ((f64::from(sh) * scale).round() as u32).max(th);
    (width, height)
}

/// Randomly chosen source image with a per-size cache of scaled pixels
pub struct Background {
    source: RgbImage,
    scaled: Option<RgbImage>,
}

impl Background {
    /// Pick and decode a random image from `dir`
    pub fn load_random(dir: &Path) -> Option<Self> {
        let images = list_images(dir);
        let path = images.choose(&mut rand::thread_rng())?;
        match image::open(path) {
            Ok(img) => {
                debug!("Using background {:?}", path);
                Some(Self::from_image(img.to_rgb8()))
            }
            Err(e) => {
                warn!("Failed to load background {:?}: {}", path, e);
                None
            }
        }
    }

    pub fn from_image(source: RgbImage) -> Self {
        Self {
            source,
            scaled: None,
        }
    }

    /// Pixels covering a `columns` x `rows` cell area, two pixel rows per cell
    pub fn pixels(&mut self, columns: u16, rows: u16) -> Option<&RgbImage> {
        let target = (u32::from(columns), u32::from(rows) * 2);
        if target.0 == 0 || target.1 == 0 {
            return None;
        }

        let cached = self
            .scaled
            .as_ref()
            .is_some_and(|img| img.dimensions() == target);
        if !cached {
            self.scaled = Some(self.scale_to(target));
        }
        self.scaled.as_ref()
    }

    fn scale_to(&self, target: (u32, u32)) -> RgbImage {
        let (width, height) = cover_size(self.source.dimensions(), target);
        let resized = imageops::resize(&self.source, width, height, FilterType::Lanczos3);
        let x = (width - target.0) / 2;
        let y = (height - target.1) / 2;
        imageops::crop_imm(&resized, x, y, target.0, target.1).to_image()
    }
}

/// Half-block widget for pre-scaled pixels
pub struct Backdrop<'a> {
    pixels: &'a RgbImage,
}

impl<'a> Backdrop<'a> {
    pub fn new(pixels: &'a RgbImage) -> Self {
        Self { pixels }
    }

    fn color(&self, x: u32, y: u32) -> Color {
        match self.pixels.get_pixel_checked(x, y) {
            Some(p) => Color::Rgb(p[0], p[1], p[2]),
            None => Color::Black,
        }
    }
}

impl Widget for Backdrop<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for row in 0..area.height {
            for column in 0..area.width {
                let x = u32::from(column);
                let y = u32::from(row) * 2;
                let top = self.color(x, y);
                let bottom = self.color(x, y + 1);
                if let Some(cell) = buf.cell_mut((area.x + column, area.y + row)) {
                    cell.set_symbol(UPPER_HALF_BLOCK).set_fg(top).set_bg(bottom);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use rstest::rstest;
    use tempfile::tempdir;

    #[rstest]
    #[case((1920, 1080), (80, 48), (85, 48))]
    #[case((1000, 1000), (80, 48), (80, 80))]
    #[case((100, 400), (80, 48), (80, 320))]
    #[case((80, 48), (80, 48), (80, 48))]
    #[case((0, 10), (80, 48), (80, 48))]
    fn test_cover_size(
        #[case] source: (u32, u32),
        #[case] target: (u32, u32),
        #[case] expected: (u32, u32),
    ) {
        let covered = cover_size(source, target);
        assert_eq!(covered, expected);
        assert!(covered.0 >= target.0 && covered.1 >= target.1);
    }

    #[test]
    fn test_image_filter() {
        assert!(is_image(Path::new("a.png")));
        assert!(is_image(Path::new("b.JPG")));
        assert!(is_image(Path::new("c.Jpeg")));
        assert!(!is_image(Path::new("d.gif")));
        assert!(!is_image(Path::new("png")));
    }

    #[test]
    fn test_list_images_skips_other_files() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("one.png"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        std::fs::create_dir(dir.path().join("nested.jpg")).unwrap();

        let images = list_images(dir.path());
        assert_eq!(images, vec![dir.path().join("one.png")]);
        assert!(list_images(&dir.path().join("missing")).is_empty());
    }

    #[test]
    fn test_missing_directory_gives_no_background() {
        let dir = tempdir().unwrap();
        assert!(Background::load_random(&dir.path().join("img")).is_none());
    }

    #[test]
    fn test_pixels_cover_cells_and_are_cached() {
        let source = RgbImage::from_pixel(64, 32, Rgb([200, 10, 10]));
        let mut background = Background::from_image(source);

        let pixels = background.pixels(20, 10).unwrap();
        assert_eq!(pixels.dimensions(), (20, 20));
        assert!(background.pixels(0, 10).is_none());
        assert_eq!(background.pixels(20, 10).unwrap().dimensions(), (20, 20));
        assert_eq!(background.pixels(30, 5).unwrap().dimensions(), (30, 10));
    }

    #[test]
    fn test_backdrop_uses_half_blocks() {
        let pixels = RgbImage::from_fn(2, 2, |_, y| if y == 0 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) });
        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        Backdrop::new(&pixels).render(area, &mut buf);

        let cell = &buf[(0, 0)];
        assert_eq!(cell.symbol(), UPPER_HALF_BLOCK);
        assert_eq!(cell.fg, Color::Rgb(255, 0, 0));
        assert_eq!(cell.bg, Color::Rgb(0, 0, 255));
    }
}
