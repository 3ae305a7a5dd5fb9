//! Summary image rendering
//!
//! Draws the fixed 600x400 dashboard (total count, top five by
//! estimated GDP, refresh timestamp) and overwrites the cached PNG on
//! every refresh.

use async_trait::async_trait;
use atlas_core::{AtlasError, Country, CountryStore, RefreshHook, Result};
use chrono::Utc;
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{ImageOutputFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

const WIDTH: u32 = 600;
const HEIGHT: u32 = 400;
const BACKGROUND: Rgb<u8> = Rgb([30, 30, 30]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const GREY: Rgb<u8> = Rgb([200, 200, 200]);
const TOP_LIMIT: i64 = 5;

pub struct SummaryRenderer {
    store: Arc<dyn CountryStore>,
    image_path: PathBuf,
}

impl SummaryRenderer {
    pub fn new(store: Arc<dyn CountryStore>, image_path: PathBuf) -> Self {
        Self { store, image_path }
    }

    pub async fn render(&self) -> Result<()> {
        let total = self.store.count().await?;
        let top = self.store.top_by_gdp(TOP_LIMIT).await?;
        let stamp = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

        let image = draw_summary(total, &top, &stamp);

        let mut encoded = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut encoded), ImageOutputFormat::Png)
            .map_err(|e| AtlasError::Render(e.to_string()))?;

        if let Some(parent) = self.image_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.image_path, encoded).await?;

        tracing::info!(
            "Summary image written to {} ({} ranked lines)",
            self.image_path.display(),
            top.len()
        );

        Ok(())
    }
}

#[async_trait]
impl RefreshHook for SummaryRenderer {
    async fn after_refresh(&self) -> Result<()> {
        self.render().await
    }
}

fn draw_summary(total: i64, top: &[Country], stamp: &str) -> RgbImage {
    let mut image = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);

    draw_text(
        &mut image,
        20,
        20,
        &format!("Total Countries: {total}"),
        WHITE,
    );
    draw_text(&mut image, 20, 50, "Top 5 Countries by Estimated GDP:", WHITE);

    let mut y = 80;
    for (rank, country) in top.iter().enumerate() {
        // A null GDP can only reach the top five when fewer than five
        // countries have one; render it as zero.
        let gdp = format_thousands(country.estimated_gdp.unwrap_or(0.0));
        let line = format!("{}. {} - ${}", rank + 1, country.name, gdp);
        draw_text(&mut image, 40, y, &line, GREY);
        y += 25;
    }

    draw_text(
        &mut image,
        40,
        y + 20,
        &format!("Last Refreshed: {stamp}"),
        WHITE,
    );

    image
}

/// Blit a string with the 8x8 bitmap font; glyphs outside the canvas
/// are clipped.
fn draw_text(image: &mut RgbImage, x: u32, y: u32, text: &str, color: Rgb<u8>) {
    let mut cursor_x = x;
    for ch in text.chars() {
        if let Some(glyph) = BASIC_FONTS.get(ch) {
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..8u32 {
                    if bits & (1 << col) != 0 {
                        let px = cursor_x + col;
                        let py = y + row as u32;
                        if px < image.width() && py < image.height() {
                            image.put_pixel(px, py, color);
                        }
                    }
                }
            }
        }
        cursor_x += 8;
    }
}

/// Round to a whole number and insert thousands separators.
fn format_thousands(value: f64) -> String {
    let rounded = value.round();
    if !rounded.is_finite() {
        return rounded.to_string();
    }

    let digits = format!("{:.0}", rounded.abs());
    let bytes = digits.as_bytes();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*b as char);
    }

    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
