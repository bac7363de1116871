//! Rendu PDF des pages (printpdf, polices Helvetica intégrées)

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use image::{DynamicImage, GenericImageView, RgbImage};
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfLayerReference, Point, Polygon,
};
use tracing::warn;

use super::layout::{DrawOp, Page, Rgb, BLACK, PAGE_HEIGHT, PAGE_WIDTH};

/// Résolution d'intégration des images
const IMAGE_DPI: f32 = 300.0;

const PT_PER_MM: f32 = 72.0 / 25.4;

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Produit le document PDF
///
/// Une image illisible est omise (avertissement), le reste est rendu.
pub fn render(pages: &[Page], title: &str) -> Result<Vec<u8>> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Capa 1");

    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .context("Failed to add Helvetica")?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .context("Failed to add Helvetica-Bold")?,
    };
    let mut images: HashMap<PathBuf, Option<DynamicImage>> = HashMap::new();

    for (index, page) in pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (p, l) = doc.add_page(
                Mm(PAGE_WIDTH),
                Mm(PAGE_HEIGHT),
                format!("Capa {}", index + 1),
            );
            doc.get_page(p).get_layer(l)
        };

        for op in &page.ops {
            draw(&layer, op, &fonts, &mut images);
        }
    }

    doc.save_to_bytes().context("Failed to serialize PDF")
}

fn draw(
    layer: &PdfLayerReference,
    op: &DrawOp,
    fonts: &Fonts,
    images: &mut HashMap<PathBuf, Option<DynamicImage>>,
) {
    match op {
        DrawOp::Text { x, y, font, text } => {
            layer.set_fill_color(color(BLACK));
            let face = if font.bold { &fonts.bold } else { &fonts.regular };
            layer.use_text(text.as_str(), font.size, Mm(*x), Mm(PAGE_HEIGHT - *y), face);
        }
        DrawOp::Rect { x, y, w, h, fill } => {
            let (left, right) = (*x, *x + *w);
            let (top, bottom) = (PAGE_HEIGHT - *y, PAGE_HEIGHT - *y - *h);
            layer.set_fill_color(color(*fill));
            layer.add_polygon(Polygon {
                rings: vec![vec![
                    (Point::new(Mm(left), Mm(bottom)), false),
                    (Point::new(Mm(right), Mm(bottom)), false),
                    (Point::new(Mm(right), Mm(top)), false),
                    (Point::new(Mm(left), Mm(top)), false),
                ]],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            });
        }
        DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            width,
            color: rule,
        } => {
            layer.set_outline_color(color(*rule));
            layer.set_outline_thickness(*width * PT_PER_MM);
            layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(*x1), Mm(PAGE_HEIGHT - *y1)), false),
                    (Point::new(Mm(*x2), Mm(PAGE_HEIGHT - *y2)), false),
                ],
                is_closed: false,
            });
        }
        DrawOp::Image { x, y, w, h, source } => {
            let decoded = images
                .entry(source.path.clone())
                .or_insert_with(|| match image::open(&source.path) {
                    Ok(img) => Some(DynamicImage::ImageRgb8(flatten_on_white(&img))),
                    Err(e) => {
                        warn!(path = %source.path.display(), error = %e, "Image skipped");
                        None
                    }
                });
            let Some(img) = decoded else {
                return;
            };

            let natural_w = img.width() as f32 / IMAGE_DPI * 25.4;
            let natural_h = img.height() as f32 / IMAGE_DPI * 25.4;
            Image::from_dynamic_image(img).add_to_layer(
                layer.clone(),
                ImageTransform {
                    translate_x: Some(Mm(*x)),
                    translate_y: Some(Mm(PAGE_HEIGHT - *y - *h)),
                    scale_x: Some(*w / natural_w),
                    scale_y: Some(*h / natural_h),
                    dpi: Some(IMAGE_DPI),
                    ..Default::default()
                },
            );
        }
    }
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(printpdf::Rgb::new(
        f32::from(rgb.0) / 255.0,
        f32::from(rgb.1) / 255.0,
        f32::from(rgb.2) / 255.0,
        None,
    ))
}

/// Supprime la transparence en composant sur fond blanc
fn flatten_on_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha)) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}
