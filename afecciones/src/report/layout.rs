//! Mise en page A4: pages d'opérations de dessin, sans effet de bord
//!
//! Coordonnées en millimètres, origine en haut à gauche. Chaque page reçoit
//! l'en-tête (logo) et le pied (filet bleu, « Página N ») à sa création.

use std::path::{Path, PathBuf};

use super::text::{string_width, wrap_to_width, Font};

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const MARGIN: f32 = 15.0;

/// Saut de page automatique à cette distance du bas
pub const BREAK_MARGIN: f32 = 20.0;

/// Marge intérieure des cellules
pub const CELL_PADDING: f32 = 1.0;

/// Position et hauteur maximale du logo
const LOGO_TOP: f32 = 5.0;
const LOGO_MAX_HEIGHT: f32 = 25.0;
const LOGO_GAP: f32 = 3.0;

/// Début du contenu sans logo
const NO_LOGO_TOP: f32 = 30.0;

const FOOTER_RULE_WIDTH: f32 = 0.5;

/// Largeur imprimable
pub const PRINTABLE_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

/// Couleur RVB
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const BLACK: Rgb = Rgb(0, 0, 0);
pub const SECTION_FILL: Rgb = Rgb(141, 179, 226);
pub const FOOTER_BLUE: Rgb = Rgb(0, 0, 255);

/// Image raster et ses dimensions en pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub path: PathBuf,
    pub width_px: u32,
    pub height_px: u32,
}

impl ImageSource {
    /// Lit les dimensions; None si le fichier est absent ou illisible
    pub fn probe(path: &Path) -> Option<Self> {
        let (width_px, height_px) = image::image_dimensions(path).ok()?;
        (width_px > 0 && height_px > 0).then(|| Self {
            path: path.to_path_buf(),
            width_px,
            height_px,
        })
    }

    /// Hauteur pour une largeur donnée
    pub fn height_for(&self, width: f32) -> f32 {
        width * self.height_px as f32 / self.width_px as f32
    }
}

/// Opération de dessin
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Texte, `y` = ligne de base
    Text { x: f32, y: f32, font: Font, text: String },
    /// Rectangle plein
    Rect { x: f32, y: f32, w: f32, h: f32, fill: Rgb },
    /// Segment
    Line { x1: f32, y1: f32, x2: f32, y2: f32, width: f32, color: Rgb },
    /// Image raster
    Image { x: f32, y: f32, w: f32, h: f32, source: ImageSource },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub number: usize,
    pub ops: Vec<DrawOp>,
}

/// Alignement horizontal dans une cellule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Moteur de mise en page (curseur vertical, sauts de page)
#[derive(Debug)]
pub struct Layout {
    pages: Vec<Page>,
    /// Haut du contenu de chaque page
    content_tops: Vec<f32>,
    current: usize,
    y: f32,
    logo: Option<ImageSource>,
}

impl Layout {
    pub fn new(logo: Option<ImageSource>) -> Self {
        Self {
            pages: Vec::new(),
            content_tops: Vec::new(),
            current: 0,
            y: 0.0,
            logo,
        }
    }

    /// Ouvre une nouvelle page en fin de document
    pub fn add_page(&mut self) {
        let number = self.pages.len() + 1;
        self.pages.push(Page {
            number,
            ops: Vec::new(),
        });
        self.current = number - 1;

        let top = self.header();
        self.footer(number);
        self.content_tops.push(top);
        self.y = top;
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    /// Position courante (page, y)
    pub fn position(&self) -> (usize, f32) {
        (self.current, self.y)
    }

    /// Revient à une position déjà atteinte
    pub fn set_position(&mut self, (page, y): (usize, f32)) {
        self.current = page.min(self.pages.len().saturating_sub(1));
        self.y = y;
    }

    /// Saut vertical, sans saut de page
    pub fn ln(&mut self, h: f32) {
        self.y += h;
    }

    /// Cellule sans déplacement du curseur (saut de page si nécessaire)
    #[allow(clippy::too_many_arguments)]
    pub fn cell(&mut self, x: f32, w: f32, h: f32, text: &str, font: Font, align: Align, fill: Option<Rgb>) {
        self.ensure(h);
        let y = self.y;
        if let Some(fill) = fill {
            self.push(DrawOp::Rect { x, y, w, h, fill });
        }
        self.text_in(x, y, w, h, text, font, align);
    }

    /// Cellule pleine largeur puis retour à la ligne
    pub fn row(&mut self, h: f32, text: &str, font: Font, align: Align, fill: Option<Rgb>) {
        self.cell(MARGIN, PRINTABLE_WIDTH, h, text, font, align, fill);
        self.y += h;
    }

    /// Texte sur plusieurs lignes dans la colonne [x, x + w]
    pub fn paragraph(&mut self, x: f32, w: f32, line_height: f32, text: &str, font: Font) {
        for line in wrap_to_width(text, w - 2.0 * CELL_PADDING, font) {
            self.cell(x, w, line_height, &line, font, Align::Left, None);
            self.y += line_height;
        }
    }

    /// Image centrée de largeur `w`
    pub fn image(&mut self, source: &ImageSource, w: f32) {
        let h = source.height_for(w);
        self.ensure(h);
        let x = (PAGE_WIDTH - w) / 2.0;
        self.push(DrawOp::Image {
            x,
            y: self.y,
            w,
            h,
            source: source.clone(),
        });
        self.y += h;
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn finish(self) -> Vec<Page> {
        self.pages
    }

    /// Passe à la page suivante (existante ou nouvelle) si `h` ne tient pas
    fn ensure(&mut self, h: f32) {
        if self.pages.is_empty() {
            self.add_page();
        }
        if self.y + h <= PAGE_HEIGHT - BREAK_MARGIN {
            return;
        }
        if self.current + 1 < self.pages.len() {
            self.current += 1;
            self.y = self.content_tops[self.current];
        } else {
            self.add_page();
        }
    }

    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.get_mut(self.current) {
            page.ops.push(op);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn text_in(&mut self, x: f32, y: f32, w: f32, h: f32, text: &str, font: Font, align: Align) {
        if text.is_empty() {
            return;
        }
        let width = string_width(text, font);
        let tx = match align {
            Align::Left => x + CELL_PADDING,
            Align::Center => x + (w - width) / 2.0,
            Align::Right => x + w - CELL_PADDING - width,
        };
        let baseline = y + h / 2.0 + 0.3 * font.size_mm();
        self.push(DrawOp::Text {
            x: tx,
            y: baseline,
            font,
            text: text.to_string(),
        });
    }

    /// Logo centré, plafonné en hauteur; retourne le haut du contenu
    fn header(&mut self) -> f32 {
        let Some(logo) = self.logo.clone() else {
            return NO_LOGO_TOP;
        };
        let mut w = PRINTABLE_WIDTH;
        let mut h = logo.height_for(w);
        if h > LOGO_MAX_HEIGHT {
            h = LOGO_MAX_HEIGHT;
            w = h * logo.width_px as f32 / logo.height_px as f32;
        }
        self.push(DrawOp::Image {
            x: (PAGE_WIDTH - w) / 2.0,
            y: LOGO_TOP,
            w,
            h,
            source: logo,
        });
        LOGO_TOP + h + LOGO_GAP
    }

    fn footer(&mut self, number: usize) {
        let y = PAGE_HEIGHT - MARGIN;
        self.push(DrawOp::Line {
            x1: MARGIN,
            y1: y,
            x2: PAGE_WIDTH - MARGIN,
            y2: y,
            width: FOOTER_RULE_WIDTH,
            color: FOOTER_BLUE,
        });
        self.text_in(
            MARGIN,
            y,
            PRINTABLE_WIDTH,
            10.0,
            &format!("Página {}", number),
            Font::regular(9.0),
            Align::Right,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logo(w: u32, h: u32) -> ImageSource {
        ImageSource {
            path: PathBuf::from("logo.png"),
            width_px: w,
            height_px: h,
        }
    }

    fn texts(page: &Page) -> Vec<&str> {
        page.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_header_without_logo() {
        let mut layout = Layout::new(None);
        layout.add_page();
        assert_eq!(layout.y(), 30.0);
        let pages = layout.finish();
        assert_eq!(texts(&pages[0]), vec!["Página 1"]);
    }

    #[test]
    fn test_wide_logo_fills_width() {
        // 1800x100 px: 180 mm de large, 10 mm de haut
        let mut layout = Layout::new(Some(logo(1800, 100)));
        layout.add_page();
        assert!((layout.y() - 18.0).abs() < 1e-4);
    }

    #[test]
    fn test_tall_logo_is_capped() {
        let mut layout = Layout::new(Some(logo(100, 100)));
        layout.add_page();
        assert!((layout.y() - 33.0).abs() < 1e-4);
        let pages = layout.finish();
        let DrawOp::Image { x, w, h, .. } = &pages[0].ops[0] else {
            panic!("logo expected first");
        };
        assert_eq!((*w, *h), (25.0, 25.0));
        assert!((*x - 92.5).abs() < 1e-4);
    }

    #[test]
    fn test_automatic_page_break() {
        let mut layout = Layout::new(None);
        layout.add_page();
        for i in 0..100 {
            layout.row(6.0, &format!("linea {}", i), Font::regular(10.0), Align::Left, None);
        }
        assert_eq!(layout.page_count(), 3);
        let pages = layout.finish();
        // Chaque page a son pied
        assert!(pages.iter().all(|p| texts(p).contains(&format!("Página {}", p.number).as_str())));
        // Aucun texte sous la limite de saut
        for page in &pages {
            for op in &page.ops {
                if let DrawOp::Text { y, text, .. } = op {
                    if !text.starts_with("Página") {
                        assert!(*y < PAGE_HEIGHT - BREAK_MARGIN);
                    }
                }
            }
        }
    }

    #[test]
    fn test_break_reuses_existing_page() {
        let mut layout = Layout::new(None);
        layout.add_page();
        let start = layout.position();
        for _ in 0..50 {
            layout.row(6.0, "izquierda", Font::regular(9.0), Align::Left, None);
        }
        assert_eq!(layout.page_count(), 2);

        layout.set_position(start);
        for _ in 0..50 {
            layout.row(6.0, "derecha", Font::regular(9.0), Align::Left, None);
        }
        assert_eq!(layout.page_count(), 2);
    }

    #[test]
    fn test_right_aligned_text() {
        let mut layout = Layout::new(None);
        layout.add_page();
        layout.row(10.0, "Fin", Font::regular(9.0), Align::Right, None);
        let pages = layout.finish();
        let width = string_width("Fin", Font::regular(9.0));
        let found = pages[0].ops.iter().any(|op| matches!(
            op,
            DrawOp::Text { x, text, .. } if text == "Fin" && (*x + width - (PAGE_WIDTH - MARGIN - CELL_PADDING)).abs() < 1e-3
        ));
        assert!(found);
    }
}
