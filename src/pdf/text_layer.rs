// 不可視テキストレイヤー: OCR領域 → 3 Tr テキストラン配置

use lopdf::content::Operation;
use lopdf::{Object, StringFormat};

use crate::error::PdfSearchError;
use crate::page::region::{Point, TextRegion};

/// Advance width of every glyph in the overlay font, in 1/1000 em.
///
/// All glyphs share one width so a run's length depends only on its
/// character count, which keeps the horizontal-scale math exact.
pub const GLYPH_WIDTH: i64 = 500;

/// First and last WinAnsi code covered by the overlay font's `/Widths`.
pub const FIRST_CHAR: i64 = 32;
pub const LAST_CHAR: i64 = 255;

/// Smallest edge (in pixels) a region may have and still be placed.
const MIN_EDGE_PX: f64 = 0.5;

/// Text render mode 3: neither fill nor stroke.
const RENDER_MODE_INVISIBLE: i64 = 3;

/// One invisible text run in page space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPlacement {
    /// WinAnsi-encoded string bytes.
    pub text: Vec<u8>,
    pub font_size: f64,
    /// `Tz` operand, in percent.
    pub horizontal_scale: f64,
    /// `Tm` operands `[a b c d e f]`.
    pub matrix: [f64; 6],
}

impl TextPlacement {
    /// Rendered width of the run in points.
    pub fn run_width(&self) -> f64 {
        self.text.len() as f64 * (GLYPH_WIDTH as f64 / 1000.0)
            * self.font_size
            * self.horizontal_scale
            / 100.0
    }
}

/// Image pixel space → PDF page space (points, y up).
#[derive(Debug, Clone, Copy)]
pub struct PageSpace {
    pub pts_per_px: f64,
    pub page_height_pts: f64,
}

impl PageSpace {
    fn to_page(&self, p: Point) -> (f64, f64) {
        (
            p.x * self.pts_per_px,
            self.page_height_pts - p.y * self.pts_per_px,
        )
    }
}

/// 領域の四角形からテキストランの配置を計算する。
///
/// ベースラインは左下→右下の辺。フォントサイズは左辺の長さ、
/// 水平スケール(Tz)はランの幅が検出幅と一致するように決める。
pub fn place_region(
    region: &TextRegion,
    space: &PageSpace,
) -> crate::error::Result<TextPlacement> {
    let trimmed = region.text.trim();
    if trimmed.is_empty() {
        return Err(PdfSearchError::compose("region has no text"));
    }
    if !region.quad.is_finite() {
        return Err(PdfSearchError::compose(format!(
            "region '{}' has non-finite coordinates",
            trimmed
        )));
    }

    let width_px = region.quad.baseline_length();
    let height_px = region.quad.line_height();
    if width_px < MIN_EDGE_PX || height_px < MIN_EDGE_PX {
        return Err(PdfSearchError::compose(format!(
            "region '{}' is degenerate ({:.2}x{:.2} px)",
            trimmed, width_px, height_px
        )));
    }

    let text = to_win_ansi(trimmed);
    let (x0, y0) = space.to_page(region.quad.bottom_left());
    let (x1, y1) = space.to_page(region.quad.bottom_right());
    let width = (x1 - x0).hypot(y1 - y0);
    let (cos, sin) = ((x1 - x0) / width, (y1 - y0) / width);

    let font_size = height_px * space.pts_per_px;
    let natural_width = text.len() as f64 * (GLYPH_WIDTH as f64 / 1000.0) * font_size;
    let horizontal_scale = 100.0 * width / natural_width;

    Ok(TextPlacement {
        text,
        font_size,
        horizontal_scale,
        matrix: [cos, sin, -sin, cos, x0, y0],
    })
}

/// 配置済みテキストランを1つの BT..ET ブロックのオペレータ列に変換する。
///
/// 空の配置リストに対しては何も出力しない。
pub fn text_layer_operations(placements: &[TextPlacement], font_name: &str) -> Vec<Operation> {
    if placements.is_empty() {
        return Vec::new();
    }

    let mut ops = Vec::with_capacity(placements.len() * 4 + 3);
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tr", vec![RENDER_MODE_INVISIBLE.into()]));
    for p in placements {
        ops.push(Operation::new(
            "Tf",
            vec![Object::Name(font_name.as_bytes().to_vec()), real(p.font_size)],
        ));
        ops.push(Operation::new("Tz", vec![real(p.horizontal_scale)]));
        ops.push(Operation::new(
            "Tm",
            p.matrix.iter().map(|&v| real(v)).collect(),
        ));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(p.text.clone(), StringFormat::Literal)],
        ));
    }
    ops.push(Operation::new("ET", vec![]));
    ops
}

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

/// Encode text as WinAnsi bytes. Unmappable characters become `?`.
pub fn to_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7E}' | '\u{A0}'..='\u{FF}' => c as u8,
            c if c.is_whitespace() || c.is_control() => b' ',
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::region::Quad;

    const SPACE: PageSpace = PageSpace {
        pts_per_px: 0.5,
        page_height_pts: 500.0,
    };

    #[test]
    fn test_axis_aligned_region_spans_detection_width() {
        let region = TextRegion::new(Quad::from_rect(100.0, 200.0, 300.0, 40.0), "Invoice", 0.9);
        let p = place_region(&region, &SPACE).expect("place");
        assert_eq!(p.font_size, 20.0);
        // bottom-left (100, 240) px → (50, 380) pt
        assert_eq!(p.matrix, [1.0, 0.0, -0.0, 1.0, 50.0, 380.0]);
        assert!((p.run_width() - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotated_region_follows_baseline() {
        let quad = Quad::new([
            Point::new(0.0, 100.0),
            Point::new(100.0, 0.0),
            Point::new(110.0, 10.0),
            Point::new(10.0, 110.0),
        ]);
        let region = TextRegion::new(quad, "slanted", 0.8);
        let p = place_region(&region, &SPACE).expect("place");
        let angle = p.matrix[1].atan2(p.matrix[0]).to_degrees();
        assert!((angle - 45.0).abs() < 1e-9, "angle was {angle}");
    }

    #[test]
    fn test_rejects_blank_and_degenerate_regions() {
        let blank = TextRegion::new(Quad::from_rect(0.0, 0.0, 10.0, 10.0), "  ", 0.9);
        assert!(place_region(&blank, &SPACE).is_err());
        let flat = TextRegion::new(Quad::from_rect(0.0, 0.0, 10.0, 0.0), "x", 0.9);
        assert!(place_region(&flat, &SPACE).is_err());
        let nan = TextRegion::new(Quad::from_rect(f64::NAN, 0.0, 10.0, 10.0), "x", 0.9);
        assert!(place_region(&nan, &SPACE).is_err());
    }

    #[test]
    fn test_operations_wrap_runs_in_invisible_text_block() {
        let region = TextRegion::new(Quad::from_rect(0.0, 0.0, 50.0, 10.0), "hi", 0.9);
        let p = place_region(&region, &SPACE).expect("place");
        let ops = text_layer_operations(&[p], "F1");
        let operators: Vec<&str> = ops.iter().map(|o| o.operator.as_str()).collect();
        assert_eq!(operators, vec!["BT", "Tr", "Tf", "Tz", "Tm", "Tj", "ET"]);
        assert_eq!(ops[1].operands[0].as_i64().ok(), Some(3));
    }

    #[test]
    fn test_no_operations_for_empty_layer() {
        assert!(text_layer_operations(&[], "F1").is_empty());
    }

    #[test]
    fn test_win_ansi_mapping() {
        assert_eq!(to_win_ansi("Café – ok"), b"Caf\xE9 \x96 ok".to_vec());
        assert_eq!(to_win_ansi("日本"), b"??".to_vec());
    }
}
