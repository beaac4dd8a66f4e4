// オーバーレイ合成: 出力PDFの構造・不可視テキスト・座標変換

mod common;

use common::{noise_image, region};
use image::{DynamicImage, GrayImage};
use lopdf::content::Content;
use lopdf::{Document, Object, Stream};
use pdf_searchable::encode::{ColorMode, EncodingConfig, ImageEncoding};
use pdf_searchable::page::region::{Point, Quad, TextRegion};
use pdf_searchable::page::{PageImage, PagePair};
use pdf_searchable::pipeline::compositor::{Compositor, PdfCompositor};

fn lossless() -> EncodingConfig {
    EncodingConfig {
        encoding: ImageEncoding::Lossless,
        color: ColorMode::Rgb,
    }
}

fn page_content(bytes: &[u8]) -> (Document, Content) {
    let doc = Document::load_mem(bytes).expect("emitted PDF should parse");
    let page_id = *doc.get_pages().get(&1).expect("page 1");
    let data = doc.get_page_content(page_id).expect("page content");
    let content = Content::decode(&data).expect("content stream should decode");
    (doc, content)
}

fn operators(content: &Content) -> Vec<&str> {
    content
        .operations
        .iter()
        .map(|op| op.operator.as_str())
        .collect()
}

fn image_stream(doc: &Document) -> &Stream {
    doc.objects
        .values()
        .find_map(|obj| match obj {
            Object::Stream(s)
                if s.dict.get(b"Subtype").and_then(Object::as_name).ok() == Some(b"Image".as_slice()) =>
            {
                Some(s)
            }
            _ => None,
        })
        .expect("image XObject")
}

fn name_of<'a>(stream: &'a Stream, key: &[u8]) -> &'a [u8] {
    stream.dict.get(key).and_then(Object::as_name).expect("name entry")
}

fn wide_page(regions: Vec<TextRegion>) -> PagePair {
    PagePair::new(PageImage::new(noise_image(1600, 400, 3), 200.0), regions)
}

// ============================================================
// 1. テキストレイヤー
// ============================================================

#[test]
fn test_invisible_run_per_region() {
    let pair = wide_page(vec![
        region(100.0, 100.0, 400.0, 40.0, "invoice", 0.9),
        region(800.0, 200.0, 320.0, 60.0, "total", 0.8),
    ]);
    let doc = PdfCompositor.compose(&pair, &lossless()).unwrap();
    assert_eq!(doc.placed_regions.len(), 2);
    assert_eq!(doc.skipped_regions, 0);

    let (_, content) = page_content(&doc.bytes);
    let ops = operators(&content);
    assert_eq!(ops.iter().filter(|op| **op == "Tj").count(), 2);
    assert_eq!(ops.iter().filter(|op| **op == "BT").count(), 1);

    let tr = content
        .operations
        .iter()
        .find(|op| op.operator == "Tr")
        .expect("Tr operator");
    assert_eq!(tr.operands[0].as_i64().ok(), Some(3));

    let texts: Vec<&[u8]> = content
        .operations
        .iter()
        .filter(|op| op.operator == "Tj")
        .map(|op| op.operands[0].as_str().expect("string operand"))
        .collect();
    assert_eq!(texts, vec![b"invoice".as_slice(), b"total".as_slice()]);
}

#[test]
fn test_run_spans_detection_width() {
    // 400x40 px @ 200dpi → 144pt x 14.4pt。"invoice" は7文字。
    let pair = wide_page(vec![region(100.0, 100.0, 400.0, 40.0, "invoice", 0.9)]);
    let doc = PdfCompositor.compose(&pair, &lossless()).unwrap();
    let (_, content) = page_content(&doc.bytes);

    let operand = |name: &str, index: usize| -> f32 {
        content
            .operations
            .iter()
            .find(|op| op.operator == name)
            .and_then(|op| op.operands[index].as_float().ok())
            .expect("numeric operand")
    };

    let font_size = operand("Tf", 1);
    let scale = operand("Tz", 0);
    assert!((font_size - 14.4).abs() < 1e-3, "font size {font_size}");
    let run_width = 7.0 * 0.5 * font_size * scale / 100.0;
    assert!((run_width - 144.0).abs() < 1e-2, "run width {run_width}");

    // ベースライン左下: x = 100px → 36pt, y = 144pt - 140px * 0.36 = 93.6pt
    assert!((operand("Tm", 4) - 36.0).abs() < 1e-3);
    assert!((operand("Tm", 5) - 93.6).abs() < 1e-3);
    assert!((operand("Tm", 0) - 1.0).abs() < 1e-6);
}

#[test]
fn test_rotated_region_follows_baseline() {
    // 45度傾いた四角形: 左下(100,300) → 右下(200,200)
    let quad = Quad::new([
        Point::new(90.0, 290.0),
        Point::new(190.0, 190.0),
        Point::new(200.0, 200.0),
        Point::new(100.0, 300.0),
    ]);
    let pair = wide_page(vec![TextRegion::new(quad, "slant", 0.9)]);
    let doc = PdfCompositor.compose(&pair, &lossless()).unwrap();
    let (_, content) = page_content(&doc.bytes);

    let tm = content
        .operations
        .iter()
        .find(|op| op.operator == "Tm")
        .expect("Tm operator");
    let m: Vec<f32> = tm
        .operands
        .iter()
        .map(|o| o.as_float().expect("number"))
        .collect();
    let half_sqrt2 = std::f32::consts::FRAC_1_SQRT_2;
    // 画像のy下向き → ページのy上向きで、右上がりのベースラインになる
    assert!((m[0] - half_sqrt2).abs() < 1e-4);
    assert!((m[1] - half_sqrt2).abs() < 1e-4);
    assert!((m[2] + half_sqrt2).abs() < 1e-4);
    assert!((m[3] - half_sqrt2).abs() < 1e-4);
}

#[test]
fn test_unplaceable_regions_skipped() {
    let pair = wide_page(vec![
        region(100.0, 100.0, 400.0, 40.0, "kept", 0.9),
        region(100.0, 200.0, 400.0, 40.0, "   ", 0.9),
        region(300.0, 300.0, 0.0, 40.0, "flat", 0.9),
    ]);
    let doc = PdfCompositor.compose(&pair, &lossless()).unwrap();
    assert_eq!(doc.placed_regions.len(), 1);
    assert_eq!(doc.skipped_regions, 2);

    let (_, content) = page_content(&doc.bytes);
    assert_eq!(
        operators(&content).iter().filter(|op| **op == "Tj").count(),
        1
    );
}

#[test]
fn test_no_regions_no_text_block() {
    let doc = PdfCompositor.compose(&wide_page(Vec::new()), &lossless()).unwrap();
    let (_, content) = page_content(&doc.bytes);
    let ops = operators(&content);
    assert_eq!(ops, vec!["q", "cm", "Do", "Q"]);
}

#[test]
fn test_non_ascii_text_becomes_win_ansi() {
    let pair = wide_page(vec![region(100.0, 100.0, 400.0, 40.0, "café 日本", 0.9)]);
    let doc = PdfCompositor.compose(&pair, &lossless()).unwrap();
    let (_, content) = page_content(&doc.bytes);
    let tj = content
        .operations
        .iter()
        .find(|op| op.operator == "Tj")
        .expect("Tj operator");
    assert_eq!(tj.operands[0].as_str().unwrap(), b"caf\xe9 ??");
}

// ============================================================
// 2. ページ構造
// ============================================================

#[test]
fn test_media_box_matches_image_at_dpi() {
    let doc = PdfCompositor.compose(&wide_page(Vec::new()), &lossless()).unwrap();
    let (pdf, _) = page_content(&doc.bytes);
    let page_id = *pdf.get_pages().get(&1).unwrap();
    let media_box: Vec<f32> = pdf
        .get_dictionary(page_id)
        .unwrap()
        .get(b"MediaBox")
        .and_then(Object::as_array)
        .unwrap()
        .iter()
        .map(|o| o.as_float().unwrap())
        .collect();
    // 1600x400 px @ 200dpi
    assert_eq!(media_box, vec![0.0, 0.0, 576.0, 144.0]);
}

#[test]
fn test_overlay_font_has_fixed_widths() {
    let doc = PdfCompositor.compose(&wide_page(Vec::new()), &lossless()).unwrap();
    let pdf = Document::load_mem(&doc.bytes).unwrap();
    let font = pdf
        .objects
        .values()
        .find_map(|obj| match obj {
            Object::Dictionary(d)
                if d.get(b"Type").and_then(Object::as_name).ok() == Some(b"Font".as_slice()) =>
            {
                Some(d)
            }
            _ => None,
        })
        .expect("font dictionary");

    assert_eq!(
        font.get(b"BaseFont").and_then(Object::as_name).unwrap(),
        b"Helvetica"
    );
    let widths = font.get(b"Widths").and_then(Object::as_array).unwrap();
    assert_eq!(widths.len(), 224);
    assert!(widths.iter().all(|w| w.as_i64().ok() == Some(500)));
}

#[test]
fn test_lossless_rgb_image_stream() {
    let doc = PdfCompositor.compose(&wide_page(Vec::new()), &lossless()).unwrap();
    assert_eq!((doc.image_width, doc.image_height), (1600, 400));
    let pdf = Document::load_mem(&doc.bytes).unwrap();
    let image = image_stream(&pdf);
    assert_eq!(name_of(image, b"Filter"), b"FlateDecode");
    assert_eq!(name_of(image, b"ColorSpace"), b"DeviceRGB");
}

#[test]
fn test_jpeg_grayscale_image_stream() {
    let encoding = EncodingConfig {
        encoding: ImageEncoding::Jpeg { quality: 60 },
        color: ColorMode::Grayscale,
    };
    let doc = PdfCompositor.compose(&wide_page(Vec::new()), &encoding).unwrap();
    let pdf = Document::load_mem(&doc.bytes).unwrap();
    let image = image_stream(&pdf);
    assert_eq!(name_of(image, b"Filter"), b"DCTDecode");
    assert_eq!(name_of(image, b"ColorSpace"), b"DeviceGray");
    assert!(image.content.starts_with(&[0xFF, 0xD8]));
}

#[test]
fn test_jpeg_smaller_than_lossless_for_noise() {
    let pair = wide_page(Vec::new());
    let lossless_size = PdfCompositor.compose(&pair, &lossless()).unwrap().size();
    let jpeg = EncodingConfig {
        encoding: ImageEncoding::Jpeg { quality: 50 },
        color: ColorMode::Rgb,
    };
    assert!(PdfCompositor.compose(&pair, &jpeg).unwrap().size() < lossless_size);
}

#[test]
fn test_invalid_dpi_rejected() {
    let gray = DynamicImage::ImageLuma8(GrayImage::new(10, 10));
    let pair = PagePair::new(PageImage::new(gray, 0.0), Vec::new());
    assert!(PdfCompositor.compose(&pair, &lossless()).is_err());
}
