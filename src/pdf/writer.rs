// 画像XObject + 不可視テキストレイヤーで1ページのPDFを組み立てる

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use crate::encode::EncodedImage;
use crate::encode::flate;
use crate::error::PdfSearchError;
use crate::pdf::text_layer::{
    FIRST_CHAR, GLYPH_WIDTH, LAST_CHAR, TextPlacement, text_layer_operations,
};

/// Resource name of the page background image.
pub const IMAGE_NAME: &str = "Im0";
/// Resource name of the overlay font.
pub const FONT_NAME: &str = "F1";

/// 背景画像と不可視テキストからなる単一ページPDFを構築する。
pub struct SearchablePageWriter {
    doc: Document,
}

impl Default for SearchablePageWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchablePageWriter {
    pub fn new() -> Self {
        Self {
            doc: Document::with_version("1.5"),
        }
    }

    /// 背景画像XObjectを追加する。
    ///
    /// 戻り値はXObjectのオブジェクトID。
    pub fn add_image_xobject(&mut self, image: &EncodedImage) -> lopdf::ObjectId {
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width as i64,
            "Height" => image.height as i64,
            "ColorSpace" => image.color_space,
            "BitsPerComponent" => image.bits_per_component as i64,
            "Filter" => image.filter,
        };
        let stream = Stream::new(dict, image.data.clone());
        self.doc.add_object(Object::Stream(stream))
    }

    /// オーバーレイ用フォントを追加する。
    ///
    /// 非埋め込みHelveticaに固定幅の `/Widths` を与える。ビューアは
    /// `/Widths` で文字送りを決めるため、テキストランの幅は文字数だけで決まる。
    pub fn add_overlay_font(&mut self) -> lopdf::ObjectId {
        let widths: Vec<Object> = (FIRST_CHAR..=LAST_CHAR)
            .map(|_| Object::Integer(GLYPH_WIDTH))
            .collect();
        self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
            "FirstChar" => FIRST_CHAR,
            "LastChar" => LAST_CHAR,
            "Widths" => widths,
        })
    }

    /// ページ全体に画像を描画し、続けてテキストレイヤーを描くコンテンツストリームを生成する。
    ///
    /// `q <w> 0 0 <h> 0 0 cm /Im0 Do Q BT 3 Tr ... ET`
    pub fn build_page_content(
        page_width_pts: f64,
        page_height_pts: f64,
        placements: &[TextPlacement],
    ) -> crate::error::Result<Vec<u8>> {
        let mut operations = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(page_width_pts as f32),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(page_height_pts as f32),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ];
        operations.extend(text_layer_operations(placements, FONT_NAME));

        Content { operations }
            .encode()
            .map_err(|e| PdfSearchError::pdf_write(e.to_string()))
    }

    /// 画像とテキスト配置からPDFページを構築する。
    pub fn write_page(
        &mut self,
        image: &EncodedImage,
        page_width_pts: f64,
        page_height_pts: f64,
        placements: &[TextPlacement],
    ) -> crate::error::Result<lopdf::ObjectId> {
        if !(page_width_pts > 0.0 && page_height_pts > 0.0) {
            return Err(PdfSearchError::pdf_write(format!(
                "invalid page size {}x{} pt",
                page_width_pts, page_height_pts
            )));
        }

        let image_id = self.add_image_xobject(image);
        let font_id = self.add_overlay_font();

        let pages_id = self.doc.new_object_id();

        let mut xobject_dict = lopdf::Dictionary::new();
        xobject_dict.set(IMAGE_NAME, Object::Reference(image_id));
        let mut font_dict = lopdf::Dictionary::new();
        font_dict.set(FONT_NAME, Object::Reference(font_id));

        let resources_id = self.doc.add_object(dictionary! {
            "XObject" => Object::Dictionary(xobject_dict),
            "Font" => Object::Dictionary(font_dict),
        });

        let content = Self::build_page_content(page_width_pts, page_height_pts, placements)?;
        let compressed = flate::encode_samples(&content)
            .map_err(|e| PdfSearchError::pdf_write(e.to_string()))?;
        let content_stream = Stream::new(dictionary! { "Filter" => "FlateDecode" }, compressed);
        let content_id = self.doc.add_object(Object::Stream(content_stream));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(page_width_pts as f32),
                Object::Real(page_height_pts as f32),
            ],
            "Resources" => resources_id,
            "Contents" => content_id,
        });

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        };
        self.doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        Ok(page_id)
    }

    /// PDFドキュメントをバイト列として出力する。
    pub fn save_to_bytes(mut self) -> crate::error::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.doc
            .save_to(&mut buf)
            .map_err(|e| PdfSearchError::pdf_write(e.to_string()))?;
        Ok(buf)
    }
}
