// PDF構築: ページ幅にスケールしたラスタスライスを1ページずつ配置する

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::RgbImage;
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

use super::mm_to_pt;

/// 固定サイズのページにRGB画像を1枚ずつ配置するPDFライタ。
///
/// 画像はページ上端に揃えて配置される（最終ページの余白は下側に残る）。
pub struct PaginatedWriter {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    page_width_pt: f64,
    page_height_pt: f64,
}

impl PaginatedWriter {
    pub fn new(page_width_mm: f64, page_height_mm: f64) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
            page_width_pt: mm_to_pt(page_width_mm),
            page_height_pt: mm_to_pt(page_height_mm),
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// RGB画像XObject（FlateDecode）を追加する。
    ///
    /// 戻り値はXObjectのオブジェクトID。
    pub fn add_image_xobject(&mut self, image: &RgbImage) -> crate::error::Result<ObjectId> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(image.as_raw())?;
        let compressed = encoder.finish()?;

        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width() as i64,
            "Height" => image.height() as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };
        Ok(self.doc.add_object(Object::Stream(Stream::new(dict, compressed))))
    }

    /// 画像1枚を描画するコンテンツストリームを生成する:
    /// `q <w> 0 0 <h> <x> <y> cm /Name Do Q`
    pub fn build_image_content_stream(
        name: &str,
        width_pt: f64,
        height_pt: f64,
        x_pt: f64,
        y_pt: f64,
    ) -> Vec<u8> {
        format!("q {width_pt:.4} 0 0 {height_pt:.4} {x_pt:.4} {y_pt:.4} cm /{name} Do Q")
            .into_bytes()
    }

    /// 画像を新しいページに配置する。
    ///
    /// `dest_width_mm` x `dest_height_mm` の領域にページ左上を基準として描画する。
    pub fn add_image_page(
        &mut self,
        image: &RgbImage,
        dest_width_mm: f64,
        dest_height_mm: f64,
    ) -> crate::error::Result<ObjectId> {
        if image.width() == 0 || image.height() == 0 {
            return Err(crate::error::StampError::pdf_write(
                "cannot place an empty image on a page",
            ));
        }

        let image_id = self.add_image_xobject(image)?;

        let resources_id = self.doc.add_object(dictionary! {
            "XObject" => dictionary! {
                "Im0" => Object::Reference(image_id),
            },
        });

        // PDF座標系は左下原点のため、上端揃えはページ高さから描画高さを引いた位置
        let width_pt = mm_to_pt(dest_width_mm);
        let height_pt = mm_to_pt(dest_height_mm);
        let y_pt = (self.page_height_pt - height_pt).max(0.0);
        let content_bytes = Self::build_image_content_stream("Im0", width_pt, height_pt, 0.0, y_pt);
        let content_id = self
            .doc
            .add_object(Object::Stream(Stream::new(dictionary! {}, content_bytes)));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(self.page_width_pt as f32),
                Object::Real(self.page_height_pt as f32),
            ],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        self.page_ids.push(page_id);
        Ok(page_id)
    }

    /// Pagesノードとカタログを確定し、PDFをバイト列として出力する。
    pub fn finish(mut self) -> crate::error::Result<Vec<u8>> {
        if self.page_ids.is_empty() {
            return Err(crate::error::StampError::pdf_write("document has no pages"));
        }

        let kids: Vec<Object> = self.page_ids.iter().map(|&id| id.into()).collect();
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => self.page_ids.len() as i64,
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        self.doc
            .save_to(&mut buf)
            .map_err(|e| crate::error::StampError::pdf_write(e.to_string()))?;
        Ok(buf)
    }
}
