// 共通テストヘルパー: lopdfで生成したPDF、PNGスタンプ、擬似レンダラ
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use image::{DynamicImage, Rgba, RgbaImage};
use lopdf::{Document as LoDocument, Object, Stream, dictionary};
use pdf_stamper::document::Document;
use pdf_stamper::error::StampError;
use pdf_stamper::pdf::reader::PdfReader;
use pdf_stamper::raster::EncodedRaster;
use pdf_stamper::render::{DocumentRenderer, RenderSession, Viewport};

/// ヘルパー: 各ページのMediaBox(幅, 高さ pt)を指定して最小限のPDFを作成する
pub fn create_test_pdf(page_sizes: &[(f32, f32)]) -> Vec<u8> {
    let mut doc = LoDocument::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for &(width, height) in page_sizes {
        let contents_id = doc.add_object(Stream::new(dictionary! {}, vec![]));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width),
                Object::Real(height),
            ],
            "Contents" => contents_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_sizes.len() as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("save test pdf");
    buf
}

/// ヘルパー: 同一サイズのページをn枚持つDocument
pub fn test_document(pages: usize, width: f32, height: f32) -> Document {
    let bytes = create_test_pdf(&vec![(width, height); pages]);
    Document::from_bytes("test.pdf", bytes).expect("valid test pdf")
}

/// ヘルパー: 単色PNGのバイト列
pub fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba(color));
    EncodedRaster::encode_png(&image)
        .expect("encode png")
        .as_bytes()
        .to_vec()
}

pub fn png_raster(width: u32, height: u32, color: [u8; 4]) -> EncodedRaster {
    EncodedRaster::from_bytes(png_bytes(width, height, color))
}

/// ページ番号ごとに異なる単色（描画結果の取り違え検出用）
pub fn page_color(page_number: u32) -> Rgba<u8> {
    Rgba([(page_number * 40 % 256) as u8, 100, 200, 255])
}

/// 擬似レンダラ: lopdfでページ数とMediaBoxを読み、単色ビットマップを返す。
#[derive(Debug, Default, Clone)]
pub struct FakeRenderer {
    /// セッション確立（ready）までの遅延
    pub ready_delay: Duration,
    /// このページの描画で失敗する
    pub fail_page: Option<u32>,
    /// 描画サイズをビューポートから1pxずらす
    pub wrong_size: bool,
    /// 描画されたページ番号（呼び出し順）
    pub rendered: Arc<Mutex<Vec<u32>>>,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(ready_delay: Duration) -> Self {
        Self {
            ready_delay,
            ..Self::default()
        }
    }

    pub fn failing_on(page: u32) -> Self {
        Self {
            fail_page: Some(page),
            ..Self::default()
        }
    }

    pub fn rendered_pages(&self) -> Vec<u32> {
        self.rendered.lock().unwrap().clone()
    }
}

struct FakeSession<'a> {
    reader: PdfReader,
    renderer: &'a FakeRenderer,
}

impl RenderSession for FakeSession<'_> {
    fn page_count(&self) -> u32 {
        self.reader.page_count()
    }

    fn page_size_pts(&self, page_number: u32) -> pdf_stamper::error::Result<(f32, f32)> {
        let (w, h) = self.reader.page_dimensions(page_number)?;
        Ok((w as f32, h as f32))
    }

    fn render(
        &self,
        page_number: u32,
        viewport: Viewport,
    ) -> pdf_stamper::error::Result<DynamicImage> {
        if self.renderer.fail_page == Some(page_number) {
            return Err(StampError::render("simulated render failure"));
        }
        self.renderer.rendered.lock().unwrap().push(page_number);
        let extra = u32::from(self.renderer.wrong_size);
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            viewport.width + extra,
            viewport.height,
            page_color(page_number),
        )))
    }
}

impl DocumentRenderer for FakeRenderer {
    fn with_session(
        &self,
        bytes: &[u8],
        f: &mut dyn FnMut(&dyn RenderSession) -> pdf_stamper::error::Result<()>,
    ) -> pdf_stamper::error::Result<()> {
        std::thread::sleep(self.ready_delay);
        let session = FakeSession {
            reader: PdfReader::from_bytes(bytes)?,
            renderer: self,
        };
        f(&session)
    }
}

/// ワーカースレッドがドキュメントのバイト列を解放するまで待つ
pub fn wait_for_release(document: &Document) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if document.byte_handle_count() == 1 {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}
