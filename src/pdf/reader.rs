// Page geometry lookup for uploaded documents

use lopdf::{Dictionary, Object, ObjectId};

use crate::error::StampError;

/// 14,400 pt (200 in) を超えるページは壊れたMediaBoxとして扱う。
const MAX_PAGE_EXTENT_PT: f64 = 14_400.0;

/// Pagesツリーを遡る深さの上限。循環参照対策。
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Read-only view over a parsed PDF: page count and page sizes in points.
pub struct PdfReader {
    doc: lopdf::Document,
}

impl PdfReader {
    /// メモリ上のPDFバイト列を解析する。
    pub fn from_bytes(bytes: &[u8]) -> crate::error::Result<Self> {
        let doc = lopdf::Document::load_mem(bytes)?;
        Ok(Self { doc })
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// ページ `page_number` (1始まり) の (幅, 高さ) をptで返す。
    ///
    /// MediaBoxがページ辞書に無ければ親ノードから継承する。
    pub fn page_dimensions(&self, page_number: u32) -> crate::error::Result<(f64, f64)> {
        let page_id = self.page_id(page_number)?;
        let media_box = self.inherited_media_box(page_id)?;

        let [x0, y0, x1, y1] = match media_box.as_slice() {
            [a, b, c, d, ..] => [number(a)?, number(b)?, number(c)?, number(d)?],
            _ => return Err(StampError::pdf_read("MediaBox needs four numbers")),
        };
        let (width, height) = ((x1 - x0).abs(), (y1 - y0).abs());

        if width <= 0.0 || height <= 0.0 {
            return Err(StampError::pdf_read(format!(
                "page {page_number}: empty MediaBox"
            )));
        }
        if width > MAX_PAGE_EXTENT_PT || height > MAX_PAGE_EXTENT_PT {
            return Err(StampError::pdf_read(format!(
                "page {page_number}: MediaBox {width}x{height} pt exceeds {MAX_PAGE_EXTENT_PT} pt"
            )));
        }
        Ok((width, height))
    }

    fn page_id(&self, page_number: u32) -> crate::error::Result<ObjectId> {
        self.doc
            .get_pages()
            .get(&page_number)
            .copied()
            .ok_or_else(|| StampError::pdf_read(format!("page {page_number} not found")))
    }

    fn inherited_media_box(&self, page_id: ObjectId) -> crate::error::Result<Vec<Object>> {
        let mut node: &Dictionary = self.doc.get_dictionary(page_id)?;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            if let Ok(media_box) = node.get(b"MediaBox") {
                let media_box = match media_box {
                    Object::Reference(id) => self.doc.get_object(*id)?,
                    direct => direct,
                };
                return Ok(media_box.as_array()?.clone());
            }
            match node.get(b"Parent") {
                Ok(Object::Reference(parent)) => node = self.doc.get_dictionary(*parent)?,
                _ => break,
            }
        }
        Err(StampError::pdf_read("MediaBox not found"))
    }
}

fn number(obj: &Object) -> crate::error::Result<f64> {
    match obj {
        Object::Integer(i) => Ok(*i as f64),
        Object::Real(r) => Ok(*r as f64),
        other => Err(StampError::pdf_read(format!(
            "MediaBox entry is not a number: {other:?}"
        ))),
    }
}
