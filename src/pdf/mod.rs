pub mod reader;
pub mod writer;

/// 1 inch = 25.4 mm = 72 pt
pub const PT_PER_MM: f64 = 72.0 / 25.4;

pub fn mm_to_pt(mm: f64) -> f64 {
    mm * PT_PER_MM
}
