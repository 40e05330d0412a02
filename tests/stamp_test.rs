mod common;

use common::png_bytes;
use image::Rgba;
use pdf_stamper::error::StampError;
use pdf_stamper::raster::EncodedRaster;
use pdf_stamper::stamp::StampSource;
use pdf_stamper::stamp::factory::{OverlayFactory, PlacementGrid};
use pdf_stamper::stamp::registry::{StampRegistry, StampUpload};
use pdf_stamper::surface::{OverlaySurface, SurfaceConfig};

fn png_upload(name: &str) -> StampUpload {
    StampUpload::new(name, "image/png", png_bytes(20, 10, [0, 128, 0, 255]))
}

fn uploads(prefix: &str, n: usize) -> Vec<StampUpload> {
    (0..n).map(|i| png_upload(&format!("{prefix}{i}.png"))).collect()
}

fn source(width: u32, height: u32) -> StampSource {
    StampSource {
        name: "stamp.png".to_string(),
        raster: EncodedRaster::from_bytes(png_bytes(width, height, [0, 128, 0, 255])),
    }
}

// ============================================================
// 1. StampRegistry: 型フィルタと上限
// ============================================================

#[test]
fn test_register_within_cap() {
    let mut registry = StampRegistry::new(5, "image/png");
    let report = registry.register(uploads("a", 3));

    assert_eq!(report.accepted, 3);
    assert_eq!(report.rejected_over_cap, 0);
    assert!(report.warning.is_none());
    assert_eq!(registry.len(), 3);
    assert_eq!(registry.remaining_slots(), 2);
}

#[test]
fn test_register_over_cap_truncates_with_warning() {
    let mut registry = StampRegistry::new(5, "image/png");
    registry.register(uploads("a", 3));
    let report = registry.register(uploads("b", 4));

    assert_eq!(report.accepted, 2);
    assert_eq!(report.rejected_over_cap, 2);
    let warning = report.warning.expect("cap warning");
    assert!(warning.contains('5'), "{warning}");
    assert!(warning.contains("2 image(s) rejected"), "{warning}");

    assert_eq!(registry.len(), 5);
    assert!(registry.is_full());
    // 先頭から順に受け入れる
    let names: Vec<&str> = registry.stamps().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["a0.png", "a1.png", "a2.png", "b0.png", "b1.png"]);
}

#[test]
fn test_register_when_full_rejects_everything() {
    let mut registry = StampRegistry::new(2, "image/png");
    registry.register(uploads("a", 2));
    let report = registry.register(uploads("b", 1));
    assert_eq!(report.accepted, 0);
    assert_eq!(report.rejected_over_cap, 1);
    assert!(report.warning.is_some());
}

#[test]
fn test_other_types_are_filtered_silently() {
    let mut registry = StampRegistry::new(5, "image/png");
    let report = registry.register(vec![
        png_upload("ok.png"),
        StampUpload::new("photo.jpg", "image/jpeg", vec![0xff, 0xd8]),
        StampUpload::new("notes.txt", "text/plain", b"hi".to_vec()),
    ]);

    assert_eq!(report.accepted, 1);
    assert_eq!(report.rejected_type, 2);
    assert!(report.warning.is_none());
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_duplicates_allowed() {
    let mut registry = StampRegistry::new(5, "image/png");
    registry.register(vec![png_upload("same.png"), png_upload("same.png")]);
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.get(0), registry.get(1));
}

#[test]
fn test_remove_and_clear_free_slots() {
    let mut registry = StampRegistry::new(5, "image/png");
    registry.register(uploads("a", 5));

    let removed = registry.remove(1).expect("index 1 exists");
    assert_eq!(removed.name, "a1.png");
    assert_eq!(registry.get(1).map(|s| s.name.as_str()), Some("a2.png"));
    assert!(registry.remove(10).is_none());
    assert_eq!(registry.remaining_slots(), 1);

    registry.clear();
    assert!(registry.is_empty());
    assert_eq!(registry.remaining_slots(), 5);
}

#[test]
fn test_upload_from_path_takes_type_from_extension() {
    let dir = tempfile::tempdir().unwrap();
    let png = dir.path().join("stamp.png");
    let txt = dir.path().join("stamp.txt");
    std::fs::write(&png, png_bytes(4, 4, [0, 0, 0, 255])).unwrap();
    std::fs::write(&txt, b"text").unwrap();

    assert_eq!(StampUpload::from_path(&png).unwrap().mime_type, "image/png");
    assert_ne!(StampUpload::from_path(&txt).unwrap().mime_type, "image/png");
    assert!(StampUpload::from_path(&dir.path().join("missing.png")).is_err());
}

// ============================================================
// 2. OverlayFactory: スケーリングと配置
// ============================================================

#[test]
fn test_create_and_place_scales_to_stamp_width() {
    let mut surface = OverlaySurface::new(SurfaceConfig::default()).unwrap();
    let mut factory = OverlayFactory::new();

    let id = factory
        .create_and_place(&mut surface, &source(200, 50), 100, 30)
        .unwrap();

    let overlay = surface.overlay(id).unwrap();
    assert_eq!((overlay.width(), overlay.height()), (100, 25));
    assert_eq!(overlay.scale(), 0.5);
    assert_eq!(overlay.affordance_size(), 25);
    assert!(!overlay.affordance_visible());
    assert_eq!(surface.active_overlay(), None);
}

#[test]
fn test_create_and_place_rejects_stamp_too_tall_to_scale() {
    let mut surface = OverlaySurface::new(SurfaceConfig::default()).unwrap();
    let mut factory = OverlayFactory::new();

    let result = factory.create_and_place(&mut surface, &source(1, 5_000), 150, 30);

    assert!(matches!(result, Err(StampError::RenderTargetUnavailable(_))));
    assert_eq!(surface.overlay_count(), 0);
    assert_eq!(factory.placements(), 0);
}

#[test]
fn test_repeated_placements_are_staggered() {
    let mut surface = OverlaySurface::new(SurfaceConfig::default()).unwrap();
    let mut factory = OverlayFactory::new();
    let stamp = source(100, 100);

    let first = factory.create_and_place(&mut surface, &stamp, 100, 30).unwrap();
    let second = factory.create_and_place(&mut surface, &stamp, 100, 30).unwrap();

    assert_eq!(surface.overlay(first).unwrap().position(), (50.0, 50.0));
    assert_eq!(surface.overlay(second).unwrap().position(), (70.0, 50.0));
    assert_eq!(factory.placements(), 2);
}

#[test]
fn test_explicit_position_does_not_advance_stagger() {
    let mut surface = OverlaySurface::new(SurfaceConfig::default()).unwrap();
    let mut factory = OverlayFactory::with_grid(PlacementGrid {
        origin: (0.0, 0.0),
        step: 10.0,
        columns: 2,
        rows: 2,
    });
    let stamp = source(10, 10);

    let placed = factory
        .create_and_place_at(&mut surface, &stamp, 10, 5, Some((300.0, 400.0)))
        .unwrap();
    assert_eq!(surface.overlay(placed).unwrap().position(), (300.0, 400.0));
    assert_eq!(factory.placements(), 0);
}

#[test]
fn test_undecodable_stamp_leaves_surface_unchanged() {
    let mut surface = OverlaySurface::new(SurfaceConfig::default()).unwrap();
    let mut factory = OverlayFactory::new();
    let broken = StampSource {
        name: "broken.png".to_string(),
        raster: EncodedRaster::from_bytes(b"\x89PNG truncated".to_vec()),
    };

    let result = factory.create_and_place(&mut surface, &broken, 100, 30);
    assert!(matches!(result, Err(StampError::ImageLoadFailure(_))));
    assert_eq!(surface.overlay_count(), 0);
    assert_eq!(factory.placements(), 0);
}

#[test]
fn test_placed_stamp_is_painted() {
    let mut surface = OverlaySurface::new(SurfaceConfig::default()).unwrap();
    let mut factory = OverlayFactory::new();
    factory
        .create_and_place(&mut surface, &source(100, 100), 100, 30)
        .unwrap();

    let canvas = surface.render().unwrap();
    assert_eq!(*canvas.get_pixel(60, 100), Rgba([0, 128, 0, 255]));
}
