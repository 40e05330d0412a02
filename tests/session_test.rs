mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakeRenderer, png_bytes, test_document};
use pdf_stamper::config::merged::MergedConfig;
use pdf_stamper::config::settings::Settings;
use pdf_stamper::error::StampError;
use pdf_stamper::render::DocumentRenderer;
use pdf_stamper::selection::Key;
use pdf_stamper::session::DocumentSession;
use pdf_stamper::stamp::registry::StampUpload;
use pdf_stamper::surface::SurfaceConfig;
use pdf_stamper::thumbnail::generator::ThumbnailGenerator;
use pdf_stamper::thumbnail::state::ThumbnailState;

fn session() -> DocumentSession {
    DocumentSession::new(&MergedConfig::from_settings(&Settings::default())).unwrap()
}

fn generator(fake: FakeRenderer, timeout_ms: u64) -> ThumbnailGenerator {
    let renderer: Arc<dyn DocumentRenderer> = Arc::new(fake);
    ThumbnailGenerator::new(renderer, 1.0, Duration::from_millis(timeout_ms)).unwrap()
}

fn stamp(name: &str) -> StampUpload {
    StampUpload::new(name, "image/png", png_bytes(40, 40, [255, 0, 0, 255]))
}

/// 2ページのPDFを読み込み、1ページ目を選択済みのセッション
fn session_with_selected_page() -> DocumentSession {
    let mut s = session();
    s.upload_document(test_document(2, 72.0, 144.0));
    s.load_thumbnails(&generator(FakeRenderer::new(), 5_000))
        .unwrap();
    s.select_page(1).unwrap();
    s
}

#[test]
fn test_full_flow_produces_exports() {
    let mut s = session_with_selected_page();
    s.register_stamps(vec![stamp("a.png")]);
    let id = s.place_stamp(0).unwrap();
    assert!(s.surface().overlay(id).is_some());

    let png = s.export_raster().unwrap();
    assert_eq!(png.mime_type().unwrap(), "image/png");
    let pdf = s.export_paginated(210.0, 297.0).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));
}

#[test]
fn test_load_thumbnails_without_document_sets_error() {
    let mut s = session();
    let result = s.load_thumbnails(&generator(FakeRenderer::new(), 5_000));
    assert!(matches!(result, Err(StampError::NoDocumentProvided)));
    assert!(matches!(s.thumbnails().state(), ThumbnailState::Error(_)));
}

#[test]
fn test_load_thumbnails_failure_is_visible_and_returned() {
    let mut s = session();
    s.upload_document(test_document(1, 72.0, 72.0));
    let result = s.load_thumbnails(&generator(
        FakeRenderer::with_delay(Duration::from_millis(300)),
        20,
    ));
    assert!(matches!(result, Err(StampError::LoadTimeout { .. })));
    assert!(matches!(s.thumbnails().state(), ThumbnailState::Error(_)));
    assert!(s.thumbnails().pages().is_empty());
}

#[test]
fn test_select_page_binds_background() {
    let s = session_with_selected_page();
    assert_eq!(s.selected_page().map(|p| p.page_number), Some(1));
    // 72x144 -> 780x1560、高さ = ceil(1560 * 1.4)
    assert_eq!(s.surface().background_size(), Some((780, 1560)));
    assert_eq!(s.surface().height(), 2184);
}

#[test]
fn test_select_unrendered_page_fails() {
    let mut s = session_with_selected_page();
    assert!(matches!(
        s.select_page(3),
        Err(StampError::PageNotAvailable(3))
    ));
    assert_eq!(s.selected_page().map(|p| p.page_number), Some(1));
}

#[test]
fn test_switching_pages_keeps_overlays() {
    let mut s = session_with_selected_page();
    s.register_stamps(vec![stamp("a.png")]);
    let id = s.place_stamp(0).unwrap();
    s.select_page(2).unwrap();
    assert_eq!(s.selected_page().map(|p| p.page_number), Some(2));
    assert!(s.surface().overlay(id).is_some());
}

#[test]
fn test_remove_document_clears_surface_and_pages() {
    let mut s = session_with_selected_page();
    s.register_stamps(vec![stamp("a.png")]);
    s.place_stamp(0).unwrap();

    let removed = s.remove_document();
    assert!(removed.is_some());
    assert!(s.document().is_none());
    assert!(s.selected_page().is_none());
    assert_eq!(*s.thumbnails().state(), ThumbnailState::Idle);
    assert!(!s.surface().has_background());
    assert_eq!(s.surface().overlay_count(), 0);
    // スタンプ登録は残る
    assert_eq!(s.stamps().len(), 1);
    assert!(matches!(s.export_raster(), Err(StampError::EmptySurface)));
}

#[test]
fn test_new_upload_supersedes_in_flight_run() {
    let mut s = session();
    s.upload_document(test_document(3, 72.0, 72.0));
    let (old_ticket, old_doc) = s.begin_thumbnail_run().unwrap();

    s.upload_document(test_document(1, 72.0, 72.0));
    let gen_ = generator(FakeRenderer::new(), 5_000);
    let old_result = gen_.generate(Some(&old_doc));
    assert!(!s.finish_thumbnail_run(old_ticket, old_result));
    assert_eq!(*s.thumbnails().state(), ThumbnailState::Idle);

    assert_eq!(s.load_thumbnails(&gen_).unwrap(), 1);
}

#[test]
fn test_thumbnail_runs_are_tagged_with_document_digest() {
    let mut s = session();
    let first = test_document(3, 72.0, 72.0);
    let first_digest = first.digest().to_string();
    s.upload_document(first);
    let gen_ = generator(FakeRenderer::new(), 5_000);
    s.load_thumbnails(&gen_).unwrap();
    assert_eq!(s.thumbnails().document_digest(), Some(first_digest.as_str()));

    let second = test_document(1, 72.0, 72.0);
    let second_digest = second.digest().to_string();
    assert_ne!(first_digest, second_digest);
    s.upload_document(second);
    assert_eq!(s.thumbnails().document_digest(), None);
    s.load_thumbnails(&gen_).unwrap();
    assert_eq!(s.thumbnails().document_digest(), Some(second_digest.as_str()));

    s.remove_document();
    assert_eq!(s.thumbnails().document_digest(), None);
}

#[test]
fn test_stamp_cap_applies_across_uploads() {
    let mut s = session();
    s.register_stamps((0..3).map(|i| stamp(&format!("a{i}.png"))).collect());
    let report = s.register_stamps((0..4).map(|i| stamp(&format!("b{i}.png"))).collect());
    assert_eq!(report.accepted, 2);
    assert!(report.warning.is_some());
    assert_eq!(s.stamps().len(), 5);

    s.remove_stamp(0).unwrap();
    assert_eq!(s.stamps().len(), 4);
    assert!(matches!(s.remove_stamp(9), Err(StampError::StampNotFound(9))));
    s.clear_stamps();
    assert!(s.stamps().is_empty());
}

#[test]
fn test_place_unknown_stamp_fails() {
    let mut s = session_with_selected_page();
    assert!(matches!(s.place_stamp(0), Err(StampError::StampNotFound(0))));
    assert_eq!(s.surface().overlay_count(), 0);
}

#[test]
fn test_delete_key_removes_active_stamp() {
    let mut s = session_with_selected_page();
    s.register_stamps(vec![stamp("a.png")]);
    let id = s.place_stamp(0).unwrap();

    // 既定位置(50,50)、幅100
    s.surface_mut().pointer_down(60.0, 120.0);
    s.surface_mut().pointer_up();
    assert_eq!(s.surface().active_overlay(), Some(id));

    assert_eq!(s.press_key(Key::Delete), Some(id));
    assert_eq!(s.surface().overlay_count(), 0);
    assert_eq!(s.press_key(Key::Delete), None);
}

#[test]
fn test_replace_surface_moves_key_binding_and_rebinds_page() {
    let mut s = session_with_selected_page();
    s.register_stamps(vec![stamp("a.png")]);
    s.place_stamp(0).unwrap();

    let config = SurfaceConfig {
        container_width: 420,
        ..SurfaceConfig::default()
    };
    s.replace_surface(config).unwrap();

    assert_eq!(s.surface().width(), 420);
    assert_eq!(s.surface().background_size(), Some((400, 800)));
    assert_eq!(s.surface().overlay_count(), 0);

    let id = s.place_stamp(0).unwrap();
    s.surface_mut().pointer_down(110.0, 80.0);
    assert_eq!(s.press_key(Key::Delete), Some(id));
}
