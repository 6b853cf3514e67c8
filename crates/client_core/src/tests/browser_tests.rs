use super::*;
use crate::fake_backend::{hexagram, search_hit, FakeBackend};
use std::time::Duration;
use view::{Content, MemoryTarget};

fn browser_with(backend: &Arc<FakeBackend>, options: BrowserOptions) -> (Arc<ModelBrowser>, Arc<MemoryTarget>) {
    let target = Arc::new(MemoryTarget::new());
    let browser = ModelBrowser::with_options(backend.clone(), target.clone(), options);
    (browser, target)
}

fn browser(backend: &Arc<FakeBackend>) -> (Arc<ModelBrowser>, Arc<MemoryTarget>) {
    browser_with(backend, BrowserOptions::default())
}

#[tokio::test]
async fn render_before_load_clears_panels() {
    let backend = FakeBackend::new();
    let (browser, target) = browser(&backend);

    browser.render_all().await;

    assert_eq!(target.content(PanelId::Trigrams), Some(Content::Html(String::new())));
    assert_eq!(target.content(PanelId::TotalHexagrams), Some(Content::Text(String::new())));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn select_variant_loads_all_four_datasets_and_renders() {
    let backend = FakeBackend::new();
    let (browser, target) = browser(&backend);

    browser
        .select_variant(Variant::Concrete)
        .await
        .expect("load concrete");

    let mut calls = backend.calls();
    calls.sort();
    assert_eq!(
        calls,
        vec![
            "analysis:concrete",
            "duality:concrete",
            "hexagrams:concrete",
            "trigrams:concrete",
        ]
    );
    let snapshot = browser.snapshot().await.expect("snapshot");
    assert_eq!(snapshot.variant, Variant::Concrete);
    assert!(snapshot.hexagrams.iter().all(|h| h.name.starts_with("concrete")));
    assert!(target.html(PanelId::HexagramGrid).contains("concrete hexagram 1"));
    assert!(target.html(PanelId::Analysis).contains("구체적 모델"));
    assert_eq!(target.html(PanelId::TotalHexagrams), "4");
    assert_eq!(target.html(PanelId::Coverage), "100.0");
    assert_eq!(target.html(PanelId::DualityCount), "1");
}

#[tokio::test]
async fn failed_load_keeps_previous_snapshot() {
    let backend = FakeBackend::new();
    let (browser, target) = browser(&backend);
    browser
        .select_variant(Variant::Abstract)
        .await
        .expect("load abstract");

    backend.fail("duality:concrete");
    let err = browser
        .select_variant(Variant::Concrete)
        .await
        .expect_err("concrete load fails");

    assert!(!err.is_backend_failure());
    assert_eq!(browser.variant().await, Variant::Concrete);
    let snapshot = browser.snapshot().await.expect("snapshot");
    assert_eq!(snapshot.variant, Variant::Abstract);
    let grid = target.html(PanelId::HexagramGrid);
    assert!(grid.contains("abstract hexagram 1"));
    assert!(!grid.contains("concrete"));
    assert_eq!(target.content(PanelId::LoadStatus), None);
}

#[tokio::test]
async fn surfaced_load_error_renders_status_panel() {
    let backend = FakeBackend::new();
    let (browser, target) = browser_with(
        &backend,
        BrowserOptions {
            surface_load_errors: true,
        },
    );
    backend.fail("hexagrams:abstract");

    assert!(browser.load_data(Variant::Abstract).await.is_err());

    let status = target.html(PanelId::LoadStatus);
    assert!(status.contains("데이터 로딩 실패"));
    assert!(status.contains("네트워크 오류가 발생했습니다."));
    assert!(browser.snapshot().await.is_none());
}

#[tokio::test]
async fn superseded_load_is_discarded() {
    let backend = FakeBackend::new();
    let (browser, _target) = browser(&backend);
    backend.delay("hexagrams:abstract", Duration::from_millis(100));

    let (slow, fast) = futures::join!(
        browser.load_data(Variant::Abstract),
        browser.load_data(Variant::Concrete),
    );

    slow.expect("abstract load");
    fast.expect("concrete load");
    let snapshot = browser.snapshot().await.expect("snapshot");
    assert_eq!(snapshot.variant, Variant::Concrete);
    assert!(snapshot.trigrams.iter().all(|t| t.description.starts_with("concrete")));
}

#[tokio::test]
async fn blank_search_clears_results_without_request() {
    let backend = FakeBackend::new();
    let (browser, target) = browser(&backend);

    let outcome = browser.search_hexagrams("   ").await.expect("blank search");

    assert_eq!(outcome, SearchOutcome::Cleared);
    assert!(backend.calls().iter().all(|call| !call.starts_with("search:")));
    assert_eq!(target.content(PanelId::SearchResults), Some(Content::Html(String::new())));
}

#[tokio::test]
async fn search_targets_current_variant() {
    let backend = FakeBackend::new();
    let (browser, target) = browser(&backend);
    backend.set_search_hits("pi", vec![search_hit(1, "건위천")]);
    browser
        .select_variant(Variant::Concrete)
        .await
        .expect("load concrete");

    let outcome = browser.search_hexagrams("pi").await.expect("search");

    assert_eq!(outcome, SearchOutcome::Rendered { hits: 1 });
    assert!(backend.calls().contains(&"search:concrete:pi".to_string()));
    let html = target.html(PanelId::SearchResults);
    assert!(html.contains(r#"검색 결과: "pi" (1개 발견)"#));
    assert!(html.contains("건위천"));
}

#[tokio::test]
async fn empty_search_shows_not_found_message() {
    let backend = FakeBackend::new();
    let (browser, target) = browser(&backend);

    browser.search_hexagrams("없음").await.expect("search");

    assert!(target
        .html(PanelId::SearchResults)
        .contains(r#""없음"과 관련된 괘를 찾을 수 없습니다."#));
}

#[tokio::test]
async fn stale_search_does_not_overwrite_newer_results() {
    let backend = FakeBackend::new();
    let (browser, target) = browser(&backend);
    backend.delay("search:abstract:slow", Duration::from_millis(100));
    backend.set_search_hits("slow", vec![search_hit(1, "slow-hit")]);
    backend.set_search_hits("fast", vec![search_hit(2, "fast-hit")]);

    let (slow, fast) = futures::join!(browser.search_hexagrams("slow"), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        browser.search_hexagrams("fast").await
    });

    assert_eq!(slow.expect("slow search"), SearchOutcome::Stale);
    assert_eq!(fast.expect("fast search"), SearchOutcome::Rendered { hits: 1 });
    let html = target.html(PanelId::SearchResults);
    assert!(html.contains("fast-hit"));
    assert!(!html.contains("slow-hit"));
}

#[tokio::test]
async fn failed_search_renders_inline_error() {
    let backend = FakeBackend::new();
    let (browser, target) = browser(&backend);
    backend.fail("search:abstract:x");

    assert!(browser.search_hexagrams("x").await.is_err());

    let html = target.html(PanelId::SearchResults);
    assert!(html.contains("검색 실패"));
    assert!(html.contains("네트워크 오류가 발생했습니다."));
}

#[tokio::test]
async fn selection_highlights_cell_and_shows_detail() {
    let backend = FakeBackend::new();
    let (browser, target) = browser(&backend);
    browser
        .select_variant(Variant::Abstract)
        .await
        .expect("load abstract");

    browser.select_hexagram(&hexagram(Variant::Abstract, 2)).await;

    assert_eq!(target.html(PanelId::HexagramGrid).matches("hexagram-cell selected").count(), 1);
    assert!(target.html(PanelId::HexagramDetail).contains("abstract hexagram 2"));

    browser.clear_selection().await;
    assert_eq!(target.content(PanelId::HexagramDetail), Some(Content::Hidden));
    assert!(!target.html(PanelId::HexagramGrid).contains("hexagram-cell selected"));
    assert!(browser.selected().await.is_none());
}

#[tokio::test]
async fn second_selection_replaces_first() {
    let backend = FakeBackend::new();
    let (browser, target) = browser(&backend);
    browser
        .select_variant(Variant::Abstract)
        .await
        .expect("load abstract");

    browser.select_hexagram(&hexagram(Variant::Abstract, 1)).await;
    browser.select_hexagram(&hexagram(Variant::Abstract, 3)).await;

    let grid = target.html(PanelId::HexagramGrid);
    assert_eq!(grid.matches("hexagram-cell selected").count(), 1);
    assert!(grid.contains(r#"<div class="hexagram-cell selected" data-number="3">"#));
    assert_eq!(browser.selected().await, Some(hexagram(Variant::Abstract, 3)));
}

#[tokio::test]
async fn selection_is_not_highlighted_in_another_variant() {
    let backend = FakeBackend::new();
    let (browser, target) = browser(&backend);
    browser
        .select_variant(Variant::Abstract)
        .await
        .expect("load abstract");
    browser.select_hexagram(&hexagram(Variant::Abstract, 1)).await;

    browser
        .select_variant(Variant::Concrete)
        .await
        .expect("load concrete");

    assert!(!target.html(PanelId::HexagramGrid).contains("hexagram-cell selected"));
}

#[tokio::test]
async fn models_are_listed_from_backend() {
    let backend = FakeBackend::new();
    let (browser, _target) = browser(&backend);

    let models = browser.models().await.expect("models");

    assert_eq!(models.len(), 2);
    assert_eq!(models[0].id, "abstract");
}
