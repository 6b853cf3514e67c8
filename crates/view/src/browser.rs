//! Model browser panels: trigrams, the hexagram grid and detail, duality pairs,
//! analysis summary and search results.

use std::fmt::Write as _;

use shared::{
    domain::Variant,
    protocol::{Analysis, DualityPair, Hexagram, SearchHit, Trigram, TrigramRef},
};

use crate::{
    html::{escape, fixed},
    panel::{PanelId, PanelUpdate},
};

/// Borrowed view of one consistently loaded model variant.
pub struct ModelView<'a> {
    pub variant: Variant,
    pub trigrams: &'a [Trigram],
    pub hexagrams: &'a [Hexagram],
    pub analysis: &'a Analysis,
    pub duality: &'a [DualityPair],
    pub selected: Option<&'a Hexagram>,
}

/// Every data panel for a loaded model. Each update replaces its panel whole.
pub fn render_model(view: &ModelView<'_>) -> Vec<PanelUpdate> {
    let mut updates = vec![
        PanelUpdate::html(PanelId::Trigrams, render_trigrams(view.trigrams)),
        PanelUpdate::html(
            PanelId::HexagramGrid,
            render_hexagram_grid(view.hexagrams, view.selected),
        ),
        PanelUpdate::html(PanelId::Duality, render_duality(view.duality)),
        PanelUpdate::html(PanelId::Analysis, render_analysis(view.analysis)),
        PanelUpdate::html(PanelId::Combinations, render_combinations(view.variant)),
    ];
    updates.extend(render_stats(view.analysis));
    updates
}

/// Clears the data panels when nothing has been loaded yet.
pub fn render_unloaded() -> Vec<PanelUpdate> {
    [
        PanelId::Trigrams,
        PanelId::HexagramGrid,
        PanelId::Duality,
        PanelId::Analysis,
        PanelId::Combinations,
    ]
    .into_iter()
    .map(|panel| PanelUpdate::html(panel, ""))
    .chain(
        [
            PanelId::TotalHexagrams,
            PanelId::Coverage,
            PanelId::DualityCount,
        ]
        .into_iter()
        .map(|panel| PanelUpdate::text(panel, "")),
    )
    .collect()
}

pub fn render_trigrams(trigrams: &[Trigram]) -> String {
    let mut html = String::new();
    for trigram in trigrams {
        let _ = write!(
            html,
            r#"<div class="trigram-card"><div class="trigram-symbol">{}</div><h4 class="trigram-name">{}</h4><p class="trigram-description">{}</p><p class="trigram-concept">{}</p></div>"#,
            escape(&trigram.symbol),
            escape(&trigram.name),
            escape(&trigram.description),
            escape(&trigram.concept),
        );
    }
    html
}

pub fn render_hexagram_grid(hexagrams: &[Hexagram], selected: Option<&Hexagram>) -> String {
    let mut html = String::new();
    for hexagram in hexagrams {
        let class = if selected == Some(hexagram) {
            "hexagram-cell selected"
        } else {
            "hexagram-cell"
        };
        let _ = write!(
            html,
            r#"<div class="{class}" data-number="{}"><div class="hexagram-number">{}</div><div class="hexagram-name">{}</div><div class="hexagram-symbols">{}{}</div></div>"#,
            hexagram.number,
            hexagram.number,
            escape(&hexagram.name),
            escape(&hexagram.upper.symbol),
            escape(&hexagram.lower.symbol),
        );
    }
    html
}

pub fn render_hexagram_detail(hexagram: &Hexagram) -> String {
    let mut examples = String::new();
    for example in &hexagram.examples {
        let _ = write!(examples, "<li>{}</li>", escape(example));
    }
    format!(
        r#"<h3>{}. {}</h3><div class="hexagram-detail-grid"><div><h4>괘 구성</h4>{}{}</div><div><h4>수학적 의미</h4><div class="math-formula">{}</div><h4>예시</h4><ul>{examples}</ul></div></div>"#,
        hexagram.number,
        escape(&hexagram.name),
        composition_line("상괘", &hexagram.upper),
        composition_line("하괘", &hexagram.lower),
        escape(&hexagram.mathematical_meaning),
    )
}

fn composition_line(label: &str, trigram: &TrigramRef) -> String {
    format!(
        "<p><strong>{label}:</strong> {} {}<br><em>{}</em></p>",
        escape(&trigram.symbol),
        escape(&trigram.name),
        escape(&trigram.description),
    )
}

/// Grid plus detail for the current selection.
pub fn render_selection(hexagrams: &[Hexagram], selected: Option<&Hexagram>) -> Vec<PanelUpdate> {
    let detail = match selected {
        Some(hexagram) => PanelUpdate::html(PanelId::HexagramDetail, render_hexagram_detail(hexagram)),
        None => PanelUpdate::hidden(PanelId::HexagramDetail),
    };
    vec![
        PanelUpdate::html(PanelId::HexagramGrid, render_hexagram_grid(hexagrams, selected)),
        detail,
    ]
}

pub fn render_duality(pairs: &[DualityPair]) -> String {
    let mut html = String::new();
    for pair in pairs {
        let _ = write!(
            html,
            r#"<div class="duality-pair">{}<div class="duality-arrow"><i class="fas fa-exchange-alt"></i></div>{}</div>"#,
            duality_item(&pair.pair1),
            duality_item(&pair.pair2),
        );
    }
    html
}

fn duality_item(trigram: &TrigramRef) -> String {
    format!(
        r#"<div class="duality-item"><div class="duality-symbol">{}</div><strong>{}</strong><div class="duality-description">{}</div></div>"#,
        escape(&trigram.symbol),
        escape(&trigram.name),
        escape(&trigram.description),
    )
}

pub fn render_analysis(analysis: &Analysis) -> String {
    format!(
        r#"<div class="stats-grid"><div class="stats-card"><strong>모델 타입</strong><br>{}</div><div class="stats-card"><strong>총 괘 수</strong><br>{}개</div><div class="stats-card"><strong>수학적 커버리지</strong><br>{}%</div><div class="stats-card"><strong>대대 관계</strong><br>{}쌍</div></div>"#,
        analysis.model_type.label(),
        analysis.total_hexagrams,
        fixed(analysis.mathematical_coverage, 1),
        analysis.duality_pairs.len(),
    )
}

const CONCRETE_COMBINATIONS: [(&str, &str, &str); 4] = [
    (
        "π + 이진법",
        "디지털 신호처리에서의 FFT (Fast Fourier Transform)",
        "연속적인 원주율과 이산적인 이진법의 조합으로 주파수 영역 변환 실현",
    ),
    (
        "미분 + 적분",
        "미적분학의 기본정리",
        "순간적 변화율과 누적적 변화의 상호 보완적 관계",
    ),
    (
        "소수 + 확률",
        "소수 정리의 확률적 해석",
        "리만 제타함수와 양자 카오스 이론의 연결점",
    ),
    (
        "황금비 + 대칭성",
        "자연의 아름다운 비례와 불변성",
        "정다면체와 피보나치 수열에서 나타나는 기하학적 조화",
    ),
];

pub fn render_combinations(variant: Variant) -> String {
    match variant {
        Variant::Concrete => {
            let mut html = String::from(r#"<div class="combinations-grid">"#);
            for (title, subtitle, formula) in CONCRETE_COMBINATIONS {
                let _ = write!(
                    html,
                    r#"<div class="example-section"><h4>{title}</h4><p>{subtitle}</p><div class="math-formula">{formula}</div></div>"#,
                );
            }
            html.push_str("</div>");
            html
        }
        Variant::Abstract => r#"<div class="example-section"><p><em>추상적 모델의 흥미로운 조합 분석이 개발 중입니다.</em></p></div>"#.to_string(),
    }
}

pub fn render_stats(analysis: &Analysis) -> Vec<PanelUpdate> {
    vec![
        PanelUpdate::text(PanelId::TotalHexagrams, analysis.total_hexagrams.to_string()),
        PanelUpdate::text(PanelId::Coverage, fixed(analysis.mathematical_coverage, 1)),
        PanelUpdate::text(PanelId::DualityCount, analysis.duality_pairs.len().to_string()),
    ]
}

/// Search panel for a completed query. `query` is shown as typed.
pub fn render_search_results(query: &str, hits: &[SearchHit]) -> String {
    let query = escape(query);
    if hits.is_empty() {
        return format!(
            r#"<div class="example-section search-empty"><strong>검색 결과:</strong> "{query}"과 관련된 괘를 찾을 수 없습니다.</div>"#
        );
    }
    let mut html = format!(
        r#"<h4>검색 결과: "{query}" ({}개 발견)</h4><div class="search-grid">"#,
        hits.len()
    );
    for hit in hits {
        let _ = write!(
            html,
            r#"<div class="hexagram-detail"><h4>{}. {}</h4><p class="search-composition">{} + {}</p><div class="math-formula">{}</div></div>"#,
            hit.number,
            escape(&hit.name),
            escape(&hit.upper),
            escape(&hit.lower),
            escape(&hit.mathematical_meaning),
        );
    }
    html.push_str("</div>");
    html
}

pub fn render_search_error(message: &str) -> String {
    format!(
        r#"<div class="alert alert-error"><strong>검색 실패:</strong> {}</div>"#,
        escape(message)
    )
}

pub fn render_load_error(variant: Variant, message: &str) -> String {
    format!(
        r#"<div class="alert alert-error"><strong>데이터 로딩 실패 ({}):</strong> {}</div>"#,
        variant.label(),
        escape(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::HexagramNumber;

    fn trigram_ref(name: &str, symbol: &str) -> TrigramRef {
        TrigramRef {
            name: name.to_string(),
            symbol: symbol.to_string(),
            description: format!("{name} description"),
        }
    }

    fn hexagram(number: u32, name: &str) -> Hexagram {
        Hexagram {
            number: HexagramNumber(number),
            name: name.to_string(),
            upper: trigram_ref("건", "☰"),
            lower: trigram_ref("곤", "☷"),
            mathematical_meaning: "a < b".to_string(),
            description: None,
            examples: vec!["ex1".to_string(), "ex2".to_string()],
        }
    }

    fn analysis() -> Analysis {
        Analysis {
            model_type: Variant::Concrete,
            total_hexagrams: 64,
            total_trigrams: Some(8),
            mathematical_coverage: 29.6875,
            duality_pairs: vec![serde_json::json!(["건", "곤"]); 4],
            empty_combinations: Vec::new(),
        }
    }

    #[test]
    fn grid_marks_only_the_selected_cell() {
        let hexagrams = vec![hexagram(1, "乾乾"), hexagram(2, "乾坤")];
        let html = render_hexagram_grid(&hexagrams, Some(&hexagrams[1]));
        assert_eq!(html.matches("hexagram-cell selected").count(), 1);
        assert!(html.contains(r#"<div class="hexagram-cell selected" data-number="2">"#));
    }

    #[test]
    fn detail_lists_composition_and_examples() {
        let html = render_hexagram_detail(&hexagram(7, "乾坤"));
        assert!(html.starts_with("<h3>7. 乾坤</h3>"));
        assert!(html.contains("<strong>상괘:</strong> ☰ 건"));
        assert!(html.contains("<strong>하괘:</strong> ☷ 곤"));
        assert!(html.contains("a &lt; b"));
        assert!(html.contains("<ul><li>ex1</li><li>ex2</li></ul>"));
    }

    #[test]
    fn analysis_and_stats_format_coverage_to_one_place() {
        let analysis = analysis();
        let html = render_analysis(&analysis);
        assert!(html.contains("구체적 모델"));
        assert!(html.contains("64개"));
        assert!(html.contains("29.7%"));
        assert!(html.contains("4쌍"));

        let stats = render_stats(&analysis);
        assert_eq!(stats[1], PanelUpdate::text(PanelId::Coverage, "29.7"));
        assert_eq!(stats[2], PanelUpdate::text(PanelId::DualityCount, "4"));
    }

    #[test]
    fn coverage_on_an_exact_tie_rounds_up() {
        let analysis = Analysis {
            mathematical_coverage: 6.25,
            ..analysis()
        };
        assert!(render_analysis(&analysis).contains("6.3%"));
        assert_eq!(render_stats(&analysis)[1], PanelUpdate::text(PanelId::Coverage, "6.3"));
    }

    #[test]
    fn combinations_depend_on_variant() {
        assert!(render_combinations(Variant::Concrete).contains("미적분학의 기본정리"));
        assert!(render_combinations(Variant::Abstract).contains("개발 중입니다"));
    }

    #[test]
    fn empty_search_renders_not_found_with_query() {
        let html = render_search_results("foo", &[]);
        assert!(html.contains("search-empty"));
        assert!(html.contains(r#""foo"과 관련된 괘를 찾을 수 없습니다."#));
    }

    #[test]
    fn search_hits_render_count_and_escape_query() {
        let hits = vec![SearchHit {
            number: HexagramNumber(3),
            name: "乾震".to_string(),
            upper: "건".to_string(),
            lower: "진".to_string(),
            mathematical_meaning: "삼각함수의 미분".to_string(),
        }];
        let html = render_search_results("<미분>", &hits);
        assert!(html.contains("검색 결과: \"&lt;미분&gt;\" (1개 발견)"));
        assert!(html.contains("<h4>3. 乾震</h4>"));
        assert!(html.contains("건 + 진"));
        assert!(!html.contains("search-empty"));
    }

    #[test]
    fn model_view_covers_every_data_panel() {
        let trigrams = vec![Trigram {
            name: "건".to_string(),
            symbol: "☰".to_string(),
            korean: Some("乾".to_string()),
            description: "원주율(π)".to_string(),
            concept: "circularity".to_string(),
        }];
        let hexagrams = vec![hexagram(1, "乾乾")];
        let analysis = analysis();
        let duality = vec![DualityPair {
            pair1: trigram_ref("건", "☰"),
            pair2: trigram_ref("곤", "☷"),
        }];
        let updates = render_model(&ModelView {
            variant: Variant::Concrete,
            trigrams: &trigrams,
            hexagrams: &hexagrams,
            analysis: &analysis,
            duality: &duality,
            selected: None,
        });
        let panels: Vec<PanelId> = updates.iter().map(|update| update.panel).collect();
        assert_eq!(
            panels,
            vec![
                PanelId::Trigrams,
                PanelId::HexagramGrid,
                PanelId::Duality,
                PanelId::Analysis,
                PanelId::Combinations,
                PanelId::TotalHexagrams,
                PanelId::Coverage,
                PanelId::DualityCount,
            ]
        );
        assert_eq!(updates[0].content.as_str().matches("trigram-card").count(), 1);
        assert_eq!(updates[2].content.as_str().matches("duality-pair").count(), 1);
    }
}
