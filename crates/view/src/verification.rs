//! Verification dashboard panels.

use std::fmt::Write as _;

use serde_json::{Map, Value};
use shared::protocol::{AllResultsPayload, DashboardPayload, VerificationPayload};

use crate::{
    html::{display_value, escape, fixed},
    panel::{PanelId, PanelUpdate},
};

pub const NETWORK_ERROR_MESSAGE: &str = "네트워크 오류가 발생했습니다.";
pub const FALLBACK_PLOT_TITLE: &str = "결과 그래프";
pub const RESULT_DECIMALS: usize = 6;

const PLOT_TITLES: &[(&str, &str)] = &[
    ("pi_monte_carlo", "π 검증: 몬테카를로 시뮬레이션"),
    ("pi_series", "π 검증: 라이프니츠 급수 수렴"),
    ("golden_ratio_fibonacci", "φ 검증: 피보나치 수열 비율"),
    ("golden_ratio_spiral", "φ 검증: 황금 나선"),
    ("clt_simulation", "확률론: 중심극한정리 시뮬레이션"),
    ("distribution_comparison", "확률론: 다양한 확률분포 비교"),
    ("derivative_visualization", "미적분학: 도함수의 기하학적 의미"),
    ("integral_visualization", "미적분학: 정적분의 기하학적 의미"),
    ("binary_representation", "이진법: 4비트 이진수 표현"),
    ("bernoulli_trials", "이진법: 베르누이 시행과 이항분포"),
    ("sieve_of_eratosthenes", "소수: 에라토스테네스의 체"),
    ("prime_number_theorem", "소수: 소수 정리 (π(x) vs x/ln(x))"),
    ("geometric_transformations", "대칭성: 기하학적 변환"),
    ("d4_group_cayley_graph", "대칭성: D₄ 점군의 케일리 그래프"),
    ("e_series_convergence", "자연상수 e: 급수 근사 수렴"),
    ("e_limit_convergence", "자연상수 e: 극한 정의 수렴"),
];

pub fn plot_title(plot_name: &str) -> &'static str {
    PLOT_TITLES
        .iter()
        .find(|(name, _)| *name == plot_name)
        .map(|(_, title)| *title)
        .unwrap_or(FALLBACK_PLOT_TITLE)
}

pub fn render_loading() -> String {
    r#"<div class="loading"><div class="spinner"></div><p>수학적 검증을 수행하고 있습니다...</p><p class="loading-hint">복잡한 계산과 시각화 생성 중입니다. 잠시만 기다려주세요.</p></div>"#.to_string()
}

pub fn render_error(message: &str) -> String {
    format!(
        r#"<div class="alert alert-error"><strong>오류 발생:</strong> {}</div>"#,
        escape(message)
    )
}

fn render_plot(title: &str, base64_png: &str, description: Option<&str>) -> String {
    let title = escape(title);
    let mut html = format!(
        r#"<div class="plot-container"><div class="plot-title">{title}</div><img src="data:image/png;base64,{}" alt="{title}" class="plot-image">"#,
        escape(base64_png.trim()),
    );
    if let Some(description) = description {
        let _ = write!(html, r#"<div class="plot-description">{}</div>"#, escape(description));
    }
    html.push_str("</div>");
    html
}

pub fn render_dashboard(payload: &DashboardPayload) -> String {
    let mut html = format!(
        r#"<div class="alert alert-success"><strong>검증 완료!</strong> {}개 개념, {}개 그래프 생성</div>"#,
        payload.verification_count, payload.plot_count
    );

    if let Some(plot) = payload.dashboard_plot.as_deref().filter(|plot| !plot.is_empty()) {
        html.push_str(&render_plot(
            "8괘 수학적 검증 종합 결과",
            plot,
            Some("각 괘별 수학적 개념의 검증 정확도와 8괘의 원형 배치를 보여줍니다."),
        ));
    }

    if !payload.summary.is_empty() {
        html.push_str(
            r#"<h4>검증 결과 요약</h4><table class="results-table"><thead><tr><th>괘</th><th>수학적 개념</th><th>검증값</th><th>실제값</th><th>오차</th></tr></thead><tbody>"#,
        );
        for row in &payload.summary {
            html.push_str("<tr>");
            for cell in [&row.trigram, &row.concept, &row.measured, &row.expected, &row.error] {
                let _ = write!(html, "<td>{}</td>", escape(&display_value(cell)));
            }
            html.push_str("</tr>");
        }
        html.push_str("</tbody></table>");
    }

    html
}

fn render_plots(html: &mut String, payload: &VerificationPayload) {
    for (name, data) in payload.plot_entries() {
        html.push_str(&render_plot(plot_title(name), data, None));
    }
}

/// Result mapping as `key: value` lines. Numbers get six decimals, nested
/// mappings are flattened one level with indentation.
pub fn render_result_dump(result: &Map<String, Value>) -> String {
    let mut html = String::from(r#"<div class="math-formula">"#);
    for (key, value) in result {
        let key = escape(key);
        match value {
            Value::Number(number) => {
                let _ = write!(html, "<strong>{key}:</strong> {}<br>", format_number(number));
            }
            Value::Object(nested) => {
                let _ = write!(html, "<strong>{key}:</strong><br>");
                for (subkey, subvalue) in nested {
                    let rendered = match subvalue {
                        Value::Number(number) => format_number(number),
                        other => escape(&display_value(other)).into_owned(),
                    };
                    let _ = write!(html, "&nbsp;&nbsp;{}: {rendered}<br>", escape(subkey));
                }
            }
            other => {
                let _ = write!(html, "<strong>{key}:</strong> {}<br>", escape(&display_value(other)));
            }
        }
    }
    html.push_str("</div>");
    html
}

fn format_number(number: &serde_json::Number) -> String {
    number
        .as_f64()
        .map(|value| fixed(value, RESULT_DECIMALS))
        .unwrap_or_else(|| number.to_string())
}

pub fn render_verification(payload: &VerificationPayload) -> String {
    let mut html = format!(
        r#"<div class="alert alert-success"><strong>{} 검증 완료!</strong> {}</div>"#,
        escape(&payload.concept),
        escape(&payload.description),
    );
    render_plots(&mut html, payload);
    if let Some(result) = &payload.result {
        html.push_str(&render_result_dump(result));
    }
    html
}

pub fn render_all_results(payload: &AllResultsPayload) -> String {
    let entries = payload.entries();
    let mut html = if payload.errors.is_empty() {
        format!(
            r#"<div class="alert alert-success"><strong>전체 검증 완료!</strong> 총 {}개의 개념을 검증했습니다.</div>"#,
            entries.len()
        )
    } else {
        format!(
            r#"<div class="alert alert-error"><strong>일부 검증 실패:</strong> {}개 개념 검증 완료, {}개 개념 검증 실패</div>"#,
            entries.len(),
            payload.errors.len()
        )
    };
    for (_, result) in &entries {
        let _ = write!(
            html,
            r#"<div class="verification-card"><h3>{}</h3><p>{}</p>"#,
            escape(&result.concept),
            escape(&result.description),
        );
        render_plots(&mut html, result);
        if let Some(values) = &result.result {
            html.push_str(&render_result_dump(values));
        }
        html.push_str("</div>");
    }
    for failure in &payload.errors {
        let _ = write!(
            html,
            r#"<div class="verification-card failed"><h3>{}</h3>{}</div>"#,
            escape(&failure.concept),
            render_error(&failure.message()),
        );
    }
    html
}

/// Log buffer of the verify-all stream. A failed buffer is drawn in the error color.
pub fn render_log(text: &str, failed: bool) -> String {
    let class = if failed {
        "log-stream failed"
    } else {
        "log-stream"
    };
    let style = if failed { r#" style="color: red;""# } else { "" };
    format!(
        r#"<pre id="log-container" class="{class}"{style}>{}</pre>"#,
        escape(text)
    )
}

/// Dashboard counters. `completion_pct` is shown without decimals.
pub fn render_status(verification_count: u32, plot_count: u32, completion_pct: f64) -> Vec<PanelUpdate> {
    vec![
        PanelUpdate::text(PanelId::VerificationCount, verification_count.to_string()),
        PanelUpdate::text(PanelId::PlotCount, plot_count.to_string()),
        PanelUpdate::text(PanelId::AccuracyRate, format!("{}%", fixed(completion_pct, 0))),
    ]
}
