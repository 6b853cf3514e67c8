use std::fmt;

use shared::domain::Concept;

/// Render targets addressed by the controllers. `dom_id` matches the element ids
/// the page templates use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PanelId {
    Trigrams,
    HexagramGrid,
    HexagramDetail,
    Duality,
    Analysis,
    Combinations,
    TotalHexagrams,
    Coverage,
    DualityCount,
    SearchResults,
    LoadStatus,
    DashboardResults,
    ConceptResults(Concept),
    VerificationCount,
    PlotCount,
    AccuracyRate,
}

impl PanelId {
    pub fn dom_id(self) -> &'static str {
        match self {
            PanelId::Trigrams => "trigramsContainer",
            PanelId::HexagramGrid => "hexagramGrid",
            PanelId::HexagramDetail => "hexagramDetail",
            PanelId::Duality => "dualityContainer",
            PanelId::Analysis => "analysisResults",
            PanelId::Combinations => "interestingCombinations",
            PanelId::TotalHexagrams => "totalHexagrams",
            PanelId::Coverage => "coverage",
            PanelId::DualityCount => "dualityCount",
            PanelId::SearchResults => "searchResults",
            PanelId::LoadStatus => "loadStatus",
            PanelId::DashboardResults => "dashboardResults",
            PanelId::ConceptResults(concept) => match concept {
                Concept::Pi => "piResults",
                Concept::GoldenRatio => "goldenResults",
                Concept::Probability => "probabilityResults",
                Concept::Calculus => "calculusResults",
                Concept::Binary => "binaryResults",
                Concept::Primes => "primesResults",
                Concept::Symmetry => "symmetryResults",
                Concept::E => "eResults",
            },
            PanelId::VerificationCount => "verificationCount",
            PanelId::PlotCount => "plotCount",
            PanelId::AccuracyRate => "accuracyRate",
        }
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dom_id())
    }
}

/// Full replacement content for one panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Markup replacing the panel's children. Already escaped.
    Html(String),
    /// Plain text replacing the panel's text content.
    Text(String),
    /// Panel emptied and hidden.
    Hidden,
}

impl Content {
    pub fn as_str(&self) -> &str {
        match self {
            Content::Html(html) => html,
            Content::Text(text) => text,
            Content::Hidden => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelUpdate {
    pub panel: PanelId,
    pub content: Content,
}

impl PanelUpdate {
    pub fn html(panel: PanelId, html: impl Into<String>) -> Self {
        Self {
            panel,
            content: Content::Html(html.into()),
        }
    }

    pub fn text(panel: PanelId, text: impl Into<String>) -> Self {
        Self {
            panel,
            content: Content::Text(text.into()),
        }
    }

    pub fn hidden(panel: PanelId) -> Self {
        Self {
            panel,
            content: Content::Hidden,
        }
    }
}
