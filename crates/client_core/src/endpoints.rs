use shared::domain::{Concept, Variant};
use url::Url;

use crate::error::ClientError;

/// Builds backend URLs by appending path segments to the configured base, so a
/// base with a path prefix (`http://host/bagua`) keeps its prefix.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut base = Url::parse(base_url.trim())?;
        if base.cannot_be_a_base() {
            return Err(ClientError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        base.set_query(None);
        base.set_fragment(None);
        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn at(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub fn models(&self) -> Url {
        self.at(&["api", "models"])
    }

    pub fn trigrams(&self, variant: Variant) -> Url {
        self.at(&["api", "trigrams", variant.as_str()])
    }

    pub fn hexagrams(&self, variant: Variant) -> Url {
        self.at(&["api", "hexagrams", variant.as_str()])
    }

    pub fn analysis(&self, variant: Variant) -> Url {
        self.at(&["api", "analysis", variant.as_str()])
    }

    pub fn duality(&self, variant: Variant) -> Url {
        self.at(&["api", "duality", variant.as_str()])
    }

    pub fn search(&self, variant: Variant, query: &str) -> Url {
        let mut url = self.at(&["api", "search", variant.as_str()]);
        url.query_pairs_mut().append_pair("q", query);
        url
    }

    pub fn dashboard(&self) -> Url {
        self.at(&["math", "api", "verification", "dashboard"])
    }

    pub fn verification(&self, concept: Concept) -> Url {
        self.at(&["math", "api", "verification", concept.slug()])
    }

    pub fn verification_all(&self) -> Url {
        self.at(&["math", "api", "verification", "all"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_segments_to_root_base() {
        let endpoints = Endpoints::new("http://127.0.0.1:5000").expect("endpoints");
        assert_eq!(
            endpoints.trigrams(Variant::Concrete).as_str(),
            "http://127.0.0.1:5000/api/trigrams/concrete"
        );
        assert_eq!(
            endpoints.verification(Concept::GoldenRatio).as_str(),
            "http://127.0.0.1:5000/math/api/verification/golden-ratio"
        );
    }

    #[test]
    fn keeps_path_prefix_and_encodes_query() {
        let endpoints = Endpoints::new("https://example.org/bagua/?x=1").expect("endpoints");
        assert_eq!(
            endpoints.search(Variant::Abstract, "함수 & 극한").as_str(),
            "https://example.org/bagua/api/search/abstract?q=%ED%95%A8%EC%88%98+%26+%EA%B7%B9%ED%95%9C"
        );
        assert_eq!(
            endpoints.verification_all().as_str(),
            "https://example.org/bagua/math/api/verification/all"
        );
    }

    #[test]
    fn rejects_non_base_urls() {
        assert!(Endpoints::new("mailto:someone@example.org").is_err());
        assert!(Endpoints::new("not a url").is_err());
    }
}
