use std::fmt;

use serde::{Deserialize, Serialize};

use super::id::{SessionId, SessionIdGenerator};

/// Fallback content source served by the stitcher itself.
pub const DEMO_ORIGIN_PATH: &str = "/demo/playlist.m3u8";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackRequest {
    pub stitcher_base_url: String,
    #[serde(default)]
    pub origin_content_url: Option<String>,
}

impl PlaybackRequest {
    pub fn new(stitcher_base_url: impl Into<String>, origin_content_url: Option<String>) -> Self {
        Self {
            stitcher_base_url: stitcher_base_url.into(),
            origin_content_url,
        }
    }

    /// Base URL without surrounding whitespace or trailing separators.
    pub fn normalized_base(&self) -> &str {
        self.stitcher_base_url.trim().trim_end_matches('/')
    }

    /// Origin supplied by the caller, or the stitcher's built-in demo playlist.
    pub fn effective_origin(&self) -> String {
        match self
            .origin_content_url
            .as_deref()
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
        {
            Some(origin) => origin.to_string(),
            None => format!("{}{}", self.normalized_base(), DEMO_ORIGIN_PATH),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaybackUrl(String);

impl PlaybackUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaybackUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPlayback {
    pub url: PlaybackUrl,
    pub session_id: SessionId,
    pub effective_origin: String,
}

/// Pure string composition; an empty base yields a URL with an empty base segment.
#[derive(Debug, Default)]
pub struct PlaybackUrlBuilder {
    ids: SessionIdGenerator,
}

impl PlaybackUrlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_generator(ids: SessionIdGenerator) -> Self {
        Self { ids }
    }

    pub fn build(&mut self, request: &PlaybackRequest) -> ResolvedPlayback {
        let base = request.normalized_base();
        let session_id = self.ids.generate();
        let effective_origin = request.effective_origin();
        let url = compose(base, &session_id, &effective_origin);

        ResolvedPlayback {
            url,
            session_id,
            effective_origin,
        }
    }
}

fn compose(base: &str, session_id: &SessionId, origin: &str) -> PlaybackUrl {
    PlaybackUrl(format!(
        "{base}/stitch/{session_id}/playlist.m3u8?origin={}",
        urlencoding::encode(origin)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> PlaybackUrlBuilder {
        PlaybackUrlBuilder::with_generator(SessionIdGenerator::seeded(3))
    }

    fn origin_param(url: &PlaybackUrl) -> String {
        let (_, encoded) = url
            .as_str()
            .split_once("?origin=")
            .expect("origin query parameter");
        urlencoding::decode(encoded).expect("valid encoding").into_owned()
    }

    #[test]
    fn trailing_slashes_collapse_to_one_canonical_base() {
        let mut builder = builder();
        for raw in [
            "https://example.com/stitcher",
            "https://example.com/stitcher/",
            "https://example.com/stitcher///",
        ] {
            let resolved = builder.build(&PlaybackRequest::new(raw, None));
            let expected_prefix = format!(
                "https://example.com/stitcher/stitch/{}/playlist.m3u8?origin=",
                resolved.session_id
            );
            assert!(
                resolved.url.as_str().starts_with(&expected_prefix),
                "{} does not start with {}",
                resolved.url,
                expected_prefix
            );
        }
    }

    #[test]
    fn blank_origin_falls_back_to_demo_playlist() {
        let mut builder = builder();
        for origin in [None, Some(String::new()), Some("   \t".to_string())] {
            let resolved = builder.build(&PlaybackRequest::new("http://localhost:3000/", origin));
            assert_eq!(
                resolved.effective_origin,
                "http://localhost:3000/demo/playlist.m3u8"
            );
            assert_eq!(origin_param(&resolved.url), resolved.effective_origin);
        }
    }

    #[test]
    fn explicit_origin_is_trimmed_and_encoded_as_one_value() {
        let mut builder = builder();
        let origin = "  https://cdn.example.com/live/master.m3u8?token=a&b=c d  ";
        let resolved = builder.build(&PlaybackRequest::new(
            "https://stitch.example.com",
            Some(origin.to_string()),
        ));

        let query = resolved.url.as_str().split_once('?').expect("query").1;
        assert_eq!(query.matches('&').count(), 0);
        assert_eq!(query.matches('?').count(), 0);
        assert_eq!(origin_param(&resolved.url), origin.trim());
    }

    #[test]
    fn end_to_end_demo_url_shape() {
        let mut builder = builder();
        let resolved = builder.build(&PlaybackRequest::new(
            "https://example.com/stitcher/",
            Some(String::new()),
        ));

        let id = resolved.session_id.as_str();
        assert!(id.starts_with("demo-") && id.len() == 13);
        assert_eq!(
            resolved.url.as_str(),
            format!(
                "https://example.com/stitcher/stitch/{id}/playlist.m3u8?origin=https%3A%2F%2Fexample.com%2Fstitcher%2Fdemo%2Fplaylist.m3u8"
            )
        );
    }

    #[test]
    fn empty_base_is_not_rejected() {
        let mut builder = builder();
        let resolved = builder.build(&PlaybackRequest::default());
        assert!(resolved.url.as_str().starts_with("/stitch/demo-"));
        assert_eq!(resolved.effective_origin, "/demo/playlist.m3u8");
    }

    #[test]
    fn every_build_gets_a_fresh_session_id() {
        let mut builder = builder();
        let request = PlaybackRequest::new("https://example.com", None);
        let first = builder.build(&request);
        let second = builder.build(&request);
        assert_ne!(first.session_id, second.session_id);
        assert_ne!(first.url, second.url);
    }
}
