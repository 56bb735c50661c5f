use crate::engine::Fragment;

use super::state::{AdBreakState, Transition};

/// Stitched ad segments are served from under this path segment.
pub const AD_PATH_SEGMENT: &str = "/ad/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    Ad,
    Content,
}

/// Fragments without a URL count as content.
pub fn classify(fragment: &Fragment) -> FragmentKind {
    match fragment.url.as_deref() {
        Some(url) if url.contains(AD_PATH_SEGMENT) => FragmentKind::Ad,
        _ => FragmentKind::Content,
    }
}

/// Edge-triggered: a run of ad fragments is one break, counted once.
#[derive(Debug, Clone, Default)]
pub struct AdBreakDetector {
    state: AdBreakState,
    count: u32,
}

impl AdBreakDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AdBreakState {
        self.state
    }

    pub fn ad_break_count(&self) -> u32 {
        self.count
    }

    pub fn on_fragment(&mut self, fragment: &Fragment) -> Transition {
        match (classify(fragment), self.state) {
            (FragmentKind::Ad, AdBreakState::Content) => {
                self.state = AdBreakState::AdBreak;
                self.count = self.count.saturating_add(1);
                Transition::Entered
            }
            (FragmentKind::Content, AdBreakState::AdBreak) => {
                self.state = AdBreakState::Content;
                Transition::Exited
            }
            _ => Transition::None,
        }
    }

    pub fn reset(&mut self) {
        self.state = AdBreakState::Content;
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn frag(sn: u64, url: Option<&str>) -> Fragment {
        Fragment {
            sn,
            duration: 6.0,
            url: url.map(str::to_string),
        }
    }

    fn content(sn: u64) -> Fragment {
        frag(sn, Some("https://cdn.example.com/content/seg.ts"))
    }

    fn ad(sn: u64) -> Fragment {
        frag(sn, Some("https://stitch.example.com/ad/break-1/seg0.ts"))
    }

    #[rstest]
    #[case(Some("https://x/ad/1.ts"), FragmentKind::Ad)]
    #[case(Some("/ad/"), FragmentKind::Ad)]
    #[case(Some("https://x/ads/1.ts"), FragmentKind::Content)]
    #[case(Some("https://x/adbreak/1.ts"), FragmentKind::Content)]
    #[case(Some("https://x/AD/1.ts"), FragmentKind::Content)]
    #[case(Some(""), FragmentKind::Content)]
    #[case(None, FragmentKind::Content)]
    fn classifies_by_ad_path_segment(#[case] url: Option<&str>, #[case] expected: FragmentKind) {
        assert_eq!(classify(&frag(1, url)), expected);
    }

    #[test]
    fn transitions_are_edge_triggered() {
        let mut detector = AdBreakDetector::new();
        let sequence = [content(1), content(2), ad(3), ad(4), content(5), ad(6)];

        let transitions: Vec<_> = sequence.iter().map(|f| detector.on_fragment(f)).collect();

        assert_eq!(
            transitions,
            vec![
                Transition::None,
                Transition::None,
                Transition::Entered,
                Transition::None,
                Transition::Exited,
                Transition::Entered,
            ]
        );
        assert_eq!(detector.ad_break_count(), 2);
        assert_eq!(detector.state(), AdBreakState::AdBreak);
    }

    #[test]
    fn reset_reproduces_a_fresh_detector() {
        let sequence = [ad(1), content(2), ad(3), ad(4), frag(5, None)];

        let mut fresh = AdBreakDetector::new();
        let expected: Vec<_> = sequence.iter().map(|f| fresh.on_fragment(f)).collect();

        let mut reused = AdBreakDetector::new();
        reused.on_fragment(&ad(100));
        reused.on_fragment(&ad(101));
        reused.reset();
        assert_eq!(reused.state(), AdBreakState::Content);
        assert_eq!(reused.ad_break_count(), 0);

        let replayed: Vec<_> = sequence.iter().map(|f| reused.on_fragment(f)).collect();
        assert_eq!(replayed, expected);
        assert_eq!(reused.ad_break_count(), fresh.ad_break_count());
    }

    #[test]
    fn missing_url_ends_an_ad_break() {
        let mut detector = AdBreakDetector::new();
        assert_eq!(detector.on_fragment(&ad(1)), Transition::Entered);
        assert_eq!(detector.on_fragment(&frag(2, None)), Transition::Exited);
        assert_eq!(detector.ad_break_count(), 1);
    }
}
