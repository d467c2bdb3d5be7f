/*!
 * Tests for caption track selection
 */

use vttmerge::track_selection::{CaptionTrack, SelectionStrategy, TrackKind, TrackSelector};

fn track(language: &str, kind: TrackKind, formats: &[&str]) -> CaptionTrack {
    CaptionTrack::new(language, kind, formats.iter().map(|f| f.to_string()).collect())
}

fn default_patterns() -> Vec<String> {
    vttmerge::Config::default().language_patterns
}

/// Test that a manual track wins even when its pattern ranks lower
#[test]
fn test_select_withManualAndAutomatic_shouldPreferManual() {
    let tracks = vec![
        track("ja", TrackKind::Automatic, &["vtt"]),
        track("fr", TrackKind::Manual, &["vtt"]),
    ];
    let selector = TrackSelector::manual_then_automatic(&default_patterns());

    let selected = selector.select(&tracks).unwrap();

    assert_eq!(selected.language, "fr");
    assert_eq!(selected.kind, TrackKind::Manual);
}

#[test]
fn test_select_withOnlyAutomatic_shouldFallBack() {
    let tracks = vec![
        track("ko", TrackKind::Automatic, &["vtt"]),
        track("en-US", TrackKind::Automatic, &["vtt"]),
    ];
    let selector = TrackSelector::manual_then_automatic(&default_patterns());

    assert_eq!(selector.select(&tracks).unwrap().language, "en-US");
}

#[test]
fn test_select_withSeveralMatches_shouldFollowPatternOrder() {
    let tracks = vec![
        track("de", TrackKind::Manual, &["vtt"]),
        track("es-MX", TrackKind::Manual, &["vtt"]),
        track("ja", TrackKind::Manual, &["vtt"]),
    ];
    let selector = TrackSelector::manual_then_automatic(&default_patterns());

    assert_eq!(selector.select(&tracks).unwrap().language, "ja");
}

#[test]
fn test_select_withSamePattern_shouldPreferVttFormat() {
    let tracks = vec![
        track("en", TrackKind::Manual, &["srv3"]),
        track("en-GB", TrackKind::Manual, &["json3", "vtt"]),
    ];
    let selector = TrackSelector::manual_then_automatic(&["en.*"]);

    assert_eq!(selector.select(&tracks).unwrap().language, "en-GB");
}

#[test]
fn test_select_withNoAcceptableTrack_shouldReturnNone() {
    let tracks = vec![track("ru", TrackKind::Manual, &["vtt"])];
    let selector = TrackSelector::manual_then_automatic(&["ja", "en.*"]);

    assert!(selector.select(&tracks).is_none());
    assert!(selector.select(&[]).is_none());
}

#[test]
fn test_customStrategies_shouldRunInGivenOrder() {
    let tracks = vec![
        track("en", TrackKind::Manual, &["vtt"]),
        track("ja", TrackKind::Automatic, &["vtt"]),
    ];
    let selector = TrackSelector::new(vec![
        SelectionStrategy::new(TrackKind::Automatic, vec!["ja".to_string()]),
        SelectionStrategy::new(TrackKind::Manual, vec!["en.*".to_string()]),
    ]);

    assert_eq!(selector.select(&tracks).unwrap().language, "ja");
    assert_eq!(selector.strategies().len(), 2);
    assert_eq!(selector.all_patterns(), vec!["ja".to_string(), "en.*".to_string()]);
}
