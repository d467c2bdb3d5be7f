/*!
 * Integration tests for the document-to-blocks pipeline and caption sources
 */

use anyhow::Result;

use vttmerge::app_config::YtDlpConfig;
use vttmerge::caption_source::{CaptionSource, DirectorySource, YtDlpSource};
use vttmerge::errors::FetchError;
use vttmerge::sentence_merger::MergedBlock;
use vttmerge::track_selection::TrackSelector;
use vttmerge::transcript::TranscriptOutcome;
use crate::common;

/// Test that the three outcomes are told apart
#[test]
fn test_transcriptOutcome_withEachDocumentKind_shouldClassify() {
    assert!(matches!(TranscriptOutcome::from_vtt(common::SAMPLE_VTT), TranscriptOutcome::Blocks(ref b) if b.len() == 3));
    assert_eq!(TranscriptOutcome::from_vtt("<html></html>"), TranscriptOutcome::FormatMismatch);
    assert_eq!(TranscriptOutcome::from_vtt("WEBVTT\nKind: captions\n"), TranscriptOutcome::Empty);
}

/// Test the short three-cue scenario end to end
#[test]
fn test_transcriptOutcome_withGreetingTrack_shouldMergeBySentence() {
    let raw = "WEBVTT\n\n00:00:00.000 --> 00:00:00.500\nHello\n\n\
               00:00:00.500 --> 00:00:01.000\nworld.\n\n\
               00:00:03.000 --> 00:00:03.300\nNext\n";

    let blocks = TranscriptOutcome::from_vtt(raw).into_blocks().unwrap();

    assert_eq!(
        blocks,
        vec![MergedBlock::new("Hello world.", 0, 1000), MergedBlock::new("Next", 3000, 300)]
    );
}

#[tokio::test]
async fn test_directorySource_shouldFetchMatchingFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_caption_file(temp_dir.path(), "abc", "de", &common::single_cue_vtt("Hallo."))?;
    common::create_caption_file(temp_dir.path(), "abc", "en-US", common::SAMPLE_VTT)?;
    common::create_caption_file(temp_dir.path(), "abcd", "ja", &common::single_cue_vtt("other video"))?;

    let source = DirectorySource::new(temp_dir.path());
    let selector = TrackSelector::manual_then_automatic(&["ja", "en.*", "de.*"]);

    let fetched = source.fetch("abc", &selector).await?.expect("a track should match");

    assert_eq!(fetched.video_id, "abc");
    assert_eq!(fetched.language.as_deref(), Some("en-US"));
    assert_eq!(fetched.raw, common::SAMPLE_VTT);
    Ok(())
}

#[tokio::test]
async fn test_directorySource_withoutMatchingLanguage_shouldReturnNone() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_caption_file(temp_dir.path(), "abc", "sv", common::SAMPLE_VTT)?;

    let source = DirectorySource::new(temp_dir.path());
    let selector = TrackSelector::manual_then_automatic(&["ja", "en.*"]);

    assert!(source.fetch("abc", &selector).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_directorySource_withMissingDirectory_shouldFail() {
    let source = DirectorySource::new("/definitely/not/a/caption/dir");
    let selector = TrackSelector::manual_then_automatic(&["en.*"]);

    let result = source.fetch("abc", &selector).await;

    assert!(matches!(result, Err(FetchError::Io(_))));
}

#[tokio::test]
async fn test_ytDlpSource_withMissingBinary_shouldReportToolNotFound() {
    let source = YtDlpSource::new(YtDlpConfig {
        binary: "vttmerge-no-such-tool".to_string(),
        ..YtDlpConfig::default()
    });
    let selector = TrackSelector::manual_then_automatic(&["en.*"]);

    let result = source.fetch("abc", &selector).await;

    assert!(matches!(result, Err(FetchError::ToolNotFound(ref tool)) if tool == "vttmerge-no-such-tool"));
}

/// Fake yt-dlp: prints a track listing, then writes the requested track
#[cfg(unix)]
const FAKE_YTDLP: &str = r#"#!/bin/sh
prev=""
out=""
lang=""
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  if [ "$prev" = "--sub-langs" ]; then lang="$arg"; fi
  prev="$arg"
done
case "$*" in
  *--dump-json*)
    echo '{"id":"abc","subtitles":{"fr":[{"ext":"vtt"}]},"automatic_captions":{"en":[{"ext":"vtt"}]}}'
    ;;
  *)
    printf 'WEBVTT\n\n00:00:00.000 --> 00:00:01.000\nBonjour.\n' > "$out.$lang.vtt"
    ;;
esac
"#;

#[cfg(unix)]
#[tokio::test]
async fn test_ytDlpSource_withFakeTool_shouldDownloadSelectedTrack() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = common::create_temp_dir()?;
    let script = common::create_test_file(temp_dir.path(), "fake-yt-dlp", FAKE_YTDLP)?;
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))?;

    let source = YtDlpSource::new(YtDlpConfig {
        binary: script.to_string_lossy().to_string(),
        timeout_secs: 30,
        ..YtDlpConfig::default()
    });
    let selector = TrackSelector::manual_then_automatic(&["en.*", "fr.*"]);

    let tracks = source.list_tracks("abc").await?;
    assert_eq!(tracks.len(), 2);

    let fetched = source.fetch("abc", &selector).await?.expect("the manual French track");

    assert_eq!(fetched.language.as_deref(), Some("fr"));
    assert_eq!(
        TranscriptOutcome::from_vtt(&fetched.raw),
        TranscriptOutcome::Blocks(vec![MergedBlock::new("Bonjour.", 0, 1000)])
    );
    Ok(())
}
