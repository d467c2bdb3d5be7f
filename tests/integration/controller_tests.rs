/*!
 * Integration tests for the batch run and language reconciliation
 */

use anyhow::Result;
use std::collections::HashMap;

use vttmerge::app_config::{Config, PacingConfig, YtDlpConfig};
use vttmerge::app_controller::{BatchSummary, Controller, ReconcileSummary, SubjectsFile};
use vttmerge::caption_source::YtDlpSource;
use vttmerge::database::Repository;
use vttmerge::sentence_merger::MergedBlock;
use crate::common;

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// One video per outcome: stored, unmatched language, not VTT, empty, missing
fn populate_captions(dir: &std::path::Path) -> Result<()> {
    common::create_caption_file(dir, "stored", "en", common::SAMPLE_VTT)?;
    common::create_caption_file(dir, "swedish", "sv", common::SAMPLE_VTT)?;
    common::create_caption_file(dir, "html", "ja", "<!DOCTYPE html><html></html>")?;
    common::create_caption_file(dir, "blank", "fr", "WEBVTT\nKind: captions\nLanguage: fr\n")?;
    Ok(())
}

#[tokio::test]
async fn test_runBatch_withMixedVideos_shouldCountEachOutcome() -> Result<()> {
    common::init_test_logger();
    let temp_dir = common::create_temp_dir()?;
    populate_captions(temp_dir.path())?;
    let controller = common::offline_controller(temp_dir.path())?;

    let summary = controller
        .run_batch(&ids(&["stored", "swedish", "html", "blank", "missing"]), false)
        .await?;

    assert_eq!(summary, BatchSummary { processed: 5, succeeded: 1, skipped: 4, failed: 0 });

    let stored = controller.repository().get_transcript("stored").await?.unwrap();
    assert_eq!(stored.language.as_deref(), Some("en"));
    assert_eq!(stored.blocks.len(), 3);
    assert!(controller.repository().get_transcript("blank").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_runBatch_withStoredVideo_shouldSkipUnlessForced() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    populate_captions(temp_dir.path())?;
    let controller = common::offline_controller(temp_dir.path())?;
    let batch = ids(&["stored"]);

    controller.run_batch(&batch, false).await?;
    let second = controller.run_batch(&batch, false).await?;
    let forced = controller.run_batch(&batch, true).await?;

    assert_eq!(second, BatchSummary { processed: 1, succeeded: 0, skipped: 1, failed: 0 });
    assert_eq!(forced, BatchSummary { processed: 1, succeeded: 1, skipped: 0, failed: 0 });
    Ok(())
}

#[tokio::test]
async fn test_runBatch_withMissingCaptionDir_shouldSkipAll() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = common::offline_controller(&temp_dir.path().join("absent"))?;

    let summary = controller.run_batch(&ids(&["a", "b"]), false).await?;

    assert_eq!(summary, BatchSummary { processed: 2, succeeded: 0, skipped: 2, failed: 0 });
    Ok(())
}

#[tokio::test]
async fn test_runBatch_withMissingTool_shouldAbort() -> Result<()> {
    let config = Config {
        pacing: PacingConfig::none(),
        ..Config::default()
    };
    let source = YtDlpSource::new(YtDlpConfig {
        binary: "vttmerge-no-such-tool".to_string(),
        ..YtDlpConfig::default()
    });
    let controller = Controller::with_parts(config, Repository::new_in_memory()?, Box::new(source));

    assert!(controller.run_batch(&ids(&["a"]), false).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_runBatch_withPacing_shouldSleepBetweenFetchesOnly() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    populate_captions(temp_dir.path())?;
    let mut config = common::offline_config(temp_dir.path());
    config.pacing = PacingConfig { min_delay_ms: 50, max_delay_ms: 50 };
    let source = vttmerge::DirectorySource::new(temp_dir.path());
    let controller = Controller::with_parts(config, Repository::new_in_memory()?, Box::new(source));

    let start = std::time::Instant::now();
    controller.run_batch(&ids(&["stored", "swedish", "html"]), false).await?;

    assert!(start.elapsed() >= std::time::Duration::from_millis(100));
    Ok(())
}

/// Test that mismatched languages are refetched with the subject's codes
#[tokio::test]
async fn test_reconcileLanguages_shouldRefetchMismatches() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    common::create_caption_file(dir, "wrong", "ja", &common::single_cue_vtt("konnichiwa."))?;
    common::create_caption_file(dir, "wrong", "ko", &common::single_cue_vtt("annyeong."))?;

    let controller = common::offline_controller(dir)?;
    let repo = controller.repository();
    let placeholder = vec![MergedBlock::new("placeholder", 0, 1000)];

    repo.upsert_transcript("wrong", &placeholder, Some("ko")).await?;
    repo.upsert_transcript("right", &placeholder, Some("en")).await?;
    repo.upsert_transcript("alien", &placeholder, Some("en")).await?;
    repo.upsert_transcript("nosubject", &placeholder, Some("de")).await?;
    repo.upsert_transcript("unfixable", &placeholder, Some("en-orig")).await?;

    let subjects = SubjectsFile {
        roadmap: HashMap::from([
            ("wrong".to_string(), "Japanese".to_string()),
            ("alien".to_string(), "Klingon".to_string()),
        ]),
        library: HashMap::from([
            ("wrong".to_string(), "Korean".to_string()),
            ("right".to_string(), "English".to_string()),
            ("unfixable".to_string(), "English".to_string()),
        ]),
    };
    controller.import_subjects(&subjects).await?;

    let summary = controller.reconcile_languages().await?;

    assert_eq!(summary, ReconcileSummary { checked: 4, mismatched: 2, fixed: 1, unknown_subject: 1, same_base: 1 });

    let fixed = repo.get_transcript("wrong").await?.unwrap();
    assert_eq!(fixed.language.as_deref(), Some("ja"));
    assert_eq!(fixed.blocks, vec![MergedBlock::new("konnichiwa.", 0, 1000)]);

    let untouched = repo.get_transcript("unfixable").await?.unwrap();
    assert_eq!(untouched.language.as_deref(), Some("en-orig"));
    Ok(())
}

#[tokio::test]
async fn test_importSubjects_shouldKeepRoadmapOverLibrary() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "subjects.json",
        r#"{"roadmap": {"v1": "German"}, "library": {"v1": "French", "v2": "Italian", "v3": ""}}"#,
    )?;
    let controller = common::offline_controller(temp_dir.path())?;

    let written = controller.import_subjects(&SubjectsFile::load(&path)?).await?;

    let subjects = controller.repository().subjects().await?;
    assert_eq!(written, 2);
    assert_eq!(subjects.get("v1").map(String::as_str), Some("German"));
    assert_eq!(subjects.get("v2").map(String::as_str), Some("Italian"));
    assert!(!subjects.contains_key("v3"));
    Ok(())
}
