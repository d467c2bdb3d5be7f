/*!
 * Tests for WebVTT cue parsing
 */

use vttmerge::caption_parser::{clean_text, is_boilerplate, looks_like_vtt, parse_timestamp, parse_vtt, AtomicCue};
use vttmerge::errors::CaptionError;
use crate::common;

/// Test the sample track end to end
#[test]
fn test_parseVtt_withAutoGeneratedTrack_shouldDropHeaderAndRepeats() {
    let cues = parse_vtt(common::SAMPLE_VTT).unwrap();

    assert_eq!(
        cues,
        vec![
            AtomicCue::new("so today we are", 0, 1500),
            AtomicCue::new("going to cook pasta.", 1500, 1500),
            AtomicCue::new("First, boil water.", 3000, 1000),
            AtomicCue::new("then salt it", 6000, 1000),
        ]
    );
}

/// Test the format sniff
#[test]
fn test_parseVtt_withHtmlDocument_shouldReturnFormatMismatch() {
    let html = "<!DOCTYPE html><html><head><title>Sign in</title></head></html>";
    assert_eq!(parse_vtt(html), Err(CaptionError::FormatMismatch));
}

#[test]
fn test_looksLikeVtt_withMarkerPastWindow_shouldReject() {
    let late = format!("{}WEBVTT", " ".repeat(100));
    assert!(!looks_like_vtt(&late));

    let early = format!("{}WEBVTT", " ".repeat(94));
    assert!(looks_like_vtt(&early));
}

#[test]
fn test_looksLikeVtt_withMultibytePrefix_shouldCountCharacters() {
    let prefix = "é".repeat(90);
    assert!(looks_like_vtt(&format!("{}WEBVTT", prefix)));
}

/// Test that a recognized but text-free track is not an error
#[test]
fn test_parseVtt_withOnlyBoilerplate_shouldReturnEmpty() {
    let raw = "WEBVTT\nKind: captions\nLanguage: ja\n\n1\n00:00:00.000 --> 00:00:01.000\nhttps://example.com/track\n";
    assert_eq!(parse_vtt(raw), Ok(vec![]));
}

#[test]
fn test_parseVtt_withNonAdjacentDuplicates_shouldKeepBoth() {
    let raw = "WEBVTT\n\n00:00:00.000 --> 00:00:01.000\nyes\n\n\
               00:00:01.000 --> 00:00:02.000\nno\n\n\
               00:00:02.000 --> 00:00:03.000\nyes\n";

    let texts: Vec<String> = parse_vtt(raw).unwrap().into_iter().map(|c| c.text).collect();

    assert_eq!(texts, vec!["yes", "no", "yes"]);
}

/// Test that a broken timing line keeps the previous timing
#[test]
fn test_parseVtt_withBrokenTimingLine_shouldKeepPreviousTiming() {
    let raw = "WEBVTT\n\n00:00:05.000 --> 00:00:06.000\nfirst\n\n00:00:09.000-->00:00:10.000\nsecond\n";

    let cues = parse_vtt(raw).unwrap();

    assert_eq!(cues[1], AtomicCue::new("second", 5000, 1000));
}

#[test]
fn test_parseVtt_withReversedTiming_shouldClampDurationToZero() {
    let raw = "WEBVTT\n\n00:00:05.000 --> 00:00:04.000\nbackwards\n";
    assert_eq!(parse_vtt(raw).unwrap(), vec![AtomicCue::new("backwards", 5000, 0)]);
}

#[test]
fn test_parseVtt_withCrlfLineEndings_shouldParse() {
    let raw = "WEBVTT\r\n\r\n00:00:01.000 --> 00:00:02.000\r\nHello.\r\n";
    assert_eq!(parse_vtt(raw).unwrap(), vec![AtomicCue::new("Hello.", 1000, 1000)]);
}

#[test]
fn test_parseTimestamp_withMalformedInput_shouldReturnZero() {
    assert_eq!(parse_timestamp("1:2:3:4.000"), 0);
    assert_eq!(parse_timestamp("xx:00.000"), 0);
    assert_eq!(parse_timestamp("00:00:01.500"), 1500);
}

#[test]
fn test_cleanText_shouldStripTagsAndCollapseWhitespace() {
    assert_eq!(clean_text("<00:00:01.000><c> hello</c>   <b>world</b> "), "hello world");
    assert_eq!(clean_text("<i></i>"), "");
}

#[test]
fn test_cleanText_appliedTwice_shouldBeStable() {
    let once = clean_text("  <c.color>Some\t text</c>  here ");
    assert_eq!(clean_text(&once), once);
}

#[test]
fn test_isBoilerplate_withMetadataLines_shouldDetect() {
    assert!(is_boilerplate("#EXTM3U"));
    assert!(is_boilerplate("http://example.com"));
    assert!(is_boilerplate("var x = {a: 1}"));
    assert!(is_boilerplate("window.ytplayer = 1"));
    assert!(is_boilerplate("Auto-generated CAPTIONS LANGUAGE selector"));
    assert!(!is_boilerplate("We went to the market."));
}

#[test]
fn test_parseVtt_withAdjacentDuplicates_shouldCollapse() {
    let raw = "WEBVTT\n\n00:00:00.000 --> 00:00:01.000\nHello\n\n00:00:01.000 --> 00:00:02.000\nHello\n";
    assert_eq!(parse_vtt(raw).unwrap(), vec![AtomicCue::new("Hello", 0, 1000)]);
}

#[test]
fn test_parseVtt_withMarkerInsideBody_shouldDropMarkerLine() {
    let raw = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nhi\nWEBVTT\n\n00:00:03.000 --> 00:00:04.000\nthere\n";

    let texts: Vec<String> = parse_vtt(raw).unwrap().into_iter().map(|c| c.text).collect();

    assert_eq!(texts, vec!["hi", "there"]);
}

/// Test that a timing line missing its end timestamp keeps the previous timing
#[test]
fn test_parseVtt_withSingleTimestampTimingLine_shouldKeepPreviousTiming() {
    let raw = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nhi\n\n00:00:05.000 -->\nthere\n";

    assert_eq!(
        parse_vtt(raw).unwrap(),
        vec![AtomicCue::new("hi", 1000, 1000), AtomicCue::new("there", 1000, 1000)]
    );
}

#[test]
fn test_parseVtt_withNonAsciiDigitCueId_shouldDropIdLine() {
    let raw = "WEBVTT\n\n١٢٣\n00:00:01.000 --> 00:00:02.000\nmarhaba\n";
    assert_eq!(parse_vtt(raw).unwrap(), vec![AtomicCue::new("marhaba", 1000, 1000)]);
}
