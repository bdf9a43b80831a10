/*!
 * End-to-end runs of the controller with a mock speech engine and fake media tools
 */

use anyhow::Result;
use std::fs;
use std::sync::Arc;
use storyreel::app_controller::Controller;
use storyreel::errors::PipelineError;
use storyreel::pipeline::UnitState;
use storyreel::speech::mock::MockEngine;

use crate::common::{self, FakeMedia, FALLBACK_VOICE, PRIMARY_VOICE};

/// Test the happy path: every line becomes one segment, in order
#[tokio::test]
async fn test_run_withThreeLinesAndThreeImages_shouldAssembleAllInOrder() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_script(temp_dir.path(), &["First line.", "Second line.", "Third line."])?;
    common::create_images(temp_dir.path(), 3)?;

    let media = Arc::new(FakeMedia::new());
    let controller = Controller::with_config(common::fast_config())?;
    let report = controller
        .run_with_backends(temp_dir.path(), common::backends(Arc::new(MockEngine::working()), media.clone()))
        .await?;

    assert_eq!(report.segments, 3);
    assert!(report.failures.is_empty());
    assert!(report.states.iter().all(|state| *state == UnitState::Done));
    assert!(!temp_dir.path().join("tts_failed.txt").exists());
    assert_eq!(
        common::read_output_lines(&report.output)?,
        vec![
            format!("First line.|1.png|{}", PRIMARY_VOICE),
            format!("Second line.|2.png|{}", PRIMARY_VOICE),
            format!("Third line.|3.png|{}", PRIMARY_VOICE),
        ]
    );
    assert_eq!(media.concat_count(), 1);
    Ok(())
}

/// Test that intermediates live in a per-run workspace that is gone afterwards
#[tokio::test]
async fn test_run_withWorkspaceRoot_shouldRemoveWorkspaceAfterSuccess() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let workspace_root = common::create_temp_dir()?;
    common::create_script(temp_dir.path(), &["Only line."])?;
    common::create_images(temp_dir.path(), 1)?;

    let controller = Controller::with_config(common::fast_config())?.with_workspace_root(workspace_root.path());
    controller
        .run_with_backends(temp_dir.path(), common::backends(Arc::new(MockEngine::working()), Arc::new(FakeMedia::new())))
        .await?;

    assert!(common::leftover_workspaces(workspace_root.path())?.is_empty());
    assert!(!temp_dir.path().join("001.mp3").exists());
    Ok(())
}

/// Test that extra images are left unused
#[tokio::test]
async fn test_run_withMoreImagesThanLines_shouldUseFirstImages() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_script(temp_dir.path(), &["One.", "Two.", "Three."])?;
    common::create_images(temp_dir.path(), 5)?;

    let media = Arc::new(FakeMedia::new());
    let controller = Controller::with_config(common::fast_config())?;
    let report = controller
        .run_with_backends(temp_dir.path(), common::backends(Arc::new(MockEngine::working()), media.clone()))
        .await?;

    assert_eq!(report.segments, 3);
    let rendered: Vec<String> = media
        .renders()
        .iter()
        .map(|(image, _)| image.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(rendered, vec!["1.png", "2.png", "3.png"]);
    Ok(())
}

/// Test that extra lines are dropped when images run out
#[tokio::test]
async fn test_run_withMoreLinesThanImages_shouldStopAtLastImage() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_script(temp_dir.path(), &["One.", "Two.", "Three.", "Four."])?;
    common::create_images(temp_dir.path(), 2)?;

    let engine = Arc::new(MockEngine::working());
    let controller = Controller::with_config(common::fast_config())?;
    let report = controller
        .run_with_backends(temp_dir.path(), common::backends(engine.clone(), Arc::new(FakeMedia::new())))
        .await?;

    assert_eq!(report.segments, 2);
    assert_eq!(report.states.len(), 2);
    assert!(engine.calls().iter().all(|(_, text)| text != "Three." && text != "Four."));
    Ok(())
}

/// Test that one permanently failing line is skipped and logged
#[tokio::test]
async fn test_run_withOneFailingLine_shouldSkipItAndLogFailure() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_script(temp_dir.path(), &["Alpha.", "Broken beta.", "Gamma.", "Delta."])?;
    common::create_images(temp_dir.path(), 4)?;

    let engine = Arc::new(MockEngine::working().failing_text("Broken"));
    let controller = Controller::with_config(common::fast_config())?;
    let report = controller
        .run_with_backends(temp_dir.path(), common::backends(engine, Arc::new(FakeMedia::new())))
        .await?;

    assert_eq!(report.segments, 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].line_number, 2);
    assert_eq!(report.states, vec![UnitState::Done; 4]);

    let lines = common::read_output_lines(&report.output)?;
    let texts: Vec<&str> = lines.iter().map(|line| line.split('|').next().unwrap()).collect();
    assert_eq!(texts, vec!["Alpha.", "Gamma.", "Delta."]);
    assert!(lines[1].contains("|3.png|"));

    let log = fs::read_to_string(temp_dir.path().join("tts_failed.txt"))?;
    assert!(log.starts_with("Line 2: Broken beta.\nError: "));
    assert!(log.ends_with("\n\n"));
    assert_eq!(log.matches("Line ").count(), 1);
    Ok(())
}

/// Test that a run where nothing can be spoken fails and keeps the old output
#[tokio::test]
async fn test_run_withAllLinesFailing_shouldKeepExistingOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_script(temp_dir.path(), &["One.", "Two."])?;
    common::create_images(temp_dir.path(), 2)?;
    let output = common::create_test_file(temp_dir.path(), "output.mp4", "previous video")?;

    let media = Arc::new(FakeMedia::new());
    let controller = Controller::with_config(common::fast_config())?;
    let error = controller
        .run_with_backends(temp_dir.path(), common::backends(Arc::new(MockEngine::failing()), media.clone()))
        .await
        .unwrap_err();

    match error.downcast_ref::<PipelineError>() {
        Some(PipelineError::AllUnitsFailed { failure_log }) => {
            assert!(failure_log.ends_with("tts_failed.txt"));
        }
        other => panic!("expected AllUnitsFailed, got {:?}", other),
    }
    assert!(error.to_string().contains("tts_failed.txt"));
    assert_eq!(fs::read_to_string(&output)?, "previous video");
    assert_eq!(media.concat_count(), 0);

    let log = fs::read_to_string(temp_dir.path().join("tts_failed.txt"))?;
    assert_eq!(log.matches("Line ").count(), 2);
    Ok(())
}

/// Test that a failing primary voice is replaced by the catalog fallback
#[tokio::test]
async fn test_run_withFailingPrimaryVoice_shouldNarrateWithFallback() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_script(temp_dir.path(), &["Hello.", "World."])?;
    common::create_images(temp_dir.path(), 2)?;

    let engine = Arc::new(MockEngine::working().failing_voice(PRIMARY_VOICE));
    let controller = Controller::with_config(common::fast_config())?;
    let report = controller
        .run_with_backends(temp_dir.path(), common::backends(engine, Arc::new(FakeMedia::new())))
        .await?;

    assert!(report.failures.is_empty());
    for line in common::read_output_lines(&report.output)? {
        assert!(line.ends_with(FALLBACK_VOICE), "{} was not narrated by the fallback", line);
    }
    Ok(())
}

/// Test that silent audio is floored and the image track padded past it
#[tokio::test]
async fn test_run_withZeroLengthAudio_shouldRenderMinimumDuration() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_script(temp_dir.path(), &["..."])?;
    common::create_images(temp_dir.path(), 1)?;

    let media = Arc::new(FakeMedia::new().with_duration(0.0));
    let controller = Controller::with_config(common::fast_config())?;
    controller
        .run_with_backends(temp_dir.path(), common::backends(Arc::new(MockEngine::working()), media.clone()))
        .await?;

    let renders = media.renders();
    assert_eq!(renders.len(), 1);
    assert!((renders[0].1 - 0.2).abs() < 1e-9, "rendered for {}s", renders[0].1);
    Ok(())
}

/// Test that every image track outlasts its audio
#[tokio::test]
async fn test_run_withSpokenLines_shouldPadEveryImageTrack() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_script(temp_dir.path(), &["one two three", "four five"])?;
    common::create_images(temp_dir.path(), 2)?;

    let media = Arc::new(FakeMedia::new());
    let controller = Controller::with_config(common::fast_config())?;
    controller
        .run_with_backends(temp_dir.path(), common::backends(Arc::new(MockEngine::working()), media.clone()))
        .await?;

    let durations: Vec<f64> = media.renders().iter().map(|(_, seconds)| *seconds).collect();
    assert!((durations[0] - 1.3).abs() < 1e-9);
    assert!((durations[1] - 0.9).abs() < 1e-9);
    Ok(())
}

/// Test that a second run replaces the first run's output and failure log
#[tokio::test]
async fn test_run_twice_shouldOverwriteOutputAndResetFailureLog() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_script(temp_dir.path(), &["Old one.", "Broken two."])?;
    common::create_images(temp_dir.path(), 2)?;

    let controller = Controller::with_config(common::fast_config())?;
    let engine = Arc::new(MockEngine::working().failing_text("Broken"));
    controller
        .run_with_backends(temp_dir.path(), common::backends(engine, Arc::new(FakeMedia::new())))
        .await?;
    assert!(temp_dir.path().join("tts_failed.txt").exists());

    common::create_script(temp_dir.path(), &["New one.", "New two."])?;
    let report = controller
        .run_with_backends(temp_dir.path(), common::backends(Arc::new(MockEngine::working()), Arc::new(FakeMedia::new())))
        .await?;

    let lines = common::read_output_lines(&report.output)?;
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("New one."));
    assert!(!temp_dir.path().join("tts_failed.txt").exists());
    Ok(())
}

/// Test that a render failure stops the run before later lines are touched
#[tokio::test]
async fn test_run_withRenderFailure_shouldAbortRun() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_script(temp_dir.path(), &["One.", "Two.", "Three."])?;
    common::create_images(temp_dir.path(), 3)?;

    let workspace_root = common::create_temp_dir()?;

    let engine = Arc::new(MockEngine::working());
    let media = Arc::new(FakeMedia::new().failing_image("2.png"));
    let controller = Controller::with_config(common::fast_config())?.with_workspace_root(workspace_root.path());
    let error = controller
        .run_with_backends(temp_dir.path(), common::backends(engine.clone(), media.clone()))
        .await
        .unwrap_err();

    match error.downcast_ref::<PipelineError>() {
        Some(PipelineError::Render { line, .. }) => assert_eq!(*line, 2),
        other => panic!("expected Render error, got {:?}", other),
    }
    assert_eq!(media.renders().len(), 2);
    assert_eq!(media.concat_count(), 0);
    assert_eq!(engine.call_count(), 2);
    assert!(!temp_dir.path().join("output.mp4").exists());
    assert!(common::leftover_workspaces(workspace_root.path())?.is_empty());
    Ok(())
}

/// Test that synthesis look-ahead does not change the output order
#[tokio::test]
async fn test_run_withConcurrentRequests_shouldKeepScriptOrder() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let script: Vec<String> = (1..=8).map(|n| format!("Line number {}.", n)).collect();
    let script_refs: Vec<&str> = script.iter().map(String::as_str).collect();
    common::create_script(temp_dir.path(), &script_refs)?;
    common::create_images(temp_dir.path(), 8)?;

    let mut config = common::fast_config();
    config.speech.concurrent_requests = 4;
    let controller = Controller::with_config(config)?;
    let report = controller
        .run_with_backends(temp_dir.path(), common::backends(Arc::new(MockEngine::working()), Arc::new(FakeMedia::new())))
        .await?;

    let lines = common::read_output_lines(&report.output)?;
    for (index, line) in lines.iter().enumerate() {
        assert!(line.starts_with(&format!("Line number {}.|{}.png|", index + 1, index + 1)));
    }
    assert_eq!(lines.len(), 8);
    Ok(())
}

/// Test that look-ahead starts later syntheses before the first line is rendered
#[tokio::test]
async fn test_run_withConcurrentRequests_shouldStartSynthesisAhead() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_script(temp_dir.path(), &["One.", "Two.", "Three.", "Four.", "Five."])?;
    common::create_images(temp_dir.path(), 5)?;

    let mut config = common::fast_config();
    config.speech.concurrent_requests = 3;
    let engine = Arc::new(MockEngine::working());
    let media = Arc::new(FakeMedia::new().failing_image("1.png"));
    let controller = Controller::with_config(config)?;
    let error = controller
        .run_with_backends(temp_dir.path(), common::backends(engine.clone(), media.clone()))
        .await
        .unwrap_err();

    assert!(matches!(error.downcast_ref::<PipelineError>(), Some(PipelineError::Render { line: 1, .. })));
    assert_eq!(media.renders().len(), 1);
    let mut started: Vec<String> = engine.calls().into_iter().map(|(_, text)| text).collect();
    started.sort();
    assert_eq!(started, vec!["One.", "Three.", "Two."]);
    Ok(())
}
