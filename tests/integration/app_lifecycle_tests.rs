/*!
 * Integration tests for controller startup checks
 */

use anyhow::Result;
use std::sync::Arc;
use storyreel::app_config::Config;
use storyreel::app_controller::Controller;
use storyreel::errors::PipelineError;
use storyreel::speech::mock::MockEngine;

use crate::common::{self, FakeMedia};

async fn run_and_expect_error(dir: &std::path::Path) -> Result<PipelineError> {
    let engine = Arc::new(MockEngine::working());
    let controller = Controller::with_config(common::fast_config())?;
    let error = controller
        .run_with_backends(dir, common::backends(engine.clone(), Arc::new(FakeMedia::new())))
        .await
        .unwrap_err();

    // Startup failures never reach the speech engine
    assert_eq!(engine.call_count(), 0);
    Ok(error.downcast::<PipelineError>()?)
}

/// Test the controller initialization with default config
#[test]
fn test_controller_initialization_withDefaultConfig_shouldSucceed() -> Result<()> {
    let controller = Controller::new_for_test()?;
    assert_eq!(controller.config().language, "en");
    Ok(())
}

/// Test that an invalid configuration is rejected up front
#[test]
fn test_controller_withUnsupportedLanguage_shouldFail() {
    let mut config = Config::default();
    config.language = "klingon".to_string();
    assert!(Controller::with_config(config).is_err());
}

/// Test that a folder without script.txt is reported
#[tokio::test]
async fn test_run_withoutScript_shouldFailWithMissingScript() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_images(temp_dir.path(), 2)?;

    let error = run_and_expect_error(temp_dir.path()).await?;

    assert!(matches!(error, PipelineError::MissingScript(ref path) if path.ends_with("script.txt")));
    Ok(())
}

/// Test that a script with only comments and blank lines is reported
#[tokio::test]
async fn test_run_withOnlyComments_shouldFailWithEmptyScript() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_script(temp_dir.path(), &["# title", "", "   ", "  # note"])?;
    common::create_images(temp_dir.path(), 2)?;

    let error = run_and_expect_error(temp_dir.path()).await?;

    assert!(matches!(error, PipelineError::EmptyScript(_)));
    Ok(())
}

/// Test that a folder without images is reported
#[tokio::test]
async fn test_run_withoutImages_shouldFailWithNoImages() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_script(temp_dir.path(), &["Hello."])?;
    common::create_test_file(temp_dir.path(), "notes.gif", "x")?;

    let error = run_and_expect_error(temp_dir.path()).await?;

    assert!(matches!(error, PipelineError::NoImages(_)));
    assert!(error.to_string().contains("No images found"));
    Ok(())
}

/// Test that configured file names are honored
#[tokio::test]
async fn test_run_withCustomFileNames_shouldUseThem() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "story.txt", "Only line.")?;
    common::create_images(temp_dir.path(), 1)?;

    let mut config = common::fast_config();
    config.files.script_file = "story.txt".to_string();
    config.files.output_file = "story.mp4".to_string();
    let controller = Controller::with_config(config)?;

    let report = controller
        .run_with_backends(temp_dir.path(), common::backends(Arc::new(MockEngine::working()), Arc::new(FakeMedia::new())))
        .await?;

    assert_eq!(report.output, temp_dir.path().join("story.mp4"));
    assert!(report.output.exists());
    assert!(!temp_dir.path().join("output.mp4").exists());
    Ok(())
}
