mod helpers;

use std::borrow::Cow;
use std::sync::{Arc, Mutex};

use helpers::{FailingExecutor, RecordingExecutor, populate_boot, test_config};
use luna_builder::BuilderError;
use luna_builder::isolation::ChrootIsolation;
use luna_builder::pipeline::Pipeline;
use luna_builder::report::Reporter;
use luna_builder::stage::{BuildStep, Stage, StageContext};

type RunLog = Arc<Mutex<Vec<usize>>>;

/// Step that records its id and optionally fails.
struct MockStep {
    id: usize,
    fail: bool,
    log: RunLog,
}

impl BuildStep for MockStep {
    fn name(&self) -> Cow<'_, str> {
        Cow::Owned(format!("mock step {}", self.id))
    }

    fn run(&self, _ctx: &StageContext<'_>) -> anyhow::Result<()> {
        self.log.lock().unwrap().push(self.id);
        if self.fail {
            anyhow::bail!("mock step {} failed", self.id);
        }
        Ok(())
    }
}

fn mock_pipeline(count: usize, failing: Option<usize>, log: &RunLog) -> Pipeline {
    Pipeline::with_steps(
        (1..=count)
            .map(|id| {
                Box::new(MockStep {
                    id,
                    fail: failing == Some(id),
                    log: Arc::clone(log),
                }) as Box<dyn BuildStep>
            })
            .collect(),
    )
}

#[test]
fn halts_on_first_failure_for_every_position() {
    let temp = tempfile::tempdir().unwrap();
    let config = test_config(&temp);
    let executor = RecordingExecutor::default();
    let ctx = StageContext::new(&config, &executor, &ChrootIsolation);

    for k in 1..=10 {
        let log: RunLog = Arc::default();
        let mut reporter = Reporter::new(Vec::new());

        let failure = mock_pipeline(10, Some(k), &log)
            .run(&ctx, &mut reporter)
            .unwrap_err();

        assert_eq!(failure.step, k);
        assert_eq!(failure.total, 10);
        assert_eq!(failure.name, format!("mock step {}", k));
        assert_eq!(*log.lock().unwrap(), (1..=k).collect::<Vec<_>>());

        let output = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(output.lines().count(), k, "one progress line per started step");
    }
}

#[test]
fn runs_all_steps_in_order_with_progress() {
    let temp = tempfile::tempdir().unwrap();
    let config = test_config(&temp);
    let executor = RecordingExecutor::default();
    let ctx = StageContext::new(&config, &executor, &ChrootIsolation);
    let log: RunLog = Arc::default();
    let mut reporter = Reporter::new(Vec::new());

    mock_pipeline(4, None, &log).run(&ctx, &mut reporter).unwrap();

    assert_eq!(*log.lock().unwrap(), vec![1, 2, 3, 4]);
    let output = String::from_utf8(reporter.into_inner()).unwrap();
    assert_eq!(
        output,
        "[1/4] 25% mock step 1\n[2/4] 50% mock step 2\n[3/4] 75% mock step 3\n[4/4] 100% mock step 4\n"
    );
}

#[test]
fn missing_bootstrap_tool_stops_at_stage_two() {
    let temp = tempfile::tempdir().unwrap();
    let config = test_config(&temp);
    populate_boot(config.paths.chroot(), &["5.15.0"]);
    let executor = RecordingExecutor::missing_tool("mmdebstrap");
    let ctx = StageContext::new(&config, &executor, &ChrootIsolation);
    let mut reporter = Reporter::new(Vec::new());

    let failure = Pipeline::standard().run(&ctx, &mut reporter).unwrap_err();

    assert_eq!(failure.step, 2);
    assert_eq!(failure.name, Stage::BaseSystem.to_string());
    assert!(matches!(
        failure.error.downcast_ref::<BuilderError>(),
        Some(BuilderError::ToolMissing { tool, .. }) if tool == "mmdebstrap"
    ));
    assert!(executor.calls().is_empty(), "no command may run after the failed check");
    assert!(
        !config.paths.script_dir().join("setup-grub.sh").exists(),
        "stage 3 must not run"
    );
}

#[test]
fn failing_squashfs_stops_before_boot_structure() {
    let temp = tempfile::tempdir().unwrap();
    let config = test_config(&temp);
    populate_boot(config.paths.chroot(), &["5.15.0"]);
    let executor = RecordingExecutor::failing_on("mksquashfs");
    let ctx = StageContext::new(&config, &executor, &ChrootIsolation);
    let mut reporter = Reporter::new(Vec::new());

    let failure = Pipeline::standard().run(&ctx, &mut reporter).unwrap_err();

    assert_eq!(failure.step, 7);
    assert_eq!(executor.programs().last().map(String::as_str), Some("mksquashfs"));
    assert!(!config.paths.iso().join("boot").exists());
}

#[test]
fn spawn_failure_in_bootstrap_is_an_execution_error() {
    let temp = tempfile::tempdir().unwrap();
    let config = test_config(&temp);
    let executor = FailingExecutor::default();
    let ctx = StageContext::new(&config, &executor, &ChrootIsolation);
    let mut reporter = Reporter::new(Vec::new());

    let failure = Pipeline::standard().run(&ctx, &mut reporter).unwrap_err();

    assert_eq!(failure.step, 2);
    assert!(matches!(
        failure.error.downcast_ref::<BuilderError>(),
        Some(BuilderError::Execution { command, .. }) if command.starts_with("mmdebstrap ")
    ));
    assert_eq!(executor.calls.lock().unwrap().len(), 1);
}
