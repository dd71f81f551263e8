//! Runs a legalizer over a placement, recording a snapshot after every committed step.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use mlegal_common::PlacementModel;
use tracing::info_span;

use crate::{
    config::{Config, Strategy},
    error::LegalizeError,
    history::IterationHistory,
    legalizer::{ForceRelaxationLegalizer, Legalizer, SequentialLegalizer},
};

/// How a run that did not fail came to an end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    /// A stop was requested; `steps` steps had been committed by then.
    Stopped { steps: usize },
}

/// Run `legalizer` for its full schedule, or until `stop` is raised. The flag is only looked at
/// between steps. A failed step aborts the run; `model` and `history` are left at the last
/// committed step either way.
pub fn run<L: Legalizer + ?Sized>(
    legalizer: &L,
    model: &mut PlacementModel,
    history: &mut IterationHistory,
    stop: &AtomicBool,
) -> Result<RunStatus> {
    if model.is_empty() {
        return Err(LegalizeError::EmptyPlacement).context("Nothing to legalize");
    }

    let steps = legalizer.schedule_len(model);
    let _span = info_span!("legalize_run", steps).entered();

    for iteration in 0..steps {
        if stop.load(Ordering::SeqCst) {
            log::warn!("Stopping after {} of {} steps", iteration, steps);
            return Ok(RunStatus::Stopped { steps: iteration });
        }

        let report = legalizer
            .step(model, iteration)
            .with_context(|| format!("Legalization step {} of {}", iteration, steps))?;
        history.record(model);

        log::info!(
            "Step {}/{}: moved {} macros",
            iteration + 1,
            steps,
            report.moved
        );
    }

    Ok(RunStatus::Completed)
}

/// Build the legalizer `config` asks for and run it over `model`. `history` must start from
/// `model` as it is on entry; the force strategy's springs pull toward that first snapshot.
pub fn legalize(
    config: &Config,
    model: &mut PlacementModel,
    history: &mut IterationHistory,
    stop: &AtomicBool,
) -> Result<RunStatus> {
    let legalizer: Box<dyn Legalizer> = match config.strategy {
        Strategy::Sequential => Box::new(SequentialLegalizer::new(config.geometry)),
        Strategy::Force(params) => Box::new(ForceRelaxationLegalizer::new(
            config.geometry,
            params,
            history.original().clone(),
        )),
    };

    run(legalizer.as_ref(), model, history, stop)
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use super::*;
    use crate::{
        config::{ForceConfig, IOConfig},
        test_util::{pos, square_geometry},
    };

    fn config(strategy: Strategy) -> Config {
        Config {
            io: IOConfig {
                input_file: PathBuf::from("in.def"),
                output_file: PathBuf::from("out.json"),
                history_file: None,
                stats_file: None,
            },
            geometry: square_geometry(100, 0),
            strategy,
        }
    }

    #[test]
    fn sequential_run_records_one_snapshot_per_macro() -> Result<()> {
        let _ = tracing_subscriber::fmt::try_init();

        let mut model = placement![
            die: (0, 0)..(1000, 1000),
            macros: [
                a => (0, 0);
                b => (50, 0);
                c => (60, 30);
            ]
        ];

        let mut history = IterationHistory::new(&model);
        let status = legalize(
            &config(Strategy::Sequential),
            &mut model,
            &mut history,
            &AtomicBool::new(false),
        )?;

        assert_eq!(status, RunStatus::Completed);
        assert_eq!(history.len(), 4);
        assert_eq!(history.original().position_of("b").map(|p| p.x), Some(50));
        assert_eq!(history.latest().model(), &model);
        assert_eq!(pos(&model, "c"), (100, 100));

        // Every processed macro stays highlighted
        let highlighted = history
            .iter()
            .skip(1)
            .map(|s| {
                s.model()
                    .iter()
                    .filter(|m| m.highlighted)
                    .map(|m| m.id.clone())
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        assert_eq!(
            highlighted,
            vec![vec!["a"], vec!["a", "b"], vec!["a", "b", "c"]]
        );

        Ok(())
    }

    #[test]
    fn force_run_uses_configured_iteration_count() -> Result<()> {
        let mut model = placement![
            die: (-1000, -1000)..(1000, 1000),
            macros: [
                a => (0, 0);
                b => (50, 0);
            ]
        ];

        let mut history = IterationHistory::new(&model);
        legalize(
            &config(Strategy::Force(ForceConfig {
                overlap_force: 0.5,
                spring_force: 0.0,
                iterations: 3,
            })),
            &mut model,
            &mut history,
            &AtomicBool::new(false),
        )?;

        assert_eq!(history.len(), 4);
        assert_eq!(pos(&model, "a"), (-25, 0));
        assert_eq!(pos(&model, "b"), (75, 0));

        Ok(())
    }

    #[test]
    fn sequential_run_on_empty_placement_fails() {
        let mut model = placement![
            die: (0, 0)..(1000, 1000),
            macros: []
        ];

        let mut history = IterationHistory::new(&model);
        let err = legalize(
            &config(Strategy::Sequential),
            &mut model,
            &mut history,
            &AtomicBool::new(false),
        )
        .expect_err("Run unexpectedly succeeded");

        assert!(err
            .chain()
            .any(|e| matches!(e.downcast_ref(), Some(LegalizeError::EmptyPlacement))));
    }

    /// Asks for one more step than the sequential schedule has ranks.
    struct Overrun(SequentialLegalizer);

    impl Legalizer for Overrun {
        fn step(
            &self,
            model: &mut PlacementModel,
            iteration: usize,
        ) -> Result<crate::legalizer::StepReport, LegalizeError> {
            self.0.step(model, iteration)
        }

        fn schedule_len(&self, model: &PlacementModel) -> usize {
            model.len() + 1
        }
    }

    #[test]
    fn failed_step_keeps_last_committed_state() {
        let mut model = placement![
            die: (0, 0)..(1000, 1000),
            macros: [
                a => (0, 0);
                b => (50, 0);
            ]
        ];
        let mut history = IterationHistory::new(&model);

        let err = run(
            &Overrun(SequentialLegalizer::new(square_geometry(100, 0))),
            &mut model,
            &mut history,
            &AtomicBool::new(false),
        )
        .expect_err("Run unexpectedly succeeded");

        assert!(err.chain().any(|e| matches!(
            e.downcast_ref(),
            Some(LegalizeError::IterationOutOfRange {
                iteration: 2,
                macro_count: 2
            })
        )));
        assert_eq!(history.len(), 3);
        assert_eq!(history.latest().model(), &model);
        assert_eq!(pos(&model, "b"), (100, 0));
    }

    #[test]
    fn raised_stop_flag_ends_run_before_first_step() -> Result<()> {
        let mut model = placement![
            die: (0, 0)..(1000, 1000),
            macros: [
                a => (0, 0);
                b => (50, 0);
            ]
        ];
        let before = model.clone();
        let mut history = IterationHistory::new(&model);

        let status = legalize(
            &config(Strategy::Sequential),
            &mut model,
            &mut history,
            &AtomicBool::new(true),
        )?;

        assert_eq!(status, RunStatus::Stopped { steps: 0 });
        assert_eq!(history.len(), 1);
        assert_eq!(model, before);

        Ok(())
    }

    /// Raises the stop flag once the given step has been committed.
    struct StopAfter<'a> {
        inner: SequentialLegalizer,
        stop: &'a AtomicBool,
        after: usize,
    }

    impl<'a> Legalizer for StopAfter<'a> {
        fn step(
            &self,
            model: &mut PlacementModel,
            iteration: usize,
        ) -> Result<crate::legalizer::StepReport, LegalizeError> {
            let report = self.inner.step(model, iteration)?;
            if iteration == self.after {
                self.stop.store(true, Ordering::SeqCst);
            }
            Ok(report)
        }

        fn schedule_len(&self, model: &PlacementModel) -> usize {
            self.inner.schedule_len(model)
        }
    }

    #[test]
    fn stop_between_steps_keeps_committed_history() -> Result<()> {
        let mut model = placement![
            die: (0, 0)..(1000, 1000),
            macros: [
                a => (0, 0);
                b => (50, 0);
                c => (60, 30);
            ]
        ];
        let mut history = IterationHistory::new(&model);
        let stop = AtomicBool::new(false);

        let status = run(
            &StopAfter {
                inner: SequentialLegalizer::new(square_geometry(100, 0)),
                stop: &stop,
                after: 0,
            },
            &mut model,
            &mut history,
            &stop,
        )?;

        assert_eq!(status, RunStatus::Stopped { steps: 1 });
        assert_eq!(history.len(), 2);
        assert_eq!(history.latest().model(), &model);
        assert_eq!(pos(&model, "b"), (100, 0));
        assert_eq!(pos(&model, "c"), (100, 30));

        Ok(())
    }
}
