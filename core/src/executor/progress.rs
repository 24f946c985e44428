use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use super::types::StepId;

/// Bar for the wave currently running; replaced when the next wave starts.
struct WaveBar {
    index: usize,
    bar: ProgressBar,
    failed: usize,
}

/// Terminal progress for a run: a bar over all steps and, beneath it, one
/// bar per wave that fills as that wave's steps report back.
///
/// Finished wave bars stay on screen, so the display doubles as a record of
/// how the plan was layered.
pub struct ProgressMonitor {
    multi: MultiProgress,
    overall: ProgressBar,
    wave: Option<WaveBar>,
    enabled: bool,
}

impl ProgressMonitor {
    pub fn new(total_steps: usize, enabled: bool) -> Self {
        if !enabled {
            return Self {
                multi: MultiProgress::new(),
                overall: ProgressBar::hidden(),
                wave: None,
                enabled: false,
            };
        }

        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(total_steps as u64));
        if let Ok(style) =
            ProgressStyle::default_bar().template("{elapsed_precise} {bar:30.cyan/blue} {pos}/{len} steps {msg}")
        {
            overall.set_style(style.progress_chars("=> "));
        }
        overall.enable_steady_tick(Duration::from_millis(200));

        Self {
            multi,
            overall,
            wave: None,
            enabled: true,
        }
    }

    pub fn start_wave(&mut self, index: usize, step_ids: &[StepId]) {
        if !self.enabled {
            return;
        }
        self.close_wave();

        let bar = self.multi.add(ProgressBar::new(step_ids.len() as u64));
        if let Ok(style) = ProgressStyle::default_bar().template("  {prefix} {bar:20.green} {pos}/{len} {msg}") {
            bar.set_style(style.progress_chars("#-"));
        }
        bar.set_prefix(format!("wave {}", index + 1));
        bar.set_message(format!("steps {}", join_ids(step_ids)));
        self.overall.set_message(format!("(wave {})", index + 1));

        self.wave = Some(WaveBar {
            index,
            bar,
            failed: 0,
        });
    }

    pub fn step_done(&mut self, step_id: StepId, success: bool, duration_ms: u64) {
        if !self.enabled {
            return;
        }
        self.overall.inc(1);

        if let Some(wave) = self.wave.as_mut() {
            if !success {
                wave.failed += 1;
            }
            wave.bar.inc(1);
            let mark = if success { "ok" } else { "failed" };
            wave.bar
                .set_message(format!("step {step_id} {mark} ({duration_ms}ms)"));
        }
    }

    pub fn finish(&mut self, deadlocked: bool, failed: usize) {
        if !self.enabled {
            return;
        }
        self.close_wave();

        let msg = if deadlocked {
            "stopped: unreachable steps remain".to_string()
        } else if failed > 0 {
            format!("done, {failed} step(s) failed")
        } else {
            "done".to_string()
        };
        self.overall.finish_with_message(msg);
    }

    fn close_wave(&mut self) {
        if let Some(wave) = self.wave.take() {
            let summary = match wave.failed {
                0 => "all ok".to_string(),
                n => format!("{n} failed"),
            };
            wave.bar
                .finish_with_message(format!("{summary} (wave {})", wave.index + 1));
        }
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        if let Some(wave) = self.wave.take() {
            wave.bar.finish_and_clear();
        }
    }
}

fn join_ids(ids: &[StepId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_monitor_ignores_calls() {
        let mut monitor = ProgressMonitor::new(3, false);
        monitor.start_wave(0, &[1, 2]);
        monitor.step_done(1, true, 10);
        monitor.finish(false, 0);
        assert!(monitor.wave.is_none());
    }

    #[test]
    fn test_wave_bar_counts_failures_and_rolls_over() {
        let mut monitor = ProgressMonitor::new(3, true);

        monitor.start_wave(0, &[1, 2]);
        monitor.step_done(1, true, 5);
        monitor.step_done(2, false, 7);
        let wave = monitor.wave.as_ref().unwrap();
        assert_eq!(wave.failed, 1);
        assert_eq!(wave.bar.position(), 2);

        monitor.start_wave(1, &[3]);
        assert_eq!(monitor.wave.as_ref().unwrap().index, 1);
        assert_eq!(monitor.wave.as_ref().unwrap().failed, 0);

        monitor.step_done(3, true, 1);
        assert_eq!(monitor.overall.position(), 3);

        monitor.finish(false, 1);
        assert!(monitor.wave.is_none());
    }

    #[test]
    fn test_join_ids() {
        assert_eq!(join_ids(&[1, 2, 10]), "1,2,10");
        assert_eq!(join_ids(&[]), "");
    }
}
