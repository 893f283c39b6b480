use std::time::Duration;

pub struct FrameScheduler {
    frame_budget: Duration,
}

impl FrameScheduler {
    pub fn new(target_fps: u32) -> Self {
        let safe_fps = target_fps.max(1);
        let frame_budget = Duration::from_nanos(1_000_000_000u64 / safe_fps as u64);
        Self { frame_budget }
    }

    pub fn frame_budget(&self) -> Duration {
        self.frame_budget
    }

    /// Time left in the budget after a frame body that took `spent`. Never negative;
    /// overruns are not paid back on later frames.
    pub fn sleep_after(&self, spent: Duration) -> Duration {
        self.frame_budget.saturating_sub(spent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixty_fps_budget_is_16667_micros() {
        let scheduler = FrameScheduler::new(60);
        let micros = scheduler.frame_budget().as_secs_f64() * 1_000_000.0;
        assert!((micros - 16_667.0).abs() < 1.0);
    }

    #[test]
    fn short_frame_sleeps_for_the_remainder() {
        let scheduler = FrameScheduler::new(60);
        for spent in [0u64, 1, 4_000, 16_000, 16_666] {
            let sleep = scheduler.sleep_after(Duration::from_micros(spent));
            let expected = 16_667.0 - spent as f64;
            let got = sleep.as_secs_f64() * 1_000_000.0;
            assert!((got - expected).abs() <= 1.0, "spent={spent} got={got}");
        }
    }

    #[test]
    fn overrun_frame_does_not_sleep() {
        let scheduler = FrameScheduler::new(60);
        assert_eq!(scheduler.sleep_after(Duration::from_micros(16_667)), Duration::ZERO);
        assert_eq!(scheduler.sleep_after(Duration::from_millis(40)), Duration::ZERO);
    }

    #[test]
    fn zero_fps_is_treated_as_one() {
        assert_eq!(FrameScheduler::new(0).frame_budget(), Duration::from_secs(1));
    }
}
