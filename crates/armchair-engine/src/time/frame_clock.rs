use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick (clamped).
    pub dt: f32,

    /// Exponentially smoothed `dt`, for display.
    pub smoothed_dt: f32,

    pub frame_index: u64,
}

impl FrameTime {
    pub fn fps(&self) -> f32 {
        if self.smoothed_dt > 0.0 {
            1.0 / self.smoothed_dt
        } else {
            0.0
        }
    }
}

/// Produces `FrameTime` snapshots with a clamped delta.
///
/// The clamp keeps a debugger pause or minimized window from showing up as one
/// enormous frame.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    smoothed_dt: Option<f32>,
    dt_max: Duration,
}

/// Weight of the newest sample in the smoothed delta.
const SMOOTHING: f32 = 0.1;

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            frame_index: 0,
            smoothed_dt: None,
            dt_max: Duration::from_millis(250),
        }
    }

    /// Restarts timing, e.g. after the renderer comes up.
    pub fn reset(&mut self) {
        self.last = Instant::now();
        self.smoothed_dt = None;
    }

    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last);
        self.last = now;
        self.advance(dt)
    }

    fn advance(&mut self, dt: Duration) -> FrameTime {
        let dt = dt.min(self.dt_max).as_secs_f32();
        let smoothed = match self.smoothed_dt {
            Some(prev) => prev + (dt - prev) * SMOOTHING,
            None => dt,
        };
        self.smoothed_dt = Some(smoothed);

        let ft = FrameTime {
            dt,
            smoothed_dt: smoothed,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
