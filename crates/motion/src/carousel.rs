use serde::{Deserialize, Serialize};

/// Time each slide owns, including its outgoing fade.
pub const DEFAULT_CYCLE_MS: f64 = 4000.0;
/// Length of the crossfade at the end of every cycle.
pub const DEFAULT_FADE_MS: f64 = 1000.0;

/// Errors from carousel construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CarouselError {
    #[error("a carousel needs at least one slide")]
    NoSlides,
    #[error("fade of {fade_ms} ms must be positive and fit in the {cycle_ms} ms cycle")]
    InvalidTiming { cycle_ms: f64, fade_ms: f64 },
}

/// Ordered, cyclic list of texture identifiers. Fixed once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct SlideDescriptor {
    sources: Vec<String>,
}

impl SlideDescriptor {
    pub fn new<I, S>(sources: I) -> Result<Self, CarouselError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sources: Vec<String> = sources.into_iter().map(Into::into).collect();
        if sources.is_empty() {
            return Err(CarouselError::NoSlides);
        }
        Ok(Self { sources })
    }

    /// The five app screenshots shown on the landing page.
    pub fn landing_defaults() -> Self {
        Self {
            sources: (1..=5)
                .map(|i| format!("/assets/mobile_ui_{i}.png"))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.sources.get(index).map(String::as_str)
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }
}

impl Default for SlideDescriptor {
    fn default() -> Self {
        Self::landing_defaults()
    }
}

impl TryFrom<Vec<String>> for SlideDescriptor {
    type Error = CarouselError;

    fn try_from(sources: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(sources)
    }
}

impl From<SlideDescriptor> for Vec<String> {
    fn from(slides: SlideDescriptor) -> Self {
        slides.sources
    }
}

/// Which slides are visible at one instant, and how far the fade has run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarouselState {
    pub current_index: usize,
    pub next_index: usize,
    /// 0 while the current slide holds, rising to 1 at the end of the cycle.
    pub fade_progress: f64,
}

impl CarouselState {
    pub fn is_fading(&self) -> bool {
        self.fade_progress > 0.0
    }
}

/// Crossfading slideshow driven only by absolute elapsed time.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideCarousel {
    slides: SlideDescriptor,
    cycle_ms: f64,
    fade_ms: f64,
}

impl SlideCarousel {
    pub fn new(slides: SlideDescriptor) -> Self {
        Self {
            slides,
            cycle_ms: DEFAULT_CYCLE_MS,
            fade_ms: DEFAULT_FADE_MS,
        }
    }

    pub fn with_timing(
        slides: SlideDescriptor,
        cycle_ms: f64,
        fade_ms: f64,
    ) -> Result<Self, CarouselError> {
        let valid = cycle_ms.is_finite()
            && fade_ms.is_finite()
            && fade_ms > 0.0
            && fade_ms <= cycle_ms;
        if !valid {
            return Err(CarouselError::InvalidTiming { cycle_ms, fade_ms });
        }
        Ok(Self {
            slides,
            cycle_ms,
            fade_ms,
        })
    }

    pub fn slides(&self) -> &SlideDescriptor {
        &self.slides
    }

    pub fn cycle_ms(&self) -> f64 {
        self.cycle_ms
    }

    pub fn fade_ms(&self) -> f64 {
        self.fade_ms
    }

    /// State at `now_ms`. Non-finite times sample as time zero.
    pub fn sample(&self, now_ms: f64) -> CarouselState {
        let now = if now_ms.is_finite() { now_ms } else { 0.0 };
        let n = self.slides.len() as i64;
        let cycle_index = (now / self.cycle_ms).floor() as i64;
        let current_index = cycle_index.rem_euclid(n) as usize;
        let next_index = (current_index + 1) % self.slides.len();

        let t = now.rem_euclid(self.cycle_ms);
        let fade_start = self.cycle_ms - self.fade_ms;
        let fade_progress = if t <= fade_start {
            0.0
        } else {
            ((t - fade_start) / self.fade_ms).clamp(0.0, 1.0)
        };

        CarouselState {
            current_index,
            next_index,
            fade_progress,
        }
    }

    /// Per-slide opacity for `state`, one entry per slide.
    pub fn opacities(&self, state: &CarouselState) -> Vec<f64> {
        let mut out = vec![0.0; self.slides.len()];
        if state.current_index == state.next_index {
            out[state.current_index] = 1.0;
        } else {
            out[state.current_index] = 1.0 - state.fade_progress;
            out[state.next_index] = state.fade_progress;
        }
        out
    }

    pub fn sample_opacities(&self, now_ms: f64) -> Vec<f64> {
        self.opacities(&self.sample(now_ms))
    }
}

/// Hide slides whose texture has not arrived yet. Slides missing from
/// `ready` count as not ready.
pub fn apply_readiness(opacities: &mut [f64], ready: &[bool]) {
    for (i, opacity) in opacities.iter_mut().enumerate() {
        if !ready.get(i).copied().unwrap_or(false) {
            *opacity = 0.0;
        }
    }
}
