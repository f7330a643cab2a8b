//! Time and frame cursors shared by expression evaluation and bounding.
//!
//! The setup phase owns a [SceneContext] and is the only code able to move the
//! cursors. Tracing code only ever sees a copied [EvaluationContext].

use rand::{rngs::SmallRng, Rng};

/// Read-only snapshot of the animation cursors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationContext {
    pub time: f32,
    pub frame: u32,
}

impl EvaluationContext {
    pub fn new(time: f32, frame: u32) -> Self {
        Self { time, frame }
    }

    /// The same frame, looked at a different instant (e.g. a ray's time).
    pub fn at_time(self, time: f32) -> Self {
        Self { time, ..self }
    }
}

/// Shutter and sample-count configuration of a render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    /// Samples taken per pixel, which is also the number of time strata.
    pub total_samples: u32,
    /// Length of the shutter interval.
    pub shutter: f32,
    /// Time at which the shutter of frame 0 opens.
    pub start_time: f32,
    /// Time between the shutter openings of consecutive frames.
    pub frame_length: f32,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            total_samples: 1,
            shutter: 0.0,
            start_time: 0.0,
            frame_length: 1.0,
        }
    }
}

impl Sampling {
    /// Time at which the shutter opens for `frame`.
    pub fn shutter_start(&self, frame: u32) -> f32 {
        self.start_time + frame as f32 * self.frame_length
    }
}

/// Mutable cursor state for the single-threaded setup phase.
#[derive(Debug, Clone)]
pub struct SceneContext {
    eval: EvaluationContext,
    sampling: Sampling,
    rng: SmallRng,
}

impl SceneContext {
    pub fn new(sampling: Sampling, rng: SmallRng) -> Self {
        Self {
            eval: EvaluationContext::new(sampling.shutter_start(0), 0),
            sampling,
            rng,
        }
    }

    /// Moves both cursors to the opening of `frame`'s shutter.
    pub fn begin_frame(&mut self, frame: u32) {
        self.eval = EvaluationContext::new(self.sampling.shutter_start(frame), frame);
    }

    pub fn set_time(&mut self, time: f32) {
        self.eval.time = time;
    }

    pub fn time(&self) -> f32 {
        self.eval.time
    }

    pub fn frame(&self) -> u32 {
        self.eval.frame
    }

    /// Opening time of the current frame's shutter.
    pub fn shutter_start(&self) -> f32 {
        self.sampling.shutter_start(self.eval.frame)
    }

    pub fn sampling(&self) -> &Sampling {
        &self.sampling
    }

    /// A copy of the cursors to hand to read-only consumers.
    pub fn eval(&self) -> EvaluationContext {
        self.eval
    }

    /// Uniform random number in `[0, 1)`.
    pub fn rand(&mut self) -> f32 {
        self.rng.gen()
    }
}
