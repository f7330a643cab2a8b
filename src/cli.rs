//! Definition of command line arguments

pub use clap::Parser;

pub use clap_verbosity_flag::Verbosity;

use crate::{context::Sampling, scenes::SceneType};

/// Argument definitions for [clap::Parser]
#[derive(Parser, Debug)]
#[clap(version, about)]
pub struct Arguments {
    /// The hardcoded scene to use
    #[clap(short, long, value_enum, default_value_t = SceneType::Slide)]
    pub scene: SceneType,

    /// Number of frames to evaluate
    #[clap(
        short,
        long,
        value_parser = valid_count::<u32>,
        default_value_t = 1,
        value_name = "NUM"
    )]
    pub frames: u32,

    /// Number of the first frame
    #[clap(long, default_value_t = 0, value_name = "NUM")]
    pub first_frame: u32,

    /// samples per pixel
    ///
    /// Also the number of strata the shutter interval is split into when
    /// bounding moving objects
    #[clap(
        short = 'n',
        long = "samples",
        value_parser = valid_count::<u32>,
        default_value_t = 4,
        value_name = "NUM"
    )]
    pub samples: u32,

    /// How long the shutter stays open in each frame
    #[clap(long, value_parser = non_negative, default_value_t = 1.0, value_name = "TIME")]
    pub shutter: f32,

    /// Time at which the shutter of frame 0 opens
    #[clap(long, default_value_t = 0.0, value_name = "TIME")]
    pub start_time: f32,

    /// Time between the shutter openings of consecutive frames
    #[clap(long, value_parser = non_negative, default_value_t = 1.0, value_name = "TIME")]
    pub frame_length: f32,

    /// Rays per side of the probe grid
    #[clap(
        short,
        long,
        value_parser = valid_count::<u32>,
        default_value_t = 64,
        value_name = "NUM"
    )]
    pub grid: u32,

    /// An image to map onto the scene's main object
    #[clap(short, long, value_name = "FILE")]
    pub texture: Option<std::path::PathBuf>,

    /// The seed used for psuedorandom number generation
    #[clap(long)]
    pub seed: Option<u64>,

    #[clap(flatten)]
    pub verbosity: self::Verbosity,
}

impl Arguments {
    pub fn sampling(&self) -> Sampling {
        Sampling {
            total_samples: self.samples,
            shutter: self.shutter,
            start_time: self.start_time,
            frame_length: self.frame_length,
        }
    }
}

/// Checks whether the given integer value is greater than 0
fn valid_count<T>(s: &str) -> Result<T, String>
where
    T: num_traits::PrimInt + std::str::FromStr,
    <T as std::str::FromStr>::Err: std::fmt::Display,
{
    match s.parse::<T>() {
        Ok(count) => {
            if count > T::zero() {
                Ok(count)
            } else {
                Err("count must be greater than 0".to_string())
            }
        }
        Err(e) => Err(e.to_string()),
    }
}

/// Checks whether the given duration is finite and not negative
fn non_negative(s: &str) -> Result<f32, String> {
    match s.parse::<f32>() {
        Ok(time) if time.is_finite() && time >= 0.0 => Ok(time),
        Ok(_) => Err("duration must be a finite, non-negative number".to_string()),
        Err(e) => Err(e.to_string()),
    }
}
