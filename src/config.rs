//! Runtime tunables.
//!
//! Each setting is read once from its environment variable and can be
//! overridden at runtime with the matching setter. Passing `0` to a setter
//! removes the override, falling back to the environment value or the
//! built-in default.
//!
//! | Setting                     | Environment variable             | Default |
//! |-----------------------------|----------------------------------|---------|
//! | convolution block target    | `SPECFRAME_CONV_BLOCK_TARGET`    | 1024    |
//! | Lanczos half-width          | `SPECFRAME_LANCZOS_HALF_WIDTH`   | 10      |
//! | parallel STFT minimum frames| `SPECFRAME_PAR_STFT_MIN_FRAMES`  | 64      |

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use log::warn;

pub const DEFAULT_CONVOLUTION_BLOCK_TARGET: usize = 1024;
pub const DEFAULT_LANCZOS_HALF_WIDTH: usize = 10;
pub const DEFAULT_PARALLEL_STFT_MIN_FRAMES: usize = 64;

static CONVOLUTION_BLOCK_TARGET_OVERRIDE: AtomicUsize = AtomicUsize::new(0);
static LANCZOS_HALF_WIDTH_OVERRIDE: AtomicUsize = AtomicUsize::new(0);
static PARALLEL_STFT_MIN_FRAMES_OVERRIDE: AtomicUsize = AtomicUsize::new(0);

static ENV: OnceLock<EnvConfig> = OnceLock::new();

struct EnvConfig {
    convolution_block_target: usize,
    lanczos_half_width: usize,
    parallel_stft_min_frames: usize,
}

fn env_config() -> &'static EnvConfig {
    ENV.get_or_init(|| EnvConfig {
        convolution_block_target: env_usize(
            "SPECFRAME_CONV_BLOCK_TARGET",
            DEFAULT_CONVOLUTION_BLOCK_TARGET,
        ),
        lanczos_half_width: env_usize("SPECFRAME_LANCZOS_HALF_WIDTH", DEFAULT_LANCZOS_HALF_WIDTH),
        parallel_stft_min_frames: env_usize(
            "SPECFRAME_PAR_STFT_MIN_FRAMES",
            DEFAULT_PARALLEL_STFT_MIN_FRAMES,
        ),
    })
}

/// Positive integer from `name`, or `default` when unset or unusable.
fn env_usize(name: &str, default: usize) -> usize {
    match std::env::var(name) {
        Ok(raw) => parse_positive(&raw).unwrap_or_else(|| {
            warn!("ignoring {name}={raw:?}: expected a positive integer, using {default}");
            default
        }),
        Err(_) => default,
    }
}

fn parse_positive(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|&v| v > 0)
}

fn resolve(over: &AtomicUsize, env: usize) -> usize {
    match over.load(Ordering::Relaxed) {
        0 => env,
        v => v,
    }
}

/// Upper bound the convolution FFT length grows towards for long signals.
pub fn convolution_block_target() -> usize {
    resolve(
        &CONVOLUTION_BLOCK_TARGET_OVERRIDE,
        env_config().convolution_block_target,
    )
}

pub fn set_convolution_block_target(samples: usize) {
    CONVOLUTION_BLOCK_TARGET_OVERRIDE.store(samples, Ordering::Relaxed);
}

/// Lanczos half-width used by [`crate::resample::resample`].
pub fn lanczos_half_width() -> usize {
    resolve(&LANCZOS_HALF_WIDTH_OVERRIDE, env_config().lanczos_half_width)
}

pub fn set_lanczos_half_width(a: usize) {
    LANCZOS_HALF_WIDTH_OVERRIDE.store(a, Ordering::Relaxed);
}

/// Frame count below which the parallel STFT variants run serially.
pub fn parallel_stft_min_frames() -> usize {
    resolve(
        &PARALLEL_STFT_MIN_FRAMES_OVERRIDE,
        env_config().parallel_stft_min_frames,
    )
}

/// Passing `1` parallelizes every request.
pub fn set_parallel_stft_min_frames(frames: usize) {
    PARALLEL_STFT_MIN_FRAMES_OVERRIDE.store(frames, Ordering::Relaxed);
}
