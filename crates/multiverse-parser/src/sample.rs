//! Sampled option lists.
//!
//! A decision may declare its options as a sampling descriptor instead of a
//! literal list:
//!
//! ```json
//! {"sample": "normal", "count": 5, "mean": 0, "std": 1, "seed": 7}
//! ```
//!
//! The descriptor is expanded once, at parse time, into `count` concrete
//! values. The same seed always yields the same values.

use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, LogNormal, Normal, Uniform};
use serde::Deserialize;
use serde_json::Value;

use multiverse_core::value::OptionValue;

use crate::error::{Diagnostic, ErrorCode, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SampleSpec {
    sample: String,
    count: Option<usize>,
    min: Option<f64>,
    max: Option<f64>,
    mean: Option<f64>,
    std: Option<f64>,
    seed: Option<u64>,
}

/// A continuous distribution with validated parameters.
#[derive(Debug, Clone)]
enum Sampler {
    Uniform(Uniform<f64>),
    Normal(Normal<f64>),
    LogNormal(LogNormal<f64>),
}

impl Sampler {
    fn draw(&self, rng: &mut StdRng) -> f64 {
        match self {
            Sampler::Uniform(dist) => dist.sample(rng),
            Sampler::Normal(dist) => dist.sample(rng),
            Sampler::LogNormal(dist) => dist.sample(rng),
        }
    }
}

fn invalid(var: &str, message: impl std::fmt::Display) -> Diagnostic {
    Diagnostic::error(format!("decision `{var}`: {message}")).with_code(ErrorCode::E500)
}

fn require(var: &str, family: &str, field: &str, value: Option<f64>) -> Result<f64> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(_) => Err(invalid(var, format!("`{field}` must be a finite number"))),
        None => Err(invalid(var, format!("{family} sampling requires `{field}`"))
            .with_help(help_for(family))),
    }
}

fn help_for(family: &str) -> &'static str {
    match family {
        "uniform" => r#"for example {"sample": "uniform", "count": 5, "min": 0, "max": 1}"#,
        _ => r#"for example {"sample": "normal", "count": 5, "mean": 0, "std": 1}"#,
    }
}

fn sampler(var: &str, spec: &SampleSpec) -> Result<Sampler> {
    let family = spec.sample.as_str();
    match family {
        "uniform" => {
            if spec.mean.is_some() || spec.std.is_some() {
                return Err(invalid(var, "uniform sampling takes `min` and `max`")
                    .with_help(help_for(family)));
            }
            let min = require(var, family, "min", spec.min)?;
            let max = require(var, family, "max", spec.max)?;
            if min > max {
                return Err(invalid(var, format!("`min` ({min}) is greater than `max` ({max})")));
            }
            Uniform::new_inclusive(min, max)
                .map(Sampler::Uniform)
                .map_err(|err| invalid(var, err))
        }
        "normal" | "lognormal" => {
            if spec.min.is_some() || spec.max.is_some() {
                return Err(invalid(var, format!("{family} sampling takes `mean` and `std`"))
                    .with_help(help_for(family)));
            }
            let mean = require(var, family, "mean", spec.mean)?;
            let std = require(var, family, "std", spec.std)?;
            if std < 0.0 {
                return Err(invalid(var, "`std` must not be negative"));
            }
            if family == "normal" {
                Normal::new(mean, std)
                    .map(Sampler::Normal)
                    .map_err(|err| invalid(var, err))
            } else {
                LogNormal::new(mean, std)
                    .map(Sampler::LogNormal)
                    .map_err(|err| invalid(var, err))
            }
        }
        other => Err(Diagnostic::error(format!(
            "decision `{var}`: unknown distribution `{other}`"
        ))
        .with_code(ErrorCode::E501)
        .with_help("supported distributions are `uniform`, `normal` and `lognormal`")),
    }
}

/// Expand a sampling descriptor into concrete options.
///
/// `default_seed` is used when the descriptor has no `seed` of its own.
pub(crate) fn sample_options(
    var: &str,
    descriptor: Value,
    default_seed: u64,
) -> Result<Vec<OptionValue>> {
    let spec: SampleSpec = serde_json::from_value(descriptor)
        .map_err(|err| invalid(var, format!("invalid sampling descriptor: {err}")))?;
    let sampler = sampler(var, &spec)?;
    let count = match spec.count {
        Some(count) if count > 0 => count,
        Some(_) => return Err(invalid(var, "`count` must be at least 1")),
        None => {
            return Err(invalid(var, "sampling requires `count`").with_help(help_for(&spec.sample)));
        }
    };

    let mut rng = StdRng::seed_from_u64(spec.seed.unwrap_or(default_seed));
    Ok((0..count)
        .map(|_| OptionValue::from_f64(sampler.draw(&mut rng)))
        .collect())
}
