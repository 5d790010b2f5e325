use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{Error, Objective, OptimizationOutcome, Optimizer, Result, TrialRecord};
use ltr_domain::{Domain, ParamValue, Params, SearchSpace};

/// Seeded random sampling over a [`SearchSpace`]. Evaluates exactly `trials`
/// configurations; the earliest of equally good trials wins.
#[derive(Debug)]
pub struct RandomSearch {
	rng: StdRng,
}
impl RandomSearch {
	pub fn new(seed: u64) -> Self {
		Self { rng: StdRng::seed_from_u64(seed) }
	}

	fn sample(&mut self, space: &SearchSpace) -> Params {
		space
			.dimensions()
			.iter()
			.map(|dimension| (dimension.name.clone(), self.sample_domain(&dimension.domain)))
			.collect()
	}

	fn sample_domain(&mut self, domain: &Domain) -> ParamValue {
		match domain {
			Domain::Integer { low, high } => ParamValue::Integer(self.rng.gen_range(*low..=*high)),
			Domain::Real { low, high, log_scale: true } => {
				let sampled = self.rng.gen_range(low.ln()..=high.ln()).exp();

				ParamValue::Real(sampled.clamp(*low, *high))
			},
			Domain::Real { low, high, log_scale: false } =>
				ParamValue::Real(self.rng.gen_range(*low..=*high)),
			Domain::Categorical(values) =>
				ParamValue::Categorical(values[self.rng.gen_range(0..values.len())].clone()),
		}
	}
}
impl Optimizer for RandomSearch {
	fn minimize(
		&mut self,
		objective: &mut Objective<'_>,
		space: &SearchSpace,
		trials: usize,
	) -> Result<OptimizationOutcome> {
		if trials == 0 {
			return Err(Error::Optimizer { message: "trials must be greater than zero.".to_string() });
		}
		if space.is_empty() {
			return Err(Error::Optimizer { message: "Search space is empty.".to_string() });
		}

		for dimension in space.dimensions() {
			if let Some(message) = invalid_domain(&dimension.domain) {
				return Err(Error::Optimizer { message: format!("{}: {message}", dimension.name) });
			}
		}

		let mut history: Vec<TrialRecord> = Vec::with_capacity(trials);
		let mut best: Option<usize> = None;

		for trial in 0..trials {
			let params = self.sample(space);
			let value = objective(&params)?;

			tracing::debug!(trial, value, ?params, "Random search trial evaluated.");

			let improves = match best {
				None => !value.is_nan(),
				Some(index) => value < history[index].value,
			};

			if improves {
				best = Some(trial);
			}

			history.push(TrialRecord { params, value });
		}

		let index = best.unwrap_or(0);
		let best_trial = &history[index];

		Ok(OptimizationOutcome {
			best_value: best_trial.value,
			best_params: best_trial.params.clone(),
			history,
		})
	}
}

fn invalid_domain(domain: &Domain) -> Option<&'static str> {
	match domain {
		Domain::Integer { low, high } if low > high => Some("low exceeds high."),
		Domain::Real { low, high, .. } if !(low.is_finite() && high.is_finite()) =>
			Some("bounds must be finite."),
		Domain::Real { low, high, .. } if low > high => Some("low exceeds high."),
		Domain::Real { low, log_scale: true, .. } if *low <= 0.0 =>
			Some("log-scaled bounds must be positive."),
		Domain::Categorical(values) if values.is_empty() => Some("no categorical values."),
		_ => None,
	}
}
