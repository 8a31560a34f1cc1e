//! `pi`: estimates π via Monte Carlo sampling, partitioned across trials.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use rand::Rng;

use dda_core::{Computation, ComputeRequest, CoordinatorError, PartitionIter};

pub struct MonteCarloPi {
    hits: u64,
    samples: u64,
}

impl MonteCarloPi {
    pub fn new() -> Self {
        Self {
            hits: 0,
            samples: 0,
        }
    }
}

impl Default for MonteCarloPi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Computation for MonteCarloPi {
    fn name(&self) -> &str {
        "pi"
    }

    fn description(&self) -> &str {
        "estimates pi from the hit rate of random points inside a unit circle"
    }

    fn partition(&self, request: &ComputeRequest) -> Result<PartitionIter, CoordinatorError> {
        let total: u64 = request
            .args
            .first()
            .ok_or_else(|| {
                CoordinatorError::Argument("pi requires two arguments: total_samples partials".into())
            })?
            .parse()
            .map_err(|_| CoordinatorError::Argument("total_samples must be a positive integer".into()))?;

        let partials: u64 = request
            .args
            .get(1)
            .ok_or_else(|| {
                CoordinatorError::Argument("pi requires two arguments: total_samples partials".into())
            })?
            .parse()
            .map_err(|_| CoordinatorError::Argument("partials must be a positive integer".into()))?;

        if total == 0 || partials == 0 {
            return Err(CoordinatorError::Argument(
                "total_samples and partials must both be greater than zero".into(),
            ));
        }

        let base = total / partials;
        let remainder = total % partials;

        let shares: Vec<u64> = (0..partials)
            .map(|i| if i < remainder { base + 1 } else { base })
            .filter(|&n| n > 0)
            .collect();

        let inputs: Vec<Bytes> = shares.into_iter().map(|n| Bytes::from(n.to_string())).collect();
        Ok(Box::new(inputs.into_iter()))
    }

    async fn partial_compute(&self, input: Bytes) -> Option<Bytes> {
        let n: u64 = std::str::from_utf8(&input).ok().and_then(|s| s.parse().ok())?;

        let mut rng = rand::thread_rng();
        let mut hits: u64 = 0;
        for _ in 0..n {
            let x: f64 = rng.gen_range(-1.0..1.0);
            let y: f64 = rng.gen_range(-1.0..1.0);
            if x * x + y * y <= 1.0 {
                hits += 1;
            }
        }

        Some(Bytes::from(format!("{hits}/{n}")))
    }

    fn partial_compute_timeout(&self) -> Duration {
        Duration::from_secs(10)
    }

    fn accumulate(&mut self, output: Bytes) {
        let text = match std::str::from_utf8(&output) {
            Ok(text) => text,
            Err(_) => return,
        };
        let Some((hits, samples)) = text.split_once('/') else {
            return;
        };
        if let (Ok(hits), Ok(samples)) = (hits.parse::<u64>(), samples.parse::<u64>()) {
            self.hits += hits;
            self.samples += samples;
        }
    }

    fn finalize(&mut self, _start_time: Instant, sink: &mut dyn Write) -> io::Result<()> {
        if self.samples == 0 {
            return writeln!(sink, "0");
        }
        let estimate = 4.0 * self.hits as f64 / self.samples as f64;
        writeln!(sink, "{estimate}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_total_samples_evenly_with_remainder_on_leading_partials() {
        let pi = MonteCarloPi::new();
        let inputs: Vec<_> = pi
            .partition(&ComputeRequest::new("pi", vec!["10".into(), "3".into()]))
            .unwrap()
            .collect();
        assert_eq!(inputs, vec!["4", "3", "3"]);
    }

    #[test]
    fn more_partials_than_samples_drops_empty_shares() {
        let pi = MonteCarloPi::new();
        let inputs: Vec<_> = pi
            .partition(&ComputeRequest::new("pi", vec!["2".into(), "5".into()]))
            .unwrap()
            .collect();
        assert_eq!(inputs.len(), 2);
    }

    #[test]
    fn rejects_zero_samples_or_zero_partials() {
        let pi = MonteCarloPi::new();
        assert!(pi
            .partition(&ComputeRequest::new("pi", vec!["0".into(), "4".into()]))
            .is_err());
        assert!(pi
            .partition(&ComputeRequest::new("pi", vec!["10".into(), "0".into()]))
            .is_err());
    }

    #[tokio::test]
    async fn partial_compute_reports_hits_over_n() {
        let pi = MonteCarloPi::new();
        let output = pi.partial_compute(Bytes::from_static(b"1000")).await.unwrap();
        let text = String::from_utf8(output.to_vec()).unwrap();
        let (hits, samples) = text.split_once('/').unwrap();
        assert_eq!(samples, "1000");
        let hits: u64 = hits.parse().unwrap();
        assert!(hits <= 1000);
    }

    #[test]
    fn accumulate_then_finalize_estimates_pi_from_perfect_hit_rate() {
        let mut pi = MonteCarloPi::new();
        pi.accumulate(Bytes::from_static(b"785/1000"));
        let mut out = Vec::new();
        pi.finalize(Instant::now(), &mut out).unwrap();
        let estimate: f64 = String::from_utf8(out).unwrap().trim().parse().unwrap();
        assert!((estimate - 3.14).abs() < 0.01);
    }
}
