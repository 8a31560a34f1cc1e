//! `fac`: computes n! by multiplying the partials 2..=n.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;

use dda_core::{Computation, ComputeRequest, CoordinatorError, PartitionIter};

pub struct Factorial {
    product: u128,
}

impl Factorial {
    pub fn new() -> Self {
        Self { product: 1 }
    }
}

impl Default for Factorial {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Computation for Factorial {
    fn name(&self) -> &str {
        "fac"
    }

    fn description(&self) -> &str {
        "computes n! by dispatching one partial per multiplicand in 2..=n"
    }

    fn partition(&self, request: &ComputeRequest) -> Result<PartitionIter, CoordinatorError> {
        let n: u64 = request
            .args
            .first()
            .ok_or_else(|| CoordinatorError::Argument("fac requires one argument: n".into()))?
            .parse()
            .map_err(|_| {
                CoordinatorError::Argument("fac argument must be a non-negative integer".into())
            })?;

        let inputs: Vec<Bytes> = (2..=n).map(|i| Bytes::from(i.to_string())).collect();
        Ok(Box::new(inputs.into_iter()))
    }

    async fn partial_compute(&self, input: Bytes) -> Option<Bytes> {
        // The partial computation for factorial is an echo: the coordinator
        // does the multiplying during accumulate. An unparsable input is a
        // computational/encoding error, signaled by an empty reply.
        match std::str::from_utf8(&input).ok().and_then(|s| s.parse::<u64>().ok()) {
            Some(_) => Some(input),
            None => Some(Bytes::new()),
        }
    }

    fn partial_compute_timeout(&self) -> Duration {
        Duration::from_secs(5)
    }

    fn accumulate(&mut self, output: Bytes) {
        if let Some(value) = std::str::from_utf8(&output).ok().and_then(|s| s.parse::<u128>().ok()) {
            self.product *= value;
        }
    }

    fn finalize(&mut self, _start_time: Instant, sink: &mut dyn Write) -> io::Result<()> {
        writeln!(sink, "{}", self.product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_two_through_n() {
        let fac = Factorial::new();
        let inputs: Vec<_> = fac
            .partition(&ComputeRequest::new("fac", vec!["5".into()]))
            .unwrap()
            .collect();
        assert_eq!(inputs, vec!["2", "3", "4", "5"]);
    }

    #[test]
    fn zero_and_one_partition_to_nothing() {
        let fac = Factorial::new();
        assert_eq!(
            fac.partition(&ComputeRequest::new("fac", vec!["0".into()]))
                .unwrap()
                .count(),
            0
        );
        assert_eq!(
            fac.partition(&ComputeRequest::new("fac", vec!["1".into()]))
                .unwrap()
                .count(),
            0
        );
    }

    #[test]
    fn rejects_non_numeric_argument() {
        let fac = Factorial::new();
        assert!(fac
            .partition(&ComputeRequest::new("fac", vec!["banana".into()]))
            .is_err());
    }

    #[tokio::test]
    async fn echoes_valid_partials_and_signals_error_on_garbage() {
        let fac = Factorial::new();
        assert_eq!(
            fac.partial_compute(Bytes::from_static(b"4")).await,
            Some(Bytes::from_static(b"4"))
        );
        assert_eq!(
            fac.partial_compute(Bytes::from_static(b"not-a-number")).await,
            Some(Bytes::new())
        );
    }

    #[test]
    fn accumulate_then_finalize_multiplies_partials() {
        let mut fac = Factorial::new();
        for partial in ["2", "3", "4", "5"] {
            fac.accumulate(Bytes::from(partial));
        }
        let mut out = Vec::new();
        fac.finalize(Instant::now(), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "120\n");
    }
}
