//! `wordfreq`: counts word occurrences across chunks of text.
//!
//! Each partial is an independent, self-describing JSON document — no
//! encoder/decoder state is reused across `partial_compute` calls, since
//! some binary formats emit type metadata only on a stream's first message.

use std::collections::HashMap;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;

use dda_core::{Computation, ComputeRequest, CoordinatorError, PartitionIter};

/// Number of words grouped into one partial input.
const CHUNK_SIZE: usize = 64;

pub struct WordFrequency {
    totals: HashMap<String, u64>,
}

impl WordFrequency {
    pub fn new() -> Self {
        Self {
            totals: HashMap::new(),
        }
    }
}

impl Default for WordFrequency {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Computation for WordFrequency {
    fn name(&self) -> &str {
        "wordfreq"
    }

    fn description(&self) -> &str {
        "counts word frequency across the concatenation of its arguments"
    }

    fn partition(&self, request: &ComputeRequest) -> Result<PartitionIter, CoordinatorError> {
        if request.args.is_empty() {
            return Err(CoordinatorError::Argument(
                "wordfreq requires at least one text argument".into(),
            ));
        }

        let words: Vec<String> = request
            .args
            .iter()
            .flat_map(|arg| arg.split_whitespace())
            .map(|w| w.to_lowercase())
            .collect();

        let chunks: Vec<Bytes> = words
            .chunks(CHUNK_SIZE)
            .map(|chunk| Bytes::from(serde_json::to_vec(chunk).expect("word chunk serializes")))
            .collect();

        Ok(Box::new(chunks.into_iter()))
    }

    async fn partial_compute(&self, input: Bytes) -> Option<Bytes> {
        let words: Vec<String> = match serde_json::from_slice(&input) {
            Ok(words) => words,
            Err(_) => return Some(Bytes::new()), // decode error, fatal per contract
        };

        let mut counts: HashMap<String, u64> = HashMap::new();
        for word in words {
            *counts.entry(word).or_insert(0) += 1;
        }

        match serde_json::to_vec(&counts) {
            Ok(bytes) => Some(Bytes::from(bytes)),
            Err(_) => Some(Bytes::new()),
        }
    }

    fn partial_compute_timeout(&self) -> Duration {
        Duration::from_secs(5)
    }

    fn accumulate(&mut self, output: Bytes) {
        if let Ok(partial) = serde_json::from_slice::<HashMap<String, u64>>(&output) {
            for (word, count) in partial {
                *self.totals.entry(word).or_insert(0) += count;
            }
        }
    }

    fn finalize(&mut self, _start_time: Instant, sink: &mut dyn Write) -> io::Result<()> {
        let mut ranked: Vec<(&String, &u64)> = self.totals.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (word, count) in ranked {
            writeln!(sink, "{word}\t{count}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_words_across_one_chunk() {
        let wf = WordFrequency::new();
        let mut inputs = wf
            .partition(&ComputeRequest::new(
                "wordfreq",
                vec!["the quick fox the lazy fox the".into()],
            ))
            .unwrap();
        let chunk = inputs.next().unwrap();
        assert!(inputs.next().is_none());

        let output = wf.partial_compute(chunk).await.unwrap();
        let counts: HashMap<String, u64> = serde_json::from_slice(&output).unwrap();
        assert_eq!(counts.get("the"), Some(&3));
        assert_eq!(counts.get("fox"), Some(&2));
        assert_eq!(counts.get("lazy"), Some(&1));
    }

    #[test]
    fn accumulate_merges_totals_and_finalize_ranks_by_count() {
        let mut wf = WordFrequency::new();
        wf.accumulate(Bytes::from(
            serde_json::to_vec(&HashMap::from([("fox".to_string(), 2u64)])).unwrap(),
        ));
        wf.accumulate(Bytes::from(
            serde_json::to_vec(&HashMap::from([
                ("fox".to_string(), 1u64),
                ("lazy".to_string(), 1u64),
            ]))
            .unwrap(),
        ));

        let mut out = Vec::new();
        wf.finalize(Instant::now(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "fox\t3\nlazy\t1\n");
    }

    #[test]
    fn rejects_empty_argument_list() {
        let wf = WordFrequency::new();
        assert!(wf.partition(&ComputeRequest::new("wordfreq", vec![])).is_err());
    }
}
