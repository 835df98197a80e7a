use crate::align::{
    aligned_pair::AlignedPair,
    pairwise::{PairwiseAligner, PairwiseAlignmentParameters},
};
use flume::{unbounded, Receiver, Sender};
use log::debug;
use proglog::{CountFormatterKind, ProgLogBuilder};
use std::thread::ScopedJoinHandle;

/// How many pairwise alignments between progress log messages.
pub const PROGRESS_UNIT: u64 = 1_000;

/// A message sent to the aligner threadpool: the index of the pair in the schedule, and the pair.
type InputMessage = (usize, (usize, usize));

/// The filtered correspondences for the pair at the given index in the schedule.
type OutputMessage = (usize, Vec<AlignedPair>);

/// Runs the pairwise aligner over every scheduled pair of sequences and keeps the
/// correspondences whose probability meets a threshold.
pub struct PairwiseAggregator<'a, A: PairwiseAligner + ?Sized> {
    aligner: &'a A,
    params: PairwiseAlignmentParameters,
    threads: usize,
}

impl<'a, A: PairwiseAligner + ?Sized> PairwiseAggregator<'a, A> {
    pub fn new(aligner: &'a A, params: PairwiseAlignmentParameters, threads: usize) -> Self {
        Self {
            aligner,
            params,
            threads: threads.max(1),
        }
    }

    /// Aligns a single scheduled pair, returning the correspondences with a probability of at
    /// least `threshold`.  Panics if the aligner returns coordinates outside either sequence.
    fn align_pair<S: AsRef<[u8]>>(
        &self,
        sequences: &[S],
        (seq_x, seq_y): (usize, usize),
        threshold: f64,
    ) -> Vec<AlignedPair> {
        assert!(
            seq_x < sequences.len() && seq_y < sequences.len() && seq_x != seq_y,
            "Invalid scheduled pair ({seq_x}, {seq_y}) for {} sequences",
            sequences.len()
        );
        self.aligner
            .align(
                sequences[seq_x].as_ref(),
                sequences[seq_y].as_ref(),
                &self.params,
            )
            .iter()
            .map(|m| AlignedPair::from_match(seq_x, seq_y, m))
            .inspect(|pair| pair.validate(sequences))
            .filter(|pair| pair.probability() >= threshold)
            .collect()
    }

    /// Aligns every pair in `schedule` and concatenates the surviving correspondences in schedule
    /// order.  A `threshold` of `0.0` keeps everything the aligner reports.
    pub fn aggregate<S: AsRef<[u8]> + Sync>(
        &self,
        sequences: &[S],
        schedule: &[(usize, usize)],
        threshold: f64,
    ) -> Vec<AlignedPair> {
        assert!(
            (0.0..=1.0).contains(&threshold),
            "Threshold must be in [0, 1]: {threshold}"
        );
        let progress_logger = ProgLogBuilder::new()
            .name("msa-progress")
            .noun("pairwise alignments")
            .verb("Aligned")
            .unit(PROGRESS_UNIT)
            .count_formatter(CountFormatterKind::Comma)
            .build();

        let mut results: Vec<Option<Vec<AlignedPair>>> = vec![None; schedule.len()];
        if self.threads == 1 || schedule.len() <= 1 {
            for (index, &pair) in schedule.iter().enumerate() {
                results[index] = Some(self.align_pair(sequences, pair, threshold));
                progress_logger.record();
            }
        } else {
            // All the work is queued up front, so workers stop once the queue is drained.
            let (to_align_tx, to_align_rx): (Sender<InputMessage>, Receiver<InputMessage>) =
                unbounded();
            for (index, &pair) in schedule.iter().enumerate() {
                to_align_tx
                    .send((index, pair))
                    .expect("Error sending message");
            }
            drop(to_align_tx);

            let (to_output_tx, to_output_rx): (Sender<OutputMessage>, Receiver<OutputMessage>) =
                unbounded();
            let num_workers = self.threads.min(schedule.len());
            std::thread::scope(|scope| {
                let handles: Vec<ScopedJoinHandle<()>> = (0..num_workers)
                    .map(|_| {
                        let to_align_rx = to_align_rx.clone();
                        let to_output_tx = to_output_tx.clone();
                        scope.spawn(move || {
                            for (index, pair) in to_align_rx.iter() {
                                let aligned = self.align_pair(sequences, pair, threshold);
                                to_output_tx
                                    .send((index, aligned))
                                    .expect("Error sending alignments");
                            }
                        })
                    })
                    .collect();
                drop(to_output_tx);

                for (index, aligned) in to_output_rx.iter() {
                    results[index] = Some(aligned);
                    progress_logger.record();
                }

                // Wait for all the aligner threads before merging results
                for handle in handles {
                    if let Err(e) = handle.join() {
                        std::panic::resume_unwind(e);
                    }
                }
            });
        }

        let aligned_pairs: Vec<AlignedPair> = results
            .into_iter()
            .flat_map(|result| result.expect("Bug: missing pairwise alignment result"))
            .collect();
        debug!(
            "Kept {} aligned pairs from {} pairwise alignments at threshold {}",
            aligned_pairs.len(),
            schedule.len(),
            threshold
        );
        aligned_pairs
    }
}
