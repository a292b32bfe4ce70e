//! Partition an ordered record stream into one batch per destination parent.
//!
//! The grouper is lazy and single-pass: it holds at most one batch plus one
//! look-ahead record. It never re-sorts, so the scanner must deliver records of
//! one destination parent contiguously (see `CandidateScanner`).

use std::convert::Infallible;

use super::record::{MigrationBatch, PreviewRecord};

pub struct DestinationGrouper<I> {
    inner: I,
    pending: Option<PreviewRecord>,
    done: bool,
}

impl<I> DestinationGrouper<I> {
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            pending: None,
            done: false,
        }
    }
}

impl<I, E> Iterator for DestinationGrouper<I>
where
    I: Iterator<Item = Result<PreviewRecord, E>>,
{
    type Item = Result<MigrationBatch, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        // The first record of a batch is either the look-ahead left over from the
        // previous batch or, at the very start, the first record of the stream.
        let first = match self.pending.take() {
            Some(r) => r,
            None => match self.inner.next() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                Some(Ok(r)) => r,
            },
        };

        let destination_parent = first.destination_parent();
        let mut records = vec![first];
        loop {
            match self.inner.next() {
                None => {
                    self.done = true;
                    break;
                }
                Some(Err(e)) => {
                    // A scan failure is fatal; the half-read batch is not handed out.
                    self.done = true;
                    return Some(Err(e));
                }
                Some(Ok(r)) => {
                    if r.destination_parent() == destination_parent {
                        records.push(r);
                    } else {
                        self.pending = Some(r);
                        break;
                    }
                }
            }
        }

        Some(Ok(MigrationBatch {
            destination_parent,
            records,
        }))
    }
}

/// Group a fallible record stream.
pub fn group<I, E>(records: I) -> DestinationGrouper<I::IntoIter>
where
    I: IntoIterator<Item = Result<PreviewRecord, E>>,
{
    DestinationGrouper::new(records.into_iter())
}

/// Group an infallible record sequence.
pub fn group_records<I>(records: I) -> impl Iterator<Item = MigrationBatch>
where
    I: IntoIterator<Item = PreviewRecord>,
{
    group(records.into_iter().map(Ok::<_, Infallible>)).map(|batch| match batch {
        Ok(b) => b,
        Err(never) => match never {},
    })
}
