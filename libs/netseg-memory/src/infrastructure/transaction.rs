//! Session transaction - buffered writes with savepoints
//!
//! Writes made inside a transaction are buffered as a log and only reach the
//! shared table on commit of the outermost level. Each nested level is a
//! savepoint recorded as the log length at the time it was opened.
//!
//! A session's view is rebuilt from a copy of the committed table on every
//! access, so a transaction of k writes over n rows costs O(k * (n + k)).
//! That is fine for an in-process store holding test-sized tables.

use std::collections::{BTreeMap, HashSet};

use netseg_domain::segment::{NetworkId, Result, Segment, SegmentError, SegmentId};

/// One buffered write
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TxnWrite {
    Insert(Segment),
    Update(Segment),
    Delete(SegmentId),
}

impl TxnWrite {
    /// Apply this write to `table`, enforcing the table's constraints
    pub(crate) fn apply(
        &self,
        table: &mut BTreeMap<SegmentId, Segment>,
        networks: Option<&HashSet<NetworkId>>,
    ) -> Result<()> {
        match self {
            TxnWrite::Insert(segment) => {
                if table.contains_key(segment.id()) {
                    return Err(SegmentError::SegmentAlreadyExists(segment.id().to_string()));
                }
                check_network(segment, networks)?;
                table.insert(*segment.id(), segment.clone());
            }
            TxnWrite::Update(segment) => {
                check_network(segment, networks)?;
                // Like an UPDATE matching no row, a record deleted meanwhile stays deleted
                if let Some(row) = table.get_mut(segment.id()) {
                    *row = segment.clone();
                }
            }
            TxnWrite::Delete(id) => {
                table.remove(id);
            }
        }
        Ok(())
    }
}

fn check_network(segment: &Segment, networks: Option<&HashSet<NetworkId>>) -> Result<()> {
    match networks {
        Some(known) if !known.contains(segment.network_id()) => {
            Err(SegmentError::NetworkNotFound(segment.network_id().to_string()))
        }
        _ => Ok(()),
    }
}

/// Open transaction of one session
#[derive(Debug, Default)]
pub(crate) struct SessionTransaction {
    /// Buffered writes, oldest first
    writes: Vec<TxnWrite>,
    /// Write-log length at each open savepoint, innermost last
    savepoints: Vec<usize>,
}

impl SessionTransaction {
    /// Number of open levels, the outermost transaction included
    pub(crate) fn depth(&self) -> usize {
        self.savepoints.len() + 1
    }

    pub(crate) fn into_writes(self) -> Vec<TxnWrite> {
        self.writes
    }

    pub(crate) fn push(&mut self, write: TxnWrite) {
        self.writes.push(write);
    }

    pub(crate) fn savepoint(&mut self) {
        self.savepoints.push(self.writes.len());
    }

    /// Release the innermost savepoint, keeping its writes
    ///
    /// Returns false when no savepoint is open.
    pub(crate) fn release_savepoint(&mut self) -> bool {
        self.savepoints.pop().is_some()
    }

    /// Discard the writes of the innermost savepoint
    ///
    /// Returns false when no savepoint is open.
    pub(crate) fn rollback_to_savepoint(&mut self) -> bool {
        match self.savepoints.pop() {
            Some(len) => {
                self.writes.truncate(len);
                true
            }
            None => false,
        }
    }

    /// The committed table as this transaction sees it
    ///
    /// # Errors
    ///
    /// Returns `SegmentError::TransactionFailure` when a buffered write no
    /// longer applies because another session committed a conflicting one.
    pub(crate) fn overlay(
        &self,
        committed: &BTreeMap<SegmentId, Segment>,
    ) -> Result<BTreeMap<SegmentId, Segment>> {
        let mut table = committed.clone();
        for write in &self.writes {
            write.apply(&mut table, None).map_err(|err| {
                SegmentError::transaction_failure(format!(
                    "transaction conflicts with a concurrent commit: {err}"
                ))
            })?;
        }
        Ok(table)
    }
}
