//! Redundancy and availability of a file
//!
//! Both are derived on demand from the chunk/piece state and host status
//! maps supplied by the contract manager. Nothing here is stored.
//!
//! A piece slot is one logical shard, so a slot counts at most once no
//! matter how many hosts hold a copy of it. The file is only as redundant as
//! its weakest chunk.

use super::chunk::Chunk;
use super::StorageError;
use crate::identity::{HostKeyTable, HostPublicKey};
use std::collections::HashMap;

/// Per-host flag keyed by host identity (offline, good for renew, ...)
pub type HostStatusMap = HashMap<HostPublicKey, bool>;

/// Result of a redundancy computation
#[derive(Debug, Clone, PartialEq)]
pub struct RedundancyReport {
    /// Redundancy counting only online hosts that are good for renew
    pub redundancy: f64,

    /// Redundancy counting every online host
    pub redundancy_no_renew: f64,

    /// Hosts that appeared in only one of the two status maps
    pub inconsistent_hosts: Vec<HostPublicKey>,
}

impl RedundancyReport {
    /// Returned for empty files
    pub const NOT_APPLICABLE: f64 = -1.0;

    fn not_applicable() -> Self {
        Self {
            redundancy: Self::NOT_APPLICABLE,
            redundancy_no_renew: Self::NOT_APPLICABLE,
            inconsistent_hosts: Vec::new(),
        }
    }

    /// The value to show the user.
    ///
    /// Below 1x the figure including soon-to-expire contracts is reported,
    /// since the renter is expected to be repairing; at or above 1x the
    /// renewal-safe figure is reported.
    pub fn effective(&self) -> f64 {
        if self.redundancy < 1.0 {
            self.redundancy_no_renew
        } else {
            self.redundancy
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.inconsistent_hosts.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostState {
    Offline,
    Online,
    GoodForRenew,
}

/// Classify every host of the key table, in index order
fn host_states(
    table: &HostKeyTable,
    offline: &HostStatusMap,
    good_for_renew: &HostStatusMap,
) -> (Vec<HostState>, Vec<HostPublicKey>) {
    let mut inconsistent = Vec::new();
    let states = table
        .iter()
        .map(|host| {
            let is_offline = offline.get(host);
            let renewable = good_for_renew.get(host);
            if is_offline.is_some() != renewable.is_some() {
                let err = StorageError::InconsistentHostStatus(host.clone());
                tracing::error!(host = %host.short(), "{}", err);
                inconsistent.push(host.clone());
            }
            match (is_offline, renewable) {
                // Unknown hosts can't be relied on
                (None, _) | (Some(true), _) => HostState::Offline,
                (Some(false), Some(true)) => HostState::GoodForRenew,
                (Some(false), _) => HostState::Online,
            }
        })
        .collect();
    (states, inconsistent)
}

/// Count the slots of `chunk` that are good for renew and the slots that are
/// online at all
fn chunk_tallies(chunk: &Chunk, states: &[HostState]) -> (u64, u64) {
    let mut good_for_renew = 0;
    let mut online = 0;
    for slot in &chunk.pieces {
        let mut found_online = false;
        let mut found_renewable = false;
        for piece in slot {
            match states[piece.host_index as usize] {
                HostState::GoodForRenew => {
                    found_renewable = true;
                    break;
                }
                HostState::Online => found_online = true,
                HostState::Offline => {}
            }
        }
        if found_renewable {
            good_for_renew += 1;
            online += 1;
        } else if found_online {
            online += 1;
        }
    }
    (good_for_renew, online)
}

/// Redundancy of the least redundant chunk.
///
/// Every chunk is assumed to share the first chunk's `min_pieces`; the ratio
/// is normalized by it for the whole file.
pub(crate) fn redundancy(
    file_size: u64,
    chunks: &[Chunk],
    table: &HostKeyTable,
    offline: &HostStatusMap,
    good_for_renew: &HostStatusMap,
) -> RedundancyReport {
    let first = match chunks.first() {
        Some(chunk) if file_size > 0 => chunk,
        _ => return RedundancyReport::not_applicable(),
    };

    let (states, inconsistent_hosts) = host_states(table, offline, good_for_renew);

    let mut min_renew = u64::MAX;
    let mut min_no_renew = u64::MAX;
    for chunk in chunks {
        let (renew, no_renew) = chunk_tallies(chunk, &states);
        min_renew = min_renew.min(renew);
        min_no_renew = min_no_renew.min(no_renew);
    }

    let min_pieces = first.min_pieces() as f64;
    RedundancyReport {
        redundancy: min_renew as f64 / min_pieces,
        redundancy_no_renew: min_no_renew as f64 / min_pieces,
        inconsistent_hosts,
    }
}

/// Whether every chunk has at least `min_pieces` slots with an online copy.
///
/// Hosts missing from `offline` count as online.
pub(crate) fn available(chunks: &[Chunk], table: &HostKeyTable, offline: &HostStatusMap) -> bool {
    let online: Vec<bool> = table
        .iter()
        .map(|host| !offline.get(host).copied().unwrap_or(false))
        .collect();

    chunks.iter().all(|chunk| {
        let needed = chunk.min_pieces();
        let mut found = 0;
        for slot in &chunk.pieces {
            if slot.iter().any(|piece| online[piece.host_index as usize]) {
                found += 1;
                if found >= needed {
                    return true;
                }
            }
        }
        found >= needed
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::ContentHash;
    use crate::identity::random_host_key;
    use crate::storage::chunk::StoredPiece;
    use crate::storage::ErasureCode;
    use std::sync::Arc;

    struct Fixture {
        table: HostKeyTable,
        chunks: Vec<Chunk>,
    }

    impl Fixture {
        fn new(num_chunks: usize, data: usize, parity: usize) -> Self {
            let code = Arc::new(ErasureCode::reed_solomon(data, parity).unwrap());
            Self {
                table: HostKeyTable::new(),
                chunks: (0..num_chunks).map(|_| Chunk::new(code.clone())).collect(),
            }
        }

        fn add(&mut self, host: &HostPublicKey, chunk: usize, slot: usize) {
            let host_index = self.table.intern(host);
            self.chunks[chunk].pieces[slot].push(StoredPiece {
                key_nonce: [0; 4],
                host_index,
                merkle_root: ContentHash::default(),
            });
        }
    }

    fn status(entries: &[(&HostPublicKey, bool)]) -> HostStatusMap {
        entries.iter().map(|(h, v)| ((*h).clone(), *v)).collect()
    }

    #[test]
    fn test_weakest_chunk_falls_back_to_no_renew() {
        let renewable = random_host_key();
        let expiring = random_host_key();
        let mut f = Fixture::new(2, 2, 2);
        f.add(&renewable, 0, 0);
        f.add(&renewable, 0, 1);
        f.add(&expiring, 1, 0);

        let offline = status(&[(&renewable, false), (&expiring, false)]);
        let gfr = status(&[(&renewable, true), (&expiring, false)]);
        let report = redundancy(1, &f.chunks, &f.table, &offline, &gfr);

        assert_eq!(report.redundancy, 0.0);
        assert_eq!(report.redundancy_no_renew, 0.5);
        assert_eq!(report.effective(), 0.5);
        assert!(report.is_consistent());
    }

    #[test]
    fn test_healthy_file_reports_renewable_figure() {
        let hosts: Vec<_> = (0..4).map(|_| random_host_key()).collect();
        let extra = random_host_key();
        let mut f = Fixture::new(1, 2, 2);
        for (slot, host) in hosts.iter().enumerate() {
            f.add(host, 0, slot);
        }
        // A second, online-only copy of slot 0 must not be counted twice
        f.add(&extra, 0, 0);

        let mut offline = status(&[(&extra, false)]);
        let mut gfr = status(&[(&extra, false)]);
        for (i, host) in hosts.iter().enumerate() {
            offline.insert(host.clone(), false);
            gfr.insert(host.clone(), i != 3);
        }

        let report = redundancy(1, &f.chunks, &f.table, &offline, &gfr);
        assert_eq!(report.redundancy, 1.5);
        assert_eq!(report.redundancy_no_renew, 2.0);
        assert_eq!(report.effective(), 1.5);
    }

    #[test]
    fn test_later_renewable_copy_wins() {
        let online_only = random_host_key();
        let renewable = random_host_key();
        let mut f = Fixture::new(1, 1, 1);
        f.add(&online_only, 0, 0);
        f.add(&renewable, 0, 0);

        let offline = status(&[(&online_only, false), (&renewable, false)]);
        let gfr = status(&[(&online_only, false), (&renewable, true)]);
        let report = redundancy(1, &f.chunks, &f.table, &offline, &gfr);

        assert_eq!(report.redundancy, 1.0);
        assert_eq!(report.redundancy_no_renew, 1.0);
    }

    #[test]
    fn test_offline_and_unknown_hosts_count_for_nothing() {
        let down = random_host_key();
        let unknown = random_host_key();
        let mut f = Fixture::new(1, 1, 1);
        f.add(&down, 0, 0);
        f.add(&unknown, 0, 1);

        let offline = status(&[(&down, true)]);
        let gfr = status(&[(&down, true)]);
        let report = redundancy(1, &f.chunks, &f.table, &offline, &gfr);

        assert_eq!(report.redundancy, 0.0);
        assert_eq!(report.redundancy_no_renew, 0.0);
        assert!(report.is_consistent());
    }

    #[test]
    fn test_inconsistent_maps_are_reported() {
        let only_offline = random_host_key();
        let only_gfr = random_host_key();
        let mut f = Fixture::new(1, 1, 1);
        f.add(&only_offline, 0, 0);
        f.add(&only_gfr, 0, 1);

        let offline = status(&[(&only_offline, false)]);
        let gfr = status(&[(&only_gfr, true)]);
        let report = redundancy(1, &f.chunks, &f.table, &offline, &gfr);

        assert_eq!(report.inconsistent_hosts, vec![only_offline, only_gfr]);
        // The computation still runs: the host in the offline map is online
        // but not renewable, the other one is unknown
        assert_eq!(report.redundancy, 0.0);
        assert_eq!(report.redundancy_no_renew, 1.0);
    }

    #[test]
    fn test_empty_file_is_not_applicable() {
        let host = random_host_key();
        let mut f = Fixture::new(1, 1, 1);
        f.add(&host, 0, 0);
        let offline = status(&[(&host, false)]);
        let gfr = status(&[(&host, true)]);

        let report = redundancy(0, &f.chunks, &f.table, &offline, &gfr);
        assert_eq!(report.effective(), RedundancyReport::NOT_APPLICABLE);
        assert_eq!(
            redundancy(10, &[], &f.table, &offline, &gfr).effective(),
            RedundancyReport::NOT_APPLICABLE
        );
    }

    #[test]
    fn test_available_counts_distinct_slots() {
        let a = random_host_key();
        let b = random_host_key();
        let mut f = Fixture::new(1, 2, 1);
        // Two copies in the same slot are still one shard
        f.add(&a, 0, 0);
        f.add(&b, 0, 0);
        assert!(!available(&f.chunks, &f.table, &HostStatusMap::new()));

        f.add(&b, 0, 2);
        assert!(available(&f.chunks, &f.table, &HostStatusMap::new()));

        let offline = status(&[(&b, true)]);
        assert!(!available(&f.chunks, &f.table, &offline));
    }

    #[test]
    fn test_available_requires_every_chunk() {
        let host = random_host_key();
        let mut f = Fixture::new(2, 1, 1);
        f.add(&host, 0, 0);
        assert!(!available(&f.chunks, &f.table, &HostStatusMap::new()));

        f.add(&host, 1, 1);
        assert!(available(&f.chunks, &f.table, &HostStatusMap::new()));
    }
}
