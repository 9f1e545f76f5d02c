//! Per-group fix resolution.
//!
//! Every batch recomputes each group it touches from all observations on
//! file for that group. Validation and persistence failures abort the whole
//! batch; triangulation failures are local to their group.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::algorithms::triangulation::Triangulator;
use crate::api::types::{BatchReport, GroupStatus, ObservationRecord};
use crate::core::{Fix, Observation};
use crate::processing::locks::GroupLocks;
use crate::storage::{FixStore, StoreTransaction};
use crate::utils::config::{ConfigError, EngineConfig};
use crate::validation::data::DataValidator;
use crate::validation::error::FixError;

/// Store command issued for one group after it has been evaluated
#[derive(Debug, Clone, PartialEq)]
enum FixWrite {
    Replace(Fix),
    Delete,
    Keep,
}

#[derive(Debug)]
struct GroupOutcome {
    status: GroupStatus,
    write: FixWrite,
}

/// Batch entry point: validates, records, recomputes and persists
pub struct FixAggregator<S: FixStore> {
    store: S,
    triangulator: Triangulator,
    validator: DataValidator,
    config: EngineConfig,
    locks: GroupLocks,
}

impl<S: FixStore> FixAggregator<S> {
    /// Build an aggregator over `store`; fails if `config` is invalid
    pub fn new(store: S, config: EngineConfig) -> Result<Self, ConfigError> {
        let triangulator = config.build_triangulator()?;
        Ok(Self::with_triangulator(store, triangulator, config))
    }

    /// Build an aggregator with an already constructed triangulator
    pub fn with_triangulator(store: S, triangulator: Triangulator, config: EngineConfig) -> Self {
        Self {
            store,
            triangulator,
            validator: DataValidator::with_default_observer(&config.default_observer),
            config,
            locks: GroupLocks::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn triangulator(&self) -> &Triangulator {
        &self.triangulator
    }

    /// Process a JSON array of observation records
    pub fn process_json(&self, json: &str) -> Result<BatchReport, FixError> {
        let records = DataValidator::parse_batch(json)?;
        self.process_batch(&records)
    }

    /// Record a batch and recompute every group it touches.
    ///
    /// Returns one status per touched group in order of first appearance.
    /// On `Err` nothing from this batch is stored.
    pub fn process_batch(&self, records: &[ObservationRecord]) -> Result<BatchReport, FixError> {
        let received_at = Utc::now();
        let observations = self.validator.validate_batch(records, received_at)?;
        let group_ids = touched_groups(&observations);
        if group_ids.is_empty() {
            debug!("empty batch, nothing to record");
            return Ok(BatchReport { recorded: 0, groups: Vec::new() });
        }

        let _lease = self.locks.acquire(&group_ids);
        let mut tx = self.store.begin()?;
        tx.insert_observations(&observations)?;

        let groups = group_ids
            .iter()
            .map(|id| Ok((id.as_str(), tx.observations_for_group(id)?)))
            .collect::<Result<Vec<_>, FixError>>()?;

        let outcomes: Vec<GroupOutcome> = if self.config.parallel {
            groups
                .par_iter()
                .map(|(id, group)| self.evaluate(id, group, received_at))
                .collect()
        } else {
            groups
                .iter()
                .map(|(id, group)| self.evaluate(id, group, received_at))
                .collect()
        };

        let mut statuses = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome.write {
                FixWrite::Replace(fix) => tx.replace_fix(fix)?,
                FixWrite::Delete => tx.delete_fix(outcome.status.group_id())?,
                FixWrite::Keep => {}
            }
            statuses.push(outcome.status);
        }
        tx.commit()?;

        let report = BatchReport {
            recorded: observations.len(),
            groups: statuses,
        };
        info!(
            "batch recorded {} observations across {} groups: {} resolved, {} failed, {} pending",
            report.recorded,
            report.groups.len(),
            report.resolved_count(),
            report.failed_count(),
            report.pending_count()
        );
        Ok(report)
    }

    fn evaluate(&self, group_id: &str, observations: &[Observation], now: DateTime<Utc>) -> GroupOutcome {
        let have = observations.len();
        if have < self.config.min_observations {
            debug!("group {} pending with {} observations", group_id, have);
            return GroupOutcome {
                status: GroupStatus::Pending {
                    group_id: group_id.to_string(),
                    have,
                    required: self.config.min_observations,
                },
                write: FixWrite::Keep,
            };
        }

        match self.triangulator.triangulate_observations(observations) {
            Ok(solution) => {
                let animal_id = observations
                    .first()
                    .map(|o| o.animal_id.clone())
                    .unwrap_or_default();
                let note = solution.quality_note();
                debug!(
                    "group {} resolved to ({:.6}, {:.6}) from {} bearings",
                    group_id, solution.position.lat, solution.position.lon, have
                );
                GroupOutcome {
                    status: GroupStatus::Resolved {
                        group_id: group_id.to_string(),
                        animal_id: animal_id.clone(),
                        latitude: solution.position.lat,
                        longitude: solution.position.lon,
                        confidence_metric: solution.confidence_metric,
                        note: note.clone(),
                    },
                    write: FixWrite::Replace(Fix {
                        group_id: group_id.to_string(),
                        animal_id,
                        latitude: solution.position.lat,
                        longitude: solution.position.lon,
                        note,
                        timestamp: now,
                    }),
                }
            }
            Err(e) => {
                warn!("group {} failed to triangulate: {}", group_id, e);
                GroupOutcome {
                    status: GroupStatus::Failed {
                        group_id: group_id.to_string(),
                        reason: e.to_string(),
                    },
                    write: if self.config.retain_fix_on_failure {
                        FixWrite::Keep
                    } else {
                        FixWrite::Delete
                    },
                }
            }
        }
    }
}

/// Distinct group ids in order of first appearance
fn touched_groups(observations: &[Observation]) -> Vec<String> {
    let mut seen = HashSet::new();
    observations
        .iter()
        .filter(|o| seen.insert(o.group_id.as_str()))
        .map(|o| o.group_id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn aggregator() -> FixAggregator<MemoryStore> {
        FixAggregator::new(MemoryStore::new(), EngineConfig::default()).unwrap()
    }

    fn sighting(group: &str, lat: f64, lon: f64, bearing: f64) -> ObservationRecord {
        ObservationRecord::new(group, "P01", lat, lon, bearing).with_observer("MK")
    }

    #[test]
    fn test_touched_groups_keep_first_appearance_order() {
        let validator = DataValidator::new();
        let records = [
            sighting("G2", 19.05, 73.05, 10.0),
            sighting("G1", 19.05, 73.05, 20.0),
            sighting("G2", 19.05, 73.05, 30.0),
        ];
        let observations = validator.validate_batch(&records, Utc::now()).unwrap();
        assert_eq!(touched_groups(&observations), vec!["G2".to_string(), "G1".to_string()]);
    }

    #[test]
    fn test_single_observation_is_pending() {
        let agg = aggregator();
        let report = agg.process_batch(&[sighting("G1", 19.05, 73.05, 45.0)]).unwrap();

        assert_eq!(report.recorded, 1);
        assert_eq!(report.groups, vec![GroupStatus::Pending { group_id: "G1".into(), have: 1, required: 2 }]);
        assert!(agg.store().fix("G1").unwrap().is_none());
    }

    #[test]
    fn test_two_observations_resolve() {
        let agg = aggregator();
        let report = agg
            .process_batch(&[
                sighting("G1", 19.0500, 73.0500, 45.0),
                sighting("G1", 19.0520, 73.0480, 135.0),
            ])
            .unwrap();

        match &report.groups[0] {
            GroupStatus::Resolved { animal_id, confidence_metric, note, .. } => {
                assert_eq!(animal_id, "P01");
                assert_eq!(*confidence_metric, 0.0);
                assert!(note.contains("2 bearings"));
            }
            other => panic!("expected resolved, got {:?}", other),
        }
        assert!(agg.store().fix("G1").unwrap().is_some());
    }

    #[test]
    fn test_raised_minimum_reported_in_pending_status() {
        let mut config = EngineConfig::default();
        config.min_observations = 3;
        let agg = FixAggregator::new(MemoryStore::new(), config).unwrap();

        let report = agg
            .process_batch(&[
                sighting("Q", 19.0500, 73.0500, 45.0),
                sighting("Q", 19.0520, 73.0480, 135.0),
            ])
            .unwrap();

        let status = &report.groups[0];
        assert_eq!(*status, GroupStatus::Pending { group_id: "Q".into(), have: 2, required: 3 });
        assert_eq!(status.to_string(), "Q: saved 2/3 readings, waiting for more");
        assert!(agg.store().fix("Q").unwrap().is_none());
    }

    #[test]
    fn test_pending_group_resolves_on_later_batch() {
        let agg = aggregator();
        agg.process_batch(&[sighting("G1", 19.0500, 73.0500, 45.0)]).unwrap();
        let report = agg.process_batch(&[sighting("G1", 19.0520, 73.0480, 135.0)]).unwrap();

        assert!(report.groups[0].is_resolved());
        assert_eq!(agg.store().observations("G1").unwrap().len(), 2);
    }

    #[test]
    fn test_sequential_mode_matches_parallel() {
        let records = [
            sighting("G1", 19.0500, 73.0500, 45.0),
            sighting("G2", 19.0400, 73.0400, 10.0),
            sighting("G1", 19.0520, 73.0480, 135.0),
            sighting("G2", 19.0450, 73.0300, 80.0),
        ];
        let parallel = aggregator().process_batch(&records).unwrap();
        let sequential = FixAggregator::new(MemoryStore::new(), EngineConfig::default().with_parallel(false))
            .unwrap()
            .process_batch(&records)
            .unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_empty_batch() {
        let agg = aggregator();
        let report = agg.process_batch(&[]).unwrap();
        assert_eq!(report.recorded, 0);
        assert!(report.groups.is_empty());
    }

    #[test]
    fn test_process_json_rejects_malformed_input() {
        let agg = aggregator();
        assert!(matches!(agg.process_json("not json"), Err(FixError::Validation(_))));
        assert_eq!(agg.store().observation_count().unwrap(), 0);
    }
}
