//! Run reporting: point-in-time snapshots and per-round time series
//!
//! Snapshots serialize to JSON for downstream analysis; the recorder
//! accumulates one row per round and renders CSV for plotting.

use std::io::Write;

use serde::Serialize;

use crate::core::error::Result;
use crate::core::types::{GroupMap, IdentityGroup, Round};
use crate::simulation::{Model, StatusCounts};

/// One venue's state at snapshot time
#[derive(Debug, Clone, Serialize)]
pub struct VenueSnapshot {
    pub name: String,
    pub identity_flag: bool,
    /// Visitors of the last completed round, per group
    pub visitor_counts: GroupMap<u32>,
    pub fixed_affinity: GroupMap<f64>,
    pub adaptive_affinity: GroupMap<f64>,
    pub effective_affinity: GroupMap<f64>,
}

/// Full model state at the end of a round
#[derive(Debug, Clone, Serialize)]
pub struct ModelSnapshot {
    pub round: Round,
    pub seed: u64,
    pub status: StatusCounts,
    pub status_by_group: GroupMap<StatusCounts>,
    pub venues: Vec<VenueSnapshot>,
    pub average_affinity: [[f64; IdentityGroup::COUNT]; IdentityGroup::COUNT],
}

impl ModelSnapshot {
    pub fn capture(model: &Model) -> Self {
        let venues = model
            .venues()
            .iter()
            .map(|v| VenueSnapshot {
                name: v.name.clone(),
                identity_flag: v.identity_flag(),
                visitor_counts: v.current_visitors(),
                fixed_affinity: v.fixed_affinity(),
                adaptive_affinity: v.adaptive_affinity(),
                effective_affinity: v.effective_affinity(),
            })
            .collect();

        Self {
            round: model.round(),
            seed: model.config().seed,
            status: model.status_counts(),
            status_by_group: model.status_counts_by_group(),
            venues,
            average_affinity: model.average_affinity_matrix(),
        }
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

/// One recorded row of the per-round time series
#[derive(Debug, Clone, Serialize)]
pub struct RoundRecord {
    pub round: Round,
    pub status: StatusCounts,
    /// Per venue: total visitors, flag-group share, identity flag
    pub venues: Vec<VenueRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VenueRecord {
    pub visitors: u32,
    pub flag_group_share: f64,
    pub identity_flag: bool,
}

/// Accumulates one [`RoundRecord`] per observed round
///
/// Call [`observe`](Self::observe) after each `Model::step`; the venue
/// column layout is fixed at construction.
pub struct RunRecorder {
    venue_names: Vec<String>,
    flag_group: IdentityGroup,
    records: Vec<RoundRecord>,
}

impl RunRecorder {
    pub fn new(model: &Model) -> Self {
        Self {
            venue_names: model.venues().iter().map(|v| v.name.clone()).collect(),
            flag_group: model.config().flag_group,
            records: Vec::new(),
        }
    }

    /// Append a row for the round the model just completed
    pub fn observe(&mut self, model: &Model) {
        let venues = model
            .venues()
            .iter()
            .map(|v| {
                let ratios = v.current_population_ratios();
                VenueRecord {
                    visitors: v.current_visitor_count(),
                    flag_group_share: ratios[self.flag_group],
                    identity_flag: v.identity_flag(),
                }
            })
            .collect();

        self.records.push(RoundRecord {
            round: model.round().saturating_sub(1),
            status: model.status_counts(),
            venues,
        });
    }

    pub fn records(&self) -> &[RoundRecord] {
        &self.records
    }

    /// Render the whole series as CSV, header included
    pub fn to_csv(&self) -> String {
        let mut out = String::from("round,active,temporarily_withdrawn,permanently_withdrawn");
        for name in &self.venue_names {
            out.push_str(&format!(
                ",{name}_visitors,{name}_{}_share,{name}_flag",
                self.flag_group.label().to_lowercase()
            ));
        }
        out.push('\n');

        for record in &self.records {
            out.push_str(&format!(
                "{},{},{},{}",
                record.round,
                record.status.active,
                record.status.temporarily_withdrawn,
                record.status.permanently_withdrawn
            ));
            for venue in &record.venues {
                out.push_str(&format!(
                    ",{},{:.4},{}",
                    venue.visitors, venue.flag_group_share, venue.identity_flag
                ));
            }
            out.push('\n');
        }
        out
    }

    pub fn write_csv<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(self.to_csv().as_bytes())?;
        Ok(())
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, &self.records)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ModelConfig;

    #[test]
    fn snapshot_reflects_the_completed_round() {
        let mut model = Model::new(ModelConfig::default()).unwrap();
        model.run(3);

        let snap = ModelSnapshot::capture(&model);
        assert_eq!(snap.round, 3);
        assert_eq!(snap.venues.len(), model.venues().len());
        let total: usize = snap
            .venues
            .iter()
            .map(|v| v.visitor_counts.total() as usize)
            .sum();
        assert_eq!(total, snap.status.active);
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let mut model = Model::new(ModelConfig::default()).unwrap();
        model.run(1);

        let mut buf = Vec::new();
        ModelSnapshot::capture(&model).write_json(&mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["round"], 1);
        assert!(value["venues"].as_array().is_some());
    }

    #[test]
    fn recorder_emits_one_row_per_round() {
        let mut model = Model::new(ModelConfig::default()).unwrap();
        let mut recorder = RunRecorder::new(&model);
        for _ in 0..5 {
            model.step();
            recorder.observe(&model);
        }

        assert_eq!(recorder.records().len(), 5);
        let csv = recorder.to_csv();
        assert_eq!(csv.lines().count(), 6);
        assert!(csv.starts_with("round,active,"));
        assert!(csv.contains("women_only_bar_visitors"));
    }
}
