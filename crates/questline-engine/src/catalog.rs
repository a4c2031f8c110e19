// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static mission and badge catalogs plus the XP rules.

use std::collections::BTreeMap;

use questline_config::model::RewardsConfig;
use questline_core::types::level_for_xp;
use questline_core::{Badge, BadgeId, Mission, MissionId, QuestlineError};

/// Read-only view of the configured rewards.
#[derive(Debug, Clone)]
pub struct Catalog {
    missions: BTreeMap<MissionId, Mission>,
    badges: BTreeMap<BadgeId, Badge>,
    check_in_xp: u64,
    xp_per_level: u64,
}

impl Catalog {
    pub fn new(config: &RewardsConfig) -> Self {
        Self {
            missions: config.missions.iter().map(|m| (m.id, m.clone())).collect(),
            badges: config
                .badges
                .iter()
                .map(|b| (b.id.clone(), b.clone()))
                .collect(),
            check_in_xp: config.check_in_xp,
            xp_per_level: config.xp_per_level,
        }
    }

    pub fn mission(&self, id: MissionId) -> Result<&Mission, QuestlineError> {
        self.missions
            .get(&id)
            .ok_or_else(|| QuestlineError::UnknownTarget(format!("mission {id}")))
    }

    pub fn badge(&self, id: &BadgeId) -> Result<&Badge, QuestlineError> {
        self.badges
            .get(id)
            .ok_or_else(|| QuestlineError::UnknownTarget(format!("badge {id}")))
    }

    pub fn missions(&self) -> impl Iterator<Item = &Mission> {
        self.missions.values()
    }

    pub fn badges(&self) -> impl Iterator<Item = &Badge> {
        self.badges.values()
    }

    pub fn check_in_xp(&self) -> u64 {
        self.check_in_xp
    }

    pub fn xp_per_level(&self) -> u64 {
        self.xp_per_level
    }

    pub fn level_for(&self, xp: u64) -> u32 {
        level_for_xp(xp, self.xp_per_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_report_unknown_targets() {
        let catalog = Catalog::new(&RewardsConfig::default());
        assert_eq!(catalog.mission(MissionId(3)).unwrap().reward_xp, 100);
        assert!(matches!(
            catalog.mission(MissionId(9)),
            Err(QuestlineError::UnknownTarget(ref what)) if what == "mission 9"
        ));
        assert!(catalog.badge(&BadgeId("genesis".into())).is_ok());
        assert!(catalog.badge(&BadgeId("nope".into())).is_err());
        assert_eq!(catalog.level_for(1000), 3);
    }
}
