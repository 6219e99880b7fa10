//! Level-of-detail manager: a pure function of focus, time-bound promotion
//! overrides, and distance thresholds.

use std::collections::HashMap;

/// Simulation fidelity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailLevel {
    Full,
    Reduced,
    Abstract,
}

impl DetailLevel {
    /// Simulation-frequency multiplier for this tier.
    pub fn multiplier(self) -> f64 {
        match self {
            DetailLevel::Full => 1.0,
            DetailLevel::Reduced => 0.1,
            DetailLevel::Abstract => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LodConfig {
    pub full_radius: f64,
    pub reduced_radius: f64,
    pub high_significance_threshold: u8,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            full_radius: 50.0,
            reduced_radius: 200.0,
            high_significance_threshold: 85,
        }
    }
}

/// Discrete grid key for an override position. Positions are bucketed to
/// integer coordinates so repeated `promote_to_full_detail` calls at the
/// "same place" collapse onto one override rather than accumulating.
type OverrideKey = (i64, i64);

struct Override {
    expires_at: u64,
}

/// Classifies world positions into `Full` / `Reduced` / `Abstract` tiers by
/// distance from a single focus point, honoring temporary full-detail
/// promotions and a significance-based override.
///
/// This manager does not iterate entities itself; it is a pure function of
/// focus + overrides + current tick, queried by systems that decide what
/// "Full" vs "Abstract" actually means for their own domain.
pub struct LodManager {
    config: LodConfig,
    focus: (f64, f64),
    current_tick: u64,
    overrides: HashMap<OverrideKey, Override>,
}

impl LodManager {
    pub fn new(config: LodConfig) -> Self {
        Self {
            config,
            focus: (0.0, 0.0),
            current_tick: 0,
            overrides: HashMap::new(),
        }
    }

    pub fn set_focus(&mut self, x: f64, y: f64) {
        self.focus = (x, y);
    }

    /// Advance the manager's notion of "now", pruning expired overrides.
    pub fn set_current_tick(&mut self, tick: u64) {
        self.current_tick = tick;
        self.overrides.retain(|_, o| o.expires_at > tick);
    }

    fn key(x: f64, y: f64) -> OverrideKey {
        (x.round() as i64, y.round() as i64)
    }

    /// Temporarily force `(x, y)` to `Full` detail until `expires_at`
    /// (inclusive of ticks strictly before it; an override with
    /// `expires_at <= current_tick` is already expired).
    pub fn promote_to_full_detail(&mut self, x: f64, y: f64, expires_at: u64) {
        self.overrides.insert(Self::key(x, y), Override { expires_at });
    }

    pub fn remove_override(&mut self, x: f64, y: f64) {
        self.overrides.remove(&Self::key(x, y));
    }

    pub fn clear_overrides(&mut self) {
        self.overrides.clear();
    }

    pub fn get_active_overrides(&self) -> Vec<(f64, f64)> {
        self.overrides
            .keys()
            .map(|&(x, y)| (x as f64, y as f64))
            .collect()
    }

    pub fn get_distance_from_focus(&self, x: f64, y: f64) -> f64 {
        let dx = x - self.focus.0;
        let dy = y - self.focus.1;
        (dx * dx + dy * dy).sqrt()
    }

    /// Consults overrides first, then falls back to distance bands.
    pub fn get_detail_level(&self, x: f64, y: f64) -> DetailLevel {
        if let Some(o) = self.overrides.get(&Self::key(x, y)) {
            if o.expires_at > self.current_tick {
                return DetailLevel::Full;
            }
        }
        let distance = self.get_distance_from_focus(x, y);
        if distance <= self.config.full_radius {
            DetailLevel::Full
        } else if distance <= self.config.reduced_radius {
            DetailLevel::Reduced
        } else {
            DetailLevel::Abstract
        }
    }

    /// Whether an entity at `(x, y)` with `significance` should be
    /// simulated at all this tick -- always true for `Full`/`Reduced`
    /// (frequency-gated elsewhere), false only when `Abstract` and not
    /// significance-exempt.
    pub fn should_simulate_entity(&self, x: f64, y: f64, significance: u8) -> bool {
        if significance >= self.config.high_significance_threshold {
            return true;
        }
        self.get_detail_level(x, y) != DetailLevel::Abstract
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_bands_without_overrides() {
        let lod = LodManager::new(LodConfig::default());
        assert_eq!(lod.get_detail_level(50.0, 0.0), DetailLevel::Full);
        assert_eq!(lod.get_detail_level(50.001, 0.0), DetailLevel::Reduced);
        assert_eq!(lod.get_detail_level(200.0, 0.0), DetailLevel::Reduced);
        assert_eq!(lod.get_detail_level(200.001, 0.0), DetailLevel::Abstract);
    }

    #[test]
    fn high_significance_always_simulated() {
        let lod = LodManager::new(LodConfig::default());
        assert!(lod.should_simulate_entity(10_000.0, 10_000.0, 85));
        assert!(!lod.should_simulate_entity(10_000.0, 10_000.0, 84));
    }

    #[test]
    fn promotion_overrides_distance_until_expiry() {
        let mut lod = LodManager::new(LodConfig::default());
        lod.set_current_tick(0);
        lod.promote_to_full_detail(1000.0, 1000.0, 5);
        assert_eq!(lod.get_detail_level(1000.0, 1000.0), DetailLevel::Full);

        lod.set_current_tick(5);
        assert_eq!(
            lod.get_detail_level(1000.0, 1000.0),
            DetailLevel::Abstract,
            "override with expires_at <= current_tick must be pruned"
        );
    }

    #[test]
    fn set_current_tick_prunes_expired_overrides() {
        let mut lod = LodManager::new(LodConfig::default());
        lod.promote_to_full_detail(1.0, 1.0, 3);
        lod.set_current_tick(10);
        assert!(lod.get_active_overrides().is_empty());
    }

    #[test]
    fn remove_and_clear_overrides() {
        let mut lod = LodManager::new(LodConfig::default());
        lod.promote_to_full_detail(1.0, 1.0, 100);
        lod.promote_to_full_detail(2.0, 2.0, 100);
        lod.remove_override(1.0, 1.0);
        assert_eq!(lod.get_active_overrides().len(), 1);
        lod.clear_overrides();
        assert!(lod.get_active_overrides().is_empty());
    }

    #[test]
    fn multiplier_values() {
        assert_eq!(DetailLevel::Full.multiplier(), 1.0);
        assert_eq!(DetailLevel::Reduced.multiplier(), 0.1);
        assert_eq!(DetailLevel::Abstract.multiplier(), 0.0);
    }

    #[test]
    fn set_focus_changes_distance() {
        let mut lod = LodManager::new(LodConfig::default());
        assert_eq!(lod.get_distance_from_focus(10.0, 0.0), 10.0);
        lod.set_focus(10.0, 0.0);
        assert_eq!(lod.get_distance_from_focus(10.0, 0.0), 0.0);
    }
}
