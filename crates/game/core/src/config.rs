/// Ledger configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LedgerConfig {
    /// Initial current health; clamped into `[0, default_max_health]`.
    pub default_health: f32,
    pub default_max_health: f32,
    /// Initial current mana; clamped into `[0, default_max_mana]`.
    pub default_mana: f32,
    pub default_max_mana: f32,
    /// Number of quick-bar slots offered to equippable pickups.
    pub quick_bar_slots: usize,
    /// Honor god-mode / unlimited-resource markers.
    pub cheats_enabled: bool,
    /// Depleting health starts the death sequence.
    pub death_on_health_depleted: bool,
}

impl LedgerConfig {
    // ===== compile-time constants =====
    /// Upper bound for `quick_bar_slots`; backs fixed-capacity slot storage.
    pub const MAX_QUICK_BAR_SLOTS: usize = 10;
    /// `max` members are never stored below this value.
    pub const MIN_MAX_VALUE: f32 = 1.0;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_RESOURCE: f32 = 100.0;
    pub const DEFAULT_QUICK_BAR_SLOTS: usize = 3;

    pub fn new() -> Self {
        Self {
            default_health: Self::DEFAULT_RESOURCE,
            default_max_health: Self::DEFAULT_RESOURCE,
            default_mana: Self::DEFAULT_RESOURCE,
            default_max_mana: Self::DEFAULT_RESOURCE,
            quick_bar_slots: Self::DEFAULT_QUICK_BAR_SLOTS,
            cheats_enabled: true,
            death_on_health_depleted: true,
        }
    }

    /// Quick-bar size limited to [`Self::MAX_QUICK_BAR_SLOTS`].
    pub fn effective_quick_bar_slots(&self) -> usize {
        self.quick_bar_slots.min(Self::MAX_QUICK_BAR_SLOTS)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::new()
    }
}
