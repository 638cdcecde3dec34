//! Lifecycle and per-grid registration flags.

/// Where the registry is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// No runtime containers exist yet.
    #[default]
    Uninitialized,
    /// `param`, `hierarchy` and `grid_data` exist; no parameters accepted.
    Initialized,
    /// Parameters accepted and the hierarchy allocated; grids may be added.
    ParametersSet,
}

/// Registration progress of one [`Registry`](crate::Registry).
///
/// `grid_set` has exactly `num_grids` entries once parameters are set and
/// is empty before.
#[derive(Clone, Debug, Default)]
pub struct RegistrationState {
    phase: Phase,
    grid_set: Vec<bool>,
    counter: u64,
}

impl RegistrationState {
    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether [`init`](crate::Registry::init) has run.
    pub fn is_initialized(&self) -> bool {
        self.phase >= Phase::Initialized
    }

    /// Whether parameters were accepted and the hierarchy allocated.
    pub fn parameters_set(&self) -> bool {
        self.phase == Phase::ParametersSet
    }

    /// One flag per global grid id.
    pub fn grid_set(&self) -> &[bool] {
        &self.grid_set
    }

    /// Number of successful parameter updates so far.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Whether grid `id` is registered. Out-of-range ids are not.
    pub fn is_set(&self, id: i64) -> bool {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.grid_set.get(i).copied())
            .unwrap_or(false)
    }

    /// Ids whose flag is still `false`, ascending.
    pub fn unregistered_ids(&self) -> Vec<i64> {
        self.grid_set
            .iter()
            .enumerate()
            .filter(|(_, set)| !**set)
            .map(|(i, _)| i as i64)
            .collect()
    }

    pub(crate) fn mark_initialized(&mut self) {
        self.phase = Phase::Initialized;
    }

    /// Forget the current parameters until the next allocation succeeds.
    pub(crate) fn retract_parameters(&mut self) {
        if self.phase == Phase::ParametersSet {
            self.phase = Phase::Initialized;
        }
        self.grid_set.clear();
    }

    pub(crate) fn bump_counter(&mut self) {
        self.counter += 1;
    }

    pub(crate) fn mark_parameters_set(&mut self, num_grids: usize) {
        self.grid_set = vec![false; num_grids];
        self.phase = Phase::ParametersSet;
    }

    pub(crate) fn mark_set(&mut self, row: usize) {
        if let Some(flag) = self.grid_set.get_mut(row) {
            *flag = true;
        }
    }
}
