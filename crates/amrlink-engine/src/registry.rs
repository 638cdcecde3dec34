//! The registration context object.

use amrlink_core::{ContainerHandle, RegistryError, Runtime, SimulationParameters};
use tracing::{error, info, warn};

use crate::config::{ConfigError, RegistryConfig};
use crate::hierarchy::{HierarchyColumn, HierarchyTable};
use crate::state::RegistrationState;

/// Top-level container holding the published parameters.
pub const PARAM_CONTAINER: &str = "param";
/// Top-level container holding the hierarchy arrays.
pub const HIERARCHY_CONTAINER: &str = "hierarchy";
/// Top-level container holding `grid_data[grid_id][label]` field views.
pub const GRID_DATA_CONTAINER: &str = "grid_data";

/// Handles of the three top-level containers, held for the registry's
/// lifetime.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Roots {
    pub(crate) param: ContainerHandle,
    pub(crate) hierarchy: ContainerHandle,
    pub(crate) grid_data: ContainerHandle,
}

/// Registration state for one simulation, bound to one runtime.
///
/// Driven from a single control thread: every mutating entry point takes
/// `&mut self`. A step runs [`init`](Self::init) once, then
/// [`set_parameters`](Self::set_parameters), then
/// [`add_grid`](Self::add_grid) for every local grid. Every failure is
/// logged at error level before it is returned.
pub struct Registry<R: Runtime> {
    pub(crate) config: RegistryConfig,
    pub(crate) runtime: R,
    pub(crate) state: RegistrationState,
    pub(crate) params: Option<SimulationParameters>,
    pub(crate) roots: Option<Roots>,
    pub(crate) hierarchy: Option<HierarchyTable>,
}

impl<R: Runtime> Registry<R> {
    /// Validate `config` and bind a registry to `runtime`.
    ///
    /// Nothing is created in the runtime until [`init`](Self::init).
    pub fn new(config: RegistryConfig, runtime: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            runtime,
            state: RegistrationState::default(),
            params: None,
            roots: None,
            hierarchy: None,
        })
    }

    /// Create the `param`, `hierarchy` and `grid_data` containers.
    ///
    /// A second call logs a warning and does nothing.
    pub fn init(&mut self) -> Result<(), RegistryError> {
        if self.state.is_initialized() {
            warn!("runtime already initialized, ignoring repeated init()");
            return Ok(());
        }
        info!(
            script = %self.config.script,
            module = %self.config.module_name,
            "initializing runtime containers"
        );
        self.create_roots().inspect_err(report)
    }

    fn create_roots(&mut self) -> Result<(), RegistryError> {
        let mut create = |key: &'static str| {
            self.runtime
                .create_container(key)
                .map_err(|reason| RegistryError::Allocation { key, reason })
        };
        let roots = Roots {
            param: create(PARAM_CONTAINER)?,
            hierarchy: create(HIERARCHY_CONTAINER)?,
            grid_data: create(GRID_DATA_CONTAINER)?,
        };
        self.roots = Some(roots);
        self.state.mark_initialized();
        Ok(())
    }

    // ── Accessors ──────────────────────────────────────────────────

    /// The configuration this registry was built with.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Lifecycle and registration flags.
    pub fn state(&self) -> &RegistrationState {
        &self.state
    }

    /// The accepted parameter snapshot, if any.
    pub fn parameters(&self) -> Option<&SimulationParameters> {
        self.params.as_ref().filter(|_| self.state.parameters_set())
    }

    /// Handles of the current hierarchy arrays, once allocated.
    pub fn hierarchy(&self) -> Option<&HierarchyTable> {
        self.hierarchy.as_ref()
    }

    /// The runtime the registry publishes into.
    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Mutable access to the runtime, e.g. to run analysis once the
    /// hierarchy is complete.
    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }

    /// Unbind the runtime, dropping all registration state.
    pub fn into_runtime(self) -> R {
        self.runtime
    }

    // ── Completion queries ─────────────────────────────────────────

    /// One flag per global grid id; empty before parameters are set.
    pub fn grid_set(&self) -> &[bool] {
        self.state.grid_set()
    }

    /// Whether grid `id` has been registered.
    pub fn is_registered(&self, id: i64) -> bool {
        self.state.is_set(id)
    }

    /// Ids not yet registered, ascending.
    pub fn unregistered_ids(&self) -> Vec<i64> {
        self.state.unregistered_ids()
    }

    /// Fail unless every grid declared by `num_grids` has been registered.
    pub fn ensure_complete(&self) -> Result<(), RegistryError> {
        let result = if !self.state.is_initialized() {
            Err(RegistryError::NotInitialized {
                operation: "ensure_complete",
            })
        } else if !self.state.parameters_set() {
            Err(RegistryError::ParametersNotSet {
                operation: "ensure_complete",
            })
        } else {
            let missing = self.state.unregistered_ids();
            if missing.is_empty() {
                Ok(())
            } else {
                Err(RegistryError::IncompleteHierarchy { missing })
            }
        };
        result.inspect_err(report)
    }

    pub(crate) fn roots(&self, operation: &'static str) -> Result<Roots, RegistryError> {
        self.roots.ok_or(RegistryError::NotInitialized { operation })
    }

    /// Release every array handle of the current hierarchy table.
    pub(crate) fn drop_hierarchy(&mut self) {
        if let Some(table) = self.hierarchy.take() {
            for column in HierarchyColumn::ALL {
                self.runtime.release_array(table.array(column));
            }
        }
    }
}

/// Log a failure before it is handed back to the caller.
pub(crate) fn report(err: &RegistryError) {
    error!(kind = ?err.kind(), "{err}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use amrlink_core::ErrorKind;
    use amrlink_test_utils::MemoryRuntime;

    fn registry() -> Registry<MemoryRuntime> {
        Registry::new(RegistryConfig::default(), MemoryRuntime::new()).unwrap()
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = RegistryConfig::with_script("");
        match Registry::new(config, MemoryRuntime::new()) {
            Err(ConfigError::EmptyScript) => {}
            Err(other) => panic!("expected EmptyScript, got {other:?}"),
            Ok(_) => panic!("expected EmptyScript, got a registry"),
        }
    }

    #[test]
    fn init_creates_three_containers() {
        let mut reg = registry();
        reg.init().unwrap();
        let rt = reg.runtime();
        for name in [PARAM_CONTAINER, HIERARCHY_CONTAINER, GRID_DATA_CONTAINER] {
            assert_eq!(rt.root_len(name), Some(0), "{name}");
        }
        assert!(reg.state().is_initialized());
    }

    #[test]
    fn repeated_init_is_noop() {
        let mut reg = registry();
        reg.init().unwrap();
        reg.init().unwrap();
        assert_eq!(reg.runtime().live_handles(), (3, 0));
    }

    #[test]
    fn ensure_complete_before_parameters_is_sequence_error() {
        let mut reg = registry();
        reg.init().unwrap();
        let err = reg.ensure_complete().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Sequence);
    }

    #[test]
    fn queries_are_empty_before_parameters() {
        let reg = registry();
        assert!(reg.grid_set().is_empty());
        assert!(reg.unregistered_ids().is_empty());
        assert!(!reg.is_registered(0));
        assert!(reg.parameters().is_none());
        assert!(reg.hierarchy().is_none());
    }
}
