//! The parameter store: accepts, normalizes and publishes simulation
//! parameters, then triggers hierarchy allocation.

use amrlink_core::{ContainerHandle, RegistryError, Runtime, SimulationParameters};
use tracing::{debug, info, warn};

use crate::registry::{report, Registry};

/// Output basename assigned when the simulation supplies none.
///
/// `counter` is the number of earlier successful parameter updates.
pub fn default_basename(counter: u64) -> String {
    format!("Fig{counter:09}")
}

impl<R: Runtime> Registry<R> {
    /// Accept the parameters of the current step.
    ///
    /// Requires [`init`](Self::init). Re-setting parameters logs a warning
    /// and discards the previous hierarchy and every registered grid. The
    /// cosmology scalars of a non-cosmological run are zeroed before
    /// validation. On success the snapshot is published into `param` and
    /// fresh hierarchy arrays are allocated for `num_grids` grids; only then
    /// do parameters count as set.
    pub fn set_parameters(&mut self, params: SimulationParameters) -> Result<(), RegistryError> {
        self.try_set_parameters(params).inspect_err(report)
    }

    fn try_set_parameters(
        &mut self,
        mut params: SimulationParameters,
    ) -> Result<(), RegistryError> {
        let roots = self.roots("set_parameters")?;
        info!("setting simulation parameters");
        if self.state.parameters_set() {
            warn!("simulation parameters already set, overwriting and dropping registered grids");
        }

        params.normalize();
        params.validate().map_err(RegistryError::InvalidParameters)?;
        debug!("validating simulation parameters ... done");

        if params.fig_basename.is_none() {
            params.fig_basename = Some(default_basename(self.state.counter()));
        }
        debug!(?params, "accepted parameter snapshot");

        self.state.retract_parameters();
        self.publish(roots.param, &params)?;
        let num_grids = usize::try_from(params.num_grids).unwrap_or_default();
        self.params = Some(params);
        self.state.bump_counter();

        self.allocate_hierarchy(num_grids)?;
        self.state.mark_parameters_set(num_grids);
        info!(num_grids, "simulation parameters set, hierarchy allocated");
        Ok(())
    }

    fn publish(
        &mut self,
        container: ContainerHandle,
        params: &SimulationParameters,
    ) -> Result<(), RegistryError> {
        self.runtime.clear_container(container)?;
        for (key, value) in params.entries() {
            self.runtime.set_param(container, key, &value)?;
        }
        debug!("publishing parameters ... done");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amrlink_core::{ErrorKind, ParamValue, ValidationError};
    use amrlink_test_utils::{params_1d, params_3d, MemoryRuntime};

    use crate::config::RegistryConfig;
    use crate::state::Phase;

    fn initialized() -> Registry<MemoryRuntime> {
        let mut reg = Registry::new(RegistryConfig::default(), MemoryRuntime::new()).unwrap();
        reg.init().unwrap();
        reg
    }

    #[test]
    fn basename_is_zero_padded() {
        assert_eq!(default_basename(0), "Fig000000000");
        assert_eq!(default_basename(42), "Fig000000042");
    }

    #[test]
    fn set_parameters_before_init_is_sequence_error() {
        let mut reg = Registry::new(RegistryConfig::default(), MemoryRuntime::new()).unwrap();
        match reg.set_parameters(params_3d(2)) {
            Err(RegistryError::NotInitialized {
                operation: "set_parameters",
            }) => {}
            other => panic!("expected NotInitialized, got {other:?}"),
        }
        assert!(!reg.runtime().has_root("param"));
    }

    #[test]
    fn invalid_parameters_publish_nothing() {
        let mut reg = initialized();
        let mut p = params_3d(2);
        p.dimensionality = 4;
        let err = reg.set_parameters(p).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(matches!(
            err,
            RegistryError::InvalidParameters(ValidationError::OutOfRange {
                field: "dimensionality",
                ..
            })
        ));
        assert_eq!(reg.runtime().root_len("param"), Some(0));
        assert_eq!(reg.runtime().root_len("hierarchy"), Some(0));
        assert_eq!(reg.state().phase(), Phase::Initialized);
        assert_eq!(reg.state().counter(), 0);
    }

    #[test]
    fn publishes_snapshot_and_default_basename() {
        let mut reg = initialized();
        reg.set_parameters(params_1d(2)).unwrap();
        let rt = reg.runtime();
        assert_eq!(rt.param("frontend"), Some(&ParamValue::Text("gamer".into())));
        assert_eq!(rt.param("dimensionality"), Some(&ParamValue::Int(1)));
        assert_eq!(
            rt.param("domain_right_edge"),
            Some(&ParamValue::FloatVec3([1.0, 0.0, 0.0]))
        );
        assert_eq!(
            rt.param("fig_basename"),
            Some(&ParamValue::Text("Fig000000000".into()))
        );
        assert_eq!(reg.parameters().map(|p| p.num_grids), Some(2));
        assert_eq!(reg.grid_set(), [false, false]);
    }

    #[test]
    fn supplied_basename_is_kept() {
        let mut reg = initialized();
        let mut p = params_3d(1);
        p.fig_basename = Some("Run7".to_string());
        reg.set_parameters(p).unwrap();
        assert_eq!(
            reg.runtime().param("fig_basename"),
            Some(&ParamValue::Text("Run7".into()))
        );
    }

    #[test]
    fn default_basename_advances_per_successful_call() {
        let mut reg = initialized();
        reg.set_parameters(params_3d(1)).unwrap();
        let mut bad = params_3d(1);
        bad.num_grids = 0;
        assert!(reg.set_parameters(bad).is_err());
        reg.set_parameters(params_3d(1)).unwrap();
        assert_eq!(
            reg.parameters().and_then(|p| p.fig_basename.as_deref()),
            Some("Fig000000001")
        );
    }

    #[test]
    fn non_cosmological_run_publishes_zero_cosmology() {
        let mut reg = initialized();
        let mut p = params_3d(1);
        p.current_redshift = 2.5;
        p.omega_matter = 0.3;
        p.hubble_constant = f64::NAN;
        reg.set_parameters(p).unwrap();
        let rt = reg.runtime();
        for key in [
            "current_redshift",
            "omega_lambda",
            "omega_matter",
            "hubble_constant",
        ] {
            assert_eq!(rt.param(key), Some(&ParamValue::Float(0.0)), "{key}");
        }
        assert_eq!(rt.param("cosmological_simulation"), Some(&ParamValue::Int(0)));
    }

    #[test]
    fn allocation_failure_leaves_parameters_unset() {
        let mut rt = MemoryRuntime::new();
        rt.fail_array_creation_at(3);
        let mut reg = Registry::new(RegistryConfig::default(), rt).unwrap();
        reg.init().unwrap();
        match reg.set_parameters(params_3d(4)) {
            Err(RegistryError::Allocation {
                key: "grid_particle_count",
                ..
            }) => {}
            other => panic!("expected Allocation on grid_particle_count, got {other:?}"),
        }
        assert!(!reg.state().parameters_set());
        assert!(reg.parameters().is_none());
        assert!(reg.grid_set().is_empty());
        assert_eq!(reg.runtime().live_handles(), (3, 0));
    }
}
