//! Simulation-wide parameters describing the domain, cosmology and units.

use crate::error::ValidationError;
use crate::runtime::ParamValue;

/// Domain, cosmology and unit parameters of one simulation step.
///
/// Handed to the registry once per analysis step; the registry keeps an
/// immutable snapshot until the next call replaces it.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationParameters {
    /// Name of the simulation code, used by the analysis side to pick a
    /// frontend.
    pub frontend: String,
    /// Basename for analysis output. A counter-derived default is assigned
    /// when `None`.
    pub fig_basename: Option<String>,
    /// Simulation time in code units.
    pub current_time: f64,
    /// Redshift. Forced to 0 for non-cosmological runs.
    pub current_redshift: f64,
    /// Dark-energy density parameter. Forced to 0 for non-cosmological runs.
    pub omega_lambda: f64,
    /// Matter density parameter. Forced to 0 for non-cosmological runs.
    pub omega_matter: f64,
    /// Dimensionless Hubble constant. Forced to 0 for non-cosmological runs.
    pub hubble_constant: f64,
    /// Length unit in cgs.
    pub length_unit: f64,
    /// Mass unit in cgs.
    pub mass_unit: f64,
    /// Time unit in cgs.
    pub time_unit: f64,
    /// Whether this is a cosmological simulation.
    pub cosmological_simulation: bool,
    /// Number of spatial dimensions, 1 to 3.
    pub dimensionality: i32,
    /// Lower corner of the simulation domain.
    pub domain_left_edge: [f64; 3],
    /// Upper corner of the simulation domain.
    pub domain_right_edge: [f64; 3],
    /// Periodic boundary flag per axis (0 or 1).
    pub periodicity: [i32; 3],
    /// Root-level cell count per axis.
    pub domain_dimensions: [i64; 3],
    /// Total number of grids across every process.
    pub num_grids: i64,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            frontend: String::new(),
            fig_basename: None,
            current_time: 0.0,
            current_redshift: 0.0,
            omega_lambda: 0.0,
            omega_matter: 0.0,
            hubble_constant: 0.0,
            length_unit: 1.0,
            mass_unit: 1.0,
            time_unit: 1.0,
            cosmological_simulation: false,
            dimensionality: 3,
            domain_left_edge: [0.0; 3],
            domain_right_edge: [1.0; 3],
            periodicity: [0; 3],
            domain_dimensions: [1; 3],
            num_grids: 0,
        }
    }
}

impl SimulationParameters {
    /// Zero the cosmology scalars of a non-cosmological run.
    ///
    /// Applied before validation; a normalization, never a failure.
    pub fn normalize(&mut self) {
        if !self.cosmological_simulation {
            self.current_redshift = 0.0;
            self.omega_lambda = 0.0;
            self.omega_matter = 0.0;
            self.hubble_constant = 0.0;
        }
    }

    /// Check every parameter in a fixed order; the first failure wins.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.frontend.trim().is_empty() {
            return Err(ValidationError::InvalidParameter {
                name: "frontend",
                reason: "must be a non-empty name".to_string(),
            });
        }
        if !(1..=3).contains(&self.dimensionality) {
            return Err(ValidationError::OutOfRange {
                field: "dimensionality",
                component: None,
                value: self.dimensionality.into(),
                requirement: "1, 2 or 3",
            });
        }
        if self.num_grids <= 0 {
            return Err(ValidationError::OutOfRange {
                field: "num_grids",
                component: None,
                value: self.num_grids,
                requirement: "> 0",
            });
        }
        if !self.current_time.is_finite() {
            return Err(ValidationError::InvalidFloat {
                field: "current_time",
                component: None,
                value: self.current_time,
                requirement: "finite",
            });
        }
        for (field, value) in [
            ("length_unit", self.length_unit),
            ("mass_unit", self.mass_unit),
            ("time_unit", self.time_unit),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ValidationError::InvalidFloat {
                    field,
                    component: None,
                    value,
                    requirement: "finite and > 0",
                });
            }
        }
        for d in 0..self.dimensionality as usize {
            let (left, right) = (self.domain_left_edge[d], self.domain_right_edge[d]);
            for (field, value) in [("domain_left_edge", left), ("domain_right_edge", right)] {
                if !value.is_finite() {
                    return Err(ValidationError::InvalidFloat {
                        field,
                        component: Some(d),
                        value,
                        requirement: "finite",
                    });
                }
            }
            if left >= right {
                return Err(ValidationError::InvalidFloat {
                    field: "domain_right_edge",
                    component: Some(d),
                    value: right,
                    requirement: "> domain_left_edge",
                });
            }
            if self.domain_dimensions[d] <= 0 {
                return Err(ValidationError::OutOfRange {
                    field: "domain_dimensions",
                    component: Some(d),
                    value: self.domain_dimensions[d],
                    requirement: "> 0",
                });
            }
        }
        for (d, &p) in self.periodicity.iter().enumerate() {
            if p != 0 && p != 1 {
                return Err(ValidationError::OutOfRange {
                    field: "periodicity",
                    component: Some(d),
                    value: p.into(),
                    requirement: "0 or 1",
                });
            }
        }
        for (field, value) in [
            ("current_redshift", self.current_redshift),
            ("omega_lambda", self.omega_lambda),
            ("omega_matter", self.omega_matter),
            ("hubble_constant", self.hubble_constant),
        ] {
            if !value.is_finite() {
                return Err(ValidationError::InvalidFloat {
                    field,
                    component: None,
                    value,
                    requirement: "finite",
                });
            }
        }
        Ok(())
    }

    /// Key/value pairs published into the runtime's `param` container.
    ///
    /// `fig_basename` is emitted only once it has been resolved.
    pub fn entries(&self) -> Vec<(&'static str, ParamValue)> {
        let mut out = vec![
            ("frontend", ParamValue::Text(self.frontend.clone())),
            ("current_time", ParamValue::Float(self.current_time)),
            ("current_redshift", ParamValue::Float(self.current_redshift)),
            ("omega_lambda", ParamValue::Float(self.omega_lambda)),
            ("omega_matter", ParamValue::Float(self.omega_matter)),
            ("hubble_constant", ParamValue::Float(self.hubble_constant)),
            ("length_unit", ParamValue::Float(self.length_unit)),
            ("mass_unit", ParamValue::Float(self.mass_unit)),
            ("time_unit", ParamValue::Float(self.time_unit)),
            (
                "cosmological_simulation",
                ParamValue::Int(i64::from(self.cosmological_simulation)),
            ),
            ("dimensionality", ParamValue::Int(self.dimensionality.into())),
            ("num_grids", ParamValue::Int(self.num_grids)),
            ("domain_left_edge", ParamValue::FloatVec3(self.domain_left_edge)),
            ("domain_right_edge", ParamValue::FloatVec3(self.domain_right_edge)),
            ("periodicity", ParamValue::IntVec3(self.periodicity.map(i64::from))),
            ("domain_dimensions", ParamValue::IntVec3(self.domain_dimensions)),
        ];
        if let Some(basename) = &self.fig_basename {
            out.push(("fig_basename", ParamValue::Text(basename.clone())));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn valid() -> SimulationParameters {
        SimulationParameters {
            frontend: "gamer".to_string(),
            num_grids: 4,
            ..SimulationParameters::default()
        }
    }

    #[test]
    fn valid_parameters_pass() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn empty_frontend_rejected() {
        let mut p = valid();
        p.frontend.clear();
        assert!(matches!(
            p.validate(),
            Err(ValidationError::InvalidParameter {
                name: "frontend",
                ..
            })
        ));
    }

    #[test]
    fn dimensionality_outside_one_to_three_rejected() {
        for dim in [0, 4, -1] {
            let mut p = valid();
            p.dimensionality = dim;
            match p.validate() {
                Err(ValidationError::OutOfRange {
                    field: "dimensionality",
                    ..
                }) => {}
                other => panic!("expected dimensionality error for {dim}, got {other:?}"),
            }
        }
    }

    #[test]
    fn zero_grids_rejected() {
        let mut p = valid();
        p.num_grids = 0;
        assert!(matches!(
            p.validate(),
            Err(ValidationError::OutOfRange {
                field: "num_grids",
                ..
            })
        ));
    }

    #[test]
    fn inverted_domain_rejected_only_within_dimensionality() {
        let mut p = valid();
        p.dimensionality = 1;
        p.domain_left_edge = [0.0, 5.0, 5.0];
        p.domain_right_edge = [1.0, 0.0, 0.0];
        assert!(p.validate().is_ok());

        p.dimensionality = 2;
        assert!(matches!(
            p.validate(),
            Err(ValidationError::InvalidFloat {
                field: "domain_right_edge",
                component: Some(1),
                ..
            })
        ));
    }

    #[test]
    fn periodicity_must_be_flag() {
        let mut p = valid();
        p.periodicity = [1, 2, 0];
        assert!(matches!(
            p.validate(),
            Err(ValidationError::OutOfRange {
                field: "periodicity",
                component: Some(1),
                ..
            })
        ));
    }

    #[test]
    fn normalize_zeroes_cosmology_only_when_not_cosmological() {
        let mut p = valid();
        p.current_redshift = 3.0;
        p.omega_lambda = 0.7;
        p.omega_matter = 0.3;
        p.hubble_constant = 0.7;

        let mut cosmo = p.clone();
        cosmo.cosmological_simulation = true;
        cosmo.normalize();
        assert_eq!(cosmo.current_redshift, 3.0);

        p.normalize();
        assert_eq!(
            [p.current_redshift, p.omega_lambda, p.omega_matter, p.hubble_constant],
            [0.0; 4]
        );
    }

    #[test]
    fn entries_include_basename_once_resolved() {
        let mut p = valid();
        assert!(p.entries().iter().all(|(k, _)| *k != "fig_basename"));
        p.fig_basename = Some("Fig000000000".to_string());
        assert!(p.entries().iter().any(|(k, _)| *k == "fig_basename"));
    }

    proptest! {
        #[test]
        fn nonpositive_units_always_rejected(unit in -1.0e6f64..=0.0) {
            let mut p = valid();
            p.mass_unit = unit;
            prop_assert!(p.validate().is_err());
        }
    }
}
