//! Conductor Material and Connection Catalogs
//!
//! Thermal constants for grid conductor materials (IEEE Std 80-2013,
//! Table 1) and the maximum allowable temperature of each joint type.
//! Both catalogs are fixed reference data looked up by string id.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::{CalcError, CalcResult};

/// Thermal and electrical constants of a conductor material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConductorMaterial {
    /// Catalog id (e.g., "copper_annealed")
    pub id: String,
    /// Display name
    pub name: String,
    /// Thermal coefficient of resistivity at 20 °C (1/°C)
    pub alpha20: f64,
    /// Fusing temperature (°C)
    pub melting_temp_c: f64,
    /// Resistivity at 20 °C (μΩ·cm)
    pub rho20: f64,
    /// Thermal capacity per unit volume (J/(cm³·°C))
    pub tcap: f64,
}

impl ConductorMaterial {
    fn entry(id: &str, name: &str, alpha20: f64, melting_temp_c: f64, rho20: f64, tcap: f64) -> Self {
        ConductorMaterial {
            id: id.to_string(),
            name: name.to_string(),
            alpha20,
            melting_temp_c,
            rho20,
            tcap,
        }
    }
}

/// A joint type and the highest temperature it tolerates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionType {
    /// Catalog id (e.g., "exothermic")
    pub id: String,
    /// Display name
    pub name: String,
    /// Maximum allowable temperature (°C)
    pub max_temp_c: f64,
}

impl ConnectionType {
    fn entry(id: &str, name: &str, max_temp_c: f64) -> Self {
        ConnectionType {
            id: id.to_string(),
            name: name.to_string(),
            max_temp_c,
        }
    }
}

/// Default material for new designs
pub const DEFAULT_MATERIAL_ID: &str = "copper_annealed";

/// Default connection for new designs
pub const DEFAULT_CONNECTION_ID: &str = "exothermic";

static MATERIALS: Lazy<Vec<ConductorMaterial>> = Lazy::new(|| {
    vec![
        ConductorMaterial::entry("copper_annealed", "Copper, annealed soft-drawn", 0.00393, 1083.0, 1.72, 3.42),
        ConductorMaterial::entry("copper_hard_drawn", "Copper, commercial hard-drawn", 0.00381, 1084.0, 1.78, 3.42),
        ConductorMaterial::entry("copper_clad_steel_40", "Copper-clad steel wire, 40% conductivity", 0.00378, 1084.0, 4.40, 3.85),
        ConductorMaterial::entry("copper_clad_steel_30", "Copper-clad steel wire, 30% conductivity", 0.00378, 1084.0, 5.86, 3.85),
        ConductorMaterial::entry("aluminum_ec", "Aluminum, EC grade", 0.00403, 657.0, 2.86, 2.56),
        ConductorMaterial::entry("aluminum_5005", "Aluminum, 5005 alloy", 0.00353, 652.0, 3.22, 2.60),
        ConductorMaterial::entry("aluminum_6201", "Aluminum, 6201 alloy", 0.00347, 654.0, 3.28, 2.60),
        ConductorMaterial::entry("aluminum_clad_steel", "Aluminum-clad steel wire", 0.00360, 657.0, 8.48, 3.58),
        ConductorMaterial::entry("steel_1020", "Steel, 1020", 0.00160, 1510.0, 15.90, 3.28),
        ConductorMaterial::entry("stainless_clad_steel", "Stainless-clad steel rod", 0.00160, 1400.0, 17.50, 4.44),
        ConductorMaterial::entry("zinc_coated_steel", "Zinc-coated steel rod", 0.00320, 419.0, 20.10, 3.93),
        ConductorMaterial::entry("stainless_304", "Stainless steel, 304", 0.00130, 1400.0, 72.00, 4.03),
    ]
});

static CONNECTIONS: Lazy<Vec<ConnectionType>> = Lazy::new(|| {
    vec![
        ConnectionType::entry("exothermic", "Exothermic weld", 850.0),
        ConnectionType::entry("brazed", "Brazed", 450.0),
        ConnectionType::entry("compression", "Compression (irreversible)", 350.0),
        ConnectionType::entry("bolted", "Bolted / mechanical clamp", 250.0),
    ]
});

static MATERIAL_INDEX: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    MATERIALS
        .iter()
        .enumerate()
        .map(|(i, m)| (m.id.as_str(), i))
        .collect()
});

static CONNECTION_INDEX: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    CONNECTIONS
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id.as_str(), i))
        .collect()
});

/// All conductor materials in catalog order
pub fn conductor_materials() -> &'static [ConductorMaterial] {
    &MATERIALS
}

/// All connection types in catalog order
pub fn connection_types() -> &'static [ConnectionType] {
    &CONNECTIONS
}

/// Look up a conductor material by id.
///
/// # Example
/// ```rust
/// use grid_core::materials::lookup_material;
///
/// let cu = lookup_material("copper_annealed").unwrap();
/// assert_eq!(cu.melting_temp_c, 1083.0);
/// assert!(lookup_material("unobtainium").is_err());
/// ```
pub fn lookup_material(id: &str) -> CalcResult<&'static ConductorMaterial> {
    MATERIAL_INDEX
        .get(id)
        .map(|&i| &MATERIALS[i])
        .ok_or_else(|| CalcError::material_not_found(id))
}

/// Look up a connection type by id.
pub fn lookup_connection(id: &str) -> CalcResult<&'static ConnectionType> {
    CONNECTION_INDEX
        .get(id)
        .map(|&i| &CONNECTIONS[i])
        .ok_or_else(|| CalcError::connection_not_found(id))
}

/// Highest temperature the conductor may reach during the fault:
/// the lower of the joint limit and the material's fusing point.
pub fn max_design_temperature(material: &ConductorMaterial, connection: &ConnectionType) -> f64 {
    connection.max_temp_c.min(material.melting_temp_c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_unique() {
        assert_eq!(MATERIAL_INDEX.len(), conductor_materials().len());
        assert_eq!(CONNECTION_INDEX.len(), connection_types().len());
    }

    #[test]
    fn test_defaults_present() {
        assert!(lookup_material(DEFAULT_MATERIAL_ID).is_ok());
        assert!(lookup_connection(DEFAULT_CONNECTION_ID).is_ok());
    }

    #[test]
    fn test_lookup_errors() {
        let err = lookup_material("gold").unwrap_err();
        assert_eq!(err.error_code(), "MATERIAL_NOT_FOUND");
        let err = lookup_connection("glue").unwrap_err();
        assert_eq!(err.error_code(), "CONNECTION_NOT_FOUND");
    }

    #[test]
    fn test_all_materials_physical() {
        for m in conductor_materials() {
            assert!(m.alpha20 > 0.0, "{} alpha20", m.id);
            assert!(m.rho20 > 0.0, "{} rho20", m.id);
            assert!(m.tcap > 0.0, "{} tcap", m.id);
            assert!(m.melting_temp_c > 400.0, "{} melting point", m.id);
        }
    }

    #[test]
    fn test_max_design_temperature() {
        let cu = lookup_material("copper_annealed").unwrap();
        let weld = lookup_connection("exothermic").unwrap();
        let bolted = lookup_connection("bolted").unwrap();
        assert_eq!(max_design_temperature(cu, weld), 850.0);
        assert_eq!(max_design_temperature(cu, bolted), 250.0);

        // Zinc melts before the weld limit is reached
        let zinc = lookup_material("zinc_coated_steel").unwrap();
        assert_eq!(max_design_temperature(zinc, weld), 419.0);
    }
}
