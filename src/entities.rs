// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The entity kinds a [Grid][crate::Grid] can hold, their schemas, and the
//! static registry of their foreign-key columns.

mod schemas;
mod traits;

pub use schemas::SUBSTATION_NODE;
pub use traits::{Branch3Ends, BranchEnds, HasFromTo, HasStatus, HasThreeTerminals};

use crate::store::{ColumnStore, Schema};
use crate::Error;

/// The kind of an entity, which decides the store it lives in.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Node,
    Line,
    AsymLine,
    Link,
    GenericBranch,
    Transformer,
    ThreeWindingTransformer,
    SymLoad,
    AsymLoad,
    SymGen,
    AsymGen,
    Source,
    Shunt,
    SymPowerSensor,
    AsymPowerSensor,
    SymVoltageSensor,
    AsymVoltageSensor,
    SymCurrentSensor,
    AsymCurrentSensor,
    TransformerTapRegulator,
    VoltageRegulator,
    Fault,
    /// A user-defined kind, named by the given string.
    Custom(String),
}

/// The broad category of an entity kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Node,
    /// Two-terminal branches.
    Branch,
    /// Three-terminal branches.
    Branch3,
    Appliance,
    Sensor,
    Regulator,
    Fault,
    Custom,
}

/// Every standard entity kind, in the order a grid holds them.
pub static STANDARD_KINDS: [EntityKind; 22] = [
    EntityKind::Node,
    EntityKind::Line,
    EntityKind::AsymLine,
    EntityKind::Link,
    EntityKind::GenericBranch,
    EntityKind::Transformer,
    EntityKind::ThreeWindingTransformer,
    EntityKind::SymLoad,
    EntityKind::AsymLoad,
    EntityKind::SymGen,
    EntityKind::AsymGen,
    EntityKind::Source,
    EntityKind::Shunt,
    EntityKind::SymPowerSensor,
    EntityKind::AsymPowerSensor,
    EntityKind::SymVoltageSensor,
    EntityKind::AsymVoltageSensor,
    EntityKind::SymCurrentSensor,
    EntityKind::AsymCurrentSensor,
    EntityKind::TransformerTapRegulator,
    EntityKind::VoltageRegulator,
    EntityKind::Fault,
];

impl EntityKind {
    /// Returns the name of the kind, which is also the name of its store.
    pub fn name(&self) -> &str {
        use EntityKind::*;

        match self {
            Node => "node",
            Line => "line",
            AsymLine => "asym_line",
            Link => "link",
            GenericBranch => "generic_branch",
            Transformer => "transformer",
            ThreeWindingTransformer => "three_winding_transformer",
            SymLoad => "sym_load",
            AsymLoad => "asym_load",
            SymGen => "sym_gen",
            AsymGen => "asym_gen",
            Source => "source",
            Shunt => "shunt",
            SymPowerSensor => "sym_power_sensor",
            AsymPowerSensor => "asym_power_sensor",
            SymVoltageSensor => "sym_voltage_sensor",
            AsymVoltageSensor => "asym_voltage_sensor",
            SymCurrentSensor => "sym_current_sensor",
            AsymCurrentSensor => "asym_current_sensor",
            TransformerTapRegulator => "transformer_tap_regulator",
            VoltageRegulator => "voltage_regulator",
            Fault => "fault",
            Custom(name) => name,
        }
    }

    /// Returns the kind with the given store name.  Unknown names are custom
    /// kinds.
    pub fn from_name(name: &str) -> EntityKind {
        STANDARD_KINDS
            .iter()
            .find(|k| k.name() == name)
            .cloned()
            .unwrap_or_else(|| EntityKind::Custom(name.to_string()))
    }

    pub fn category(&self) -> Category {
        use EntityKind::*;

        match self {
            Node => Category::Node,
            Line | AsymLine | Link | GenericBranch | Transformer => Category::Branch,
            ThreeWindingTransformer => Category::Branch3,
            SymLoad | AsymLoad | SymGen | AsymGen | Source | Shunt => Category::Appliance,
            SymPowerSensor | AsymPowerSensor | SymVoltageSensor | AsymVoltageSensor
            | SymCurrentSensor | AsymCurrentSensor => Category::Sensor,
            TransformerTapRegulator | VoltageRegulator => Category::Regulator,
            Fault => Category::Fault,
            Custom(_) => Category::Custom,
        }
    }

    pub fn is_branch(&self) -> bool {
        self.category() == Category::Branch
    }

    pub fn is_branch3(&self) -> bool {
        self.category() == Category::Branch3
    }

    pub fn is_appliance(&self) -> bool {
        self.category() == Category::Appliance
    }

    /// Returns the standard schema of the kind, or `None` for custom kinds.
    pub fn schema(&self) -> Option<Schema> {
        schemas::schema_of(self)
    }

    /// Returns the columns, other than `id`, that hold ids of other entities.
    ///
    /// Custom kinds are not in the registry and return `None`.
    pub fn foreign_keys(&self) -> Option<&'static [&'static str]> {
        use EntityKind::*;

        const NODE: &[&str] = &["feeder_branch_id", "feeder_node_id"];
        const BRANCH: &[&str] = &["from_node", "to_node", "feeder_branch_id", "feeder_node_id"];
        const BRANCH3: &[&str] = &["node_1", "node_2", "node_3"];
        const APPLIANCE: &[&str] = &["node"];
        const SENSOR: &[&str] = &["measured_object"];
        const REGULATOR: &[&str] = &["regulated_object"];
        const FAULT: &[&str] = &["fault_object"];

        match self {
            Node => Some(NODE),
            Line | AsymLine | Link | GenericBranch | Transformer => Some(BRANCH),
            ThreeWindingTransformer => Some(BRANCH3),
            SymLoad | AsymLoad | SymGen | AsymGen | Source | Shunt => Some(APPLIANCE),
            SymPowerSensor | AsymPowerSensor | SymVoltageSensor | AsymVoltageSensor
            | SymCurrentSensor | AsymCurrentSensor => Some(SENSOR),
            TransformerTapRegulator | VoltageRegulator => Some(REGULATOR),
            Fault => Some(FAULT),
            Custom(_) => None,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Returns the columns every two-terminal branch kind shares.
pub(crate) fn generic_branch_schema() -> Schema {
    schemas::branch()
}

/// Reads the two-terminal branches of a store.
pub(crate) fn branch_ends(store: &ColumnStore) -> Result<Vec<BranchEnds>, Error> {
    let ids = store.ids()?;
    let from = store.i32s("from_node")?;
    let to = store.i32s("to_node")?;
    let from_status = store.i8s("from_status")?;
    let to_status = store.i8s("to_status")?;
    Ok((0..store.len())
        .map(|i| BranchEnds {
            id: ids[i],
            from_node: from[i],
            to_node: to[i],
            from_status: from_status[i],
            to_status: to_status[i],
        })
        .collect())
}

/// Reads the three-terminal branches of a store.
pub(crate) fn branch3_ends(store: &ColumnStore) -> Result<Vec<Branch3Ends>, Error> {
    let ids = store.ids()?;
    let nodes = [store.i32s("node_1")?, store.i32s("node_2")?, store.i32s("node_3")?];
    let statuses = [
        store.i8s("status_1")?,
        store.i8s("status_2")?,
        store.i8s("status_3")?,
    ];
    Ok((0..store.len())
        .map(|i| Branch3Ends {
            id: ids[i],
            nodes: [nodes[0][i], nodes[1][i], nodes[2][i]],
            statuses: [statuses[0][i], statuses[1][i], statuses[2][i]],
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ColumnStore;

    #[test]
    fn test_names_round_trip() {
        for kind in &STANDARD_KINDS {
            assert_eq!(&EntityKind::from_name(kind.name()), kind);
        }
        assert_eq!(
            EntityKind::from_name("battery"),
            EntityKind::Custom("battery".to_string())
        );
    }

    #[test]
    fn test_registry_matches_schemas() -> Result<(), Error> {
        for kind in &STANDARD_KINDS {
            let schema = kind.schema().ok_or_else(|| Error::internal("no schema"))?;
            schema.validate()?;
            assert!(schema.has_column("id"), "{kind} has no id column");
            for fk in kind.foreign_keys().unwrap_or_default() {
                assert!(schema.has_column(fk), "{kind} has no column {fk}");
            }
            // Every schema must be able to produce placeholder rows.
            assert_eq!(ColumnStore::empty(schema, 2)?.len(), 2);
        }
        assert!(EntityKind::Custom("x".into()).foreign_keys().is_none());
        assert!(EntityKind::Custom("x".into()).schema().is_none());
        Ok(())
    }

    #[test]
    fn test_categories() {
        assert!(EntityKind::Link.is_branch());
        assert!(EntityKind::ThreeWindingTransformer.is_branch3());
        assert!(EntityKind::Shunt.is_appliance());
        assert_eq!(EntityKind::AsymCurrentSensor.category(), Category::Sensor);
        assert_eq!(EntityKind::Custom("x".into()).category(), Category::Custom);
    }
}
