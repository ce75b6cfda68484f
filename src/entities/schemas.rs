// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Column schemas of the standard entity kinds.

use crate::store::{DType, Schema, Value};
use crate::EMPTY_ID;

use super::EntityKind;

/// Node type of substation nodes, which feed the grid.
pub const SUBSTATION_NODE: i8 = 1;

fn floats(schema: Schema, names: &[&str]) -> Schema {
    names.iter().fold(schema, |s, n| s.column(n, DType::Float64))
}

fn empty_floats(schema: Schema, names: &[&str]) -> Schema {
    names
        .iter()
        .fold(schema, |s, n| s.defaulted(n, DType::Float64, f64::NAN))
}

fn phase_floats(schema: Schema, names: &[&str]) -> Schema {
    names.iter().fold(schema, |s, n| s.column(n, DType::Float64x3))
}

fn int8s(schema: Schema, names: &[&str]) -> Schema {
    names.iter().fold(schema, |s, n| s.column(n, DType::Int8))
}

pub(crate) fn node() -> Schema {
    Schema::with_id()
        .column("u_rated", DType::Float64)
        .defaulted("node_type", DType::Int8, 0i8)
        .defaulted("feeder_branch_id", DType::Int32, EMPTY_ID)
        .defaulted("feeder_node_id", DType::Int32, EMPTY_ID)
}

/// The columns every two-terminal branch kind has.
pub(crate) fn branch() -> Schema {
    Schema::with_id()
        .column("from_node", DType::Int32)
        .column("to_node", DType::Int32)
        .column("from_status", DType::Int8)
        .column("to_status", DType::Int8)
        .defaulted("feeder_branch_id", DType::Int32, EMPTY_ID)
        .defaulted("feeder_node_id", DType::Int32, EMPTY_ID)
        .defaulted("is_feeder", DType::Bool, false)
}

fn line() -> Schema {
    floats(branch(), &["r1", "x1", "c1", "tan1", "i_n"])
}

fn generic_branch() -> Schema {
    floats(branch(), &["r1", "x1", "g1", "b1"])
        .defaulted("k", DType::Float64, 1.0)
        .defaulted("theta", DType::Float64, 0.0)
        .defaulted("sn", DType::Float64, 0.0)
}

fn transformer() -> Schema {
    let schema = floats(branch(), &["u1", "u2", "sn", "tap_size", "uk", "pk", "i0", "p0"]);
    int8s(
        schema,
        &[
            "winding_from",
            "winding_to",
            "clock",
            "tap_side",
            "tap_pos",
            "tap_min",
            "tap_max",
            "tap_nom",
        ],
    )
}

fn asym_line() -> Schema {
    let schema = floats(
        branch(),
        &[
            "r_aa", "r_ba", "r_bb", "r_ca", "r_cb", "r_cc", "x_aa", "x_ba", "x_bb", "x_ca", "x_cb",
            "x_cc",
        ],
    );
    empty_floats(
        schema,
        &[
            "r_na", "r_nb", "r_nc", "r_nn", "x_na", "x_nb", "x_nc", "x_nn", "c_aa", "c_ba", "c_bb",
            "c_ca", "c_cb", "c_cc", "c0", "c1", "i_n",
        ],
    )
}

fn three_winding_transformer() -> Schema {
    let schema = Schema::with_id()
        .column("node_1", DType::Int32)
        .column("node_2", DType::Int32)
        .column("node_3", DType::Int32);
    let schema = int8s(schema, &["status_1", "status_2", "status_3"]);
    let schema = floats(
        schema,
        &[
            "u1", "u2", "u3", "sn_1", "sn_2", "sn_3", "uk_12", "uk_13", "uk_23", "pk_12", "pk_13",
            "pk_23", "i0", "p0",
        ],
    );
    let schema = int8s(
        schema,
        &[
            "winding_1",
            "winding_2",
            "winding_3",
            "clock_12",
            "clock_13",
            "tap_side",
            "tap_pos",
            "tap_min",
            "tap_max",
            "tap_nom",
        ],
    );
    empty_floats(
        schema.column("tap_size", DType::Float64),
        &[
            "uk_12_min",
            "uk_13_min",
            "uk_23_min",
            "pk_12_min",
            "pk_13_min",
            "pk_23_min",
            "uk_12_max",
            "uk_13_max",
            "uk_23_max",
            "pk_12_max",
            "pk_13_max",
            "pk_23_max",
        ],
    )
}

fn appliance() -> Schema {
    Schema::with_id()
        .column("node", DType::Int32)
        .column("status", DType::Int8)
}

fn sym_power_flow(int_type: DType) -> Schema {
    floats(
        appliance().column("type", int_type),
        &["p_specified", "q_specified"],
    )
}

fn asym_power_flow(int_type: DType) -> Schema {
    phase_floats(
        appliance().column("type", int_type),
        &["p_specified", "q_specified"],
    )
}

fn sensor() -> Schema {
    Schema::with_id().column("measured_object", DType::Int32)
}

fn power_sensor(dtype: DType) -> Schema {
    let schema = sensor()
        .column("measured_terminal_type", DType::Int8)
        .defaulted("power_sigma", DType::Float64, f64::NAN)
        .column("p_measured", dtype)
        .column("q_measured", dtype);
    let empty = match dtype {
        DType::Float64x3 => Value::Float3([f64::NAN; 3]),
        _ => Value::Float(f64::NAN),
    };
    schema
        .defaulted("p_sigma", dtype, empty.clone())
        .defaulted("q_sigma", dtype, empty)
}

fn voltage_sensor(dtype: DType) -> Schema {
    sensor()
        .column("u_sigma", DType::Float64)
        .column("u_measured", dtype)
        .defaulted(
            "u_angle_measured",
            dtype,
            match dtype {
                DType::Float64x3 => Value::Float3([f64::NAN; 3]),
                _ => Value::Float(f64::NAN),
            },
        )
}

fn current_sensor(dtype: DType) -> Schema {
    sensor()
        .column("measured_terminal_type", DType::Int8)
        .column("angle_measurement_type", DType::Int8)
        .column("i_sigma", DType::Float64)
        .column("i_angle_sigma", DType::Float64)
        .column("i_measured", dtype)
        .column("i_angle_measured", dtype)
}

fn regulator() -> Schema {
    Schema::with_id()
        .column("regulated_object", DType::Int32)
        .column("status", DType::Int8)
}

fn transformer_tap_regulator() -> Schema {
    regulator()
        .column("control_side", DType::Int8)
        .column("u_set", DType::Float64)
        .column("u_band", DType::Float64)
        .defaulted("line_drop_compensation_r", DType::Float64, 0.0)
        .defaulted("line_drop_compensation_x", DType::Float64, 0.0)
}

fn voltage_regulator() -> Schema {
    empty_floats(regulator().column("u_ref", DType::Float64), &["q_min", "q_max"])
}

fn fault() -> Schema {
    let schema = Schema::with_id()
        .column("fault_object", DType::Int32)
        .column("status", DType::Int8);
    let schema = int8s(schema, &["fault_type", "fault_phase"]);
    empty_floats(schema, &["r_f", "x_f"])
}

/// Returns the schema of a standard entity kind, or `None` for custom kinds.
pub(crate) fn schema_of(kind: &EntityKind) -> Option<Schema> {
    use EntityKind::*;

    let schema = match kind {
        Node => node(),
        Line => line(),
        AsymLine => asym_line(),
        Link => branch(),
        GenericBranch => generic_branch(),
        Transformer => transformer(),
        ThreeWindingTransformer => three_winding_transformer(),
        SymLoad => sym_power_flow(DType::Int8),
        AsymLoad => asym_power_flow(DType::Int8),
        SymGen => sym_power_flow(DType::Int64),
        AsymGen => asym_power_flow(DType::Int64),
        Source => appliance().column("u_ref", DType::Float64),
        Shunt => appliance().column("u_ref", DType::Float64),
        SymPowerSensor => power_sensor(DType::Float64),
        AsymPowerSensor => power_sensor(DType::Float64x3),
        SymVoltageSensor => voltage_sensor(DType::Float64),
        AsymVoltageSensor => voltage_sensor(DType::Float64x3),
        SymCurrentSensor => current_sensor(DType::Float64),
        AsymCurrentSensor => current_sensor(DType::Float64x3),
        TransformerTapRegulator => transformer_tap_regulator(),
        VoltageRegulator => voltage_regulator(),
        Fault => fault(),
        Custom(_) => return None,
    };
    Some(schema)
}
