//! Built-in schema for `.a7p` ballistic profiles.
//!
//! Units follow the device firmware: distances in centimetres, velocities in
//! tenths of m/s, diameters and lengths in thousandths of an inch, weights in
//! tenths of a grain.

use std::collections::BTreeMap;

use super::types::{FieldDef, FieldType, Rule, Schema};

pub const PROFILE_SCHEMA_ID: &str = "a7p-profile";
pub const PROFILE_SCHEMA_VERSION: &str = "1";

const MAX_DISTANCES: usize = 200;
const MAX_COEF_ROWS: usize = 200;
const MIN_SWITCHES: usize = 4;

/// Returns the schema every stored profile is checked against unless the
/// gateway is started with an explicit schema file.
pub fn profile_schema() -> Schema {
    let mut profile = BTreeMap::new();

    for (name, max) in [
        ("profile_name", 50),
        ("cartridge_name", 50),
        ("bullet_name", 50),
        ("caliber", 50),
        ("short_name_top", 8),
        ("short_name_bot", 8),
    ] {
        profile.insert(name.to_string(), FieldDef::required(FieldType::string_max(max)));
    }
    profile.insert("user_note".into(), FieldDef::optional(FieldType::string_max(250)));
    profile.insert("device_uuid".into(), FieldDef::optional(FieldType::string_max(50)));

    for (name, min, max) in [
        ("zero_x", -200_000, 200_000),
        ("zero_y", -200_000, 200_000),
        ("sc_height", -5_000, 5_000),
        ("r_twist", 0, 10_000),
        ("c_muzzle_velocity", 10, 30_000),
        ("c_zero_temperature", -100, 100),
        ("c_t_coeff", 0, 5_000),
        ("c_zero_distance_idx", 0, 255),
        ("c_zero_air_temperature", -100, 100),
        ("c_zero_air_pressure", 3_000, 15_000),
        ("c_zero_air_humidity", 0, 100),
        ("c_zero_w_pitch", -90, 90),
        ("c_zero_p_temperature", -100, 100),
        ("b_diameter", 1, 50_000),
        ("b_weight", 10, 65_535),
        ("b_length", 1, 200_000),
    ] {
        profile.insert(name.to_string(), FieldDef::required(FieldType::int_range(min, max)));
    }

    profile.insert(
        "twist_dir".into(),
        FieldDef::required(FieldType::one_of(&["RIGHT", "LEFT"])),
    );
    profile.insert(
        "bc_type".into(),
        FieldDef::required(FieldType::one_of(&["G1", "G7", "CUSTOM"])),
    );

    profile.insert(
        "distances".into(),
        FieldDef::required(FieldType::array(
            FieldType::int_range(100, 300_000),
            Some(1),
            Some(MAX_DISTANCES),
        )),
    );

    let mut coef_row = BTreeMap::new();
    coef_row.insert("bc_cd".to_string(), FieldDef::required(FieldType::int_range(0, 100_000)));
    coef_row.insert("mv".to_string(), FieldDef::required(FieldType::int_range(0, 30_000)));
    profile.insert(
        "coef_rows".into(),
        FieldDef::required(FieldType::array(
            FieldType::object(coef_row),
            Some(1),
            Some(MAX_COEF_ROWS),
        )),
    );

    let mut switch = BTreeMap::new();
    switch.insert("c_idx".to_string(), FieldDef::required(FieldType::int_range(0, 255)));
    switch.insert(
        "distance_from".to_string(),
        FieldDef::required(FieldType::one_of(&["INDEX", "VALUE"])),
    );
    switch.insert("distance".to_string(), FieldDef::required(FieldType::int_range(0, 300_000)));
    switch.insert("reticle_idx".to_string(), FieldDef::required(FieldType::int_range(0, 255)));
    switch.insert("zoom".to_string(), FieldDef::required(FieldType::int_range(0, 6)));
    profile.insert(
        "switches".into(),
        FieldDef::required(FieldType::array(
            FieldType::object(switch),
            Some(MIN_SWITCHES),
            None,
        )),
    );

    let mut fields = BTreeMap::new();
    fields.insert("profile".to_string(), FieldDef::required(FieldType::object(profile)));

    let mut schema = Schema::new(PROFILE_SCHEMA_ID, PROFILE_SCHEMA_VERSION, fields).with_rule(
        Rule::IndexWithin {
            index: "profile.c_zero_distance_idx".into(),
            array: "profile.distances".into(),
        },
    );
    schema.description = Some("Ballistic profile stored as <md5-hex><json>".into());
    schema
}
