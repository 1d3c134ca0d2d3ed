//! Shared fixtures for integration tests
//!
//! - A valid built-in-schema profile document
//! - Stores and servers rooted in a temp directory

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use profile_gateway::http_server::{GatewayConfig, GatewayServer};
use profile_gateway::schema::{profile_schema, SchemaGate};
use profile_gateway::store::{DocumentStore, ReadPolicy};
use serde_json::{json, Value};
use tempfile::TempDir;

/// A profile that satisfies the built-in schema
pub fn sample_profile() -> Value {
    json!({
        "profile": {
            "profile_name": "308 Match",
            "cartridge_name": "168gr SMK",
            "bullet_name": "SMK",
            "caliber": ".308",
            "short_name_top": "308",
            "short_name_bot": "168",
            "user_note": "zeroed at 100 m",
            "zero_x": -12,
            "zero_y": 40,
            "sc_height": 90,
            "r_twist": 1000,
            "twist_dir": "RIGHT",
            "c_muzzle_velocity": 8000,
            "c_zero_temperature": 15,
            "c_t_coeff": 1000,
            "c_zero_distance_idx": 1,
            "c_zero_air_temperature": 15,
            "c_zero_air_pressure": 10000,
            "c_zero_air_humidity": 50,
            "c_zero_w_pitch": 0,
            "c_zero_p_temperature": 15,
            "b_diameter": 308,
            "b_weight": 1680,
            "b_length": 1215,
            "bc_type": "G7",
            "distances": [5000, 10000, 20000, 30000],
            "coef_rows": [{ "bc_cd": 2430, "mv": 0 }],
            "switches": [
                { "c_idx": 255, "distance_from": "VALUE", "distance": 10000, "reticle_idx": 0, "zoom": 1 },
                { "c_idx": 255, "distance_from": "VALUE", "distance": 20000, "reticle_idx": 0, "zoom": 2 },
                { "c_idx": 255, "distance_from": "VALUE", "distance": 30000, "reticle_idx": 0, "zoom": 3 },
                { "c_idx": 1, "distance_from": "INDEX", "distance": 0, "reticle_idx": 0, "zoom": 4 }
            ]
        }
    })
}

pub fn profile_bytes() -> Vec<u8> {
    serde_json::to_vec(&sample_profile()).unwrap()
}

/// Sample profile with one field replaced
pub fn profile_with(field: &str, value: Value) -> Vec<u8> {
    let mut doc = sample_profile();
    doc["profile"][field] = value;
    serde_json::to_vec(&doc).unwrap()
}

/// Sample profile with one field removed
pub fn profile_without(field: &str) -> Vec<u8> {
    let mut doc = sample_profile();
    doc["profile"].as_object_mut().unwrap().remove(field);
    serde_json::to_vec(&doc).unwrap()
}

pub fn open_profile_store(dir: &Path) -> DocumentStore {
    let gate = SchemaGate::from_schema(profile_schema()).unwrap();
    DocumentStore::open(dir, gate, ReadPolicy::Revalidate).unwrap()
}

/// Config with every path inside `temp`
pub fn temp_config(temp: &TempDir) -> GatewayConfig {
    GatewayConfig {
        profile_dir: temp.path().join("profiles"),
        www_dir: temp.path().join("www"),
        flash_marker: temp.path().join("flash.txt"),
        refresh_marker: temp.path().join("refresh_file_list"),
        ..Default::default()
    }
}

pub fn temp_server(temp: &TempDir) -> GatewayServer {
    GatewayServer::open(temp_config(temp)).unwrap()
}

pub fn temp_server_with(config: GatewayConfig) -> GatewayServer {
    GatewayServer::open(config).unwrap()
}

/// Shares a store between a test and the server under test
pub fn shared(store: DocumentStore) -> Arc<DocumentStore> {
    Arc::new(store)
}
