#![cfg(feature = "serde")]

use offset_forest::{AllocationMode, AvlMap, TreeConfig, XY};
use serde_json::json;

#[test]
fn config_round_trips_through_json() {
    let config = TreeConfig::fixed(128);
    let value = serde_json::to_value(config).unwrap();
    assert_eq!(value, json!({ "mode": "preallocated_fixed", "capacity": 128 }));
    let back: TreeConfig = serde_json::from_value(value).unwrap();
    assert_eq!(back, config);
}

#[test]
fn missing_fields_take_defaults() {
    let config: TreeConfig = serde_json::from_str(r#"{ "mode": "dynamic_retain_freelist" }"#).unwrap();
    assert_eq!(config, TreeConfig::retained(0));
    let config: TreeConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config.mode, AllocationMode::DynamicDiscard);
    assert!(serde_json::from_str::<TreeConfig>(r#"{ "mode": "unbounded" }"#).is_err());
}

#[test]
fn loaded_config_drives_the_arena() {
    let config: TreeConfig =
        serde_json::from_str(r#"{ "mode": "preallocated_fixed", "capacity": 2 }"#).unwrap();
    let mut map: AvlMap<u8, ()> = AvlMap::with_config(config);
    map.add(1, ()).unwrap();
    map.add(2, ()).unwrap();
    assert!(map.try_add(3, ()).is_err());
}

#[test]
fn xy_serializes_as_struct() {
    let value = serde_json::to_value(XY::new(3, -1)).unwrap();
    assert_eq!(value, json!({ "x": 3, "y": -1 }));
}
