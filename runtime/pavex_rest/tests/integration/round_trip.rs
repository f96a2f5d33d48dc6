use pavex_rest::serialization::{SerializerRegistry, Value};
use serde_json::json;

fn samples() -> Vec<Value> {
    vec![
        json!(null),
        json!(true),
        json!(42),
        json!(-7),
        json!(1.5),
        json!("pavex"),
        json!([1, "two", [3, [4, [5, [6]]]]]),
        json!({
            "user": {
                "name": "Jane",
                "roles": ["admin", "editor"],
                "address": { "city": { "name": "Rome", "geo": { "lat": 41.9, "lon": 12.5 } } }
            },
            "active": false,
            "score": null
        }),
    ]
}

#[test]
fn every_built_in_codec_round_trips() {
    let registry = SerializerRegistry::default();
    for mime_type in registry.mime_types() {
        let codec = registry.resolve(Some(mime_type)).unwrap();
        for value in samples() {
            let encoded = codec.encode(&value).unwrap();
            let decoded = registry.decode(Some(mime_type), &encoded).unwrap();
            assert_eq!(decoded, value, "{mime_type} didn't round trip {value}");
        }
    }
}

#[test]
fn key_order_survives_every_codec() {
    let registry = SerializerRegistry::default();
    let value = json!({ "zeta": 1, "alpha": 2, "mu": 3 });
    for mime_type in registry.mime_types() {
        let codec = registry.resolve(Some(mime_type)).unwrap();
        let decoded = codec.decode(&codec.encode(&value).unwrap()).unwrap();
        let keys: Vec<_> = decoded.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["zeta", "alpha", "mu"], "{mime_type} reordered the keys");
    }
}
