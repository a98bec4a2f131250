//! Conversion between plain JSON and Firestore's typed REST value encoding.
//!
//! Firestore wraps every value in a single-key object naming its type
//! (`{"stringValue": "x"}`, `{"integerValue": "3"}`, ...). Fields named in
//! [`TIMESTAMP_FIELDS`] holding RFC 3339 text become `timestampValue` so `createdAt` orders
//! correctly server-side. Every other string stays a `stringValue`, whatever it contains.

use serde_json::{json, Map, Value};

/// Field names stored as Firestore timestamps.
pub const TIMESTAMP_FIELDS: &[&str] = &["createdAt", "updatedAt"];

pub fn encode(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            json!({ "arrayValue": { "values": items.iter().map(encode).collect::<Vec<_>>() } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Encodes the value of the field `name`.
pub fn encode_field(name: &str, value: &Value) -> Value {
    match value {
        Value::String(s)
            if TIMESTAMP_FIELDS.contains(&name) && chrono::DateTime::parse_from_rfc3339(s).is_ok() =>
        {
            json!({ "timestampValue": s })
        }
        _ => encode(value),
    }
}

/// Encodes a JSON object as a Firestore `fields` map.
pub fn encode_fields(map: &Map<String, Value>) -> Value {
    Value::Object(map.iter().map(|(k, v)| (k.clone(), encode_field(k, v))).collect())
}

pub fn decode(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Value::Null;
    };
    match kind.as_str() {
        "stringValue" | "timestampValue" | "referenceValue" | "booleanValue" => inner.clone(),
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Value::from)
            .unwrap_or_else(|| inner.clone()),
        "doubleValue" => inner.clone(),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => decode_fields(inner.get("fields").unwrap_or(&Value::Null)),
        _ => Value::Null,
    }
}

/// Decodes a Firestore `fields` map into a plain JSON object.
pub fn decode_fields(fields: &Value) -> Value {
    match fields.as_object() {
        Some(map) => Value::Object(map.iter().map(|(k, v)| (k.clone(), decode(v))).collect()),
        None => Value::Object(Map::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_nested_record() {
        let record = json!({
            "status": "pending",
            "latitude": 14.5,
            "count": 3,
            "createdAt": "2026-01-02T03:04:05Z",
            "symptoms": ["Fever"],
            "address": { "barangay": "Batasan Hills" }
        });
        let fields = encode_fields(record.as_object().expect("object"));
        assert_eq!(fields["status"], json!({ "stringValue": "pending" }));
        assert_eq!(fields["latitude"], json!({ "doubleValue": 14.5 }));
        assert_eq!(fields["count"], json!({ "integerValue": "3" }));
        assert_eq!(fields["createdAt"], json!({ "timestampValue": "2026-01-02T03:04:05Z" }));
        assert_eq!(
            fields["symptoms"],
            json!({ "arrayValue": { "values": [{ "stringValue": "Fever" }] } })
        );
        assert_eq!(
            fields["address"]["mapValue"]["fields"]["barangay"],
            json!({ "stringValue": "Batasan Hills" })
        );
    }

    #[test]
    fn decode_reverses_encode() {
        let record = json!({
            "uid": "abc",
            "agreed": true,
            "latitude": 14.5,
            "readAnnouncements": ["a1", "a2"],
            "documents": { "idType": "National ID" },
            "createdAt": "2026-01-02T03:04:05Z"
        });
        let fields = encode_fields(record.as_object().expect("object"));
        assert_eq!(decode_fields(&fields), record);
    }

    #[test]
    fn free_text_that_looks_like_a_timestamp_stays_a_string() {
        let record = json!({
            "description": "2026-01-02T03:04:05Z",
            "customSymptom": "2026-01-02T03:04:05+08:00",
            "createdAt": "2026-01-02T03:04:05Z",
            "reports": [{ "createdAt": "2026-01-01T00:00:00Z" }]
        });
        let fields = encode_fields(record.as_object().expect("object"));
        assert_eq!(fields["description"], json!({ "stringValue": "2026-01-02T03:04:05Z" }));
        assert_eq!(fields["customSymptom"], json!({ "stringValue": "2026-01-02T03:04:05+08:00" }));
        assert_eq!(fields["createdAt"], json!({ "timestampValue": "2026-01-02T03:04:05Z" }));
        assert_eq!(
            fields["reports"]["arrayValue"]["values"][0]["mapValue"]["fields"]["createdAt"],
            json!({ "timestampValue": "2026-01-01T00:00:00Z" })
        );
        assert_eq!(encode(&json!("2026-01-02T03:04:05Z")), json!({ "stringValue": "2026-01-02T03:04:05Z" }));
    }

    #[test]
    fn empty_array_decodes_without_values_key() {
        assert_eq!(decode(&json!({ "arrayValue": {} })), json!([]));
        assert_eq!(decode(&json!({ "nullValue": null })), Value::Null);
    }
}
