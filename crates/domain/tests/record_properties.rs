//! Property coverage for the record transformation building blocks.

use logshape_domain::{
    Context, ErrorLike, ErrorNormalizer, ErrorPlacement, FieldMap, FieldSerializer, FieldValue,
    LevelTable, Severity, Whitelist,
};
use logshape_shared::ErrorEnvelope;
use proptest::prelude::*;
use serde_json::Value;

fn json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-z ]{0,12}".prop_map(Value::String),
    ]
}

fn json_value() -> impl Strategy<Value = Value> {
    json_leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

fn field_map() -> impl Strategy<Value = FieldMap> {
    prop::collection::vec(
        (
            prop_oneof![
                Just("time".to_string()),
                Just("pid".to_string()),
                "[a-z]{1,8}"
            ],
            json_value(),
        ),
        0..8,
    )
    .prop_map(|entries| entries.into_iter().collect())
}

proptest! {
    #[test]
    fn serializer_respects_the_whitelist(fields in field_map()) {
        let whitelist = Whitelist::default();
        let serialized = FieldSerializer::new(whitelist.clone()).serialize(fields.clone());

        prop_assert_eq!(
            serialized.keys().collect::<Vec<_>>(),
            fields.keys().collect::<Vec<_>>()
        );
        for (key, original) in fields.iter() {
            let Some(output) = serialized.get(key) else {
                return Err(TestCaseError::fail(format!("missing key {key}")));
            };
            if whitelist.contains(key) {
                prop_assert_eq!(output, original);
                continue;
            }
            let Some(text) = output.as_str() else {
                return Err(TestCaseError::fail(format!("{key} was not stringified")));
            };
            if let Some(json @ (Value::Array(_) | Value::Object(_))) = original.as_json() {
                let reparsed: Value = serde_json::from_str(text)
                    .map_err(|error| TestCaseError::fail(error.to_string()))?;
                prop_assert_eq!(&reparsed, json);
            }
        }
    }

    #[test]
    fn context_merge_is_idempotent(base in field_map(), additions in field_map()) {
        let context = Context::create(base);
        let once = context.merge(additions.clone());
        let twice = once.merge(additions);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn level_table_only_maps_exact_codes(code in 0_u32..1_000) {
        let label = LevelTable::standard().label_for(Some(&Value::from(code)));
        prop_assert_eq!(label.is_some(), matches!(code, 10 | 20 | 30 | 40 | 50 | 60));
    }

    #[test]
    fn bare_errors_never_gain_message_or_code(message in "[a-zA-Z ]{1,20}") {
        let error = ErrorLike::new(message.clone());
        let normalized = ErrorNormalizer::default().normalize(ErrorPlacement::FieldSlot {
            error,
            message: None,
        });

        prop_assert_eq!(&*normalized.message, message.as_str());
        prop_assert!(normalized.fields.contains_key("error_stack"));
        prop_assert!(!normalized.fields.contains_key("error_message"));
        prop_assert!(!normalized.fields.contains_key("error_code"));
    }
}

#[test]
fn explicit_message_with_code_keeps_all_error_fields() {
    let error = ErrorLike::new("boom").with_attribute("statusCode", 404);
    let normalized = ErrorNormalizer::default().normalize(ErrorPlacement::FieldSlot {
        error,
        message: Some("lookup failed".into()),
    });

    assert_eq!(&*normalized.message, "lookup failed");
    for key in ["error_message", "error_stack", "error_code"] {
        assert!(normalized.fields.contains_key(key), "missing {key}");
    }
    assert_eq!(normalized.fields.get("error_code"), Some(&FieldValue::from(404)));
}

#[test]
fn severity_errors_map_into_error_envelopes() -> Result<(), Box<dyn std::error::Error>> {
    let Err(error) = "loud".parse::<Severity>() else {
        return Err("expected a parse failure".into());
    };

    let envelope: ErrorEnvelope = error.into();
    assert_eq!(envelope.code.namespace(), "domain");
    assert_eq!(envelope.code.code(), "invalid_severity");
    assert_eq!(envelope.metadata.get("input"), Some(&"loud".to_string()));
    Ok(())
}
