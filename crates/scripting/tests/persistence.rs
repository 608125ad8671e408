//! Save data round trips through JSON.

use greenstone_scripting::{Context, SaveData, ScriptError, Value, ValueType};
use std::collections::HashMap;

fn round_trip(data: &SaveData) -> SaveData {
    let json = serde_json::to_string(data).expect("save data should serialize");
    serde_json::from_str(&json).expect("save data should deserialize")
}

#[test]
fn test_round_trip_preserves_vars_and_stack() {
    let mut ctx = Context::default();
    ctx.execute(
        "1 2.5 \"three\" true null newlist 1 \"x\" tolist 42 typeof \
         9 >n \"hi\" >greeting fun@double 2 mul end",
    )
    .unwrap();

    let saved = ctx.save_data();
    let restored = round_trip(&saved).restore(Vec::new()).unwrap();

    assert_eq!(restored.vars(), ctx.vars());
    assert_eq!(restored.stack().values(), ctx.stack().values());
}

#[test]
fn test_restored_functions_still_run() {
    let mut ctx = Context::default();
    ctx.execute("fun@double 2 mul end fun 1 add end").unwrap();

    let mut restored = round_trip(&ctx.save_data()).restore(Vec::new()).unwrap();
    restored.execute("5 swap @ @double").unwrap();
    assert_eq!(restored.stack().values(), &[Value::Int(12)]);
}

#[test]
fn test_restored_error_locations_render() {
    let mut ctx = Context::default();
    ctx.execute("fun@broken\n  1 nosuch\nend").unwrap();

    let mut restored = Context::from_save_data(round_trip(&ctx.save_data()), Vec::new()).unwrap();
    let err = restored.execute("@broken").unwrap_err();
    assert_eq!(
        err.pretty_message(),
        "Execution error: There is no command called nosuch.\n  1 nosuch\n    ^^^^^^"
    );
}

#[test]
fn test_value_json_layout() {
    let data = SaveData {
        vars: HashMap::from([("t".to_string(), Value::Type(ValueType::Float))]),
        stack: vec![Value::Null, Value::Float(f64::NEG_INFINITY)],
    };
    let json: serde_json::Value = serde_json::to_value(&data).unwrap();
    assert_eq!(json["vars"]["t"], serde_json::json!({"type": "type", "value": "float"}));
    assert_eq!(json["stack"][0], serde_json::json!({"type": "null"}));
    assert_eq!(json["stack"][1], serde_json::json!({"type": "float", "value": "-inf"}));
    assert_eq!(round_trip(&data), data);
}

#[test]
fn test_missing_fields_default() {
    let data: SaveData = serde_json::from_str("{}").unwrap();
    assert_eq!(data, SaveData::default());
}

#[test]
fn test_function_source_written_once() {
    let source = format!("fun@f {}end", "1 2 add ".repeat(700));
    let mut ctx = Context::default();
    ctx.execute(&source).unwrap();

    let json = serde_json::to_string(&ctx.save_data()).unwrap();
    assert_eq!(json.matches(source.as_str()).count(), 1);
    assert!(
        json.len() < 50 * source.len(),
        "{} bytes saved for {} bytes of source",
        json.len(),
        source.len()
    );

    let restored = round_trip(&ctx.save_data()).restore(Vec::new()).unwrap();
    assert_eq!(restored.vars(), ctx.vars());
}

#[test]
fn test_function_json_layout() {
    let mut ctx = Context::default();
    ctx.execute("fun 1 end").unwrap();

    let json: serde_json::Value = serde_json::to_value(ctx.save_data()).unwrap();
    assert_eq!(
        json["stack"][0],
        serde_json::json!({
            "type": "function",
            "value": {
                "source": "fun 1 end",
                "body": [{"kind": "literal", "value": {"type": "int", "value": 1}, "loc": [4, 5]}]
            }
        })
    );
}

#[test]
fn test_each_function_keeps_only_its_lines() {
    let source: String = (0..300)
        .map(|i| format!("fun@f{} {} 2 mul end\n", i, i))
        .collect();
    let mut ctx = Context::default();
    ctx.execute(&source).unwrap();

    let json = serde_json::to_string(&ctx.save_data()).unwrap();
    assert!(
        json.len() < 50 * source.len(),
        "{} bytes saved for {} bytes of source",
        json.len(),
        source.len()
    );
    assert_eq!(json.matches("fun@f7 7 2 mul end").count(), 1);

    let mut restored = round_trip(&ctx.save_data()).restore(Vec::new()).unwrap();
    restored.execute("@f7").unwrap();
    assert_eq!(restored.stack().values(), &[Value::Int(14)]);
}

#[test]
fn test_restored_locations_keep_line_numbers() {
    let mut ctx = Context::default();
    ctx.execute("1 2 add\n\nfun@broken\n  1 nosuch\nend\npop").unwrap();

    let once = round_trip(&ctx.save_data());
    let twice = round_trip(&once);
    assert_eq!(
        serde_json::to_string(&once).unwrap(),
        serde_json::to_string(&twice).unwrap()
    );

    let mut restored = twice.restore(Vec::new()).unwrap();
    let err = match restored.execute("@broken").unwrap_err() {
        ScriptError::Exec(e) => e,
        other => panic!("expected an execution error, got {:?}", other),
    };
    let loc = err.trace().unwrap();
    assert_eq!(loc.to_string(), "line 4, columns 4-10");
    assert_eq!(loc.underline(), "  1 nosuch\n    ^^^^^^");
}
