use rand::SeedableRng;
use rand::rngs::StdRng;

use sixlines::oracle::diagnosis::{DiagnosisReport, DiagnosisRequest, Diagnoser, Normalization};
use sixlines::oracle::profile::Category;
use sixlines::oracle::reference::EmptyReference;
use sixlines::oracle::selector::SelectionMode;

#[test]
fn request_parses_from_named_json() {
    let json = r#"{
        "traits": {"qian": 9, "dui": 2, "li": 3, "zhen": 4, "xun": 1, "kan": 0, "gen": 2, "kun": 5},
        "category": "safe_mode",
        "normalization": {"method": "softmax", "temperature": 0.5},
        "selection": {"mode": "ranked", "avoid_pure": true},
        "scenario_line": 4
    }"#;
    let request: DiagnosisRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.category, Category::SafeMode);
    assert_eq!(request.normalization, Normalization::Softmax { temperature: Some(0.5) });
    assert_eq!(request.selection, SelectionMode::Ranked { avoid_pure: true });
    assert!(!request.debug);

    let missing_axis = r#"{"traits": {"qian": 1}, "category": "engine"}"#;
    assert!(serde_json::from_str::<DiagnosisRequest>(missing_axis).is_err());
}

#[test]
fn report_survives_a_json_round_trip() {
    let json = r#"{
        "traits": {"qian": 9, "dui": 2, "li": 3, "zhen": 4, "xun": 1, "kan": 0, "gen": 2, "kun": 5},
        "category": "engine",
        "scenario_line": 6,
        "debug": true
    }"#;
    let request: DiagnosisRequest = serde_json::from_str(json).unwrap();
    let report = Diagnoser::default()
        .diagnose(&request, &mut StdRng::seed_from_u64(4), &EmptyReference)
        .unwrap();
    let text = serde_json::to_string(&report).unwrap();
    let back: DiagnosisReport = serde_json::from_str(&text).unwrap();
    assert_eq!(back.category, report.category);
    assert_eq!(back.selection, report.selection);
    assert_eq!(back.hexagram, report.hexagram);
    assert_eq!(back.scenario_tree, report.scenario_tree);
    assert!(back.distribution.is_valid());

    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["scenario_tree"]["paths"].as_array().unwrap().len(), 8);
    assert_eq!(
        value["scenario_tree"]["paths"][0]["combination"],
        serde_json::json!(["progression", "progression", "progression"])
    );
    assert!(value["trace"]["rng_draws"].as_u64().unwrap() >= 2);
}

#[test]
fn report_schema_lists_top_level_fields() {
    let schema = serde_json::to_value(schemars::schema_for!(DiagnosisReport)).unwrap();
    let props = schema["properties"].as_object().unwrap();
    for key in [
        "category",
        "distribution",
        "concentration",
        "pure_state",
        "selection",
        "hexagram",
    ] {
        assert!(props.contains_key(key), "missing {key}");
    }
}
