use serde_json::{json, Value};

use super::rules::*;
use super::Registry;
use crate::resolve::truthy;

const MATURITY: &[(&str, &str)] = &[
    (
        "process_maturity_level_identified",
        "The process has been identified, but its documentation (process profile) has not yet been developed.",
    ),
    (
        "process_maturity_level_developed",
        "The process documentation (process profile) has been developed.",
    ),
    (
        "process_maturity_level_recognized",
        "In addition to developing the process documentation, the process model has been created using recognized notations such as BPMN2.",
    ),
    (
        "process_maturity_level_monitored",
        "Process performance indicators have been defined, and the process is continuously monitored based on these indicators.",
    ),
    (
        "process_maturity_level_mechanism",
        "A process improvement mechanism has been designed and is being implemented.",
    ),
];

pub(super) fn register(reg: &mut Registry) {
    reg.rule("title", |i| Some(i.value.clone()));
    reg.rule("title_1", |i| Some(i.value.clone()));
    reg.rule("owner", |i| Some(field_or(i.value, "name", SPACE)));
    reg.rule("unit", |i| Some(field_or(i.value, "name", SPACE)));

    reg.rule("process_inputs", |i| {
        Some(list(i.value, |item| field_or_null(item, "input", SPACE)))
    });
    reg.rule("process_outputs", |i| {
        Some(list(i.value, |item| field_or_null(item, "output", SPACE)))
    });

    reg.rule("main_steps_of_the_process", |i| {
        Some(rows(
            i.value,
            |item| {
                json!({
                    "number": field_or(item, "number", SPACE),
                    "description": field_or(item, "description", SPACE),
                    "responsible": field_path_or(item, "responsible.name", SPACE),
                    "time": field_or(item, "time", SPACE),
                })
            },
            || json!({"number": SPACE, "description": SPACE, "responsible": SPACE, "time": SPACE}),
        ))
    });

    reg.rule("resources", |i| {
        Some(rows(
            i.value,
            |item| {
                json!({
                    "name": field_or(item, "name", SPACE),
                    "description": field_or(item, "description", SPACE),
                })
            },
            || json!({"name": SPACE, "description": SPACE}),
        ))
    });

    reg.rule("process_flow", |i| {
        Some(wrapped(yes_no(i.value, "process_flow_no", "process_flow_yes")))
    });

    reg.rule("key_performance_indicators", |i| {
        Some(rows(
            i.value,
            |item| {
                json!({
                    "index_name": field_or(item, "index-name", SPACE),
                    "calculation_formula": field_or(item, "calculation-formula", SPACE),
                    "target_value": field_or(item, "target-value", SPACE),
                })
            },
            || json!({"index_name": SPACE, "calculation_formula": SPACE, "target_value": SPACE}),
        ))
    });

    reg.rule("possible_risks", possible_risks);
    reg.rule("related_documents_and_forms", related_documents);
    reg.rule("process_maturity_level", maturity_level);
}

fn possible_risks(i: &RuleInput) -> Option<Value> {
    Some(rows(
        i.value,
        |item| {
            let prob = get(item, "probability-of-occurrence").unwrap_or(&Value::Null);
            let impact = get(item, "risk-impact").unwrap_or(&Value::Null);
            json!({
                "risk_name": field_or(item, "risk-name", SPACE),
                "probability_of_occurrence": choice_exact(prob, &[
                    ("probability_of_occurrence_low", "low"),
                    ("probability_of_occurrence_medium", "medium"),
                    ("probability_of_occurrence_high", "high"),
                ]),
                "risk_impact": choice_exact(impact, &[
                    ("risk_impact_low", "low"),
                    ("risk_impact_medium", "medium"),
                    ("risk_impact_high", "high"),
                ]),
                "control_measures": field_or(item, "control-measures", SPACE),
            })
        },
        || {
            json!({
                "risk_name": SPACE,
                "probability_of_occurrence": SPACE,
                "risk_impact": SPACE,
                "control_measures": SPACE,
            })
        },
    ))
}

fn related_documents(i: &RuleInput) -> Option<Value> {
    Some(rows(
        i.value,
        |item| {
            let link = get(item, "link-or-attachment").unwrap_or(&Value::Null);
            json!({
                "document_and_form_name": field_or(item, "document/form-name", SPACE),
                "document_and_form_code": field_or(item, "document/form-code", SPACE),
                "link_or_attachment": yes_no(link, "link_or_attachment_no", "link_or_attachment_yes"),
            })
        },
        || {
            json!({
                "document_and_form_name": SPACE,
                "document_and_form_code": SPACE,
                "link_or_attachment": {},
            })
        },
    ))
}

fn maturity_level(i: &RuleInput) -> Option<Value> {
    // No recorded level means the process is at least identified.
    if !truthy(i.value) {
        return Some(wrapped(json!({
            "process_maturity_level_identified": true,
            "process_maturity_level_developed": false,
            "process_maturity_level_recognized": false,
            "process_maturity_level_monitored": false,
            "process_maturity_level_mechanism": false,
        })));
    }
    Some(wrapped(choice_exact(i.value, MATURITY)))
}

#[cfg(test)]
mod tests {
    use super::super::tests::run_rule;
    use serde_json::json;

    #[test]
    fn owner_extracts_name() {
        assert_eq!(run_rule("owner", json!({"name": "دفتر فناوری"})), Some(json!("دفتر فناوری")));
        assert_eq!(run_rule("owner", json!("")), Some(json!(" ")));
    }

    #[test]
    fn main_steps_empty_yields_sentinel_row() {
        let out = run_rule("main_steps_of_the_process", json!([])).expect("set");
        assert_eq!(
            out,
            json!([{"number": " ", "description": " ", "responsible": " ", "time": " "}])
        );
    }

    #[test]
    fn main_steps_maps_rows() {
        let out = run_rule(
            "main_steps_of_the_process",
            json!([{"number": 1, "description": "ثبت", "responsible": {"name": "واحد"}, "time": ""}]),
        )
        .expect("set");
        assert_eq!(
            out,
            json!([{"number": 1, "description": "ثبت", "responsible": "واحد", "time": " "}])
        );
    }

    #[test]
    fn process_flow_is_exclusive() {
        assert_eq!(
            run_rule("process_flow", json!({"option": "Yes"})),
            Some(json!([{"process_flow_no": false, "process_flow_yes": true}]))
        );
        assert_eq!(
            run_rule("process_flow", json!("")),
            Some(json!([{"process_flow_no": false, "process_flow_yes": false}]))
        );
    }

    #[test]
    fn risks_classify_probability_and_impact() {
        let out = run_rule(
            "possible_risks",
            json!([{
                "risk-name": "نشت داده",
                "probability-of-occurrence": {"option": "medium"},
                "risk-impact": "high",
                "control-measures": "رمزنگاری"
            }]),
        )
        .expect("set");
        assert_eq!(out[0]["probability_of_occurrence"]["probability_of_occurrence_medium"], true);
        assert_eq!(out[0]["probability_of_occurrence"]["probability_of_occurrence_low"], false);
        assert_eq!(out[0]["risk_impact"]["risk_impact_high"], true);
    }

    #[test]
    fn related_documents_missing_link_stays_unchecked() {
        let out = run_rule("related_documents_and_forms", json!([{"document/form-name": "فرم"}]))
            .expect("set");
        assert_eq!(
            out[0]["link_or_attachment"],
            json!({"link_or_attachment_no": false, "link_or_attachment_yes": false})
        );
    }

    #[test]
    fn maturity_defaults_to_identified() {
        let out = run_rule("process_maturity_level", json!("")).expect("set");
        assert_eq!(out[0]["process_maturity_level_identified"], true);
        assert_eq!(out[0]["process_maturity_level_developed"], false);
    }

    #[test]
    fn maturity_matches_option_literal() {
        let out = run_rule(
            "process_maturity_level",
            json!({"option": "The process documentation (process profile) has been developed."}),
        )
        .expect("set");
        assert_eq!(out[0]["process_maturity_level_identified"], false);
        assert_eq!(out[0]["process_maturity_level_developed"], true);
    }
}
