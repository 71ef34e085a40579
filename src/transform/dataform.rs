use serde_json::{json, Map, Value};

use super::rules::*;
use super::Registry;
use crate::digits::localize_value;

// Columns of the impact matrix, answer field to template stem.
const IMPACT_FIELDS: &[(&str, &str)] = &[
    ("reputation", "reputation"),
    ("businessFuture", "business_future"),
    ("employeeConcern", "employee_concern"),
    ("stakeholderConcern", "stakeholder_concern"),
    ("financialHealth", "financial_health"),
    ("operationalHealth", "operational_health"),
];

pub(super) fn register(reg: &mut Registry) {
    // title, title_1 and form_completed_by are shared with the other forms
    // and already registered there.
    reg.rule("data_type", |i| {
        Some(wrapped(choice_exact(
            i.value,
            &[
                ("data_type_specialized", "Specialized"),
                ("data_type_non-specialized", "non-specialized"),
            ],
        )))
    });

    reg.rule("data_owners", |i| {
        Some(rows(
            i.value,
            |item| {
                let mut row = Map::new();
                row.insert("name".to_string(), field_or(item, "name", ""));
                row.insert("department".to_string(), field_path_or(item, "department.name", ""));
                // No default here, an unanswered phone drops the key.
                set_opt(&mut row, "phone", get(item, "phone").map(localize_value));
                Value::Object(row)
            },
            || json!({"name": SPACE, "department": SPACE, "phone": SPACE}),
        ))
    });

    reg.rule("value_added_services", |i| {
        Some(wrapped(json!({
            "value_added_services_no": eq_chosen(i.value, "no"),
            "value_added_services_yes": eq_chosen(i.value, "yes"),
        })))
    });

    reg.rule("main_characteristics", |i| {
        Some(rows(
            i.value,
            |item| {
                json!({
                    "name": field_or(item, "name", SPACE),
                    "desc": field_or(item, "desc", SPACE),
                })
            },
            || json!({"name": SPACE, "desc": SPACE}),
        ))
    });

    reg.rule("data_types", |i| {
        Some(rows(
            i.value,
            |item| {
                json!({
                    "type_title": field_or(item, "typeTitle", SPACE),
                    "type_description": field_or(item, "typeDescription", SPACE),
                })
            },
            || json!({"type_title": SPACE, "type_description": SPACE}),
        ))
    });

    reg.rule("confidentiality", |i| {
        Some(wrapped(choice_exact(
            i.value,
            &[
                ("confidentiality_low", "low"),
                ("confidentiality_medium", "medium"),
                ("confidentiality_high", "high"),
            ],
        )))
    });
    reg.rule("integrity", |i| {
        Some(wrapped(choice_exact(
            i.value,
            &[
                ("integrity_low", "low"),
                ("integrity_medium", "medium"),
                ("integrity_high", "high"),
            ],
        )))
    });
    reg.rule("availability", |i| {
        Some(wrapped(choice_exact(
            i.value,
            &[
                ("availability_low", "low"),
                ("availability_medium", "medium"),
                ("availability_high", "high"),
            ],
        )))
    });

    reg.rule("impact_assessment", |i| Some(list(i.value, impact_row)));
}

/// has_impact/no_impact answer to a checkbox pair. Anything else leaves
/// both boxes unticked.
fn impact(field: &Value) -> (bool, bool) {
    match option_str(field) {
        Some("has_impact") => (true, false),
        Some("no_impact") => (false, true),
        _ => (false, false),
    }
}

fn impact_row(item: &Value) -> Value {
    let id = get(item, "id").and_then(Value::as_str).unwrap_or("");
    let mut row = Map::new();
    row.insert(
        "confidentiality_impact".to_string(),
        Value::Bool(id == "confidentialityImpact"),
    );
    row.insert("integrity_impact".to_string(), Value::Bool(id == "integrityImpact"));
    row.insert(
        "availability_impact".to_string(),
        Value::Bool(id == "availabilityImpact"),
    );
    for &(field, stem) in IMPACT_FIELDS {
        let (has, no) = impact(sub(item, field));
        row.insert(format!("{stem}_has_impact"), Value::Bool(has));
        row.insert(format!("{stem}_has_no_impact"), Value::Bool(no));
    }
    Value::Object(row)
}
