use serde_json::{json, Map, Value};

use super::rules::*;
use super::Registry;
use crate::resolve::truthy;

// Exclusive has/no issue pairs, all sharing one shape keyed by placeholder.
const ISSUE_FIELDS: &[&str] = &[
    "authentication_issues",
    "document_authentication_issues",
    "infrastructure_issues",
    "database_issues",
    "process_complexity_issues",
    "skills_issues",
    "system_quality_issues",
    "user_support_issues",
];

const SATISFACTION: &[(&str, &str)] = &[
    ("service_satisfaction_level_very_poor", "Very poor"),
    ("service_satisfaction_level_poor", "Poor"),
    ("service_satisfaction_level_average", "Average"),
    ("service_satisfaction_level_good", "Good"),
    ("service_satisfaction_level_excellent", "Excellent"),
];

pub(super) fn register(reg: &mut Registry) {
    reg.rule("service_owners", people_rows);
    reg.rule("form_completed_by", people_rows);

    reg.rule("service_unique_code", |i| Some(text_or(i.value, SPACE)));
    reg.rule("service_provider", |i| Some(field_or(i.value, "name", SPACE)));
    reg.rule("service_desc", |i| Some(text_or(i.value, SPACE)));
    reg.rule("required_documents", |i| Some(text_or(i.value, SPACE)));
    reg.rule("average_service_time", |i| Some(text_or(i.value, SPACE)));
    reg.rule("additional_information", |i| Some(i.value.clone()));

    reg.rule("regions", regions);

    reg.rule("service_type", |i| {
        Some(json!({
            "service_type_C2G": flag(i.value, "C2G"),
            "service_type_B2G": flag(i.value, "B2G"),
            "service_type_G2G": flag(i.value, "G2G"),
        }))
    });

    reg.rule("service_level", |i| {
        Some(choice_exact_or_default(
            i.value,
            &[
                ("service_level_regional", "regional"),
                ("service_level_provincial", "provincial"),
                ("service_level_urban", "urban"),
                ("service_level_rural", "rural"),
            ],
            "service_level_national",
        ))
    });

    reg.rule("service_initiation", |i| {
        Some(choice_exact_or_default(
            i.value,
            &[
                ("service_initiation_specific_time", "specific_time"),
                ("service_initiation_specific_event", "specific_event"),
                ("service_initiation_other", "other"),
            ],
            "service_initiation_user_request",
        ))
    });

    reg.rule("strategic_importance", |i| {
        Some(choice_exact(
            i.value,
            &[
                ("strategic_importance_low", "low"),
                ("strategic_importance_medium", "medium"),
                ("strategic_importance_high", "high"),
            ],
        ))
    });

    reg.rule("service_frequency", |i| {
        Some(choice_exact(
            i.value,
            &[
                ("service_frequency_one_time", "one_time"),
                ("service_frequency_periodic", "periodic"),
            ],
        ))
    });

    reg.rule("related_laws_regulations", |i| {
        Some(rows(
            i.value,
            |item| {
                json!({
                    "law_details": field_path_or(item, "lawDetails.title", SPACE),
                    "description": field_or(item, "description", SPACE),
                })
            },
            || json!({"law_details": SPACE, "description": SPACE}),
        ))
    });

    reg.rule("service_partners", |i| {
        Some(rows(
            i.value,
            |item| {
                json!({
                    "organization_name": field_path_or(item, "organizationName.name", SPACE),
                    "contact_info": field_or(item, "contactInfo", SPACE),
                })
            },
            || json!({"organization_name": SPACE, "contact_info": SPACE}),
        ))
    });

    reg.rule("recipient_groups", |i| {
        Some(rows(
            i.value,
            |item| {
                json!({
                    "group_name": field_or(item, "groupName", SPACE),
                    "requirements": field_or(item, "requirements", SPACE),
                    "additional_notes": field_or(item, "additionalNotes", SPACE),
                })
            },
            || json!({"group_name": SPACE, "requirements": SPACE, "additional_notes": SPACE}),
        ))
    });

    reg.rule("service_satisfaction_level", |i| {
        Some(choice_exact(i.value, SATISFACTION))
    });

    reg.rule("supporting_systems", |i| {
        Some(rows(
            i.value,
            |item| {
                json!({
                    "system_name": field_or(item, "systemName", SPACE),
                    "supported_features": field_or(item, "supportedFeatures", SPACE),
                    "limitations": field_or(item, "limitations", SPACE),
                })
            },
            || json!({"system_name": SPACE, "supported_features": SPACE, "limitations": SPACE}),
        ))
    });

    reg.rule("system_support_level", |i| {
        Some(choice_exact(
            i.value,
            &[
                ("system_support_level_partial", "partial"),
                ("system_support_level_nonintegrated", "nonintegrated"),
                ("system_support_level_integrated", "integrated"),
                ("system_support_level_full_integrated", "full-integrated"),
            ],
        ))
    });

    reg.rule("service_data", service_data);
    reg.rule("data_integration_level", data_integration_level);

    reg.rule("specialized_human_resources", |i| {
        Some(rows(
            i.value,
            |item| {
                json!({
                    "specialization": field_or(item, "specialization", SPACE),
                    "characteristics": field_or(item, "characteristics", SPACE),
                })
            },
            || json!({"specialization": SPACE, "characteristics": SPACE}),
        ))
    });

    reg.rule("human_roles", human_roles);
    reg.rule("hr_assessment", hr_assessment);

    reg.rule("related_processes", |i| {
        Some(list_truthy(i.value, |item| {
            field_path_or(item, "formData.title", "")
        }))
    });

    reg.rule("process_coverage_status", |i| {
        Some(yes_no(
            i.value,
            "process_coverage_status_no",
            "process_coverage_status_yes",
        ))
    });

    reg.rule("service_delivery_channels", |i| {
        Some(rows(
            i.value,
            |item| {
                json!({
                    "channel_type": field_or(item, "channelType", SPACE),
                    "address": field_or(item, "address", SPACE),
                    "description": field_or(item, "description", SPACE),
                })
            },
            || json!({"channel_type": SPACE, "address": SPACE, "description": SPACE}),
        ))
    });

    reg.rule("service_delivery_platform", |i| {
        Some(prefixed_flags(
            i.value,
            "service_delivery_platform",
            &[
                "mpls_tehran",
                "mpls_provinces",
                "national_network",
                "government_network",
                "apn_network",
                "ptp_lines",
                "other",
            ],
        ))
    });
    reg.rule("communication_type", |i| {
        Some(prefixed_flags(i.value, "communication_type", &["electronic", "non_electronic"]))
    });
    reg.rule("electronic_types", |i| {
        Some(prefixed_flags(
            i.value,
            "electronic_types",
            &["internet", "email", "sms", "mobile_app", "postal", "other"],
        ))
    });
    reg.rule("service_type_status", |i| {
        Some(prefixed_flags(i.value, "service_type_status", &["electronic", "non_electronic"]))
    });
    reg.rule("electronic_methods", |i| {
        Some(prefixed_flags(
            i.value,
            "electronic_methods",
            &["portal", "internet", "email", "other"],
        ))
    });
    reg.rule("service_delivery_type", |i| {
        Some(prefixed_flags(i.value, "service_delivery_type", &["electronic", "non_electronic"]))
    });
    reg.rule("electronic_service_methods", |i| {
        Some(prefixed_flags(
            i.value,
            "electronic_service_methods",
            &["internet", "email", "phone_sms", "mobile_app", "postal", "other"],
        ))
    });

    reg.rule("electronic_service_status", electronic_service_status);

    for name in ISSUE_FIELDS {
        reg.rule(name, issues_pair);
    }

    reg.rule("suggestions", |i| {
        Some(json!({
            "service_nature_change": field_or(i.value, "serviceNatureChange", SPACE),
            "service_merger": field_or(i.value, "serviceMerger", SPACE),
            "new_service_definition": field_or(i.value, "newServiceDefinition", SPACE),
            "owner_unit_notes": field_or(i.value, "ownerUnitNotes", SPACE),
            "other_suggestions": field_or(i.value, "otherSuggestions", SPACE),
        }))
    });
}

/// `{name, phone}` contact rows shared by the owner/completer tables.
fn people_rows(i: &RuleInput) -> Option<Value> {
    Some(rows(
        i.value,
        |item| {
            json!({
                "name": field_or(item, "name", SPACE),
                "phone": persian_field_or(item, "phone", SPACE),
            })
        },
        || json!({"name": SPACE, "phone": SPACE}),
    ))
}

fn regions(i: &RuleInput) -> Option<Value> {
    let items = match i.value {
        Value::Array(items) if !items.is_empty() => items,
        // Legacy sentinel shape: a bare object, not a row array.
        _ => {
            return Some(json!({
                "regions": {"region": [SPACE], "subregion": [SPACE]}
            }));
        }
    };
    let out: Vec<Value> = items
        .iter()
        .map(|item| {
            let names = |key: &str| {
                list(get(item, key).unwrap_or(&Value::Null), |entry| {
                    field_or(entry, "name", SPACE)
                })
            };
            json!({"region": names("region"), "subregion": names("subregion")})
        })
        .collect();
    Some(Value::Array(out))
}

fn service_data(i: &RuleInput) -> Option<Value> {
    Some(rows(
        i.value,
        |item| {
            json!({
                "exchanged_data": field_path_or(item, "exchangedData.title", SPACE),
                "service_parameters": list(
                    get(item, "serviceParameters").unwrap_or(&Value::Null),
                    |p| field_or(p, "name", SPACE),
                ),
                "instance_values": list(
                    get(item, "instanceValues").unwrap_or(&Value::Null),
                    |v| field_or(v, "typeTitle", SPACE),
                ),
            })
        },
        || json!({"exchanged_data": SPACE, "service_parameters": [], "instance_values": []}),
    ))
}

// Long option sentences; the stable opening/closing fragments identify them.
fn data_integration_level(i: &RuleInput) -> Option<Value> {
    let text = i.value.as_str().unwrap_or("");
    let mut out = Map::new();
    out.insert(
        "data_integration_level_some".to_string(),
        Value::Bool(text.starts_with("Some")),
    );
    out.insert(
        "data_integration_level_desired".to_string(),
        Value::Bool(!text.starts_with("Some") && text.ends_with("service.")),
    );
    out.insert(
        "data_integration_level_service".to_string(),
        Value::Bool(!text.starts_with("Some") && text.ends_with("insufficient.")),
    );
    out.insert(
        "data_integration_level_supported".to_string(),
        Value::Bool(!text.starts_with("Some") && text.ends_with("mechanism.")),
    );
    Some(Value::Object(out))
}

fn human_roles(i: &RuleInput) -> Option<Value> {
    Some(rows(
        i.value,
        |item| {
            let resp = get(item, "responsibilities").unwrap_or(&Value::Null);
            json!({
                "role": field_or(item, "role", SPACE),
                "responsibilities": {
                    "responsibilities_service_provider": flag(resp, "service_provider"),
                    "responsibilities_service_approver": flag(resp, "service_approver"),
                    "responsibilities_service_supervisor": flag(resp, "service_supervisor"),
                },
            })
        },
        || {
            json!({
                "role": SPACE,
                "responsibilities": {
                    "responsibilities_service_provider": false,
                    "responsibilities_service_approver": false,
                    "responsibilities_service_supervisor": false,
                },
            })
        },
    ))
}

fn hr_assessment(i: &RuleInput) -> Option<Value> {
    if !truthy(i.value) {
        return Some(json!({"is_staff_sufficient": {}, "are_skills_available": {}}));
    }
    let answer = |key: &str| get(i.value, key).and_then(Value::as_str).unwrap_or("");
    Some(json!({
        "is_staff_sufficient": [{
            "is_staff_sufficient_yes": answer("isStaffSufficient") == "yes",
            "is_staff_sufficient_no": answer("isStaffSufficient") == "no",
        }],
        "are_skills_available": [{
            "are_skills_available_yes": answer("areSkillsAvailable") == "yes",
            "are_skills_available_no": answer("areSkillsAvailable") == "no",
        }],
    }))
}

fn electronic_service_status(i: &RuleInput) -> Option<Value> {
    if !truthy(i.value) {
        return Some(json!({
            "information_phase": {},
            "production_phase": {},
            "delivery_phase": {},
        }));
    }
    let phase = |key: &str, out_prefix: &str| {
        let answer = get(i.value, key).and_then(Value::as_str).unwrap_or("");
        let mut obj = Map::new();
        obj.insert(
            format!("{out_prefix}_electronic"),
            Value::Bool(answer == "electronic"),
        );
        obj.insert(
            format!("{out_prefix}_non_electronic"),
            Value::Bool(answer == "non_electronic"),
        );
        Value::Array(vec![Value::Object(obj)])
    };
    Some(json!({
        "information_phase": phase("informationPhase", "information_phase"),
        "production_phase": phase("productionPhase", "production_phase"),
        "delivery_phase": phase("deliveryPhase", "delivery_phase"),
    }))
}

fn issues_pair(i: &RuleInput) -> Option<Value> {
    let mut out = Map::new();
    out.insert(
        format!("{}_has_issues", i.name),
        Value::Bool(eq_chosen(i.value, "has_issues")),
    );
    out.insert(
        format!("{}_no_issues", i.name),
        Value::Bool(eq_chosen(i.value, "no_issues")),
    );
    Some(Value::Object(out))
}

fn prefixed_flags(value: &Value, prefix: &str, keys: &[&str]) -> Value {
    let mut out = Map::new();
    for key in keys {
        out.insert(format!("{prefix}_{key}"), Value::Bool(flag(value, key)));
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::super::tests::run_rule;
    use serde_json::json;

    #[test]
    fn owners_localize_phone_digits() {
        let out = run_rule(
            "service_owners",
            json!([{"name": "واحد خدمات", "phone": "02112345"}]),
        )
        .expect("set");
        assert_eq!(out, json!([{"name": "واحد خدمات", "phone": "۰۲۱۱۲۳۴۵"}]));
    }

    #[test]
    fn service_level_defaults_to_national() {
        let out = run_rule("service_level", json!("")).expect("set");
        assert_eq!(out["service_level_national"], true);
        assert_eq!(out["service_level_urban"], false);

        let out = run_rule("service_level", json!({"option": "urban"})).expect("set");
        assert_eq!(out["service_level_national"], false);
        assert_eq!(out["service_level_urban"], true);
    }

    #[test]
    fn initiation_defaults_to_user_request() {
        let out = run_rule("service_initiation", json!("specific_event")).expect("set");
        assert_eq!(out["service_initiation_specific_event"], true);
        assert_eq!(out["service_initiation_user_request"], false);

        let out = run_rule("service_initiation", json!("")).expect("set");
        assert_eq!(out["service_initiation_user_request"], true);
    }

    #[test]
    fn regions_empty_uses_legacy_sentinel() {
        let out = run_rule("regions", json!([])).expect("set");
        assert_eq!(out, json!({"regions": {"region": [" "], "subregion": [" "]}}));
    }

    #[test]
    fn regions_extract_names() {
        let out = run_rule(
            "regions",
            json!([{"region": [{"name": "تهران"}], "subregion": [{"name": "شمیرانات"}, {}]}]),
        )
        .expect("set");
        assert_eq!(out, json!([{"region": ["تهران"], "subregion": ["شمیرانات", " "]}]));
    }

    #[test]
    fn issues_pairs_key_by_placeholder() {
        let out = run_rule("database_issues", json!({"option": "has_issues"})).expect("set");
        assert_eq!(
            out,
            json!({"database_issues_has_issues": true, "database_issues_no_issues": false})
        );
    }

    #[test]
    fn hr_assessment_empty_collapses_to_bare_objects() {
        let out = run_rule("hr_assessment", json!("")).expect("set");
        assert_eq!(out, json!({"is_staff_sufficient": {}, "are_skills_available": {}}));
    }

    #[test]
    fn hr_assessment_answers_wrap() {
        let out = run_rule(
            "hr_assessment",
            json!({"isStaffSufficient": "yes", "areSkillsAvailable": "no"}),
        )
        .expect("set");
        assert_eq!(out["is_staff_sufficient"][0]["is_staff_sufficient_yes"], true);
        assert_eq!(out["are_skills_available"][0]["are_skills_available_no"], true);
    }

    #[test]
    fn data_integration_level_matches_fragments() {
        let out = run_rule(
            "data_integration_level",
            json!("Some of the required data is exchanged."),
        )
        .expect("set");
        assert_eq!(out["data_integration_level_some"], true);

        let out = run_rule(
            "data_integration_level",
            json!("Data is exchanged through a supported mechanism."),
        )
        .expect("set");
        assert_eq!(out["data_integration_level_supported"], true);
        assert_eq!(out["data_integration_level_some"], false);
    }

    #[test]
    fn related_processes_drop_missing_titles() {
        let out = run_rule(
            "related_processes",
            json!([{"formData": {"title": "فرایند الف"}}, {"formData": {}}, {}]),
        )
        .expect("set");
        assert_eq!(out, json!(["فرایند الف"]));
    }
}
