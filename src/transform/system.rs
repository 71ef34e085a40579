use serde_json::{json, Map, Value};

use super::rules::*;
use super::Registry;
use crate::jalali::to_solar_hijri;
use crate::resolve::{deep_get, resolve_path, truthy};

// Strict checkbox groups. Stored objects carry a literal `true` per picked
// option; legacy single answers arrive as the bare option string.
const MULTI_SELECT_FIELDS: &[(&str, &[&str])] = &[
    (
        "operating_system",
        &["windows", "linux", "other", "unix", "mac", "cloud_os", "embedded_os"],
    ),
    (
        "programming_languages",
        &[
            "java",
            "dotnet",
            "dotnetcore",
            "python",
            "javascript",
            "typescript",
            "ruby",
            "php",
            "go",
            "swift",
            "other",
        ],
    ),
    (
        "frameworks",
        &[
            "spring", "rails", "dotnet", "react", "angular", "vue", "flask", "laravel",
            "django", "express", "other",
        ],
    ),
    (
        "database",
        &[
            "sqlserver",
            "mysql",
            "postgresql",
            "oracle",
            "mongodb",
            "redis",
            "cassandra",
            "access",
            "other",
        ],
    ),
    (
        "infrastructure",
        &[
            "none",
            "docker",
            "kubernetes",
            "ansible",
            "terraform",
            "aws",
            "google_cloud",
            "azure",
            "other",
        ],
    ),
    (
        "monitoring_tools",
        &[
            "none",
            "grafana",
            "prometheus",
            "elk",
            "datadog",
            "new_relic",
            "zabbix",
            "other",
        ],
    ),
    ("authentication_methods", &["username_password", "mfa", "biometric"]),
    ("backup_method", &["automatic", "manual"]),
    ("backup_type", &["continuous", "differential", "incremental", "full"]),
    ("backup_schedule", &["yearly", "quarterly", "monthly", "weekly", "daily"]),
    ("backup_storage", &["offsite", "network", "cloud", "local"]),
    ("backup_testing", &["none", "emergency", "regular"]),
    (
        "retention_policy",
        &["none", "one_year", "six_months", "three_months", "one_month"],
    ),
    ("penetration_testing", &["black", "white", "gray", "not_done"]),
    ("hardening", &["done", "not_done"]),
    ("security_certification", &["has_afta", "has_other", "no_certification"]),
];

// Development restriction questions share one shape, each reading its own
// sub-field of the stored answer.
const DEV_LIMIT_FIELDS: &[(&str, &str)] = &[
    ("db_dev_limits", "database_development"),
    ("app_dev_limits", "application_development"),
    ("service_dev_limits", "service_development"),
];

// Documentation inventory, one three-state answer per artifact.
const DOCUMENT_FIELDS: &[&str] = &[
    "requirements_docs",
    "analysis_docs",
    "architecture_docs",
    "implementation_docs",
    "test_docs",
    "user_manual",
    "operation_manual",
    "source_code",
    "security_docs",
    "risk_assessment",
];

// How often each quality attribute is reported as a problem. data_encryption
// belongs to this list too but needs its own dispatch, see below.
const QUALITY_FIELDS: &[&str] = &[
    "authentication",
    "access_control",
    "activity_logging",
    "standard_protocols",
    "data_format",
    "data_import",
    "data_export",
    "data_recovery",
    "error_prevention",
    "error_free",
    "requirement_coverage",
    "change_time",
    "ui_consistency",
    "ui_attractiveness",
    "terminology",
    "ui_customization",
    "workflow_match",
    "operation_speed",
    "resource_usage",
    "user_impact",
    "scalability",
];

const YES_NO_FIELDS: &[&str] = &[
    "ai_usage",
    "blockchain",
    "pki",
    "directDbAccess",
    "recovery_mechanism",
    "replacementPlan",
    "reports_status",
    "local_backup_by_admin",
    "systemInteraction",
];

const SERVER_TYPES: &[&str] = &["physical_server", "virtual_server", "cloud_server"];
const CPU_CORES: &[&str] = &["2_cores", "8_cores", "16_cores", "32_cores", "64_cores_plus"];
const MEMORY_SIZES: &[&str] = &[
    "less_than_8gb",
    "8_to_16gb",
    "16_to_32gb",
    "32_to_64gb",
    "64_to_128gb",
    "128_to_512gb",
    "more_than_512gb",
];
// The stored storage literal and the template key disagree on one tier.
const STORAGE_SIZES: &[(&str, &str)] = &[
    ("less_than_500gb", "less_than_500gb"),
    ("500gb_to_1tb", "500gb_to_1tb"),
    ("1tb_to_5tb", "1_to_5tb"),
    ("more_than_5tb", "more_than_5tb"),
];
const GPU_TYPES: &[&str] = &["not_required", "standard_card", "advanced_card"];
const BACKUP_SPACES: &[&str] = &["1_to_5tb", "5_to_10tb", "10_to_25tb", "25_to_50tb", "more_than_50tb"];

pub(super) fn register(reg: &mut Registry) {
    reg.rule("system_title", |i| Some(i.value.clone()));
    reg.rule("system_title_1", |i| Some(i.value.clone()));
    reg.rule("systemMission", |i| Some(i.value.clone()));
    reg.rule("contractorInfo", |i| Some(i.value.clone()));

    reg.rule("systemUrls", |i| {
        let out: Vec<Value> = coerce_list(i.value)
            .iter()
            .map(|item| match item {
                Value::Object(_) => field_or(item, "url", ""),
                _ => item.clone(),
            })
            .filter(truthy)
            .collect();
        Some(Value::Array(out))
    });

    reg.rule("system_type", |i| {
        Some(wrapped(choice_exact(
            i.value,
            &[
                ("specialized", "Specialized"),
                ("non-specialized", "non-specialized"),
                ("out-of-scope", "out-of-scope"),
            ],
        )))
    });

    reg.rule("system_user", |i| {
        Some(list(i.value, |item| {
            json!({"name": field_path_or(item, "name.name", "")})
        }))
    });

    reg.rule("system_owner", |i| {
        Some(rows(
            i.value,
            |item| {
                json!({
                    "name": field_or(item, "name", SPACE),
                    "department": field_path_or(item, "department.name", SPACE),
                    "mobile": persian_field_or(item, "mobile", SPACE),
                })
            },
            || json!({"name": SPACE, "department": SPACE, "mobile": SPACE}),
        ))
    });

    reg.rule("filler_name", |i| {
        let name = match i.value.as_object() {
            Some(m) => {
                let first = m.get("firstname").and_then(Value::as_str).unwrap_or("");
                let last = m.get("lastname").and_then(Value::as_str).unwrap_or("");
                format!("{first} {last}").trim().to_string()
            }
            None => String::new(),
        };
        Some(Value::String(name))
    });

    reg.rule("mainFunctions", |i| {
        Some(match i.value {
            Value::Array(items) if !items.is_empty() => i.value.clone(),
            _ => Value::Array(Vec::new()),
        })
    });

    reg.rule("supported_services", service_titles);
    reg.rule("unsupported_services", service_titles);

    reg.rule("legals_table", |i| {
        let out: Vec<Value> = coerce_list(i.value)
            .iter()
            .map(|item| {
                json!({
                    "legal_material": field_path_or(item, "lawDetails.title", ""),
                    "legal_description": field_or(item, "description", ""),
                })
            })
            .collect();
        Some(if out.is_empty() {
            json!([{"legal_material": SPACE, "legal_description": SPACE}])
        } else {
            Value::Array(out)
        })
    });

    reg.rule("acquisition_method", |i| {
        Some(wrapped(choice_flags(
            i.value,
            &[
                "internal_development",
                "package_purchase",
                "outsourced_development",
                "hybrid_purchase",
                "other",
            ],
        )))
    });

    reg.rule("current_status", |i| {
        Some(wrapped(bool_copy(
            i.value,
            &[
                "work_referral",
                "analysis",
                "design",
                "implementation",
                "deployment",
                "operational",
                "maintenance",
                "future_development",
                "retired",
            ],
        )))
    });

    reg.rule("system_start_date", |i| {
        Some(Value::String(to_solar_hijri(i.value)))
    });

    reg.rule("subsystem", |i| {
        Some(choice_flags(i.value, &["is_subsystem", "has_subsystems", "no"]))
    });

    reg.rule("duplicate_systems", duplicate_systems);
    reg.rule("data_table", data_table);

    reg.rule("unsupportedData_table", |i| {
        Some(rows(
            i.value,
            |item| {
                json!({
                    "unsupportedData": field_path_or(item, "dataName.title", SPACE),
                    "description": field_or(item, "description", SPACE),
                })
            },
            || json!({"unsupportedData": SPACE, "description": SPACE}),
        ))
    });

    reg.rule("systemInteraction_table", |i| {
        Some(rows(i.value, interaction_row, || {
            json!({
                "systemName": [],
                "exchangeData": [],
                "exchangeType": [{"send": false, "receive": false}],
                "exchangeMethod": [{
                    "api": false,
                    "mech_file": false,
                    "manual_file": false,
                    "db_connection": false,
                }],
                "serviceParameters": [],
                "exchangeReason": SPACE,
            })
        }))
    });

    reg.rule("desiredSystemRelations_table", |i| {
        Some(rows(i.value, desired_relation_row, || {
            json!({"desired_systemName": SPACE, "desired_exchangeData": SPACE})
        }))
    });

    reg.rule("systemRelationIssues_table", |i| {
        Some(match i.value {
            Value::Array(items) if !items.is_empty() => i.value.clone(),
            _ => json!([{"system": SPACE, "issue": SPACE, "solution": SPACE}]),
        })
    });

    reg.rule("unauthorizedUsers_table", |i| {
        Some(rows(
            i.value,
            |item| {
                json!({
                    "user": field_or(item, "userGroup", SPACE),
                    "reason": field_or(item, "reason", SPACE),
                })
            },
            || json!({"user": SPACE, "reason": SPACE}),
        ))
    });

    reg.rule("architecture", |i| {
        Some(wrapped(choice_flags(
            i.value,
            &[
                "service_oriented",
                "serverless",
                "single_tier",
                "multi_tier",
                "microservices",
                "other",
            ],
        )))
    });

    for (name, _) in MULTI_SELECT_FIELDS.iter().copied() {
        reg.rule(name, multi_select_rule);
    }

    reg.rule("third_party_tools", |i| {
        Some(match i.value {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|v| if flag(v, "tool") { v.clone() } else { json!({"tool": v}) })
                    .collect(),
            ),
            Value::String(s) if !s.trim().is_empty() => json!([{"tool": s}]),
            _ => Value::Array(Vec::new()),
        })
    });

    reg.rule("db_constraints", |i| {
        Some(wrapped(choice_flags(i.value, &["good", "medium", "weak"])))
    });
    reg.rule("load_balancing", |i| {
        Some(wrapped(choice_flags(
            i.value,
            &["application_level", "database_level", "both", "none"],
        )))
    });
    reg.rule("pki_implementation", |i| {
        Some(wrapped(choice_flags(
            i.value,
            &["on_premises", "cloud_based", "hybrid"],
        )))
    });
    reg.rule("pki_usage", pki_usage);

    reg.rule("centralization", |i| {
        Some(match i.value {
            Value::Object(_) => wrapped(json!({
                "database_distribution":
                    eq_chosen(sub(i.value, "database_distribution"), "distributed"),
                "application_distribution":
                    eq_chosen(sub(i.value, "application_distribution"), "distributed"),
            })),
            _ => Value::Bool(false),
        })
    });

    for (name, _) in DEV_LIMIT_FIELDS.iter().copied() {
        reg.rule(name, dev_limits);
    }

    reg.rule("development_challenges", |i| {
        const KEYS: &[&str] = &[
            "none",
            "high_cost_time",
            "contract_issues",
            "technical_complexity",
            "no_access_to_developer",
        ];
        Some(wrapped(match i.value {
            Value::Array(items) => {
                let mut out = Map::new();
                for &key in KEYS {
                    let hit = items.iter().any(|v| v.as_str() == Some(key));
                    out.insert(key.to_string(), Value::Bool(hit));
                }
                Value::Object(out)
            }
            Value::Object(_) => bool_copy(i.value, KEYS),
            _ => bool_copy(&NULL, KEYS),
        }))
    });

    reg.rule("current_hardware", current_hardware);
    reg.rule("future_hardware", future_hardware);

    reg.rule("support_method", |i| {
        Some(wrapped(choice_flags(
            i.value,
            &["contractor", "organization", "both", "none"],
        )))
    });
    reg.rule("support_quality", |i| {
        Some(wrapped(choice_flags(i.value, &["good", "medium", "weak"])))
    });
    reg.rule("intellectual_property", |i| {
        Some(wrapped(choice_flags(
            i.value,
            &["organization", "other_organization", "developer"],
        )))
    });
    reg.rule("user_satisfaction", |i| {
        Some(wrapped(choice_flags(
            i.value,
            &["low", "medium", "high", "very_high"],
        )))
    });

    for name in DOCUMENT_FIELDS {
        reg.rule(name, document_status);
    }
    for name in QUALITY_FIELDS {
        reg.rule(name, quality_frequency);
    }
    reg.rule("data_encryption", data_encryption);
    for name in YES_NO_FIELDS {
        reg.rule(name, yes_no_flags);
    }
}

/// Single-choice flags where the template key is also the stored option
/// literal.
fn choice_flags(field: &Value, options: &[&str]) -> Value {
    let mut out = Map::new();
    for &opt in options {
        out.insert(opt.to_string(), Value::Bool(eq_chosen(field, opt)));
    }
    Value::Object(out)
}

/// Checkbox group flags: object input copies literal `true` picks, a bare
/// string marks exactly one option.
fn multi_select(field: &Value, options: &[&str]) -> Value {
    let mut out = Map::new();
    for &opt in options {
        let hit = match field {
            Value::Object(_) => checked(field, opt),
            Value::String(s) => s == opt,
            _ => false,
        };
        out.insert(opt.to_string(), Value::Bool(hit));
    }
    Value::Object(out)
}

fn multi_select_rule(i: &RuleInput) -> Option<Value> {
    let options = MULTI_SELECT_FIELDS
        .iter()
        .copied()
        .find(|(name, _)| *name == i.name)
        .map(|(_, options)| options)?;
    Some(wrapped(multi_select(i.value, options)))
}

/// `value || []` with scalars wrapped into a one-element list.
fn coerce_list(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        v if truthy(v) => vec![v.clone()],
        _ => Vec::new(),
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn service_titles(i: &RuleInput) -> Option<Value> {
    let out: Vec<Value> = coerce_list(i.value)
        .iter()
        .map(|service| {
            if service.is_string() {
                service.clone()
            } else {
                let t = field_path_or(service, "serviceId.title", "");
                if truthy(&t) {
                    t
                } else {
                    field_or(service, "title", "")
                }
            }
        })
        .filter(truthy)
        .collect();
    Some(Value::Array(out))
}

/// Overlap rows re-resolve the referenced system through the system_title
/// mapping so both columns render from the same path.
fn duplicate_systems(i: &RuleInput) -> Option<Value> {
    let title_path = i.mappings.path_for("system_title");
    let items = coerce_list(i.value);
    let mut out = Vec::new();
    for item in &items {
        let referenced = match get(item, "systemName") {
            Some(v) if truthy(v) => v,
            _ => &NULL,
        };
        let title = match title_path {
            Some(path) => resolve_path(referenced, path),
            None => Value::String(String::new()),
        };
        let functions = match get(item, "duplicateFunctions") {
            Some(Value::Array(fns)) => fns
                .iter()
                .map(|f| field_or(f, "name", ""))
                .filter(truthy)
                .map(|v| text_of(&v))
                .collect::<Vec<_>>()
                .join(", "),
            _ => String::new(),
        };
        out.push(json!({
            "duplicate_system": text_or(&title, ""),
            "duplicate_functions": functions,
            "duplicateSystems_reason": field_or(item, "reason", ""),
        }));
    }
    if out.is_empty() {
        out.push(json!({
            "duplicate_system": SPACE,
            "duplicate_functions": SPACE,
            "duplicateSystems_reason": SPACE,
        }));
    }
    Some(Value::Array(out))
}

fn data_table(i: &RuleInput) -> Option<Value> {
    const ROLES: &[&str] = &["data_steward", "data_entry_point", "data_producer"];
    const SOURCES: &[&str] = &[
        "user_input",
        "operations",
        "internal_system",
        "external_org",
        "import",
        "hardware",
    ];
    Some(rows(
        i.value,
        |item| {
            json!({
                "data_name": field_path_or(item, "dataName.title", SPACE),
                "system_role": [bool_copy(sub(item, "systemRole"), ROLES)],
                "data_source": [bool_copy(sub(item, "dataSource"), SOURCES)],
                "description": field_or(item, "description", SPACE),
            })
        },
        || {
            json!({
                "data_name": SPACE,
                "system_role": [bool_copy(&NULL, ROLES)],
                "data_source": [bool_copy(&NULL, SOURCES)],
                "description": SPACE,
            })
        },
    ))
}

fn interaction_row(row: &Value) -> Value {
    let names = list(sub(row, "systemNames"), |s| {
        let t = field_path_or(s, "formData.system_title", "");
        if truthy(&t) {
            t
        } else {
            field_or(s, "name", "")
        }
    });
    let data = list(sub(row, "exchangedData"), |d| {
        let t = field_path_or(d, "formData.title", "");
        if truthy(&t) {
            t
        } else {
            field_or(d, "title", "")
        }
    });
    let params = list(sub(row, "serviceParameters"), |sp| {
        let t = field_path_or(sp, "formData.title", "");
        if truthy(&t) {
            return t;
        }
        let t = field_or(sp, "title", "");
        if truthy(&t) {
            return t;
        }
        field_or(sp, "name", "")
    });
    json!({
        "systemName": names,
        "exchangeData": data,
        "exchangeType": [{
            "send": eq_chosen(sub(row, "exchangeType"), "send"),
            "receive": eq_chosen(sub(row, "exchangeType"), "receive"),
        }],
        "exchangeMethod": [bool_copy(
            sub(row, "exchangeMethod"),
            &["api", "mech_file", "manual_file", "db_connection"],
        )],
        "serviceParameters": params,
        "exchangeReason": field_or(row, "exchangeReason", ""),
    })
}

fn desired_relation_row(row: &Value) -> Value {
    let target = sub(row, "systemName");
    let system = match target {
        Value::Object(_) => {
            let t = field_path_or(target, "formData.system_title", "");
            if truthy(&t) {
                t
            } else {
                field_or(target, "name", "")
            }
        }
        Value::String(_) => target.clone(),
        _ => Value::String(String::new()),
    };
    let exchanged = sub(row, "exchangedData");
    let data = match exchanged {
        Value::Array(items) => Value::String(
            items
                .iter()
                .map(exchanged_title)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Object(_) => {
            let t = field_path_or(exchanged, "formData.title", "");
            if truthy(&t) {
                t
            } else {
                field_or(exchanged, "title", "")
            }
        }
        Value::String(_) => exchanged.clone(),
        _ => Value::String(String::new()),
    };
    json!({"desired_systemName": system, "desired_exchangeData": data})
}

fn exchanged_title(entry: &Value) -> String {
    let t = field_path_or(entry, "formData.title", "");
    if truthy(&t) {
        return text_of(&t);
    }
    let t = field_or(entry, "title", "");
    if truthy(&t) {
        return text_of(&t);
    }
    text_of(entry)
}

// pki_usage is asked twice: a checkbox group on the system form and a
// Yes/No/Partially question on the infrastructure form. Dispatch on shape.
fn pki_usage(i: &RuleInput) -> Option<Value> {
    if let Value::Object(map) = i.value {
        if !map.contains_key("option") {
            let pick = |key: &str| match map.get(key) {
                Some(v) => v.clone(),
                None => Value::Bool(false),
            };
            return Some(wrapped(json!({
                "encryption": pick("encryption"),
                "digital_signing": pick("digital_signing"),
                "authentication": pick("authentication"),
            })));
        }
    }
    tri_state(Some(i.value))
}

fn dev_limits(i: &RuleInput) -> Option<Value> {
    let key = DEV_LIMIT_FIELDS
        .iter()
        .copied()
        .find(|(name, _)| *name == i.name)
        .map(|(_, key)| key)?;
    Some(wrapped(choice_flags(
        sub(i.value, key),
        &["free_no_cost", "free_with_cost", "limited"],
    )))
}

fn current_hardware(i: &RuleInput) -> Option<Value> {
    let machines = deep_get(i.raw, "formData.current_hardware").unwrap_or(&NULL);
    Some(rows(machines, current_hardware_row, || {
        current_hardware_row(&NULL)
    }))
}

fn future_hardware(i: &RuleInput) -> Option<Value> {
    let machines = deep_get(i.raw, "formData.future_hardware").unwrap_or(&NULL);
    Some(rows(machines, future_hardware_row, || {
        future_hardware_row(&NULL)
    }))
}

fn current_hardware_row(hw: &Value) -> Value {
    let desc = field_or(hw, "server_desc", "");
    json!({
        "machineName": field_or(hw, "machineName", SPACE),
        "ipAddress": persian_field_or(hw, "ipAddress", SPACE),
        "current_server_type": choice_flags(sub(hw, "server_type"), SERVER_TYPES),
        "current_cpu": choice_flags(sub(hw, "cpu_cores"), CPU_CORES),
        "current_memory": choice_flags(sub(hw, "memory"), MEMORY_SIZES),
        "current_storage": choice_exact(sub(hw, "storage"), STORAGE_SIZES),
        "current_gpu": choice_flags(sub(hw, "gpu"), GPU_TYPES),
        "current_backup_space": choice_flags(sub(hw, "backup_space"), BACKUP_SPACES),
        "description": if truthy(&desc) { desc } else { field_or(hw, "description", SPACE) },
    })
}

fn future_hardware_row(hw: &Value) -> Value {
    json!({
        "future_server_type": choice_flags(sub(hw, "future_server_type"), SERVER_TYPES),
        "future_cpu": choice_flags(sub(hw, "future_cpu_cores"), CPU_CORES),
        "future_memory": choice_flags(sub(hw, "future_memory"), MEMORY_SIZES),
        "future_storage": choice_exact(sub(hw, "future_storage"), STORAGE_SIZES),
        "future_gpu": choice_flags(sub(hw, "future_gpu"), GPU_TYPES),
        "future_backup_space": choice_flags(sub(hw, "future_backup_space"), BACKUP_SPACES),
        "description": field_or(hw, "description", SPACE),
    })
}

fn document_status(i: &RuleInput) -> Option<Value> {
    Some(wrapped(choice_flags(
        i.value,
        &["not_exists", "exists_outdated", "exists_updated"],
    )))
}

fn quality_frequency(i: &RuleInput) -> Option<Value> {
    Some(wrapped(choice_flags(
        i.value,
        &["never", "often", "sometimes", "rarely"],
    )))
}

// data_encryption doubles as an infrastructure question with Yes/No/Partially
// answers; frequency literals pick the quality shape.
fn data_encryption(i: &RuleInput) -> Option<Value> {
    if matches!(
        option_str(i.value),
        Some("never" | "often" | "sometimes" | "rarely")
    ) {
        return quality_frequency(i);
    }
    tri_state(Some(i.value))
}

fn yes_no_flags(i: &RuleInput) -> Option<Value> {
    Some(wrapped(choice_flags(i.value, &["yes", "no"])))
}
