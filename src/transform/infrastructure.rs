use serde_json::{json, Map, Value};

use super::rules::*;
use super::Registry;
use crate::resolve::truthy;

// Tooling inventory tables, all one shape. Row keys are prefixed per table;
// the first table's open-source key kept an underscore and templates bind to
// it, so the prefix and key spelling are both fixed.
const TOOLING_TABLES: &[(&str, &str)] = &[
    ("monitoring_and_control", "monitoring"),
    ("backup", "backup"),
    ("remote_connection", "remote_connection"),
    ("server_infrastructure_monitoring", "server_infrastructure_monitoring"),
    ("configuration_change_management", "configuration_change_management"),
    ("ipam_documentation", "ipam_documentation"),
    ("ticketing_helpdesk", "ticketing_helpdesk"),
    ("security_ids_ips_siem", "security_ids_ips_siem"),
    ("traffic_analysis_troubleshooting", "traffic_analysis_troubleshooting"),
    ("automation_orchestration", "automation_orchestration"),
    ("reporting_dashboard", "reporting_dashboard"),
    ("access_identity_management", "access_identity_management"),
];

// Yes/No/Partially questions across the network sections. data_encryption
// and pki_usage also appear on the system form; their dispatching rules live
// in system.rs.
const TRI_STATE_FIELDS: &[&str] = &[
    "network_diagrams",
    "structured_cabling",
    "vlan_implementation",
    "network_inventory",
    "redundancy",
    "internet_rbac",
    "internet_scheduling",
    "internet_auth",
    "internet_monitoring",
    "internet_reports",
    "internet_alerts",
    "access_control_security",
    "network_access_control",
    "network_segmentation",
    "firewalls",
    "ids_ips",
    "network_traffic_analysis",
    "patch_management",
    "hardware_security",
    "least_privilege",
    "sso_support",
    "two_factor_authentication",
    "isms_implementation",
    "security_benchmark_usage",
    "network_policy_documentation",
    "drp",
    "bcp",
    "security_scans",
];

// Documentation inventory; each placeholder classifies one artifact with
// keys derived from its stem.
const DOCUMENTATION_FIELDS: &[(&str, &str)] = &[
    ("physical_logical_map_documentation", "physical_logical_map"),
    ("physical_network_map", "physical_network_map"),
    ("logical_network_map", "logical_network_map"),
    ("ip_addressing_documentation", "ip_addressing_documentation"),
    ("equipment_configuration_docs", "equipment_configuration_docs"),
    ("change_documentation", "change_documentation"),
    ("security_documentation", "security_documentation"),
    ("admin_and_access_docs", "admin_and_access_docs"),
    ("backup_and_recovery_docs", "backup_and_recovery_docs"),
    ("server_technical_docs", "server_technical_docs"),
    ("monitoring_and_reporting_docs", "monitoring_and_reporting_docs"),
    ("sop_documentation", "sop_documentation"),
    ("compliance_and_audit_docs_national", "compliance_and_audit_docs_national"),
    ("compliance_and_audit_docs_international", "compliance_and_audit_docs_international"),
    ("internal_wiki", "internal_wiki"),
    ("physical_equipment", "physical_equipment"),
];

// Checkbox captions are full sentences in the stored data; template flags
// are short. Literal `true` only.
const PKI_SECURITY: &[(&str, &str)] = &[
    (
        "pki_security_digital_signature",
        "Support for digital signature mechanism - e.g., for electronic documents or transactions.",
    ),
    (
        "pki_security_timestamping",
        "Support for timestamping mechanism - to record the time of digital signatures.",
    ),
    (
        "pki_security_ssh",
        "Support for SSH strong authentication using certificates instead of passwords.",
    ),
    (
        "pki_security_2fa",
        "Certificate-based two-factor authentication (2FA) - e.g., Smart Card or certificate-based MFA.",
    ),
    (
        "pki_security_ssl",
        "Use of SSL/TLS certificates for websites and internal services - for encryption and server authentication.",
    ),
    ("pki_security_ipsec", "Use of IPSec with certificates - for secure WAN/LAN tunnels."),
    (
        "pki_security_secure_email",
        "Use of secure email certificates (S/MIME) - for email encryption and signing.",
    ),
    (
        "pki_security_code_signing",
        "Code signing - to ensure integrity and authenticity of executable code.",
    ),
    (
        "pki_security_encrypted_data",
        "Certificate-based encrypted data exchange - e.g., using XML Signature or PKCS#7.",
    ),
    ("pki_security_other", "Other - please specify:"),
];

const PUBLIC_KEY: &[(&str, &str)] = &[
    ("public_key_digital_signature", "Support for digital signature mechanism."),
    ("public_key_timestamping", "Support for timestamping mechanism."),
    ("public_key_ssh", "Support for strong SSH authentication protocol."),
    ("public_key_2fa", "Capability for two-factor authentication based on PKI."),
    ("public_key_ssl", "Use of SSL/TLS certificates."),
    ("public_key_ipsec", "Use of Internet Protocol Security (IPSec)."),
    ("public_key_secure_email", "Use of secure email certificates."),
    ("public_key_code_signing", "Code signing to ensure code integrity and authenticity."),
    (
        "public_key_encrypted_data",
        "Encrypted data exchange based on PKI using electronic certificates.",
    ),
];

pub(super) fn register(reg: &mut Registry) {
    // form_completed_by shares the service form's contact-row rule.
    reg.rule("interviewees", |i| {
        Some(rows(
            i.value,
            |item| {
                json!({
                    "fullname": field_or(item, "fullname", SPACE),
                    "phone": field_or(item, "phone", SPACE),
                })
            },
            || json!({"fullname": SPACE, "phone": SPACE}),
        ))
    });

    reg.rule("data_center", |i| Some(list(i.value, data_center_row)));

    for name in TRI_STATE_FIELDS {
        reg.rule(name, plain_tri_state);
    }

    reg.rule("internet", |i| Some(i.value.clone()));
    reg.rule("local", |i| Some(i.value.clone()));
    reg.rule("custom", |i| Some(i.value.clone()));
    reg.rule("users", |i| Some(i.value.clone()));

    reg.rule("auth", |i| {
        count_object(
            Some(i.value),
            &[
                ("centralized_auth", "Centralized"),
                // Key misspelling is load-bearing, templates bind to it.
                ("seperated_auth", "Separate"),
                ("combined_auth", "Combined"),
            ],
        )
    });

    for (name, _) in TOOLING_TABLES.iter().copied() {
        reg.rule(name, tooling_table);
    }

    reg.rule("access", |i| {
        Some(renamed_checks(
            i.value,
            &[
                ("access_bandwidth", "Bandwidth"),
                ("access_latency", "Latency"),
                ("access_availability", "Availability percentage"),
                ("access_packet", "Packet loss"),
                ("access_port", "Port/Interface errors"),
                ("access_device", "Device temperature"),
                ("access_cpu", "CPU and network memory usage"),
                ("access_unusual", "Unusual or suspicious traffic"),
                ("access_link", "Link and connection status"),
                ("access_number", "Number of concurrent users"),
                ("access_traffic", "Traffic by protocol or application"),
                ("access_security", "Security and access logs"),
                ("access_health", "Health of key services (DNS, DHCP, AD, etc.)"),
            ],
        ))
    });

    reg.rule("public_key_infrastructure", |i| Some(list(i.value, pki_row)));

    reg.rule("network_staff_count", |i| {
        count_object(
            Some(i.value),
            &[
                ("network_staff_0", "0"),
                ("network_staff_1", "1"),
                ("network_staff_2_3", "2"),
                ("network_staff_4_6", "4"),
                ("network_staff_more", "More"),
            ],
        )
    });
    reg.rule("network_team_certification", |i| {
        count_object(
            Some(i.value),
            &[
                ("network_team_certification_no", "No"),
                ("network_team_certification_basic", "Basic"),
                ("network_team_certification_advanced", "Advanced"),
                ("network_team_certification_specialized", "Specialized"),
                ("network_team_certification_combination", "Combination"),
            ],
        )
    });
    reg.rule("network_task_access_separation", |i| {
        count_object(
            Some(i.value),
            &[
                ("network_task_access_separation_one", "All"),
                ("network_task_access_separation_centralized", "Tasks are divided,"),
                ("network_task_access_separation_rolebased", "Tasks are divided –"),
                ("network_task_access_separation_fullrbac", "Full"),
                ("network_task_access_separation_review", "RBAC"),
            ],
        )
    });
    reg.rule("network_emergency_availability", |i| {
        count_object(
            Some(i.value),
            &[
                ("network_emergency_availability_none", "No"),
                ("network_emergency_availability_one", "Emergency"),
                ("network_emergency_availability_oncall", "Defined"),
                ("network_emergency_availability_team", "On-call"),
                ("network_emergency_availability_247", "24/7"),
            ],
        )
    });
    reg.rule("network_team_training", |i| {
        count_object(
            Some(i.value),
            &[
                ("network_team_training_none", "No"),
                ("network_team_training_reactive", "Only"),
                ("network_team_training_yearly", "Once"),
                ("network_team_training_6months", "Every"),
                ("network_team_training_specialized", "Quarterly"),
            ],
        )
    });
    reg.rule("network_backup_roles", |i| {
        count_object(
            Some(i.value),
            &[
                ("network_backup_roles_none", "No"),
                ("network_backup_roles_few", "Only"),
                ("network_backup_roles_technical", "For"),
                ("network_backup_roles_assigned", "Backup assigned"),
                ("network_backup_roles_full", "Backup +"),
            ],
        )
    });
    reg.rule("network_kpi_evaluation", |i| {
        count_object(
            Some(i.value),
            &[
                ("network_kpi_evaluation_none", "No"),
                ("network_kpi_evaluation_qualitative", "Qualitative"),
                ("network_kpi_evaluation_general", "General"),
                ("network_kpi_evaluation_quantitative", "Quantitative"),
                ("network_kpi_evaluation_full", "KPIs"),
            ],
        )
    });

    reg.rule("authentication_methods_current", |i| {
        Some(renamed_checks(
            i.value,
            &[
                (
                    "password",
                    "Username and password only, without any additional security layer.",
                ),
                (
                    "smartcard",
                    "Smart card (e.g., HID, Smart Card) used as part of MFA or as password replacement.",
                ),
                (
                    "biometric",
                    "Fingerprint or biometric authentication, either standalone or combined with other methods.",
                ),
                ("authentication_methods_current_other", "Other"),
            ],
        ))
    });
    reg.rule("authentication_types_supported", |i| {
        Some(renamed_checks(
            i.value,
            &[
                (
                    "authentication_types_supported_local",
                    "Local authentication, e.g., local users on servers or devices.",
                ),
                (
                    "authentication_types_supported_remote",
                    "Remote authentication, e.g., VPN, RDP, SSH via RADIUS/LDAP.",
                ),
                (
                    "authentication_types_supported_cascading",
                    "Cascading authentication, e.g., AD authentication propagated to other services.",
                ),
            ],
        ))
    });

    reg.rule("authentication_protocols", |i| Some(text_or(i.value, SPACE)));
    reg.rule("auth_policies_standards", |i| Some(text_or(i.value, SPACE)));
    reg.rule("user_role_management_tools", |i| Some(text_or(i.value, SPACE)));

    reg.rule("authentication_capacity", |i| {
        count_object(
            Some(i.value),
            &[
                ("authentication_capacity_unknown", "Unknown"),
                ("authentication_capacity_lt100", "Less"),
                ("authentication_capacity_100_1000", "100"),
                ("authentication_capacity_gt1000", "More"),
            ],
        )
    });

    for (name, _) in DOCUMENTATION_FIELDS.iter().copied() {
        reg.rule(name, documentation_status);
    }

    reg.rule("descs", |i| Some(text_or(i.value, SPACE)));
    reg.rule("problems_suggestions", |i| Some(text_or(i.value, SPACE)));
}

fn plain_tri_state(i: &RuleInput) -> Option<Value> {
    tri_state(Some(i.value))
}

/// Long checkbox captions keyed to short template flags, literal `true` only.
fn renamed_checks(field: &Value, pairs: &[(&str, &str)]) -> Value {
    let mut out = Map::new();
    for &(key, caption) in pairs {
        out.insert(key.to_string(), Value::Bool(checked(field, caption)));
    }
    Value::Object(out)
}

/// A missing or null sub-answer counts as the first ("No") column in the
/// legacy tables.
fn absent_or(field: Option<&Value>, literal: &str) -> bool {
    match field {
        None | Some(Value::Null) => true,
        Some(v) => eq_chosen(v, literal),
    }
}

fn data_center_row(item: &Value) -> Value {
    let mut row = Map::new();
    row.insert(
        "type".to_string(),
        json!({
            "data_center": eq_chosen(sub(item, "type"), "Data Center"),
            "server_room": eq_chosen(sub(item, "type"), "Server Room"),
        }),
    );
    row.insert(
        "owner".to_string(),
        json!({
            "organization": eq_chosen(sub(item, "owner"), "Organization"),
            "other_owner": eq_chosen(sub(item, "owner"), "Other - specify:"),
            "other_owner_text": field_path_or(item, "owner.otherText", SPACE),
        }),
    );
    set_opt(&mut row, "physical_location", get(item, "physical-location").cloned());
    row.insert(
        "status".to_string(),
        json!({
            "supplying": eq_chosen(sub(item, "status"), "Supplying/Installing"),
            "operational": eq_chosen(sub(item, "status"), "Operational"),
            "replaced": eq_chosen(sub(item, "status"), "Being Replaced (Removed)"),
            "other_status": eq_chosen(sub(item, "status"), "Other - specify:"),
            "other_status_text": field_path_or(item, "status.otherText", SPACE),
        }),
    );
    set_opt(&mut row, "power_outage_resilience", tri_state(get(item, "power_outage_resilience")));
    set_opt(&mut row, "temperature_monitoring", tri_state(get(item, "temperature_monitoring")));
    set_opt(&mut row, "fire_suppression", tri_state(get(item, "fire_suppression")));
    set_opt(&mut row, "access_control_data", tri_state(get(item, "access_control")));
    set_opt(&mut row, "locked_cabinets", tri_state(get(item, "locked_cabinets")));
    set_opt(&mut row, "network_redundancy", tri_state(get(item, "network_redundancy")));
    set_opt(&mut row, "backup_and_recovery", tri_state(get(item, "backup_and_recovery")));
    set_opt(&mut row, "change_management", tri_state(get(item, "change_management")));
    set_opt(&mut row, "disaster_recovery_plan", tri_state(get(item, "disaster_recovery_plan")));
    set_opt(&mut row, "services", get(item, "services").cloned());
    set_opt(&mut row, "catalog", tri_state(get(item, "catalog")));
    set_opt(&mut row, "service_level_agreement", tri_state(get(item, "service-level-agreement")));
    Value::Object(row)
}

fn tooling_table(i: &RuleInput) -> Option<Value> {
    let prefix = TOOLING_TABLES
        .iter()
        .copied()
        .find(|(name, _)| *name == i.name)
        .map(|(_, prefix)| prefix)?;
    Some(match i.value {
        Value::Array(items) if !items.is_empty() => {
            Value::Array(items.iter().map(|item| tooling_row(prefix, item)).collect())
        }
        // The empty-inventory sentinel is a bare object, not a one-row array.
        _ => tooling_sentinel(prefix),
    })
}

fn open_source_key(prefix: &str) -> String {
    if prefix == "monitoring" {
        "monitoring_open_source".to_string()
    } else {
        format!("{prefix}_open-source")
    }
}

fn tooling_row(prefix: &str, item: &Value) -> Value {
    let open = get(item, "open-source");
    let documentation = get(item, "documentation");
    let mut row = Map::new();
    row.insert(format!("{prefix}_name"), field_or(item, "name", SPACE));
    row.insert(
        open_source_key(prefix),
        json!({
            "open_no": absent_or(open, "No"),
            "open_yes": open.map(|v| eq_chosen(v, "Yes")).unwrap_or(false),
        }),
    );
    row.insert(format!("{prefix}_policies"), field_or(item, "policies", SPACE));
    row.insert(
        format!("{prefix}_documentation"),
        json!({
            "documentation_not": absent_or(documentation, "Not suitable"),
            "documentation_suitable": documentation
                .map(|v| eq_chosen(v, "Suitable"))
                .unwrap_or(false),
        }),
    );
    Value::Object(row)
}

fn tooling_sentinel(prefix: &str) -> Value {
    let mut out = Map::new();
    out.insert(format!("{prefix}_name"), Value::String(SPACE.to_string()));
    out.insert(
        open_source_key(prefix),
        json!({"open_no": false, "open_yes": false}),
    );
    out.insert(format!("{prefix}_policies"), Value::String(SPACE.to_string()));
    out.insert(
        format!("{prefix}_documentation"),
        json!({"documentation_not": false, "documentation_suitable": false}),
    );
    Value::Object(out)
}

fn pki_row(item: &Value) -> Value {
    let mut row = Map::new();
    set_opt(
        &mut row,
        "ca_count",
        count_object(
            get(item, "ca_count"),
            &[("ca_0", "0"), ("ca_1", "1"), ("ca_2", "2"), ("ca_more", "More")],
        ),
    );
    set_opt(
        &mut row,
        "ra_count",
        count_object(
            get(item, "ra_count"),
            &[("ra_none", "None"), ("ra_1", "1"), ("ra_2", "2"), ("ra_more", "More")],
        ),
    );
    set_opt(
        &mut row,
        "ca_os",
        count_object(
            get(item, "ca_os"),
            &[("ca_os_windows", "Windows"), ("ca_os_linux", "Linux"), ("ca_os_mixed", "Mixed")],
        ),
    );
    set_opt(
        &mut row,
        "va_count",
        count_object(
            get(item, "va_count"),
            &[("va_none", "None"), ("va_1", "1"), ("va_2", "2"), ("va_more", "More")],
        ),
    );
    set_opt(
        &mut row,
        "key_length",
        count_object(
            get(item, "key_length"),
            &[
                ("key_length_1024", "1024"),
                ("key_length_2048", "2048"),
                ("key_length_3072", "3072"),
                ("key_length_other", "Other"),
            ],
        ),
    );
    set_opt(
        &mut row,
        "ca_redundancy",
        count_object(
            get(item, "ca_redundancy"),
            &[
                ("ca_redundancy_no", "No"),
                ("ca_redundancy_backup", "Yes - Backup"),
                ("ca_redundancy_cluster", "Yes - Active"),
            ],
        ),
    );
    set_opt(
        &mut row,
        "key_recovery",
        count_object(
            get(item, "key_recovery"),
            &[
                ("key_recovery_none", "None"),
                ("key_recovery_hsm", "Yes - Keys are archived"),
                ("key_recovery_backup", "Yes - Keys are backed"),
            ],
        ),
    );
    set_opt(
        &mut row,
        "certificate_validity",
        count_object(
            get(item, "certificate_validity"),
            &[
                ("certificate_validity_less", "Less"),
                ("certificate_validity_1_2", "1-2"),
                ("certificate_validity_more", "More"),
                ("certificate_validity_variable", "Variable"),
            ],
        ),
    );
    set_opt(
        &mut row,
        "pki_standards",
        count_object(
            get(item, "pki_standards"),
            &[
                ("pki_standards_none", "No"),
                ("pki_standards_microsoft", "Microsoft"),
                ("pki_standards_nist", "NIST"),
                ("pki_standards_iso", "ISO/IEC"),
                ("pki_standards_etsi", "ETSI"),
                ("pki_standards_other", "Other"),
            ],
        ),
    );
    row.insert(
        "key_management_policies".to_string(),
        field_or(item, "key_management_policies", SPACE),
    );
    row.insert("pki_systems".to_string(), field_or(item, "pki_systems", SPACE));
    row.insert(
        "pki_security_mechanisms".to_string(),
        renamed_checks(sub(item, "pki_security_mechanisms"), PKI_SECURITY),
    );
    set_opt(
        &mut row,
        "wan_pki",
        count_object(get(item, "wan_pki"), &[("wan_pki_no", "No"), ("wan_pki_yes", "Yes")]),
    );
    set_opt(
        &mut row,
        "key_generation",
        count_object(
            get(item, "key_generation"),
            &[
                ("key_generation_no", "No"),
                ("key_generation_yes", "Yes"),
                ("key_generation_hybrid", "Hybrid"),
            ],
        ),
    );
    set_opt(
        &mut row,
        "pki_support_need",
        count_object(
            get(item, "pki_support_need"),
            &[("pki_support_need_no", "No"), ("pki_support_need_yes", "Yes")],
        ),
    );
    set_opt(
        &mut row,
        "support_quality",
        count_object(
            get(item, "support_quality"),
            &[
                ("support_quality_weak", "Weak"),
                ("support_quality_average", "Average"),
                ("support_quality_good", "Good"),
            ],
        ),
    );
    row.insert(
        "public_key".to_string(),
        renamed_checks(sub(item, "public-key"), PUBLIC_KEY),
    );
    Value::Object(row)
}

fn documentation_status(i: &RuleInput) -> Option<Value> {
    let stem = DOCUMENTATION_FIELDS
        .iter()
        .copied()
        .find(|(name, _)| *name == i.name)
        .map(|(_, stem)| stem)?;
    if !truthy(i.value) {
        return None;
    }
    let mut out = Map::new();
    out.insert(format!("{stem}_none"), Value::Bool(is_chosen(i.value, "Not")));
    out.insert(
        format!("{stem}_outdated"),
        Value::Bool(is_chosen(i.value, "Available but")),
    );
    out.insert(
        format!("{stem}_available"),
        Value::Bool(is_chosen(i.value, "Available and")),
    );
    Some(Value::Object(out))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::tests::run_rule;

    #[test]
    fn interviewees_blank_row() {
        assert_eq!(
            run_rule("interviewees", json!(null)),
            Some(json!([{"fullname": " ", "phone": " "}]))
        );
    }

    #[test]
    fn data_center_rows_rename_fields() {
        let out = run_rule(
            "data_center",
            json!([{
                "type": {"option": "Data Center"},
                "owner": "Organization",
                "physical-location": "ساختمان مرکزی",
                "status": "Operational",
                "access_control": "Yes",
                "services": ["DNS"],
            }]),
        )
        .unwrap();
        let row = &out[0];
        assert_eq!(row["type"], json!({"data_center": true, "server_room": false}));
        assert_eq!(row["owner"]["organization"], json!(true));
        assert_eq!(row["owner"]["other_owner_text"], json!(" "));
        assert_eq!(row["physical_location"], json!("ساختمان مرکزی"));
        assert_eq!(
            row["access_control_data"],
            json!({"no": false, "partially": false, "yes": true})
        );
        assert!(row.get("locked_cabinets").is_none());
        assert_eq!(row["services"], json!(["DNS"]));
    }

    #[test]
    fn auth_classifier_keeps_misspelled_key() {
        let out = run_rule("auth", json!("Separate authentication per unit"));
        assert_eq!(
            out,
            Some(json!({
                "centralized_auth": false,
                "seperated_auth": true,
                "combined_auth": false,
            }))
        );
        assert_eq!(run_rule("auth", json!("")), None);
    }

    #[test]
    fn tooling_tables_keep_legacy_keys() {
        let out = run_rule(
            "monitoring_and_control",
            json!([{
                "name": "Zabbix",
                "open-source": "Yes",
                "policies": "دارد",
                "documentation": {"option": "Suitable"},
            }]),
        )
        .unwrap();
        let row = &out[0];
        assert_eq!(row["monitoring_name"], json!("Zabbix"));
        assert_eq!(
            row["monitoring_open_source"],
            json!({"open_no": false, "open_yes": true})
        );
        assert_eq!(
            row["monitoring_documentation"],
            json!({"documentation_not": false, "documentation_suitable": true})
        );

        let out = run_rule("backup", json!([{"name": "Veeam"}])).unwrap();
        assert_eq!(
            out[0]["backup_open-source"],
            json!({"open_no": true, "open_yes": false})
        );

        let empty = run_rule("remote_connection", json!([])).unwrap();
        assert!(empty.is_object());
        assert_eq!(empty["remote_connection_name"], json!(" "));
        assert_eq!(
            empty["remote_connection_open-source"],
            json!({"open_no": false, "open_yes": false})
        );
    }

    #[test]
    fn access_metrics_require_literal_true() {
        let out = run_rule(
            "access",
            json!({"Bandwidth": true, "Latency": "yes", "Packet loss": 1}),
        )
        .unwrap();
        assert_eq!(out["access_bandwidth"], json!(true));
        assert_eq!(out["access_latency"], json!(false));
        assert_eq!(out["access_packet"], json!(false));
        assert_eq!(out["access_health"], json!(false));
    }

    #[test]
    fn pki_rows_drop_unanswered_counts() {
        let out = run_rule(
            "public_key_infrastructure",
            json!([{
                "ca_count": "2 subordinate CAs",
                "pki_security_mechanisms": {"Other - please specify:": true},
            }]),
        )
        .unwrap();
        let row = &out[0];
        assert_eq!(
            row["ca_count"],
            json!({"ca_0": false, "ca_1": false, "ca_2": true, "ca_more": false})
        );
        assert!(row.get("ra_count").is_none());
        assert_eq!(row["pki_security_mechanisms"]["pki_security_other"], json!(true));
        assert_eq!(row["key_management_policies"], json!(" "));

        assert_eq!(
            run_rule("public_key_infrastructure", json!([])),
            Some(json!([]))
        );
    }

    #[test]
    fn staffing_prefixes_classify() {
        let out = run_rule("network_staff_count", json!({"option": "2-3 people"}));
        assert_eq!(
            out,
            Some(json!({
                "network_staff_0": false,
                "network_staff_1": false,
                "network_staff_2_3": true,
                "network_staff_4_6": false,
                "network_staff_more": false,
            }))
        );
    }

    #[test]
    fn documentation_classifier_derives_stems() {
        let out = run_rule(
            "physical_logical_map_documentation",
            json!({"option": "Available but outdated"}),
        );
        assert_eq!(
            out,
            Some(json!({
                "physical_logical_map_none": false,
                "physical_logical_map_outdated": true,
                "physical_logical_map_available": false,
            }))
        );
        assert_eq!(run_rule("internal_wiki", json!("")), None);
    }
}
