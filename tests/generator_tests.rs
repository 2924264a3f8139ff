#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{mini_options, read_module, TempSpec};
use esign_gen::generator::{generate, ExclusionReason};
use esign_gen::{GenerateError, ResolutionError};
use serde_json::json;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

fn tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut files = BTreeMap::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let rel = path.strip_prefix(root).unwrap().to_string_lossy().into_owned();
                files.insert(rel, fs::read(&path).unwrap());
            }
        }
    }
    files
}

#[test]
fn test_mini_spec_layout_and_exclusions() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("gen");
    let summary = generate(&mini_options(&out)).unwrap();

    assert_eq!(summary.services, ["Billing", "Envelopes", "Uncategorized"]);
    let excluded: Vec<_> = summary
        .excluded
        .iter()
        .map(|e| (e.operation.as_str(), e.reason))
        .collect();
    assert_eq!(
        excluded,
        [
            ("Future_GetX", ExclusionReason::NoService),
            ("Authentication_GetLoginInformation", ExclusionReason::Skipped),
            ("Internal_GetDiagnostics", ExclusionReason::Restricted),
        ]
    );

    let files: Vec<_> = tree(&out).into_keys().collect();
    assert_eq!(
        files,
        [
            "billing/mod.rs",
            "envelopes/mod.rs",
            "future/mod.rs",
            "mod.rs",
            "model/mod.rs"
        ]
    );
    let index = read_module(&out, "");
    assert!(index.starts_with("// Code generated by esign-gen. DO NOT EDIT."));
    assert!(index.contains("pub mod billing;\npub mod envelopes;\npub mod future;\npub mod model;"));

    let all = tree(&out)
        .into_values()
        .map(|b| String::from_utf8(b).unwrap())
        .collect::<String>();
    for gone in ["get_x", "login", "get_diagnostics"] {
        assert!(!all.contains(&format!("pub fn {gone}(")), "{gone}");
    }
}

#[test]
fn test_envelopes_module() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("gen");
    generate(&mini_options(&out)).unwrap();
    let src = read_module(&out, "envelopes");

    assert!(src.contains("//! Create, send and manage envelopes.\n//! Envelopes hold documents and recipients.\n"));
    assert!(src.contains("//! https://docs.docusign.com/esign/restapi/Envelopes\n"));
    assert!(src.contains(
        "use std::sync::Arc;\nuse chrono::{DateTime, Utc};\nuse esign::{Call, Credential, Download, Error, Method, UploadFile};\nuse super::model;\n"
    ));

    // Download with header additions and a flag option
    assert!(src.contains(
        "pub fn get_document(&self, envelope_id: &str, document_id: &str) -> GetDocumentCall {"
    ));
    assert!(src.contains("Method::GET, \"envelopes/{envelopeId}/documents/{documentId}\")"));
    assert!(src.contains(".path_parameter(\"{envelopeId}\", envelope_id)"));
    assert!(src.contains("pub fn show_changes(mut self) -> Self {"));
    assert!(src.contains("self.call = self.call.query(\"show_changes\", \"true\");"));
    assert!(src.contains("pub fn certificate(mut self, value: &str) -> Self {"));
    assert!(src.contains("self.call = self.call.header(\"Accept\", \"application/zip\");"));
    assert!(src.contains("/// requests the document as a PDF."));
    assert!(src.contains("pub async fn execute(self) -> Result<Download, Error> {"));
    assert!(src.contains("self.call.download().await"));

    // Media upload
    assert!(src.contains(
        "pub fn update_document(&self, envelope_id: &str, document_id: &str, media: UploadFile) -> UpdateDocumentCall {"
    ));
    assert!(src.contains(".upload(media)"));

    // Multipart: JSON payload plus attached files; result from the 201 response
    assert!(src.contains(
        "pub fn create_envelope(&self, envelope_definition: &model::EnvelopeDefinition) -> CreateEnvelopeCall {"
    ));
    assert!(src.contains(".payload(envelope_definition)"));
    assert!(src.contains("pub fn with_files(mut self, files: Vec<UploadFile>) -> Self {"));
    assert!(src.contains("Result<model::EnvelopeSummary, Error>"));

    // Typed query options from the parameter overrides
    assert!(src.contains("pub fn from_date(mut self, value: DateTime<Utc>) -> Self {"));
    assert!(src.contains("self.call = self.call.query(\"from_date\", value.to_rfc3339());"));
    assert!(src.contains("pub fn envelope_ids(mut self, value: &[&str]) -> Self {"));
    assert!(src.contains("self.call = self.call.query(\"envelope_ids\", value.join(\",\"));"));
    assert!(src.contains("pub fn count(mut self, value: i64) -> Self {"));

    assert!(src.contains("/// SDK Method Envelopes::listTabs"));
    assert!(src.contains(
        "/// https://docs.docusign.com/esign/restapi/Envelopes/EnvelopeRecipientTabs/list"
    ));
    assert!(src.contains("Result<model::EnvelopeRecipientTabs, Error>"));
}

#[test]
fn test_billing_and_future_modules() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("gen");
    generate(&mini_options(&out)).unwrap();

    let billing = read_module(&out, "billing");
    assert!(billing.contains("//! Account billing plans."));
    assert!(billing.contains("    #[deprecated]\n    pub fn get_billing_plan(&self) -> GetBillingPlanCall {"));
    assert!(billing.contains("use esign::{Call, Credential, Error, Method};"));
    assert!(!billing.contains("chrono"));

    let future = read_module(&out, "future");
    assert!(future.contains("//! Future calls may change or move to other packages.\n"));
    assert!(future.contains("pub fn get_notary(&self) -> GetNotaryCall {"));
    assert!(future.contains("Result<String, Error>"));
    assert!(!future.contains("super::model"));
}

#[test]
fn test_model_module() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("gen");
    generate(&mini_options(&out)).unwrap();
    let model = read_module(&out, "model");

    assert!(model.contains(
        "use std::collections::BTreeMap;\nuse chrono::{DateTime, Utc};\nuse serde::{Deserialize, Serialize};\n"
    ));
    assert_eq!(model.matches("pub struct Address {").count(), 1);
    assert!(model.contains("pub billing_address: Option<Address>,"));
    assert!(model.contains("pub payment_address: Option<Address>,"));

    // Shared tab fields live on one type flattened into every source
    assert!(model.contains("/// Location and anchoring of a tab on a document page.\n"));
    assert!(model.contains("pub struct TabPosition {"));
    assert!(model.contains("    #[serde(rename = \"documentId\")]\n    pub document_id: String,"));
    assert!(model.contains("/// Page number on which the tab is located."));
    assert_eq!(model.matches("#[serde(flatten)]\n    pub tab_position: TabPosition,").count(), 6);
    assert!(model.contains("pub sign_here_tabs: Option<Vec<SignHere>>,"));

    assert!(model.contains("#[serde(rename = \"envelopeId\")]\n    pub envelope_id: String,"));
    assert!(model.contains("pub sent_date_time: Option<DateTime<Utc>>,"));
    assert!(model.contains("pub custom_fields: Option<BTreeMap<String, String>>,"));
    assert!(model.contains("pub type DsTime = String;"));
}

#[test]
fn test_generation_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    generate(&mini_options(&first)).unwrap();
    generate(&mini_options(&second)).unwrap();
    assert_eq!(tree(&first), tree(&second));

    // Regenerating over the same root rewrites nothing.
    let again = generate(&mini_options(&first)).unwrap();
    assert!(again.written.is_empty());
    assert_eq!(again.unchanged.len(), 5);
}

#[test]
fn test_user_overrides_replace_builtin() {
    let spec = TempSpec::write(
        "esignature.json",
        &fs::read_to_string(common::fixture("esignature_mini.json")).unwrap(),
    );
    let overrides = spec.overrides(
        r#"
account_path_prefixes = ["/v2.1/accounts/{accountId}/"]

[services]
Notary_GetNotary = "Billing"

[fields.Envelope.emailSubject]
type = "EmailSubject"
"#,
    );
    let mut options = spec.options("gen");
    options.overrides = Some(overrides);
    let summary = generate(&options).unwrap();

    // No skip list, so the login call is generated under its own service.
    assert_eq!(summary.services, ["Authentication", "Billing", "Envelopes"]);
    let out = spec.dir.path().join("gen");
    let billing = read_module(&out, "billing");
    assert!(billing.contains("pub fn get_notary(&self) -> GetNotaryCall {"));
    assert!(!out.join("future").exists());

    let model = read_module(&out, "model");
    assert!(model.contains("pub email_subject: Option<EmailSubject>,"));
    assert!(!model.contains("TabPosition"));
    assert!(!model.contains("DsTime"));
}

#[test]
fn test_resolution_errors_are_reported_together() {
    let spec = TempSpec::json(&json!({
        "definitions": {
            "invoice": {"properties": {"customer": {"$ref": "#/definitions/customer"}}}
        },
        "paths": {
            "/invoices/{invoiceId}": {
                "get": {
                    "operationId": "Invoices_GetInvoice",
                    "x-ds-service": "Billing",
                    "responses": {"200": {"description": "ok", "schema": {"$ref": "#/definitions/invoice"}}}
                }
            }
        }
    }));
    let overrides = spec.overrides(
        r#"
[[tabs]]
name = "TabBase"
sources = ["invoice", "receipt"]
fields = ["customer"]
"#,
    );
    let mut options = spec.options("gen");
    options.overrides = Some(overrides);

    let err = generate(&options).unwrap_err();
    let GenerateError::Resolution(report) = err else {
        panic!("expected resolution errors, got {err}");
    };
    assert!(report.errors.contains(&ResolutionError::UnknownReference {
        owner: "definition Invoice.customer".into(),
        reference: "#/definitions/customer".into(),
    }));
    assert!(report
        .errors
        .iter()
        .any(|e| matches!(e, ResolutionError::UnknownReference { owner, .. } if owner == "tab TabBase")));
    assert!(!spec.dir.path().join("gen").exists());
}

#[test]
fn test_missing_path_parameter_is_reported() {
    let spec = TempSpec::json(&json!({
        "paths": {
            "/invoices/{invoiceId}/lines/{lineId}": {
                "get": {
                    "operationId": "Invoices_GetLine",
                    "x-ds-service": "Billing",
                    "parameters": [{"name": "invoiceId", "in": "path", "required": true, "type": "string"}],
                    "responses": {"200": {"description": "ok", "schema": {"type": "string"}}}
                }
            }
        }
    }));
    let mut options = spec.options("gen");
    options.overrides = Some(spec.overrides(""));
    let err = generate(&options).unwrap_err();
    let GenerateError::Resolution(report) = err else {
        panic!("expected resolution errors, got {err}");
    };
    assert_eq!(
        report.errors,
        [ResolutionError::MissingPathParameter {
            operation: "Invoices_GetLine".into(),
            path: "/invoices/{invoiceId}/lines/{lineId}".into(),
            placeholder: "lineId".into(),
        }]
    );
}

#[test]
fn test_services_sharing_a_package_fail_before_writing() {
    let op = |id: &str, service: &str| {
        json!({"get": {
            "operationId": id,
            "x-ds-service": service,
            "responses": {"200": {"description": "ok", "schema": {"type": "string"}}}
        }})
    };
    let spec = TempSpec::json(&json!({
        "paths": {
            "/a": op("A_Get", "Future"),
            "/b": op("B_Get", "Uncategorized")
        }
    }));
    let mut options = spec.options("gen");
    options.overrides = Some(spec.overrides(""));

    let err = generate(&options).unwrap_err();
    let GenerateError::Resolution(report) = err else {
        panic!("expected resolution errors, got {err}");
    };
    assert_eq!(
        report.errors,
        [ResolutionError::PackageCollision {
            existing: "Future".into(),
            service: "Uncategorized".into(),
            package: "future".into(),
        }]
    );
    assert!(!spec.dir.path().join("gen").exists());
}
