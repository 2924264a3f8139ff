//! Exclusion, service grouping and call naming.

use super::naming::{
    is_uncategorized, package_name, snake_ident, strip_service_prefix, type_ident, unique_name,
    MODEL_PACKAGE,
};
use crate::error::{ResolutionError, ResolutionReport};
use crate::overrides::Overrides;
use crate::spec::{Model, Operation, OperationStatus, ResolvedOperation};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

/// Base URL of the published REST API reference.
pub const DOC_BASE_URL: &str = "https://docs.docusign.com/esign/restapi";

/// Extra comment carried by the package built from the uncategorized service.
pub const FUTURE_NOTE: &str = "Future calls may change or move to other packages.";

/// Why an operation is left out of every module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionReason {
    Restricted,
    NoService,
    Skipped,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExclusionReason::Restricted => "restricted",
            ExclusionReason::NoService => "no service",
            ExclusionReason::Skipped => "skip list",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    pub operation: String,
    pub reason: ExclusionReason,
}

/// Operations that will be emitted, paired with their final service.
#[derive(Debug, Default)]
pub struct Plan<'a> {
    pub included: Vec<(&'a Operation, String)>,
    pub excluded: Vec<Exclusion>,
}

/// Apply the exclusion rules and service overrides, in model order.
///
/// A restricted status or an empty published service excludes an operation
/// before any override is consulted; the skip list excludes it regardless.
pub fn plan_operations<'a>(model: &'a Model, overrides: &Overrides) -> Plan<'a> {
    let mut plan = Plan::default();
    for op in &model.operations {
        let reason = if op.status == OperationStatus::Restricted {
            Some(ExclusionReason::Restricted)
        } else if op.service.is_empty() {
            Some(ExclusionReason::NoService)
        } else if overrides.is_skipped(&op.id) {
            Some(ExclusionReason::Skipped)
        } else {
            None
        };
        match reason {
            Some(reason) => {
                debug!(operation = %op.id, %reason, "Skipping operation");
                plan.excluded.push(Exclusion {
                    operation: op.id.clone(),
                    reason,
                });
            }
            None => {
                let service = overrides.service_for(&op.id).unwrap_or(op.service.as_str());
                plan.included.push((op, service.to_string()));
            }
        }
    }
    plan
}

/// One resolved operation with its generated names.
#[derive(Debug, Clone)]
pub struct NamedOperation {
    pub resolved: ResolvedOperation,
    /// Constructor method on `Service`
    pub fn_name: String,
    /// Call builder struct
    pub call_name: String,
}

impl NamedOperation {
    /// Per-operation documentation: summary, SDK method and reference URL.
    pub fn doc_lines(&self) -> Vec<String> {
        let op = &self.resolved.operation;
        let text = if op.summary.trim().is_empty() {
            &op.description
        } else {
            &op.summary
        };
        let mut lines: Vec<String> = text.trim().lines().map(|l| l.trim_end().to_string()).collect();
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("SDK Method {}::{}", self.resolved.service, op.sdk_method));
        if !op.category.is_empty() && !op.doc_method.is_empty() {
            lines.push(format!(
                "{DOC_BASE_URL}/{}/{}/{}",
                self.resolved.service, op.category, op.doc_method
            ));
        }
        lines
    }
}

/// The emission unit: one service, one module.
#[derive(Debug, Clone)]
pub struct ServiceGroup {
    pub service: String,
    pub package: String,
    /// Module documentation lines
    pub comments: Vec<String>,
    /// In model order
    pub operations: Vec<NamedOperation>,
}

fn group_comments(service: &str, description: &str) -> Vec<String> {
    let trimmed = description.trim_end_matches('\n');
    let mut comments: Vec<String> = if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('\n').map(|l| l.trim_end().to_string()).collect()
    };
    if is_uncategorized(service) {
        comments.push(FUTURE_NOTE.to_string());
    }
    comments.push("Api documentation may be found at:".to_string());
    comments.push(format!("{DOC_BASE_URL}/{service}"));
    comments
}

/// Name every operation of one group.
///
/// The SDK method name loses its service prefix when that leaves a usable
/// name; on collision the unstripped name is tried, then a numeric suffix.
fn name_operations(
    service: &str,
    resolved: Vec<ResolvedOperation>,
    overrides: &Overrides,
) -> Vec<NamedOperation> {
    let prefixes = overrides.service_prefixes(service);
    let mut fn_names: BTreeSet<String> = BTreeSet::from(["new".to_string()]);
    let mut call_names: BTreeSet<String> = BTreeSet::from(["Service".to_string()]);

    resolved
        .into_iter()
        .map(|r| {
            let method = r.operation.sdk_method.as_str();
            let stripped = snake_ident(strip_service_prefix(method, &prefixes));
            let candidate = if fn_names.contains(&stripped) {
                snake_ident(method)
            } else {
                stripped
            };
            let fn_name = unique_name(&mut fn_names, &candidate);
            let call_base = format!("{}Call", type_ident(fn_name.trim_start_matches("r#")));
            let call_name = unique_name(&mut call_names, &call_base);
            NamedOperation {
                resolved: r,
                fn_name,
                call_name,
            }
        })
        .collect()
}

/// Partition resolved operations by final service and name them.
///
/// Groups come out sorted by service; operations keep their input order.
pub fn group_operations(
    resolved: Vec<ResolvedOperation>,
    model: &Model,
    overrides: &Overrides,
) -> Result<Vec<ServiceGroup>, ResolutionReport> {
    let mut by_service: BTreeMap<String, Vec<ResolvedOperation>> = BTreeMap::new();
    for r in resolved {
        by_service.entry(r.service.clone()).or_default().push(r);
    }

    let mut report = ResolutionReport::default();
    let mut groups = Vec::with_capacity(by_service.len());
    let mut packages: BTreeMap<String, String> = BTreeMap::new();
    for (service, ops) in by_service {
        let package = package_name(&service);
        if package.is_empty() || package == MODEL_PACKAGE {
            report.push(ResolutionError::ReservedPackage { service, package });
            continue;
        }
        if let Some(existing) = packages.get(&package) {
            report.push(ResolutionError::PackageCollision {
                existing: existing.clone(),
                service,
                package,
            });
            continue;
        }
        packages.insert(package.clone(), service.clone());
        let description = model
            .tag_descriptions
            .get(&service)
            .map(String::as_str)
            .unwrap_or_default();
        groups.push(ServiceGroup {
            comments: group_comments(&service, description),
            operations: name_operations(&service, ops, overrides),
            package,
            service,
        });
    }
    report.into_result(groups)
}
