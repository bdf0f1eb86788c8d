//! `_include` expansion: a bounded breadth-first walk over the
//! Organization/Endpoint/Consent graph (§9 "Reference graph").
//!
//! Supported directives: `Consent:actor`, `Organization:endpoint`,
//! `Organization:partof`. The latter two accept `_include:iterate`, which
//! re-applies the same directive to organizations newly pulled in by a
//! previous round, up to [`MAX_DEPTH`].

use std::collections::HashSet;

use pcm_models::{Consent, Endpoint, Organization};
use serde_json::{json, Value};

use crate::fhir_store::FhirStore;

/// `_include:iterate` never recurses past this many rounds; the reference
/// graph is shallow by construction (§9).
const MAX_DEPTH: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeKind {
    ConsentActor,
    OrganizationEndpoint,
    OrganizationPartOf,
}

#[derive(Debug, Clone, Copy)]
pub struct IncludeDirective {
    pub kind: IncludeKind,
    pub iterate: bool,
}

impl IncludeDirective {
    /// Parses one `_include` value (e.g. `"Organization:endpoint"`); the
    /// `iterate` flag comes from whether it was supplied via `_include` or
    /// `_include:iterate`, which the caller (the search-parameter parser)
    /// already knows from the query-string key.
    pub fn parse(raw: &str, iterate: bool) -> Option<Self> {
        let kind = match raw {
            "Consent:actor" => IncludeKind::ConsentActor,
            "Organization:endpoint" => IncludeKind::OrganizationEndpoint,
            "Organization:partof" => IncludeKind::OrganizationPartOf,
            _ => return None,
        };
        Some(Self { kind, iterate })
    }
}

/// A resource pulled in via `_include`, tagged with its wire `resourceType`
/// so the caller can fold it into `BundleEntry::included`.
#[derive(Debug, Clone)]
pub struct IncludedResource {
    pub resource_type: &'static str,
    pub json: Value,
}

/// Expands `directives` starting from `seed_consents` and `seed_organizations`
/// (the Bundle's `match` entries), returning every additionally-included
/// resource with no duplicates.
pub async fn expand(
    store: &FhirStore,
    seed_consents: &[Consent],
    seed_organizations: &[Organization],
    directives: &[IncludeDirective],
) -> Vec<IncludedResource> {
    let mut seen_orgs: HashSet<String> = seed_organizations.iter().map(|o| o.id.clone()).collect();
    let mut seen_endpoints: HashSet<String> = HashSet::new();
    let mut results = Vec::new();

    if directives.iter().any(|d| d.kind == IncludeKind::ConsentActor) {
        for consent in seed_consents {
            for actor in &consent.actor {
                if seen_orgs.insert(actor.reference.id.clone()) {
                    if let Some(org) = store.get_organization(&actor.reference.id).await {
                        results.push(to_included(&org));
                    }
                }
            }
        }
    }

    let mut frontier: Vec<Organization> = seed_organizations.to_vec();
    let endpoint_directive = directives.iter().find(|d| d.kind == IncludeKind::OrganizationEndpoint);
    let partof_directive = directives.iter().find(|d| d.kind == IncludeKind::OrganizationPartOf);

    for depth in 0..MAX_DEPTH {
        if frontier.is_empty() {
            break;
        }
        let mut next_frontier = Vec::new();

        if let Some(directive) = endpoint_directive {
            if depth == 0 || directive.iterate {
                for org in &frontier {
                    for endpoint_ref in &org.endpoint {
                        if seen_endpoints.insert(endpoint_ref.id.clone()) {
                            if let Some(endpoint) = store.get_endpoint(&endpoint_ref.id).await {
                                results.push(to_included(&endpoint));
                            }
                        }
                    }
                }
            }
        }

        if let Some(directive) = partof_directive {
            if depth == 0 || directive.iterate {
                for org in &frontier {
                    if let Some(part_of) = &org.part_of {
                        if seen_orgs.insert(part_of.id.clone()) {
                            if let Some(parent) = store.get_organization(&part_of.id).await {
                                results.push(to_included(&parent));
                                next_frontier.push(parent);
                            }
                        }
                    }
                }
            }
        }

        if !partof_directive.map(|d| d.iterate).unwrap_or(false) {
            break;
        }
        frontier = next_frontier;
    }

    results
}

fn to_included<T: serde::Serialize>(resource: &T) -> IncludedResource
where
    T: ResourceTypeName,
{
    IncludedResource {
        resource_type: resource.resource_type_name(),
        json: json!(resource),
    }
}

trait ResourceTypeName {
    fn resource_type_name(&self) -> &'static str;
}
impl ResourceTypeName for Organization {
    fn resource_type_name(&self) -> &'static str {
        "Organization"
    }
}
impl ResourceTypeName for Endpoint {
    fn resource_type_name(&self) -> &'static str {
        "Endpoint"
    }
}
