//! Shared `_include` query-parameter parsing for the `/r4` search handlers
//! (§4.2 "Search semantics", §9 "`_include:iterate` expansion").

use std::collections::HashMap;

use pcm_store::include::IncludeDirective;

/// Reads `_include` and `_include:iterate` from the raw query-parameter map,
/// splitting on commas since a directive list may be repeated or combined.
pub fn parse_include_directives(params: &HashMap<String, String>) -> Vec<IncludeDirective> {
    let mut directives = Vec::new();
    if let Some(raw) = params.get("_include") {
        directives.extend(raw.split(',').filter_map(|v| IncludeDirective::parse(v.trim(), false)));
    }
    if let Some(raw) = params.get("_include:iterate") {
        directives.extend(raw.split(',').filter_map(|v| IncludeDirective::parse(v.trim(), true)));
    }
    directives
}
