//! Symbol descriptors and the predicate used to correlate them across
//! independently indexed workspaces.

use serde::{Deserialize, Serialize};

/// Identity of a package that declares a symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    /// Package name, e.g. `typescript`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Package version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Repository the package is published from.
    #[serde(default, rename = "repoURL", skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
}

impl PackageDescriptor {
    /// Descriptor carrying only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Structured identity of a named program entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolDescriptor {
    /// Symbol name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Symbol kind, e.g. `class` or `interface`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Name of the enclosing container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    /// Kind of the enclosing container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_kind: Option<String>,
    /// Package declaring the symbol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageDescriptor>,
}

impl SymbolDescriptor {
    /// Whether `candidate` satisfies this descriptor used as a query.
    ///
    /// See [`symbol_descriptor_match`].
    #[must_use]
    pub fn matches(&self, candidate: &Self) -> bool {
        symbol_descriptor_match(self, candidate)
    }
}

/// Decides whether `candidate` satisfies `query`.
///
/// Every field set to a non-empty value on the query must equal the
/// candidate's field. Absent or empty query fields match anything. The
/// relation is not symmetric: fields set only on the candidate are ignored.
/// `package` is compared on its name with the same rule.
#[must_use]
pub fn symbol_descriptor_match(query: &SymbolDescriptor, candidate: &SymbolDescriptor) -> bool {
    field_matches(query.name.as_deref(), candidate.name.as_deref())
        && field_matches(query.kind.as_deref(), candidate.kind.as_deref())
        && field_matches(
            query.container_name.as_deref(),
            candidate.container_name.as_deref(),
        )
        && field_matches(
            query.container_kind.as_deref(),
            candidate.container_kind.as_deref(),
        )
        && package_matches(query.package.as_ref(), candidate.package.as_ref())
}

fn package_matches(query: Option<&PackageDescriptor>, candidate: Option<&PackageDescriptor>) -> bool {
    let Some(query) = query else {
        return true;
    };
    field_matches(
        query.name.as_deref(),
        candidate.and_then(|package| package.name.as_deref()),
    )
}

fn field_matches(query: Option<&str>, candidate: Option<&str>) -> bool {
    match query {
        None | Some("") => true,
        Some(wanted) => candidate == Some(wanted),
    }
}
