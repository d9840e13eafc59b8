//! Module scopes and their resolution against the configured integrations.
//!
//! A scope token comes from the route a session was opened on and is fixed
//! for the session's lifetime. Resolution is a pure function of the token
//! and the set of configured integrations.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use switchboard_integrations::IntegrationId;

use crate::error::RouteError;

const LITE_SUFFIX: &str = "-lite";

/// Which integrations a scope selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selection {
    All,
    Only(IntegrationId),
}

/// Whether a scope exposes the full tool table or the read-only whitelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Full,
    Lite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scope {
    pub selection: Selection,
    pub visibility: Visibility,
}

impl Scope {
    pub const ALL: Scope = Scope {
        selection: Selection::All,
        visibility: Visibility::Full,
    };

    pub fn full(id: IntegrationId) -> Self {
        Self { selection: Selection::Only(id), visibility: Visibility::Full }
    }

    pub fn lite(id: IntegrationId) -> Self {
        Self { selection: Selection::Only(id), visibility: Visibility::Lite }
    }

    /// Every valid scope: `all`, then each integration followed by its lite variant.
    pub fn every() -> Vec<Scope> {
        let mut scopes = vec![Self::ALL];
        for id in IntegrationId::ALL {
            scopes.push(Self::full(id));
            scopes.push(Self::lite(id));
        }
        scopes
    }

    pub fn all_tokens() -> Vec<String> {
        Self::every().iter().map(Scope::to_string).collect()
    }

    /// The same selection with the full tool table.
    pub fn widened(self) -> Self {
        Self { visibility: Visibility::Full, ..self }
    }
}

impl FromStr for Scope {
    type Err = RouteError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if token == "all" {
            return Ok(Self::ALL);
        }
        let (name, visibility) = match token.strip_suffix(LITE_SUFFIX) {
            Some(name) => (name, Visibility::Lite),
            None => (token, Visibility::Full),
        };
        IntegrationId::from_token(name)
            .map(|id| Self { selection: Selection::Only(id), visibility })
            .ok_or_else(|| RouteError::UnknownScope(token.to_string()))
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.selection, self.visibility) {
            (Selection::All, _) => f.write_str("all"),
            (Selection::Only(id), Visibility::Full) => write!(f, "{id}"),
            (Selection::Only(id), Visibility::Lite) => write!(f, "{id}{LITE_SUFFIX}"),
        }
    }
}

/// Outcome of resolving a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedScope {
    pub scope: Scope,
    /// Integrations whose tools the session gets.
    pub enabled: BTreeSet<IntegrationId>,
    /// Integrations the scope asked for but which have no credentials.
    pub unconfigured: BTreeSet<IntegrationId>,
    /// Tool names a lite scope restricts visibility and dispatch to.
    pub whitelist: Option<BTreeSet<&'static str>>,
}

impl ResolvedScope {
    /// The scope is valid but nothing it selects is configured, so the
    /// session exposes no tools.
    pub fn is_unconfigured(&self) -> bool {
        self.enabled.is_empty()
    }
}

/// Resolves scopes against the set of configured integrations.
#[derive(Debug, Clone)]
pub struct ScopeResolver {
    configured: BTreeSet<IntegrationId>,
}

impl ScopeResolver {
    pub fn new(configured: BTreeSet<IntegrationId>) -> Self {
        Self { configured }
    }

    pub fn configured(&self) -> &BTreeSet<IntegrationId> {
        &self.configured
    }

    pub fn resolve(&self, scope: Scope) -> ResolvedScope {
        let requested: BTreeSet<IntegrationId> = match scope.selection {
            Selection::All => IntegrationId::ALL.into_iter().collect(),
            Selection::Only(id) => BTreeSet::from([id]),
        };
        let (enabled, unconfigured): (BTreeSet<_>, BTreeSet<_>) = requested
            .into_iter()
            .partition(|id| self.configured.contains(id));

        let whitelist = match (scope.selection, scope.visibility) {
            (Selection::Only(id), Visibility::Lite) => Some(id.lite_tools().iter().copied().collect()),
            _ => None,
        };

        ResolvedScope { scope, enabled, unconfigured, whitelist }
    }
}
