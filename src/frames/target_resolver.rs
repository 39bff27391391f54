use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dom::document::Document;
use crate::frames::scope::{Scope, ScopeRegistry, TOP};
use crate::http::fetch_request::FetchMethod;
use crate::observers::interception::Intent;

pub const DEFAULT_TARGET_ATTRIBUTE: &str = "data-turbo-frame";

/// Whether a GET form submission may escape its scope through `_top`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscapePolicy {
    /// GET navigations inside a scope always stay in that scope.
    #[default]
    GetStaysInScope,
    /// GET forms escape like any other navigation.
    GetEscapes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Attribute on elements and invoking controls naming the target scope.
    #[serde(default = "default_target_attribute")]
    pub target_attribute: String,

    #[serde(default)]
    pub get_policy: EscapePolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            target_attribute: default_target_attribute(),
            get_policy: EscapePolicy::default(),
        }
    }
}

fn default_target_attribute() -> String {
    DEFAULT_TARGET_ATTRIBUTE.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "scope", rename_all = "snake_case")]
pub enum Destination {
    /// The page root, outside every scope.
    Top,
    Scope(Scope),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    /// Default browser handling proceeds.
    NotIntercepted,
    /// `redirected` is set when the destination is not the element's own
    /// enclosing scope.
    Intercepted { destination: Destination, redirected: bool },
}

impl Resolution {
    pub fn is_redirected(&self) -> bool {
        matches!(self, Resolution::Intercepted { redirected: true, .. })
    }

    pub fn destination(&self) -> Option<&Destination> {
        match self {
            Resolution::Intercepted { destination, .. } => Some(destination),
            Resolution::NotIntercepted => None,
        }
    }
}

/// Decides which scope handles a link click or form submission.
#[derive(Debug, Clone, Default)]
pub struct TargetResolver {
    config: ResolverConfig,
}

impl TargetResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn resolve(&self, document: &Document, intent: &Intent) -> Resolution {
        let element = intent.element();
        let enclosing = document.enclosing_scope(element);

        // Invoking control first, then the element itself
        let explicit = intent
            .control()
            .and_then(|control| document.non_empty_attribute(control, &self.config.target_attribute))
            .or_else(|| document.non_empty_attribute(element, &self.config.target_attribute));

        let effective = explicit
            .clone()
            .or_else(|| enclosing.as_ref().and_then(|scope| scope.target.clone()));

        if effective.as_deref() == Some(TOP) {
            return self.escape(intent, enclosing);
        }

        let candidate = match explicit.as_deref() {
            Some(name) => document.scope_named(name).or_else(|| {
                debug!(name, "no enabled scope with that name; staying in place");
                enclosing.clone()
            }),
            None => enclosing.clone(),
        };

        match candidate {
            None => Resolution::NotIntercepted,
            Some(scope) => {
                let redirected = enclosing.as_ref().map(|e| e.element) != Some(scope.element);
                Resolution::Intercepted {
                    destination: Destination::Scope(scope),
                    redirected,
                }
            }
        }
    }

    fn escape(&self, intent: &Intent, enclosing: Option<Scope>) -> Resolution {
        let Some(enclosing) = enclosing else {
            // Already at the page root
            return Resolution::NotIntercepted;
        };

        let get_form = intent.method() == Some(FetchMethod::Get);
        if get_form && self.config.get_policy == EscapePolicy::GetStaysInScope {
            return Resolution::Intercepted {
                destination: Destination::Scope(enclosing),
                redirected: false,
            };
        }

        Resolution::Intercepted {
            destination: Destination::Top,
            redirected: true,
        }
    }
}
