//! Static mapping from agent role to permitted actions.
//!
//! The registry is built once at startup, either from the built-in table
//! ([`CapabilityRegistry::standard`]) or from configuration
//! ([`CapabilityRegistry::from_table`]), and is read-only afterwards.
//! Changing permissions is a deployment concern: restart with new config.

use crate::{Capability, RegistryError};
use std::collections::BTreeMap;
use ward_types::AgentRole;

/// Agent role → permitted [`Capability`] set.
///
/// Lookups fail closed: a role with no entry has the empty set.
///
/// # Example
///
/// ```
/// use ward_auth::{Capability, CapabilityRegistry};
/// use ward_types::AgentRole;
///
/// let registry = CapabilityRegistry::standard();
/// assert!(registry.allows(AgentRole::Room, Capability::ROOM_WRITE));
/// assert!(!registry.allows(AgentRole::Diagnosis, Capability::IDENTITY_READ));
///
/// let locked = CapabilityRegistry::empty();
/// assert!(locked.permitted(AgentRole::Room).is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityRegistry {
    grants: BTreeMap<AgentRole, Capability>,
}

impl CapabilityRegistry {
    /// A registry in which no role may do anything.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in permission table.
    #[must_use]
    pub fn standard() -> Self {
        let grants = AgentRole::ALL
            .into_iter()
            .map(|role| (role, standard_grant(role)))
            .collect();
        Self { grants }
    }

    /// Returns a copy of this registry with `role` granted exactly `caps`.
    #[must_use]
    pub fn with_grant(mut self, role: AgentRole, caps: Capability) -> Self {
        self.grants.insert(role, caps);
        self
    }

    /// Builds a registry from a name → action-list table.
    ///
    /// Roles missing from the table get the empty set.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] for an agent name that is not a known role
    /// or an action name that is not a known capability.
    pub fn from_table<S: AsRef<str>>(
        table: &BTreeMap<String, Vec<S>>,
    ) -> Result<Self, RegistryError> {
        let mut grants = BTreeMap::new();
        for (agent, actions) in table {
            let role = AgentRole::parse(agent).ok_or_else(|| RegistryError::UnknownAgent {
                agent: agent.clone(),
            })?;
            let (caps, unknown) = Capability::parse_list(actions);
            if let Some(action) = unknown.first() {
                return Err(RegistryError::UnknownAction {
                    agent: agent.clone(),
                    action: (*action).to_string(),
                });
            }
            grants.insert(role, caps);
        }
        Ok(Self { grants })
    }

    /// Returns the actions `role` may perform (empty if unregistered).
    #[must_use]
    pub fn permitted(&self, role: AgentRole) -> Capability {
        self.grants.get(&role).copied().unwrap_or_else(Capability::empty)
    }

    /// Returns `true` if `role` holds every action in `action`.
    ///
    /// An empty `action` is never allowed.
    #[must_use]
    pub fn allows(&self, role: AgentRole, action: Capability) -> bool {
        !action.is_empty() && self.permitted(role).contains(action)
    }

    /// Iterates over registered roles and their sets.
    pub fn iter(&self) -> impl Iterator<Item = (AgentRole, Capability)> + '_ {
        self.grants.iter().map(|(role, caps)| (*role, *caps))
    }
}

const fn standard_grant(role: AgentRole) -> Capability {
    match role {
        AgentRole::Intake => Capability::IDENTITY_READ
            .union(Capability::IDENTITY_WRITE)
            .union(Capability::CREATE_VISIT),
        AgentRole::Records => Capability::PATIENT_READ
            .union(Capability::VISIT_READ)
            .union(Capability::VISIT_WRITE),
        AgentRole::Diagnosis => Capability::VISIT_READ_ANONYMIZED,
        AgentRole::Room => Capability::ROOM_READ.union(Capability::ROOM_WRITE),
        AgentRole::Billing => Capability::BILLING_CREATE
            .union(Capability::BILLING_READ)
            .union(Capability::VISIT_BASIC_READ),
        AgentRole::Security => Capability::LOGS_READ,
    }
}
