//! Policy rule compilation.
//!
//! Turns the `policies:` config map into lookup-ready rules. Rules can also be
//! assembled in code with the builder methods on [`PolicyRule`].

use std::collections::{BTreeMap, HashMap, HashSet};

use callgate_core::error::Result;
use callgate_core::identity::{Role, SubscriptionState};

use crate::config::PolicyRuleConfig;

/// Compiled rule for one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyRule {
    pub requires_auth: bool,
    pub requires_role: Option<Role>,
    pub requires_subscription: Option<HashSet<SubscriptionState>>,
}

impl PolicyRule {
    /// No requirements. Equivalent to having no rule at all.
    pub fn public() -> Self {
        Self::default()
    }

    pub fn authenticated() -> Self {
        Self {
            requires_auth: true,
            ..Self::default()
        }
    }

    /// Require a role. Implies authentication.
    pub fn role(mut self, role: Role) -> Self {
        self.requires_auth = true;
        self.requires_role = Some(role);
        self
    }

    /// Require one of the given subscription states. Implies authentication.
    pub fn subscription(mut self, states: impl IntoIterator<Item = SubscriptionState>) -> Self {
        self.requires_auth = true;
        self.requires_subscription = Some(states.into_iter().collect());
        self
    }

    /// Shorthand for `active` or `trialing`.
    pub fn paying(self) -> Self {
        self.subscription([SubscriptionState::Active, SubscriptionState::Trialing])
    }
}

pub fn compile_rules(raw: &BTreeMap<String, PolicyRuleConfig>) -> Result<HashMap<String, PolicyRule>> {
    let mut out = HashMap::with_capacity(raw.len());
    for (op, cfg) in raw {
        cfg.validate(op)?;
        let rule = PolicyRule {
            requires_auth: cfg.requires_auth,
            requires_role: cfg.requires_role,
            requires_subscription: cfg
                .requires_subscription
                .as_ref()
                .map(|s| s.iter().copied().collect()),
        };
        out.insert(op.clone(), rule);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_imply_auth() {
        let r = PolicyRule::public().role(Role::Admin);
        assert!(r.requires_auth);
        assert_eq!(r.requires_role, Some(Role::Admin));

        let r = PolicyRule::public().paying();
        assert!(r.requires_auth);
        let set = r.requires_subscription.unwrap_or_default();
        assert!(set.contains(&SubscriptionState::Active));
        assert!(set.contains(&SubscriptionState::Trialing));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn compile_from_yaml() {
        let raw: BTreeMap<String, PolicyRuleConfig> = serde_yaml::from_str(
            r#"
createEntry: { requires_auth: true, requires_subscription: [active, trialing] }
adminStats: { requires_auth: true, requires_role: admin }
listEntries: {}
"#,
        )
        .unwrap_or_default();
        let rules = compile_rules(&raw).unwrap_or_default();
        assert_eq!(rules.len(), 3);
        assert_eq!(rules.get("adminStats"), Some(&PolicyRule::authenticated().role(Role::Admin)));
        assert_eq!(rules.get("listEntries"), Some(&PolicyRule::public()));
        assert_eq!(rules.get("createEntry"), Some(&PolicyRule::authenticated().paying()));
    }

    #[test]
    fn compile_rejects_gate_without_auth() {
        let mut raw = BTreeMap::new();
        raw.insert(
            "adminStats".to_string(),
            PolicyRuleConfig {
                requires_auth: false,
                requires_role: Some(Role::Admin),
                requires_subscription: None,
            },
        );
        assert!(compile_rules(&raw).is_err());
    }
}
