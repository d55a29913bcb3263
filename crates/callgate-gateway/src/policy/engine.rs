use std::collections::HashMap;

use callgate_core::error::{ClientCode, Result};
use callgate_core::identity::Role;

use super::rules::{compile_rules, PolicyRule};
use crate::auth::AuthContext;
use crate::config::GatewayConfig;

/// Decision from policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    Pass,
    Reject { code: ClientCode, msg: &'static str },
}

impl PolicyDecision {
    pub fn is_pass(&self) -> bool {
        matches!(self, PolicyDecision::Pass)
    }
}

/// Operation name -> rule. Operations without a rule are public.
/// Construct once at startup, then share via Arc.
#[derive(Debug, Default)]
pub struct PolicyTable {
    rules: HashMap<String, PolicyRule>,
}

impl PolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(cfg: &GatewayConfig) -> Result<Self> {
        Ok(Self {
            rules: compile_rules(&cfg.policies)?,
        })
    }

    /// Add or replace the rule for `op`.
    pub fn with_rule(mut self, op: impl Into<String>, rule: PolicyRule) -> Self {
        self.rules.insert(op.into(), rule);
        self
    }

    pub fn rule(&self, op: &str) -> Option<&PolicyRule> {
        self.rules.get(op)
    }

    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Pure check of `op` against the caller. First failing check wins.
    pub fn evaluate(&self, op: &str, ctx: Option<&AuthContext>) -> PolicyDecision {
        match self.rules.get(op) {
            Some(rule) => evaluate_rule(rule, ctx),
            None => PolicyDecision::Pass,
        }
    }
}

/// Order: authentication, ban, role, subscription.
pub fn evaluate_rule(rule: &PolicyRule, ctx: Option<&AuthContext>) -> PolicyDecision {
    if rule.requires_auth {
        let Some(c) = ctx else {
            return PolicyDecision::Reject {
                code: ClientCode::Unauthorized,
                msg: "unauthorized",
            };
        };
        if c.is_banned() {
            return PolicyDecision::Reject {
                code: ClientCode::Banned,
                msg: "account banned",
            };
        }
    }

    if let Some(required) = rule.requires_role {
        if ctx.map(AuthContext::role) != Some(required) {
            return match required {
                Role::Admin => PolicyDecision::Reject {
                    code: ClientCode::AdminOnly,
                    msg: "admin only",
                },
                Role::User => PolicyDecision::Reject {
                    code: ClientCode::RoleRequired,
                    msg: "role required",
                },
            };
        }
    }

    if let Some(allowed) = &rule.requires_subscription {
        let ok = ctx.is_some_and(|c| allowed.contains(&c.subscription_state()));
        if !ok {
            return PolicyDecision::Reject {
                code: ClientCode::SubscriptionRequired,
                msg: "subscription required",
            };
        }
    }

    PolicyDecision::Pass
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::context::fixtures::ctx;
    use callgate_core::identity::SubscriptionState as S;

    fn table() -> PolicyTable {
        PolicyTable::new()
            .with_rule("profile", PolicyRule::authenticated())
            .with_rule("adminStats", PolicyRule::authenticated().role(Role::Admin))
            .with_rule("downloadCart", PolicyRule::authenticated().paying())
            .with_rule("adminPublish", PolicyRule::authenticated().role(Role::Admin).paying())
    }

    fn code(d: PolicyDecision) -> Option<ClientCode> {
        match d {
            PolicyDecision::Pass => None,
            PolicyDecision::Reject { code, .. } => Some(code),
        }
    }

    #[test]
    fn unknown_rule_is_public() {
        assert!(table().evaluate("listEntries", None).is_pass());
    }

    #[test]
    fn anonymous_gets_unauthorized_not_ban_state() {
        let t = table();
        for op in ["profile", "adminStats", "downloadCart", "adminPublish"] {
            assert_eq!(code(t.evaluate(op, None)), Some(ClientCode::Unauthorized), "{op}");
        }
    }

    #[test]
    fn ban_beats_role_and_subscription() {
        let banned_admin = ctx(Role::Admin, S::Active, true);
        let t = table();
        for op in ["profile", "adminStats", "downloadCart", "adminPublish"] {
            assert_eq!(code(t.evaluate(op, Some(&banned_admin))), Some(ClientCode::Banned), "{op}");
        }
        // public ops do not look at ban state
        assert!(t.evaluate("listEntries", Some(&banned_admin)).is_pass());
    }

    #[test]
    fn role_before_subscription() {
        let t = table();
        let user_none = ctx(Role::User, S::None, false);
        assert_eq!(code(t.evaluate("adminPublish", Some(&user_none))), Some(ClientCode::AdminOnly));

        let user_active = ctx(Role::User, S::Active, false);
        assert_eq!(code(t.evaluate("adminStats", Some(&user_active))), Some(ClientCode::AdminOnly));

        let admin_none = ctx(Role::Admin, S::None, false);
        assert!(t.evaluate("adminStats", Some(&admin_none)).is_pass());
        assert_eq!(
            code(t.evaluate("adminPublish", Some(&admin_none))),
            Some(ClientCode::SubscriptionRequired)
        );
    }

    #[test]
    fn subscription_states() {
        let t = table();
        for (state, pass) in [(S::None, false), (S::Canceled, false), (S::Active, true), (S::Trialing, true)] {
            let c = ctx(Role::User, state, false);
            let d = t.evaluate("downloadCart", Some(&c));
            assert_eq!(d.is_pass(), pass, "{state}");
            if !pass {
                assert_eq!(code(d), Some(ClientCode::SubscriptionRequired));
            }
        }
    }

    #[test]
    fn user_role_rule_uses_role_required() {
        let t = PolicyTable::new().with_rule("userOnly", PolicyRule::authenticated().role(Role::User));
        let admin = ctx(Role::Admin, S::None, false);
        assert_eq!(code(t.evaluate("userOnly", Some(&admin))), Some(ClientCode::RoleRequired));
    }

    #[test]
    fn gate_without_auth_still_fails_closed_for_anonymous() {
        let rule = PolicyRule {
            requires_auth: false,
            requires_role: Some(Role::Admin),
            requires_subscription: None,
        };
        assert_eq!(code(evaluate_rule(&rule, None)), Some(ClientCode::AdminOnly));
    }

    #[test]
    fn evaluation_is_deterministic() {
        let t = table();
        let c = ctx(Role::User, S::Trialing, false);
        let first = t.evaluate("downloadCart", Some(&c));
        for _ in 0..10 {
            assert_eq!(t.evaluate("downloadCart", Some(&c)), first);
        }
    }
}
