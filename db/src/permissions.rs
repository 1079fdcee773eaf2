//! Role/category access control.
//!
//! The table below is the single authority for which staff roles may see and
//! act on which ticket categories. It is compiled in and exhaustive over
//! [`StaffRole`]; an unmapped role denies.
//!
//! The housing category is the one exception to pure table lookup: the three
//! management roles always pass, while every other role listed for housing
//! additionally needs the configured broker role on their Discord account,
//! resolved live by the caller. Callers gate every write action through
//! [`can_access_with_broker`]; the synchronous [`can_access`] is only safe
//! for list filtering, where a false negative hides a row instead of
//! authorizing one.

use crate::models::staff::StaffRole;
use crate::models::ticket::TicketCategory as Cat;
use std::str::FromStr;

/// Categories a role may access, before broker verification.
fn table(role: StaffRole) -> &'static [Cat] {
    match role {
        StaffRole::Helper => &[Cat::Support, Cat::Bugs],
        StaffRole::Support => &[Cat::Support, Cat::Bugs, Cat::Boost, Cat::Housing],
        StaffRole::Moderator => &[Cat::Support, Cat::Bugs, Cat::Boost, Cat::Housing],
        StaffRole::Coordinator => &[
            Cat::Support,
            Cat::Bugs,
            Cat::Boost,
            Cat::Housing,
            Cat::Reports,
            Cat::Review,
        ],
        StaffRole::CommunityManager => &[
            Cat::Support,
            Cat::Bugs,
            Cat::Boost,
            Cat::Housing,
            Cat::Reports,
            Cat::Review,
        ],
        StaffRole::Dev | StaffRole::Ceo => &[
            Cat::Support,
            Cat::Bugs,
            Cat::Reports,
            Cat::Donations,
            Cat::Boost,
            Cat::Housing,
            Cat::Review,
        ],
    }
}

/// Roles that never need broker verification for housing.
pub fn broker_exempt(role: StaffRole) -> bool {
    matches!(
        role,
        StaffRole::CommunityManager | StaffRole::Dev | StaffRole::Ceo
    )
}

/// Raw table membership, ignoring the broker requirement.
///
/// This is the right check for role-level questions (e.g. validating flag
/// targets), where there is no individual account to verify.
pub fn can_access_in_table(role: StaffRole, category: Cat) -> bool {
    table(role).contains(&category)
}

/// Synchronous check, default-deny for unverified housing access.
///
/// Only suitable for filtering listings; write actions must go through
/// [`can_access_with_broker`].
pub fn can_access(role: StaffRole, category: Cat) -> bool {
    if category == Cat::Housing && !broker_exempt(role) {
        return false;
    }
    can_access_in_table(role, category)
}

/// Full check with the live broker result supplied by the caller.
///
/// Callers resolve `is_broker` from Discord before invoking this, treating
/// lookup failures and timeouts as `false`.
pub fn can_access_with_broker(role: StaffRole, category: Cat, is_broker: bool) -> bool {
    if !can_access_in_table(role, category) {
        return false;
    }
    if category == Cat::Housing && !broker_exempt(role) {
        return is_broker;
    }
    true
}

/// Categories visible to a role given its broker status, in table order.
pub fn allowed_categories(role: StaffRole, is_broker: bool) -> Vec<Cat> {
    table(role)
        .iter()
        .copied()
        .filter(|&c| can_access_with_broker(role, c, is_broker))
        .collect()
}

/// Priority used when a Discord member maps to several staff roles.
pub fn priority(role: StaffRole) -> u8 {
    match role {
        StaffRole::Ceo => 100,
        StaffRole::Dev => 90,
        StaffRole::CommunityManager => 80,
        StaffRole::Coordinator => 60,
        StaffRole::Moderator => 40,
        StaffRole::Support => 20,
        StaffRole::Helper => 10,
    }
}

/// Mapping of Discord role ids to staff roles, parsed once from configuration.
///
/// The config value is a comma-separated list of `discord_role_id=staff_role`
/// pairs, e.g. `1046404063689977986=ceo,1046404063673192542=support`.
/// Malformed entries are skipped with a warning rather than failing startup.
#[derive(Debug, Clone, Default)]
pub struct RoleMap {
    entries: Vec<(String, StaffRole)>,
}

impl RoleMap {
    pub fn from_spec(spec: &str) -> Self {
        let mut entries = Vec::new();
        for pair in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match pair.split_once('=') {
                Some((id, role_str)) => match StaffRole::from_str(role_str.trim()) {
                    Ok(role) => entries.push((id.trim().to_owned(), role)),
                    Err(_) => {
                        tracing::warn!(entry = pair, "Unknown staff role in role map; skipping")
                    }
                },
                None => tracing::warn!(entry = pair, "Malformed role map entry; skipping"),
            }
        }
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn role_for(&self, discord_role_id: &str) -> Option<StaffRole> {
        self.entries
            .iter()
            .find(|(id, _)| id == discord_role_id)
            .map(|(_, role)| *role)
    }

    /// Highest-priority staff role among a member's Discord role ids.
    pub fn highest_role(&self, discord_role_ids: &[String]) -> Option<StaffRole> {
        discord_role_ids
            .iter()
            .filter_map(|id| self.role_for(id))
            .max_by_key(|role| priority(*role))
    }

    /// Whether any of the member's Discord roles maps to a staff role.
    pub fn has_staff_role(&self, discord_role_ids: &[String]) -> bool {
        discord_role_ids.iter().any(|id| self.role_for(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use StaffRole::*;
    use strum::IntoEnumIterator;

    #[test]
    fn helper_sees_only_support_and_bugs() {
        assert!(can_access(Helper, Cat::Support));
        assert!(can_access(Helper, Cat::Bugs));
        assert!(!can_access(Helper, Cat::Boost));
        assert!(!can_access(Helper, Cat::Reports));
        assert!(!can_access(Helper, Cat::Donations));
        assert!(!can_access(Helper, Cat::Housing));
        assert!(!can_access(Helper, Cat::Review));
    }

    #[test]
    fn donations_is_management_only() {
        for role in StaffRole::iter() {
            let expected = matches!(role, Dev | Ceo);
            assert_eq!(can_access(role, Cat::Donations), expected, "{role:?}");
        }
    }

    #[test]
    fn housing_denied_synchronously_for_non_exempt_roles() {
        // Support and Moderator are in the housing table row but unverified.
        assert!(!can_access(Support, Cat::Housing));
        assert!(!can_access(Moderator, Cat::Housing));
        assert!(can_access(CommunityManager, Cat::Housing));
        assert!(can_access(Dev, Cat::Housing));
        assert!(can_access(Ceo, Cat::Housing));
    }

    #[test]
    fn housing_needs_broker_for_non_exempt_roles() {
        assert!(can_access_with_broker(Support, Cat::Housing, true));
        assert!(!can_access_with_broker(Support, Cat::Housing, false));
        assert!(can_access_with_broker(Moderator, Cat::Housing, true));
        assert!(!can_access_with_broker(Moderator, Cat::Housing, false));

        // Helper is not in the housing row at all; broker status is moot.
        assert!(!can_access_with_broker(Helper, Cat::Housing, true));

        // Exempt roles pass regardless of broker status.
        assert!(can_access_with_broker(Ceo, Cat::Housing, false));
        assert!(can_access_with_broker(Dev, Cat::Housing, false));
        assert!(can_access_with_broker(CommunityManager, Cat::Housing, false));
    }

    #[test]
    fn broker_only_widens_housing() {
        for role in StaffRole::iter() {
            for category in Cat::iter() {
                if category == Cat::Housing {
                    continue;
                }
                assert_eq!(
                    can_access_with_broker(role, category, true),
                    can_access_with_broker(role, category, false),
                    "{role:?}/{category:?}"
                );
            }
        }
    }

    #[test]
    fn allowed_categories_reflect_broker_status() {
        let without = allowed_categories(Support, false);
        assert!(!without.contains(&Cat::Housing));
        let with = allowed_categories(Support, true);
        assert!(with.contains(&Cat::Housing));
        assert_eq!(with.len(), without.len() + 1);
    }

    #[test]
    fn role_map_picks_highest_priority_role() {
        let map = RoleMap::from_spec("100=support, 200=ceo,300=moderator");
        let roles = vec!["300".to_string(), "100".to_string(), "200".to_string()];
        assert_eq!(map.highest_role(&roles), Some(Ceo));
        assert_eq!(map.highest_role(&["100".to_string()]), Some(Support));
        assert_eq!(map.highest_role(&["999".to_string()]), None);
        assert!(map.has_staff_role(&roles));
        assert!(!map.has_staff_role(&["999".to_string()]));
    }

    #[test]
    fn role_map_skips_malformed_entries() {
        let map = RoleMap::from_spec("100=support,garbage,200=not_a_role,");
        assert_eq!(map.role_for("100"), Some(Support));
        assert_eq!(map.role_for("200"), None);
        assert_eq!(map.role_for("garbage"), None);
    }
}
