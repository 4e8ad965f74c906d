//! Session/role gate.
//!
//! A protected view asks the gate whether it may render. The decision is a
//! pure function of the principal; navigation is left to the caller, which
//! acts on [`GateOutcome::Redirect`].

use crate::principal::{Gender, Principal, Role};

/// Where unauthorized principals are sent.
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

/// Decide whether `principal` may pass.
///
/// Fails closed on a missing principal. A gender restriction only applies to
/// principals that have a recorded gender.
pub fn authorize(
  principal: Option<&Principal>,
  allowed_roles: &[Role],
  allowed_genders: Option<&[Gender]>,
) -> bool {
  let Some(p) = principal else {
    return false;
  };
  if !allowed_roles.contains(&p.role) {
    return false;
  }
  match (allowed_genders, p.gender) {
    (Some(genders), Some(g)) => genders.contains(&g),
    _ => true,
  }
}

/// Landing path after sign-in; unknown or missing roles go to
/// [`UNAUTHORIZED_PATH`].
pub fn redirect_for(role: Option<Role>) -> &'static str {
  role.map(Role::home_path).unwrap_or(UNAUTHORIZED_PATH)
}

/// State of the "current user" provider when the gate is evaluated.
#[derive(Debug, Clone, Copy)]
pub enum PrincipalLoad<'a> {
  /// The provider has not answered yet.
  Loading,
  Loaded(Option<&'a Principal>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
  /// Show a neutral placeholder; do not navigate.
  Pending,
  Render,
  /// Navigate to the given path, once.
  Redirect(&'static str),
}

/// The access rule attached to one protected view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGate {
  roles:   Vec<Role>,
  genders: Option<Vec<Gender>>,
}

impl RoleGate {
  pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
    Self { roles: roles.into_iter().collect(), genders: None }
  }

  /// Gate that admits gate staff (watchman, warden, admin, super).
  pub fn staff() -> Self { Self::new(Role::STAFF) }

  pub fn with_genders(mut self, genders: impl IntoIterator<Item = Gender>) -> Self {
    self.genders = Some(genders.into_iter().collect());
    self
  }

  pub fn authorize(&self, principal: Option<&Principal>) -> bool {
    authorize(principal, &self.roles, self.genders.as_deref())
  }

  pub fn evaluate(&self, load: PrincipalLoad<'_>) -> GateOutcome {
    match load {
      PrincipalLoad::Loading => GateOutcome::Pending,
      PrincipalLoad::Loaded(p) if self.authorize(p) => GateOutcome::Render,
      PrincipalLoad::Loaded(_) => GateOutcome::Redirect(UNAUTHORIZED_PATH),
    }
  }
}
