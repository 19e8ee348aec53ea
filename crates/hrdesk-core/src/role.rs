//! The access-role hierarchy.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::{Error, Result};

/// Access role of an employee account.
///
/// Variants are declared lowest first; the derived `Ord` is the hierarchy, so
/// `Role::Hr < Role::Admin` holds and "HR or above" is `role >= Role::Hr`.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
  #[default]
  Employee,
  Hr,
  Admin,
  SuperAdmin,
}

impl Role {
  /// Return `Err(Forbidden)` unless `self` is at least `required`.
  pub fn require(self, required: Role) -> Result<()> {
    if self >= required {
      Ok(())
    } else {
      Err(Error::Forbidden { required, actual: self })
    }
  }

  /// Whether this role may act on another employee's KRAs and scorecards.
  pub fn is_manager(self) -> bool { self >= Role::Hr }
}
