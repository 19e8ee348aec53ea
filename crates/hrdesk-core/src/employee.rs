//! Employee records (`users` collection).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  kra::KraAssignment,
  record::Record,
  role::Role,
  store::Collection,
};

/// Salary account details printed on payslips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BankAccount {
  pub bank_name:      String,
  pub account_number: String,
  pub ifsc:           String,
}

/// Identity and HR profile of one employee account.
///
/// Employees are never deleted; `is_blocked` disables the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Employee {
  pub id:            String,
  /// Human-facing unique code, e.g. `EMP-0042`.
  pub employee_code: String,
  pub name:          String,
  #[serde(default)]
  pub email:         Option<String>,
  pub department:    String,
  pub designation:   String,
  #[serde(default)]
  pub role:          Role,
  pub joining_date:  NaiveDate,
  #[serde(default)]
  pub pan:           Option<String>,
  #[serde(default)]
  pub uan:           Option<String>,
  #[serde(default)]
  pub pf_number:     Option<String>,
  #[serde(default)]
  pub bank_account:  Option<BankAccount>,
  /// Optional KRA selections. Mandatory department KRAs are implicit.
  #[serde(default)]
  pub kras:          Vec<KraAssignment>,
  #[serde(default)]
  pub is_blocked:    bool,
}

impl Record for Employee {
  const COLLECTION: Collection = Collection::Users;

  fn id(&self) -> &str { &self.id }
}

impl Employee {
  /// Fail with [`Error::Blocked`] if this account is disabled.
  pub fn ensure_active(&self) -> Result<()> {
    if self.is_blocked {
      return Err(Error::Blocked(self.id.clone()));
    }
    Ok(())
  }

  /// Whether `self` may read data belonging to `employee_id`.
  pub fn can_view(&self, employee_id: &str) -> bool {
    self.id == employee_id || self.role.is_manager()
  }
}

/// Input for provisioning a new employee account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewEmployee {
  pub employee_code: String,
  pub name:          String,
  #[serde(default)]
  pub email:         Option<String>,
  pub department:    String,
  pub designation:   String,
  #[serde(default)]
  pub role:          Role,
  pub joining_date:  NaiveDate,
  #[serde(default)]
  pub pan:           Option<String>,
  #[serde(default)]
  pub uan:           Option<String>,
  #[serde(default)]
  pub pf_number:     Option<String>,
  #[serde(default)]
  pub bank_account:  Option<BankAccount>,
}

impl NewEmployee {
  /// Reject blank required fields.
  pub fn validate(&self) -> Result<()> {
    let required = [
      ("employee_code", &self.employee_code),
      ("name", &self.name),
      ("department", &self.department),
      ("designation", &self.designation),
    ];
    for (field, value) in required {
      if value.trim().is_empty() {
        return Err(Error::MissingField(field));
      }
    }
    Ok(())
  }

  /// Build the record; `id` is filled in once the store assigns one.
  pub fn into_employee(self) -> Employee {
    Employee {
      id:            String::new(),
      employee_code: self.employee_code.trim().to_owned(),
      name:          self.name.trim().to_owned(),
      email:         self.email,
      department:    self.department.trim().to_owned(),
      designation:   self.designation.trim().to_owned(),
      role:          self.role,
      joining_date:  self.joining_date,
      pan:           self.pan,
      uan:           self.uan,
      pf_number:     self.pf_number,
      bank_account:  self.bank_account,
      kras:          Vec::new(),
      is_blocked:    false,
    }
  }
}
