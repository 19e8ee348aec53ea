//! Key Result Areas: templates, per-employee selections and the approval
//! state machine.
//!
//! Every department has a library of [`KraTemplate`]s. Mandatory templates
//! apply to everyone in the department and are never stored on the employee.
//! Optional templates are requested by the employee and approved or rejected
//! by a manager. The combined weightage of an employee's mandatory and
//! selected KRAs never exceeds [`WEIGHT_BUDGET`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{
  Error, Result, employee::Employee, record::Record, store::Collection,
};

/// Upper bound, in percent, on the weightage an employee may carry.
pub const WEIGHT_BUDGET: u32 = 100;

// ─── Templates ───────────────────────────────────────────────────────────────

/// A department-scoped goal definition (`kra_templates` collection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KraTemplate {
  pub id:           String,
  pub title:        String,
  #[serde(default)]
  pub description:  String,
  pub department:   String,
  #[serde(default)]
  pub is_mandatory: bool,
  /// Integer percent, 0–100.
  pub weightage:    u32,
}

impl Record for KraTemplate {
  const COLLECTION: Collection = Collection::KraTemplates;

  fn id(&self) -> &str { &self.id }
}

/// Input for creating or replacing a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewKraTemplate {
  pub title:        String,
  #[serde(default)]
  pub description:  String,
  pub department:   String,
  #[serde(default)]
  pub is_mandatory: bool,
  pub weightage:    u32,
}

impl NewKraTemplate {
  pub fn validate(&self) -> Result<()> {
    if self.title.trim().is_empty() {
      return Err(Error::MissingField("title"));
    }
    if self.department.trim().is_empty() {
      return Err(Error::MissingField("department"));
    }
    if self.weightage > WEIGHT_BUDGET {
      return Err(Error::InvalidWeightage(self.weightage));
    }
    Ok(())
  }

  pub fn into_template(self, id: String) -> KraTemplate {
    KraTemplate {
      id,
      title: self.title.trim().to_owned(),
      description: self.description,
      department: self.department.trim().to_owned(),
      is_mandatory: self.is_mandatory,
      weightage: self.weightage,
    }
  }
}

/// Reject a mandatory template that would push its department's mandatory
/// weightage past [`WEIGHT_BUDGET`]. `editing` excludes the template being
/// replaced from the existing total.
pub fn check_mandatory_budget(
  library: &[KraTemplate],
  department: &str,
  weightage: u32,
  editing: Option<&str>,
) -> Result<()> {
  let current: u32 = library
    .iter()
    .filter(|t| t.is_mandatory && t.department == department)
    .filter(|t| Some(t.id.as_str()) != editing)
    .map(|t| t.weightage)
    .sum();

  if current + weightage > WEIGHT_BUDGET {
    return Err(Error::MandatoryBudgetExceeded {
      department: department.to_owned(),
      current,
      requested: weightage,
    });
  }
  Ok(())
}

// ─── Assignments ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
  Pending,
  Approved,
}

/// An optional KRA selected by an employee (embedded in [`Employee::kras`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KraAssignment {
  pub kra_id: String,
  pub status: AssignmentStatus,
}

// ─── State machine ───────────────────────────────────────────────────────────

/// Where a KRA stands for one employee.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum KraState {
  /// Department-wide and always active.
  Mandatory,
  /// Not selected.
  #[serde(rename = "none")]
  #[strum(serialize = "none")]
  Unselected,
  Pending,
  Approved,
}

/// A transition request against the state machine.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum KraAction {
  /// Employee: none → pending.
  Request,
  /// Employee: pending → none.
  Withdraw,
  /// Manager: pending → approved.
  Approve,
  /// Manager: pending → none.
  Reject,
  /// Manager: approved → none.
  Remove,
}

impl KraAction {
  /// Whether the action is taken by a manager rather than the employee.
  pub fn by_manager(self) -> bool {
    matches!(self, Self::Approve | Self::Reject | Self::Remove)
  }

  fn verb(self) -> &'static str {
    match self {
      Self::Request => "requested",
      Self::Withdraw => "withdrawn",
      Self::Approve => "approved",
      Self::Reject => "rejected",
      Self::Remove => "removed",
    }
  }
}

/// One employee's KRA selections against the template library.
///
/// Pure: transitions mutate the in-memory assignment list only. The caller
/// persists [`KraBook::into_assignments`] as one write.
#[derive(Debug, Clone)]
pub struct KraBook<'a> {
  department:  &'a str,
  library:     &'a [KraTemplate],
  assignments: Vec<KraAssignment>,
}

impl<'a> KraBook<'a> {
  pub fn new(employee: &'a Employee, library: &'a [KraTemplate]) -> Self {
    Self {
      department: &employee.department,
      library,
      assignments: employee.kras.clone(),
    }
  }

  pub fn assignments(&self) -> &[KraAssignment] { &self.assignments }

  pub fn into_assignments(self) -> Vec<KraAssignment> { self.assignments }

  fn template(&self, kra_id: &str) -> Option<&'a KraTemplate> {
    self.library.iter().find(|t| t.id == kra_id)
  }

  fn is_mandatory(&self, t: &KraTemplate) -> bool {
    t.is_mandatory && t.department == self.department
  }

  fn position(&self, kra_id: &str) -> Option<usize> {
    self.assignments.iter().position(|a| a.kra_id == kra_id)
  }

  pub fn state(&self, kra_id: &str) -> KraState {
    if self.template(kra_id).is_some_and(|t| self.is_mandatory(t)) {
      return KraState::Mandatory;
    }
    match self.position(kra_id).map(|i| self.assignments[i].status) {
      Some(AssignmentStatus::Pending) => KraState::Pending,
      Some(AssignmentStatus::Approved) => KraState::Approved,
      None => KraState::Unselected,
    }
  }

  /// Ids of mandatory department KRAs plus selections in `statuses`,
  /// deduplicated, in a stable order.
  fn ids_with(&self, statuses: &[AssignmentStatus]) -> BTreeSet<&str> {
    let mandatory = self
      .library
      .iter()
      .filter(|t| self.is_mandatory(t))
      .map(|t| t.id.as_str());
    let selected = self
      .assignments
      .iter()
      .filter(|a| statuses.contains(&a.status))
      .map(|a| a.kra_id.as_str());
    mandatory.chain(selected).collect()
  }

  /// Weightage of mandatory ∪ pending ∪ approved KRAs. Selections whose
  /// template no longer exists weigh nothing.
  pub fn total_weight(&self) -> u32 {
    self
      .ids_with(&[AssignmentStatus::Pending, AssignmentStatus::Approved])
      .into_iter()
      .filter_map(|id| self.template(id))
      .map(|t| t.weightage)
      .sum()
  }

  /// The KRAs an employee is scored on: mandatory ∪ approved.
  pub fn active(&self) -> Vec<&'a KraTemplate> {
    self
      .ids_with(&[AssignmentStatus::Approved])
      .into_iter()
      .filter_map(|id| self.template(id))
      .collect()
  }

  /// Apply `action` to `kra_id`, enforcing the transition guards.
  pub fn apply(&mut self, action: KraAction, kra_id: &str) -> Result<()> {
    let state = self.state(kra_id);
    let invalid = || Error::InvalidTransition {
      kra_id: kra_id.to_owned(),
      state,
      action: action.into(),
    };

    if state == KraState::Mandatory {
      return Err(Error::MandatoryKra {
        kra_id: kra_id.to_owned(),
        action: action.verb(),
      });
    }

    match (action, state) {
      (KraAction::Request, KraState::Unselected) => {
        let template = self
          .template(kra_id)
          .filter(|t| t.department == self.department)
          .ok_or_else(|| Error::UnknownKra(kra_id.to_owned()))?;
        let current = self.total_weight();
        if current + template.weightage > WEIGHT_BUDGET {
          return Err(Error::WeightBudgetExceeded {
            current,
            requested: template.weightage,
          });
        }
        self.assignments.push(KraAssignment {
          kra_id: kra_id.to_owned(),
          status: AssignmentStatus::Pending,
        });
      }
      (KraAction::Request, KraState::Pending | KraState::Approved) => {
        return Err(Error::AlreadySelected(kra_id.to_owned()));
      }
      (KraAction::Withdraw, KraState::Approved) => {
        return Err(Error::ApprovedWithdrawal(kra_id.to_owned()));
      }
      (KraAction::Withdraw | KraAction::Reject, KraState::Pending)
      | (KraAction::Remove, KraState::Approved) => {
        self.assignments.retain(|a| a.kra_id != kra_id);
      }
      (KraAction::Approve, KraState::Pending) => {
        if let Some(i) = self.position(kra_id) {
          self.assignments[i].status = AssignmentStatus::Approved;
        }
      }
      _ => return Err(invalid()),
    }
    Ok(())
  }

  /// Every department template with its state for this employee, plus any
  /// selection whose template is outside the department.
  pub fn overview(&self) -> KraOverview {
    let rows = self
      .library
      .iter()
      .filter(|t| t.department == self.department || self.position(&t.id).is_some())
      .map(|t| KraOverviewRow { template: t.clone(), state: self.state(&t.id) })
      .collect();
    let total_weight = self.total_weight();
    KraOverview {
      rows,
      total_weight,
      remaining_weight: WEIGHT_BUDGET.saturating_sub(total_weight),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KraOverviewRow {
  pub template: KraTemplate,
  pub state:    KraState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KraOverview {
  pub rows:             Vec<KraOverviewRow>,
  pub total_weight:     u32,
  pub remaining_weight: u32,
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::role::Role;

  fn template(id: &str, mandatory: bool, weightage: u32) -> KraTemplate {
    KraTemplate {
      id: id.into(),
      title: format!("KRA {id}"),
      description: String::new(),
      department: "Sales".into(),
      is_mandatory: mandatory,
      weightage,
    }
  }

  fn employee(kras: Vec<KraAssignment>) -> Employee {
    Employee {
      id: "e1".into(),
      employee_code: "EMP-1".into(),
      name: "Meera".into(),
      email: None,
      department: "Sales".into(),
      designation: "Executive".into(),
      role: Role::Employee,
      joining_date: NaiveDate::from_ymd_opt(2023, 5, 1).unwrap(),
      pan: None,
      uan: None,
      pf_number: None,
      bank_account: None,
      kras,
      is_blocked: false,
    }
  }

  fn library() -> Vec<KraTemplate> {
    vec![
      template("m1", true, 30),
      template("m2", true, 30),
      template("o40", false, 40),
      template("o50", false, 50),
      template("o10", false, 10),
    ]
  }

  #[test]
  fn request_respects_weight_budget() {
    let lib = library();
    let emp = employee(vec![]);
    let mut book = KraBook::new(&emp, &lib);
    assert_eq!(book.total_weight(), 60);

    let err = book.apply(KraAction::Request, "o50").unwrap_err();
    assert!(matches!(err, Error::WeightBudgetExceeded {
      current:   60,
      requested: 50,
    }));

    book.apply(KraAction::Request, "o40").unwrap();
    assert_eq!(book.total_weight(), 100);
    assert_eq!(book.state("o40"), KraState::Pending);

    // Budget is full; even 10% more is refused.
    assert!(book.apply(KraAction::Request, "o10").is_err());
  }

  #[test]
  fn mandatory_kras_are_not_toggleable() {
    let lib = library();
    let emp = employee(vec![]);
    let mut book = KraBook::new(&emp, &lib);
    for action in [KraAction::Request, KraAction::Withdraw, KraAction::Remove] {
      assert!(matches!(
        book.apply(action, "m1"),
        Err(Error::MandatoryKra { .. })
      ));
    }
  }

  #[test]
  fn invalid_transitions_name_the_action() {
    let lib = library();
    let emp = employee(vec![]);
    let mut book = KraBook::new(&emp, &lib);
    let err = book.apply(KraAction::Approve, "o40").unwrap_err();
    assert!(matches!(
      err,
      Error::InvalidTransition { state: KraState::Unselected, action: "approve", .. }
    ));
    assert_eq!(<&str>::from(KraAction::Withdraw), KraAction::Withdraw.to_string());
  }

  #[test]
  fn employee_withdraws_pending_but_not_approved() {
    let lib = library();
    let emp = employee(vec![KraAssignment {
      kra_id: "o10".into(),
      status: AssignmentStatus::Approved,
    }]);
    let mut book = KraBook::new(&emp, &lib);
    assert!(matches!(
      book.apply(KraAction::Withdraw, "o10"),
      Err(Error::ApprovedWithdrawal(_))
    ));

    book.apply(KraAction::Request, "o40").unwrap_err(); // 60 + 10 + 40 > 100
    book.apply(KraAction::Remove, "o10").unwrap();
    book.apply(KraAction::Request, "o40").unwrap();
    book.apply(KraAction::Withdraw, "o40").unwrap();
    assert_eq!(book.state("o40"), KraState::Unselected);
    assert!(book.assignments().is_empty());
  }

  #[test]
  fn manager_approve_and_reject() {
    let lib = library();
    let emp = employee(vec![]);
    let mut book = KraBook::new(&emp, &lib);

    book.apply(KraAction::Request, "o10").unwrap();
    book.apply(KraAction::Approve, "o10").unwrap();
    assert_eq!(book.state("o10"), KraState::Approved);
    // Approving twice is not a valid transition.
    assert!(matches!(
      book.apply(KraAction::Approve, "o10"),
      Err(Error::InvalidTransition { state: KraState::Approved, .. })
    ));

    book.apply(KraAction::Request, "o40").unwrap_err();
    book.apply(KraAction::Remove, "o10").unwrap();
    book.apply(KraAction::Request, "o40").unwrap();
    book.apply(KraAction::Reject, "o40").unwrap();
    assert_eq!(book.state("o40"), KraState::Unselected);
    assert!(book.into_assignments().is_empty());
  }

  #[test]
  fn remove_requires_approved() {
    let lib = library();
    let emp = employee(vec![KraAssignment {
      kra_id: "o10".into(),
      status: AssignmentStatus::Pending,
    }]);
    let mut book = KraBook::new(&emp, &lib);
    assert!(matches!(
      book.apply(KraAction::Remove, "o10"),
      Err(Error::InvalidTransition { state: KraState::Pending, .. })
    ));
  }

  #[test]
  fn duplicate_request_is_refused() {
    let lib = library();
    let emp = employee(vec![]);
    let mut book = KraBook::new(&emp, &lib);
    book.apply(KraAction::Request, "o10").unwrap();
    assert!(matches!(
      book.apply(KraAction::Request, "o10"),
      Err(Error::AlreadySelected(_))
    ));
  }

  #[test]
  fn active_set_is_mandatory_plus_approved() {
    let lib = library();
    let emp = employee(vec![
      KraAssignment { kra_id: "o10".into(), status: AssignmentStatus::Approved },
      KraAssignment { kra_id: "o40".into(), status: AssignmentStatus::Pending },
      // A stale selection of a mandatory KRA is counted once.
      KraAssignment { kra_id: "m1".into(), status: AssignmentStatus::Approved },
    ]);
    let book = KraBook::new(&emp, &lib);
    let ids: Vec<_> = book.active().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["m1", "m2", "o10"]);
    assert_eq!(book.total_weight(), 110);
  }

  #[test]
  fn mandatory_template_budget() {
    let mut lib = library();
    lib[0].weightage = 40; // department mandatory total is now 70

    let err = check_mandatory_budget(&lib, "Sales", 50, None).unwrap_err();
    assert!(matches!(err, Error::MandatoryBudgetExceeded {
      current:   70,
      requested: 50,
      ..
    }));
    assert!(check_mandatory_budget(&lib, "Sales", 30, None).is_ok());
    // Editing m1 excludes its own 40%.
    assert!(check_mandatory_budget(&lib, "Sales", 70, Some("m1")).is_ok());
    assert!(check_mandatory_budget(&lib, "Support", 100, None).is_ok());
  }

  #[test]
  fn template_input_is_validated() {
    let input = NewKraTemplate {
      title:        "Revenue".into(),
      description:  String::new(),
      department:   "Sales".into(),
      is_mandatory: false,
      weightage:    120,
    };
    assert!(matches!(input.validate(), Err(Error::InvalidWeightage(120))));
  }
}
