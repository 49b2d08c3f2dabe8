use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle status of a goods receipt note.
///
/// The QC workflow only ever moves along the edges encoded in
/// [`GrnStatus::can_transition_to`]; `Approved` and `Rejected` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(40))")]
pub enum GrnStatus {
    #[sea_orm(string_value = "pending")]
    Pending,

    #[sea_orm(string_value = "inspecting")]
    Inspecting,

    #[sea_orm(string_value = "awaiting_inventory_approval")]
    AwaitingInventoryApproval,

    #[sea_orm(string_value = "approved")]
    Approved,

    #[sea_orm(string_value = "rejected")]
    Rejected,

    #[sea_orm(string_value = "sent_back")]
    SentBack,
}

impl fmt::Display for GrnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrnStatus::Pending => write!(f, "pending"),
            GrnStatus::Inspecting => write!(f, "inspecting"),
            GrnStatus::AwaitingInventoryApproval => write!(f, "awaiting_inventory_approval"),
            GrnStatus::Approved => write!(f, "approved"),
            GrnStatus::Rejected => write!(f, "rejected"),
            GrnStatus::SentBack => write!(f, "sent_back"),
        }
    }
}

impl GrnStatus {
    /// Whether `self -> next` is an edge of the workflow graph.
    pub fn can_transition_to(self, next: GrnStatus) -> bool {
        use GrnStatus::*;
        matches!(
            (self, next),
            (Pending, Inspecting)
                | (Inspecting, AwaitingInventoryApproval)
                | (Inspecting, Rejected)
                | (AwaitingInventoryApproval, Approved)
                | (AwaitingInventoryApproval, SentBack)
                | (SentBack, Inspecting)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, GrnStatus::Approved | GrnStatus::Rejected)
    }
}

/// Returned when a requested status change is not an edge of the workflow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("illegal transition from {from} to {to}")]
pub struct IllegalTransition {
    pub from: GrnStatus,
    pub to: GrnStatus,
}

/// Goods receipt note header.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "grn_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub grn_no: String,

    pub po_no: Option<String>,

    pub supplier_id: Uuid,

    pub supplier_name: String,

    pub receipt_date: DateTime<Utc>,

    pub status: GrnStatus,

    pub notes: Option<String>,

    pub rejection_reason: Option<String>,

    pub created_at: DateTime<Utc>,

    pub created_by: Option<String>,

    pub updated_at: DateTime<Utc>,

    pub updated_by: Option<String>,

    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::grn_item::Entity")]
    Items,
}

impl Related<super::grn_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Creates a new GRN in `Pending`.
    pub fn new(
        grn_no: String,
        po_no: Option<String>,
        supplier_id: Uuid,
        supplier_name: String,
        receipt_date: DateTime<Utc>,
        notes: Option<String>,
        created_by: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            grn_no,
            po_no,
            supplier_id,
            supplier_name,
            receipt_date,
            status: GrnStatus::Pending,
            notes,
            rejection_reason: None,
            created_at: now,
            created_by,
            updated_at: now,
            updated_by: None,
            version: 1,
        }
    }

    /// Moves the GRN along a workflow edge, refreshing the audit fields and
    /// bumping the optimistic-lock version.
    pub fn transition(
        &mut self,
        next: GrnStatus,
        actor: Option<&str>,
    ) -> Result<(), IllegalTransition> {
        if !self.status.can_transition_to(next) {
            return Err(IllegalTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        self.updated_by = actor.map(str::to_owned);
        self.version += 1;
        Ok(())
    }

    /// QC picks the document up for inspection.
    pub fn start_inspection(&mut self, actor: Option<&str>) -> Result<(), IllegalTransition> {
        self.transition(GrnStatus::Inspecting, actor)
    }

    /// Inspection finished with at least one accepted line.
    pub fn complete_inspection(&mut self, actor: Option<&str>) -> Result<(), IllegalTransition> {
        self.transition(GrnStatus::AwaitingInventoryApproval, actor)
    }

    /// Inventory signs the received stock in.
    pub fn approve(&mut self, actor: Option<&str>) -> Result<(), IllegalTransition> {
        self.transition(GrnStatus::Approved, actor)
    }

    /// Every line failed QC.
    pub fn reject(&mut self, reason: String, actor: Option<&str>) -> Result<(), IllegalTransition> {
        self.transition(GrnStatus::Rejected, actor)?;
        self.rejection_reason = Some(reason);
        Ok(())
    }

    /// Inventory declines and returns the document to QC.
    pub fn send_back(
        &mut self,
        reason: String,
        actor: Option<&str>,
    ) -> Result<(), IllegalTransition> {
        self.transition(GrnStatus::SentBack, actor)?;
        self.rejection_reason = Some(reason);
        Ok(())
    }

    /// QC re-submits a sent-back document for another inspection round.
    pub fn resubmit(&mut self, actor: Option<&str>) -> Result<(), IllegalTransition> {
        self.transition(GrnStatus::Inspecting, actor)?;
        self.rejection_reason = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grn() -> Model {
        Model::new(
            "GRN-20240101-0001".into(),
            Some("PO-20231228-0042".into()),
            Uuid::new_v4(),
            "Sharma Alloys".into(),
            Utc::now(),
            None,
            Some("receiving-clerk".into()),
        )
    }

    #[test]
    fn workflow_edges_are_the_only_legal_transitions() {
        use GrnStatus::*;
        let all = [
            Pending,
            Inspecting,
            AwaitingInventoryApproval,
            Approved,
            Rejected,
            SentBack,
        ];
        let edges = [
            (Pending, Inspecting),
            (Inspecting, AwaitingInventoryApproval),
            (Inspecting, Rejected),
            (AwaitingInventoryApproval, Approved),
            (AwaitingInventoryApproval, SentBack),
            (SentBack, Inspecting),
        ];

        for from in all {
            for to in all {
                let expected = edges.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{from} -> {to} should be {expected}"
                );
            }
        }
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        use GrnStatus::*;
        for from in [Approved, Rejected] {
            assert!(from.is_terminal());
            for to in [
                Pending,
                Inspecting,
                AwaitingInventoryApproval,
                Approved,
                Rejected,
                SentBack,
            ] {
                assert!(!from.can_transition_to(to));
            }
        }
    }

    #[test]
    fn illegal_transition_leaves_model_unchanged() {
        let mut g = grn();
        let before_version = g.version;
        let err = g.approve(None).unwrap_err();
        assert_eq!(
            err,
            IllegalTransition {
                from: GrnStatus::Pending,
                to: GrnStatus::Approved,
            }
        );
        assert_eq!(g.status, GrnStatus::Pending);
        assert_eq!(g.version, before_version);
    }

    #[test]
    fn happy_path_bumps_version_each_step() {
        let mut g = grn();
        g.start_inspection(Some("qc-1")).unwrap();
        assert_eq!(g.status, GrnStatus::Inspecting);
        g.complete_inspection(Some("qc-1")).unwrap();
        g.approve(Some("inv-1")).unwrap();
        assert_eq!(g.status, GrnStatus::Approved);
        assert_eq!(g.version, 4);
        assert_eq!(g.updated_by.as_deref(), Some("inv-1"));
    }

    #[test]
    fn send_back_and_resubmit_round_trip() {
        let mut g = grn();
        g.start_inspection(None).unwrap();
        g.complete_inspection(None).unwrap();
        g.send_back("weights off by 2kg".into(), Some("inv-1"))
            .unwrap();
        assert_eq!(g.status, GrnStatus::SentBack);
        assert_eq!(g.rejection_reason.as_deref(), Some("weights off by 2kg"));

        g.resubmit(Some("qc-1")).unwrap();
        assert_eq!(g.status, GrnStatus::Inspecting);
        assert_eq!(g.rejection_reason, None);
    }

    #[test]
    fn error_message_names_both_states() {
        let err = IllegalTransition {
            from: GrnStatus::Approved,
            to: GrnStatus::Pending,
        };
        assert_eq!(
            err.to_string(),
            "illegal transition from approved to pending"
        );
    }
}
