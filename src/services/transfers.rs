//! Transfer workflow engine
//!
//! Orchestrates the life of a transfer request: writes the single-slot
//! pending marker on the equipment record, fans a notification copy out
//! to every eligible approver's mailbox, and later resolves the request
//! by reassigning (or not) the gear and rewriting every mailbox copy.
//! All multi-document writes of one operation share a single database
//! transaction, and equipment writes carry a version precondition, so a
//! concurrent writer sees a Conflict rather than losing its update.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        equipment::{
            ActivityEntry, ActivityKind, Equipment, PendingTransfer, RequestTransfer,
            TransferEndpoint, TransferTarget,
        },
        notification::{Decision, Notification, NotificationKind},
        user::{Role, UserShort},
    },
    repository::Repository,
    services::email::EmailService,
};

#[derive(Clone)]
pub struct TransfersService {
    repository: Repository,
    email: EmailService,
}

/// Eligible approvers for a transfer: every admin, every manager, and
/// the designated recipient, deduplicated by user id.
pub fn fan_out_targets(approvers: &[UserShort], to_user_id: &str) -> Vec<String> {
    let mut targets: Vec<String> = Vec::with_capacity(approvers.len() + 1);
    for user in approvers {
        if !targets.iter().any(|t| t == &user.id) {
            targets.push(user.id.clone());
        }
    }
    if !targets.iter().any(|t| t == to_user_id) {
        targets.push(to_user_id.to_string());
    }
    targets
}

/// Pure approval check: admins and managers may resolve any request,
/// the designated recipient may resolve their own.
pub fn can_approve(role: Role, is_recipient: bool) -> bool {
    role.can_manage() || is_recipient
}

/// Correlation key shared by the pending marker and every mailbox copy
pub fn notification_id(equipment_id: &str, requested_at: DateTime<Utc>) -> String {
    format!("{}_{}", equipment_id, requested_at.timestamp_millis())
}

/// Recover the equipment id from a notification id
pub fn equipment_id_of(notification_id: &str) -> AppResult<&str> {
    notification_id
        .rsplit_once('_')
        .map(|(equipment_id, _)| equipment_id)
        .ok_or_else(|| {
            AppError::BadRequest(format!("Malformed notification id: {}", notification_id))
        })
}

/// Outcome of applying a decision to an equipment record
pub struct ResolutionOutcome {
    pub assignee_user_id: Option<String>,
    pub project_id: Option<String>,
    pub entry: ActivityEntry,
}

/// Compute the post-resolution assignment and the activity entry.
/// Accepting moves the gear to the marker's `to` side; denying leaves
/// the assignment exactly as it was before the request.
pub fn apply_decision(
    equipment: &Equipment,
    marker: &PendingTransfer,
    decision: Decision,
    actor: &str,
    now: DateTime<Utc>,
) -> ResolutionOutcome {
    let (assignee_user_id, project_id) = match decision {
        Decision::Accepted => (
            Some(marker.to.user_id.clone()),
            marker.to.project_id.clone(),
        ),
        Decision::Denied => (
            equipment.assignee_user_id.clone(),
            equipment.project_id.clone(),
        ),
    };

    let kind = match decision {
        Decision::Accepted => ActivityKind::TransferAccepted,
        Decision::Denied => ActivityKind::TransferDenied,
    };

    ResolutionOutcome {
        assignee_user_id,
        project_id,
        entry: ActivityEntry {
            id: Uuid::new_v4(),
            kind,
            timestamp: now,
            from: Some(marker.from.clone()),
            to: Some(marker.to.clone()),
            actor: actor.to_string(),
            note: None,
        },
    }
}

/// Rewrite one mailbox copy of a notification to its resolved state.
/// Returns whether the mailbox held a copy.
pub fn resolve_copy(mailbox: &mut [Notification], notification_id: &str, decision: Decision) -> bool {
    let mut found = false;
    for notification in mailbox.iter_mut().filter(|n| n.id == notification_id) {
        notification.pending = false;
        notification.decision = Some(decision);
        found = true;
    }
    found
}

impl TransfersService {
    pub fn new(repository: Repository, email: EmailService) -> Self {
        Self { repository, email }
    }

    /// Request a transfer: set the pending marker and fan the
    /// notification out to every eligible approver, atomically.
    pub async fn request_transfer(
        &self,
        equipment_id: &str,
        data: &RequestTransfer,
        requested_by: &str,
    ) -> AppResult<Notification> {
        // The recipient must exist before anything is written
        let recipient = self.repository.users.get_by_id(&data.to_user_id).await?;

        let mut tx = self.repository.pool.begin().await?;
        let equipment = self.repository.equipment.get_for_update(&mut tx, equipment_id).await?;

        if equipment.pending_transfer.is_some() {
            return Err(AppError::Conflict(format!(
                "Equipment {} already has a pending transfer",
                equipment_id
            )));
        }

        let now = Utc::now();
        let marker = PendingTransfer {
            notification_id: notification_id(equipment_id, now),
            from: TransferEndpoint {
                user_id: data
                    .from_user_id
                    .clone()
                    .or_else(|| equipment.assignee_user_id.clone()),
                project_id: data
                    .from_project_id
                    .clone()
                    .or_else(|| equipment.project_id.clone()),
            },
            to: TransferTarget {
                user_id: data.to_user_id.clone(),
                project_id: data.to_project_id.clone(),
            },
            requested_by: requested_by.to_string(),
            requested_at: now,
        };

        let notification = Notification {
            id: marker.notification_id.clone(),
            kind: NotificationKind::GearTransferRequest,
            equipment_id: equipment_id.to_string(),
            equipment_name: equipment.name.clone(),
            from_user_id: marker.from.user_id.clone(),
            from_project_id: marker.from.project_id.clone(),
            to_user_id: marker.to.user_id.clone(),
            to_project_id: marker.to.project_id.clone(),
            requested_by: requested_by.to_string(),
            requested_at: now,
            pending: true,
            decision: None,
            read: false,
        };

        self.repository
            .equipment
            .store_workflow_state(
                &mut tx,
                equipment_id,
                equipment.version,
                equipment.assignee_user_id.as_deref(),
                equipment.project_id.as_deref(),
                Some(&marker),
                &equipment.activity,
            )
            .await?;

        let approvers = self
            .repository
            .users
            .list_by_roles(&[Role::Admin, Role::Manager])
            .await?;
        for target in fan_out_targets(&approvers, &data.to_user_id) {
            self.repository
                .users
                .append_notification(&mut tx, &target, &notification)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            equipment_id,
            notification_id = %notification.id,
            to_user_id = %data.to_user_id,
            "Transfer requested"
        );

        // Best-effort: a failed email never fails the request
        if let Some(to) = recipient.email.as_deref() {
            if let Err(e) = self
                .email
                .send_transfer_request(to, &equipment.name, requested_by)
                .await
            {
                tracing::warn!("Failed to send transfer email: {}", e);
            }
        }

        Ok(notification)
    }

    /// Resolve a pending transfer. Accepting reassigns the gear to the
    /// marker's destination; denying clears the marker and leaves the
    /// assignment untouched. Every mailbox copy of the notification is
    /// rewritten to the resolved state in the same transaction.
    pub async fn resolve(
        &self,
        notification_id: &str,
        decision: Decision,
        acting_user_id: &str,
        acting_role: Role,
    ) -> AppResult<Equipment> {
        let equipment_id = equipment_id_of(notification_id)?.to_string();

        let mut tx = self.repository.pool.begin().await?;
        let equipment = self
            .repository
            .equipment
            .get_for_update(&mut tx, &equipment_id)
            .await?;

        let marker = match equipment.pending_transfer.clone() {
            Some(marker) if marker.notification_id == notification_id => marker,
            Some(_) => {
                return Err(AppError::NotFound(format!(
                    "Notification {} does not match the pending transfer",
                    notification_id
                )));
            }
            None => {
                // Repeated resolution: the marker is gone, so consult
                // the mailbox copies. The same decision twice is a
                // no-op; a contradictory one is a conflict.
                return self
                    .already_resolved(tx, equipment, notification_id, decision)
                    .await;
            }
        };

        let is_recipient = acting_user_id == marker.to.user_id;
        if !can_approve(acting_role, is_recipient) {
            return Err(AppError::Authorization(
                "Only admins, managers or the designated recipient may resolve a transfer"
                    .to_string(),
            ));
        }

        let now = Utc::now();
        let outcome = apply_decision(&equipment, &marker, decision, acting_user_id, now);

        let mut activity = equipment.activity.clone();
        activity.push(outcome.entry);

        self.repository
            .equipment
            .store_workflow_state(
                &mut tx,
                &equipment_id,
                equipment.version,
                outcome.assignee_user_id.as_deref(),
                outcome.project_id.as_deref(),
                None,
                &activity,
            )
            .await?;

        let mailboxes = self
            .repository
            .users
            .mailboxes_containing(&mut tx, notification_id)
            .await?;
        for (user_id, mut mailbox) in mailboxes {
            resolve_copy(&mut mailbox, notification_id, decision);
            self.repository
                .users
                .write_mailbox(&mut tx, &user_id, &mailbox)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            equipment_id = %equipment_id,
            notification_id,
            decision = %decision,
            actor = acting_user_id,
            "Transfer resolved"
        );

        self.repository.equipment.get_by_id(&equipment_id).await
    }

    /// Idempotence path: the marker is already cleared. Returns Ok for
    /// a repeated identical decision without appending activity again.
    async fn already_resolved(
        &self,
        mut tx: sqlx::Transaction<'_, sqlx::Postgres>,
        equipment: Equipment,
        notification_id: &str,
        decision: Decision,
    ) -> AppResult<Equipment> {
        let mailboxes = self
            .repository
            .users
            .mailboxes_containing(&mut tx, notification_id)
            .await?;
        tx.rollback().await?;

        let copy = mailboxes
            .iter()
            .flat_map(|(_, mbox)| mbox.iter())
            .find(|n| n.id == notification_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("Notification {} not found", notification_id))
            })?;

        match copy.decision {
            Some(previous) if previous == decision => Ok(equipment),
            Some(previous) => Err(AppError::Conflict(format!(
                "Transfer was already resolved as {}",
                previous
            ))),
            None => Err(AppError::Conflict(
                "Transfer is no longer pending".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::equipment::EquipmentStatus;

    fn user(id: &str, role: Role) -> UserShort {
        UserShort {
            id: id.to_string(),
            display_name: id.to_uppercase(),
            email: None,
            role,
        }
    }

    fn equipment(assignee: Option<&str>, project: Option<&str>) -> Equipment {
        Equipment {
            id: "e1".to_string(),
            name: "Theodolite".to_string(),
            category: Some("survey".to_string()),
            status: EquipmentStatus::InUse,
            serial_number: None,
            notes: None,
            assignee_user_id: assignee.map(String::from),
            project_id: project.map(String::from),
            date_added: Utc::now(),
            version: 1,
            pending_transfer: None,
            activity: Vec::new(),
        }
    }

    fn marker(equipment: &Equipment, to_user: &str, to_project: Option<&str>) -> PendingTransfer {
        let now = Utc::now();
        PendingTransfer {
            notification_id: notification_id(&equipment.id, now),
            from: TransferEndpoint {
                user_id: equipment.assignee_user_id.clone(),
                project_id: equipment.project_id.clone(),
            },
            to: TransferTarget {
                user_id: to_user.to_string(),
                project_id: to_project.map(String::from),
            },
            requested_by: "u3".to_string(),
            requested_at: now,
        }
    }

    fn notification_copy(id: &str, to_user: &str) -> Notification {
        Notification {
            id: id.to_string(),
            kind: NotificationKind::GearTransferRequest,
            equipment_id: "e1".to_string(),
            equipment_name: "Theodolite".to_string(),
            from_user_id: Some("u1".to_string()),
            from_project_id: Some("p1".to_string()),
            to_user_id: to_user.to_string(),
            to_project_id: Some("p2".to_string()),
            requested_by: "u3".to_string(),
            requested_at: Utc::now(),
            pending: true,
            decision: None,
            read: false,
        }
    }

    #[test]
    fn fan_out_is_union_of_approvers_and_recipient() {
        let approvers = vec![
            user("a1", Role::Admin),
            user("a2", Role::Admin),
            user("m1", Role::Manager),
        ];
        let targets = fan_out_targets(&approvers, "u2");
        assert_eq!(targets, vec!["a1", "a2", "m1", "u2"]);
    }

    #[test]
    fn fan_out_deduplicates_recipient_who_is_admin() {
        let approvers = vec![user("a1", Role::Admin), user("m1", Role::Manager)];
        let targets = fan_out_targets(&approvers, "a1");
        assert_eq!(targets, vec!["a1", "m1"]);
        assert_eq!(targets.iter().filter(|t| *t == "a1").count(), 1);
    }

    #[test]
    fn approval_rules() {
        assert!(can_approve(Role::Admin, false));
        assert!(can_approve(Role::Manager, false));
        assert!(can_approve(Role::Member, true));
        assert!(!can_approve(Role::Member, false));
    }

    #[test]
    fn notification_id_round_trips_equipment_id() {
        let now = Utc::now();
        let id = notification_id("0f3c6a", now);
        assert_eq!(equipment_id_of(&id).unwrap(), "0f3c6a");
    }

    #[test]
    fn malformed_notification_id_is_rejected() {
        assert!(equipment_id_of("nounderscore").is_err());
    }

    #[test]
    fn accepting_moves_gear_to_destination() {
        let equipment = equipment(Some("u1"), Some("p1"));
        let marker = marker(&equipment, "u2", Some("p2"));
        let outcome = apply_decision(&equipment, &marker, Decision::Accepted, "u2", Utc::now());

        assert_eq!(outcome.assignee_user_id.as_deref(), Some("u2"));
        assert_eq!(outcome.project_id.as_deref(), Some("p2"));
        assert_eq!(outcome.entry.kind, ActivityKind::TransferAccepted);
        assert_eq!(outcome.entry.actor, "u2");
        assert_eq!(outcome.entry.from.as_ref().unwrap().user_id.as_deref(), Some("u1"));
    }

    #[test]
    fn denying_leaves_assignment_untouched() {
        let equipment = equipment(Some("u1"), Some("p1"));
        let marker = marker(&equipment, "u2", Some("p2"));
        let outcome = apply_decision(&equipment, &marker, Decision::Denied, "u3", Utc::now());

        assert_eq!(outcome.assignee_user_id.as_deref(), Some("u1"));
        assert_eq!(outcome.project_id.as_deref(), Some("p1"));
        assert_eq!(outcome.entry.kind, ActivityKind::TransferDenied);
    }

    #[test]
    fn accepting_unassigned_gear_still_targets_destination() {
        let equipment = equipment(None, None);
        let marker = marker(&equipment, "u2", None);
        let outcome = apply_decision(&equipment, &marker, Decision::Accepted, "u2", Utc::now());

        assert_eq!(outcome.assignee_user_id.as_deref(), Some("u2"));
        assert_eq!(outcome.project_id, None);
    }

    #[test]
    fn all_mailbox_copies_converge_after_resolution() {
        let nid = "e1_1700000000000";
        // Three mailboxes seeded with a copy of the same notification,
        // one of them holding unrelated mail too
        let mut boxes = vec![
            vec![notification_copy(nid, "u2")],
            vec![notification_copy(nid, "u2")],
            vec![notification_copy("e9_1600000000000", "u5"), notification_copy(nid, "u2")],
        ];

        for mailbox in &mut boxes {
            assert!(resolve_copy(mailbox, nid, Decision::Accepted));
        }

        for mailbox in &boxes {
            for copy in mailbox.iter().filter(|n| n.id == nid) {
                assert!(!copy.pending);
                assert_eq!(copy.decision, Some(Decision::Accepted));
            }
        }
        // Unrelated mail is untouched
        assert!(boxes[2][0].pending);
        assert_eq!(boxes[2][0].decision, None);
    }

    #[test]
    fn resolve_copy_reports_missing_notification() {
        let mut mailbox = vec![notification_copy("e1_1700000000000", "u2")];
        assert!(!resolve_copy(&mut mailbox, "e1_9999999999999", Decision::Denied));
        assert!(mailbox[0].pending);
    }
}
