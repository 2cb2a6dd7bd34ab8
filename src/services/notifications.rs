//! Notification mailbox service
//!
//! The mailbox surface only ever touches the calling user's own copy:
//! mark-all-read flips the per-viewer `read` flag and deliberately
//! leaves `pending`, `decision` and other mailboxes alone. Resolving
//! the underlying transfer is the workflow engine's job.

use crate::{
    error::AppResult,
    models::notification::Notification,
    repository::Repository,
};

#[derive(Clone)]
pub struct NotificationsService {
    repository: Repository,
}

/// Flip the unread flag on every entry; returns how many changed
pub fn mark_read(mailbox: &mut [Notification]) -> usize {
    let mut changed = 0;
    for notification in mailbox.iter_mut() {
        if !notification.read {
            notification.read = true;
            changed += 1;
        }
    }
    changed
}

impl NotificationsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// The caller's own mailbox, newest first
    pub async fn list(&self, user_id: &str) -> AppResult<Vec<Notification>> {
        let user = self.repository.users.get_by_id(user_id).await?;
        let mut mailbox = user.notifications;
        mailbox.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        Ok(mailbox)
    }

    /// Mark every notification in the caller's mailbox as read
    pub async fn mark_all_read(&self, user_id: &str) -> AppResult<usize> {
        let mut tx = self.repository.pool.begin().await?;
        let mut mailbox = self
            .repository
            .users
            .get_mailbox_for_update(&mut tx, user_id)
            .await?;

        let changed = mark_read(&mut mailbox);
        if changed > 0 {
            self.repository
                .users
                .write_mailbox(&mut tx, user_id, &mailbox)
                .await?;
        }
        tx.commit().await?;
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notification::{Decision, NotificationKind};
    use chrono::Utc;

    fn notification(id: &str, read: bool, pending: bool) -> Notification {
        Notification {
            id: id.to_string(),
            kind: NotificationKind::GearTransferRequest,
            equipment_id: "e1".to_string(),
            equipment_name: "Drone".to_string(),
            from_user_id: None,
            from_project_id: None,
            to_user_id: "u2".to_string(),
            to_project_id: None,
            requested_by: "u3".to_string(),
            requested_at: Utc::now(),
            pending,
            decision: if pending { None } else { Some(Decision::Denied) },
            read,
        }
    }

    #[test]
    fn mark_read_leaves_pending_and_decision_alone() {
        let mut mailbox = vec![
            notification("a", false, true),
            notification("b", true, false),
            notification("c", false, false),
        ];

        assert_eq!(mark_read(&mut mailbox), 2);
        assert!(mailbox.iter().all(|n| n.read));
        // Actionability is untouched: the pending request stays pending
        assert!(mailbox[0].pending);
        assert_eq!(mailbox[0].decision, None);
        assert_eq!(mailbox[2].decision, Some(Decision::Denied));
    }

    #[test]
    fn mark_read_is_idempotent() {
        let mut mailbox = vec![notification("a", true, true)];
        assert_eq!(mark_read(&mut mailbox), 0);
    }
}
