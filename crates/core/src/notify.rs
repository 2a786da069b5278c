//! Post-commit notifications.
//!
//! Coordinators push [`Notification`]s onto a bounded queue after their write
//! has committed; a worker task drains the queue into a [`Mailer`]. Neither a
//! full queue nor a failed delivery ever reaches the caller of the booking or
//! cancellation: both are logged and dropped.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::appointment::AppointmentDetail;

pub const TEMPLATE_APPOINTMENT_BOOKED: &str = "appointment_booked";
pub const TEMPLATE_APPOINTMENT_CANCELLED: &str = "appointment_cancelled";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub template: String,
    pub data: Value,
}

impl Notification {
    /// One notification per party of a freshly booked appointment.
    pub fn booked(detail: &AppointmentDetail) -> Vec<Notification> {
        let data = |receiver: &str| {
            json!({
                "receiverName": receiver,
                "student": detail.student.username,
                "professor": detail.professor.username,
                "slot": detail.slot.slot,
                "reason": detail.reason,
            })
        };

        vec![
            Notification {
                to: detail.student.email.clone(),
                subject: "Appointment booked".to_string(),
                template: TEMPLATE_APPOINTMENT_BOOKED.to_string(),
                data: data(&detail.student.username),
            },
            Notification {
                to: detail.professor.email.clone(),
                subject: "Appointment booked".to_string(),
                template: TEMPLATE_APPOINTMENT_BOOKED.to_string(),
                data: data(&detail.professor.username),
            },
        ]
    }

    /// Notice for the party who did not cancel.
    pub fn cancelled(detail: &AppointmentDetail, cancelled_by_professor: bool) -> Notification {
        let (receiver, other) = if cancelled_by_professor {
            (&detail.student, &detail.professor)
        } else {
            (&detail.professor, &detail.student)
        };

        Notification {
            to: receiver.email.clone(),
            subject: "Appointment cancelled".to_string(),
            template: TEMPLATE_APPOINTMENT_CANCELLED.to_string(),
            data: json!({
                "receiverName": receiver.username,
                "cancelledBy": other.username,
                "slot": detail.slot.slot,
            }),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, notification: Notification) -> eyre::Result<()>;
}

/// Mailer that writes each notification to the log instead of delivering it.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, notification: Notification) -> eyre::Result<()> {
        info!(
            to = %notification.to,
            subject = %notification.subject,
            template = %notification.template,
            data = %notification.data,
            "Sending notification"
        );
        Ok(())
    }
}

/// Sending half of the notification queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<Notification>,
}

impl NotificationQueue {
    /// Queues a notification without waiting. Never fails the caller.
    pub fn enqueue(&self, notification: Notification) {
        if let Err(e) = self.tx.try_send(notification) {
            let dropped = match &e {
                mpsc::error::TrySendError::Full(n) | mpsc::error::TrySendError::Closed(n) => n,
            };
            warn!(
                to = %dropped.to,
                template = %dropped.template,
                error = %e,
                "Dropping notification"
            );
        }
    }
}

/// Spawns the worker that drains the queue into `mailer`.
///
/// The worker exits once every [`NotificationQueue`] clone has been dropped
/// and the queue is empty, so awaiting the handle flushes pending sends.
pub fn spawn_worker(mailer: Arc<dyn Mailer>, capacity: usize) -> (NotificationQueue, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<Notification>(capacity.max(1));

    let handle = tokio::spawn(async move {
        while let Some(notification) = rx.recv().await {
            let to = notification.to.clone();
            let template = notification.template.clone();
            match mailer.send(notification).await {
                Ok(()) => debug!(%to, %template, "Notification delivered"),
                Err(e) => warn!(%to, %template, error = %e, "Notification delivery failed"),
            }
        }
        debug!("Notification worker stopped");
    });

    (NotificationQueue { tx }, handle)
}
