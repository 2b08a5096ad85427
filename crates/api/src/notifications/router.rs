//! Event-to-email routing.
//!
//! [`NotificationRouter`] consumes [`PlatformEvent`]s and decides who, if
//! anyone, hears about each one:
//!
//! - client comments and approvals go to the admin notification address
//!   from settings (skipped when unset);
//! - a staff reply to a client comment goes to that client, if they are a
//!   recipient who opted in.
//!
//! Delivery failures are logged and never reach the request that caused
//! the event.

use std::sync::Arc;

use tokio::sync::broadcast;
use cutroom_core::review::AUTHOR_CLIENT;
use cutroom_core::types::DbId;
use cutroom_db::models::project::Project;
use cutroom_db::repositories::{CommentRepo, ProjectRepo, RecipientRepo, SettingsRepo};
use cutroom_db::DbPool;
use cutroom_events::bus::{EVENT_COMMENT_CREATED, EVENT_PROJECT_APPROVED, EVENT_VIDEO_APPROVED};
use cutroom_events::templates::{
    client_comment_email, project_approved_email, staff_reply_email, video_approved_email,
};
use cutroom_events::{MailTransport, OutgoingEmail, PlatformEvent};

use crate::config::ServerConfig;

type RouteResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// What an event should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Notice {
    ClientComment,
    ClientApproval,
    ProjectApproved,
    /// Staff replied to comment `parent_id`.
    StaffReply { parent_id: DbId },
    Nothing,
}

/// Routes platform events to outgoing email.
pub struct NotificationRouter {
    pool: DbPool,
    mailer: Arc<dyn MailTransport>,
    config: Arc<ServerConfig>,
}

impl NotificationRouter {
    pub fn new(pool: DbPool, mailer: Arc<dyn MailTransport>, config: Arc<ServerConfig>) -> Self {
        Self {
            pool,
            mailer,
            config,
        }
    }

    /// Run the main routing loop.
    ///
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](cutroom_events::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.route_event(&event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            project_id = event.project_id,
                            "Failed to route event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    async fn route_event(&self, event: &PlatformEvent) -> RouteResult {
        let notice = classify(event);
        if notice == Notice::Nothing {
            return Ok(());
        }

        let Some(project) = ProjectRepo::find_by_id(&self.pool, event.project_id).await? else {
            tracing::debug!(project_id = event.project_id, "Project gone, notification dropped");
            return Ok(());
        };

        match notice {
            Notice::ClientComment => self.notify_admin_of_comment(event, &project).await,
            Notice::ClientApproval => self.notify_admin_of_approval(event, &project).await,
            Notice::ProjectApproved => {
                let Some(to) = self.admin_address().await? else {
                    return Ok(());
                };
                let link = self.config.admin_project_url(project.id);
                self.deliver(project_approved_email(&to, &project.title, &link))
                    .await;
                Ok(())
            }
            Notice::StaffReply { parent_id } => {
                self.notify_client_of_reply(event, &project, parent_id).await
            }
            Notice::Nothing => Ok(()),
        }
    }

    async fn notify_admin_of_comment(&self, event: &PlatformEvent, project: &Project) -> RouteResult {
        let Some(to) = self.admin_address().await? else {
            return Ok(());
        };
        let author = event.actor_name.as_deref().unwrap_or("A client");
        let mail = client_comment_email(
            &to,
            &project.title,
            payload_str(event, "video_name").unwrap_or("a video"),
            author,
            payload_str(event, "timecode"),
            payload_str(event, "content").unwrap_or_default(),
            &self.config.admin_project_url(project.id),
        );
        self.deliver(mail).await;
        Ok(())
    }

    async fn notify_admin_of_approval(
        &self,
        event: &PlatformEvent,
        project: &Project,
    ) -> RouteResult {
        let Some(to) = self.admin_address().await? else {
            return Ok(());
        };
        let version = event
            .payload
            .get("version")
            .and_then(serde_json::Value::as_i64)
            .unwrap_or_default();
        let mail = video_approved_email(
            &to,
            &project.title,
            payload_str(event, "video_name").unwrap_or("a video"),
            version,
            event.actor_name.as_deref().unwrap_or("A client"),
            &self.config.admin_project_url(project.id),
        );
        self.deliver(mail).await;
        Ok(())
    }

    async fn notify_client_of_reply(
        &self,
        event: &PlatformEvent,
        project: &Project,
        parent_id: DbId,
    ) -> RouteResult {
        let Some(parent) = CommentRepo::find_by_id(&self.pool, parent_id).await? else {
            return Ok(());
        };
        if parent.author_kind != AUTHOR_CLIENT {
            return Ok(());
        }
        let Some(recipient_id) = parent.recipient_id else {
            return Ok(());
        };
        let Some(recipient) = RecipientRepo::find_by_id(&self.pool, recipient_id).await? else {
            return Ok(());
        };
        if !recipient.receive_notifications {
            tracing::debug!(recipient_id, "Recipient opted out of reply emails");
            return Ok(());
        }

        let settings = SettingsRepo::get(&self.pool).await?;
        let mail = staff_reply_email(
            &recipient.email,
            &settings.company_name,
            &project.title,
            payload_str(event, "video_name").unwrap_or("a video"),
            payload_str(event, "content").unwrap_or_default(),
            &self.config.share_url(&project.share_slug),
        );
        self.deliver(mail).await;
        Ok(())
    }

    async fn admin_address(&self) -> Result<Option<String>, sqlx::Error> {
        let settings = SettingsRepo::get(&self.pool).await?;
        Ok(settings
            .admin_notification_email
            .filter(|e| !e.trim().is_empty()))
    }

    async fn deliver(&self, mail: OutgoingEmail) {
        let subject = mail.subject.clone();
        match self.mailer.send(mail).await {
            Ok(()) => tracing::info!(subject = %subject, "Notification email sent"),
            Err(e) => tracing::error!(error = %e, subject = %subject, "Notification email failed"),
        }
    }
}

/// Decide what an event should produce, from the event alone.
fn classify(event: &PlatformEvent) -> Notice {
    match event.event_type.as_str() {
        EVENT_COMMENT_CREATED => {
            let internal = event
                .payload
                .get("is_internal")
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(false);
            if event.is_client_action() {
                Notice::ClientComment
            } else if internal {
                Notice::Nothing
            } else {
                match event.payload.get("parent_id").and_then(serde_json::Value::as_i64) {
                    Some(parent_id) => Notice::StaffReply { parent_id },
                    None => Notice::Nothing,
                }
            }
        }
        EVENT_VIDEO_APPROVED if event.is_client_action() => Notice::ClientApproval,
        EVENT_PROJECT_APPROVED if event.is_client_action() => Notice::ProjectApproved,
        _ => Notice::Nothing,
    }
}

fn payload_str<'a>(event: &'a PlatformEvent, key: &str) -> Option<&'a str> {
    event.payload.get(key).and_then(serde_json::Value::as_str)
}
