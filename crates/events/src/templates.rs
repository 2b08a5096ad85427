//! Plain-text email bodies.

use crate::delivery::OutgoingEmail;

/// One-time sign-in code for a share link.
pub fn otp_email(
    to: &str,
    company: &str,
    project_title: &str,
    code: &str,
    expiry_mins: i64,
) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: format!("{code} is your {company} review code"),
        body: format!(
            "Use this code to open \"{project_title}\":\n\n    {code}\n\n\
             It expires in {expiry_mins} minutes. If you did not ask for it, \
             you can ignore this email.\n\n{company}"
        ),
    }
}

/// Staff alert for a new client comment.
pub fn client_comment_email(
    to: &str,
    project_title: &str,
    video_name: &str,
    author: &str,
    timecode: Option<&str>,
    content: &str,
    link: &str,
) -> OutgoingEmail {
    let at = timecode.map(|t| format!(" at {t}")).unwrap_or_default();
    OutgoingEmail {
        to: to.to_string(),
        subject: format!("New comment on {project_title}"),
        body: format!(
            "{author} commented on \"{video_name}\"{at}:\n\n{content}\n\nOpen the project: {link}"
        ),
    }
}

/// Staff alert for a client approval.
pub fn video_approved_email(
    to: &str,
    project_title: &str,
    video_name: &str,
    version: i64,
    approver: &str,
    link: &str,
) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: format!("{video_name} v{version} approved"),
        body: format!(
            "{approver} approved version {version} of \"{video_name}\" in {project_title}.\n\n\
             Open the project: {link}"
        ),
    }
}

/// Everyone-is-done notice once every video in a project is approved.
pub fn project_approved_email(to: &str, project_title: &str, link: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: format!("{project_title} is fully approved"),
        body: format!("Every video in \"{project_title}\" now has an approved version.\n\n{link}"),
    }
}

/// Tell a client that staff replied to their comment.
pub fn staff_reply_email(
    to: &str,
    company: &str,
    project_title: &str,
    video_name: &str,
    content: &str,
    link: &str,
) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: format!("{company} replied on {project_title}"),
        body: format!(
            "There is a new reply on \"{video_name}\":\n\n{content}\n\nView it here: {link}\n\n{company}"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_email_carries_code_in_subject_and_body() {
        let mail = otp_email("c@example.com", "Studio", "Launch film", "042917", 10);
        assert_eq!(mail.to, "c@example.com");
        assert!(mail.subject.starts_with("042917"));
        assert!(mail.body.contains("042917"));
        assert!(mail.body.contains("10 minutes"));
    }

    #[test]
    fn comment_email_includes_timecode_when_present() {
        let with = client_comment_email("a@x.io", "P", "Hero", "Dana", Some("1:05"), "Hi", "url");
        assert!(with.body.contains("\"Hero\" at 1:05"));
        let without = client_comment_email("a@x.io", "P", "Hero", "Dana", None, "Hi", "url");
        assert!(without.body.contains("\"Hero\":"));
    }
}
