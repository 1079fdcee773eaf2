//! Ticket transcript exporter.
//!
//! Renders a fully loaded ticket into one self-contained HTML document, and
//! packages many of them into a zip archive for the batch export. Rendering
//! is a pure function of ticket state: the same ticket renders to the same
//! bytes every time, and nothing here mutates a record.

use db::models::staff::StaffRole;
use db::models::ticket::TicketStatus;
use db::models::{attachment, staff, ticket, ticket_message, user};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write as _;
use std::io::Write as _;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// A ticket with everything the transcript needs resolved up front.
pub struct TranscriptData {
    pub ticket: ticket::Model,
    pub user: user::Model,
    pub assigned: Option<staff::Model>,
    pub messages: Vec<TranscriptMessage>,
}

pub struct TranscriptMessage {
    pub message: ticket_message::Model,
    pub author: TranscriptAuthor,
    pub attachments: Vec<attachment::Model>,
}

pub enum TranscriptAuthor {
    User(String),
    Staff { name: String, role: StaffRole },
    System,
}

fn status_color(status: TicketStatus) -> &'static str {
    match status {
        TicketStatus::Open => "#6366F1",
        TicketStatus::InProgress => "#F59E0B",
        TicketStatus::AwaitingReply => "#EAB308",
        TicketStatus::Closed => "#EF4444",
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

static IMAGE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[image\]\((https?://[^)\s]+)\)").unwrap());

/// Escapes user-controlled content, then turns line breaks and embedded
/// `[image](url)` markers into markup.
fn format_content(content: &str) -> String {
    let escaped = escape_html(content);
    let linked = IMAGE_MARKER.replace_all(
        &escaped,
        "<a href=\"$1\" target=\"_blank\" class=\"image-link\">[image]</a>",
    );
    linked.replace('\n', "<br>")
}

fn format_timestamp(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%d/%m/%Y %H:%M").to_string()
}

/// Renders one ticket to a standalone HTML document.
pub fn render(data: &TranscriptData) -> String {
    let ticket = &data.ticket;
    let status = ticket.status;
    let color = status_color(status);

    let mut html = String::new();

    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Transcript - Ticket #{number}</title>
<style>
* {{ margin: 0; padding: 0; box-sizing: border-box; }}
body {{ font-family: sans-serif; background: #0D0D0D; color: #FFFFFF; padding: 20px; line-height: 1.6; }}
.container {{ max-width: 960px; margin: 0 auto; }}
.header {{ background: #1A1A1A; border: 1px solid #30363D; border-radius: 12px; padding: 24px; margin-bottom: 24px; }}
.header h1 {{ font-size: 24px; margin-bottom: 8px; }}
.ticket-number {{ font-size: 14px; color: #B0B0B0; margin-bottom: 4px; }}
.status-badge {{ display: inline-block; padding: 4px 12px; border-radius: 20px; font-size: 12px; font-weight: 600; background: {color}33; color: {color}; border: 1px solid {color}66; }}
.info-grid {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(220px, 1fr)); gap: 16px; margin-top: 20px; }}
.info-item {{ background: #0D0D0D; border: 1px solid #30363D; border-radius: 8px; padding: 12px; }}
.info-label {{ font-size: 12px; color: #B0B0B0; margin-bottom: 4px; }}
.info-value {{ font-size: 14px; font-weight: 500; }}
.messages {{ background: #1A1A1A; border: 1px solid #30363D; border-radius: 12px; padding: 24px; }}
.message {{ margin-bottom: 16px; padding: 16px; border-radius: 8px; border-left: 4px solid; }}
.message-user {{ background: #6366F11A; border-left-color: #6366F1; }}
.message-staff {{ background: #3B82F61A; border-left-color: #3B82F6; }}
.message-system {{ background: #6B72801A; border-left-color: #6B7280; }}
.message-author {{ font-weight: 600; font-size: 14px; }}
.message-role {{ font-size: 12px; color: #B0B0B0; margin-left: 8px; }}
.message-time {{ font-size: 12px; color: #B0B0B0; margin-left: 8px; }}
.message-content {{ margin-top: 8px; color: #E5E7EB; font-size: 14px; }}
.attachments {{ margin-top: 12px; display: flex; flex-wrap: wrap; gap: 8px; }}
.attachment-image {{ max-width: 300px; max-height: 200px; border-radius: 8px; border: 1px solid #30363D; }}
.attachment-link, .image-link {{ color: #6366F1; text-decoration: none; font-size: 12px; }}
.footer {{ margin-top: 24px; padding: 16px; text-align: center; color: #B0B0B0; font-size: 12px; border-top: 1px solid #30363D; }}
</style>
</head>
<body>
<div class="container">
<div class="header">
<div class="ticket-number">Ticket #{number}</div>
<h1>{emoji} {subject}</h1>
<span class="status-badge">{status_label}</span>
<div class="info-grid">
<div class="info-item"><div class="info-label">Category</div><div class="info-value">{category}</div></div>
<div class="info-item"><div class="info-label">Opened by</div><div class="info-value">{opened_by}</div></div>
<div class="info-item"><div class="info-label">Assigned to</div><div class="info-value">{assigned_to}</div></div>
<div class="info-item"><div class="info-label">Created</div><div class="info-value">{created}</div></div>
"#,
        number = ticket.ticket_number,
        emoji = ticket.category.emoji(),
        subject = escape_html(&ticket.subject),
        status_label = status.label(),
        category = ticket.category.label(),
        opened_by = escape_html(&data.user.display_name),
        assigned_to = data
            .assigned
            .as_ref()
            .map(|s| escape_html(&s.display_name))
            .unwrap_or_else(|| "Unassigned".to_string()),
        created = format_timestamp(&ticket.created_at),
    );

    if let Some(closed_at) = &ticket.closed_at {
        let _ = write!(
            html,
            r#"<div class="info-item"><div class="info-label">Closed</div><div class="info-value">{}</div></div>
<div class="info-item"><div class="info-label">Close reason</div><div class="info-value">{}</div></div>
"#,
            format_timestamp(closed_at),
            escape_html(ticket.closed_reason.as_deref().unwrap_or("-")),
        );
    }

    html.push_str("</div>\n</div>\n<div class=\"messages\">\n");

    for entry in &data.messages {
        let (class, author, role) = match &entry.author {
            TranscriptAuthor::User(name) => ("message-user", escape_html(name), None),
            TranscriptAuthor::Staff { name, role } => {
                ("message-staff", escape_html(name), Some(role.label()))
            }
            TranscriptAuthor::System => ("message-system", "System".to_string(), None),
        };

        let _ = write!(
            html,
            r#"<div class="message {class}">
<span class="message-author">{author}</span>"#,
        );
        if let Some(role) = role {
            let _ = write!(html, r#"<span class="message-role">{role}</span>"#);
        }
        let _ = write!(
            html,
            r#"<span class="message-time">{time}</span>
<div class="message-content">{content}</div>
"#,
            time = format_timestamp(&entry.message.created_at),
            content = format_content(&entry.message.content),
        );

        if !entry.attachments.is_empty() {
            html.push_str("<div class=\"attachments\">\n");
            for att in &entry.attachments {
                let url = escape_html(&att.url);
                let name = escape_html(&att.filename);
                if att.mime_type.starts_with("image/") {
                    let _ = write!(
                        html,
                        "<a href=\"{url}\" target=\"_blank\"><img class=\"attachment-image\" src=\"{url}\" alt=\"{name}\"></a>\n",
                    );
                } else {
                    let _ = write!(
                        html,
                        "<a class=\"attachment-link\" href=\"{url}\" target=\"_blank\">📎 {name}</a>\n",
                    );
                }
            }
            html.push_str("</div>\n");
        }

        html.push_str("</div>\n");
    }

    let _ = write!(
        html,
        "</div>\n<div class=\"footer\">Ticket #{} • {} messages</div>\n</div>\n</body>\n</html>\n",
        ticket.ticket_number,
        data.messages.len(),
    );

    html
}

/// Archive entry name for a ticket: its number plus a sanitized subject slug.
pub fn entry_name(ticket_number: i64, subject: &str) -> String {
    let slug: String = subject
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .take(50)
        .collect();
    format!("ticket-{ticket_number}-{slug}.html")
}

/// Packages one transcript per ticket into a zip archive.
pub fn export_archive(tickets: &[TranscriptData]) -> anyhow::Result<Vec<u8>> {
    let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for data in tickets {
        let html = render(data);
        writer.start_file(
            entry_name(data.ticket.ticket_number, &data.ticket.subject),
            options,
        )?;
        writer.write_all(html.as_bytes())?;
    }

    Ok(writer.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use db::models::ticket::{TicketCategory, TicketStatus};

    fn at(minute: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 1, 12, minute, 0).unwrap()
    }

    fn fixture_user() -> user::Model {
        user::Model {
            id: 1,
            discord_id: "100".into(),
            username: "sam".into(),
            display_name: "Sam".into(),
            avatar: None,
            email: None,
            created_at: at(0),
            updated_at: at(0),
        }
    }

    fn fixture_ticket(n: i64, subject: &str) -> ticket::Model {
        ticket::Model {
            id: n,
            ticket_number: n,
            category: TicketCategory::Bugs,
            subject: subject.into(),
            status: TicketStatus::AwaitingReply,
            user_id: 1,
            assigned_to: None,
            open_slot: Some(true),
            closed_at: None,
            closed_reason: None,
            created_at: at(0),
            updated_at: at(5),
        }
    }

    fn message(id: i64, minute: u32, content: &str, author: TranscriptAuthor) -> TranscriptMessage {
        TranscriptMessage {
            message: ticket_message::Model {
                id,
                ticket_id: 1,
                user_id: None,
                staff_id: None,
                is_system: matches!(author, TranscriptAuthor::System),
                staff_only: false,
                content: content.into(),
                created_at: at(minute),
            },
            author,
            attachments: Vec::new(),
        }
    }

    fn fixture(n_messages: usize) -> TranscriptData {
        let messages = (0..n_messages)
            .map(|i| {
                message(
                    i as i64 + 1,
                    i as u32,
                    &format!("message number {i}"),
                    TranscriptAuthor::User("Sam".into()),
                )
            })
            .collect();

        TranscriptData {
            ticket: fixture_ticket(1, "Broken minimap"),
            user: fixture_user(),
            assigned: None,
            messages,
        }
    }

    #[test]
    fn renders_one_block_per_message_in_order() {
        let html = render(&fixture(4));

        assert_eq!(html.matches("<div class=\"message ").count(), 4);
        let first = html.find("message number 0").unwrap();
        let second = html.find("message number 1").unwrap();
        let last = html.find("message number 3").unwrap();
        assert!(first < second && second < last);
        assert!(html.contains("4 messages"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let data = fixture(3);
        assert_eq!(render(&data), render(&data));
    }

    #[test]
    fn user_content_is_escaped() {
        let mut data = fixture(0);
        data.messages.push(message(
            1,
            0,
            "<script>alert('x')</script>",
            TranscriptAuthor::User("<b>Sam</b>".into()),
        ));
        data.ticket.subject = "<img src=x>".into();

        let html = render(&data);
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<img src=x>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&lt;b&gt;Sam&lt;/b&gt;"));
    }

    #[test]
    fn image_markers_become_links_and_newlines_break() {
        let mut data = fixture(0);
        data.messages.push(message(
            1,
            0,
            "look:\n[image](https://i.imgur.com/abc.png)",
            TranscriptAuthor::User("Sam".into()),
        ));

        let html = render(&data);
        assert!(html.contains("<br>"));
        assert!(html.contains("<a href=\"https://i.imgur.com/abc.png\""));
    }

    #[test]
    fn staff_messages_carry_their_role() {
        let mut data = fixture(0);
        data.messages.push(message(
            1,
            0,
            "on it",
            TranscriptAuthor::Staff {
                name: "Alice".into(),
                role: StaffRole::Moderator,
            },
        ));

        let html = render(&data);
        assert!(html.contains("message-staff"));
        assert!(html.contains("Moderator"));
    }

    #[test]
    fn image_attachments_render_inline_and_others_as_links() {
        let mut data = fixture(0);
        let mut entry = message(1, 0, "see attachments", TranscriptAuthor::User("Sam".into()));
        entry.attachments.push(attachment::Model {
            id: 1,
            message_id: 1,
            url: "https://i.imgur.com/pic.png".into(),
            filename: "pic.png".into(),
            mime_type: "image/png".into(),
            size: 10,
            created_at: at(0),
        });
        entry.attachments.push(attachment::Model {
            id: 2,
            message_id: 1,
            url: "https://example.com/log.txt".into(),
            filename: "log.txt".into(),
            mime_type: "text/plain".into(),
            size: 10,
            created_at: at(0),
        });
        data.messages.push(entry);

        let html = render(&data);
        assert!(html.contains("<img class=\"attachment-image\" src=\"https://i.imgur.com/pic.png\""));
        assert!(html.contains("<a class=\"attachment-link\" href=\"https://example.com/log.txt\""));
    }

    #[test]
    fn entry_names_are_sanitized_and_bounded() {
        assert_eq!(
            entry_name(12, "Cannot log in!"),
            "ticket-12-cannot-log-in-.html"
        );

        let long = "x".repeat(80);
        let name = entry_name(7, &long);
        assert_eq!(name, format!("ticket-7-{}.html", "x".repeat(50)));
    }

    #[test]
    fn archive_contains_one_entry_per_ticket() {
        let mut second = fixture(1);
        second.ticket = fixture_ticket(2, "Another one");

        let bytes = export_archive(&[fixture(2), second]).unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();

        assert_eq!(archive.len(), 2);
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert!(names.contains(&"ticket-1-broken-minimap.html".to_string()));
        assert!(names.contains(&"ticket-2-another-one.html".to_string()));
    }
}
