//! Discord REST collaborator.
//!
//! Everything the system needs from Discord goes through here: OAuth code
//! exchange, identity and guild-membership lookups, the live broker-role
//! check gating the housing category, and best-effort DM notifications.
//!
//! All calls share one client with a bounded timeout. Authorization-path
//! callers treat errors as a deny; notification-path callers log and move on.
//!
//! # Environment Variables Required
//! - `DISCORD_CLIENT_ID` / `DISCORD_CLIENT_SECRET`: OAuth application
//! - `DISCORD_BOT_TOKEN`: bot credential for member lookups and DMs
//! - `DISCORD_GUILD_ID`: the community server
//! - `DISCORD_BROKER_ROLE_ID`: role id checked for housing access

use anyhow::{Context, Result, anyhow};
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use util::config;

const API_BASE: &str = "https://discord.com/api/v10";

/// Hard cap on guild member listings; one page, never paginated further.
const MEMBER_PAGE_LIMIT: usize = 1000;

/// Shared HTTP client with a bounded timeout so a stalled Discord call can
/// never hang a request indefinitely.
static HTTP: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to build HTTP client")
});

#[derive(Debug, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
    pub global_name: Option<String>,
    pub avatar: Option<String>,
    pub email: Option<String>,
}

impl DiscordUser {
    /// CDN URL for the user's avatar, when they have one.
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar.as_ref().map(|hash| {
            format!(
                "https://cdn.discordapp.com/avatars/{}/{}.png",
                self.id, hash
            )
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuildMember {
    #[serde(default)]
    pub roles: Vec<String>,
    pub nick: Option<String>,
    pub user: Option<DiscordUser>,
}

/// Service wrapping the Discord REST API.
pub struct DiscordService;

impl DiscordService {
    /// Exchanges an OAuth authorization code for an access token.
    pub async fn exchange_code(code: &str, redirect_uri: &str) -> Result<OAuthToken> {
        let params = [
            ("client_id", config::discord_client_id()),
            ("client_secret", config::discord_client_secret()),
            ("grant_type", "authorization_code".to_string()),
            ("code", code.to_string()),
            ("redirect_uri", redirect_uri.to_string()),
        ];

        let response = HTTP
            .post(format!("{API_BASE}/oauth2/token"))
            .form(&params)
            .send()
            .await
            .context("OAuth token exchange failed")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "OAuth token exchange rejected: {}",
                response.status()
            ));
        }

        Ok(response.json().await?)
    }

    /// The user the access token belongs to.
    pub async fn fetch_user(access_token: &str) -> Result<DiscordUser> {
        let response = HTTP
            .get(format!("{API_BASE}/users/@me"))
            .bearer_auth(access_token)
            .send()
            .await
            .context("User lookup failed")?;

        if !response.status().is_success() {
            return Err(anyhow!("User lookup rejected: {}", response.status()));
        }

        Ok(response.json().await?)
    }

    /// The token owner's membership in the configured guild, or `None` when
    /// they are not a member.
    pub async fn fetch_member_me(access_token: &str) -> Result<Option<GuildMember>> {
        let guild_id = config::discord_guild_id();
        let response = HTTP
            .get(format!("{API_BASE}/users/@me/guilds/{guild_id}/member"))
            .bearer_auth(access_token)
            .send()
            .await
            .context("Guild membership lookup failed")?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => Ok(Some(response.json().await?)),
            s => Err(anyhow!("Guild membership lookup rejected: {s}")),
        }
    }

    /// A member's guild record resolved with the bot credential, or `None`
    /// when they are not in the guild.
    pub async fn fetch_member(discord_id: &str) -> Result<Option<GuildMember>> {
        let guild_id = config::discord_guild_id();
        let response = HTTP
            .get(format!("{API_BASE}/guilds/{guild_id}/members/{discord_id}"))
            .header("Authorization", format!("Bot {}", config::discord_bot_token()))
            .send()
            .await
            .context("Member lookup failed")?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => Ok(Some(response.json().await?)),
            s => Err(anyhow!("Member lookup rejected: {s}")),
        }
    }

    /// One page of guild members, capped at [`MEMBER_PAGE_LIMIT`].
    ///
    /// The listing endpoint is paginated and rate-limited; callers get a
    /// bounded snapshot rather than an unbounded crawl.
    pub async fn list_members() -> Result<Vec<GuildMember>> {
        let guild_id = config::discord_guild_id();
        let response = HTTP
            .get(format!(
                "{API_BASE}/guilds/{guild_id}/members?limit={MEMBER_PAGE_LIMIT}"
            ))
            .header("Authorization", format!("Bot {}", config::discord_bot_token()))
            .send()
            .await
            .context("Member listing failed")?;

        if !response.status().is_success() {
            return Err(anyhow!("Member listing rejected: {}", response.status()));
        }

        Ok(response.json().await?)
    }

    /// Whether the member currently holds the configured broker role.
    ///
    /// Non-members and members without the role both answer `false`; network
    /// failures bubble up so callers can fail closed explicitly.
    pub async fn member_has_broker_role(discord_id: &str) -> Result<bool> {
        let broker_role = config::discord_broker_role_id();
        if broker_role.is_empty() {
            return Ok(false);
        }

        Ok(Self::fetch_member(discord_id)
            .await?
            .map(|m| m.roles.iter().any(|r| r == &broker_role))
            .unwrap_or(false))
    }

    /// Sends an embed DM to a user. Best effort: failures are logged and
    /// reported as `false`, never propagated.
    pub async fn send_dm(discord_id: &str, embed: Embed) -> bool {
        match Self::try_send_dm(discord_id, embed).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, discord_id, "Failed to deliver DM");
                false
            }
        }
    }

    async fn try_send_dm(discord_id: &str, embed: Embed) -> Result<()> {
        let bot_auth = format!("Bot {}", config::discord_bot_token());

        let response = HTTP
            .post(format!("{API_BASE}/users/@me/channels"))
            .header("Authorization", &bot_auth)
            .json(&serde_json::json!({ "recipient_id": discord_id }))
            .send()
            .await
            .context("DM channel creation failed")?;

        if !response.status().is_success() {
            return Err(anyhow!("DM channel creation rejected: {}", response.status()));
        }

        #[derive(Deserialize)]
        struct DmChannel {
            id: String,
        }
        let channel: DmChannel = response.json().await?;

        let response = HTTP
            .post(format!("{API_BASE}/channels/{}/messages", channel.id))
            .header("Authorization", &bot_auth)
            .json(&serde_json::json!({ "embeds": [embed] }))
            .send()
            .await
            .context("DM delivery failed")?;

        if !response.status().is_success() {
            return Err(anyhow!("DM delivery rejected: {}", response.status()));
        }

        Ok(())
    }
}

// --- Embeds ---

#[derive(Debug, Clone, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

fn field(name: &str, value: impl Into<String>, inline: bool) -> EmbedField {
    EmbedField {
        name: name.to_string(),
        value: value.into(),
        inline,
    }
}

fn footer() -> Option<EmbedFooter> {
    Some(EmbedFooter {
        text: format!("{} • Ticket System", config::project_name()),
    })
}

/// DM sent when staff reply to a ticket.
pub fn new_message_embed(
    ticket_number: i64,
    category: &str,
    subject: &str,
    preview: &str,
    url: &str,
) -> Embed {
    let preview = if preview.chars().count() > 200 {
        let mut p: String = preview.chars().take(200).collect();
        p.push('…');
        p
    } else {
        preview.to_string()
    };

    Embed {
        title: Some("💬 New reply to your ticket".into()),
        description: Some("You received a new response on your ticket.".into()),
        color: Some(0x6366F1),
        fields: vec![
            field("Ticket", format!("#{ticket_number}"), true),
            field("Category", category, true),
            field("Subject", subject, false),
            field("Message", preview, false),
            field("🔗 Open", format!("[Click here]({url})"), false),
        ],
        footer: footer(),
        timestamp: Some(chrono::Utc::now().to_rfc3339()),
    }
}

/// DM sent when a ticket is closed.
pub fn ticket_closed_embed(
    ticket_number: i64,
    category: &str,
    staff_name: &str,
    url: &str,
) -> Embed {
    Embed {
        title: Some("🔒 Ticket closed".into()),
        description: Some("Your ticket was closed by the team.".into()),
        color: Some(0xEF4444),
        fields: vec![
            field("Ticket", format!("#{ticket_number}"), true),
            field("Category", category, true),
            field("Closed by", staff_name, true),
            field(
                "📝 Rate us",
                format!("[Rate your support experience]({url})"),
                false,
            ),
        ],
        footer: footer(),
        timestamp: Some(chrono::Utc::now().to_rfc3339()),
    }
}

/// DM sent by the explicit "notify user" action.
pub fn ticket_updated_embed(ticket_number: i64, subject: &str, url: &str) -> Embed {
    Embed {
        title: Some("🔔 Ticket updated".into()),
        description: Some("Your ticket has news. Take a look.".into()),
        color: Some(0xF59E0B),
        fields: vec![
            field("Ticket", format!("#{ticket_number}"), true),
            field("Subject", subject, true),
            field("🔗 Open", format!("[Click here]({url})"), false),
        ],
        footer: footer(),
        timestamp: Some(chrono::Utc::now().to_rfc3339()),
    }
}

/// The informational panel posted in answer to the slash command.
pub fn command_panel_embed() -> Embed {
    use db::models::ticket::TicketCategory;
    use strum::IntoEnumIterator;

    let app_url = config::app_url();
    let categories = TicketCategory::iter()
        .map(|c| format!("• {} **{}** - {}", c.emoji(), c.label(), c.description()))
        .collect::<Vec<_>>()
        .join("\n");

    Embed {
        title: Some("📄 Support Center".into()),
        description: Some(format!(
            "**Welcome to our support center!**\n\n\
             Open a ticket in our web system to get help from the team.\n\n\
             **📋 Available categories:**\n{categories}\n\n\
             **🔗 Open a ticket:**\n[Click here]({app_url}/tickets)\n\n\
             Or go to: {app_url}/tickets"
        )),
        color: Some(0x6366F1),
        fields: Vec::new(),
        footer: footer(),
        timestamp: Some(chrono::Utc::now().to_rfc3339()),
    }
}
