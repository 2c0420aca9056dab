use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{
    ButtonStyle, ChannelId, CreateActionRow, CreateAttachment, CreateButton, CreateMessage,
    GuildId, MessageId, RoleId, UserId,
};
use serenity::http::{Http, HttpError};
use tracing::{debug, warn};

use crate::platform::api::{
    AdminProfile, AdminRoster, AlertAction, ChatApi, ChatApiError, MemberProfile,
};
use crate::platform::client_slot::ClientSlot;

/// Discord JSON error for "Cannot send messages to this user"
const CANNOT_MESSAGE_USER: isize = 50007;

/// serenity-backed implementation of the chat-platform surface
pub struct DiscordApi {
    slot: Arc<ClientSlot>,
    rest: reqwest::Client,
    avatar_dir: PathBuf,
}

impl DiscordApi {
    pub fn new(slot: Arc<ClientSlot>, avatar_dir: PathBuf) -> Self {
        Self {
            slot,
            rest: reqwest::Client::new(),
            avatar_dir,
        }
    }

    fn http(&self) -> Result<Arc<Http>, ChatApiError> {
        self.slot
            .http()
            .map_err(|e| ChatApiError::Platform(e.to_string()))
    }

    /// Download an avatar into the local cache, keyed by user and URL so a
    /// changed avatar gets a fresh file. Failures are reported to the caller,
    /// who treats a missing photo as "nothing to compare".
    pub async fn cache_avatar(&self, user_id: u64, url: &str) -> Result<PathBuf, ChatApiError> {
        let mut hasher = DefaultHasher::new();
        url.hash(&mut hasher);
        let path = self
            .avatar_dir
            .join(format!("{}-{:016x}.img", user_id, hasher.finish()));

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(path);
        }

        let bytes = self
            .rest
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ChatApiError::Platform(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| ChatApiError::Platform(e.to_string()))?;

        tokio::fs::create_dir_all(&self.avatar_dir)
            .await
            .map_err(|e| ChatApiError::Platform(e.to_string()))?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| ChatApiError::Platform(e.to_string()))?;

        debug!("Cached avatar for user {} at {:?}", user_id, path);
        Ok(path)
    }

    /// Build the profile handed to the impersonation detector. A failed
    /// avatar download degrades to a profile without a photo.
    pub async fn member_profile(
        &self,
        user_id: u64,
        display_name: &str,
        avatar_url: Option<&str>,
    ) -> MemberProfile {
        let photo_path = match avatar_url {
            Some(url) => match self.cache_avatar(user_id, url).await {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Could not materialize avatar for user {}: {}", user_id, e);
                    None
                }
            },
            None => None,
        };

        MemberProfile {
            user_id,
            display_name: display_name.to_string(),
            photo_path,
        }
    }

    /// Role ids that carry the administrator permission, plus the owner
    async fn admin_role_ids(
        &self,
        http: &Http,
        guild_id: GuildId,
    ) -> Result<(HashSet<RoleId>, UserId), ChatApiError> {
        let guild = http.get_guild(guild_id).await.map_err(classify)?;

        let roles = http.get_guild_roles(guild_id).await.map_err(classify)?;
        let admin_roles = roles
            .iter()
            .filter(|role| role.permissions.administrator())
            .map(|role| role.id)
            .collect();

        Ok((admin_roles, guild.owner_id))
    }
}

#[async_trait]
impl ChatApi for DiscordApi {
    async fn send_direct_message(&self, user_id: u64, text: &str) -> Result<u64, ChatApiError> {
        let http = self.http()?;

        let dm = UserId::new(user_id)
            .create_dm_channel(&*http)
            .await
            .map_err(classify)?;

        let message = dm
            .send_message(&*http, CreateMessage::new().content(text))
            .await
            .map_err(classify)?;

        Ok(message.id.get())
    }

    async fn send_direct_photo(
        &self,
        user_id: u64,
        path: &Path,
        caption: &str,
    ) -> Result<u64, ChatApiError> {
        let http = self.http()?;

        let attachment = CreateAttachment::path(path)
            .await
            .map_err(|e| ChatApiError::Platform(e.to_string()))?;

        let dm = UserId::new(user_id)
            .create_dm_channel(&*http)
            .await
            .map_err(classify)?;

        let message = dm
            .send_message(
                &*http,
                CreateMessage::new().content(caption).add_file(attachment),
            )
            .await
            .map_err(classify)?;

        Ok(message.id.get())
    }

    async fn send_direct_video(
        &self,
        user_id: u64,
        path: &Path,
        caption: &str,
    ) -> Result<u64, ChatApiError> {
        // Discord treats photo and video uploads identically
        self.send_direct_photo(user_id, path, caption).await
    }

    async fn send_channel_message(
        &self,
        channel_id: u64,
        text: &str,
    ) -> Result<u64, ChatApiError> {
        let http = self.http()?;

        let message = ChannelId::new(channel_id)
            .send_message(&*http, CreateMessage::new().content(text))
            .await
            .map_err(classify)?;

        Ok(message.id.get())
    }

    async fn send_alert_with_actions(
        &self,
        channel_id: u64,
        text: &str,
        actions: &[AlertAction],
    ) -> Result<u64, ChatApiError> {
        let http = self.http()?;

        let buttons = actions
            .iter()
            .map(|action| {
                CreateButton::new(&action.custom_id)
                    .label(&action.label)
                    .style(if action.danger {
                        ButtonStyle::Danger
                    } else {
                        ButtonStyle::Secondary
                    })
            })
            .collect();

        let message = ChannelId::new(channel_id)
            .send_message(
                &*http,
                CreateMessage::new()
                    .content(text)
                    .components(vec![CreateActionRow::Buttons(buttons)]),
            )
            .await
            .map_err(classify)?;

        Ok(message.id.get())
    }

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), ChatApiError> {
        let http = self.http()?;

        ChannelId::new(channel_id)
            .delete_message(&*http, MessageId::new(message_id))
            .await
            .map_err(classify)
    }

    async fn ban_member(
        &self,
        chat_id: u64,
        user_id: u64,
        reason: &str,
    ) -> Result<(), ChatApiError> {
        let http = self.http()?;

        GuildId::new(chat_id)
            .ban_with_reason(&*http, UserId::new(user_id), 0, reason)
            .await
            .map_err(classify)
    }

    async fn is_member_admin(&self, chat_id: u64, user_id: u64) -> Result<bool, ChatApiError> {
        let http = self.http()?;
        let guild_id = GuildId::new(chat_id);

        let (admin_roles, owner_id) = self.admin_role_ids(&http, guild_id).await?;
        if owner_id.get() == user_id {
            return Ok(true);
        }

        let member = http
            .get_member(guild_id, UserId::new(user_id))
            .await
            .map_err(classify)?;

        Ok(member.roles.iter().any(|role| admin_roles.contains(role)))
    }

    async fn list_joined_chats(&self) -> Result<Vec<u64>, ChatApiError> {
        let http = self.http()?;

        let guilds = http.get_guilds(None, None).await.map_err(classify)?;

        Ok(guilds.into_iter().map(|g| g.id.get()).collect())
    }
}

#[async_trait]
impl AdminRoster for DiscordApi {
    async fn list_admins(&self, chat_id: u64) -> Result<Vec<AdminProfile>, ChatApiError> {
        let http = self.http()?;
        let guild_id = GuildId::new(chat_id);

        let (admin_roles, owner_id) = self.admin_role_ids(&http, guild_id).await?;

        let members = http
            .get_guild_members(guild_id, Some(1000), None)
            .await
            .map_err(classify)?;

        let mut admins = Vec::new();
        for member in members {
            let is_admin = member.user.id == owner_id
                || member.roles.iter().any(|role| admin_roles.contains(role));
            if !is_admin || member.user.bot {
                continue;
            }

            let photo_path = match member.user.avatar_url() {
                Some(url) => match self.cache_avatar(member.user.id.get(), &url).await {
                    Ok(path) => Some(path),
                    Err(e) => {
                        warn!(
                            "Could not materialize avatar for admin {}: {}",
                            member.user.id, e
                        );
                        None
                    }
                },
                None => None,
            };

            admins.push(AdminProfile {
                user_id: member.user.id.get(),
                display_name: member.display_name().to_string(),
                photo_path,
            });
        }

        Ok(admins)
    }
}

/// Map serenity failures onto the delivery error taxonomy
fn classify(err: serenity::Error) -> ChatApiError {
    if let serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) = &err {
        if response.error.code == CANNOT_MESSAGE_USER {
            return ChatApiError::Blocked;
        }
    }
    ChatApiError::Platform(err.to_string())
}
