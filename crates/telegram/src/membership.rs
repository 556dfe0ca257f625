//! Channel-membership gating.
//!
//! Every check asks Telegram afresh; nothing is cached, since a user can
//! leave the channel between two messages.

use std::{fmt, sync::Arc};

use {
    async_trait::async_trait,
    teloxide::{
        prelude::*,
        types::{ChatId, ChatMemberKind, Recipient, UserId},
    },
    tracing::{debug, warn},
};

use crate::error::Result;

/// A user's standing in the gating channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipStatus {
    Owner,
    Administrator,
    Member,
    Restricted,
    Left,
    Banned,
    Unknown,
}

impl MembershipStatus {
    /// Only owners, administrators, and plain members may use the bot.
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Owner | Self::Administrator | Self::Member)
    }
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Owner => "owner",
            Self::Administrator => "administrator",
            Self::Member => "member",
            Self::Restricted => "restricted",
            Self::Left => "left",
            Self::Banned => "banned",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

impl From<&ChatMemberKind> for MembershipStatus {
    fn from(kind: &ChatMemberKind) -> Self {
        match kind {
            ChatMemberKind::Owner { .. } => Self::Owner,
            ChatMemberKind::Administrator { .. } => Self::Administrator,
            ChatMemberKind::Member { .. } => Self::Member,
            ChatMemberKind::Restricted { .. } => Self::Restricted,
            ChatMemberKind::Left { .. } => Self::Left,
            ChatMemberKind::Banned { .. } => Self::Banned,
            #[allow(unreachable_patterns)]
            _ => Self::Unknown,
        }
    }
}

/// Where membership answers come from.
#[async_trait]
pub trait MembershipSource: Send + Sync {
    async fn member_status(&self, channel: &str, user_id: u64) -> Result<MembershipStatus>;
}

/// Asks the Bot API via `getChatMember`.
pub struct TelegramMembership {
    bot: Bot,
}

impl TelegramMembership {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl MembershipSource for TelegramMembership {
    async fn member_status(&self, channel: &str, user_id: u64) -> Result<MembershipStatus> {
        let member = self
            .bot
            .get_chat_member(recipient(channel), UserId(user_id))
            .await?;
        Ok(MembershipStatus::from(&member.kind))
    }
}

/// Turn a configured channel into a Bot API chat identifier: numeric ids are
/// used as-is, anything else is treated as a public `@username`.
pub fn recipient(channel: &str) -> Recipient {
    let channel = channel.trim();
    match channel.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) if channel.starts_with('@') => Recipient::ChannelUsername(channel.to_string()),
        Err(_) => Recipient::ChannelUsername(format!("@{channel}")),
    }
}

/// Fail-closed membership decision for one configured channel.
#[derive(Clone)]
pub struct MembershipGate {
    channel: String,
    source: Arc<dyn MembershipSource>,
}

impl MembershipGate {
    pub fn new(channel: impl Into<String>, source: Arc<dyn MembershipSource>) -> Self {
        Self {
            channel: channel.into(),
            source,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Whether `user_id` may use the bot right now. Query failures deny.
    pub async fn is_member(&self, user_id: u64) -> bool {
        match self.source.member_status(&self.channel, user_id).await {
            Ok(status) => {
                debug!(user_id, channel = %self.channel, %status, "membership checked");
                status.is_allowed()
            },
            Err(e) => {
                warn!(
                    user_id,
                    channel = %self.channel,
                    error = %e,
                    "membership query failed, denying"
                );
                false
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod tests {
    use std::{
        collections::HashMap,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use {rstest::rstest, serde_json::json, teloxide::types::ChatMember};

    use {super::*, crate::error::Error};

    /// Scripted membership answers; unknown users make the query fail.
    #[derive(Default)]
    pub(crate) struct ScriptedMembership {
        pub statuses: HashMap<u64, MembershipStatus>,
        pub calls: AtomicUsize,
    }

    impl ScriptedMembership {
        pub fn with(entries: &[(u64, MembershipStatus)]) -> Self {
            Self {
                statuses: entries.iter().copied().collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MembershipSource for ScriptedMembership {
        async fn member_status(&self, _channel: &str, user_id: u64) -> Result<MembershipStatus> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.statuses
                .get(&user_id)
                .copied()
                .ok_or_else(|| Error::message("user not found"))
        }
    }

    #[rstest]
    #[case(MembershipStatus::Owner, true)]
    #[case(MembershipStatus::Administrator, true)]
    #[case(MembershipStatus::Member, true)]
    #[case(MembershipStatus::Restricted, false)]
    #[case(MembershipStatus::Left, false)]
    #[case(MembershipStatus::Banned, false)]
    #[case(MembershipStatus::Unknown, false)]
    #[tokio::test]
    async fn gate_allows_only_full_members(
        #[case] status: MembershipStatus,
        #[case] allowed: bool,
    ) {
        let source = Arc::new(ScriptedMembership::with(&[(7, status)]));
        let gate = MembershipGate::new("@premiumlinkers", source);
        assert_eq!(gate.is_member(7).await, allowed);
    }

    #[tokio::test]
    async fn query_failure_denies() {
        let gate = MembershipGate::new("@premiumlinkers", Arc::new(ScriptedMembership::default()));
        assert!(!gate.is_member(99).await);
    }

    #[tokio::test]
    async fn every_check_queries_again() {
        let source = Arc::new(ScriptedMembership::with(&[(1, MembershipStatus::Member)]));
        let gate = MembershipGate::new("@c", source.clone());
        gate.is_member(1).await;
        gate.is_member(1).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn recipient_accepts_ids_and_usernames() {
        assert_eq!(recipient("-1001234"), Recipient::Id(ChatId(-1001234)));
        assert_eq!(
            recipient("@premiumlinkers"),
            Recipient::ChannelUsername("@premiumlinkers".into())
        );
        assert_eq!(
            recipient("premiumlinkers"),
            Recipient::ChannelUsername("@premiumlinkers".into())
        );
    }

    #[rstest]
    #[case(json!({"status": "creator", "user": user(), "is_anonymous": false}), MembershipStatus::Owner)]
    #[case(json!({"status": "member", "user": user()}), MembershipStatus::Member)]
    #[case(json!({"status": "left", "user": user()}), MembershipStatus::Left)]
    #[case(json!({"status": "kicked", "user": user(), "until_date": 0}), MembershipStatus::Banned)]
    fn maps_platform_statuses(#[case] raw: serde_json::Value, #[case] expected: MembershipStatus) {
        let member: ChatMember = serde_json::from_value(raw).unwrap();
        assert_eq!(MembershipStatus::from(&member.kind), expected);
    }

    fn user() -> serde_json::Value {
        json!({"id": 1001, "is_bot": false, "first_name": "Alice"})
    }
}
