pub mod character;
pub mod content_key;
pub mod guild;
pub mod online;
pub mod player;
pub mod uptime;

pub use character::{CharacterHistory, CharacterInfo};
pub use content_key::ContentKey;
pub use guild::{GuildHistory, GuildInfo, GuildMemberHistory};
pub use online::{OnlinePlayer, PlayerActivityHistory};
pub use player::{PlayerHistory, PlayerInfo};
pub use uptime::UptimeRecord;

/// Converted entities of one database run, grouped by entity type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityBatch {
    /// Latest roster of the run; when present it replaces the stored roster
    pub online_players: Option<Vec<OnlinePlayer>>,
    pub player_activity: Vec<PlayerActivityHistory>,
    pub player_info: Vec<PlayerInfo>,
    pub player_history: Vec<PlayerHistory>,
    pub character_info: Vec<CharacterInfo>,
    pub character_history: Vec<CharacterHistory>,
    pub guild_info: Vec<GuildInfo>,
    pub guild_history: Vec<GuildHistory>,
    pub guild_member_history: Vec<GuildMemberHistory>,
    pub uptime: Vec<UptimeRecord>,
}

impl EntityBatch {
    /// Total number of entities across all types
    pub fn len(&self) -> usize {
        self.online_players.as_ref().map_or(0, Vec::len)
            + self.player_activity.len()
            + self.player_info.len()
            + self.player_history.len()
            + self.character_info.len()
            + self.character_history.len()
            + self.guild_info.len()
            + self.guild_history.len()
            + self.guild_member_history.len()
            + self.uptime.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
