pub mod converter;
pub mod presence;
pub mod rate_limit;
pub mod report;
pub mod request_list;
pub mod response_list;

pub use presence::{OnlineGuildsManager, OnlinePlayersManager, PresenceTracker};
pub use rate_limit::RateLimiter;
pub use request_list::RequestList;
pub use response_list::ResponseList;
