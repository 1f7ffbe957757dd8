//! Repositories over the database entities.

mod follow;
mod mute;
mod subscription;
mod trading_signal;
mod user;

pub use follow::FollowRepository;
pub use mute::MuteRepository;
pub use subscription::SubscriptionRepository;
pub use trading_signal::TradingSignalRepository;
pub use user::UserRepository;
