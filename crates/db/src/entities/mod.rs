//! Database entities.

#![allow(missing_docs)]

pub mod follow;
pub mod mute;
pub mod subscription;
pub mod trading_signal;
pub mod user;

pub use follow::Entity as Follow;
pub use mute::Entity as Mute;
pub use subscription::Entity as Subscription;
pub use trading_signal::Entity as TradingSignal;
pub use user::Entity as User;
