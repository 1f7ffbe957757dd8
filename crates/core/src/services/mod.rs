//! Business logic services.

#![allow(missing_docs)]

pub mod analyst;
pub mod follow;
pub mod muting;
pub mod relationship;
pub mod signal;
pub mod subscription;
pub mod user;

pub use analyst::{AnalystEntry, AnalystFollowStatus, AnalystService, parse_include_status};
pub use follow::{FollowService, MAX_ATTEMPTS, RequestOutcome};
pub use muting::MutingService;
pub use relationship::{
    FollowWithUsers, RelationshipCounts, RelationshipService, RelationshipStatus,
};
pub use signal::{CreateSignalInput, SignalService};
pub use subscription::{CancelOutcome, SubscribeInput, SubscriptionService};
pub use user::{ChangePasswordInput, CreateUserInput, UpdateUserInput, UserService};
