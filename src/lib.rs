pub mod auction;
pub mod bidding;
pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod message_broker;
pub mod notifier;
pub mod query;
pub mod scheduler;
pub mod state_log;
pub mod store;

pub use clock::{Clock, MockClock, SystemClock};
pub use config::Config;
pub use error::{AuctionError, Outcome, ResultCode};
pub use lifecycle::{LifecycleManager, Transition};
pub use scheduler::{ClosingSweeper, SweepReport};
pub use store::{AuctionStore, InMemoryStore};
