//! # Alive Core Library
//!
//! Business logic for Alive, a dead man's switch: the user checks in
//! periodically, and every check-in pushes a pre-composed email to an
//! emergency contact 48 hours into the future. If the user stops checking
//! in, the last scheduled email is delivered.
//!
//! ## Architecture
//!
//! - **Liveness**: pure status derivation from the last check-in instant
//! - **Scheduler**: the cancel-then-reschedule protocol that keeps a single
//!   outstanding notification
//! - **Dispatch**: delivery provider trait plus the Resend HTTP adapter
//! - **Storage**: JSON key-value records and TOML configuration
//!
//! ## Key Components
//!
//! - [`CheckInService`]: check-in use case, sole writer of the ledger
//! - [`DeadlineScheduler`]: single-outstanding-deadline protocol
//! - [`CheckInLedger`]: persisted `{lastCheckIn, scheduledEmailId}` record
//! - [`NotificationDispatcher`]: trait for delivery providers

pub mod display;
pub mod dispatch;
pub mod error;
pub mod ledger;
pub mod liveness;
pub mod message;
pub mod orchestrator;
pub mod scheduler;
pub mod storage;

pub use dispatch::{Credential, DeliveryHandle, Message, NotificationDispatcher, ResendDispatcher};
pub use error::{ConfigError, CoreError, DispatchError, StorageError};
pub use ledger::CheckInLedger;
pub use liveness::LivenessStatus;
pub use orchestrator::{CheckInService, StatusSnapshot};
pub use scheduler::{CheckInOutcome, DeadlineScheduler};
pub use storage::{Config, Contact, FileStore, MemoryStore, Settings};
