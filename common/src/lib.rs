pub mod command;
pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod opentherm;
pub mod response;
pub mod schedule;
pub mod state;
pub mod topics;
pub mod transaction;
pub mod types;

pub use command::Command;
pub use config::{ControlConfig, NetworkConfig, RuntimeConfig};
pub use engine::{BoilerEngine, TickReport};
pub use error::{CommandError, ConfigError};
pub use response::{CompletionQueue, Response, ResponseStatus};
pub use schedule::ScheduleClassifier;
pub use state::ControlContext;
pub use topics::*;
pub use transaction::{CycleOutcome, Transaction, TransactionCycle, TransactionKind, Transport};
pub use types::{BoilerSnapshot, HeatingMode, HotWaterMode, TimeOfDay};
