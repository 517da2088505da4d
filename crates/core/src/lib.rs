pub mod category;
pub mod config;
pub mod money;
pub mod obligation;
pub mod people;
pub mod schedule;
pub mod transaction;
pub mod week;

pub use category::{CategoryId, ExpenseCategory, ExpenseMatch, ExpenseRule, MatchMode, RuleId};
pub use config::{ConfigError, EngineConfig};
pub use money::Money;
pub use obligation::{compute_obligations, ObligationReport, WeeklyObligation};
pub use people::{Flatmate, FlatmateId, Landlord, LandlordId};
pub use schedule::{
    future_schedules, resolve_rate, PaymentSchedule, ScheduleError, ScheduleId,
};
pub use transaction::{
    MatchKind, MatchState, MatchTarget, Supplementary, Transaction, TransactionId,
};
pub use week::{local_date, weeks_in, DateRange, Week};
