//! Pure billing rules
//!
//! Everything here is deterministic over its inputs so that services, the
//! in-memory store and the HTTP layer share one definition of each rule.

mod discount;
mod invoice_number;
mod lifecycle;
mod period;
mod quota;
mod statistics;
mod status;

pub use discount::{discount_breakdown, parse_discount_percent};
pub use invoice_number::invoice_number;
pub use lifecycle::{new_subscription, plan_rollover, RolloverPlan, RolloverPolicy};
pub use period::{add_months, adhoc_period, advance_period, month_bounds, PeriodAdvance};
pub use quota::check_consumption;
pub use statistics::compute_statistics;
pub use status::{effective_status, is_overdue};
