mod chart;
mod dashboard;
mod earnings;
mod records;

pub use chart::{render_bars, BarRow};
pub use dashboard::DashboardSummary;
pub use earnings::{aggregate, aggregate_with, EarningsSeries, MonthBucket, WindowMode, MONTH_LABELS};
pub use records::{
    parse_payment, parse_payment_amount, parse_payments, parse_wire_date, MalformedRecord, ParsedPayments,
    PaymentRecord, RecordIssue,
};
