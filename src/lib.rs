pub mod analytics;
pub mod api;
pub mod config;
pub mod csv_io;
pub mod error;

pub use analytics::{aggregate, aggregate_with, EarningsSeries, MonthBucket, PaymentRecord, WindowMode};
pub use api::{ApiClient, Project, RawPayment};
pub use config::{Config, Session};
pub use error::{FreelanceError, Result};
