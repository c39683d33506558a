mod client;
mod models;

pub use client::ApiClient;
pub use models::{
    payments_from_value, projects_from_value, PaymentInput, PaymentStatus, Project, ProjectInput,
    ProjectStatus, ProjectUpdate, RawPayment,
};
