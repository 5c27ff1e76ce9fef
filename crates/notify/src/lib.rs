//! Renewal notifications: scheduled jobs, the job store boundary, the
//! scheduler that derives a plan's monthly cycle, and email composition.

pub mod compose;
pub mod directory;
pub mod email;
pub mod job;
pub mod scheduler;
pub mod store;

pub use compose::{RenewalEmail, build_renewal_email};
pub use directory::{
    BranchDirectory, BranchInfo, DeliveryAddress, InMemoryDirectory, PlanDirectory, RenewalPlan,
    ShippingMethod, UserDirectory,
};
pub use email::{EmailGateway, EmailMessage, GatewayError, RecordingGateway};
pub use job::{NotificationStage, ScheduledNotification, dedup_key};
pub use scheduler::{NotificationScheduler, RENEWAL_OFFSETS, ScheduleError};
pub use store::{InMemoryNotificationJobs, InsertOutcome, JobStoreError, NotificationJobStore};
