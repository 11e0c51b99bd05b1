pub mod assignment;
pub mod catalog;
pub mod provisioning;
pub mod session;
pub mod tenant;

pub use assignment::AssignmentService;
pub use catalog::{CatalogService, EmployeeRequest, LessonRequest};
pub use provisioning::{Promotion, ProvisioningService, StageRequest, StagedRegistration};
pub use session::{Session, SessionService};
pub use tenant::{TenantGuard, TenantScope};
