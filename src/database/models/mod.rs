pub mod invoice;
pub mod message;
pub mod project;
pub mod task;
pub mod team;
pub mod user;

pub use invoice::{Invoice, InvoiceStatus};
pub use message::{Message, MessagePriority, MessageThread};
pub use project::{Priority, Project, ProjectStatus};
pub use task::{Task, TaskStatus};
pub use team::{Team, TeamMember, TeamRole};
pub use user::{Role, User};
