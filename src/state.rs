use crate::database::DatabaseManager;
use crate::services::{
    InvoiceService, MessageService, ProjectService, SessionService, TaskService, TeamService, UserService,
};

/// Shared handler state; every service holds a clone of the same pool
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseManager,
    pub session: SessionService,
    pub users: UserService,
    pub projects: ProjectService,
    pub tasks: TaskService,
    pub teams: TeamService,
    pub invoices: InvoiceService,
    pub messages: MessageService,
}

impl AppState {
    pub fn new(db: DatabaseManager) -> Self {
        let pool = db.pool().clone();
        Self {
            session: SessionService::new(pool.clone()),
            users: UserService::new(pool.clone()),
            projects: ProjectService::new(pool.clone()),
            tasks: TaskService::new(pool.clone()),
            teams: TeamService::new(pool.clone()),
            invoices: InvoiceService::new(pool.clone()),
            messages: MessageService::new(pool),
            db,
        }
    }
}
