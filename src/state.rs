use std::sync::Arc;

use crate::service::automation::AutomationService;
use crate::service::leave::LeaveService;

/// Services shared by every worker, registered as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub leave: Arc<LeaveService>,
    pub automation: Arc<AutomationService>,
}
