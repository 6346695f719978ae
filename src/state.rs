use std::sync::Arc;

use crate::backend::Caller;
use crate::config::GatewaySettings;
use crate::gateway::registry::Registry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub caller: Arc<dyn Caller>,
    pub gateway: GatewaySettings,
}

impl AppState {
    pub fn new(caller: Arc<dyn Caller>, gateway: GatewaySettings) -> Self {
        Self {
            registry: Arc::new(Registry::new(gateway.max_sessions)),
            caller,
            gateway,
        }
    }
}
