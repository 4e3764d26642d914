use crate::config::AppConfig;
use crate::services::actions::ActionBus;
use crate::services::flows::FlowRegistry;
use crate::services::profile_provider::ProfileProvider;
use crate::services::schedule::ScheduleSource;
use crate::services::submission::BookingSink;

pub struct AppState {
    pub config: AppConfig,
    pub flows: FlowRegistry,
    pub sink: Box<dyn BookingSink>,
    pub schedule: Box<dyn ScheduleSource>,
    pub profiles: Box<dyn ProfileProvider>,
    pub actions: ActionBus,
}
