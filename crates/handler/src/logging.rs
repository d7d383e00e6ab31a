use crate::config::HandlerConfig;

pub fn setup_logging(config: &HandlerConfig) {
    common::setup_logging(config.log_level.clone(), config.environment.clone());
}
