mod alive;
mod health;
mod metrics;
mod send;
mod templates;

pub use alive::alive_handler;
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use send::send_handler;
pub use templates::{get_template_handler, list_templates_handler};
