pub mod dashboard_template;
pub mod help_template;
