pub(crate) mod health_check_controller;
pub(crate) mod session_controller;
pub(crate) mod user_controller;
