pub mod settings_route;
pub mod texts_route;
