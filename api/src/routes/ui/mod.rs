pub mod ui_route;
