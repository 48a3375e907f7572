/// UI module exports
pub mod components;
pub mod main_page;
