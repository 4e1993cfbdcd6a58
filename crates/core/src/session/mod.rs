pub mod context_menu;
pub mod edit_dialog;
pub mod editing_session;
