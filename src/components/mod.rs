pub mod chatbot;
pub mod context_menu;
pub mod force_graph;
pub mod history_sidebar;
pub mod node_details;
