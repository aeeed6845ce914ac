pub mod library_list;
pub mod stats_sidebar;
pub mod summary_panel;
pub mod typing_area;

pub use library_list::{LibraryEntry, LibraryList};
pub use stats_sidebar::StatsSidebar;
pub use summary_panel::{SummaryPanel, TextSummary};
pub use typing_area::TypingArea;
