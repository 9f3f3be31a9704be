pub mod board_view;
pub mod page_view;
pub mod status_bar;

pub use board_view::BoardView;
pub use page_view::{CELL_PX_HEIGHT, CELL_PX_WIDTH, PageView};
pub use status_bar::StatusBar;
