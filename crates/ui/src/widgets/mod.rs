pub mod item_list;
pub mod seek_bar;
