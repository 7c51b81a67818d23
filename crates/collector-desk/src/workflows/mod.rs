pub mod calculation;
pub mod custody;
pub mod desk;
pub mod feed;
pub mod payload;
