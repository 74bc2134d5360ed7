pub mod date_stamp;
pub mod export;
