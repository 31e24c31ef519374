mod admin;
mod data;
mod files;

pub use admin::{admin_purge, export, health};
pub use data::{delete_data, get_data, put_data};
pub use files::{delete_file, download_file, list_files, upload_file};
