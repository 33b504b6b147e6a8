pub mod admin;
pub mod commerce;
pub mod community;
pub mod content;
pub mod courses;
pub mod learning;
