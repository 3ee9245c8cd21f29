pub mod classes;
pub mod core;
pub mod logs;
pub mod students;
pub mod users;
