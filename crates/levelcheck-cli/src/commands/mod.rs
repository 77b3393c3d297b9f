pub mod difficulty;
pub mod evaluate;
pub mod flow;
pub mod init;
pub mod validate;
