pub mod check;
pub mod compare;
pub mod evaluate;
pub mod init;
pub mod normalize;
pub mod summarize;
pub mod validate;
