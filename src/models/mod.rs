pub mod image;
pub mod run;
pub mod session;
pub mod style;
