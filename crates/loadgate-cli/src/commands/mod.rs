pub mod check;
pub mod estimate;
pub mod init;
pub mod run;
pub mod simulate;
