mod check;
mod export;
mod load;
mod server;
mod summary;


pub(crate) use check::run_check;
pub(crate) use load::run_load_command;
