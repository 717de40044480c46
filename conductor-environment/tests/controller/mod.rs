mod deploy;
mod logs;
mod status;
