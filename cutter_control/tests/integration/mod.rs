mod carving;
mod config;
mod lifecycle;
mod safety_cancel;
