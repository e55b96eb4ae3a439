mod batch;
mod common;
mod slots;
