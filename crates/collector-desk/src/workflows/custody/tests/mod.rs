mod common;
mod polling;
mod properties;
