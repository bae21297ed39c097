#![cfg_attr(feature = "strict", deny(warnings))]

pub mod app;
mod constants;
mod console_observer;
