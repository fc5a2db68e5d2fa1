#![allow(dead_code)]

pub mod app;
pub mod auth;
pub mod generator;
pub mod http;
