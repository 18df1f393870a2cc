//! HTTP front-end for the Lookbook flow.

pub mod rest;

pub use rest::{configure, RestApi};
