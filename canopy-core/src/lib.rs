//! Canopy Core
//!
//! Core library for declaring infrastructure as values: builders register
//! resources into a [`context::Stack`], which records a [`plan::Plan`] of
//! effects that an [`interpreter::Interpreter`] later applies through a
//! [`provider::Provider`].

pub mod context;
pub mod effect;
pub mod interpreter;
pub mod plan;
pub mod provider;
pub mod resource;
pub mod schema;
