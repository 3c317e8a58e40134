//! RepairHub API
//!
//! Backend for a repair-services and device-parts shop.
//!
//! ## Features
//! - Product, brand, device model and repair service catalog
//! - Per-user shopping cart and wishlist documents
//! - Orders with line snapshots and repair bookings
//! - JWT authentication with role-based access
//! - User and admin dashboards

pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod http;
pub mod service;
pub mod store;
