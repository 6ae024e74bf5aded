#![doc = "community-migrate-core: core logic library for community-migrate."]

//! This crate holds the data models, platform clients and migration pipelines
//! used to mirror a community platform (space groups, spaces, posts) into a
//! help-center (collections, articles). CLI glue lives in `community-migrate`.
//!
//! # Usage
//! Build a [`circle::CircleClient`] and an [`intercom::IntercomClient`] from a
//! [`config::MigrationConfig`], then drive them through [`migrate`].

pub mod circle;
pub mod config;
pub mod contract;
pub mod html;
pub mod http;
pub mod intercom;
pub mod lookup;
pub mod migrate;
pub mod pagination;
