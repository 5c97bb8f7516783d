// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 QXB Gateway Contributors

//! # Persistent Storage Module
//!
//! User credentials and claim locks live in a single embedded redb database
//! file under `DATA_DIR`. Private keys are AES-GCM-wrapped before they reach
//! this layer; nothing here holds plaintext key material.

pub mod database;

pub use database::{DbError, DbResult, GatewayDb, NewUser, StoredUser};
