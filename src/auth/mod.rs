// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 QXB Gateway Contributors

//! # Authentication Module
//!
//! Email + password authentication with locally issued HS256 bearer tokens,
//! plus password-derived custody of user private keys.
//!
//! ## Auth Flow
//!
//! 1. Register: hash password (argon2id), generate a secp256k1 keypair, wrap
//!    the private key (AES-256-GCM under a password-derived key), issue a JWT.
//! 2. Login: verify password, issue a JWT.
//! 3. Authenticated routes: `Authorization: Bearer <JWT>` verified by the
//!    `Auth` extractor.
//!
//! The private key can only be unwrapped with the user's password; the server
//! never stores it in the clear.

pub mod crypto;
pub mod error;
pub mod extractor;
pub mod token;

pub use crypto::{hash_password, unwrap_key, verify_password, wrap_key, CryptoError};
pub use error::AuthError;
pub use extractor::{Auth, AuthenticatedUser, OptionalAuth};
pub use token::{Claims, JwtKeys};
