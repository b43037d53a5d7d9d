// SPDX-License-Identifier: MIT

//! Middleware modules (session gating, security headers).

pub mod gate;
pub mod security;

pub use gate::session_gate;
