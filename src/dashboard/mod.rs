// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-simulator project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Dashboard Module
//!
//! The web-based monitoring dashboard of the simulator. A Rocket server
//! renders the calls page from a fixed HTML artifact via token substitution
//! and accepts its two control forms (monitoring and response injection) at
//! `/api/calls`.
//!
//! ## Components
//!
//! * **templates**: the embedded page template and the token substitution
//!   engine
//! * **render**: builds the substitution values from the simulator state
//! * **forms**: the `/api/calls` field set and the Monitor/Clear/Stop and
//!   Set/Reset actions
//! * **server**: the Rocket builder, page routes and embedded static assets

pub mod forms;
pub mod render;
pub mod server;
pub mod templates;

pub use forms::CallsForm;
pub use render::render_calls_page;
pub use server::{build_rocket, DashboardContext};
