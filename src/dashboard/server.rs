// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the modbus-simulator project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Rocket server for the monitoring dashboard
//!
//! Mounts the calls page routes and serves the static assets the template
//! references. The assets are embedded in the binary, eliminating the need
//! for external file dependencies when deploying the simulator.

use include_dir::{include_dir, Dir};
use rocket::figment::Figment;
use rocket::form::Form;
use rocket::http::{ContentType, Header};
use rocket::response::content::RawHtml;
use rocket::response::{Redirect, Responder};
use rocket::{get, post, routes, uri, Build, Request, Response, Rocket, State};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::simulator::SimulatorState;

use super::forms::CallsForm;
use super::render::render_calls_page;

/// Static assets referenced by the page template (stylesheet and icons)
const STATIC_DIR: Dir = include_dir!("resources/web");

/// Per-server settings the routes need at render time.
pub struct DashboardContext {
    pub refresh_secs: u16,
}

#[derive(Debug)]
struct StaticFileResponse(Vec<u8>, ContentType);

impl<'r> Responder<'r, 'r> for StaticFileResponse {
    fn respond_to(self, _: &'r Request<'_>) -> rocket::response::Result<'static> {
        Response::build()
            .header(self.1)
            .header(Header {
                name: "Cache-Control".into(),
                value: "max-age=604800".into(), // 1 week
            })
            .sized_body(self.0.len(), Cursor::new(self.0))
            .ok()
    }
}

/// Build the configured Rocket server instance for the dashboard.
///
/// ### Parameters
///
/// * `figment` - The Rocket configuration figment containing server settings
/// * `state` - The shared simulator state the routes read and reconfigure
/// * `dashboard` - The dashboard section of the application configuration
///
/// ### Returns
///
/// A configured Rocket instance ready to be launched
pub fn build_rocket(
    figment: Figment,
    state: Arc<SimulatorState>,
    dashboard: &DashboardConfig,
) -> Rocket<Build> {
    rocket::custom(figment)
        .mount("/", routes![index, calls_get, calls_post, assets])
        .manage(state)
        .manage(DashboardContext {
            refresh_secs: dashboard.refresh_secs,
        })
}

#[get("/")]
async fn index() -> Redirect {
    Redirect::to(uri!("/api/calls"))
}

/// Render the calls page, applying any form action carried in the query.
#[get("/api/calls?<form..>")]
async fn calls_get(
    form: CallsForm,
    state: &State<Arc<SimulatorState>>,
    context: &State<DashboardContext>,
) -> RawHtml<String> {
    handle_calls(&form, state.inner(), context.inner())
}

/// Render the calls page after applying a submitted form.
#[post("/api/calls", data = "<form>")]
async fn calls_post(
    form: Form<CallsForm>,
    state: &State<Arc<SimulatorState>>,
    context: &State<DashboardContext>,
) -> RawHtml<String> {
    handle_calls(&form, state.inner(), context.inner())
}

fn handle_calls(
    form: &CallsForm,
    state: &SimulatorState,
    context: &DashboardContext,
) -> RawHtml<String> {
    let error = form.apply(state).err().unwrap_or_default();
    RawHtml(render_calls_page(state, context.refresh_secs, &error))
}

/// Retrieves a static file from the embedded assets directory
///
/// # Arguments
///
/// * `path` - the path to the file relative to the assets directory
///
/// # Returns
///
/// * `Some(StaticFileResponse)` if the file exists, containing the file data
///   and content type
/// * `None` if the file does not exist
#[get("/<path..>", rank = 20)]
async fn assets(path: PathBuf) -> Option<StaticFileResponse> {
    let path = path.to_str().unwrap_or("");
    STATIC_DIR.get_file(path).map(|file| {
        let content_type = ContentType::from_extension(
            file.path()
                .extension()
                .unwrap_or_default()
                .to_str()
                .unwrap_or(""),
        )
        .unwrap_or(ContentType::Binary);
        StaticFileResponse(file.contents().to_vec(), content_type)
    })
}
