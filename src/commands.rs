//! High-level command orchestration for the CLI.
//!
//! Wires the production collaborators (JSON file store, `inquire` prompts,
//! SOAP login) into the selection flow and activation step, and renders the
//! connection list.

use anstyle::AnsiColor;
use anyhow::Result;

use crate::activation::ActivationWriter;
use crate::config::Config;
use crate::flow::SelectionFlow;
use crate::profiles::{ProfileStore, SelectionRequest};
use crate::prompt::{InquirePrompter, Prompter};
use crate::store::{DocumentStore, JsonFileStore};
use crate::ui::Ui;
use crate::validator::{EndpointValidator, SoapLoginValidator};

/// Choose, validate and activate a connection
pub fn connect(config: &Config, requested: Option<&str>, ui: &Ui) -> Result<()> {
    let profiles = ProfileStore::new(JsonFileStore::new(&config.paths.store_dir));
    let validator = SoapLoginValidator::new(config.login_timeout, &config.api_version)?;
    let mut prompter = InquirePrompter;

    select_and_activate(&profiles, &mut prompter, &validator, requested, ui)?;
    Ok(())
}

/// Run the selection flow, then persist the result as the active connection.
///
/// Nothing is written unless selection succeeds.
pub fn select_and_activate<S, P, V>(
    profiles: &ProfileStore<S>,
    prompter: &mut P,
    validator: &V,
    requested: Option<&str>,
    ui: &Ui,
) -> Result<SelectionRequest>
where
    S: DocumentStore + Clone + Send + Sync + 'static,
    P: Prompter,
    V: EndpointValidator,
{
    let request = SelectionFlow::new(profiles, prompter, validator, ui).run(requested)?;
    ActivationWriter::new(profiles).activate(&request)?;

    if matches!(request, SelectionRequest::CreateNew { .. }) {
        ui.info(format!("Saved new connection '{}'", request.alias()));
    }
    ui.ok(format!("Active connection: {}", ui.bold(request.alias())));
    Ok(request)
}

/// List saved connections without their secrets
pub fn list(config: &Config, ui: &Ui) -> Result<()> {
    let connections = if config.paths.has_connections() {
        ProfileStore::new(JsonFileStore::new(&config.paths.store_dir)).load()?
    } else {
        Vec::new()
    };

    if connections.is_empty() {
        ui.warn("No connections saved.");
        ui.newline();
        ui.println("Create one with:");
        ui.println(format!("  {}", ui.bold("sfconn")));
        return Ok(());
    }

    let mut table = ui.simple_table();
    table.set_header(vec![
        ui.header_cell(""),
        ui.header_cell("Alias"),
        ui.header_cell("Login URL"),
        ui.header_cell("Username"),
        ui.header_cell("Status"),
    ]);

    for connection in connections.iter().filter(|c| !c.alias.is_empty()) {
        let icon = if connection.active { ui.icon_ok() } else { " " };
        let status = if connection.active {
            ui.colored_cell("active", AnsiColor::Green)
        } else {
            ui.cell("-")
        };

        table.add_row(vec![
            ui.cell(icon),
            ui.cell(&connection.alias),
            ui.cell(&connection.login_url),
            ui.cell(&connection.username),
            status,
        ]);
    }

    ui.section(format!("Connections ({})", config.paths.store_dir.display()));
    ui.println(table.to_string());
    Ok(())
}
