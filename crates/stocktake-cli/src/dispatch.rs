use std::sync::Arc;

use anyhow::{Context, Result, bail};
use comfy_table::{Cell, ContentArrangement, Table};
use stocktake_app::{App, ExportSource, ImportRequest};
use stocktake_core::api::StocklistApi;
use stocktake_core::config::{StocktakeConfig, resolve_config_dir};
use stocktake_core::doctor::DoctorReport;
use stocktake_core::http::HttpStocklistApi;
use stocktake_core::items_table::ItemsTable;

use crate::cli::{Cli, Command, CountArgs, ExportArgs, ImportArgs};

pub fn run_with_deps(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Command::Doctor) => run_doctor_command(),
        command => {
            let config = stocktake_app::ensure_config_ready()?;
            let api = connect(&config)?;
            let config_dir = resolve_config_dir()?;
            let app = App::new(api.as_ref(), config, config_dir);

            match command {
                Some(command) => run_store_command(command, &app),
                None => run_root_command(&app, api.clone()),
            }
        }
    }
}

fn connect(config: &StocktakeConfig) -> Result<Arc<HttpStocklistApi>> {
    let api = HttpStocklistApi::new(config.server.clone())
        .with_context(|| format!("failed to set up client for {}", config.server.base_url))?;
    Ok(Arc::new(api))
}

fn run_root_command(app: &App<'_>, api: Arc<dyn StocklistApi>) -> Result<()> {
    let exit = stocktake_tui::run_root(app, api)?;
    tracing::info!(?exit, "counter closed");
    Ok(())
}

fn run_store_command(command: Command, app: &App<'_>) -> Result<()> {
    match command {
        Command::Items => run_items_command(app),
        Command::Import(args) => run_import_command(app, args),
        Command::Export(args) => run_export_command(app, args),
        Command::Count(args) => run_count_command(app, args),
        Command::Doctor => run_doctor_command(),
    }
}

fn run_doctor_command() -> Result<()> {
    let report = stocktake_app::doctor()?;
    print_doctor_report(&report);
    Ok(())
}

fn print_doctor_report(report: &DoctorReport) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Check", "Status", "Details"]);

    for check in &report.checks {
        table.add_row(vec![
            Cell::new(check.name.as_str()),
            Cell::new(check.state),
            Cell::new(check.details.as_str()),
        ]);
    }

    println!("{table}");
    println!("{}", report.summary());
}

fn run_items_command(app: &App<'_>) -> Result<()> {
    let items = app.items_table()?;
    if items.rows.is_empty() {
        println!("{} has no items yet. Import a CSV file to start.", app.title());
        return Ok(());
    }

    println!("{}", render_items(&items));
    Ok(())
}

fn render_items(items: &ItemsTable) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![Cell::new("Item")];
    header.extend(
        items
            .headers
            .iter()
            .map(|column| Cell::new(format!("{} ({})", column.name, column.kind))),
    );
    table.set_header(header);

    for row in &items.rows {
        let mut cells = vec![Cell::new(row.name.trim())];
        cells.extend(row.cells.iter().map(|cell| Cell::new(cell.text.as_str())));
        table.add_row(cells);
    }

    table
}

fn run_import_command(app: &App<'_>, args: ImportArgs) -> Result<()> {
    let delimiter = match args.delimiter {
        Some(delimiter) if delimiter.is_ascii() => Some(delimiter as u8),
        Some(delimiter) => bail!("delimiter must be a single ASCII character, got '{delimiter}'"),
        None => None,
    };

    let summary = app.import_file(&ImportRequest {
        path: args.file,
        name_columns: args.name,
        quantity_column: args.quantity,
        delimiter,
    })?;

    println!("Imported {} items into {}.", summary.imported, app.title());
    match summary.session {
        Some(session) => println!("{}", session.count_badge()),
        None => println!("The store is still empty."),
    }
    Ok(())
}

fn run_export_command(app: &App<'_>, args: ExportArgs) -> Result<()> {
    if args.data_uri {
        let export = app.export_data_uri(args.offline)?;
        eprintln!(
            "Exported {} items from the {}",
            export.items,
            source_label(export.source)
        );
        println!("{}", export.uri);
        return Ok(());
    }

    let result = app.export_csv(args.output.as_deref(), args.offline)?;
    let source = source_label(result.source);
    println!(
        "Exported {} items from the {source} to {}",
        result.items,
        result.path.display()
    );
    Ok(())
}

fn source_label(source: ExportSource) -> &'static str {
    match source {
        ExportSource::Server => "server",
        ExportSource::Cache => "local cache",
    }
}

fn run_count_command(app: &App<'_>, args: CountArgs) -> Result<()> {
    let result = app.count_by_name(&args.item, &args.list, &args.amount)?;
    let verb = if result.unchanged {
        "Unchanged"
    } else if result.created {
        "Created"
    } else {
        "Updated"
    };

    println!(
        "{verb} {} = {} on list {}",
        result.item.trim(),
        result.amount,
        result.list
    );
    Ok(())
}
