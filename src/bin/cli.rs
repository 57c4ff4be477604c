use anyhow::Context;
use clap::{Parser, Subcommand, Args, ValueEnum};
use pharmacy_finder::config::{global_config, set_global_config};
use pharmacy_finder::prelude::*;
use pharmacy_finder::view::{DirectionsPanel, MapView};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pfcli", version)]
#[command(about = "Pharmacy Finder CLI - Find pharmacies that take back unused medication", long_about = None)]
struct Cli {
    /// Pharmacy CSV file (overrides the configured data_path)
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,
    /// Config file (defaults to the per-user config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every medication category as a checkbox grid
    Categories,
    /// Show the pharmacies accepting the selected categories
    Search(SearchArgs),
    /// Get directions to one of the matching pharmacies
    Directions(DirectionsArgs),
    /// Show summary statistics for the dataset
    Stats,
    /// Pick categories and request directions interactively
    #[cfg(feature = "interactive")]
    Interactive,
}

#[derive(Args)]
struct SelectionArgs {
    /// Medication category to select (repeatable)
    #[arg(short = 'C', long = "category")]
    categories: Vec<String>,
    /// Match whole category labels instead of substrings
    #[arg(long)]
    exact: bool,
}

#[derive(Args)]
struct SearchArgs {
    #[command(flatten)]
    selection: SelectionArgs,
    /// Print the whole page model as JSON
    #[arg(long)]
    json: bool,
    /// Write a standalone HTML map of the results
    #[arg(long)]
    map: Option<PathBuf>,
    /// Export the results to a file
    #[arg(short, long)]
    export: Option<PathBuf>,
    /// Export format (defaults to the configured format)
    #[arg(long, value_enum)]
    format: Option<ExportFormatOpt>,
}

#[derive(Args)]
struct DirectionsArgs {
    #[command(flatten)]
    selection: SelectionArgs,
    /// Destination pharmacy (defaults to the first one on the map)
    #[arg(long)]
    pharmacy: Option<String>,
    /// Starting address
    #[arg(long, default_value = "")]
    origin: String,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum ExportFormatOpt {
    Json,
    Csv,
    Html,
}

impl From<ExportFormatOpt> for ExportFormat {
    fn from(opt: ExportFormatOpt) -> Self {
        match opt {
            ExportFormatOpt::Json => ExportFormat::Json,
            ExportFormatOpt::Csv => ExportFormat::Csv,
            ExportFormatOpt::Html => ExportFormat::Html,
        }
    }
}

fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        match e.downcast_ref::<PharmacyError>() {
            Some(err) => eprintln!("Error: {}", err.user_message()),
            None => eprintln!("Error: {e:#}"),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = FinderConfig::load_from(cli.config.as_deref())?;
    if let Some(data) = cli.data {
        config.data_path = data;
    }
    let cell = DatasetCell::from_config(&config);
    set_global_config(config);

    match cli.command {
        Commands::Categories => cmd_categories(&cell),
        Commands::Search(args) => cmd_search(&cell, args),
        Commands::Directions(args) => cmd_directions(&cell, args),
        Commands::Stats => cmd_stats(&cell),
        #[cfg(feature = "interactive")]
        Commands::Interactive => interactive::run(&cell),
    }
}

fn load_dataset(cell: &DatasetCell) -> anyhow::Result<&PharmacyDataset> {
    if !cell.is_loaded() {
        tracing::debug!(source = %cell.source().display(), "loading pharmacy table");
    }
    Ok(cell.get_or_load()?)
}

/// Config for one command, with the selection flags applied
fn selection_config(selection: &SelectionArgs) -> FinderConfig {
    let mut config = global_config();
    if selection.exact {
        config.match_mode = MatchMode::ExactToken;
    }
    config
}

fn warn_unknown_categories(dataset: &PharmacyDataset, selection: &SelectionArgs) {
    let unknown = dataset.unknown_categories(&selection.categories);
    if !unknown.is_empty() {
        tracing::warn!(
            categories = ?unknown,
            "not listed by any pharmacy; run `pfcli categories` to see the available labels"
        );
    }
}

fn cmd_categories(cell: &DatasetCell) -> anyhow::Result<()> {
    let config = global_config();
    let dataset = load_dataset(cell)?;
    let grid = CheckboxGrid::new(&dataset.categories(), &[] as &[String], config.grid_columns);
    print_grid(&grid);
    Ok(())
}

fn cmd_search(cell: &DatasetCell, args: SearchArgs) -> anyhow::Result<()> {
    let config = selection_config(&args.selection);
    let dataset = load_dataset(cell)?;
    warn_unknown_categories(dataset, &args.selection);
    let page = render(&ViewState::with_categories(args.selection.categories), dataset, &config);

    if args.json {
        let stdout = std::io::stdout();
        JsonExporter::new().write(&page, &mut stdout.lock())?;
    } else {
        print_page(&page);
    }

    if let Some(path) = &args.map {
        page.export_map(path)
            .with_context(|| format!("failed to write map to {}", path.display()))?;
        eprintln!("Map written to {}", path.display());
    }

    if let Some(path) = &args.export {
        let format = args.format.map(ExportFormat::from).unwrap_or(config.default_export_format);
        page.export(path, format)
            .with_context(|| format!("failed to export {} to {}", format, path.display()))?;
        eprintln!("Exported to {}", path.display());
    }

    Ok(())
}

fn cmd_directions(cell: &DatasetCell, args: DirectionsArgs) -> anyhow::Result<()> {
    let config = selection_config(&args.selection);
    let dataset = load_dataset(cell)?;
    warn_unknown_categories(dataset, &args.selection);
    let state = ViewState {
        checked: args.selection.categories,
        pharmacy: args.pharmacy,
        origin: args.origin,
        directions_requested: true,
    };
    let page = render(&state, dataset, &config);
    print_notices(&page.notices);

    match page.directions() {
        Some(panel) => print_directions(panel),
        None => println!("No pharmacies on the map to get directions to."),
    }
    Ok(())
}

fn cmd_stats(cell: &DatasetCell) -> anyhow::Result<()> {
    let dataset = load_dataset(cell)?;
    dataset.statistics().print_summary();

    let top = dataset.analytics().top_categories(10);
    if !top.is_empty() {
        println!("\nTop Categories:");
        for (label, count) in top {
            println!("  {label}: {count} pharmacies");
        }
    }
    Ok(())
}

fn print_grid(grid: &CheckboxGrid) {
    let width = grid.iter().map(|c| c.label.chars().count()).max().unwrap_or(0);
    for row in 0..grid.row_count() {
        let line: Vec<String> = (0..grid.column_count())
            .filter_map(|col| grid.cell(row, col))
            .map(|c| {
                let mark = if c.checked { "x" } else { " " };
                format!("[{mark}] {:<width$}", c.label)
            })
            .collect();
        println!("{}", line.join("  ").trim_end());
    }
}

fn print_notices(notices: &[Notice]) {
    for notice in notices {
        let prefix = match notice.level {
            NoticeLevel::Error => "✖",
            NoticeLevel::Warning => "⚠",
            NoticeLevel::Info => "ℹ",
            NoticeLevel::Success => "✔",
        };
        println!("{prefix} {}", notice.message);
    }
}

fn print_page(page: &PageView) {
    println!("{}\n", page.title);
    print_notices(&page.notices);

    if let Some(table) = page.table() {
        if !table.rows.is_empty() {
            println!("\n{}", table.headers.join(" | "));
            for row in &table.rows {
                println!("{} | {} | {} | {}", row.name, row.address, row.phone, row.categories);
            }
        }
    }

    if let Some(MapView::Located { bounds, markers, .. }) = page.map() {
        println!("\nMap ({} markers, {} to {}):", markers.len(), bounds.south_west, bounds.north_east);
        for marker in markers {
            println!("  📍 {} ({})", marker.tooltip, marker.position);
        }
    }

    if let Some(panel) = page.directions() {
        println!("\nDirections available to: {}", panel.options.join(", "));
    }
}

fn print_directions(panel: &DirectionsPanel) {
    if let Some(outcome) = &panel.outcome {
        print_notices(&outcome.notices);
        if let Some(route) = &outcome.route {
            println!("Route: {}", route.summary);
        }
        if let Some(url) = &outcome.map_url {
            println!("Open in maps: {url}");
        }
    }
}

#[cfg(feature = "interactive")]
mod interactive {
    use super::*;
    use dialoguer::{Input, MultiSelect, Select};

    /// Each event re-renders the page; the dataset is read once
    pub fn run(cell: &DatasetCell) -> anyhow::Result<()> {
        let config = &global_config();
        let mut state = ViewState::default();
        print_page(&render(&state, load_dataset(cell)?, config));

        loop {
            let action = Select::new()
                .with_prompt("What next?")
                .items(&["Choose categories", "Get directions", "Quit"])
                .default(0)
                .interact()?;

            let dataset = cell.get_or_load()?;
            match action {
                0 => choose_categories(&mut state, dataset)?,
                1 => {
                    let page = render(&state, dataset, config);
                    let Some(panel) = page.directions() else {
                        println!("No pharmacies on the map yet. Choose categories first.");
                        continue;
                    };
                    choose_route(&mut state, panel)?;
                }
                _ => return Ok(()),
            }

            let page = render(&state, dataset, config);
            print_page(&page);
            if let Some(panel) = page.directions() {
                print_directions(panel);
            }
            state.directions_requested = false;
        }
    }

    fn choose_categories(state: &mut ViewState, dataset: &PharmacyDataset) -> anyhow::Result<()> {
        let categories = dataset.categories();
        let defaults: Vec<bool> = categories.iter().map(|c| state.checked.contains(c)).collect();
        let picked = MultiSelect::new()
            .with_prompt("Medication categories (space to toggle)")
            .items(&categories)
            .defaults(&defaults)
            .interact()?;

        // Keep the order in which categories were first checked
        for (i, label) in categories.iter().enumerate() {
            if picked.contains(&i) != defaults[i] {
                toggle(&mut state.checked, label);
            }
        }
        Ok(())
    }

    fn choose_route(state: &mut ViewState, panel: &DirectionsPanel) -> anyhow::Result<()> {
        let current = panel.selected
            .as_ref()
            .and_then(|s| panel.options.iter().position(|o| o == s))
            .unwrap_or(0);
        let choice = Select::new()
            .with_prompt("Pharmacy")
            .items(&panel.options)
            .default(current)
            .interact()?;
        let origin: String = Input::new()
            .with_prompt("Starting address")
            .with_initial_text(state.origin.clone())
            .allow_empty(true)
            .interact_text()?;

        state.pharmacy = panel.options.get(choice).cloned();
        state.origin = origin;
        state.directions_requested = true;
        Ok(())
    }
}
