//! panelize - plan wall panels for a floor plan image
//!
//! Runs the wall detector on the image (or reads an existing detection
//! file), filters out noise, and writes a wishlist plan and, when an
//! inventory is given, an inventory-constrained plan.

mod config;
mod detector;

use anyhow::{Context, Result};
use clap::Parser;
use config::PanelizeConfig;
use std::path::{Path, PathBuf};
use tracing::info;
use wall_panelizer::{
    default_output_path, load_catalog, plan_walls, read_detection_file, write_plan_file,
    write_report, AllocationMode, CatalogEntry, CatalogKind, DetectionMode, PlanReport,
    PlanSection, Wall, INVENTORY_SUFFIX, WISHLIST_SUFFIX,
};

/// Plan wall panels for a floor plan image
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Floor plan image handed to the wall detector
    #[arg(value_name = "IMAGE")]
    image: PathBuf,

    /// Panel catalog CSV used for the wishlist plan
    #[arg(long, value_name = "CSV")]
    catalog: PathBuf,

    /// Inventory CSV with on-hand quantities
    #[arg(long, value_name = "CSV")]
    inventory: Option<PathBuf>,

    /// Real-world units per detected pixel
    #[arg(long, value_name = "F")]
    scale: Option<f64>,

    /// Minimum long/short side ratio for a detection to count as a wall
    #[arg(long, value_name = "F")]
    noise_threshold: Option<f64>,

    /// Walls were marked by selecting their two end points
    #[arg(long)]
    corner: bool,

    /// Existing detection file; skips running the detector
    #[arg(long, value_name = "CSV")]
    walls: Option<PathBuf>,

    /// Wishlist plan output [default: <IMAGE>.wishList.csv]
    #[arg(long, value_name = "CSV")]
    wishlist_out: Option<PathBuf>,

    /// Inventory plan output [default: <IMAGE>.inventoryList.csv]
    #[arg(long, value_name = "CSV")]
    inventory_out: Option<PathBuf>,

    /// Also write a JSON report of every plan
    #[arg(long, value_name = "JSON")]
    report: Option<PathBuf>,

    /// Combine same-width panels within each chain
    #[arg(long)]
    merge_duplicates: bool,

    /// TOML configuration file
    #[arg(long, value_name = "TOML")]
    config: Option<PathBuf>,
}

impl Cli {
    fn detection_mode(&self) -> DetectionMode {
        if self.corner {
            DetectionMode::CornerSelection
        } else {
            DetectionMode::Rectangle
        }
    }

    /// Flags win over the config file
    fn apply_overrides(&self, config: &mut PanelizeConfig) {
        if let Some(scale) = self.scale {
            config.filter.scale = scale;
        }
        if let Some(threshold) = self.noise_threshold {
            config.filter.noise_threshold = threshold;
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = PanelizeConfig::load_or_default(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    let mode = cli.detection_mode();
    let walls = detect_walls(cli, &config, mode)?;
    let walls = config.filter.filter_walls(walls, mode);

    let mut report = PlanReport {
        image: Some(cli.image.display().to_string()),
        plans: Vec::new(),
    };

    let catalog = load_catalog(&cli.catalog, CatalogKind::Wishlist)
        .context(format!("Failed to load catalog {}", cli.catalog.display()))?;
    let wishlist = plan(&walls, &catalog, AllocationMode::Wishlist, cli.merge_duplicates);
    let out = cli
        .wishlist_out
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.image, WISHLIST_SUFFIX));
    write_plan_file(&out, &wishlist).context(format!("Failed to write {}", out.display()))?;
    report.plans.push(PlanSection::new(AllocationMode::Wishlist, &wishlist));

    match &cli.inventory {
        Some(path) => {
            let inventory = load_catalog(path, CatalogKind::Inventory)
                .context(format!("Failed to load inventory {}", path.display()))?;
            let planned = plan(&walls, &inventory, AllocationMode::Inventory, cli.merge_duplicates);
            let out = cli
                .inventory_out
                .clone()
                .unwrap_or_else(|| default_output_path(&cli.image, INVENTORY_SUFFIX));
            write_plan_file(&out, &planned).context(format!("Failed to write {}", out.display()))?;
            report.plans.push(PlanSection::new(AllocationMode::Inventory, &planned));
        }
        None => info!("No inventory given, skipping inventory plan"),
    }

    if let Some(path) = &cli.report {
        write_report(path, &report).context(format!("Failed to write report {}", path.display()))?;
    }

    Ok(())
}

fn detect_walls(cli: &Cli, config: &PanelizeConfig, mode: DetectionMode) -> Result<Vec<Wall>> {
    let path = match &cli.walls {
        Some(path) => path.clone(),
        None => {
            let output = detector::detection_output_path(&cli.image);
            if !detector::run_detector(&config.detector, &cli.image, &output, mode) {
                info!(
                    "Detector did not finish, reading whatever it left in {}",
                    output.display()
                );
            }
            output
        }
    };

    read_walls(&path, mode)
}

fn read_walls(path: &Path, mode: DetectionMode) -> Result<Vec<Wall>> {
    read_detection_file(path, mode).context(format!("Failed to read walls from {}", path.display()))
}

fn plan(walls: &[Wall], catalog: &[CatalogEntry], mode: AllocationMode, merge: bool) -> Vec<Wall> {
    let mut planned = plan_walls(walls, catalog, mode);
    if merge {
        planned.iter_mut().for_each(Wall::merge_duplicate_panels);
    }
    info!("{} plan covers {} walls", mode.as_str(), planned.len());
    planned
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "panelize",
            "--catalog",
            "panels.csv",
            "--inventory",
            "stock.csv",
            "--scale",
            "0.1",
            "--corner",
            "--merge-duplicates",
            "house.png",
        ])
        .unwrap();

        assert_eq!(cli.image, PathBuf::from("house.png"));
        assert_eq!(cli.inventory, Some(PathBuf::from("stock.csv")));
        assert_eq!(cli.detection_mode(), DetectionMode::CornerSelection);
        assert!(cli.merge_duplicates);
    }

    #[test]
    fn test_catalog_is_required() {
        assert!(Cli::try_parse_from(["panelize", "house.png"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "panelize",
            "--catalog",
            "panels.csv",
            "--noise-threshold",
            "3",
            "house.png",
        ])
        .unwrap();

        let mut config = PanelizeConfig::default();
        config.filter.scale = 0.5;
        config.filter.noise_threshold = 9.0;
        cli.apply_overrides(&mut config);

        assert_eq!(config.filter.scale, 0.5);
        assert_eq!(config.filter.noise_threshold, 3.0);
    }

    #[test]
    fn test_failed_detector_yields_no_walls() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("house.png");
        let cli = Cli::try_parse_from([
            "panelize".into(),
            "--catalog".into(),
            dir.path().join("panels.csv").into_os_string(),
            image.into_os_string(),
        ])
        .unwrap();

        let mut config = PanelizeConfig::default();
        config.detector.program = "panelize-detector-that-does-not-exist".to_string();

        let walls = detect_walls(&cli, &config, DetectionMode::Rectangle).unwrap();
        assert!(walls.is_empty());
    }

    #[test]
    fn test_run_with_existing_walls() {
        let dir = tempfile::tempdir().unwrap();
        let walls = dir.path().join("walls.csv");
        std::fs::write(
            &walls,
            "\"(0, 255, 255)\",\"(0, 0)\",\"(200, 0)\",\"(200, 10)\",\"(0, 10)\"\n",
        )
        .unwrap();
        let catalog = dir.path().join("panels.csv");
        std::fs::write(&catalog, "Width\n4\n6\n").unwrap();
        let inventory = dir.path().join("stock.csv");
        std::fs::write(&inventory, "Width,Qty\n4,3\n6,10\n").unwrap();
        let image = dir.path().join("house.png");

        let cli = Cli::try_parse_from([
            "panelize".into(),
            "--catalog".into(),
            catalog.into_os_string(),
            "--inventory".into(),
            inventory.into_os_string(),
            "--walls".into(),
            walls.into_os_string(),
            "--scale".into(),
            "0.1".into(),
            "--report".into(),
            dir.path().join("plan.json").into_os_string(),
            image.into_os_string(),
        ])
        .unwrap();
        run(&cli).unwrap();

        let wishlist = std::fs::read_to_string(dir.path().join("house.wishList.csv")).unwrap();
        assert_eq!(wishlist.lines().nth(1), Some("\"20\",\"0\",\"0\",\"4, 2\",\"4, 2\""));

        let inventory = std::fs::read_to_string(dir.path().join("house.inventoryList.csv")).unwrap();
        assert_eq!(inventory.lines().nth(1), Some("\"20\",\"0\",\"0\",\"6, 4\",\"2, 2\""));

        let report = std::fs::read_to_string(dir.path().join("plan.json")).unwrap();
        assert!(report.contains("\"bill_of_materials\""));
    }
}
