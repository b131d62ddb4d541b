use crate::allocator::AllocationMode;
use crate::error::Result;
use crate::model::{PanelKind, Wall};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

/// JSON view of every plan produced in one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanReport {
    pub image: Option<String>,
    pub plans: Vec<PlanSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSection {
    pub mode: AllocationMode,
    pub walls: Vec<WallReport>,
    /// Panels to buy or pull, summed over each wall's primary chain
    pub bill_of_materials: Vec<PanelReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallReport {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub color: [u8; 3],
    pub sides: Vec<f64>,
    pub chains: Vec<Vec<PanelReport>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelReport {
    pub width: f64,
    pub count: u32,
    pub kind: PanelKind,
}

impl WallReport {
    pub fn from_wall(wall: &Wall) -> Self {
        let chains = (0..wall.chains().len())
            .map(|chain| {
                wall.chain_panels(chain)
                    .map(|panel| PanelReport {
                        width: panel.width,
                        count: panel.count,
                        kind: panel.kind,
                    })
                    .collect()
            })
            .collect();

        Self {
            length: wall.length,
            width: wall.width,
            height: wall.height,
            color: wall.color.to_array(),
            sides: wall.sides().to_vec(),
            chains,
        }
    }
}

impl PlanSection {
    pub fn new(mode: AllocationMode, walls: &[Wall]) -> Self {
        let walls: Vec<WallReport> = walls.iter().map(WallReport::from_wall).collect();

        let mut bill_of_materials: Vec<PanelReport> = Vec::new();
        for panel in walls.iter().filter_map(|wall| wall.chains.first()).flatten() {
            match bill_of_materials
                .iter_mut()
                .find(|line| line.kind == panel.kind && line.width == panel.width)
            {
                Some(line) => line.count += panel.count,
                None => bill_of_materials.push(panel.clone()),
            }
        }

        Self {
            mode,
            walls,
            bill_of_materials,
        }
    }
}

pub fn write_report(path: &Path, report: &PlanReport) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(file, report)?;
    info!("Wrote plan report to {}", path.display());
    Ok(())
}
