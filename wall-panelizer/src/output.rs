use crate::error::Result;
use crate::model::Wall;
use csv::{QuoteStyle, WriterBuilder};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub const OUTPUT_HEADER: [&str; 5] = [
    "Wall Length (ft)",
    "Wall Width (ft)",
    "Wall Height (ft)",
    "Panel Width (ft)",
    "Number of Panels",
];

pub const WISHLIST_SUFFIX: &str = ".wishList";
pub const INVENTORY_SUFFIX: &str = ".inventoryList";

/// `<image without extension><suffix>.csv`
pub fn default_output_path(image: &Path, suffix: &str) -> PathBuf {
    let mut name = image.with_extension("").into_os_string();
    name.push(suffix);
    name.push(".csv");
    PathBuf::from(name)
}

/// Number with at most six decimals and no trailing zeros
pub fn format_dimension(value: f64) -> String {
    let text = format!("{:.6}", value);
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Panel widths and unit counts of one chain, each `", "`-joined
fn chain_fields(wall: &Wall, chain: usize) -> (String, String) {
    let widths: Vec<String> = wall.chain_panels(chain).map(|p| format_dimension(p.width)).collect();
    let counts: Vec<String> = wall.chain_panels(chain).map(|p| p.count.to_string()).collect();
    (widths.join(", "), counts.join(", "))
}

/// Write walls in the plan CSV layout: one row per chain, the first carrying
/// the wall dimensions and the rest indented by three empty fields
pub fn write_plan<W: Write>(mut sink: W, walls: &[Wall]) -> Result<()> {
    writeln!(sink, "{}", OUTPUT_HEADER.join(","))?;

    let mut writer = WriterBuilder::new()
        .flexible(true)
        .quote_style(QuoteStyle::Always)
        .from_writer(sink);

    for wall in walls {
        let length = format_dimension(wall.length);
        let width = format_dimension(wall.width);
        let height = format_dimension(wall.height);

        if wall.chains().is_empty() {
            writer.write_record([&length, &width, &height])?;
            continue;
        }

        for chain in 0..wall.chains().len() {
            let (widths, counts) = chain_fields(wall, chain);
            if chain == 0 {
                writer.write_record([&length, &width, &height, &widths, &counts])?;
            } else {
                writer.write_record(["", "", "", widths.as_str(), counts.as_str()])?;
            }
        }
    }

    let mut sink = writer.into_inner().map_err(|e| e.into_error())?;
    sink.flush()?;
    Ok(())
}

pub fn write_plan_file(path: &Path, walls: &[Wall]) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    write_plan(file, walls)?;
    info!("Wrote {} walls to {}", walls.len(), path.display());
    Ok(())
}
