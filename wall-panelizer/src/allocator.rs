//! Best-fit panel allocation.
//!
//! Walls are symmetric about their midpoint, so the search runs on the
//! half-length and every unit count is doubled to cover both halves.
//!
//! Each wall is filled in two passes. The first pass covers the half-length
//! with one panel width; the second covers the leftover of that pass with
//! another width and appends it to the chain started by the first. Whole
//! catalog widths are always tried before half-width cuts, an exact fit beats
//! any approximate one, and among approximate fits the smallest leftover wins
//! with ties going to the earlier candidate.

use crate::model::{CatalogEntry, Panel, PanelId, PanelKind, Wall, FIT_EPSILON};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Whether on-hand quantities limit the allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMode {
    /// Any catalog width may be used in any amount
    Wishlist,
    /// Counts are drawn from a wall-local copy of the catalog quantities
    Inventory,
}

impl AllocationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationMode::Wishlist => "wishlist",
            AllocationMode::Inventory => "inventory",
        }
    }
}

/// Outcome of allocating one wall
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocationSummary {
    pub half_length: f64,
    pub chains: usize,
    pub panels: u64,
    /// Unallocated length left on each half of the wall
    pub slack: f64,
}

/// Largest per-half count whose doubled unit count still fits a `u32`
const MAX_WHOLE: u32 = u32::MAX / 2;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    width: f64,
    kind: PanelKind,
    /// Catalog entry the candidate is cut from
    entry: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Fit {
    candidate: Candidate,
    whole: u32,
    remainder: f64,
}

impl Fit {
    fn evaluate(candidate: Candidate, space: f64) -> Option<Self> {
        if !space.is_finite() || space + FIT_EPSILON < candidate.width {
            return None;
        }
        let whole = ((space + FIT_EPSILON) / candidate.width).floor();
        if whole > f64::from(MAX_WHOLE) {
            debug!(
                "Skipping width {}: {} panels per half exceeds the unit counter",
                candidate.width, whole
            );
            return None;
        }
        let remainder = (space - whole * candidate.width).max(0.0);
        Some(Self {
            candidate,
            whole: whole as u32,
            remainder,
        })
    }

    fn is_exact(&self) -> bool {
        self.remainder <= FIT_EPSILON
    }

    /// Units needed on both halves of the wall
    fn units(&self) -> u32 {
        2 * self.whole
    }

    fn panel(&self) -> Panel {
        Panel::new(self.candidate.width, self.candidate.kind, self.units())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PassOutcome {
    Exact,
    Approximate { remainder: f64 },
    Nothing,
}

/// Wall-local inventory, counted in half panels so a cut panel can supply
/// two half-width pieces
#[derive(Debug, Clone)]
struct Stock {
    halves: Option<Vec<u64>>,
}

impl Stock {
    fn new(catalog: &[CatalogEntry], mode: AllocationMode) -> Self {
        let halves = match mode {
            AllocationMode::Wishlist => None,
            AllocationMode::Inventory => Some(
                catalog
                    .iter()
                    .map(|entry| 2 * u64::from(entry.count.unwrap_or(0)))
                    .collect(),
            ),
        };
        Self { halves }
    }

    fn can_take(&self, candidate: &Candidate, units: u32) -> bool {
        let Some(halves) = &self.halves else {
            return true;
        };
        let available = halves[candidate.entry];
        match candidate.kind {
            PanelKind::Full => u64::from(units) <= available / 2,
            PanelKind::Half => u64::from(units) <= available,
        }
    }

    fn take(&mut self, candidate: &Candidate, units: u32) {
        if let Some(halves) = &mut self.halves {
            let used = match candidate.kind {
                PanelKind::Full => 2 * u64::from(units),
                PanelKind::Half => u64::from(units),
            };
            halves[candidate.entry] -= used;
        }
    }
}

/// Allocates catalog panels to walls
#[derive(Debug, Clone)]
pub struct PanelAllocator<'a> {
    catalog: &'a [CatalogEntry],
    mode: AllocationMode,
    full: Vec<Candidate>,
    halves: Vec<Candidate>,
}

impl<'a> PanelAllocator<'a> {
    pub fn new(catalog: &'a [CatalogEntry], mode: AllocationMode) -> Self {
        let usable = || {
            catalog
                .iter()
                .enumerate()
                .filter(|(_, entry)| entry.width.is_finite() && entry.width > 0.0)
        };
        let full = usable()
            .map(|(entry, e)| Candidate {
                width: e.width,
                kind: PanelKind::Full,
                entry,
            })
            .collect();
        let halves = usable()
            .map(|(entry, e)| Candidate {
                width: e.width / 2.0,
                kind: PanelKind::Half,
                entry,
            })
            .collect();

        Self {
            catalog,
            mode,
            full,
            halves,
        }
    }

    pub fn mode(&self) -> AllocationMode {
        self.mode
    }

    /// Replaces any previous allocation on `wall` with a fresh one
    pub fn allocate_wall(&self, wall: &mut Wall) -> AllocationSummary {
        wall.clear_allocation();
        let half_length = wall.half_length();
        let mut stock = Stock::new(self.catalog, self.mode);

        let mut summary = AllocationSummary {
            half_length,
            chains: 0,
            panels: 0,
            slack: half_length.max(0.0),
        };

        let fits_anywhere = self
            .full
            .iter()
            .chain(&self.halves)
            .any(|candidate| Fit::evaluate(*candidate, half_length).is_some());
        if !fits_anywhere {
            debug!("No panel fits wall of length {}", wall.length);
            return summary;
        }

        let leftover = match self.fill(wall, &mut stock, half_length, &[]) {
            PassOutcome::Exact => 0.0,
            PassOutcome::Approximate { remainder } => remainder,
            PassOutcome::Nothing => half_length,
        };

        summary.slack = leftover;
        if leftover > FIT_EPSILON {
            let heads = wall.head_ids();
            summary.slack = match self.fill(wall, &mut stock, leftover, &heads) {
                PassOutcome::Exact => 0.0,
                PassOutcome::Approximate { remainder } => remainder,
                PassOutcome::Nothing => leftover,
            };
        }

        summary.chains = wall.chains().len();
        summary.panels = wall.panels().iter().map(|panel| u64::from(panel.count)).sum();
        debug!(
            "Wall of length {}: {} chains, {} panels, {:.3} slack per half",
            wall.length, summary.chains, summary.panels, summary.slack
        );
        summary
    }

    /// Allocates every wall in order
    pub fn allocate_walls(&self, walls: &mut [Wall]) -> Vec<AllocationSummary> {
        let summaries: Vec<AllocationSummary> =
            walls.iter_mut().map(|wall| self.allocate_wall(wall)).collect();

        let unallocated = summaries.iter().filter(|s| s.chains == 0).count();
        info!(
            "Allocated {} walls in {} mode ({} without panels)",
            walls.len(),
            self.mode.as_str(),
            unallocated
        );
        summaries
    }

    /// One decomposition pass over `space`. With `heads` the allocated panel
    /// extends those chains; without, each allocation starts a new chain.
    fn fill(&self, wall: &mut Wall, stock: &mut Stock, space: f64, heads: &[PanelId]) -> PassOutcome {
        for tier in [&self.full, &self.halves] {
            let fits: Vec<Fit> = tier
                .iter()
                .filter_map(|candidate| Fit::evaluate(*candidate, space))
                .collect();
            if fits.is_empty() {
                continue;
            }

            let mut placed: Vec<Candidate> = Vec::new();
            for fit in fits.iter().filter(|fit| fit.is_exact()) {
                if is_redundant(&fit.candidate, &placed) {
                    continue;
                }
                if !self.place(wall, stock, fit, heads) {
                    continue;
                }
                if !heads.is_empty() {
                    return PassOutcome::Exact;
                }
                placed.push(fit.candidate);
            }
            if !placed.is_empty() {
                return PassOutcome::Exact;
            }

            for fit in rank_by_remainder(fits.into_iter().filter(|fit| !fit.is_exact()).collect()) {
                if self.place(wall, stock, &fit, heads) {
                    return PassOutcome::Approximate {
                        remainder: fit.remainder,
                    };
                }
            }
        }

        PassOutcome::Nothing
    }

    fn place(&self, wall: &mut Wall, stock: &mut Stock, fit: &Fit, heads: &[PanelId]) -> bool {
        let units = fit.units();
        if !stock.can_take(&fit.candidate, units) {
            debug!(
                "Not enough stock for {} x {} ({:?})",
                units, fit.candidate.width, fit.candidate.kind
            );
            return false;
        }
        stock.take(&fit.candidate, units);
        wall.extend_chains(heads, fit.panel());
        true
    }
}

/// Whether an exact fit repeats a decomposition already placed in this pass:
/// the same whole width, or a half whose parent width is already placed.
fn is_redundant(candidate: &Candidate, placed: &[Candidate]) -> bool {
    let same_width = |a: f64, b: f64| (a - b).abs() <= FIT_EPSILON;
    placed.iter().any(|other| match (candidate.kind, other.kind) {
        (PanelKind::Full, PanelKind::Full) | (PanelKind::Half, PanelKind::Half) => {
            same_width(candidate.width, other.width)
        }
        (PanelKind::Half, PanelKind::Full) => same_width(candidate.width * 2.0, other.width),
        (PanelKind::Full, PanelKind::Half) => false,
    })
}

/// Orders fits by remainder. A fit only moves ahead of an earlier one when
/// its remainder is smaller by more than the fit tolerance.
fn rank_by_remainder(mut fits: Vec<Fit>) -> Vec<Fit> {
    let mut ranked = Vec::with_capacity(fits.len());
    while !fits.is_empty() {
        let mut best = 0;
        for (i, fit) in fits.iter().enumerate().skip(1) {
            if fit.remainder < fits[best].remainder - FIT_EPSILON {
                best = i;
            }
        }
        ranked.push(fits.remove(best));
    }
    ranked
}

/// Clones `walls` and allocates the copies against `catalog`
pub fn plan_walls(walls: &[Wall], catalog: &[CatalogEntry], mode: AllocationMode) -> Vec<Wall> {
    let mut planned = walls.to_vec();
    PanelAllocator::new(catalog, mode).allocate_walls(&mut planned);
    planned
}
