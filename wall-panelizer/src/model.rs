use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tolerance used for exact-fit and coverage comparisons
pub const FIT_EPSILON: f64 = 1e-9;

/// HSV tag of the detected region a wall came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Hsv {
    pub hue: u8,
    pub saturation: u8,
    pub brightness: u8,
}

impl Hsv {
    pub fn new(hue: u8, saturation: u8, brightness: u8) -> Self {
        Self {
            hue,
            saturation,
            brightness,
        }
    }

    pub fn to_array(&self) -> [u8; 3] {
        [self.hue, self.saturation, self.brightness]
    }
}

/// A purchasable or stocked panel width
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// On-hand quantity; only consulted in inventory mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl CatalogEntry {
    pub fn new(width: f64) -> Self {
        Self {
            width,
            height: None,
            count: None,
        }
    }

    pub fn with_count(width: f64, count: u32) -> Self {
        Self {
            width,
            height: None,
            count: Some(count),
        }
    }

    pub fn height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }
}

/// Whether a panel is a genuine catalog width or a half cut of one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    Full,
    Half,
}

/// Allocation unit: one panel width and how many of it the wall needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub width: f64,
    pub height: f64,
    pub count: u32,
    pub kind: PanelKind,
}

impl Panel {
    pub fn new(width: f64, kind: PanelKind, count: u32) -> Self {
        Self {
            width,
            height: 0.0,
            count,
            kind,
        }
    }

    /// Length covered by all units of this panel across both wall halves
    pub fn covered_length(&self) -> f64 {
        self.width * f64::from(self.count)
    }

    fn same_shape(&self, other: &Panel) -> bool {
        self.kind == other.kind
            && (self.width - other.width).abs() <= FIT_EPSILON
            && (self.height - other.height).abs() <= FIT_EPSILON
    }
}

/// Index of a panel in its wall's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PanelId(usize);

impl PanelId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Panels of one decomposition, in allocation order
pub type Chain = Vec<PanelId>;

/// A detected wall and the panel chains allocated to it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Wall {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub color: Hsv,
    sides: Vec<f64>,
    panels: Vec<Panel>,
    chains: Vec<Chain>,
    heads: HashMap<PanelId, usize>,
}

impl Wall {
    pub fn new(color: Hsv) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    /// Wall measured as a rectangle with two raw sides
    pub fn from_rect_sides(color: Hsv, side1: f64, side2: f64) -> Self {
        let mut wall = Self::new(color);
        wall.sides = vec![side1, side2];
        wall
    }

    /// Wall measured between two user-selected corners
    pub fn from_side(color: Hsv, side: f64) -> Self {
        let mut wall = Self::new(color);
        wall.sides = vec![side];
        wall
    }

    /// Wall with a known length, bypassing detection and filtering
    pub fn with_length(length: f64) -> Self {
        let mut wall = Self::from_side(Hsv::default(), length);
        wall.length = length;
        wall
    }

    pub fn sides(&self) -> &[f64] {
        &self.sides
    }

    pub fn half_length(&self) -> f64 {
        self.length / 2.0
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn panel(&self, id: PanelId) -> &Panel {
        &self.panels[id.0]
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    /// Panels of one chain, resolved through the arena
    pub fn chain_panels(&self, chain: usize) -> impl Iterator<Item = &Panel> + '_ {
        self.chains[chain].iter().map(move |id| &self.panels[id.0])
    }

    /// Chain whose first panel is `head`
    pub fn chain_for_head(&self, head: PanelId) -> Option<&Chain> {
        self.heads.get(&head).map(|&idx| &self.chains[idx])
    }

    /// Head panels in chain order
    pub fn head_ids(&self) -> Vec<PanelId> {
        self.chains.iter().filter_map(|chain| chain.first().copied()).collect()
    }

    /// Length covered by a chain across both halves
    pub fn chain_coverage(&self, chain: usize) -> f64 {
        self.chain_panels(chain).map(Panel::covered_length).sum()
    }

    /// Places `panel` at the head of a new chain
    pub fn start_chain(&mut self, panel: Panel) -> PanelId {
        let id = self.push_panel(panel);
        self.chains.push(vec![id]);
        self.heads.insert(id, self.chains.len() - 1);
        id
    }

    /// Appends one shared `panel` to every chain headed by `heads`.
    /// With no heads the panel starts a new chain instead.
    pub fn extend_chains(&mut self, heads: &[PanelId], panel: Panel) -> PanelId {
        if heads.is_empty() {
            return self.start_chain(panel);
        }
        let id = self.push_panel(panel);
        for head in heads {
            if let Some(&chain) = self.heads.get(head) {
                self.chains[chain].push(id);
            }
        }
        id
    }

    /// Drops all allocated panels and chains
    pub fn clear_allocation(&mut self) {
        self.panels.clear();
        self.chains.clear();
        self.heads.clear();
    }

    /// Collapses panels of the same shape within each chain into one entry
    /// holding the summed count. A panel listed twice in a chain counts once.
    /// Panels no chain refers to afterwards are dropped from the arena, so
    /// previously returned `PanelId`s are invalidated.
    pub fn merge_duplicate_panels(&mut self) {
        for chain_idx in 0..self.chains.len() {
            if self.chains[chain_idx].len() < 2 {
                continue;
            }

            let chain = std::mem::take(&mut self.chains[chain_idx]);
            let old_head = chain[0];

            let mut groups: Vec<Vec<PanelId>> = Vec::new();
            for id in chain {
                let panel = &self.panels[id.0];
                match groups
                    .iter_mut()
                    .find(|group| self.panels[group[0].0].same_shape(panel))
                {
                    Some(group) => {
                        if !group.contains(&id) {
                            group.push(id);
                        }
                    }
                    None => groups.push(vec![id]),
                }
            }

            let mut merged = Vec::with_capacity(groups.len());
            for group in groups {
                if group.len() == 1 {
                    merged.push(group[0]);
                    continue;
                }
                let count = group.iter().map(|id| self.panels[id.0].count).sum();
                let panel = Panel {
                    count,
                    ..self.panels[group[0].0].clone()
                };
                merged.push(self.push_panel(panel));
            }

            let new_head = merged[0];
            self.chains[chain_idx] = merged;
            if new_head != old_head {
                self.heads.remove(&old_head);
                self.heads.insert(new_head, chain_idx);
            }
        }

        self.compact_panels();
    }

    /// Rebuilds the arena from the panels the chains still reference,
    /// numbered in chain order
    fn compact_panels(&mut self) {
        let mut remap: HashMap<PanelId, PanelId> = HashMap::new();
        let mut panels = Vec::new();

        for chain in &mut self.chains {
            for id in chain.iter_mut() {
                let old = *id;
                *id = *remap.entry(old).or_insert_with(|| {
                    panels.push(self.panels[old.0].clone());
                    PanelId(panels.len() - 1)
                });
            }
        }

        self.heads = self
            .chains
            .iter()
            .enumerate()
            .filter_map(|(idx, chain)| chain.first().map(|&head| (head, idx)))
            .collect();
        self.panels = panels;
    }

    fn push_panel(&mut self, panel: Panel) -> PanelId {
        self.panels.push(panel);
        PanelId(self.panels.len() - 1)
    }
}
