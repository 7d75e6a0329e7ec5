//! `GridWorld`: a rectangular cost grid, 4- or 8-connected.
//!
//! Cell `(x, y)` is node `y * width + x`. Entering a cell costs the cell's
//! value; `infinity` cells are walls. Walls stay in the topology so that a
//! later cost change can open them.
//!
//! The heuristic is the step distance (Manhattan for [`Connectivity::Four`],
//! Chebyshev for [`Connectivity::Eight`]) times a scale that defaults to the
//! cheapest finite cell at construction. Every step enters at least one cell,
//! so the heuristic stays admissible as long as later changes never drop a
//! cell below that scale; callers expecting cheaper cells lower the scale
//! with [`GridWorld::with_heuristic_scale`].

use replan_kernel::cost::{cost_repr, Cost, INFINITE_COST};
use replan_search::contract::GraphProvider;
use replan_search::node::NodeId;
use serde_json::json;

use super::WorldError;
use crate::contract::WorldFixtureV1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    /// Orthogonal moves only.
    Four,
    /// Orthogonal and diagonal moves.
    Eight,
}

impl Connectivity {
    fn offsets(self) -> &'static [(isize, isize)] {
        match self {
            Self::Four => &[(0, -1), (-1, 0), (1, 0), (0, 1)],
            Self::Eight => &[
                (-1, -1),
                (0, -1),
                (1, -1),
                (-1, 0),
                (1, 0),
                (-1, 1),
                (0, 1),
                (1, 1),
            ],
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Four => "four",
            Self::Eight => "eight",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GridWorld {
    width: usize,
    height: usize,
    cells: Vec<Cost>,
    connectivity: Connectivity,
    heuristic_scale: Cost,
}

/// Result of [`GridWorld::parse`]: the world plus its marked endpoints.
#[derive(Debug, Clone)]
pub struct ParsedGrid {
    pub world: GridWorld,
    pub start: NodeId,
    pub goal: NodeId,
}

impl GridWorld {
    /// Build a grid from row-major cell costs.
    ///
    /// # Errors
    ///
    /// [`WorldError::EmptyGrid`] for a zero dimension,
    /// [`WorldError::GridShape`] if `cells.len() != width * height`.
    pub fn new(
        width: usize,
        height: usize,
        cells: Vec<Cost>,
        connectivity: Connectivity,
    ) -> Result<Self, WorldError> {
        if width == 0 || height == 0 {
            return Err(WorldError::EmptyGrid);
        }
        if cells.len() != width * height {
            return Err(WorldError::GridShape {
                row: cells.len() / width,
                expected: width * height,
                actual: cells.len(),
            });
        }
        let heuristic_scale = cells
            .iter()
            .copied()
            .filter(|c| c.is_finite() && *c >= 0.0)
            .fold(INFINITE_COST, Cost::min);
        let heuristic_scale = if heuristic_scale.is_finite() {
            heuristic_scale
        } else {
            0.0
        };
        Ok(Self {
            width,
            height,
            cells,
            connectivity,
            heuristic_scale,
        })
    }

    /// A grid where every cell costs 1.
    ///
    /// # Errors
    ///
    /// [`WorldError::EmptyGrid`] for a zero dimension.
    pub fn uniform(width: usize, height: usize, connectivity: Connectivity) -> Result<Self, WorldError> {
        Self::new(width, height, vec![1.0; width * height], connectivity)
    }

    /// Parse an ASCII map.
    ///
    /// `.` costs 1, `#` is a wall, digits `0`-`9` cost their value, `S` and
    /// `G` mark start and goal on cost-1 cells. Blank lines and surrounding
    /// whitespace are ignored.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownCell`], [`WorldError::GridShape`] for ragged rows,
    /// [`WorldError::MissingMarker`] / [`WorldError::DuplicateMarker`].
    pub fn parse(text: &str, connectivity: Connectivity) -> Result<ParsedGrid, WorldError> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let width = rows.first().map_or(0, |row| row.chars().count());
        let mut cells = Vec::with_capacity(width * rows.len());
        let mut start = None;
        let mut goal = None;

        for (y, row) in rows.iter().enumerate() {
            let actual = row.chars().count();
            if actual != width {
                return Err(WorldError::GridShape {
                    row: y,
                    expected: width,
                    actual,
                });
            }
            for (x, ch) in row.chars().enumerate() {
                let id = NodeId(y * width + x);
                let cost = match ch {
                    '.' => 1.0,
                    '#' => INFINITE_COST,
                    'S' => {
                        mark(&mut start, id, 'S')?;
                        1.0
                    }
                    'G' => {
                        mark(&mut goal, id, 'G')?;
                        1.0
                    }
                    d if d.is_ascii_digit() => Cost::from(d as u8 - b'0'),
                    other => return Err(WorldError::UnknownCell { x, y, ch: other }),
                };
                cells.push(cost);
            }
        }

        let world = Self::new(width, rows.len(), cells, connectivity)?;
        Ok(ParsedGrid {
            world,
            start: start.ok_or(WorldError::MissingMarker { marker: 'S' })?,
            goal: goal.ok_or(WorldError::MissingMarker { marker: 'G' })?,
        })
    }

    /// Override the heuristic scale.
    ///
    /// # Errors
    ///
    /// [`WorldError::InvalidHeuristic`] for a negative or non-finite scale.
    pub fn with_heuristic_scale(mut self, scale: Cost) -> Result<Self, WorldError> {
        if !scale.is_finite() || scale < 0.0 {
            return Err(WorldError::InvalidHeuristic {
                from: 0,
                to: 0,
                value: scale,
            });
        }
        self.heuristic_scale = scale;
        Ok(self)
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn cells(&self) -> &[Cost] {
        &self.cells
    }

    #[must_use]
    pub fn heuristic_scale(&self) -> Cost {
        self.heuristic_scale
    }

    /// Node handle of cell `(x, y)`, or `None` outside the grid.
    #[must_use]
    pub fn id(&self, x: usize, y: usize) -> Option<NodeId> {
        (x < self.width && y < self.height).then(|| NodeId(y * self.width + x))
    }

    /// Cell coordinates of `node`, or `None` outside the grid.
    #[must_use]
    pub fn coord(&self, node: NodeId) -> Option<(usize, usize)> {
        (node.index() < self.cells.len())
            .then(|| (node.index() % self.width, node.index() / self.width))
    }

    /// Overwrite the cost of cell `(x, y)`.
    ///
    /// # Errors
    ///
    /// [`WorldError::NodeOutOfRange`] for a coordinate outside the grid.
    pub fn set_cost(&mut self, x: usize, y: usize, cost: Cost) -> Result<(), WorldError> {
        let id = self.id(x, y).ok_or(WorldError::NodeOutOfRange {
            node: NodeId(y.saturating_mul(self.width).saturating_add(x)),
        })?;
        self.cells[id.index()] = cost;
        Ok(())
    }

    fn step_distance(&self, a: NodeId, b: NodeId) -> usize {
        let (ax, ay) = (a.index() % self.width, a.index() / self.width);
        let (bx, by) = (b.index() % self.width, b.index() / self.width);
        let (dx, dy) = (ax.abs_diff(bx), ay.abs_diff(by));
        match self.connectivity {
            Connectivity::Four => dx + dy,
            Connectivity::Eight => dx.max(dy),
        }
    }
}

fn mark(slot: &mut Option<NodeId>, id: NodeId, marker: char) -> Result<(), WorldError> {
    if slot.is_some() {
        return Err(WorldError::DuplicateMarker { marker });
    }
    *slot = Some(id);
    Ok(())
}

impl GraphProvider for GridWorld {
    fn node_count(&self) -> usize {
        self.cells.len()
    }

    fn neighbors(&self, node: NodeId) -> Vec<NodeId> {
        let Some((x, y)) = self.coord(node) else {
            return Vec::new();
        };
        self.connectivity
            .offsets()
            .iter()
            .filter_map(|&(dx, dy)| {
                let nx = x.checked_add_signed(dx)?;
                let ny = y.checked_add_signed(dy)?;
                self.id(nx, ny)
            })
            .collect()
    }

    fn cost(&self, node: NodeId) -> Cost {
        self.cells[node.index()]
    }

    #[allow(clippy::cast_precision_loss)]
    fn heuristic(&self, from: NodeId, to: NodeId) -> Cost {
        self.step_distance(from, to) as Cost * self.heuristic_scale
    }
}

impl WorldFixtureV1 for GridWorld {
    fn world_id(&self) -> &str {
        "grid"
    }

    fn fixture_json(&self) -> serde_json::Value {
        let cells: Vec<String> = self.cells.iter().map(|&c| cost_repr(c)).collect();
        json!({
            "world_id": self.world_id(),
            "width": self.width,
            "height": self.height,
            "connectivity": self.connectivity.as_str(),
            "heuristic_scale": cost_repr(self.heuristic_scale),
            "cells": cells,
        })
    }
}
