//! 非直角座標圖表的排版計算，皆為純函式。
//!
//! 角度以弧度表示，從十二點鐘方向順時針量；螢幕座標向右、向下遞增。

use crate::domain::model::HierNode;
use crate::utils::error::{ChartError, Result};
use std::f64::consts::{PI, TAU};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn inset(&self, padding: f64) -> Rect {
        let dx = padding.min(self.width() / 2.0);
        let dy = padding.min(self.height() / 2.0);
        Rect::new(self.x0 + dx, self.y0 + dy, self.x1 - dx, self.y1 - dy)
    }

    pub fn corners(&self) -> [(i32, i32); 2] {
        [
            (self.x0.round() as i32, self.y0.round() as i32),
            (self.x1.round() as i32, self.y1.round() as i32),
        ]
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// 依數值比例切分整圈，負值與非數字視為 0
pub fn proportion_angles(values: &[f64]) -> Vec<(f64, f64)> {
    let total: f64 = values.iter().copied().map(sanitize).sum();
    let mut start = 0.0;

    values
        .iter()
        .map(|value| {
            let sweep = if total > 0.0 {
                sanitize(*value) / total * TAU
            } else {
                0.0
            };
            let span = (start, start + sweep);
            start += sweep;
            span
        })
        .collect()
}

fn polar(center: (f64, f64), radius: f64, angle: f64) -> (i32, i32) {
    (
        (center.0 + radius * angle.sin()).round() as i32,
        (center.1 - radius * angle.cos()).round() as i32,
    )
}

/// 環狀扇形的多邊形頂點；inner 為 0 時為一般扇形
pub fn annular_sector(
    center: (f64, f64),
    inner: f64,
    outer: f64,
    start: f64,
    end: f64,
) -> Vec<(i32, i32)> {
    let sweep = end - start;
    let steps = ((sweep / (PI / 90.0)).ceil() as usize).max(2);

    let mut points: Vec<(i32, i32)> = (0..=steps)
        .map(|i| polar(center, outer, start + sweep * i as f64 / steps as f64))
        .collect();

    if inner > 0.0 {
        points.extend(
            (0..=steps)
                .rev()
                .map(|i| polar(center, inner, start + sweep * i as f64 / steps as f64)),
        );
    } else {
        points.push((center.0.round() as i32, center.1.round() as i32));
    }

    points
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunnelLayer {
    /// 原始資料的索引
    pub source: usize,
    pub points: [(i32, i32); 4],
}

/// 漏斗圖：依數值由大到小排列，寬度與最大值成比例
pub fn funnel_layers(values: &[f64], area: Rect) -> Vec<FunnelLayer> {
    if values.is_empty() {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|a, b| sanitize(values[*b]).total_cmp(&sanitize(values[*a])));

    let max = sanitize(values[order[0]]);
    let width_of = |value: f64| {
        if max > 0.0 {
            sanitize(value) / max * area.width()
        } else {
            0.0
        }
    };

    let center_x = area.x0 + area.width() / 2.0;
    let layer_height = area.height() / order.len() as f64;

    order
        .iter()
        .enumerate()
        .map(|(position, &source)| {
            let top = width_of(values[source]) / 2.0;
            let bottom = order
                .get(position + 1)
                .map(|next| width_of(values[*next]) / 2.0)
                .unwrap_or(0.0);
            let y0 = area.y0 + layer_height * position as f64;
            let y1 = y0 + layer_height;

            FunnelLayer {
                source,
                points: [
                    ((center_x - top).round() as i32, y0.round() as i32),
                    ((center_x + top).round() as i32, y0.round() as i32),
                    ((center_x + bottom).round() as i32, y1.round() as i32),
                    ((center_x - bottom).round() as i32, y1.round() as i32),
                ],
            }
        })
        .collect()
}

/// 節點權重：有 value 用 value，否則加總子節點
pub fn node_weight(node: &HierNode) -> Result<f64> {
    if let Some(value) = node.value_f64() {
        return Ok(sanitize(value));
    }

    if node.is_leaf() {
        return Err(ChartError::RenderError {
            message: format!("node '{}' has no numeric value", node.name),
        });
    }

    node.children.iter().map(node_weight).sum()
}

pub fn max_depth(nodes: &[HierNode]) -> usize {
    nodes
        .iter()
        .map(|node| 1 + max_depth(&node.children))
        .max()
        .unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub name: String,
    pub depth: usize,
    /// 所屬第一層節點的索引，用於配色
    pub root: usize,
    pub rect: Rect,
}

const TREEMAP_PADDING: f64 = 3.0;

/// Slice-and-dice 排版，偶數層水平切分、奇數層垂直切分
pub fn treemap_layout(nodes: &[HierNode], area: Rect) -> Result<Vec<Tile>> {
    let mut tiles = Vec::new();
    slice_and_dice(nodes, area, 0, None, &mut tiles)?;
    Ok(tiles)
}

fn slice_and_dice(
    nodes: &[HierNode],
    area: Rect,
    depth: usize,
    root: Option<usize>,
    tiles: &mut Vec<Tile>,
) -> Result<()> {
    let weights = nodes.iter().map(node_weight).collect::<Result<Vec<f64>>>()?;
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Ok(());
    }

    let horizontal = depth % 2 == 0;
    let mut offset = 0.0;

    for (index, (node, weight)) in nodes.iter().zip(&weights).enumerate() {
        let fraction = weight / total;
        let rect = if horizontal {
            let x0 = area.x0 + area.width() * offset;
            Rect::new(x0, area.y0, x0 + area.width() * fraction, area.y1)
        } else {
            let y0 = area.y0 + area.height() * offset;
            Rect::new(area.x0, y0, area.x1, y0 + area.height() * fraction)
        };
        offset += fraction;

        let root = root.unwrap_or(index);
        tiles.push(Tile {
            name: node.name.clone(),
            depth,
            root,
            rect,
        });

        if !node.is_leaf() {
            slice_and_dice(
                &node.children,
                rect.inset(TREEMAP_PADDING),
                depth + 1,
                Some(root),
                tiles,
            )?;
        }
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sector {
    pub name: String,
    pub depth: usize,
    pub root: usize,
    pub inner: f64,
    pub outer: f64,
    pub start: f64,
    pub end: f64,
}

/// 旭日圖：每一層一圈，子節點在父節點的角度範圍內依權重切分
pub fn sunburst_layout(nodes: &[HierNode], radius: f64) -> Result<Vec<Sector>> {
    let depth = max_depth(nodes);
    if depth == 0 {
        return Ok(Vec::new());
    }

    let hole = radius * 0.15;
    let ring = (radius - hole) / depth as f64;
    let mut sectors = Vec::new();
    place_rings(nodes, 0.0, TAU, 0, None, hole, ring, &mut sectors)?;
    Ok(sectors)
}

#[allow(clippy::too_many_arguments)]
fn place_rings(
    nodes: &[HierNode],
    start: f64,
    end: f64,
    depth: usize,
    root: Option<usize>,
    hole: f64,
    ring: f64,
    sectors: &mut Vec<Sector>,
) -> Result<()> {
    let weights = nodes.iter().map(node_weight).collect::<Result<Vec<f64>>>()?;
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Ok(());
    }

    let mut angle = start;
    for (index, (node, weight)) in nodes.iter().zip(&weights).enumerate() {
        let sweep = (end - start) * weight / total;
        let root = root.unwrap_or(index);

        sectors.push(Sector {
            name: node.name.clone(),
            depth,
            root,
            inner: hole + ring * depth as f64,
            outer: hole + ring * (depth + 1) as f64,
            start: angle,
            end: angle + sweep,
        });

        place_rings(
            &node.children,
            angle,
            angle + sweep,
            depth + 1,
            Some(root),
            hole,
            ring,
            sectors,
        )?;
        angle += sweep;
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedNode {
    pub name: String,
    pub depth: usize,
    /// 葉節點依序編號，父節點取子節點的中點
    pub slot: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeLayout {
    pub nodes: Vec<PlacedNode>,
    pub edges: Vec<(usize, usize)>,
    pub leaf_count: usize,
    pub depth: usize,
}

/// 由左至右的分層樹狀排版
///
/// 排版本身不需要權重，但與其他階層圖一致，缺少數值的節點一樣回報錯誤。
pub fn tree_layout(roots: &[HierNode]) -> Result<TreeLayout> {
    for root in roots {
        node_weight(root)?;
    }

    let mut layout = TreeLayout {
        depth: max_depth(roots),
        ..TreeLayout::default()
    };

    for root in roots {
        place_tree(root, 0, &mut layout);
    }

    Ok(layout)
}

fn place_tree(node: &HierNode, depth: usize, layout: &mut TreeLayout) -> usize {
    let index = layout.nodes.len();
    layout.nodes.push(PlacedNode {
        name: node.name.clone(),
        depth,
        slot: 0.0,
    });

    let slot = if node.is_leaf() {
        let slot = layout.leaf_count as f64;
        layout.leaf_count += 1;
        slot
    } else {
        let children: Vec<usize> = node
            .children
            .iter()
            .map(|child| place_tree(child, depth + 1, layout))
            .collect();
        for child in &children {
            layout.edges.push((index, *child));
        }
        let first = layout.nodes[children[0]].slot;
        let last = layout.nodes[children[children.len() - 1]].slot;
        (first + last) / 2.0
    };

    layout.nodes[index].slot = slot;
    index
}
