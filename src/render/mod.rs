pub mod layout;

use crate::domain::model::{
    AxisSpec, AxisValueKind, ChartKind, ChartOption, DerivedAxis, EncodedImage, HierNode,
    NameValue, RawRow, SeriesPoints, SeriesSpec,
};
use crate::domain::ports::Rasterizer;
use crate::utils::error::{ChartError, Result};
use layout::Rect;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::io::Cursor;

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;

/// ECharts 預設色盤
const PALETTE: [RGBColor; 9] = [
    RGBColor(0x54, 0x70, 0xc6),
    RGBColor(0x91, 0xcc, 0x75),
    RGBColor(0xfa, 0xc8, 0x58),
    RGBColor(0xee, 0x66, 0x66),
    RGBColor(0x73, 0xc0, 0xde),
    RGBColor(0x3b, 0xa2, 0x72),
    RGBColor(0xfc, 0x84, 0x52),
    RGBColor(0x9a, 0x60, 0xb4),
    RGBColor(0xea, 0x7c, 0xcc),
];

const TEXT_COLOR: RGBColor = RGBColor(0x33, 0x33, 0x33);
const EDGE_COLOR: RGBColor = RGBColor(0xcc, 0xcc, 0xcc);

type Canvas<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

fn color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

fn render_err<E: std::fmt::Display>(err: E) -> ChartError {
    ChartError::RenderError {
        message: err.to_string(),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlottersRasterizer {
    width: u32,
    height: u32,
}

impl PlottersRasterizer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Default for PlottersRasterizer {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl Rasterizer for PlottersRasterizer {
    fn rasterize(&self, option: &ChartOption) -> Result<EncodedImage> {
        let (width, height) = self.size();
        let mut buffer = vec![0u8; width as usize * height as usize * 3];

        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(render_err)?;

            let plot = root
                .titled(&option.title.text, ("sans-serif", 28).into_font().color(&TEXT_COLOR))
                .map_err(render_err)?;

            if let Some(series) = option.primary_series() {
                draw_series(&plot, option, series)?;
            }

            root.present().map_err(render_err)?;
        }

        encode_png(buffer, width, height)
    }
}

/// 將 RGB 緩衝區編碼為 PNG
pub fn encode_png(buffer: Vec<u8>, width: u32, height: u32) -> Result<EncodedImage> {
    let image = image::RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        ChartError::RenderError {
            message: format!("pixel buffer does not match {}x{}", width, height),
        }
    })?;

    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(render_err)?;

    Ok(EncodedImage::png(bytes))
}

fn draw_series(area: &Canvas<'_>, option: &ChartOption, series: &SeriesSpec) -> Result<()> {
    match (series.kind, &series.points) {
        (ChartKind::Bar | ChartKind::Line | ChartKind::Scatter, SeriesPoints::Rows(rows)) => {
            draw_cartesian(area, option, series, rows)
        }
        (ChartKind::Pie, SeriesPoints::NameValue(pairs)) => draw_pie(area, pairs),
        (ChartKind::Funnel, SeriesPoints::NameValue(pairs)) => draw_funnel(area, pairs),
        (ChartKind::Treemap, SeriesPoints::Tree(nodes)) => draw_treemap(area, nodes),
        (ChartKind::Sunburst, SeriesPoints::Tree(nodes)) => draw_sunburst(area, nodes),
        (ChartKind::Tree, SeriesPoints::Tree(nodes)) => draw_tree(area, nodes),
        (kind, _) => Err(ChartError::RenderError {
            message: format!("{} series carries an unexpected data payload", kind),
        }),
    }
}

/// 單一軸的座標對應：類別軸用列索引，數值軸用資料範圍
struct AxisScale {
    labels: Option<Vec<String>>,
    range: (f64, f64),
}

impl AxisScale {
    fn from_axis(axis: Option<&AxisSpec>, rows: &[RawRow], column: usize) -> Self {
        let category = axis.is_some_and(|spec| spec.value_kind == AxisValueKind::Category);

        if category {
            let labels: Vec<String> = rows.iter().map(|row| row.column(column).to_string()).collect();
            let upper = labels.len().max(1) as f64 - 0.5;
            return Self {
                labels: Some(labels),
                range: (-0.5, upper),
            };
        }

        let values: Vec<f64> = rows
            .iter()
            .filter_map(|row| row.get(column).and_then(|v| v.as_f64()))
            .collect();
        let min = values.iter().copied().fold(0.0_f64, f64::min);
        let max = values.iter().copied().fold(0.0_f64, f64::max);
        let padding = ((max - min) * 0.1).max(1.0);

        Self {
            labels: None,
            range: (
                if min < 0.0 { min - padding } else { min },
                max + padding,
            ),
        }
    }

    fn position(&self, row_index: usize, row: &RawRow, column: usize) -> Option<f64> {
        match self.labels {
            Some(_) => Some(row_index as f64),
            None => row.get(column).and_then(|v| v.as_f64()),
        }
    }

    fn format(&self, value: f64) -> String {
        match &self.labels {
            Some(labels) => {
                let rounded = value.round();
                if (value - rounded).abs() > 1e-6 || rounded < 0.0 {
                    return String::new();
                }
                labels.get(rounded as usize).cloned().unwrap_or_default()
            }
            None => format_number(value),
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

fn axis_spec(axis: &Option<DerivedAxis>) -> Option<&AxisSpec> {
    axis.as_ref().and_then(DerivedAxis::spec)
}

fn draw_cartesian(
    area: &Canvas<'_>,
    option: &ChartOption,
    series: &SeriesSpec,
    rows: &[RawRow],
) -> Result<()> {
    let x_spec = axis_spec(&option.x_axis);
    let y_spec = axis_spec(&option.y_axis);
    let x_scale = AxisScale::from_axis(x_spec, rows, 0);
    let y_scale = AxisScale::from_axis(y_spec, rows, 1);

    let mut chart = ChartBuilder::on(area)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(
            x_scale.range.0..x_scale.range.1,
            y_scale.range.0..y_scale.range.1,
        )
        .map_err(render_err)?;

    let x_desc = x_spec.and_then(|s| s.display_name.clone()).unwrap_or_default();
    let y_desc = y_spec.and_then(|s| s.display_name.clone()).unwrap_or_default();
    let x_formatter = |v: &f64| x_scale.format(*v);
    let y_formatter = |v: &f64| y_scale.format(*v);

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .x_labels(x_scale.labels.as_ref().map_or(10, |l| l.len().clamp(1, 20)))
        .y_labels(y_scale.labels.as_ref().map_or(10, |l| l.len().clamp(1, 20)))
        .light_line_style(ShapeStyle::from(&WHITE))
        .bold_line_style(ShapeStyle::from(&EDGE_COLOR.mix(0.6)))
        .label_style(("sans-serif", 14).into_font().color(&TEXT_COLOR))
        .x_label_formatter(&x_formatter)
        .y_label_formatter(&y_formatter)
        .draw()
        .map_err(render_err)?;

    let points: Vec<(f64, f64)> = rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            Some((x_scale.position(i, row, 0)?, y_scale.position(i, row, 1)?))
        })
        .collect();

    let main = color(0);
    match series.kind {
        ChartKind::Bar => {
            let baseline = 0.0_f64.clamp(y_scale.range.0, y_scale.range.1);
            let half = bar_half_width(&x_scale, &points);
            chart
                .draw_series(points.iter().map(|&(x, y)| {
                    Rectangle::new([(x - half, baseline), (x + half, y)], main.filled())
                }))
                .map_err(render_err)?;
        }
        ChartKind::Line => {
            chart
                .draw_series(LineSeries::new(points.iter().copied(), main.stroke_width(2)))
                .map_err(render_err)?;
            chart
                .draw_series(points.iter().map(|&p| Circle::new(p, 3, main.filled())))
                .map_err(render_err)?;
        }
        _ => {
            chart
                .draw_series(points.iter().map(|&p| Circle::new(p, 5, main.mix(0.8).filled())))
                .map_err(render_err)?;
        }
    }

    if series.label_visible {
        let style = ("sans-serif", 13).into_font().color(&TEXT_COLOR);
        chart
            .draw_series(rows.iter().zip(&points).map(|(row, &point)| {
                Text::new(row.column(1).to_string(), point, style.clone())
            }))
            .map_err(render_err)?;
    }

    Ok(())
}

fn bar_half_width(x_scale: &AxisScale, points: &[(f64, f64)]) -> f64 {
    if x_scale.labels.is_some() {
        return 0.3;
    }
    let span = x_scale.range.1 - x_scale.range.0;
    span / (points.len().max(1) as f64 * 2.0) * 0.6
}

fn plot_rect(area: &Canvas<'_>) -> Rect {
    let (width, height) = area.dim_in_pixel();
    Rect::new(0.0, 0.0, width as f64, height as f64)
}

fn draw_label(area: &Canvas<'_>, text: &str, at: (i32, i32), size: u32) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    let style = ("sans-serif", size)
        .into_font()
        .color(&TEXT_COLOR)
        .pos(Pos::new(HPos::Center, VPos::Center));
    area.draw(&Text::new(text.to_string(), at, style))
        .map_err(render_err)
}

fn draw_pie(area: &Canvas<'_>, pairs: &[NameValue]) -> Result<()> {
    let bounds = plot_rect(area);
    let center = (bounds.width() / 2.0, bounds.height() / 2.0);
    let radius = bounds.width().min(bounds.height()) * 0.35;

    let values: Vec<f64> = pairs
        .iter()
        .map(|pair| pair.value.as_f64().unwrap_or(0.0))
        .collect();

    for (index, (start, end)) in layout::proportion_angles(&values).into_iter().enumerate() {
        if end <= start {
            continue;
        }
        let points = layout::annular_sector(center, 0.0, radius, start, end);
        area.draw(&Polygon::new(points, color(index).filled()))
            .map_err(render_err)?;

        let middle = (start + end) / 2.0;
        let at = (
            (center.0 + radius * 1.15 * middle.sin()).round() as i32,
            (center.1 - radius * 1.15 * middle.cos()).round() as i32,
        );
        draw_label(area, &pairs[index].name.to_string(), at, 14)?;
    }

    Ok(())
}

fn draw_funnel(area: &Canvas<'_>, pairs: &[NameValue]) -> Result<()> {
    let bounds = plot_rect(area);
    let funnel_area = Rect::new(
        bounds.width() * 0.15,
        bounds.height() * 0.05,
        bounds.width() * 0.85,
        bounds.height() * 0.95,
    );

    let values: Vec<f64> = pairs
        .iter()
        .map(|pair| pair.value.as_f64().unwrap_or(0.0))
        .collect();

    for layer in layout::funnel_layers(&values, funnel_area) {
        area.draw(&Polygon::new(layer.points.to_vec(), color(layer.source).filled()))
            .map_err(render_err)?;

        let [top_left, _, _, bottom_left] = layer.points;
        let at = (
            (funnel_area.x0 + funnel_area.width() / 2.0).round() as i32,
            (top_left.1 + bottom_left.1) / 2,
        );
        draw_label(area, &pairs[layer.source].name.to_string(), at, 14)?;
    }

    Ok(())
}

fn draw_treemap(area: &Canvas<'_>, nodes: &[HierNode]) -> Result<()> {
    let bounds = plot_rect(area).inset(10.0);

    for tile in layout::treemap_layout(nodes, bounds)? {
        let fill = color(tile.root).mix(1.0 - (tile.depth as f64 * 0.2).min(0.6));
        area.draw(&Rectangle::new(tile.rect.corners(), fill.filled()))
            .map_err(render_err)?;
        area.draw(&Rectangle::new(tile.rect.corners(), WHITE.stroke_width(1)))
            .map_err(render_err)?;

        if tile.rect.width() > 40.0 && tile.rect.height() > 18.0 {
            let at = (
                (tile.rect.x0 + 6.0).round() as i32,
                (tile.rect.y0 + 12.0).round() as i32,
            );
            let style = ("sans-serif", 12).into_font().color(&TEXT_COLOR);
            area.draw(&Text::new(tile.name.clone(), at, style))
                .map_err(render_err)?;
        }
    }

    Ok(())
}

fn draw_sunburst(area: &Canvas<'_>, nodes: &[HierNode]) -> Result<()> {
    let bounds = plot_rect(area);
    let center = (bounds.width() / 2.0, bounds.height() / 2.0);
    let radius = bounds.width().min(bounds.height()) * 0.45;

    for sector in layout::sunburst_layout(nodes, radius)? {
        if sector.end <= sector.start {
            continue;
        }
        let points =
            layout::annular_sector(center, sector.inner, sector.outer, sector.start, sector.end);
        let fill = color(sector.root).mix(1.0 - (sector.depth as f64 * 0.2).min(0.6));
        area.draw(&Polygon::new(points.clone(), fill.filled()))
            .map_err(render_err)?;
        area.draw(&PathElement::new(points, WHITE.stroke_width(1)))
            .map_err(render_err)?;

        // 角度太小的扇形不標示名稱
        if sector.end - sector.start > 0.2 {
            let middle = (sector.start + sector.end) / 2.0;
            let r = (sector.inner + sector.outer) / 2.0;
            let at = (
                (center.0 + r * middle.sin()).round() as i32,
                (center.1 - r * middle.cos()).round() as i32,
            );
            draw_label(area, &sector.name, at, 12)?;
        }
    }

    Ok(())
}

fn draw_tree(area: &Canvas<'_>, nodes: &[HierNode]) -> Result<()> {
    let tree = layout::tree_layout(nodes)?;
    if tree.nodes.is_empty() {
        return Ok(());
    }

    let bounds = plot_rect(area).inset(40.0);
    let column = bounds.width() / tree.depth.saturating_sub(1).max(1) as f64;
    let row = bounds.height() / tree.leaf_count.max(1) as f64;

    let positions: Vec<(i32, i32)> = tree
        .nodes
        .iter()
        .map(|node| {
            (
                (bounds.x0 + column * node.depth as f64).round() as i32,
                (bounds.y0 + row * (node.slot + 0.5)).round() as i32,
            )
        })
        .collect();

    for &(parent, child) in &tree.edges {
        area.draw(&PathElement::new(
            vec![positions[parent], positions[child]],
            EDGE_COLOR.stroke_width(1),
        ))
        .map_err(render_err)?;
    }

    let style = ("sans-serif", 12).into_font().color(&TEXT_COLOR);
    for (node, &position) in tree.nodes.iter().zip(&positions) {
        area.draw(&Circle::new(position, 5, color(0).filled()))
            .map_err(render_err)?;
        area.draw(&Text::new(
            node.name.clone(),
            (position.0 + 8, position.1 - 6),
            style.clone(),
        ))
        .map_err(render_err)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::build_option;
    use crate::domain::model::ChartRequest;
    use serde_json::json;

    #[test]
    fn test_encode_png_signature() {
        let image = encode_png(vec![255u8; 4 * 3 * 3], 4, 3).unwrap();
        assert_eq!(image.content_type(), "image/png");
        assert_eq!(&image.bytes[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
    }

    #[test]
    fn test_encode_png_rejects_short_buffer() {
        let err = encode_png(vec![0u8; 5], 4, 3).unwrap_err();
        assert!(matches!(err, ChartError::RenderError { .. }));
    }

    #[test]
    fn test_category_scale_labels_by_index() {
        let rows = vec![
            RawRow::from_value(json!(["A", 1])),
            RawRow::from_value(json!(["B", 2])),
        ];
        let spec = AxisSpec {
            value_kind: AxisValueKind::Category,
            values: None,
            display_name: None,
        };
        let scale = AxisScale::from_axis(Some(&spec), &rows, 0);
        assert_eq!(scale.range, (-0.5, 1.5));
        assert_eq!(scale.format(1.0), "B");
        assert_eq!(scale.format(0.5), "");
        assert_eq!(scale.position(1, &rows[1], 0), Some(1.0));
    }

    #[test]
    fn test_numeric_scale_includes_zero() {
        let rows = vec![
            RawRow::from_value(json!(["A", 10])),
            RawRow::from_value(json!(["B", 50])),
        ];
        let scale = AxisScale::from_axis(None, &rows, 1);
        assert_eq!(scale.range.0, 0.0);
        assert_eq!(scale.range.1, 55.0);
        assert_eq!(scale.format(20.0), "20");
        assert_eq!(scale.position(0, &rows[0], 1), Some(10.0));
    }

    const PNG_MAGIC: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

    fn option_for(kind: &str, data: serde_json::Value) -> ChartOption {
        let request: ChartRequest = serde_json::from_value(json!({
            "type": kind,
            "data": data,
            "title": "Sales",
            "seriesName": "S1",
            "xAxisName": "Item",
            "yAxisName": "Amount"
        }))
        .unwrap();
        build_option(&request).unwrap()
    }

    fn small() -> PlottersRasterizer {
        PlottersRasterizer::new(320, 240)
    }

    #[test]
    fn test_rasterize_every_kind() {
        let rows = json!([["A", 120], ["B", 200], ["C", 150]]);
        let tree = json!([
            {"name": "A", "value": 100, "children": [
                {"name": "A1", "value": 40},
                {"name": "A2", "value": 60}
            ]},
            {"name": "B", "value": 50}
        ]);

        for kind in ChartKind::ALL {
            let data = if kind.is_hierarchical() { tree.clone() } else { rows.clone() };
            let image = small()
                .rasterize(&option_for(kind.as_str(), data))
                .unwrap_or_else(|e| panic!("{} failed: {}", kind, e));
            assert_eq!(&image.bytes[0..8], &PNG_MAGIC, "{}", kind);
        }
    }

    #[test]
    fn test_rasterize_numeric_scatter() {
        let option = option_for("scatter", json!([[1, 2], [3.5, -4], [6, 8]]));
        let image = small().rasterize(&option).unwrap();
        assert_eq!(&image.bytes[0..8], &PNG_MAGIC);
    }

    #[test]
    fn test_rasterize_empty_cartesian_frame() {
        let option = option_for("bar", json!([]));
        assert_eq!(option.x_axis, Some(DerivedAxis::Empty));

        let image = small().rasterize(&option).unwrap();
        assert_eq!(&image.bytes[0..8], &PNG_MAGIC);
    }

    #[test]
    fn test_rasterize_reports_later_node_without_value() {
        let data = json!([{"name": "A", "value": 1}, {"name": "B"}]);

        for kind in ["treemap", "sunburst", "tree"] {
            let err = small()
                .rasterize(&option_for(kind, data.clone()))
                .unwrap_err();
            assert!(
                matches!(&err, ChartError::RenderError { message } if message.contains("'B'")),
                "{}: {}",
                kind,
                err
            );
        }
    }

    #[test]
    fn test_default_size() {
        assert_eq!(PlottersRasterizer::default().size(), (800, 600));
    }
}
