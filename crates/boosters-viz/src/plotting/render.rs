//! Export of an [`Axes`] to image files.
//!
//! Charts are drawn to SVG with `plotters` (cargo feature `plotting`).
//! Image axes, as produced by the tree rasterizer, are written as PNG with
//! the `image` crate and need no plotting backend.

use std::path::Path;

use super::axes::{Artist, Axes};
use crate::error::{PlotError, Result};

/// Whether chart export is compiled in.
pub const fn plotting_available() -> bool {
    cfg!(feature = "plotting")
}

impl Axes {
    /// Draw the chart as an SVG document.
    pub fn to_svg(&self) -> Result<String> {
        if self.images().next().is_some() {
            return Err(PlotError::Render(
                "image axes can only be exported as PNG".to_string(),
            ));
        }
        draw_svg(self)
    }

    pub fn save_svg(&self, path: impl AsRef<Path>) -> Result<()> {
        let svg = self.to_svg()?;
        std::fs::write(path.as_ref(), svg)?;
        log::debug!("wrote {}", path.as_ref().display());
        Ok(())
    }

    /// Write the displayed image as PNG.
    ///
    /// Only axes holding exactly one image artist can be written this way.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut images = self.images();
        match (images.next(), images.next()) {
            (Some(img), None) => {
                img.save_with_format(path.as_ref(), image::ImageFormat::Png)?;
                log::debug!("wrote {}", path.as_ref().display());
                Ok(())
            }
            _ => Err(PlotError::Render(
                "PNG export needs axes showing a single image".to_string(),
            )),
        }
    }
}

#[cfg(not(feature = "plotting"))]
fn draw_svg(_axes: &Axes) -> Result<String> {
    Err(PlotError::BackendUnavailable {
        backend: "plotters",
        purpose: "export charts",
    })
}

#[cfg(feature = "plotting")]
fn draw_svg(axes: &Axes) -> Result<String> {
    use plotters::prelude::*;
    use plotters::style::text_anchor::{HPos, Pos, VPos};

    use super::axes::{HAlign, VAlign};

    fn render_err(e: impl std::fmt::Display) -> PlotError {
        PlotError::Render(e.to_string())
    }

    let ((x0, x1), (y0, y1)) = axes.view_limits();
    let label_area = if axes.axis_visible { 60 } else { 0 };

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, axes.size).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let mut builder = ChartBuilder::on(&root);
        builder
            .margin(20)
            .x_label_area_size(label_area)
            .y_label_area_size(label_area);
        if let Some(title) = &axes.title {
            builder.caption(title, ("sans-serif", 20));
        }
        let mut chart = builder
            .build_cartesian_2d(x0..x1, y0..y1)
            .map_err(render_err)?;

        if axes.axis_visible {
            let integer_only = axes.integer_yticks;
            let custom_y = axes.yticks.is_some();
            let y_formatter = move |v: &f64| -> String {
                if custom_y || (integer_only && v.fract() != 0.0) {
                    String::new()
                } else {
                    format!("{}", v)
                }
            };

            let mut mesh = chart.configure_mesh();
            if !axes.grid {
                mesh.disable_mesh();
            }
            if let Some(x) = &axes.xlabel {
                mesh.x_desc(x.as_str());
            }
            if let Some(y) = &axes.ylabel {
                mesh.y_desc(y.as_str());
            }
            mesh.y_label_formatter(&y_formatter);
            mesh.draw().map_err(render_err)?;
        }

        for artist in axes.artists() {
            match artist {
                Artist::Bar(bar) => {
                    let ((bx0, by0), (bx1, by1)) = bar.rect();
                    let color = RGBColor(bar.color.0, bar.color.1, bar.color.2);
                    chart
                        .draw_series(std::iter::once(Rectangle::new(
                            [(bx0, by0), (bx1, by1)],
                            color.filled(),
                        )))
                        .map_err(render_err)?;
                }
                Artist::Line(line) => {
                    let color = RGBColor(line.color.0, line.color.1, line.color.2);
                    let series = chart
                        .draw_series(LineSeries::new(
                            line.points.iter().copied(),
                            color.stroke_width(2),
                        ))
                        .map_err(render_err)?;
                    if let Some(label) = &line.label {
                        series.label(label.as_str()).legend(move |(x, y)| {
                            PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                        });
                    }
                }
                Artist::Text(t) => {
                    let h = match t.h_align {
                        HAlign::Left => HPos::Left,
                        HAlign::Center => HPos::Center,
                        HAlign::Right => HPos::Right,
                    };
                    let v = match t.v_align {
                        VAlign::Top => VPos::Top,
                        VAlign::Center => VPos::Center,
                        VAlign::Bottom => VPos::Bottom,
                    };
                    let style = ("sans-serif", 12)
                        .into_font()
                        .color(&BLACK)
                        .pos(Pos::new(h, v));
                    chart
                        .draw_series(std::iter::once(Text::new(t.text.clone(), (t.x, t.y), style)))
                        .map_err(render_err)?;
                }
                // Rejected by `to_svg`.
                Artist::Image(_) => {}
            }
        }

        if axes.axis_visible {
            if let Some(ticks) = &axes.yticks {
                let style = ("sans-serif", 12)
                    .into_font()
                    .color(&BLACK)
                    .pos(Pos::new(HPos::Right, VPos::Center));
                for (pos, label) in ticks {
                    if *pos < y0 || *pos > y1 {
                        continue;
                    }
                    let (px, py) = chart.backend_coord(&(x0, *pos));
                    root.draw(&Text::new(label.clone(), (px - 6, py), style.clone()))
                        .map_err(render_err)?;
                }
            }
        }

        if axes.legend && !axes.legend_labels().is_empty() {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(render_err)?;
        }

        root.present().map_err(render_err)?;
    }
    Ok(svg)
}
