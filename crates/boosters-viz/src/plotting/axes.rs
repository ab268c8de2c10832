//! Backend-neutral plot surface.
//!
//! [`Axes`] records what a chart contains: bars, line series, text
//! annotations, images, limits, ticks and labels. Renderers fill it; export
//! to a file format happens separately (see `Axes::to_svg`).

use image::RgbaImage;

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Default color cycle for line series and bars.
pub const PALETTE: [Rgb; 10] = [
    Rgb(31, 119, 180),
    Rgb(255, 127, 14),
    Rgb(44, 160, 44),
    Rgb(214, 39, 40),
    Rgb(148, 103, 189),
    Rgb(140, 86, 75),
    Rgb(227, 119, 194),
    Rgb(127, 127, 127),
    Rgb(188, 189, 34),
    Rgb(23, 190, 207),
];

/// Direction a bar grows in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarDirection {
    /// Grows along y from 0, centered on an x position.
    Vertical,
    /// Grows along x from 0, centered on a y position.
    Horizontal,
}

/// A bar anchored at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub direction: BarDirection,
    /// Center of the bar across its growth direction.
    pub position: f64,
    /// Signed extent from zero.
    pub value: f64,
    /// Size across the growth direction.
    pub thickness: f64,
    pub color: Rgb,
}

impl Bar {
    /// Corners `((x0, y0), (x1, y1))` in data coordinates.
    pub fn rect(&self) -> ((f64, f64), (f64, f64)) {
        let half = self.thickness / 2.0;
        match self.direction {
            BarDirection::Vertical => (
                (self.position - half, 0.0),
                (self.position + half, self.value),
            ),
            BarDirection::Horizontal => (
                (0.0, self.position - half),
                (self.value, self.position + half),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub label: Option<String>,
    pub points: Vec<(f64, f64)>,
    pub color: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Center,
    Bottom,
}

/// Text placed at a data coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub h_align: HAlign,
    pub v_align: VAlign,
}

/// Anything drawn inside the plot area.
#[derive(Debug, Clone, PartialEq)]
pub enum Artist {
    Bar(Bar),
    Line(Line),
    Text(Annotation),
    Image(RgbaImage),
}

/// Figure size in pixels when none is requested.
pub const DEFAULT_SIZE: (u32, u32) = (640, 480);

/// A single chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Axes {
    pub title: Option<String>,
    pub xlabel: Option<String>,
    pub ylabel: Option<String>,
    pub xlim: Option<(f64, f64)>,
    pub ylim: Option<(f64, f64)>,
    /// Explicit y tick positions and labels.
    pub yticks: Option<Vec<(f64, String)>>,
    /// Label only whole-number y ticks.
    pub integer_yticks: bool,
    pub grid: bool,
    pub legend: bool,
    pub axis_visible: bool,
    /// Output size in pixels.
    pub size: (u32, u32),
    artists: Vec<Artist>,
    next_color: usize,
}

impl Default for Axes {
    fn default() -> Self {
        Self::new()
    }
}

impl Axes {
    pub fn new() -> Self {
        Self {
            title: None,
            xlabel: None,
            ylabel: None,
            xlim: None,
            ylim: None,
            yticks: None,
            integer_yticks: false,
            grid: false,
            legend: false,
            axis_visible: true,
            size: DEFAULT_SIZE,
            artists: Vec::new(),
            next_color: 0,
        }
    }

    pub fn with_size(size: Option<(u32, u32)>) -> Self {
        Self {
            size: size.unwrap_or(DEFAULT_SIZE),
            ..Self::new()
        }
    }

    fn cycle_color(&mut self) -> Rgb {
        let color = PALETTE[self.next_color % PALETTE.len()];
        self.next_color += 1;
        color
    }

    /// Horizontal bars, one per `(y, width)` pair, sharing one color. The
    /// next palette color is used when `color` is `None`.
    pub fn barh(
        &mut self,
        bars: impl IntoIterator<Item = (f64, f64)>,
        height: f64,
        color: Option<Rgb>,
    ) {
        let color = color.unwrap_or_else(|| self.cycle_color());
        for (y, width) in bars {
            self.artists.push(Artist::Bar(Bar {
                direction: BarDirection::Horizontal,
                position: y,
                value: width,
                thickness: height,
                color,
            }));
        }
    }

    /// Vertical bars, one per `(x, height)` pair, sharing one color.
    pub fn bar(
        &mut self,
        bars: impl IntoIterator<Item = (f64, f64)>,
        width: f64,
        color: Option<Rgb>,
    ) {
        let color = color.unwrap_or_else(|| self.cycle_color());
        for (x, height) in bars {
            self.artists.push(Artist::Bar(Bar {
                direction: BarDirection::Vertical,
                position: x,
                value: height,
                thickness: width,
                color,
            }));
        }
    }

    /// Line series through `(x, y)` points.
    pub fn plot(&mut self, points: Vec<(f64, f64)>, label: Option<&str>) {
        let color = self.cycle_color();
        self.artists.push(Artist::Line(Line {
            label: label.map(str::to_string),
            points,
            color,
        }));
    }

    pub fn text(&mut self, x: f64, y: f64, text: impl Into<String>, h_align: HAlign, v_align: VAlign) {
        self.artists.push(Artist::Text(Annotation {
            x,
            y,
            text: text.into(),
            h_align,
            v_align,
        }));
    }

    /// Show a raster image filling the plot area.
    pub fn imshow(&mut self, image: RgbaImage) {
        self.artists.push(Artist::Image(image));
    }

    /// Hide axis lines, ticks and labels.
    pub fn axis_off(&mut self) {
        self.axis_visible = false;
    }

    pub fn artists(&self) -> &[Artist] {
        &self.artists
    }

    pub fn bars(&self) -> impl Iterator<Item = &Bar> {
        self.artists.iter().filter_map(|a| match a {
            Artist::Bar(b) => Some(b),
            _ => None,
        })
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.artists.iter().filter_map(|a| match a {
            Artist::Line(l) => Some(l),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &Annotation> {
        self.artists.iter().filter_map(|a| match a {
            Artist::Text(t) => Some(t),
            _ => None,
        })
    }

    pub fn images(&self) -> impl Iterator<Item = &RgbaImage> {
        self.artists.iter().filter_map(|a| match a {
            Artist::Image(img) => Some(img),
            _ => None,
        })
    }

    /// Labels shown in the legend, in drawing order.
    pub fn legend_labels(&self) -> Vec<&str> {
        self.lines().filter_map(|l| l.label.as_deref()).collect()
    }

    /// Limits used for drawing: the explicit ones, or the data extent.
    ///
    /// Degenerate ranges are widened so the result always has `lo < hi`.
    pub fn view_limits(&self) -> ((f64, f64), (f64, f64)) {
        let (mut xs, mut ys): (Vec<f64>, Vec<f64>) = (Vec::new(), Vec::new());
        for artist in &self.artists {
            match artist {
                Artist::Bar(b) => {
                    let ((x0, y0), (x1, y1)) = b.rect();
                    xs.extend([x0, x1]);
                    ys.extend([y0, y1]);
                }
                Artist::Line(l) => {
                    for &(x, y) in &l.points {
                        xs.push(x);
                        ys.push(y);
                    }
                }
                Artist::Text(t) => {
                    xs.push(t.x);
                    ys.push(t.y);
                }
                Artist::Image(img) => {
                    xs.extend([0.0, f64::from(img.width())]);
                    ys.extend([0.0, f64::from(img.height())]);
                }
            }
        }
        let x = self.xlim.unwrap_or_else(|| extent(&xs));
        let y = self.ylim.unwrap_or_else(|| extent(&ys));
        (ordered(x), ordered(y))
    }
}

fn extent(values: &[f64]) -> (f64, f64) {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let (lo, hi) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if lo > hi {
        return (0.0, 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

fn ordered((lo, hi): (f64, f64)) -> (f64, f64) {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    if lo == hi {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.05 };
        (lo - pad, hi + pad)
    } else {
        (lo, hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_share_a_color_and_lines_cycle() {
        let mut ax = Axes::new();
        ax.bar([(0.5, 2.0), (1.5, 3.0)], 0.8, None);
        ax.plot(vec![(0.0, 1.0)], Some("train"));
        ax.plot(vec![(0.0, 2.0)], None);
        ax.barh([(0.0, 1.0)], 0.2, Some(Rgb(0, 0, 0)));

        let bars: Vec<_> = ax.bars().collect();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].color, bars[1].color);
        assert_eq!(bars[0].color, PALETTE[0]);
        assert_eq!(bars[2].color, Rgb(0, 0, 0));
        let lines: Vec<_> = ax.lines().collect();
        assert_ne!(lines[0].color, lines[1].color);
        assert_eq!(ax.legend_labels(), ["train"]);
    }

    #[test]
    fn bar_rects() {
        let v = Bar {
            direction: BarDirection::Vertical,
            position: 1.0,
            value: 4.0,
            thickness: 0.5,
            color: PALETTE[0],
        };
        assert_eq!(v.rect(), ((0.75, 0.0), (1.25, 4.0)));

        let h = Bar {
            direction: BarDirection::Horizontal,
            ..v
        };
        assert_eq!(h.rect(), ((0.0, 0.75), (4.0, 1.25)));
    }

    #[test]
    fn view_limits_prefer_explicit_and_widen_degenerate() {
        let mut ax = Axes::new();
        ax.plot(vec![(0.0, 0.5), (1.0, 0.5)], None);
        let (x, y) = ax.view_limits();
        assert!(x.0 < 0.0 && x.1 > 1.0);
        assert!(y.0 < 0.5 && y.1 > 0.5);

        ax.xlim = Some((3.0, -1.0));
        assert_eq!(ax.view_limits().0, (-1.0, 3.0));

        assert_eq!(Axes::new().view_limits(), ((0.0, 1.0), (0.0, 1.0)));
    }
}
