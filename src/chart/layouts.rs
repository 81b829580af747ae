//! Reusable chart panels shared by the drivers.

use serde::Serialize;

use crate::chart::spec::{Channel, ConditionalValue, Encoding, Mark, Scale, Selection, View};

pub const DAILY_LABEL: &str = "Daily";
pub const AVERAGE_LABEL: &str = "7 day";

const DAILY_COLOR: &str = "lightgrey";
const AVERAGE_COLOR: &str = "blue";

/// Name of the legend-bound region selection.
pub const REGION_SELECTION: &str = "region";

/// Date column shared by every time-series row.
pub const DATE_FIELD: &str = "dt";

/// Constant label columns feeding the daily/average legend.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LegendTags {
    pub src1: &'static str,
    pub src2: &'static str,
}

impl Default for LegendTags {
    fn default() -> Self {
        Self {
            src1: DAILY_LABEL,
            src2: AVERAGE_LABEL,
        }
    }
}

/// A daily series drawn with its rolling average.
#[derive(Debug, Clone, Copy)]
pub struct Panel<'a> {
    pub daily: &'a str,
    pub average: &'a str,
    pub y_title: &'a str,
    /// Upper bound of a `[0, max]` y domain.
    pub domain_max: Option<f64>,
    pub clip: bool,
}

impl<'a> Panel<'a> {
    pub fn new(daily: &'a str, average: &'a str, y_title: &'a str) -> Self {
        Self {
            daily,
            average,
            y_title,
            domain_max: None,
            clip: false,
        }
    }

    /// Clip to a `[0, max]` y domain.
    pub fn bounded(mut self, max: Option<f64>) -> Self {
        self.domain_max = max;
        self.clip = true;
        self
    }
}

fn legend_scale() -> Scale {
    Scale::categorical(&[DAILY_LABEL, AVERAGE_LABEL], &[DAILY_COLOR, AVERAGE_COLOR])
}

/// Daily points and average line colored through the "Daily"/"7 day" legend.
pub fn legend_panel(panel: &Panel) -> View {
    let points = View::unit(
        Mark::line().with_points().clip(panel.clip),
        Encoding::xy(
            Channel::temporal(DATE_FIELD).title("Date"),
            Channel::quantitative(panel.daily)
                .title(panel.y_title)
                .zero_to(panel.domain_max),
        )
        .color(Channel::nominal("src1").scale(legend_scale())),
    );
    let average = View::unit(
        Mark::line().clip(panel.clip),
        Encoding::xy(
            Channel::temporal(DATE_FIELD),
            Channel::quantitative(panel.average),
        )
        .color(Channel::nominal("src2").scale(legend_scale())),
    );
    View::layered(vec![points, average])
}

/// Grey daily points under a default-colored average line, no legend.
pub fn grey_panel(panel: &Panel) -> View {
    let points = View::unit(
        Mark::line()
            .with_point_color(DAILY_COLOR)
            .color(DAILY_COLOR)
            .clip(panel.clip),
        Encoding::xy(
            Channel::temporal(DATE_FIELD).title("Date"),
            Channel::quantitative(panel.daily)
                .title(panel.y_title)
                .zero_to(panel.domain_max),
        ),
    );
    let average = View::unit(
        Mark::line().clip(panel.clip),
        Encoding::xy(
            Channel::temporal(DATE_FIELD),
            Channel::quantitative(panel.average),
        ),
    );
    View::layered(vec![points, average])
}

/// One line per region, dimmed unless selected through the legend.
pub fn region_lines(
    field: &str,
    y_title: &str,
    region_field: &str,
    domain_max: Option<f64>,
    points: bool,
) -> View {
    let mark = Mark::line().clip(true);
    let mark = if points { mark.with_points() } else { mark };

    View::unit(
        mark,
        Encoding::xy(
            Channel::temporal(DATE_FIELD).title("Date"),
            Channel::quantitative(field).title(y_title).zero_to(domain_max),
        )
        .color(Channel::nominal(region_field))
        .opacity(ConditionalValue::when_selected(REGION_SELECTION, 1.0, 0.2)),
    )
}

/// Selection toggled from the region legend.
pub fn region_selection(region_field: &str) -> Selection {
    Selection::legend_multi(region_field)
}
