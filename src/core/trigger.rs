use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{Bounds, Viewport};
use crate::error::{RevealError, RevealResult};

/// Scroll trigger line, written as `"<element> <viewport>[+=px|-=px]"`.
///
/// `"top 95%"` fires when the element's top edge reaches 95% of the viewport
/// height; `"center center"` when both centers align; `"top top+=200"` when
/// the top edge is 200px below the viewport top. Anchors are `top`,
/// `center`, `bottom` or a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TriggerStart {
    pub element_fraction: f64,
    pub viewport_fraction: f64,
    pub offset_px: f64,
}

impl TriggerStart {
    #[must_use]
    pub fn new(element_fraction: f64, viewport_fraction: f64) -> Self {
        Self {
            element_fraction,
            viewport_fraction,
            offset_px: 0.0,
        }
    }

    /// Element top against a viewport line at `percent` of its height.
    #[must_use]
    pub fn top_at_percent(percent: f64) -> Self {
        Self::new(0.0, percent / 100.0)
    }

    #[must_use]
    pub fn center_center() -> Self {
        Self::new(0.5, 0.5)
    }

    #[must_use]
    pub fn with_offset(mut self, offset_px: f64) -> Self {
        self.offset_px = offset_px;
        self
    }

    pub fn parse(input: &str) -> RevealResult<Self> {
        let mut tokens = input.split_whitespace();
        let (Some(element), Some(viewport), None) = (tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(RevealError::InvalidTrigger(input.to_owned()));
        };

        let element_fraction =
            parse_anchor(element).ok_or_else(|| RevealError::InvalidTrigger(input.to_owned()))?;

        let (viewport_anchor, offset_px) = split_offset(viewport)
            .ok_or_else(|| RevealError::InvalidTrigger(input.to_owned()))?;
        let viewport_fraction = parse_anchor(viewport_anchor)
            .ok_or_else(|| RevealError::InvalidTrigger(input.to_owned()))?;

        Self {
            element_fraction,
            viewport_fraction,
            offset_px,
        }
        .validate()
    }

    pub fn validate(self) -> RevealResult<Self> {
        if !self.element_fraction.is_finite()
            || !self.viewport_fraction.is_finite()
            || !self.offset_px.is_finite()
        {
            return Err(RevealError::InvalidTrigger(self.to_string()));
        }
        Ok(self)
    }

    /// Scroll position at which the element anchor meets the viewport line.
    #[must_use]
    pub fn trigger_scroll(self, bounds: Bounds, viewport: Viewport) -> f64 {
        bounds.at_fraction(self.element_fraction)
            - (self.viewport_fraction * viewport.height + self.offset_px)
    }

    #[must_use]
    pub fn is_crossed(self, bounds: Bounds, viewport: Viewport, scroll: f64) -> bool {
        scroll >= self.trigger_scroll(bounds, viewport)
    }

    /// Expresses a top-edge trigger as an intersection root margin.
    ///
    /// Only triggers on the element's top edge without pixel offsets map onto
    /// a single root margin; the rest are rejected.
    pub fn to_root_margin(self) -> RevealResult<RootMargin> {
        if self.element_fraction != 0.0 || self.offset_px != 0.0 {
            return Err(RevealError::InvalidTrigger(format!(
                "{self} cannot be expressed as an intersection margin"
            )));
        }
        Ok(RootMargin {
            bottom: Length::Percent(-(1.0 - self.viewport_fraction) * 100.0),
            ..RootMargin::ZERO
        })
    }
}

fn parse_anchor(token: &str) -> Option<f64> {
    match token {
        "top" => Some(0.0),
        "center" => Some(0.5),
        "bottom" => Some(1.0),
        _ => token
            .strip_suffix('%')
            .and_then(|number| number.parse::<f64>().ok())
            .filter(|value| value.is_finite())
            .map(|percent| percent / 100.0),
    }
}

fn split_offset(token: &str) -> Option<(&str, f64)> {
    for (pattern, sign) in [("+=", 1.0), ("-=", -1.0)] {
        if let Some((anchor, amount)) = token.split_once(pattern) {
            let amount = amount.strip_suffix("px").unwrap_or(amount);
            let value = amount.parse::<f64>().ok().filter(|v| v.is_finite())?;
            return Some((anchor, sign * value));
        }
    }
    Some((token, 0.0))
}

fn format_anchor(fraction: f64) -> String {
    if fraction == 0.0 {
        "top".to_owned()
    } else if fraction == 0.5 {
        "center".to_owned()
    } else if fraction == 1.0 {
        "bottom".to_owned()
    } else {
        format!("{}%", fraction * 100.0)
    }
}

impl fmt::Display for TriggerStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            format_anchor(self.element_fraction),
            format_anchor(self.viewport_fraction)
        )?;
        if self.offset_px > 0.0 {
            write!(f, "+={}", self.offset_px)?;
        } else if self.offset_px < 0.0 {
            write!(f, "-={}", -self.offset_px)?;
        }
        Ok(())
    }
}

impl FromStr for TriggerStart {
    type Err = RevealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TriggerStart {
    type Error = RevealError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TriggerStart> for String {
    fn from(value: TriggerStart) -> Self {
        value.to_string()
    }
}

/// CSS-style length used by root margins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Length {
    Px(f64),
    Percent(f64),
}

impl Length {
    #[must_use]
    pub fn resolve(self, reference_px: f64) -> f64 {
        match self {
            Self::Px(value) => value,
            Self::Percent(percent) => percent / 100.0 * reference_px,
        }
    }

    fn parse(token: &str) -> Option<Self> {
        let parsed = if let Some(number) = token.strip_suffix("px") {
            number.parse::<f64>().ok().map(Self::Px)
        } else if let Some(number) = token.strip_suffix('%') {
            number.parse::<f64>().ok().map(Self::Percent)
        } else if token == "0" {
            Some(Self::Px(0.0))
        } else {
            None
        };
        parsed.filter(|length| match length {
            Self::Px(v) | Self::Percent(v) => v.is_finite(),
        })
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(value) => write!(f, "{value}px"),
            Self::Percent(value) => write!(f, "{value}%"),
        }
    }
}

/// Grows (positive) or shrinks (negative) the observation root on each side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RootMargin {
    pub top: Length,
    pub right: Length,
    pub bottom: Length,
    pub left: Length,
}

impl Default for RootMargin {
    fn default() -> Self {
        Self::ZERO
    }
}

impl RootMargin {
    pub const ZERO: Self = Self {
        top: Length::Px(0.0),
        right: Length::Px(0.0),
        bottom: Length::Px(0.0),
        left: Length::Px(0.0),
    };

    /// Parses CSS margin shorthand with one to four lengths.
    pub fn parse(input: &str) -> RevealResult<Self> {
        let lengths = input
            .split_whitespace()
            .map(Length::parse)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| RevealError::InvalidRootMargin(input.to_owned()))?;

        let (top, right, bottom, left) = match lengths.as_slice() {
            [all] => (*all, *all, *all, *all),
            [vertical, horizontal] => (*vertical, *horizontal, *vertical, *horizontal),
            [top, horizontal, bottom] => (*top, *horizontal, *bottom, *horizontal),
            [top, right, bottom, left] => (*top, *right, *bottom, *left),
            _ => return Err(RevealError::InvalidRootMargin(input.to_owned())),
        };
        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }

    /// Resolves the vertical sides against the viewport height.
    #[must_use]
    pub fn vertical_px(self, viewport: Viewport) -> (f64, f64) {
        (
            self.top.resolve(viewport.height),
            self.bottom.resolve(viewport.height),
        )
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.top, self.right, self.bottom, self.left
        )
    }
}

impl FromStr for RootMargin {
    type Err = RevealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RootMargin {
    type Error = RevealError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RootMargin> for String {
    fn from(value: RootMargin) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{Length, RootMargin, TriggerStart};
    use crate::core::{Bounds, Viewport};

    #[test]
    fn parses_percentage_viewport_anchor() {
        let trigger = TriggerStart::parse("top 95%").expect("valid trigger");
        assert_eq!(trigger.element_fraction, 0.0);
        assert!((trigger.viewport_fraction - 0.95).abs() <= 1e-12);
        assert_eq!(trigger.offset_px, 0.0);
    }

    #[test]
    fn parses_relative_pixel_offset() {
        let trigger = TriggerStart::parse("top top+=200").expect("valid trigger");
        assert_eq!(trigger.viewport_fraction, 0.0);
        assert_eq!(trigger.offset_px, 200.0);

        let trigger = TriggerStart::parse("bottom top-=100px").expect("valid trigger");
        assert_eq!(trigger.element_fraction, 1.0);
        assert_eq!(trigger.offset_px, -100.0);
    }

    #[test]
    fn rejects_malformed_triggers() {
        for input in ["", "top", "top 95% extra", "middle top", "top 9x%", "top top+=abc"] {
            assert!(TriggerStart::parse(input).is_err(), "{input:?}");
        }
    }

    #[test]
    fn display_round_trips_named_anchors() {
        for input in ["top 95%", "center center", "top top+=200", "bottom top-=100"] {
            let trigger = TriggerStart::parse(input).expect("valid trigger");
            assert_eq!(trigger.to_string(), input);
        }
    }

    #[test]
    fn center_center_trigger_aligns_centers() {
        let viewport = Viewport::new(1280.0, 800.0);
        let section = Bounds::new(2000.0, 600.0);
        let scroll = TriggerStart::center_center().trigger_scroll(section, viewport);
        assert_eq!(scroll, 2300.0 - 400.0);
    }

    #[test]
    fn top_edge_trigger_maps_to_bottom_margin() {
        let margin = TriggerStart::parse("top 90%")
            .expect("valid trigger")
            .to_root_margin()
            .expect("expressible");
        match margin.bottom {
            Length::Percent(value) => assert!((value + 10.0).abs() <= 1e-9),
            Length::Px(_) => panic!("expected percentage bottom margin"),
        }
        assert!(TriggerStart::center_center().to_root_margin().is_err());
    }

    #[test]
    fn root_margin_expands_css_shorthand() {
        let margin = RootMargin::parse("-50% 0px").expect("valid margin");
        assert_eq!(margin.top, Length::Percent(-50.0));
        assert_eq!(margin.bottom, Length::Percent(-50.0));
        assert_eq!(margin.left, Length::Px(0.0));

        let margin = RootMargin::parse("0px -20% 0px -20%").expect("valid margin");
        assert_eq!(margin.right, Length::Percent(-20.0));
        assert_eq!(margin.left, Length::Percent(-20.0));

        assert!(RootMargin::parse("").is_err());
        assert!(RootMargin::parse("1px 2px 3px 4px 5px").is_err());
        assert!(RootMargin::parse("10em").is_err());
    }

    #[test]
    fn vertical_margins_resolve_against_viewport_height() {
        let margin = RootMargin::parse("-50% 0px -50% 0px").expect("valid margin");
        let (top, bottom) = margin.vertical_px(Viewport::new(1000.0, 800.0));
        assert_eq!(top, -400.0);
        assert_eq!(bottom, -400.0);
    }
}
