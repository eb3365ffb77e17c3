//! Typed style records.
//!
//! A node carries an ordered list of [`Style`] fragments. Fragments are merged shallowly (later
//! wins) and then either fed to the layout solver (layout fields) or resolved for painting
//! (paint fields). Paint scalars and colors may be [`AnimatedValue`]s; resolving them for a paint
//! pass registers that pass as the value's observer.

use std::fmt;

use serde_json::Value;

use crate::{
    animation::value::{AnimatedValue, Observer},
    foundation::{
        core::{Color, Vec2},
        error::{SceneryError, SceneryResult},
    },
};

/// Literal or animated style value.
#[derive(Clone)]
pub enum Prop<T> {
    Value(T),
    Animated(AnimatedValue<T>),
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for Prop<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Animated(a) => f.debug_tuple("Animated").field(a).finish(),
        }
    }
}

impl<T: Clone + 'static> Prop<T> {
    /// Read the value; animated values register `observer` when one is given.
    pub fn resolve(&self, observer: Option<&Observer>) -> T {
        match (self, observer) {
            (Self::Value(v), _) => v.clone(),
            (Self::Animated(a), Some(o)) => a.observe(o),
            (Self::Animated(a), None) => a.get_value(),
        }
    }

    pub fn release(&self) {
        if let Self::Animated(a) = self {
            a.clear_observer();
        }
    }

    pub fn is_animated(&self) -> bool {
        matches!(self, Self::Animated(_))
    }
}

impl<T> From<T> for Prop<T> {
    fn from(v: T) -> Self {
        Self::Value(v)
    }
}

impl<T> From<AnimatedValue<T>> for Prop<T> {
    fn from(v: AnimatedValue<T>) -> Self {
        Self::Animated(v)
    }
}

impl<T> From<&AnimatedValue<T>> for Prop<T> {
    fn from(v: &AnimatedValue<T>) -> Self {
        Self::Animated(v.clone())
    }
}

/// Length accepted by the layout solver: points, a percentage or `auto`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Dimension {
    Points(f64),
    Percent(f64),
    Auto,
}

impl Dimension {
    /// Number -> points, `"auto"`, or `"N%"`.
    pub fn from_json(key: &str, v: &Value) -> SceneryResult<Self> {
        match v {
            Value::Number(n) => n
                .as_f64()
                .map(Self::Points)
                .ok_or_else(|| SceneryError::style_value(key, v)),
            Value::String(s) if s == "auto" => Ok(Self::Auto),
            Value::String(s) => s
                .strip_suffix('%')
                .and_then(|n| n.trim().parse::<f64>().ok())
                .filter(|n| n.is_finite())
                .map(Self::Percent)
                .ok_or_else(|| SceneryError::style_value(key, v)),
            _ => Err(SceneryError::style_value(key, v)),
        }
    }

    pub fn points(self) -> Option<f64> {
        match self {
            Self::Points(v) => Some(v),
            _ => None,
        }
    }
}

impl From<f64> for Dimension {
    fn from(v: f64) -> Self {
        Self::Points(v)
    }
}

macro_rules! keyword_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $kw:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $kw)] $variant),+
        }

        impl $name {
            pub fn from_keyword(s: &str) -> Option<Self> {
                match s {
                    $($kw => Some(Self::$variant),)+
                    _ => None,
                }
            }

            pub fn keyword(self) -> &'static str {
                match self {
                    $(Self::$variant => $kw),+
                }
            }
        }
    };
}

keyword_enum!(JustifyContent {
    FlexStart => "flex-start",
    Center => "center",
    FlexEnd => "flex-end",
    SpaceBetween => "space-between",
    SpaceAround => "space-around",
    SpaceEvenly => "space-evenly",
});

keyword_enum!(
    /// Shared by `alignItems`, `alignSelf` and `alignContent`.
    Align {
        Auto => "auto",
        FlexStart => "flex-start",
        Center => "center",
        FlexEnd => "flex-end",
        Stretch => "stretch",
        Baseline => "baseline",
        SpaceBetween => "space-between",
        SpaceAround => "space-around",
    }
);

keyword_enum!(FlexWrap {
    NoWrap => "no-wrap",
    Wrap => "wrap",
    WrapReverse => "wrap-reverse",
});

keyword_enum!(FlexDirection {
    Column => "column",
    ColumnReverse => "column-reverse",
    Row => "row",
    RowReverse => "row-reverse",
});

keyword_enum!(PositionType {
    Static => "static",
    Relative => "relative",
    Absolute => "absolute",
});

keyword_enum!(
    /// `Hidden` clips children (and the node's own content) to its rounded-rect path.
    Overflow {
        Visible => "visible",
        Hidden => "hidden",
    }
);

impl Overflow {
    fn from_style_keyword(s: &str) -> Option<Self> {
        match s {
            "clip" | "scroll" => Some(Self::Hidden),
            other => Self::from_keyword(other),
        }
    }
}

/// Per-edge lengths. `all` applies where a specific edge is unset.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Edges {
    pub all: Option<Dimension>,
    pub left: Option<Dimension>,
    pub top: Option<Dimension>,
    pub right: Option<Dimension>,
    pub bottom: Option<Dimension>,
}

impl Edges {
    fn merge(&mut self, other: &Edges) {
        self.all = other.all.or(self.all);
        self.left = other.left.or(self.left);
        self.top = other.top.or(self.top);
        self.right = other.right.or(self.right);
        self.bottom = other.bottom.or(self.bottom);
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Shadow parameters for a node's background fill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shadow {
    pub color: Color,
    pub blur: f64,
    pub offset: Vec2,
}

/// One style fragment. Every field is optional; unset fields fall through when merging.
#[derive(Clone, Debug, Default)]
pub struct Style {
    // Layout.
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
    pub min_width: Option<Dimension>,
    pub max_width: Option<Dimension>,
    pub min_height: Option<Dimension>,
    pub max_height: Option<Dimension>,
    pub flex: Option<Dimension>,
    pub flex_grow: Option<Dimension>,
    pub flex_shrink: Option<Dimension>,
    pub aspect_ratio: Option<Dimension>,
    pub justify_content: Option<JustifyContent>,
    pub align_items: Option<Align>,
    pub align_self: Option<Align>,
    pub align_content: Option<Align>,
    pub flex_wrap: Option<FlexWrap>,
    pub flex_direction: Option<FlexDirection>,
    pub position: Option<PositionType>,
    /// `left`/`top`/`right`/`bottom`.
    pub inset: Edges,
    pub padding: Edges,
    pub margin: Edges,
    pub border_width: Edges,

    // Paint.
    pub opacity: Option<Prop<f64>>,
    pub translate_x: Option<Prop<f64>>,
    pub translate_y: Option<Prop<f64>>,
    /// Radians.
    pub rotate: Option<Prop<f64>>,
    pub scale: Option<Prop<f64>>,
    pub scale_x: Option<Prop<f64>>,
    pub scale_y: Option<Prop<f64>>,
    pub z_index: Option<Prop<f64>>,
    pub overflow: Option<Overflow>,
    pub background_color: Option<Prop<Color>>,
    pub border_color: Option<Prop<Color>>,
    pub border_radius: Option<Prop<f64>>,
    pub border_top_left_radius: Option<Prop<f64>>,
    pub border_top_right_radius: Option<Prop<f64>>,
    pub border_bottom_right_radius: Option<Prop<f64>>,
    pub border_bottom_left_radius: Option<Prop<f64>>,
    pub shadow_color: Option<Prop<Color>>,
    pub shadow_blur: Option<Prop<f64>>,
    pub shadow_offset_x: Option<Prop<f64>>,
    pub shadow_offset_y: Option<Prop<f64>>,
    /// Build the rounded-rect path even without background or border.
    pub path: Option<bool>,
}

macro_rules! override_fields {
    ($dst:ident, $src:ident; $($field:ident),+ $(,)?) => {
        $(
            if $src.$field.is_some() {
                $dst.$field = $src.$field.clone();
            }
        )+
    };
}

macro_rules! paint_props {
    ($style:ident, $f:ident) => {{
        for p in [
            &$style.opacity,
            &$style.translate_x,
            &$style.translate_y,
            &$style.rotate,
            &$style.scale,
            &$style.scale_x,
            &$style.scale_y,
            &$style.z_index,
            &$style.border_radius,
            &$style.border_top_left_radius,
            &$style.border_top_right_radius,
            &$style.border_bottom_right_radius,
            &$style.border_bottom_left_radius,
            &$style.shadow_blur,
            &$style.shadow_offset_x,
            &$style.shadow_offset_y,
        ]
        .into_iter()
        .flatten()
        {
            $f(p);
        }
        for p in [
            &$style.background_color,
            &$style.border_color,
            &$style.shadow_color,
        ]
        .into_iter()
        .flatten()
        {
            $f(p);
        }
    }};
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shallow merge: every field set in `other` replaces the one here.
    pub fn merge(&mut self, other: &Style) {
        override_fields!(self, other;
            width, height, min_width, max_width, min_height, max_height,
            flex, flex_grow, flex_shrink, aspect_ratio,
            justify_content, align_items, align_self, align_content,
            flex_wrap, flex_direction, position,
            opacity, translate_x, translate_y, rotate, scale, scale_x, scale_y, z_index,
            overflow, background_color, border_color,
            border_radius, border_top_left_radius, border_top_right_radius,
            border_bottom_right_radius, border_bottom_left_radius,
            shadow_color, shadow_blur, shadow_offset_x, shadow_offset_y, path,
        );
        self.inset.merge(&other.inset);
        self.padding.merge(&other.padding);
        self.margin.merge(&other.margin);
        self.border_width.merge(&other.border_width);
    }

    /// Merge fragments in order, later fragments winning.
    pub fn merged<'a>(fragments: impl IntoIterator<Item = &'a Style>) -> Style {
        let mut out = Style::default();
        for f in fragments {
            out.merge(f);
        }
        out
    }

    /// Observe-and-read every paint field.
    pub fn resolve(&self, observer: Option<&Observer>) -> ResolvedStyle {
        let f64_of = |p: &Option<Prop<f64>>| p.as_ref().map(|p| p.resolve(observer));
        let color_of = |p: &Option<Prop<Color>>| p.as_ref().map(|p| p.resolve(observer));

        let translate_x = f64_of(&self.translate_x).unwrap_or(0.0);
        let translate_y = f64_of(&self.translate_y).unwrap_or(0.0);
        let rotate = f64_of(&self.rotate).unwrap_or(0.0);
        let scale = f64_of(&self.scale);
        let scale_x = f64_of(&self.scale_x).or(scale);
        let scale_y = f64_of(&self.scale_y).or(scale);

        let radius = f64_of(&self.border_radius).unwrap_or(0.0);
        let corner = |p: &Option<Prop<f64>>| f64_of(p).unwrap_or(radius);
        let radii = [
            corner(&self.border_top_left_radius),
            corner(&self.border_top_right_radius),
            corner(&self.border_bottom_right_radius),
            corner(&self.border_bottom_left_radius),
        ];

        let shadow = color_of(&self.shadow_color).map(|color| Shadow {
            color,
            blur: f64_of(&self.shadow_blur).unwrap_or(0.0),
            offset: Vec2::new(
                f64_of(&self.shadow_offset_x).unwrap_or(0.0),
                f64_of(&self.shadow_offset_y).unwrap_or(0.0),
            ),
        });

        ResolvedStyle {
            opacity: f64_of(&self.opacity).unwrap_or(1.0),
            translate_x,
            translate_y,
            rotate,
            scale_x,
            scale_y,
            z_index: f64_of(&self.z_index).unwrap_or(0.0),
            overflow: self.overflow.unwrap_or(Overflow::Visible),
            background_color: color_of(&self.background_color).unwrap_or(Color::TRANSPARENT),
            border_color: color_of(&self.border_color),
            border_width: self
                .border_width
                .all
                .and_then(Dimension::points)
                .unwrap_or(0.0),
            radii,
            shadow,
            path: self.path.unwrap_or(false),
        }
    }

    /// `zIndex` without registering an observer.
    pub fn z_index(&self) -> f64 {
        self.z_index
            .as_ref()
            .map(|p| p.resolve(None))
            .unwrap_or(0.0)
    }

    /// Drop the observer of every animated paint field.
    pub fn release_observers(&self) {
        let release = |p: &dyn Releasable| p.release_observer();
        paint_props!(self, release);
    }

    pub fn has_animated(&self) -> bool {
        let mut any = false;
        let mut check = |p: &dyn Releasable| any |= p.animated();
        paint_props!(self, check);
        any
    }

    /// Set one property from its JSON form.
    ///
    /// Unknown keys are ignored. A recognized key with a value of the wrong shape fails with
    /// [`SceneryError::StyleValue`] and leaves the style unchanged.
    pub fn set_json(&mut self, key: &str, v: &Value) -> SceneryResult<()> {
        let dim = || Dimension::from_json(key, v);
        let num = || -> SceneryResult<Prop<f64>> {
            v.as_f64()
                .filter(|n| n.is_finite())
                .map(Prop::Value)
                .ok_or_else(|| SceneryError::style_value(key, v))
        };
        let color = || -> SceneryResult<Prop<Color>> {
            match v {
                Value::String(s) => Color::parse(s)
                    .map(Prop::Value)
                    .map_err(|_| SceneryError::style_value(key, v)),
                _ => serde_json::from_value::<Color>(v.clone())
                    .map(Prop::Value)
                    .map_err(|_| SceneryError::style_value(key, v)),
            }
        };
        fn keyword<T>(key: &str, v: &Value, parse: fn(&str) -> Option<T>) -> SceneryResult<T> {
            v.as_str()
                .and_then(parse)
                .ok_or_else(|| SceneryError::style_value(key, v))
        }

        match key {
            "width" => self.width = Some(dim()?),
            "height" => self.height = Some(dim()?),
            "minWidth" => self.min_width = Some(dim()?),
            "maxWidth" => self.max_width = Some(dim()?),
            "minHeight" => self.min_height = Some(dim()?),
            "maxHeight" => self.max_height = Some(dim()?),
            "flex" => self.flex = Some(dim()?),
            "flexGrow" => self.flex_grow = Some(dim()?),
            "flexShrink" => self.flex_shrink = Some(dim()?),
            "aspectRatio" => self.aspect_ratio = Some(dim()?),

            "justifyContent" => {
                self.justify_content = Some(keyword(key, v, JustifyContent::from_keyword)?)
            }
            "alignItems" => self.align_items = Some(keyword(key, v, Align::from_keyword)?),
            "alignSelf" => self.align_self = Some(keyword(key, v, Align::from_keyword)?),
            "alignContent" => self.align_content = Some(keyword(key, v, Align::from_keyword)?),
            "flexWrap" => self.flex_wrap = Some(keyword(key, v, FlexWrap::from_keyword)?),
            "flexDirection" => {
                self.flex_direction = Some(keyword(key, v, FlexDirection::from_keyword)?)
            }
            "position" => self.position = Some(keyword(key, v, PositionType::from_keyword)?),

            "left" => self.inset.left = Some(dim()?),
            "top" => self.inset.top = Some(dim()?),
            "right" => self.inset.right = Some(dim()?),
            "bottom" => self.inset.bottom = Some(dim()?),
            "padding" => self.padding.all = Some(dim()?),
            "paddingLeft" => self.padding.left = Some(dim()?),
            "paddingTop" => self.padding.top = Some(dim()?),
            "paddingRight" => self.padding.right = Some(dim()?),
            "paddingBottom" => self.padding.bottom = Some(dim()?),
            "margin" => self.margin.all = Some(dim()?),
            "marginLeft" => self.margin.left = Some(dim()?),
            "marginTop" => self.margin.top = Some(dim()?),
            "marginRight" => self.margin.right = Some(dim()?),
            "marginBottom" => self.margin.bottom = Some(dim()?),
            "borderWidth" => self.border_width.all = Some(dim()?),
            "borderLeftWidth" => self.border_width.left = Some(dim()?),
            "borderTopWidth" => self.border_width.top = Some(dim()?),
            "borderRightWidth" => self.border_width.right = Some(dim()?),
            "borderBottomWidth" => self.border_width.bottom = Some(dim()?),

            "opacity" => self.opacity = Some(num()?),
            "translateX" => self.translate_x = Some(num()?),
            "translateY" => self.translate_y = Some(num()?),
            "rotate" => self.rotate = Some(num()?),
            "scale" => self.scale = Some(num()?),
            "scaleX" => self.scale_x = Some(num()?),
            "scaleY" => self.scale_y = Some(num()?),
            "zIndex" => self.z_index = Some(num()?),
            "overflow" => self.overflow = Some(keyword(key, v, Overflow::from_style_keyword)?),
            "backgroundColor" => self.background_color = Some(color()?),
            "borderColor" => self.border_color = Some(color()?),
            "borderRadius" => self.border_radius = Some(num()?),
            "borderTopLeftRadius" => self.border_top_left_radius = Some(num()?),
            "borderTopRightRadius" => self.border_top_right_radius = Some(num()?),
            "borderBottomRightRadius" => self.border_bottom_right_radius = Some(num()?),
            "borderBottomLeftRadius" => self.border_bottom_left_radius = Some(num()?),
            "shadowColor" => self.shadow_color = Some(color()?),
            "shadowBlur" => self.shadow_blur = Some(num()?),
            "shadowOffsetX" => self.shadow_offset_x = Some(num()?),
            "shadowOffsetY" => self.shadow_offset_y = Some(num()?),
            "path" => {
                self.path = Some(
                    v.as_bool()
                        .ok_or_else(|| SceneryError::style_value(key, v))?,
                )
            }
            _ => tracing::trace!(key, "ignoring unknown style key"),
        }
        Ok(())
    }

    /// Build a style from a JSON object; the first malformed property fails the whole record.
    pub fn from_json(v: &Value) -> SceneryResult<Self> {
        let obj = v
            .as_object()
            .ok_or_else(|| SceneryError::style_value("style", v))?;
        let mut style = Style::default();
        for (key, value) in obj {
            style.set_json(key, value)?;
        }
        Ok(style)
    }

    /// Like [`Style::from_json`] but logs and skips malformed properties.
    pub fn from_json_lossy(v: &Value) -> Self {
        let mut style = Style::default();
        let Some(obj) = v.as_object() else {
            tracing::warn!(value = %v, "style is not an object; ignoring");
            return style;
        };
        for (key, value) in obj {
            if let Err(err) = style.set_json(key, value) {
                tracing::warn!(%err, "skipping style property");
            }
        }
        style
    }
}

trait Releasable {
    fn release_observer(&self);
    fn animated(&self) -> bool;
}

impl<T: Clone + 'static> Releasable for Prop<T> {
    fn release_observer(&self) {
        self.release();
    }

    fn animated(&self) -> bool {
        self.is_animated()
    }
}

/// Paint fields after observe-and-read, with defaults applied.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedStyle {
    pub opacity: f64,
    pub translate_x: f64,
    pub translate_y: f64,
    pub rotate: f64,
    /// `scaleX`, falling back to `scale`.
    pub scale_x: Option<f64>,
    /// `scaleY`, falling back to `scale`.
    pub scale_y: Option<f64>,
    pub z_index: f64,
    pub overflow: Overflow,
    pub background_color: Color,
    pub border_color: Option<Color>,
    pub border_width: f64,
    /// Top-left, top-right, bottom-right, bottom-left.
    pub radii: [f64; 4],
    pub shadow: Option<Shadow>,
    pub path: bool,
}

impl ResolvedStyle {
    pub fn clips(&self) -> bool {
        self.overflow == Overflow::Hidden
    }

    pub fn has_translate(&self) -> bool {
        self.translate_x != 0.0 || self.translate_y != 0.0
    }

    pub fn has_rotate_or_scale(&self) -> bool {
        self.rotate != 0.0 || self.scale_x.is_some() || self.scale_y.is_some()
    }

    /// Whether painting this node changes the transform or clip state.
    pub fn needs_save(&self) -> bool {
        self.has_translate() || self.has_rotate_or_scale() || self.clips()
    }

    /// Effective `(sx, sy)`; an unset axis stays at 1.
    pub fn scale(&self) -> (f64, f64) {
        (self.scale_x.unwrap_or(1.0), self.scale_y.unwrap_or(1.0))
    }

    pub fn has_border(&self) -> bool {
        self.border_width > 0.0 && self.border_color.is_some_and(|c| !c.is_transparent())
    }

    /// Whether the rounded-rect path is needed for background, border, clipping or content.
    pub fn needs_path(&self) -> bool {
        self.path || !self.background_color.is_transparent() || self.has_border() || self.clips()
    }
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Style::default().resolve(None)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/style.rs"]
mod tests;
