//! Host binding: the statically declared table of constructible primitive types.
//!
//! Each [`Adapter`] lists its parameters in declaration order with a
//! converter and a default. Binding takes, per parameter, the positional
//! argument at its index, else the same-named property (case-insensitive),
//! else the default. The converted values feed the adapter's factory.

use thiserror::Error;

use super::value::{PropertyMap, Value};
use crate::config::PlaybackConfig;
use crate::geometry::{bounds_center, centered, Point};
use crate::render::GlyphSource;
use crate::scene::{Align, Primitive};

#[derive(Debug, Error, PartialEq)]
pub enum HostError {
    #[error("{ty}: missing parameter `{param}`")]
    MissingParameter { ty: &'static str, param: &'static str },
    #[error("{ty}: parameter `{param}` cannot take {value}")]
    InvalidValue {
        ty: &'static str,
        param: &'static str,
        value: String,
    },
    #[error("no host type named `{0}`")]
    UnknownType(String),
}

/// How a script value becomes a constructor argument.
#[derive(Debug, Clone, Copy)]
pub enum Converter {
    /// Narrowed to `f32`.
    Float,
    Text,
    /// A 3-element array or an `"x,y,z"` string.
    Vec3,
    Bool,
    /// `[[x, y], ...]`.
    Points,
    /// One of the listed names, case-insensitive.
    Enum(&'static [&'static str]),
}

/// A converted constructor argument.
#[derive(Debug, Clone, PartialEq)]
pub enum HostArg {
    Float(f32),
    Text(String),
    Vec3([f32; 3]),
    Bool(bool),
    Points(Vec<Point>),
    Enum(&'static str),
}

impl Converter {
    pub fn convert(self, value: &Value) -> Option<HostArg> {
        match self {
            Converter::Float => match value {
                Value::Number(n) => Some(HostArg::Float(*n as f32)),
                Value::Bool(b) => Some(HostArg::Float(f32::from(u8::from(*b)))),
                Value::String(s) => s.trim().parse().ok().map(HostArg::Float),
                _ => None,
            },
            Converter::Text => match value {
                Value::String(_) | Value::Number(_) | Value::Bool(_) => {
                    Some(HostArg::Text(value.to_string()))
                }
                _ => None,
            },
            Converter::Vec3 => parse_vec3(value).map(HostArg::Vec3),
            Converter::Bool => match value {
                Value::Bool(b) => Some(HostArg::Bool(*b)),
                Value::Number(n) => Some(HostArg::Bool(*n != 0.0)),
                Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Some(HostArg::Bool(true)),
                Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Some(HostArg::Bool(false)),
                _ => None,
            },
            Converter::Points => parse_points(value).map(HostArg::Points),
            Converter::Enum(names) => match value {
                Value::String(s) => names
                    .iter()
                    .find(|n| n.eq_ignore_ascii_case(s.trim()))
                    .map(|n| HostArg::Enum(*n)),
                _ => None,
            },
        }
    }
}

fn parse_vec3(value: &Value) -> Option<[f32; 3]> {
    let parts: Vec<f32> = match value {
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::Number(n) => Some(*n as f32),
                _ => None,
            })
            .collect::<Option<_>>()?,
        Value::String(s) => s
            .split(',')
            .map(|p| p.trim().parse().ok())
            .collect::<Option<_>>()?,
        _ => return None,
    };
    parts.try_into().ok()
}

fn parse_points(value: &Value) -> Option<Vec<Point>> {
    value
        .as_array()?
        .iter()
        .map(|item| match item.numbers().as_slice() {
            [x, y, ..] => Some(Point::new(*x as f32, *y as f32)),
            _ => None,
        })
        .collect()
}

/// Fallback when a parameter gets neither a positional argument nor a property.
#[derive(Debug, Clone, Copy)]
pub enum ParamDefault {
    Number(f64),
    Bool(bool),
    Text(&'static str),
    Vec3([f64; 3]),
    EmptyList,
    CircleSegments,
    TextSize,
    Font,
}

impl ParamDefault {
    fn value(self, config: &PlaybackConfig) -> Value {
        match self {
            ParamDefault::Number(n) => Value::Number(n),
            ParamDefault::Bool(b) => Value::Bool(b),
            ParamDefault::Text(s) => Value::from(s),
            ParamDefault::Vec3(v) => Value::Array(v.iter().copied().map(Value::Number).collect()),
            ParamDefault::EmptyList => Value::Array(Vec::new()),
            ParamDefault::CircleSegments => Value::Number(f64::from(config.circle_segments)),
            ParamDefault::TextSize => Value::Number(f64::from(config.text_size)),
            ParamDefault::Font => Value::from(config.font.as_str()),
        }
    }
}

#[derive(Debug)]
pub struct Param {
    pub name: &'static str,
    pub converter: Converter,
    pub default: ParamDefault,
}

const fn param(name: &'static str, converter: Converter, default: ParamDefault) -> Param {
    Param {
        name,
        converter,
        default,
    }
}

/// What factories may consult besides their arguments.
pub struct HostContext<'a> {
    pub config: &'a PlaybackConfig,
    pub glyphs: &'a dyn GlyphSource,
}

/// Converted arguments, one per declared parameter.
#[derive(Debug)]
pub struct BoundArgs {
    ty: &'static str,
    values: Vec<(&'static str, HostArg)>,
}

impl BoundArgs {
    fn find(&self, name: &'static str) -> Result<&HostArg, HostError> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
            .ok_or(HostError::MissingParameter {
                ty: self.ty,
                param: name,
            })
    }

    fn mismatch(&self, name: &'static str, arg: &HostArg) -> HostError {
        HostError::InvalidValue {
            ty: self.ty,
            param: name,
            value: format!("{arg:?}"),
        }
    }

    pub fn float(&self, name: &'static str) -> Result<f32, HostError> {
        match self.find(name)? {
            HostArg::Float(f) => Ok(*f),
            other => Err(self.mismatch(name, other)),
        }
    }

    pub fn text(&self, name: &'static str) -> Result<&str, HostError> {
        match self.find(name)? {
            HostArg::Text(s) => Ok(s),
            other => Err(self.mismatch(name, other)),
        }
    }

    pub fn vec3(&self, name: &'static str) -> Result<[f32; 3], HostError> {
        match self.find(name)? {
            HostArg::Vec3(v) => Ok(*v),
            other => Err(self.mismatch(name, other)),
        }
    }

    pub fn boolean(&self, name: &'static str) -> Result<bool, HostError> {
        match self.find(name)? {
            HostArg::Bool(b) => Ok(*b),
            other => Err(self.mismatch(name, other)),
        }
    }

    pub fn points(&self, name: &'static str) -> Result<&[Point], HostError> {
        match self.find(name)? {
            HostArg::Points(p) => Ok(p),
            other => Err(self.mismatch(name, other)),
        }
    }

    pub fn choice(&self, name: &'static str) -> Result<&'static str, HostError> {
        match self.find(name)? {
            HostArg::Enum(n) => Ok(*n),
            other => Err(self.mismatch(name, other)),
        }
    }
}

pub type Factory = fn(&BoundArgs, &HostContext<'_>) -> Result<Primitive, HostError>;

/// A constructible host type.
pub struct Adapter {
    pub type_name: &'static str,
    pub params: &'static [Param],
    pub factory: Factory,
}

impl Adapter {
    /// Bind and convert every declared parameter.
    pub fn bind(
        &self,
        positional: &[Value],
        props: &PropertyMap,
        config: &PlaybackConfig,
    ) -> Result<BoundArgs, HostError> {
        if positional.len() > self.params.len() {
            log::debug!(
                "{}: ignoring {} extra arguments",
                self.type_name,
                positional.len() - self.params.len()
            );
        }
        let mut values = Vec::with_capacity(self.params.len());
        for (i, p) in self.params.iter().enumerate() {
            let value = positional
                .get(i)
                .filter(|v| !v.is_null())
                .or_else(|| props.get_ignore_case(p.name))
                .cloned()
                .unwrap_or_else(|| p.default.value(config));
            if value.is_null() {
                return Err(HostError::MissingParameter {
                    ty: self.type_name,
                    param: p.name,
                });
            }
            let arg = p.converter.convert(&value).ok_or_else(|| HostError::InvalidValue {
                ty: self.type_name,
                param: p.name,
                value: value.to_string(),
            })?;
            values.push((p.name, arg));
        }
        Ok(BoundArgs {
            ty: self.type_name,
            values,
        })
    }

    pub fn build(
        &self,
        positional: &[Value],
        props: &PropertyMap,
        ctx: &HostContext<'_>,
    ) -> Result<Primitive, HostError> {
        let args = self.bind(positional, props, ctx.config)?;
        (self.factory)(&args, ctx)
    }
}

static ADAPTERS: [Adapter; 5] = [
    Adapter {
        type_name: "rect",
        params: &[
            param("width", Converter::Float, ParamDefault::Number(0.5)),
            param("height", Converter::Float, ParamDefault::Number(0.5)),
            param("filled", Converter::Bool, ParamDefault::Bool(true)),
        ],
        factory: build_rect,
    },
    Adapter {
        type_name: "circle",
        params: &[
            param("radius", Converter::Float, ParamDefault::Number(0.25)),
            param("filled", Converter::Bool, ParamDefault::Bool(true)),
            param("segments", Converter::Float, ParamDefault::CircleSegments),
        ],
        factory: build_circle,
    },
    Adapter {
        type_name: "polygon",
        params: &[
            param("points", Converter::Points, ParamDefault::EmptyList),
            param("filled", Converter::Bool, ParamDefault::Bool(true)),
        ],
        factory: build_polygon,
    },
    Adapter {
        type_name: "line",
        params: &[
            param("from", Converter::Vec3, ParamDefault::Vec3([0.0, 0.0, 0.0])),
            param("to", Converter::Vec3, ParamDefault::Vec3([1.0, 0.0, 0.0])),
        ],
        factory: build_line,
    },
    Adapter {
        type_name: "text",
        params: &[
            param("content", Converter::Text, ParamDefault::Text("")),
            param("size", Converter::Float, ParamDefault::TextSize),
            param("font", Converter::Text, ParamDefault::Font),
            param("align", Converter::Enum(Align::NAMES), ParamDefault::Text("center")),
        ],
        factory: build_text,
    },
];

/// Look up a host type by case-insensitive name.
pub fn adapter(type_name: &str) -> Option<&'static Adapter> {
    ADAPTERS
        .iter()
        .find(|a| a.type_name.eq_ignore_ascii_case(type_name))
}

pub fn type_names() -> impl Iterator<Item = &'static str> {
    ADAPTERS.iter().map(|a| a.type_name)
}

/// Build a primitive of the named host type.
pub fn build(
    type_name: &str,
    positional: &[Value],
    props: &PropertyMap,
    ctx: &HostContext<'_>,
) -> Result<Primitive, HostError> {
    adapter(type_name)
        .ok_or_else(|| HostError::UnknownType(type_name.to_string()))?
        .build(positional, props, ctx)
}

fn build_rect(args: &BoundArgs, _ctx: &HostContext<'_>) -> Result<Primitive, HostError> {
    Ok(Primitive::rect(
        args.float("width")?,
        args.float("height")?,
        args.boolean("filled")?,
    ))
}

fn build_circle(args: &BoundArgs, _ctx: &HostContext<'_>) -> Result<Primitive, HostError> {
    let segments = args.float("segments")?.round().max(3.0) as u32;
    Ok(Primitive::circle(
        args.float("radius")?,
        segments,
        args.boolean("filled")?,
    ))
}

/// Polygon points are stored centred; their offset becomes the position.
fn build_polygon(args: &BoundArgs, _ctx: &HostContext<'_>) -> Result<Primitive, HostError> {
    let points = args.points("points")?;
    if points.is_empty() {
        return Err(HostError::InvalidValue {
            ty: "polygon",
            param: "points",
            value: "[]".to_string(),
        });
    }
    let center = bounds_center(points);
    let mut polygon = Primitive::polygon(centered(points), args.boolean("filled")?);
    polygon.transform.x = center.x;
    polygon.transform.y = center.y;
    Ok(polygon)
}

fn build_line(args: &BoundArgs, _ctx: &HostContext<'_>) -> Result<Primitive, HostError> {
    Ok(Primitive::line(args.vec3("from")?, args.vec3("to")?))
}

fn build_text(args: &BoundArgs, ctx: &HostContext<'_>) -> Result<Primitive, HostError> {
    let align = args.choice("align")?;
    Ok(Primitive::text(
        ctx.glyphs,
        args.text("content")?,
        args.float("size")?,
        args.text("font")?,
        Align::from_name(align).unwrap_or_default(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::BoxGlyphs;
    use crate::scene::Shape;

    fn ctx(config: &PlaybackConfig) -> HostContext<'_> {
        HostContext {
            config,
            glyphs: &BoxGlyphs,
        }
    }

    fn props(entries: &[(&str, Value)]) -> PropertyMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn rect_from_properties() {
        let config = PlaybackConfig::default();
        let p = build(
            "rect",
            &[],
            &props(&[("width", Value::Number(0.2)), ("height", Value::Number(0.1))]),
            &ctx(&config),
        )
        .unwrap();
        assert_eq!(
            p.shape,
            Shape::Rect {
                width: 0.2,
                height: 0.1
            }
        );
        assert!(p.filled);
    }

    #[test]
    fn positional_beats_property_and_converts_bool_strings() {
        let config = PlaybackConfig::default();
        let p = build(
            "Rect",
            &[Value::Number(0.6), Value::Number(0.4), Value::from("false")],
            &props(&[("width", Value::Number(9.0))]),
            &ctx(&config),
        )
        .unwrap();
        assert_eq!(
            p.shape,
            Shape::Rect {
                width: 0.6,
                height: 0.4
            }
        );
        assert!(!p.filled);
    }

    #[test]
    fn property_names_are_case_insensitive() {
        let config = PlaybackConfig::default();
        let p = build("circle", &[], &props(&[("RADIUS", Value::Number(0.5))]), &ctx(&config)).unwrap();
        assert_eq!(
            p.shape,
            Shape::Circle {
                radius: 0.5,
                segments: 48
            }
        );
    }

    #[test]
    fn circle_segments_default_from_config() {
        let config = PlaybackConfig {
            circle_segments: 16,
            ..PlaybackConfig::default()
        };
        let p = build("circle", &[], &PropertyMap::new(), &ctx(&config)).unwrap();
        assert_eq!(p.boundary.len(), 16);
    }

    #[test]
    fn line_accepts_vector_strings_and_arrays() {
        let config = PlaybackConfig::default();
        let to = Value::Array(vec![Value::Number(0.0), Value::Number(1.0), Value::Number(0.0)]);
        let p = build(
            "line",
            &[],
            &props(&[("from", Value::from("0.5, 0.5, 0")), ("to", to)]),
            &ctx(&config),
        )
        .unwrap();
        assert_eq!(
            p.shape,
            Shape::Line {
                from: [0.5, 0.5, 0.0],
                to: [0.0, 1.0, 0.0]
            }
        );
    }

    #[test]
    fn bad_vector_is_invalid() {
        let config = PlaybackConfig::default();
        let err = build("line", &[Value::from("1,2")], &PropertyMap::new(), &ctx(&config)).unwrap_err();
        assert!(matches!(err, HostError::InvalidValue { param: "from", .. }));
    }

    #[test]
    fn polygon_is_centred_at_its_offset() {
        let config = PlaybackConfig::default();
        let pts = Value::Array(
            [[1.0, 1.0], [2.0, 1.0], [2.0, 2.0]]
                .iter()
                .map(|p| Value::Array(vec![Value::Number(p[0]), Value::Number(p[1])]))
                .collect(),
        );
        let p = build("polygon", &[pts], &PropertyMap::new(), &ctx(&config)).unwrap();
        assert_eq!((p.transform.x, p.transform.y), (1.5, 1.5));
        assert_eq!(p.boundary[0], Point::new(-0.5, -0.5));
    }

    #[test]
    fn empty_polygon_fails() {
        let config = PlaybackConfig::default();
        assert!(build("polygon", &[], &PropertyMap::new(), &ctx(&config)).is_err());
    }

    #[test]
    fn text_align_is_an_enum() {
        let config = PlaybackConfig::default();
        let p = build(
            "text",
            &[Value::from("hi")],
            &props(&[("align", Value::from("LEFT"))]),
            &ctx(&config),
        )
        .unwrap();
        match &p.shape {
            Shape::Text {
                content,
                size,
                font,
                align,
            } => {
                assert_eq!(content, "hi");
                assert_eq!(*size, 0.1);
                assert_eq!(font, "default");
                assert_eq!(*align, Align::Left);
            }
            other => panic!("unexpected shape {other:?}"),
        }

        let err = build("text", &[], &props(&[("align", Value::from("middle"))]), &ctx(&config)).unwrap_err();
        assert!(matches!(err, HostError::InvalidValue { param: "align", .. }));
    }

    #[test]
    fn unknown_type() {
        let config = PlaybackConfig::default();
        assert_eq!(
            build("star", &[], &PropertyMap::new(), &ctx(&config)).unwrap_err(),
            HostError::UnknownType("star".into())
        );
        assert_eq!(type_names().count(), 5);
    }

    #[test]
    fn bool_converter_rules() {
        assert_eq!(Converter::Bool.convert(&Value::Number(2.0)), Some(HostArg::Bool(true)));
        assert_eq!(Converter::Bool.convert(&Value::from("TRUE")), Some(HostArg::Bool(true)));
        assert_eq!(Converter::Bool.convert(&Value::from("yes")), None);
        assert_eq!(Converter::Float.convert(&Value::from("x")), None);
        assert_eq!(Converter::Text.convert(&Value::Number(3.0)), Some(HostArg::Text("3".into())));
    }
}
