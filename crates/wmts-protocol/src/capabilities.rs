//! WMTS 1.0.0 capabilities parsing.
//!
//! Only the parts a client needs to build tile sources are extracted:
//! `Contents/Layer` and `Contents/TileMatrixSet`. Elements are matched by
//! local name, so documents using bare `<Identifier>` tags parse the same as
//! ones using `<ows:Identifier>`.

use std::mem;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;

use wmts_common::{TileMatrix, TileMatrixSet, ViewerError};

/// Parsed capabilities document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Capabilities {
    /// Service title, if present
    pub title: Option<String>,
    /// Layer records in document order
    pub layers: Vec<LayerRecord>,
    /// Tile matrix set records in document order
    pub tile_matrix_sets: Vec<TileMatrixSet>,
}

/// A `Contents/Layer` record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayerRecord {
    pub identifier: String,
    pub title: Option<String>,
    pub formats: Vec<String>,
    pub tile_matrix_set_links: Vec<String>,
    pub styles: Vec<StyleRecord>,
    pub time: Option<TimeDimension>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StyleRecord {
    pub identifier: String,
    pub is_default: bool,
}

/// The `Time` dimension advertised by a layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeDimension {
    pub default: Option<String>,
    pub values: Vec<String>,
}

impl LayerRecord {
    /// First advertised format.
    pub fn primary_format(&self) -> Option<&str> {
        self.formats.first().map(String::as_str)
    }

    /// First linked tile matrix set.
    pub fn primary_tile_matrix_set(&self) -> Option<&str> {
        self.tile_matrix_set_links.first().map(String::as_str)
    }

    /// Style flagged `isDefault`, else the first style, else "default".
    pub fn default_style(&self) -> &str {
        self.styles
            .iter()
            .find(|s| s.is_default)
            .or_else(|| self.styles.first())
            .map(|s| s.identifier.as_str())
            .unwrap_or("default")
    }
}

impl Capabilities {
    /// Parse a capabilities XML document.
    pub fn parse(xml: &str) -> Result<Self, CapabilitiesError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut parser = CapabilitiesParser::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => parser.start(&e),
                Ok(Event::Empty(e)) => {
                    parser.start(&e);
                    parser.end()?;
                }
                Ok(Event::Text(t)) => {
                    let text = t.unescape().map_err(|e| CapabilitiesError::Xml {
                        position: reader.buffer_position(),
                        message: e.to_string(),
                    })?;
                    parser.text(&text);
                }
                Ok(Event::CData(c)) => {
                    parser.text(&String::from_utf8_lossy(&c.into_inner()));
                }
                Ok(Event::End(_)) => parser.end()?,
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(CapabilitiesError::Xml {
                        position: reader.buffer_position(),
                        message: e.to_string(),
                    })
                }
                _ => {}
            }
            buf.clear();
        }

        let caps = parser.finish()?;
        tracing::debug!(
            layers = caps.layers.len(),
            tile_matrix_sets = caps.tile_matrix_sets.len(),
            "Parsed capabilities document"
        );
        Ok(caps)
    }

    /// Find a tile matrix set by identifier. First match wins.
    pub fn find_tile_matrix_set(&self, identifier: &str) -> Option<&TileMatrixSet> {
        self.tile_matrix_sets
            .iter()
            .find(|set| set.identifier == identifier)
    }

    pub fn layer(&self, identifier: &str) -> Option<&LayerRecord> {
        self.layers.iter().find(|l| l.identifier == identifier)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CapabilitiesError {
    #[error("XML error at position {position}: {message}")]
    Xml { position: usize, message: String },

    #[error("Invalid number in <{element}>: {value}")]
    InvalidNumber { element: String, value: String },

    #[error("Missing <{element}> in <{parent}>")]
    MissingElement { element: String, parent: String },

    #[error("Unbalanced closing tag")]
    Unbalanced,
}

impl From<CapabilitiesError> for ViewerError {
    fn from(err: CapabilitiesError) -> Self {
        ViewerError::CapabilitiesParse(err.to_string())
    }
}

#[derive(Debug, Default)]
struct MatrixBuilder {
    identifier: Option<String>,
    scale_denominator: Option<f64>,
    top_left_corner: Option<(f64, f64)>,
    tile_width: Option<u32>,
    tile_height: Option<u32>,
    matrix_width: Option<u32>,
    matrix_height: Option<u32>,
}

impl MatrixBuilder {
    fn build(self) -> Result<TileMatrix, CapabilitiesError> {
        let missing = |element: &str| CapabilitiesError::MissingElement {
            element: element.to_string(),
            parent: "TileMatrix".to_string(),
        };

        let tile_width = self.tile_width.unwrap_or(256);
        Ok(TileMatrix {
            identifier: self.identifier.ok_or_else(|| missing("Identifier"))?,
            scale_denominator: self
                .scale_denominator
                .ok_or_else(|| missing("ScaleDenominator"))?,
            top_left_corner: self
                .top_left_corner
                .ok_or_else(|| missing("TopLeftCorner"))?,
            tile_width,
            tile_height: self.tile_height.unwrap_or(tile_width),
            matrix_width: self.matrix_width.unwrap_or(1),
            matrix_height: self.matrix_height.unwrap_or(1),
        })
    }
}

/// Event-driven state for [`Capabilities::parse`].
#[derive(Debug, Default)]
struct CapabilitiesParser {
    stack: Vec<String>,
    text: String,
    caps: Capabilities,
    layer: Option<LayerRecord>,
    style: Option<StyleRecord>,
    dimension: Option<(Option<String>, TimeDimension)>,
    set: Option<TileMatrixSet>,
    matrix: Option<MatrixBuilder>,
}

impl CapabilitiesParser {
    fn start(&mut self, e: &BytesStart) {
        let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();

        match (self.stack.last().map(String::as_str), name.as_str()) {
            (Some("Contents"), "Layer") => self.layer = Some(LayerRecord::default()),
            (Some("Contents"), "TileMatrixSet") => {
                self.set = Some(TileMatrixSet {
                    identifier: String::new(),
                    supported_crs: None,
                    tile_matrices: Vec::new(),
                })
            }
            (Some("TileMatrixSet"), "TileMatrix") if self.set.is_some() => {
                self.matrix = Some(MatrixBuilder::default())
            }
            (Some("Layer"), "Style") if self.layer.is_some() => {
                self.style = Some(StyleRecord {
                    identifier: String::new(),
                    is_default: is_default_style(e),
                })
            }
            (Some("Layer"), "Dimension") if self.layer.is_some() => {
                self.dimension = Some((None, TimeDimension::default()))
            }
            _ => {}
        }

        self.stack.push(name);
        self.text.clear();
    }

    fn text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn end(&mut self) -> Result<(), CapabilitiesError> {
        let name = self.stack.pop().ok_or(CapabilitiesError::Unbalanced)?;
        let value = mem::take(&mut self.text).trim().to_string();
        let parent = self.stack.last().map(String::as_str);

        match (parent, name.as_str()) {
            (Some("ServiceIdentification"), "Title") => self.caps.title = Some(value),

            // Layer fields
            (Some("Layer"), "Identifier") => {
                if let Some(layer) = self.layer.as_mut() {
                    layer.identifier = value;
                }
            }
            (Some("Layer"), "Title") => {
                if let Some(layer) = self.layer.as_mut() {
                    layer.title = Some(value);
                }
            }
            (Some("Layer"), "Format") => {
                if let Some(layer) = self.layer.as_mut() {
                    layer.formats.push(value);
                }
            }
            (Some("TileMatrixSetLink"), "TileMatrixSet") => {
                if let Some(layer) = self.layer.as_mut() {
                    layer.tile_matrix_set_links.push(value);
                }
            }
            (Some("Style"), "Identifier") => {
                if let Some(style) = self.style.as_mut() {
                    style.identifier = value;
                }
            }
            (Some("Dimension"), field) => {
                if let Some((identifier, dim)) = self.dimension.as_mut() {
                    match field {
                        "Identifier" => *identifier = Some(value),
                        "Default" => dim.default = Some(value),
                        "Value" => dim.values.push(value),
                        _ => {}
                    }
                }
            }
            (Some("Layer"), "Style") => {
                if let (Some(layer), Some(style)) = (self.layer.as_mut(), self.style.take()) {
                    layer.styles.push(style);
                }
            }
            (Some("Layer"), "Dimension") => {
                if let (Some(layer), Some((identifier, dim))) =
                    (self.layer.as_mut(), self.dimension.take())
                {
                    if identifier.is_some_and(|id| id.eq_ignore_ascii_case("time")) {
                        layer.time = Some(dim);
                    }
                }
            }
            (Some("Contents"), "Layer") => {
                if let Some(layer) = self.layer.take() {
                    if layer.identifier.is_empty() {
                        return Err(CapabilitiesError::MissingElement {
                            element: "Identifier".to_string(),
                            parent: "Layer".to_string(),
                        });
                    }
                    self.caps.layers.push(layer);
                }
            }

            // Tile matrix set fields
            (Some("TileMatrixSet"), "Identifier") => {
                if let Some(set) = self.set.as_mut() {
                    set.identifier = value;
                }
            }
            (Some("TileMatrixSet"), "SupportedCRS") => {
                if let Some(set) = self.set.as_mut() {
                    set.supported_crs = Some(value);
                }
            }
            (Some("TileMatrix"), field) => {
                if let Some(matrix) = self.matrix.as_mut() {
                    match field {
                        "Identifier" => matrix.identifier = Some(value),
                        "ScaleDenominator" => {
                            matrix.scale_denominator = Some(parse_number(field, &value)?)
                        }
                        "TopLeftCorner" => {
                            matrix.top_left_corner = Some(parse_corner(&value)?)
                        }
                        "TileWidth" => matrix.tile_width = Some(parse_number(field, &value)?),
                        "TileHeight" => matrix.tile_height = Some(parse_number(field, &value)?),
                        "MatrixWidth" => matrix.matrix_width = Some(parse_number(field, &value)?),
                        "MatrixHeight" => {
                            matrix.matrix_height = Some(parse_number(field, &value)?)
                        }
                        _ => {}
                    }
                }
            }
            (Some("TileMatrixSet"), "TileMatrix") => {
                if let (Some(set), Some(matrix)) = (self.set.as_mut(), self.matrix.take()) {
                    set.tile_matrices.push(matrix.build()?);
                }
            }
            (Some("Contents"), "TileMatrixSet") => {
                if let Some(set) = self.set.take() {
                    if set.identifier.is_empty() {
                        return Err(CapabilitiesError::MissingElement {
                            element: "Identifier".to_string(),
                            parent: "TileMatrixSet".to_string(),
                        });
                    }
                    self.caps.tile_matrix_sets.push(set);
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn finish(self) -> Result<Capabilities, CapabilitiesError> {
        if !self.stack.is_empty() {
            return Err(CapabilitiesError::Unbalanced);
        }
        Ok(self.caps)
    }
}

fn is_default_style(e: &BytesStart) -> bool {
    e.attributes().flatten().any(|attr| {
        attr.key.local_name().as_ref() == b"isDefault" && attr.value.as_ref() == b"true"
    })
}

fn parse_number<T: std::str::FromStr>(element: &str, value: &str) -> Result<T, CapabilitiesError> {
    value.parse().map_err(|_| CapabilitiesError::InvalidNumber {
        element: element.to_string(),
        value: value.to_string(),
    })
}

fn parse_corner(value: &str) -> Result<(f64, f64), CapabilitiesError> {
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(x), Some(y), None) => Ok((
            parse_number("TopLeftCorner", x)?,
            parse_number("TopLeftCorner", y)?,
        )),
        _ => Err(CapabilitiesError::InvalidNumber {
            element: "TopLeftCorner".to_string(),
            value: value.to_string(),
        }),
    }
}
