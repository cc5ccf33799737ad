//! GPX document parsing and symbol-preserving rewriting
//!
//! [`GpxDocument`] keeps the original XML text next to the waypoints read from it. Writing the
//! document back replays the original event stream and only touches the `<sym>` children of
//! top-level `<wpt>` elements whose symbol changed, so tracks, routes, metadata, extensions,
//! comments and namespace declarations come out exactly as they went in.
//!
//! The relabeling rule only sees the document through [`WaypointSequence`] and [`SymbolSlot`].

use crate::{IconError, Result};
use geo::Point;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::path::Path;

/// A waypoint as far as symbol assignment is concerned
pub trait SymbolSlot {
    fn symbol(&self) -> Option<&str>;
    fn set_symbol(&mut self, symbol: String);
}

/// An ordered, mutable sequence of waypoints
pub trait WaypointSequence {
    type Waypoint: SymbolSlot;

    fn waypoints(&self) -> &[Self::Waypoint];
    fn waypoints_mut(&mut self) -> &mut [Self::Waypoint];
}

/// Children of `<wpt>` that GPX orders after `<sym>`
const AFTER_SYM: &[&[u8]] = &[
    b"type",
    b"fix",
    b"sat",
    b"hdop",
    b"vdop",
    b"pdop",
    b"ageofdgpsdata",
    b"dgpsid",
    b"extensions",
];

/// A top-level `<wpt>` of a GPX file
#[derive(Clone, Debug, PartialEq)]
pub struct Waypoint {
    point: Point<f64>,
    pub elevation: Option<f64>,
    pub time: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    symbol: Option<String>,
    /// Symbol as found in the source text
    source_symbol: Option<String>,
}

impl Waypoint {
    fn from_start(element: &BytesStart) -> Result<Self> {
        let lat = coordinate(element, "lat")?;
        let lon = coordinate(element, "lon")?;
        Ok(Self {
            point: Point::new(lon, lat),
            elevation: None,
            time: None,
            name: None,
            description: None,
            symbol: None,
            source_symbol: None,
        })
    }

    /// Position, `x` is longitude and `y` latitude
    #[inline]
    pub fn point(&self) -> Point<f64> {
        self.point
    }

    #[inline]
    fn is_modified(&self) -> bool {
        self.symbol != self.source_symbol
    }

    fn set_field(&mut self, field: Field, text: String) {
        let text = text.trim().to_string();
        match field {
            Field::Elevation => self.elevation = text.parse().ok(),
            Field::Time => self.time = Some(text),
            Field::Name => self.name = Some(text),
            Field::Description => self.description = Some(text),
            Field::Symbol => {
                self.source_symbol = Some(text.clone());
                self.symbol = Some(text);
            }
        }
    }
}

impl SymbolSlot for Waypoint {
    #[inline]
    fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    #[inline]
    fn set_symbol(&mut self, symbol: String) {
        self.symbol = Some(symbol);
    }
}

fn coordinate(element: &BytesStart, key: &str) -> Result<f64> {
    let attribute = element.try_get_attribute(key)?.ok_or_else(|| {
        IconError::Format(format!("<wpt> lacks the {key} attribute"))
    })?;
    let value = attribute.unescape_value()?;
    value
        .trim()
        .parse()
        .map_err(|_| IconError::Format(format!("<wpt> has an invalid {key} value {value:?}")))
}

/// Waypoint children read into [`Waypoint`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    Elevation,
    Time,
    Name,
    Description,
    Symbol,
}

impl Field {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"ele" => Some(Field::Elevation),
            b"time" => Some(Field::Time),
            b"name" => Some(Field::Name),
            b"desc" => Some(Field::Description),
            b"sym" => Some(Field::Symbol),
            _ => None,
        }
    }
}

/// A parsed GPX file
#[derive(Clone, Debug)]
pub struct GpxDocument {
    /// The original XML text
    source: String,
    waypoints: Vec<Waypoint>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl GpxDocument {
    /// Parse GPX XML text
    ///
    /// Fails when the text is not well-formed XML, when the root element is not `gpx`, or when
    /// a top-level `wpt` lacks usable `lat`/`lon` attributes. Everything else is accepted
    /// as is, including a root without `version`.
    pub fn parse(text: &str) -> Result<Self> {
        let mut reader = Reader::from_str(text);

        let mut depth = 0usize;
        let mut seen_root = false;
        let mut waypoints = Vec::new();
        let mut current: Option<Waypoint> = None;
        let mut field: Option<(Field, String)> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    if depth == 0 {
                        check_root(&e, &mut seen_root)?;
                    } else if depth == 1 && e.local_name().as_ref() == b"wpt" {
                        current = Some(Waypoint::from_start(&e)?);
                    } else if depth == 2 && current.is_some() {
                        field = Field::from_local_name(e.local_name().as_ref())
                            .map(|field| (field, String::new()));
                    }
                    depth += 1;
                }
                Event::Empty(e) => {
                    if depth == 0 {
                        check_root(&e, &mut seen_root)?;
                    } else if depth == 1 && e.local_name().as_ref() == b"wpt" {
                        waypoints.push(Waypoint::from_start(&e)?);
                    } else if depth == 2 {
                        if let (Some(waypoint), Some(empty)) = (
                            current.as_mut(),
                            Field::from_local_name(e.local_name().as_ref()),
                        ) {
                            waypoint.set_field(empty, String::new());
                        }
                    }
                }
                Event::Text(t) if depth == 3 => {
                    if let Some((_, text)) = field.as_mut() {
                        text.push_str(&t.unescape()?);
                    }
                }
                Event::CData(t) if depth == 3 => {
                    if let Some((_, text)) = field.as_mut() {
                        text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                    }
                }
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    if depth == 2 {
                        if let (Some(waypoint), Some((name, text))) = (current.as_mut(), field.take())
                        {
                            waypoint.set_field(name, text);
                        }
                    } else if depth == 1 {
                        waypoints.extend(current.take());
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !seen_root {
            return Err(IconError::Format("no <gpx> root element".to_string()));
        }
        if depth != 0 {
            return Err(IconError::Format("unexpected end of document".to_string()));
        }

        Ok(Self {
            source: text.to_string(),
            waypoints,
        })
    }

    /// Read a whole file as UTF-8 and parse it
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| IconError::io(path, err))?;
        Self::parse(&text)
    }

    /// Serialize back to GPX XML text
    ///
    /// Unmodified waypoints and everything outside of them are copied event by event. For a
    /// waypoint whose symbol changed, an existing `<sym>` is replaced in place; otherwise a new
    /// one goes in front of the first child GPX orders after it, or last.
    pub fn to_xml(&self) -> Result<String> {
        let mut reader = Reader::from_str(&self.source);
        let mut writer = Writer::new(Vec::with_capacity(self.source.len() + 64));

        let mut depth = 0usize;
        let mut next_waypoint = 0usize;
        let mut edit: Option<SymbolEdit> = None;
        // Depth at which a replaced <sym> was opened, while skipping its content
        let mut skipping: Option<usize> = None;

        loop {
            let event = reader.read_event()?;

            if let Some(skip_depth) = skipping {
                match event {
                    Event::Start(_) => depth += 1,
                    Event::End(_) => {
                        depth -= 1;
                        if depth == skip_depth {
                            skipping = None;
                        }
                    }
                    Event::Eof => break,
                    _ => {}
                }
                continue;
            }

            match &event {
                Event::Start(e) => {
                    if depth == 1 && e.local_name().as_ref() == b"wpt" {
                        edit = self.edit_for(next_waypoint, e);
                        next_waypoint += 1;
                    } else if depth == 2 {
                        if let Some(edit) = edit.as_mut() {
                            let name = e.local_name();
                            if name.as_ref() == b"sym" {
                                edit.write_once(&mut writer)?;
                                skipping = Some(depth);
                                depth += 1;
                                continue;
                            }
                            if AFTER_SYM.contains(&name.as_ref()) {
                                edit.write_once(&mut writer)?;
                            }
                        }
                    }
                    depth += 1;
                }
                Event::Empty(e) => {
                    if depth == 1 && e.local_name().as_ref() == b"wpt" {
                        let waypoint_edit = self.edit_for(next_waypoint, e);
                        next_waypoint += 1;
                        if let Some(mut waypoint_edit) = waypoint_edit {
                            writer.write_event(Event::Start(e.borrow()))?;
                            waypoint_edit.write_once(&mut writer)?;
                            writer.write_event(Event::End(e.to_end()))?;
                            continue;
                        }
                    } else if depth == 2 {
                        if let Some(edit) = edit.as_mut() {
                            let name = e.local_name();
                            if name.as_ref() == b"sym" {
                                edit.write_once(&mut writer)?;
                                continue;
                            }
                            if AFTER_SYM.contains(&name.as_ref()) {
                                edit.write_once(&mut writer)?;
                            }
                        }
                    }
                }
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    if depth == 1 {
                        if let Some(mut edit) = edit.take() {
                            edit.write_once(&mut writer)?;
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }

            writer.write_event(event)?;
        }

        Ok(String::from_utf8(writer.into_inner())?)
    }

    fn edit_for(&self, index: usize, element: &BytesStart) -> Option<SymbolEdit> {
        let waypoint = self.waypoints.get(index)?;
        if !waypoint.is_modified() {
            return None;
        }

        let qualified = element.name();
        let tag = match qualified.prefix() {
            Some(prefix) => format!("{}:sym", String::from_utf8_lossy(prefix.as_ref())),
            None => "sym".to_string(),
        };
        Some(SymbolEdit {
            tag,
            symbol: waypoint.symbol.clone(),
            written: false,
        })
    }
}

fn check_root(element: &BytesStart, seen_root: &mut bool) -> Result<()> {
    if *seen_root {
        return Err(IconError::Format("more than one root element".to_string()));
    }
    if element.local_name().as_ref() != b"gpx" {
        return Err(IconError::Format(format!(
            "root element is <{}>, expected <gpx>",
            String::from_utf8_lossy(element.name().as_ref())
        )));
    }
    *seen_root = true;
    Ok(())
}

/// Pending `<sym>` output for one modified waypoint
struct SymbolEdit {
    /// `sym`, carrying the waypoint's namespace prefix if it has one
    tag: String,
    symbol: Option<String>,
    written: bool,
}

impl SymbolEdit {
    fn write_once(&mut self, writer: &mut Writer<Vec<u8>>) -> Result<()> {
        if std::mem::replace(&mut self.written, true) {
            return Ok(());
        }
        if let Some(symbol) = &self.symbol {
            writer.write_event(Event::Start(BytesStart::new(self.tag.as_str())))?;
            writer.write_event(Event::Text(BytesText::new(symbol)))?;
            writer.write_event(Event::End(BytesEnd::new(self.tag.as_str())))?;
        }
        Ok(())
    }
}

impl WaypointSequence for GpxDocument {
    type Waypoint = Waypoint;

    #[inline]
    fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    #[inline]
    fn waypoints_mut(&mut self) -> &mut [Waypoint] {
        &mut self.waypoints
    }
}
