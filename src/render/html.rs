//! Standalone HTML export
//!
//! The figure is resolved to plain per-point records (position, diameter,
//! fill color, tooltip) and embedded as JSON next to a small script that
//! draws it with Leaflet (tile back-end) or Plotly (mapbox back-end) loaded
//! from a CDN.

use crate::core::{config::Backend, geo::LatLng, geo::Point};
use crate::data::table::Table;
use crate::pipeline::{
    assembler::{ColorParam, SizeParam, TraceParams},
    Figure,
};
use crate::style::palette::ColorMapper;
use crate::Result;
use serde::Serialize;
use std::path::Path;

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Number of color stops drawn in the color bar gradient
const COLOR_BAR_STOPS: usize = 11;

#[derive(Debug, Serialize)]
struct Document<'a> {
    title: &'a str,
    backend: Backend,
    style: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tiles: Option<TilesDoc<'a>>,
    alpha: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    outline: Option<OutlineDoc<'a>>,
    traces: Vec<TraceDoc>,
    view: ViewDoc,
    #[serde(skip_serializing_if = "Option::is_none")]
    color_bar: Option<ColorBarDoc<'a>>,
}

#[derive(Debug, Serialize)]
struct TilesDoc<'a> {
    url: &'a str,
    attribution: &'a str,
}

#[derive(Debug, Serialize)]
struct OutlineDoc<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<&'a str>,
    width: f64,
    alpha: f64,
}

#[derive(Debug, Serialize)]
struct TraceDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    points: Vec<PointDoc>,
}

#[derive(Debug, Serialize)]
struct PointDoc {
    lat: f64,
    lon: f64,
    size: f64,
    fill: String,
    tooltip: String,
}

#[derive(Debug, Serialize)]
struct ViewDoc {
    center: LatLng,
    zoom: f64,
    bounds: [[f64; 2]; 2],
}

#[derive(Debug, Serialize)]
struct ColorBarDoc<'a> {
    title: &'a str,
    low: f64,
    high: f64,
    stops: Vec<String>,
}

/// Renders `figure` as a self-contained HTML page
pub fn export_html(figure: &Figure, title: &str) -> Result<String> {
    let document = build_document(figure, title)?;
    let data = serde_json::to_string(&document)?.replace("</", "<\\/");

    let (head, script) = match figure.params.backend {
        Backend::Tile => (
            format!(
                "<link rel=\"stylesheet\" href=\"{}\">\n  <script src=\"{}\"></script>",
                LEAFLET_CSS, LEAFLET_JS
            ),
            TILE_SCRIPT,
        ),
        Backend::Mapbox => (format!("<script src=\"{}\"></script>", PLOTLY_JS), MAPBOX_SCRIPT),
    };

    let title = escape_html(title);
    Ok(fill_template(
        TEMPLATE,
        &[
            ("TITLE", title.as_str()),
            ("HEAD", head.as_str()),
            ("SHARED", SHARED_SCRIPT),
            ("SCRIPT", script),
            ("DATA", data.as_str()),
        ],
    ))
}

/// Substitutes `{{KEY}}` placeholders in one pass. Inserted values are never
/// scanned again, so user text cannot expand other placeholders.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let value = after.find("}}").and_then(|end| {
            let key = &after[..end];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, end))
        });
        match value {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Writes the HTML export of `figure` to `path`
pub fn write_html(figure: &Figure, title: &str, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let html = export_html(figure, title)?;
    std::fs::write(path, html.as_bytes())?;
    log::info!("wrote {} ({} bytes)", path.display(), html.len());
    Ok(())
}

fn build_document<'a>(figure: &'a Figure, title: &'a str) -> Result<Document<'a>> {
    let params = &figure.params;
    let source = &figure.source;
    let positions = positions(figure)?;

    let sizes: Vec<f64> = match &params.size {
        SizeParam::Fixed(size) => vec![*size; source.row_count()],
        SizeParam::Field(field) => source.numeric(field)?.to_vec(),
    };

    let tooltip_columns = params
        .tooltips
        .iter()
        .map(|tooltip| -> Result<_> {
            Ok((tooltip.label.as_str(), source.column(tooltip.field_name())?))
        })
        .collect::<Result<Vec<_>>>()?;
    let tooltip = |row: usize| {
        tooltip_columns
            .iter()
            .map(|(label, column)| {
                format!("<b>{}</b>: {}", escape_html(label), escape_html(&column.display(row)))
            })
            .collect::<Vec<_>>()
            .join("<br>")
    };

    let traces = params
        .traces
        .iter()
        .map(|trace| -> Result<TraceDoc> {
            let fill = fill_for(trace, source)?;
            let rows: Vec<usize> = match &trace.rows {
                Some(rows) => rows.clone(),
                None => (0..source.row_count()).collect(),
            };
            let points = rows
                .into_iter()
                .map(|row| PointDoc {
                    lat: positions[row].lat,
                    lon: positions[row].lng,
                    size: sizes[row],
                    fill: fill(row),
                    tooltip: tooltip(row),
                })
                .collect();
            Ok(TraceDoc {
                name: trace.legend_label.as_deref().map(escape_html),
                points,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let tiles = params.tile_url.as_deref().map(|url| TilesDoc {
        url,
        attribution: params.attribution.as_deref().unwrap_or_default(),
    });

    let outline = params.line_width.map(|width| OutlineDoc {
        color: params.line_color.as_deref(),
        width,
        alpha: params.line_alpha.unwrap_or(1.0),
    });

    let color_bar = params.color_bar.as_ref().map(|bar| ColorBarDoc {
        title: &bar.title,
        low: bar.low,
        high: bar.high,
        stops: bar
            .scale
            .sample(COLOR_BAR_STOPS)
            .into_iter()
            .map(|color| color.to_hex())
            .collect(),
    });

    let bounds = &figure.view.bounds;
    Ok(Document {
        title,
        backend: params.backend,
        style: params.basemap.token(),
        tiles,
        alpha: params.alpha,
        outline,
        traces,
        view: ViewDoc {
            center: params.center.unwrap_or(figure.view.center),
            zoom: params.zoom.unwrap_or(figure.view.zoom),
            bounds: [
                [bounds.south_west.lat, bounds.south_west.lng],
                [bounds.north_east.lat, bounds.north_east.lng],
            ],
        },
        color_bar,
    })
}

/// Geographic position of every row. The tile back-end references projected
/// columns, which are mapped back to latitude/longitude for drawing.
fn positions(figure: &Figure) -> Result<Vec<LatLng>> {
    let params = &figure.params;
    let xs = figure.source.numeric(&params.x)?;
    let ys = figure.source.numeric(&params.y)?;
    Ok(xs
        .iter()
        .zip(ys)
        .map(|(&x, &y)| match params.backend {
            Backend::Tile => LatLng::from_mercator(Point::new(x, y)),
            Backend::Mapbox => LatLng::new(y, x),
        })
        .collect())
}

fn fill_for<'a>(
    trace: &'a TraceParams,
    source: &'a Table,
) -> Result<Box<dyn Fn(usize) -> String + 'a>> {
    let fill: Box<dyn Fn(usize) -> String + 'a> = match &trace.color {
        ColorParam::Fixed { color } => Box::new(move |_: usize| color.clone()),
        ColorParam::Linear {
            field,
            scale,
            low,
            high,
        } => {
            let values = source.numeric(field)?;
            let mapper = ColorMapper::new(*scale, *low, *high);
            Box::new(move |row: usize| mapper.map(values[row]).to_hex())
        }
    };
    Ok(fill)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{TITLE}}</title>
  {{HEAD}}
  <style>
    html, body { margin: 0; height: 100%; }
    #map { position: absolute; inset: 0; }
    .color-bar { position: absolute; right: 12px; top: 50%; transform: translateY(-50%);
      z-index: 1000; background: rgba(255, 255, 255, 0.85); padding: 8px; border-radius: 4px;
      font: 12px sans-serif; display: flex; flex-direction: column; align-items: center; }
    .color-bar .ramp { width: 16px; height: 200px; margin: 4px 0; }
  </style>
</head>
<body>
  <div id="map"></div>
  <script type="application/json" id="figure-data">{{DATA}}</script>
  <script>
{{SHARED}}
{{SCRIPT}}
  </script>
</body>
</html>
"#;

const SHARED_SCRIPT: &str = r#"    var doc = JSON.parse(document.getElementById('figure-data').textContent);
    function addColorBar() {
      if (!doc.color_bar) return;
      var bar = document.createElement('div');
      bar.className = 'color-bar';
      var title = document.createElement('b');
      title.textContent = doc.color_bar.title;
      var high = document.createElement('span');
      high.textContent = doc.color_bar.high;
      var ramp = document.createElement('div');
      ramp.className = 'ramp';
      ramp.style.background = 'linear-gradient(to top, ' + doc.color_bar.stops.join(', ') + ')';
      var low = document.createElement('span');
      low.textContent = doc.color_bar.low;
      [title, high, ramp, low].forEach(function (el) { bar.appendChild(el); });
      document.body.appendChild(bar);
    }"#;

const TILE_SCRIPT: &str = r#"    var map = L.map('map', { preferCanvas: true, scrollWheelZoom: true });
    if (doc.tiles) {
      L.tileLayer(doc.tiles.url, { attribution: doc.tiles.attribution, maxZoom: 19 }).addTo(map);
    }
    var overlays = {};
    doc.traces.forEach(function (trace) {
      var group = L.featureGroup();
      trace.points.forEach(function (p) {
        var marker = L.circleMarker([p.lat, p.lon], {
          radius: p.size / 2,
          fillColor: p.fill,
          fillOpacity: doc.alpha,
          stroke: !!doc.outline,
          color: doc.outline && doc.outline.color ? doc.outline.color : p.fill,
          weight: doc.outline ? doc.outline.width : 0,
          opacity: doc.outline ? doc.outline.alpha : 0
        });
        if (p.tooltip) marker.bindTooltip(p.tooltip);
        group.addLayer(marker);
      });
      group.addTo(map);
      if (trace.name !== undefined) overlays[trace.name] = group;
    });
    if (Object.keys(overlays).length) {
      L.control.layers(null, overlays, { collapsed: false }).addTo(map);
    }
    map.fitBounds(doc.view.bounds, { padding: [20, 20], maxZoom: 18 });
    addColorBar();"#;

const MAPBOX_SCRIPT: &str = r#"    var traces = [];
    doc.traces.forEach(function (trace) {
      var lat = trace.points.map(function (p) { return p.lat; });
      var lon = trace.points.map(function (p) { return p.lon; });
      var size = trace.points.map(function (p) { return p.size; });
      var fill = trace.points.map(function (p) { return p.fill; });
      if (doc.outline && doc.outline.width > 0) {
        traces.push({
          type: 'scattermapbox', mode: 'markers', lat: lat, lon: lon,
          hoverinfo: 'skip', showlegend: false,
          marker: {
            size: size.map(function (s) { return s + 2 * doc.outline.width; }),
            color: doc.outline.color || fill,
            opacity: doc.outline.alpha
          }
        });
      }
      traces.push({
        type: 'scattermapbox', mode: 'markers', lat: lat, lon: lon,
        name: trace.name, showlegend: trace.name !== undefined,
        text: trace.points.map(function (p) { return p.tooltip; }),
        hoverinfo: 'text',
        marker: { size: size, color: fill, opacity: doc.alpha }
      });
    });
    var layout = {
      mapbox: {
        style: doc.style,
        center: { lat: doc.view.center.lat, lon: doc.view.center.lng },
        zoom: doc.view.zoom
      },
      margin: { l: 0, r: 0, t: 0, b: 0 },
      showlegend: true
    };
    Plotly.newPlot('map', traces, layout, { scrollZoom: true, responsive: true });
    addColorBar();"#;
