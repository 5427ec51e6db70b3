//! HTML for the checker page and its embedded Leaflet map.
//!
//! Everything here is a pure function of the view data; the static parts of
//! the page live in constants.

use crate::markers::{map_center, Action, ConceptFilter, Marker, View};
use crate::matching::Radius;
use crate::summary::SummaryRow;
use crate::types::ALL_CONCEPTS;
use serde::Serialize;
use std::fmt::Write;

const ZOOM_START: u8 = 11;
const MARKER_PIXELS: u8 = 6;

/// Everything the page shows.
#[derive(Debug, Clone)]
pub struct PageView<'a> {
    pub radius: Radius,
    pub filter: &'a ConceptFilter,
    pub concepts: &'a [String],
    pub rows: &'a [SummaryRow],
    pub markers: &'a [Marker],
}

const STYLE: &str = r#"
    html, body { margin:0; padding:0; height:100vh; font-family:sans-serif; }
    header { display:flex; justify-content:space-between; align-items:center; height:4em; padding:0 1em; background:#fff; }
    header img { height:2.5em; }
    .container { display:flex; height:calc(100vh - 4em); }
    .sidebar { width:500px; padding:10px; box-sizing:border-box; overflow-y:auto; border-right:1px solid #ddd; }
    .sidebar form { margin-bottom:1em; }
    form label, form select, form input { display:block; margin:0.5em 0; font-size:1em; }
    .action-btn { padding:10px 20px; margin:5px 0; width:100%; border:none; border-radius:4px; cursor:pointer; color:#fff; font-size:1em; }
    .btn-green { background:#28a745; }
    .btn-orange { background:#ff8c00; }
    .btn-red { background:#dc3545; }
    .btn-white { background:#fff; color:#000; border:1px solid #ccc; }
    .btn-export { background:#007bff; }
    table { width:100%; border-collapse:collapse; margin-top:1em; }
    th, td { padding:8px; text-align:left; }
    th { background:#ccffcc; }
    tr:nth-child(even) { background:#f9f9f9; }
    tr.total { font-weight:bold; background:#ccffcc; }
    .map-panel { flex:1; display:flex; flex-direction:column; }
    .map-container { flex:1; }
    .export-form { text-align:center; margin:10px; }
"#;

const HEADER: &str = r#"<header>
  <div><img src="/static/bylc_logo.png" alt="By Life Connected"></div>
  <div>
    <img src="/static/sensingclues_logo.png" alt="SensingClues">
    <img src="/static/3edata_logo.png" alt="3edata">
  </div>
</header>"#;

const BUTTONS: [(Action, &str, &str); 4] = [
    (Action::Show(View::Matched), "btn-green", "Show Matched (green)"),
    (Action::Show(View::MappedNotMatched), "btn-orange", "Show Mapped but not matched (orange)"),
    (Action::Show(View::NotYetVisited), "btn-red", "Show Not yet visited (red)"),
    (Action::Show(View::All), "btn-white", "Show all"),
];

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render_page(view: &PageView) -> String {
    let radius = view.radius.to_string();
    let selected = escape_html(view.filter.as_form_value());
    let mut html = String::with_capacity(16 * 1024);

    html.push_str("<!DOCTYPE html>\n<html lang=\"nl\">\n<head>\n  <meta charset=\"UTF-8\">\n");
    html.push_str("  <title>Ground-truth status checker</title>\n");
    let _ = write!(html, "  <style>{}</style>\n</head>\n<body>\n{}\n", STYLE, HEADER);
    html.push_str("<div class=\"container\">\n  <div class=\"sidebar\">\n    <form method=\"post\">\n");
    let _ = writeln!(
        html,
        "      <label>Radius (m): <input type=\"number\" name=\"radius\" value=\"{}\" step=\"any\" min=\"0\" required></label>",
        radius
    );
    html.push_str("      <label>Concept:\n        <select name=\"concept\">\n");
    push_option(&mut html, ALL_CONCEPTS, *view.filter == ConceptFilter::All);
    for concept in view.concepts {
        push_option(&mut html, concept, view.filter.accepts(concept) && *view.filter != ConceptFilter::All);
    }
    html.push_str("        </select>\n      </label>\n");
    for (action, class, label) in BUTTONS {
        let _ = writeln!(
            html,
            "      <button type=\"submit\" name=\"action\" value=\"{}\" class=\"action-btn {}\">{}</button>",
            action, class, label
        );
    }
    html.push_str("    </form>\n");
    html.push_str(&render_table(view.rows));
    html.push_str("  </div>\n  <div class=\"map-panel\">\n    <div class=\"map-container\">");
    html.push_str(&render_map(view.markers, view.radius));
    html.push_str("</div>\n    <div class=\"export-form\">\n      <form method=\"post\">\n");
    let _ = writeln!(html, "        <input type=\"hidden\" name=\"radius\" value=\"{}\">", radius);
    let _ = writeln!(html, "        <input type=\"hidden\" name=\"concept\" value=\"{}\">", selected);
    let _ = writeln!(
        html,
        "        <button type=\"submit\" name=\"action\" value=\"{}\" class=\"action-btn btn-export\">Export Not yet visited locations (GeoJSON)</button>",
        Action::Export
    );
    html.push_str("      </form>\n    </div>\n  </div>\n</div>\n</body>\n</html>\n");
    html
}

fn push_option(html: &mut String, value: &str, selected: bool) {
    let value = escape_html(value);
    let _ = writeln!(
        html,
        "          <option value=\"{}\"{}>{}</option>",
        value,
        if selected { " selected" } else { "" },
        value
    );
}

pub fn render_table(rows: &[SummaryRow]) -> String {
    let mut html = String::from(
        "    <table>\n      <thead><tr><th>Mapped landcover</th><th>Matched</th><th>Not matched</th></tr></thead>\n      <tbody>\n",
    );
    for row in rows {
        let matched = row.matched.map(|m| m.to_string()).unwrap_or_default();
        let _ = writeln!(
            html,
            "        <tr{}><td>{}</td><td>{}</td><td>{}</td></tr>",
            if row.is_total() { " class=\"total\"" } else { "" },
            escape_html(&row.label),
            matched,
            row.not_matched
        );
    }
    html.push_str("      </tbody>\n    </table>\n");
    html
}

/// Minimal page for error responses.
pub fn error_page(title: &str, message: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"nl\">\n<head><meta charset=\"UTF-8\"><title>{title}</title></head>\n<body>\n<h1>{title}</h1>\n<p>{message}</p>\n<p><a href=\"/\">Back</a></p>\n</body>\n</html>\n",
        title = escape_html(title),
        message = escape_html(message)
    )
}

#[derive(Serialize)]
struct MapData<'a> {
    center: [f64; 2],
    zoom: u8,
    radius: f64,
    marker_pixels: u8,
    markers: &'a [Marker],
}

/// Self-contained Leaflet map: a dot per marker plus a ring of `radius` meters
/// in the marker's color.
pub fn render_map(markers: &[Marker], radius: Radius) -> String {
    let center = map_center(markers);
    let data = MapData {
        center: [center.lat, center.lon],
        zoom: ZOOM_START,
        radius: radius.meters(),
        marker_pixels: MARKER_PIXELS,
        markers,
    };
    // serde_json output is safe inside <script> once '<' is escaped
    let json = serde_json::to_string(&data)
        .unwrap_or_else(|_| "null".to_string())
        .replace('<', "\\u003c");

    format!(
        r#"<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<div id="map" style="width:100%;height:100%;min-height:600px"></div>
<script>
(function () {{
  var data = {json};
  var map = L.map('map').setView(data.center, data.zoom);
  L.tileLayer('https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
    attribution: '&copy; OpenStreetMap contributors'
  }}).addTo(map);
  L.control.scale().addTo(map);
  data.markers.forEach(function (m) {{
    L.circleMarker([m.lat, m.lon], {{radius: data.marker_pixels, color: m.color, fill: true, fillColor: m.color}}).addTo(map);
    L.circle([m.lat, m.lon], {{radius: data.radius, color: m.color, weight: 1, fill: false}}).addTo(map);
  }});
}})();
</script>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::MarkerKind;
    use crate::summary::{RowKind, NOT_YET_VISITED, TOTAL_VISITED};

    fn rows() -> Vec<SummaryRow> {
        vec![
            SummaryRow { label: "Forest".into(), matched: Some(1), not_matched: 0, kind: RowKind::Concept },
            SummaryRow { label: TOTAL_VISITED.into(), matched: Some(1), not_matched: 0, kind: RowKind::TotalVisited },
            SummaryRow { label: NOT_YET_VISITED.into(), matched: None, not_matched: 3, kind: RowKind::NotYetVisited },
        ]
    }

    #[test]
    fn test_error_page_escapes_message() {
        let html = error_page("Invalid input", "radius: '<x>' is not a positive number of meters");
        assert!(html.contains("<h1>Invalid input</h1>"));
        assert!(html.contains("&#39;&lt;x&gt;&#39;"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&#39;");
    }

    #[test]
    fn test_table_marks_total_rows() {
        let html = render_table(&rows());
        assert!(html.contains("<tr><td>Forest</td><td>1</td><td>0</td></tr>"));
        assert!(html.contains("<tr class=\"total\"><td>Total visited</td><td>1</td><td>0</td></tr>"));
        assert!(html.contains("<tr class=\"total\"><td>Not yet visited</td><td></td><td>3</td></tr>"));
    }

    #[test]
    fn test_map_embeds_markers_and_center() {
        let markers = vec![
            Marker::new(4.0, 50.0, MarkerKind::Matched),
            Marker::new(6.0, 54.0, MarkerKind::Unvisited),
        ];
        let html = render_map(&markers, Radius::new(10.0).unwrap());
        assert!(html.contains("\"center\":[52.0,5.0]"));
        assert!(html.contains("\"color\":\"green\""));
        assert!(html.contains("\"color\":\"red\""));
        assert!(html.contains("\"radius\":10.0"));
    }

    #[test]
    fn test_empty_map_centers_on_origin() {
        let html = render_map(&[], Radius::new(10.0).unwrap());
        assert!(html.contains("\"center\":[0.0,0.0]"));
        assert!(html.contains("\"markers\":[]"));
    }

    #[test]
    fn test_page_keeps_form_state() {
        let concepts = vec!["Forest".to_string(), "W<ater".to_string()];
        let filter = ConceptFilter::from_form("Forest");
        let rows = rows();
        let html = render_page(&PageView {
            radius: Radius::new(12.5).unwrap(),
            filter: &filter,
            concepts: &concepts,
            rows: &rows,
            markers: &[],
        });
        assert!(html.contains("name=\"radius\" value=\"12.5\" step=\"any\" min=\"0\""));
        assert!(html.contains("<option value=\"Forest\" selected>Forest</option>"));
        assert!(html.contains("<option value=\"All visited locations\">All visited locations</option>"));
        assert!(html.contains("W&lt;ater"));
        assert!(html.contains("<input type=\"hidden\" name=\"concept\" value=\"Forest\">"));
        assert!(html.contains("value=\"export\""));
        for action in ["green", "orange", "red", "all"] {
            assert!(html.contains(&format!("value=\"{action}\"")));
        }
    }
}
