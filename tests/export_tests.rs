use scattermap::prelude::*;

/// Standalone HTML export of computed figures
#[cfg(test)]
mod export_tests {
    use super::*;

    fn figure(backend: Backend) -> Figure {
        let table = Table::from_columns(vec![
            Column::text("name", vec![Some("<script>alert(1)</script>"), Some("Lyon")]),
            Column::numeric("lat", vec![48.8566, 45.764]),
            Column::numeric("lon", vec![2.3522, 4.8357]),
        ])
        .unwrap();
        let config = MapConfigBuilder::new(&table)
            .with_backend(backend)
            .build()
            .unwrap();
        compute(&table, &config).unwrap()
    }

    fn embedded_json(html: &str) -> serde_json::Value {
        let start_tag = "<script type=\"application/json\" id=\"figure-data\">";
        let start = html.find(start_tag).unwrap() + start_tag.len();
        let end = start + html[start..].find("</script>").unwrap();
        serde_json::from_str(&html[start..end]).unwrap()
    }

    #[test]
    fn test_tile_export_uses_leaflet() {
        let html = export_html(&figure(Backend::Tile), "Cities").unwrap();

        assert!(html.contains("<title>Cities</title>"));
        assert!(html.contains("leaflet"));
        assert!(!html.contains("plotly"));

        let doc = embedded_json(&html);
        assert_eq!(doc["backend"], "tile");
        assert!(doc["tiles"]["url"].as_str().unwrap().contains("{z}"));
        assert!(doc.get("outline").is_none());

        let point = &doc["traces"][0]["points"][1];
        // Positions come back from the projected columns
        assert!((point["lat"].as_f64().unwrap() - 45.764).abs() < 1e-9);
        assert!((point["lon"].as_f64().unwrap() - 4.8357).abs() < 1e-9);
        assert_eq!(point["fill"], "#cb2649");
        assert_eq!(point["size"], 10.0);
    }

    #[test]
    fn test_mapbox_export_uses_plotly() {
        let html = export_html(&figure(Backend::Mapbox), "Cities").unwrap();

        assert!(html.contains("plotly"));
        assert!(!html.contains("leaflet.js"));

        let doc = embedded_json(&html);
        assert_eq!(doc["backend"], "mapbox");
        assert_eq!(doc["style"], "open-street-map");
        assert!(doc.get("tiles").is_none());
        assert_eq!(doc["traces"][0]["points"][0]["lat"], 48.8566);
    }

    #[test]
    fn test_untrusted_text_is_escaped() {
        let html = export_html(&figure(Backend::Tile), "A & B").unwrap();

        assert!(html.contains("<title>A &amp; B</title>"));
        assert!(!html.contains("<script>alert(1)</script>"));

        let doc = embedded_json(&html);
        let tooltip = doc["traces"][0]["points"][0]["tooltip"].as_str().unwrap();
        assert!(tooltip.starts_with("<b>name</b>: &lt;script&gt;"));
        assert!(tooltip.contains("<br><b>lat</b>: 48.8566"));
    }

    #[test]
    fn test_category_labels_are_escaped() {
        let table = Table::from_columns(vec![
            Column::numeric("lat", vec![10.0, 20.0]),
            Column::numeric("lon", vec![0.0, 10.0]),
            Column::text("kind", vec![Some("<img src=x onerror=alert(1)>"), Some("plain")]),
        ])
        .unwrap();

        for backend in [Backend::Tile, Backend::Mapbox] {
            let config = MapConfigBuilder::new(&table)
                .with_backend(backend)
                .with_color_column("kind", ColorScale::Jet, None)
                .build()
                .unwrap();
            let html = export_html(&compute(&table, &config).unwrap(), "kinds").unwrap();

            assert!(!html.contains("<img"));
            let doc = embedded_json(&html);
            assert_eq!(doc["traces"][0]["name"], "&lt;img src=x onerror=alert(1)&gt;");
            assert_eq!(doc["traces"][1]["name"], "plain");
        }
    }

    #[test]
    fn test_title_placeholders_are_not_expanded() {
        let html = export_html(&figure(Backend::Tile), "{{SCRIPT}} {{DATA}}").unwrap();

        assert!(html.contains("<title>{{SCRIPT}} {{DATA}}</title>"));
        assert_eq!(html.matches("L.map(").count(), 1);
        assert_eq!(html.matches("id=\"figure-data\"").count(), 1);
    }

    #[test]
    fn test_color_bar_for_numeric_color() {
        let table = Table::from_columns(vec![
            Column::numeric("lat", vec![10.0, 20.0, 30.0]),
            Column::numeric("lon", vec![0.0, 10.0, 20.0]),
            Column::numeric("v", vec![1.0, 2.0, 3.0]),
        ])
        .unwrap();
        let config = MapConfigBuilder::new(&table)
            .with_color_column("v", ColorScale::Jet, None)
            .build()
            .unwrap();
        let html = export_html(&compute(&table, &config).unwrap(), "v").unwrap();

        let doc = embedded_json(&html);
        assert_eq!(doc["color_bar"]["title"], "v");
        assert_eq!(doc["color_bar"]["stops"].as_array().unwrap().len(), 11);

        let points = doc["traces"][0]["points"].as_array().unwrap();
        let first = ColorScale::Jet.palette()[0].to_hex();
        let last = ColorScale::Jet.palette()[255].to_hex();
        assert_eq!(points[0]["fill"], first.as_str());
        assert_eq!(points[2]["fill"], last.as_str());
    }

    #[test]
    fn test_write_html_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("personalized_map.html");

        write_html(&figure(Backend::Tile), "Cities", &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<!DOCTYPE html>"));
        assert!(written.contains("figure-data"));
    }
}
